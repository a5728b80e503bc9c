use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000002_create_students::Students;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Audit ledger for every reposition-credit balance change
        manager
            .create_table(
                Table::create()
                    .table(CreditEvents::Table)
                    .if_not_exists()
                    .col(pk_uuid(CreditEvents::Id))
                    .col(uuid(CreditEvents::OrganizationId))
                    .col(uuid(CreditEvents::StudentId))
                    .col(string_len(CreditEvents::Kind, 20))
                    .col(integer(CreditEvents::Amount))
                    .col(integer(CreditEvents::BalanceAfter))
                    .col(string_len_null(CreditEvents::Reason, 500))
                    .col(uuid_null(CreditEvents::ClassId))
                    .col(uuid_null(CreditEvents::PerformedBy))
                    .col(timestamp_with_time_zone(CreditEvents::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_credit_events_student_id")
                            .from(CreditEvents::Table, CreditEvents::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_credit_events_student_created")
                    .table(CreditEvents::Table)
                    .col(CreditEvents::StudentId)
                    .col(CreditEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CreditEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CreditEvents {
    Table,
    Id,
    OrganizationId,
    StudentId,
    Kind,
    Amount,
    BalanceAfter,
    Reason,
    ClassId,
    PerformedBy,
    CreatedAt,
}
