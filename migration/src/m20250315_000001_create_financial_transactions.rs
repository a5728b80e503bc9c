use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_organizations::Organizations;
use super::m20250301_000002_create_students::Students;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FinancialTransactions::Table)
                    .if_not_exists()
                    .col(pk_uuid(FinancialTransactions::Id))
                    .col(uuid(FinancialTransactions::OrganizationId))
                    .col(uuid_null(FinancialTransactions::StudentId))
                    .col(string_len(FinancialTransactions::Kind, 20))
                    .col(string_len(FinancialTransactions::Category, 100))
                    .col(text_null(FinancialTransactions::Description))
                    .col(big_integer(FinancialTransactions::AmountCents))
                    .col(date(FinancialTransactions::OccurredOn))
                    .col(timestamp_with_time_zone(FinancialTransactions::CreatedAt))
                    .col(timestamp_with_time_zone(FinancialTransactions::UpdatedAt))
                    .check(Expr::col(FinancialTransactions::AmountCents).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_transactions_organization_id")
                            .from(
                                FinancialTransactions::Table,
                                FinancialTransactions::OrganizationId,
                            )
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_transactions_student_id")
                            .from(FinancialTransactions::Table, FinancialTransactions::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_financial_transactions_org_occurred_on")
                    .table(FinancialTransactions::Table)
                    .col(FinancialTransactions::OrganizationId)
                    .col(FinancialTransactions::OccurredOn)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FinancialTransactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FinancialTransactions {
    Table,
    Id,
    OrganizationId,
    StudentId,
    Kind,
    Category,
    Description,
    AmountCents,
    OccurredOn,
    CreatedAt,
    UpdatedAt,
}
