use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_organizations::Organizations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(pk_uuid(Students::Id))
                    .col(uuid(Students::OrganizationId))
                    .col(string(Students::FullName))
                    .col(string_null(Students::Email))
                    .col(string_null(Students::Phone))
                    .col(date_null(Students::BirthDate))
                    .col(string_len(Students::EnrollmentType, 20))
                    .col(string_len(Students::Status, 20))
                    .col(integer(Students::RepositionCredits).default(0))
                    .col(date_null(Students::LastCreditRenewal))
                    .col(text_null(Students::Notes))
                    .col(timestamp_with_time_zone(Students::CreatedAt))
                    .col(timestamp_with_time_zone(Students::UpdatedAt))
                    .check(Expr::col(Students::RepositionCredits).gte(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_organization_id")
                            .from(Students::Table, Students::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Status-filtered list views per tenant
        manager
            .create_index(
                Index::create()
                    .name("idx_students_org_status")
                    .table(Students::Table)
                    .col(Students::OrganizationId)
                    .col(Students::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Students {
    Table,
    Id,
    OrganizationId,
    FullName,
    Email,
    Phone,
    BirthDate,
    EnrollmentType,
    Status,
    RepositionCredits,
    LastCreditRenewal,
    Notes,
    CreatedAt,
    UpdatedAt,
}
