use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_organizations::Organizations;
use super::m20250301_000002_create_students::Students;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Templates first: generated classes point back at them
        manager
            .create_table(
                Table::create()
                    .table(RecurringClassTemplates::Table)
                    .if_not_exists()
                    .col(pk_uuid(RecurringClassTemplates::Id))
                    .col(uuid(RecurringClassTemplates::OrganizationId))
                    .col(uuid_null(RecurringClassTemplates::StudentId))
                    .col(string_null(RecurringClassTemplates::Title))
                    .col(date(RecurringClassTemplates::StartDate))
                    .col(date_null(RecurringClassTemplates::EndDate))
                    .col(integer(RecurringClassTemplates::DurationMinutes).default(60))
                    .col(boolean(RecurringClassTemplates::IsActive).default(true))
                    .col(timestamp_with_time_zone(RecurringClassTemplates::CreatedAt))
                    .col(timestamp_with_time_zone(RecurringClassTemplates::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recurring_class_templates_organization_id")
                            .from(
                                RecurringClassTemplates::Table,
                                RecurringClassTemplates::OrganizationId,
                            )
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recurring_class_templates_student_id")
                            .from(
                                RecurringClassTemplates::Table,
                                RecurringClassTemplates::StudentId,
                            )
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecurringTemplateSlots::Table)
                    .if_not_exists()
                    .col(pk_uuid(RecurringTemplateSlots::Id))
                    .col(uuid(RecurringTemplateSlots::TemplateId))
                    .col(small_integer(RecurringTemplateSlots::Weekday))
                    .col(time(RecurringTemplateSlots::StartTime))
                    .check(
                        Expr::col(RecurringTemplateSlots::Weekday)
                            .gte(0)
                            .and(Expr::col(RecurringTemplateSlots::Weekday).lte(6)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recurring_template_slots_template_id")
                            .from(RecurringTemplateSlots::Table, RecurringTemplateSlots::TemplateId)
                            .to(RecurringClassTemplates::Table, RecurringClassTemplates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Classes::Table)
                    .if_not_exists()
                    .col(pk_uuid(Classes::Id))
                    .col(uuid(Classes::OrganizationId))
                    .col(string_null(Classes::Title))
                    .col(timestamp_with_time_zone(Classes::StartTime))
                    .col(integer(Classes::DurationMinutes).default(60))
                    .col(uuid_null(Classes::StudentId))
                    .col(uuid_null(Classes::TemplateId))
                    .col(text_null(Classes::Notes))
                    .col(timestamp_with_time_zone(Classes::CreatedAt))
                    .col(timestamp_with_time_zone(Classes::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_classes_organization_id")
                            .from(Classes::Table, Classes::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_classes_student_id")
                            .from(Classes::Table, Classes::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_classes_template_id")
                            .from(Classes::Table, Classes::TemplateId)
                            .to(RecurringClassTemplates::Table, RecurringClassTemplates::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Calendar range queries
        manager
            .create_index(
                Index::create()
                    .name("idx_classes_org_start_time")
                    .table(Classes::Table)
                    .col(Classes::OrganizationId)
                    .col(Classes::StartTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_classes_template_id")
                    .table(Classes::Table)
                    .col(Classes::TemplateId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ClassAttendees::Table)
                    .if_not_exists()
                    .col(pk_uuid(ClassAttendees::Id))
                    .col(uuid(ClassAttendees::OrganizationId))
                    .col(uuid(ClassAttendees::ClassId))
                    .col(uuid(ClassAttendees::StudentId))
                    .col(string_len(ClassAttendees::Status, 20))
                    .col(string_len(ClassAttendees::AttendanceType, 20))
                    .col(boolean(ClassAttendees::AbsenceCreditGranted).default(false))
                    .col(timestamp_with_time_zone(ClassAttendees::CreatedAt))
                    .col(timestamp_with_time_zone(ClassAttendees::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_class_attendees_class_id")
                            .from(ClassAttendees::Table, ClassAttendees::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_class_attendees_student_id")
                            .from(ClassAttendees::Table, ClassAttendees::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A student attends a given class at most once
        manager
            .create_index(
                Index::create()
                    .name("idx_class_attendees_class_student")
                    .table(ClassAttendees::Table)
                    .col(ClassAttendees::ClassId)
                    .col(ClassAttendees::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_class_attendees_student_id")
                    .table(ClassAttendees::Table)
                    .col(ClassAttendees::StudentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClassAttendees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecurringTemplateSlots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecurringClassTemplates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RecurringClassTemplates {
    Table,
    Id,
    OrganizationId,
    StudentId,
    Title,
    StartDate,
    EndDate,
    DurationMinutes,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RecurringTemplateSlots {
    Table,
    Id,
    TemplateId,
    Weekday,
    StartTime,
}

#[derive(DeriveIden)]
enum Classes {
    Table,
    Id,
    OrganizationId,
    Title,
    StartTime,
    DurationMinutes,
    StudentId,
    TemplateId,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ClassAttendees {
    Table,
    Id,
    OrganizationId,
    ClassId,
    StudentId,
    Status,
    AttendanceType,
    AbsenceCreditGranted,
    CreatedAt,
    UpdatedAt,
}
