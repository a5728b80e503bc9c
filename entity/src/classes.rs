use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: Option<String>,
    pub start_time: TimeDateTimeWithTimeZone,
    pub duration_minutes: i32,
    /// First attendee's student, kept for single-student lookups
    pub student_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Organizations,
    #[sea_orm(
        belongs_to = "super::recurring_class_templates::Entity",
        from = "Column::TemplateId",
        to = "super::recurring_class_templates::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    RecurringClassTemplates,
    #[sea_orm(has_many = "super::class_attendees::Entity")]
    ClassAttendees,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::recurring_class_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringClassTemplates.def()
    }
}

impl Related<super::class_attendees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassAttendees.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
