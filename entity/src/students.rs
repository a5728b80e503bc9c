use super::sea_orm_active_enums::{EnrollmentType, StudentStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<TimeDate>,
    pub enrollment_type: EnrollmentType,
    pub status: StudentStatus,
    pub reposition_credits: i32,
    pub last_credit_renewal: Option<TimeDate>,
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
    #[sea_orm(has_many = "super::class_attendees::Entity")]
    ClassAttendees,
    #[sea_orm(has_many = "super::credit_events::Entity")]
    CreditEvents,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::class_attendees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassAttendees.def()
    }
}

impl Related<super::credit_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
