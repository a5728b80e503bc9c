use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_class_templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub student_id: Option<Uuid>,
    pub title: Option<String>,
    pub start_date: TimeDate,
    pub end_date: Option<TimeDate>,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recurring_template_slots::Entity")]
    RecurringTemplateSlots,
    #[sea_orm(has_many = "super::classes::Entity")]
    Classes,
}

impl Related<super::recurring_template_slots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringTemplateSlots.def()
    }
}

impl Related<super::classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
