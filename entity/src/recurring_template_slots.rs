use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_template_slots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub template_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: i16,
    /// Studio-local wall-clock time
    pub start_time: TimeTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::recurring_class_templates::Entity",
        from = "Column::TemplateId",
        to = "super::recurring_class_templates::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    RecurringClassTemplates,
}

impl Related<super::recurring_class_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringClassTemplates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
