use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::common::{iso_date, wall_time};

/// Weekly slot: weekday 0 = Sunday .. 6 = Saturday at a studio-local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSlot {
    #[validate(range(min = 0, max = 6))]
    pub weekday: u8,
    #[serde(with = "wall_time")]
    pub time: time::Time,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    pub student_id: Option<Uuid>,

    #[validate(length(max = 200))]
    pub title: Option<String>,

    #[serde(with = "iso_date")]
    pub start_date: time::Date,

    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<time::Date>,

    #[validate(range(min = 15, max = 240))]
    pub duration_minutes: Option<i32>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[validate(length(min = 1, max = 21), nested)]
    pub slots: Vec<TemplateSlot>,

    /// Expand the template into classes right after saving
    #[serde(default)]
    pub generate: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub id: Uuid,
    pub student_id: Option<Uuid>,
    pub title: Option<String>,
    #[serde(with = "iso_date")]
    pub start_date: time::Date,
    #[serde(with = "iso_date::option")]
    pub end_date: Option<time::Date>,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub slots: Vec<TemplateSlot>,
}

impl TemplateResponse {
    pub fn from_parts(
        template: entity::recurring_class_templates::Model,
        slots: &[entity::recurring_template_slots::Model],
    ) -> Self {
        let mut slots: Vec<TemplateSlot> = slots
            .iter()
            .map(|s| TemplateSlot {
                weekday: s.weekday as u8,
                time: s.start_time,
            })
            .collect();
        slots.sort();

        Self {
            id: template.id,
            student_id: template.student_id,
            title: template.title,
            start_date: template.start_date,
            end_date: template.end_date,
            duration_minutes: template.duration_minutes,
            is_active: template.is_active,
            slots,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub deleted: u64,
    pub created: u64,
    pub credits_returned_to: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTemplate {
    pub template: TemplateResponse,
    pub generation: Option<GenerationReport>,
}
