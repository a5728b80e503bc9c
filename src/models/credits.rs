use entity::sea_orm_active_enums::CreditEventKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::common::iso_date;

/// Reposition-credit balance after the monthly renewal check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    pub student_id: Uuid,
    pub credits: i32,
    #[serde(with = "iso_date::option")]
    pub last_credit_renewal: Option<time::Date>,
    /// True when this read performed the month's reset
    pub renewed_this_month: bool,
}

/// Manual admin correction of a student's balance
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustCreditsRequest {
    #[validate(range(min = -100, max = 100))]
    pub amount: i32,

    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditHistoryQuery {
    pub limit: Option<u64>,
}

/// One entry of the credit audit ledger
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditEventRecord {
    pub id: Uuid,
    pub kind: CreditEventKind,
    pub amount: i32,
    pub balance_after: i32,
    pub reason: Option<String>,
    pub class_id: Option<Uuid>,
    pub performed_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}

impl From<entity::credit_events::Model> for CreditEventRecord {
    fn from(event: entity::credit_events::Model) -> Self {
        Self {
            id: event.id,
            kind: event.kind,
            amount: event.amount,
            balance_after: event.balance_after,
            reason: event.reason,
            class_id: event.class_id,
            performed_by: event.performed_by,
            created_at: event.created_at,
        }
    }
}
