use entity::sea_orm_active_enums::TransactionKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::common::iso_date;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub kind: TransactionKind,

    #[validate(length(min = 1, max = 100))]
    pub category: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 1))]
    pub amount_cents: i64,

    #[serde(with = "iso_date")]
    pub occurred_on: time::Date,

    pub student_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    #[serde(default, with = "iso_date::option")]
    pub from: Option<time::Date>,
    #[serde(default, with = "iso_date::option")]
    pub to: Option<time::Date>,
    pub kind: Option<TransactionKind>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub category: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    #[serde(with = "iso_date")]
    pub occurred_on: time::Date,
    pub student_id: Option<Uuid>,
}

impl From<entity::financial_transactions::Model> for TransactionResponse {
    fn from(tx: entity::financial_transactions::Model) -> Self {
        Self {
            id: tx.id,
            kind: tx.kind,
            category: tx.category,
            description: tx.description,
            amount_cents: tx.amount_cents,
            occurred_on: tx.occurred_on,
            student_id: tx.student_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub balance_cents: i64,
}
