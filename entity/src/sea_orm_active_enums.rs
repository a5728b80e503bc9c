use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum MemberRole {
    #[sea_orm(string_value = "owner")]
    #[serde(rename = "owner")]
    Owner,
    #[sea_orm(string_value = "admin")]
    #[serde(rename = "admin")]
    Admin,
    #[sea_orm(string_value = "staff")]
    #[serde(rename = "staff")]
    Staff,
}

/// How a student pays for classes. Partner-network students can be displaced
/// from a full class by a `Particular` student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum EnrollmentType {
    #[sea_orm(string_value = "Particular")]
    Particular,
    #[sea_orm(string_value = "Wellhub")]
    Wellhub,
    #[sea_orm(string_value = "TotalPass")]
    TotalPass,
}

impl EnrollmentType {
    pub fn is_partner_network(&self) -> bool {
        matches!(self, Self::Wellhub | Self::TotalPass)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum StudentStatus {
    #[sea_orm(string_value = "Ativo")]
    Ativo,
    #[sea_orm(string_value = "Inativo")]
    Inativo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "Agendado")]
    Agendado,
    #[sea_orm(string_value = "Presente")]
    Presente,
    #[sea_orm(string_value = "Faltou")]
    Faltou,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AttendanceType {
    #[sea_orm(string_value = "Pontual")]
    Pontual,
    #[sea_orm(string_value = "Experimental")]
    Experimental,
    #[sea_orm(string_value = "Reposicao")]
    Reposicao,
    #[sea_orm(string_value = "Recorrente")]
    Recorrente,
}

impl AttendanceType {
    /// Attendance types that earn a reposition credit when the student misses the class
    pub fn earns_absence_credit(&self) -> bool {
        matches!(self, Self::Pontual | Self::Recorrente)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum CreditEventKind {
    #[sea_orm(string_value = "consumed")]
    Consumed,
    #[sea_orm(string_value = "returned")]
    Returned,
    #[sea_orm(string_value = "absence_grant")]
    AbsenceGrant,
    #[sea_orm(string_value = "manual_adjustment")]
    ManualAdjustment,
    #[sea_orm(string_value = "monthly_reset")]
    MonthlyReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}
