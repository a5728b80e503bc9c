use entity::sea_orm_active_enums::{EnrollmentType, StudentStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::common::iso_date;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 40))]
    pub phone: Option<String>,

    #[serde(default, with = "iso_date::option")]
    pub birth_date: Option<time::Date>,

    pub enrollment_type: EnrollmentType,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 40))]
    pub phone: Option<String>,

    #[serde(default, with = "iso_date::option")]
    pub birth_date: Option<time::Date>,

    pub enrollment_type: Option<EnrollmentType>,

    pub status: Option<StudentStatus>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentListQuery {
    pub status: Option<StudentStatus>,
    /// Name fragment matched anywhere in the full name
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BirthdayQuery {
    pub month: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(with = "iso_date::option")]
    pub birth_date: Option<time::Date>,
    pub enrollment_type: EnrollmentType,
    pub status: StudentStatus,
    pub reposition_credits: i32,
    #[serde(with = "iso_date::option")]
    pub last_credit_renewal: Option<time::Date>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}

impl From<entity::students::Model> for StudentResponse {
    fn from(student: entity::students::Model) -> Self {
        Self {
            id: student.id,
            full_name: student.full_name,
            email: student.email,
            phone: student.phone,
            birth_date: student.birth_date,
            enrollment_type: student.enrollment_type,
            status: student.status,
            reposition_credits: student.reposition_credits,
            last_credit_renewal: student.last_credit_renewal,
            notes: student.notes,
            created_at: student.created_at,
        }
    }
}
