use entity::sea_orm_active_enums::{AttendanceStatus, AttendanceType, EnrollmentType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Student placement in a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeAssignment {
    pub student_id: Uuid,
    pub attendance_type: AttendanceType,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: time::OffsetDateTime,

    #[validate(range(min = 15, max = 240))]
    pub duration_minutes: Option<i32>,

    #[validate(length(max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    #[serde(default)]
    pub attendees: Vec<AttendeeAssignment>,
}

/// Class edit dialog submission
///
/// `attendee` replaces the class's sole attendee, reconciling reposition credits.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassRequest {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<time::OffsetDateTime>,

    #[validate(range(min = 15, max = 240))]
    pub duration_minutes: Option<i32>,

    #[validate(length(max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    pub attendee: Option<AttendeeAssignment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAttendeeRequest {
    pub student_id: Uuid,
    pub attendance_type: AttendanceType,
    /// Second step of the displacement flow
    #[serde(default)]
    pub confirm_displacement: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendanceStatusRequest {
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RepositionSeriesRequest {
    pub student_id: Uuid,

    #[serde(with = "time::serde::rfc3339")]
    pub first_start_time: time::OffsetDateTime,

    #[validate(range(min = 1, max = 52))]
    pub weeks: u32,

    #[validate(range(min = 15, max = 240))]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeResponse {
    pub id: Uuid,
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub student_name: Option<String>,
    pub enrollment_type: Option<EnrollmentType>,
    pub status: AttendanceStatus,
    pub attendance_type: AttendanceType,
    pub absence_credit_granted: bool,
}

impl AttendeeResponse {
    pub fn from_parts(
        attendee: entity::class_attendees::Model,
        student: Option<&entity::students::Model>,
    ) -> Self {
        Self {
            id: attendee.id,
            class_id: attendee.class_id,
            student_id: attendee.student_id,
            student_name: student.map(|s| s.full_name.clone()),
            enrollment_type: student.map(|s| s.enrollment_type),
            status: attendee.status,
            attendance_type: attendee.attendance_type,
            absence_credit_granted: attendee.absence_credit_granted,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassResponse {
    pub id: Uuid,
    pub title: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: time::OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: time::OffsetDateTime,
    pub duration_minutes: i32,
    pub student_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub notes: Option<String>,
}

impl From<entity::classes::Model> for ClassResponse {
    fn from(class: entity::classes::Model) -> Self {
        let end_time = class.start_time + time::Duration::minutes(class.duration_minutes as i64);
        Self {
            id: class.id,
            title: class.title,
            start_time: class.start_time,
            end_time,
            duration_minutes: class.duration_minutes,
            student_id: class.student_id,
            template_id: class.template_id,
            notes: class.notes,
        }
    }
}

/// Class together with its attendee list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDetail {
    #[serde(flatten)]
    pub class: ClassResponse,
    pub attendees: Vec<AttendeeResponse>,
}

/// Result of trying to place a student in a class
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum AddAttendeeOutcome {
    /// Seat was free
    Added { attendee: AttendeeResponse },
    /// Class is full but a partner-network attendee can give up the seat;
    /// nothing changed, resubmit with confirmation to proceed
    #[serde(rename_all = "camelCase")]
    DisplacementRequired {
        candidate_attendee_id: Uuid,
        candidate_student_id: Uuid,
        candidate_name: String,
    },
    #[serde(rename_all = "camelCase")]
    Displaced {
        attendee: AttendeeResponse,
        removed_student_id: Uuid,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateResult {
    pub attendee: AttendeeResponse,
    /// An absence credit was granted by this update
    pub credit_granted: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedClass {
    pub class_id: Uuid,
    /// Students who got a reposition credit back, one entry per credit
    pub credits_returned_to: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedWeek {
    pub week: u32,
    pub class_id: Uuid,
    pub attendee_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: time::OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesFailure {
    pub week: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: time::OffsetDateTime,
    pub code: String,
    pub message: String,
}

/// Outcome of a multi-week make-up booking; weeks before a failure stay booked
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesBooking {
    pub booked: Vec<BookedWeek>,
    pub failure: Option<SeriesFailure>,
}
