use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use super::validate_request;
use crate::{
    app_state::AppState,
    error::{AppJson, Result},
    middleware::TenantContext,
    models::{
        common::{MessageResponse, SuccessResponse},
        students::{
            BirthdayQuery, CreateStudentRequest, StudentListQuery, StudentResponse,
            UpdateStudentRequest,
        },
    },
};

/// GET /api/v1/students
#[instrument(skip(state, tenant))]
pub async fn list_students(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<SuccessResponse<Vec<StudentResponse>>>> {
    let students = state
        .student_service
        .list_students(tenant.organization_id, &query)
        .await?;

    Ok(Json(SuccessResponse::new(
        students.into_iter().map(StudentResponse::from).collect(),
    )))
}

/// POST /api/v1/students
#[instrument(skip(state, tenant, request))]
pub async fn create_student(
    State(state): State<AppState>,
    tenant: TenantContext,
    AppJson(request): AppJson<CreateStudentRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<StudentResponse>>)> {
    validate_request(&request)?;

    let student = state
        .student_service
        .create_student(tenant.organization_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(StudentResponse::from(student))),
    ))
}

/// GET /api/v1/students/birthdays?month=
#[instrument(skip(state, tenant))]
pub async fn birthdays(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<BirthdayQuery>,
) -> Result<Json<SuccessResponse<Vec<StudentResponse>>>> {
    let students = state
        .student_service
        .birthdays_for_month(tenant.organization_id, query.month)
        .await?;

    Ok(Json(SuccessResponse::new(
        students.into_iter().map(StudentResponse::from).collect(),
    )))
}

/// GET /api/v1/students/{id}
#[instrument(skip(state, tenant))]
pub async fn get_student(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(student_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<StudentResponse>>> {
    let student = state
        .student_service
        .get_student(tenant.organization_id, student_id)
        .await?;

    Ok(Json(SuccessResponse::new(StudentResponse::from(student))))
}

/// PATCH /api/v1/students/{id}
#[instrument(skip(state, tenant, request))]
pub async fn update_student(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(student_id): Path<Uuid>,
    AppJson(request): AppJson<UpdateStudentRequest>,
) -> Result<Json<SuccessResponse<StudentResponse>>> {
    validate_request(&request)?;

    let student = state
        .student_service
        .update_student(tenant.organization_id, student_id, request)
        .await?;

    Ok(Json(SuccessResponse::new(StudentResponse::from(student))))
}

/// DELETE /api/v1/students/{id}
#[instrument(skip(state, tenant))]
pub async fn delete_student(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(student_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<MessageResponse>>> {
    state
        .student_service
        .delete_student(tenant.organization_id, student_id)
        .await?;

    Ok(Json(SuccessResponse::new(MessageResponse::new(
        "Student deleted",
    ))))
}
