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
        classes::{
            AddAttendeeOutcome, AddAttendeeRequest, ClassDetail, CreateClassRequest,
            DeletedClass, RepositionSeriesRequest, SeriesBooking, StatusUpdateResult,
            UpdateAttendanceStatusRequest, UpdateClassRequest,
        },
        common::{MessageResponse, SuccessResponse, TimeRangeQuery},
    },
};

/// GET /api/v1/classes?from=&to=
#[instrument(skip(state, tenant))]
pub async fn list_classes(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(range): Query<TimeRangeQuery>,
) -> Result<Json<SuccessResponse<Vec<ClassDetail>>>> {
    let classes = state
        .class_service
        .list_classes(tenant.organization_id, range.from, range.to)
        .await?;

    Ok(Json(SuccessResponse::new(classes)))
}

/// POST /api/v1/classes
#[instrument(skip(state, tenant, request))]
pub async fn create_class(
    State(state): State<AppState>,
    tenant: TenantContext,
    AppJson(request): AppJson<CreateClassRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<ClassDetail>>)> {
    validate_request(&request)?;

    let class = state
        .class_service
        .create_class(tenant.organization_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(class))))
}

/// GET /api/v1/classes/{id}
#[instrument(skip(state, tenant))]
pub async fn get_class(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(class_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<ClassDetail>>> {
    let class = state
        .class_service
        .get_class(tenant.organization_id, class_id)
        .await?;

    Ok(Json(SuccessResponse::new(class)))
}

/// PATCH /api/v1/classes/{id}
#[instrument(skip(state, tenant, request))]
pub async fn update_class(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(class_id): Path<Uuid>,
    AppJson(request): AppJson<UpdateClassRequest>,
) -> Result<Json<SuccessResponse<ClassDetail>>> {
    validate_request(&request)?;

    let class = state
        .class_service
        .update_class(tenant.organization_id, class_id, request)
        .await?;

    Ok(Json(SuccessResponse::new(class)))
}

/// DELETE /api/v1/classes/{id}
#[instrument(skip(state, tenant))]
pub async fn delete_class(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(class_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<DeletedClass>>> {
    let deleted = state
        .class_service
        .delete_class(tenant.organization_id, class_id)
        .await?;

    Ok(Json(SuccessResponse::new(deleted)))
}

/// POST /api/v1/classes/{id}/attendees
///
/// Answers 202 with `displacementRequired` when the seat must be freed first;
/// resubmit with `confirmDisplacement: true` to proceed.
#[instrument(skip(state, tenant, request))]
pub async fn add_attendee(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(class_id): Path<Uuid>,
    AppJson(request): AppJson<AddAttendeeRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<AddAttendeeOutcome>>)> {
    let outcome = state
        .attendance_service
        .try_add_attendee(
            tenant.organization_id,
            class_id,
            request.student_id,
            request.attendance_type,
            request.confirm_displacement,
        )
        .await?;

    let status = match outcome {
        AddAttendeeOutcome::DisplacementRequired { .. } => StatusCode::ACCEPTED,
        _ => StatusCode::CREATED,
    };

    Ok((status, Json(SuccessResponse::new(outcome))))
}

/// PATCH /api/v1/attendees/{id}/status
#[instrument(skip(state, tenant, request))]
pub async fn update_attendance_status(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(attendee_id): Path<Uuid>,
    AppJson(request): AppJson<UpdateAttendanceStatusRequest>,
) -> Result<Json<SuccessResponse<StatusUpdateResult>>> {
    let result = state
        .attendance_service
        .update_status(tenant.organization_id, attendee_id, request.status)
        .await?;

    Ok(Json(SuccessResponse::new(result)))
}

/// DELETE /api/v1/attendees/{id}
#[instrument(skip(state, tenant))]
pub async fn remove_attendee(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(attendee_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<MessageResponse>>> {
    let credited = state
        .attendance_service
        .remove_attendee(tenant.organization_id, attendee_id)
        .await?;

    let message = match credited {
        Some(_) => "Attendee removed, reposition credit returned",
        None => "Attendee removed",
    };

    Ok(Json(SuccessResponse::new(MessageResponse::new(message))))
}

/// POST /api/v1/bookings/reposition-series
///
/// Weeks booked before a failure stay booked; the failure is reported in the body.
#[instrument(skip(state, tenant, request))]
pub async fn book_reposition_series(
    State(state): State<AppState>,
    tenant: TenantContext,
    AppJson(request): AppJson<RepositionSeriesRequest>,
) -> Result<Json<SuccessResponse<SeriesBooking>>> {
    validate_request(&request)?;

    let booking = state
        .class_service
        .book_reposition_series(
            tenant.organization_id,
            request.student_id,
            request.first_start_time,
            request.weeks,
            request.duration_minutes,
        )
        .await?;

    Ok(Json(SuccessResponse::new(booking)))
}
