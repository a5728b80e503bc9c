use crate::{
    config::StudioConfig,
    error::{ApiError, Result},
    models::classes::{AddAttendeeOutcome, AttendeeResponse, StatusUpdateResult},
    services::{
        class_service::find_class, credits_service::CreditsService,
        organization_service::class_capacity, student_service::find_student,
    },
};
use entity::{
    class_attendees, classes,
    sea_orm_active_enums::{AttendanceStatus, AttendanceType, EnrollmentType},
    students,
};
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, TransactionTrait,
};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Where a joining student can sit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatDecision {
    Free,
    /// Index into the roster of the attendee that would give up the seat
    Displace(usize),
    Full,
}

/// Capacity rule: a `Particular` student may take the seat of the first
/// partner-network attendee of a full class. A class already over capacity
/// (capacity lowered after it filled) admits nobody.
pub fn choose_seat(
    occupants: &[EnrollmentType],
    capacity: usize,
    joining: EnrollmentType,
) -> SeatDecision {
    if occupants.len() < capacity {
        return SeatDecision::Free;
    }
    if occupants.len() > capacity || joining != EnrollmentType::Particular {
        return SeatDecision::Full;
    }
    occupants
        .iter()
        .position(EnrollmentType::is_partner_network)
        .map_or(SeatDecision::Full, SeatDecision::Displace)
}

/// Attendee rows of a class with their students, in seating order
pub async fn load_roster<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    class_id: Uuid,
) -> Result<Vec<(class_attendees::Model, Option<students::Model>)>> {
    let mut attendees = class_attendees::Entity::find()
        .filter(class_attendees::Column::ClassId.eq(class_id))
        .filter(class_attendees::Column::OrganizationId.eq(organization_id))
        .all(conn)
        .await?;
    attendees.sort_by_key(|a| (a.created_at, a.id));

    let student_ids: Vec<Uuid> = attendees.iter().map(|a| a.student_id).collect();
    let mut students_by_id: HashMap<Uuid, students::Model> = if student_ids.is_empty() {
        HashMap::new()
    } else {
        students::Entity::find()
            .filter(students::Column::Id.is_in(student_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect()
    };

    Ok(attendees
        .into_iter()
        .map(|a| {
            let student = students_by_id.remove(&a.student_id);
            (a, student)
        })
        .collect())
}

pub struct AttendanceService {
    db: DatabaseConnection,
    credits: Arc<CreditsService>,
    studio: StudioConfig,
}

impl AttendanceService {
    pub fn new(db: DatabaseConnection, credits: Arc<CreditsService>, studio: &StudioConfig) -> Self {
        Self {
            db,
            credits,
            studio: studio.clone(),
        }
    }

    /// Place a student in a class, applying capacity and displacement rules
    ///
    /// When the class is full and a partner-network attendee could be displaced,
    /// the first call (without confirmation) only proposes the displacement.
    #[instrument(skip(self))]
    pub async fn try_add_attendee(
        &self,
        organization_id: Uuid,
        class_id: Uuid,
        student_id: Uuid,
        attendance_type: AttendanceType,
        confirm_displacement: bool,
    ) -> Result<AddAttendeeOutcome> {
        let txn = self.db.begin().await?;
        let outcome = self
            .add_in_txn(
                &txn,
                organization_id,
                class_id,
                student_id,
                attendance_type,
                confirm_displacement,
            )
            .await?;

        if matches!(outcome, AddAttendeeOutcome::DisplacementRequired { .. }) {
            txn.rollback().await?;
        } else {
            txn.commit().await?;
        }

        Ok(outcome)
    }

    pub async fn add_in_txn(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        class_id: Uuid,
        student_id: Uuid,
        attendance_type: AttendanceType,
        confirm_displacement: bool,
    ) -> Result<AddAttendeeOutcome> {
        let class = find_class(txn, organization_id, class_id).await?;
        let student = find_student(txn, organization_id, student_id).await?;
        let roster = load_roster(txn, organization_id, class_id).await?;

        if roster.iter().any(|(a, _)| a.student_id == student_id) {
            return Err(ApiError::Conflict(format!(
                "{} is already in this class",
                student.full_name
            )));
        }

        let capacity = class_capacity(txn, organization_id).await?.max(0) as usize;
        let occupants: Vec<EnrollmentType> = roster
            .iter()
            .map(|(_, s)| s.as_ref().map_or(EnrollmentType::Particular, |s| s.enrollment_type))
            .collect();

        match choose_seat(&occupants, capacity, student.enrollment_type) {
            SeatDecision::Free => {
                let attendee = self
                    .insert_in_txn(txn, organization_id, &class, student_id, attendance_type)
                    .await?;
                sync_primary_student(txn, organization_id, class.id).await?;

                Ok(AddAttendeeOutcome::Added {
                    attendee: AttendeeResponse::from_parts(attendee, Some(&student)),
                })
            }
            SeatDecision::Displace(index) => {
                let (candidate, candidate_student) = &roster[index];

                if !confirm_displacement {
                    info!(
                        "Displacement proposed: class={}, joining={}, candidate={}",
                        class.id, student_id, candidate.student_id
                    );
                    return Ok(AddAttendeeOutcome::DisplacementRequired {
                        candidate_attendee_id: candidate.id,
                        candidate_student_id: candidate.student_id,
                        candidate_name: candidate_student
                            .as_ref()
                            .map(|s| s.full_name.clone())
                            .unwrap_or_default(),
                    });
                }

                let removed_student_id = candidate.student_id;
                self.remove_in_txn(txn, organization_id, candidate.clone())
                    .await?;
                let attendee = self
                    .insert_in_txn(txn, organization_id, &class, student_id, attendance_type)
                    .await?;
                sync_primary_student(txn, organization_id, class.id).await?;

                info!(
                    "Displaced attendee: class={}, removed={}, added={}",
                    class.id, removed_student_id, student_id
                );

                Ok(AddAttendeeOutcome::Displaced {
                    attendee: AttendeeResponse::from_parts(attendee, Some(&student)),
                    removed_student_id,
                })
            }
            SeatDecision::Full => {
                warn!(
                    class_id = %class.id,
                    student_id = %student_id,
                    capacity,
                    "Class full, no displaceable attendee"
                );
                Err(ApiError::ClassFull(format!(
                    "Class already has {} of {} attendees and none can be displaced",
                    roster.len(),
                    capacity
                )))
            }
        }
    }

    /// Insert the attendee row; a `Reposicao` attendee pays one credit
    pub async fn insert_in_txn(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        class: &classes::Model,
        student_id: Uuid,
        attendance_type: AttendanceType,
    ) -> Result<class_attendees::Model> {
        if attendance_type == AttendanceType::Reposicao {
            self.credits
                .consume_in_txn(txn, organization_id, student_id, Some(class.id))
                .await?;
        }

        insert_attendee_row(txn, organization_id, class.id, student_id, attendance_type).await
    }

    /// Delete the attendee row; returns the student credited back, if any
    pub async fn remove_in_txn(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        attendee: class_attendees::Model,
    ) -> Result<Option<Uuid>> {
        class_attendees::Entity::delete_by_id(attendee.id)
            .exec(txn)
            .await?;

        if attendee.attendance_type != AttendanceType::Reposicao {
            return Ok(None);
        }

        self.credits
            .return_in_txn(
                txn,
                organization_id,
                attendee.student_id,
                1,
                Some(attendee.class_id),
            )
            .await?;

        Ok(Some(attendee.student_id))
    }

    /// Cancel a student's place in a class
    #[instrument(skip(self))]
    pub async fn remove_attendee(
        &self,
        organization_id: Uuid,
        attendee_id: Uuid,
    ) -> Result<Option<Uuid>> {
        let txn = self.db.begin().await?;
        let attendee = find_attendee(&txn, organization_id, attendee_id).await?;
        let class_id = attendee.class_id;

        let credited = self.remove_in_txn(&txn, organization_id, attendee).await?;
        sync_primary_student(&txn, organization_id, class_id).await?;
        txn.commit().await?;

        info!(
            "Removed attendee: id={}, class={}, credit_returned={}",
            attendee_id,
            class_id,
            credited.is_some()
        );

        Ok(credited)
    }

    /// Record attendance; marking a Pontual/Recorrente attendee absent earns
    /// one credit, at most once per attendee row
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        organization_id: Uuid,
        attendee_id: Uuid,
        status: AttendanceStatus,
    ) -> Result<StatusUpdateResult> {
        let txn = self.db.begin().await?;
        let attendee = find_attendee(&txn, organization_id, attendee_id).await?;

        let grant = self.studio.auto_grant_on_absence
            && status == AttendanceStatus::Faltou
            && attendee.attendance_type.earns_absence_credit()
            && !attendee.absence_credit_granted;

        if grant {
            self.credits
                .grant_for_absence_in_txn(
                    &txn,
                    organization_id,
                    attendee.student_id,
                    attendee.class_id,
                )
                .await?;
        }

        let mut active: class_attendees::ActiveModel = attendee.into();
        active.status = Set(status);
        if grant {
            active.absence_credit_granted = Set(true);
        }
        active.updated_at = Set(time::OffsetDateTime::now_utc());
        let updated = active.update(&txn).await?;

        let student = find_student(&txn, organization_id, updated.student_id).await?;
        txn.commit().await?;

        info!(
            "Updated attendance status: attendee={}, status={:?}, credit_granted={}",
            attendee_id, status, grant
        );

        Ok(StatusUpdateResult {
            attendee: AttendeeResponse::from_parts(updated, Some(&student)),
            credit_granted: grant,
        })
    }
}

pub async fn find_attendee<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    attendee_id: Uuid,
) -> Result<class_attendees::Model> {
    class_attendees::Entity::find_by_id(attendee_id)
        .filter(class_attendees::Column::OrganizationId.eq(organization_id))
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Attendee {} not found", attendee_id)))
}

/// Bare attendee insert, no credit bookkeeping
pub async fn insert_attendee_row<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    class_id: Uuid,
    student_id: Uuid,
    attendance_type: AttendanceType,
) -> Result<class_attendees::Model> {
    let now = time::OffsetDateTime::now_utc();
    let attendee = class_attendees::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(organization_id),
        class_id: Set(class_id),
        student_id: Set(student_id),
        status: Set(AttendanceStatus::Agendado),
        attendance_type: Set(attendance_type),
        absence_credit_granted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    Ok(attendee)
}

/// Point `classes.student_id` at the first attendee, or clear it
pub async fn sync_primary_student<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    class_id: Uuid,
) -> Result<()> {
    let roster = load_roster(conn, organization_id, class_id).await?;
    let primary = roster.first().map(|(a, _)| a.student_id);

    classes::Entity::update_many()
        .col_expr(classes::Column::StudentId, Expr::value(primary))
        .filter(classes::Column::Id.eq(class_id))
        .filter(classes::Column::OrganizationId.eq(organization_id))
        .exec(conn)
        .await?;

    Ok(())
}
