use crate::{
    config::StudioConfig,
    error::{ApiError, Result},
    models::{
        classes::{
            AddAttendeeOutcome, AttendeeAssignment, AttendeeResponse, BookedWeek, ClassDetail,
            ClassResponse, CreateClassRequest, DeletedClass, SeriesBooking, SeriesFailure,
            UpdateClassRequest,
        },
        common::normalize_instant,
    },
    services::{
        attendance_service::{
            insert_attendee_row, load_roster, sync_primary_student, AttendanceService,
        },
        credits_service::CreditsService,
        organization_service::class_capacity,
        student_service::find_student,
    },
};
use entity::{
    class_attendees, classes,
    sea_orm_active_enums::{AttendanceStatus, AttendanceType},
    students,
};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    TransactionTrait,
};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Tenant-scoped class lookup
pub async fn find_class<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    class_id: Uuid,
) -> Result<classes::Model> {
    classes::Entity::find_by_id(class_id)
        .filter(classes::Column::OrganizationId.eq(organization_id))
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Class {} not found", class_id)))
}

/// Credit movements needed when the sole attendee of a class is edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditPlan {
    /// Applied first
    pub return_to: Option<Uuid>,
    pub consume_from: Option<Uuid>,
}

/// Reconcile reposition credits for an attendee edit
///
/// The original student is refunded when they held a `Reposicao` seat that
/// changes hands or type; the new student pays when they take a `Reposicao`
/// seat they did not already hold.
pub fn plan_attendee_edit(
    original: Option<AttendeeAssignment>,
    new: AttendeeAssignment,
) -> EditPlan {
    let new_is_reposition = new.attendance_type == AttendanceType::Reposicao;

    let Some(original) = original else {
        return EditPlan {
            return_to: None,
            consume_from: new_is_reposition.then_some(new.student_id),
        };
    };

    let original_is_reposition = original.attendance_type == AttendanceType::Reposicao;
    let student_changed = original.student_id != new.student_id;
    let type_changed = original.attendance_type != new.attendance_type;

    EditPlan {
        return_to: (original_is_reposition && (student_changed || type_changed))
            .then_some(original.student_id),
        consume_from: (new_is_reposition && (student_changed || !original_is_reposition))
            .then_some(new.student_id),
    }
}

pub struct ClassService {
    db: DatabaseConnection,
    credits: Arc<CreditsService>,
    attendance: Arc<AttendanceService>,
    studio: StudioConfig,
}

impl ClassService {
    pub fn new(
        db: DatabaseConnection,
        credits: Arc<CreditsService>,
        attendance: Arc<AttendanceService>,
        studio: &StudioConfig,
    ) -> Self {
        Self {
            db,
            credits,
            attendance,
            studio: studio.clone(),
        }
    }

    /// Schedule a class with its initial attendees in one transaction
    #[instrument(skip(self, request))]
    pub async fn create_class(
        &self,
        organization_id: Uuid,
        request: CreateClassRequest,
    ) -> Result<ClassDetail> {
        let txn = self.db.begin().await?;

        let capacity = class_capacity(&txn, organization_id).await?;
        if request.attendees.len() > capacity.max(0) as usize {
            return Err(ApiError::ClassFull(format!(
                "{} attendees exceed the class capacity of {}",
                request.attendees.len(),
                capacity
            )));
        }

        let class = self
            .insert_class(
                &txn,
                NewClass {
                    organization_id,
                    start_time: request.start_time,
                    duration_minutes: request.duration_minutes,
                    title: request.title,
                    notes: request.notes,
                    template_id: None,
                },
            )
            .await?;

        let mut seen = Vec::with_capacity(request.attendees.len());
        for assignment in &request.attendees {
            if seen.contains(&assignment.student_id) {
                return Err(ApiError::Conflict(format!(
                    "Student {} listed twice",
                    assignment.student_id
                )));
            }
            seen.push(assignment.student_id);

            find_student(&txn, organization_id, assignment.student_id).await?;
            self.attendance
                .insert_in_txn(
                    &txn,
                    organization_id,
                    &class,
                    assignment.student_id,
                    assignment.attendance_type,
                )
                .await?;
        }
        sync_primary_student(&txn, organization_id, class.id).await?;

        let detail = class_detail(&txn, organization_id, class.id).await?;
        txn.commit().await?;

        info!(
            "Created class: id={}, start={}, attendees={}",
            detail.class.id,
            detail.class.start_time,
            detail.attendees.len()
        );

        Ok(detail)
    }

    pub async fn get_class(&self, organization_id: Uuid, class_id: Uuid) -> Result<ClassDetail> {
        class_detail(&self.db, organization_id, class_id).await
    }

    /// Classes starting in `[from, to)`, earliest first
    #[instrument(skip(self))]
    pub async fn list_classes(
        &self,
        organization_id: Uuid,
        from: time::OffsetDateTime,
        to: time::OffsetDateTime,
    ) -> Result<Vec<ClassDetail>> {
        if to <= from {
            return Err(ApiError::BadRequest(
                "Range end must be after its start".to_string(),
            ));
        }

        let classes = classes::Entity::find()
            .filter(classes::Column::OrganizationId.eq(organization_id))
            .filter(classes::Column::StartTime.gte(normalize_instant(from)))
            .filter(classes::Column::StartTime.lt(normalize_instant(to)))
            .order_by_asc(classes::Column::StartTime)
            .all(&self.db)
            .await?;

        if classes.is_empty() {
            return Ok(Vec::new());
        }

        let class_ids: Vec<Uuid> = classes.iter().map(|c| c.id).collect();
        let mut attendees = class_attendees::Entity::find()
            .filter(class_attendees::Column::OrganizationId.eq(organization_id))
            .filter(class_attendees::Column::ClassId.is_in(class_ids))
            .all(&self.db)
            .await?;
        attendees.sort_by_key(|a| (a.created_at, a.id));

        let student_ids: Vec<Uuid> = attendees.iter().map(|a| a.student_id).collect();
        let students_by_id: HashMap<Uuid, students::Model> = if student_ids.is_empty() {
            HashMap::new()
        } else {
            students::Entity::find()
                .filter(students::Column::Id.is_in(student_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|s| (s.id, s))
                .collect()
        };

        let mut by_class: HashMap<Uuid, Vec<AttendeeResponse>> = HashMap::new();
        for attendee in attendees {
            let student = students_by_id.get(&attendee.student_id);
            by_class
                .entry(attendee.class_id)
                .or_default()
                .push(AttendeeResponse::from_parts(attendee, student));
        }

        Ok(classes
            .into_iter()
            .map(|class| {
                let attendees = by_class.remove(&class.id).unwrap_or_default();
                ClassDetail {
                    class: ClassResponse::from(class),
                    attendees,
                }
            })
            .collect())
    }

    /// Class edit dialog; credits are reconciled before anything persists
    #[instrument(skip(self, request))]
    pub async fn update_class(
        &self,
        organization_id: Uuid,
        class_id: Uuid,
        request: UpdateClassRequest,
    ) -> Result<ClassDetail> {
        let txn = self.db.begin().await?;
        let class = find_class(&txn, organization_id, class_id).await?;

        if let Some(assignment) = request.attendee {
            self.reassign_sole_attendee(&txn, organization_id, &class, assignment)
                .await?;
        }

        let mut active: classes::ActiveModel = class.into();
        if let Some(start_time) = request.start_time {
            active.start_time = Set(normalize_instant(start_time));
        }
        if let Some(duration) = request.duration_minutes {
            active.duration_minutes = Set(duration);
        }
        if let Some(title) = request.title {
            active.title = Set(Some(title));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(time::OffsetDateTime::now_utc());
        active.update(&txn).await?;

        let detail = class_detail(&txn, organization_id, class_id).await?;
        txn.commit().await?;

        info!("Updated class: id={}", class_id);
        Ok(detail)
    }

    async fn reassign_sole_attendee(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        class: &classes::Model,
        assignment: AttendeeAssignment,
    ) -> Result<()> {
        let roster = load_roster(txn, organization_id, class.id).await?;
        if roster.len() > 1 {
            return Err(ApiError::BadRequest(
                "Class has several attendees; edit them individually".to_string(),
            ));
        }
        find_student(txn, organization_id, assignment.student_id).await?;

        let original = roster.into_iter().next().map(|(attendee, _)| attendee);
        let plan = plan_attendee_edit(
            original.as_ref().map(|a| AttendeeAssignment {
                student_id: a.student_id,
                attendance_type: a.attendance_type,
            }),
            assignment,
        );

        if let Some(student_id) = plan.return_to {
            self.credits
                .return_in_txn(txn, organization_id, student_id, 1, Some(class.id))
                .await?;
        }
        if let Some(student_id) = plan.consume_from {
            self.credits
                .consume_in_txn(txn, organization_id, student_id, Some(class.id))
                .await?;
        }

        match original {
            Some(attendee) => {
                let student_changed = attendee.student_id != assignment.student_id;
                let mut active: class_attendees::ActiveModel = attendee.into();
                if student_changed {
                    active.student_id = Set(assignment.student_id);
                    active.status = Set(AttendanceStatus::Agendado);
                    active.absence_credit_granted = Set(false);
                }
                active.attendance_type = Set(assignment.attendance_type);
                active.updated_at = Set(time::OffsetDateTime::now_utc());
                active.update(txn).await?;
            }
            None => {
                insert_attendee_row(
                    txn,
                    organization_id,
                    class.id,
                    assignment.student_id,
                    assignment.attendance_type,
                )
                .await?;
            }
        }

        sync_primary_student(txn, organization_id, class.id).await
    }

    /// Delete a class, refunding every `Reposicao` attendee
    #[instrument(skip(self))]
    pub async fn delete_class(&self, organization_id: Uuid, class_id: Uuid) -> Result<DeletedClass> {
        let txn = self.db.begin().await?;
        let class = find_class(&txn, organization_id, class_id).await?;
        let credits_returned_to = self.delete_in_txn(&txn, organization_id, &class).await?;
        txn.commit().await?;

        info!(
            "Deleted class: id={}, credits_returned={}",
            class_id,
            credits_returned_to.len()
        );

        Ok(DeletedClass {
            class_id,
            credits_returned_to,
        })
    }

    pub async fn delete_in_txn(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        class: &classes::Model,
    ) -> Result<Vec<Uuid>> {
        let roster = load_roster(txn, organization_id, class.id).await?;

        let mut credited = Vec::new();
        for (attendee, _) in &roster {
            if attendee.attendance_type == AttendanceType::Reposicao {
                self.credits
                    .return_in_txn(txn, organization_id, attendee.student_id, 1, Some(class.id))
                    .await?;
                credited.push(attendee.student_id);
            }
        }

        class_attendees::Entity::delete_many()
            .filter(class_attendees::Column::ClassId.eq(class.id))
            .exec(txn)
            .await?;
        classes::Entity::delete_by_id(class.id).exec(txn).await?;

        Ok(credited)
    }

    /// Book the same make-up slot for several consecutive weeks
    ///
    /// Every week commits on its own. The first week that cannot be booked
    /// stops the series and is reported; earlier weeks stay booked.
    #[instrument(skip(self))]
    pub async fn book_reposition_series(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
        first_start_time: time::OffsetDateTime,
        weeks: u32,
        duration_minutes: Option<i32>,
    ) -> Result<SeriesBooking> {
        if weeks == 0 || weeks > self.studio.max_series_weeks {
            return Err(ApiError::BadRequest(format!(
                "Series length must be between 1 and {} weeks",
                self.studio.max_series_weeks
            )));
        }
        find_student(&self.db, organization_id, student_id).await?;

        let first = normalize_instant(first_start_time);
        let mut booked = Vec::new();
        let mut failure = None;

        for week in 1..=weeks {
            let start_time = first + time::Duration::weeks(i64::from(week - 1));

            match self
                .book_week(organization_id, student_id, start_time, duration_minutes)
                .await
            {
                Ok((class_id, attendee_id)) => booked.push(BookedWeek {
                    week,
                    class_id,
                    attendee_id,
                    start_time,
                }),
                Err(err) => {
                    warn!(
                        student_id = %student_id,
                        week,
                        code = err.code(),
                        "Reposition series stopped: {}",
                        err
                    );
                    failure = Some(SeriesFailure {
                        week,
                        start_time,
                        code: err.code().to_string(),
                        message: err.public_message(),
                    });
                    break;
                }
            }
        }

        info!(
            "Reposition series: student={}, requested={}, booked={}",
            student_id,
            weeks,
            booked.len()
        );

        Ok(SeriesBooking { booked, failure })
    }

    async fn book_week(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
        start_time: time::OffsetDateTime,
        duration_minutes: Option<i32>,
    ) -> Result<(Uuid, Uuid)> {
        let txn = self.db.begin().await?;

        let existing = classes::Entity::find()
            .filter(classes::Column::OrganizationId.eq(organization_id))
            .filter(classes::Column::StartTime.eq(start_time))
            .order_by_asc(classes::Column::CreatedAt)
            .one(&txn)
            .await?;

        let class = match existing {
            Some(class) => class,
            None => {
                self.insert_class(
                    &txn,
                    NewClass {
                        organization_id,
                        start_time,
                        duration_minutes,
                        title: None,
                        notes: None,
                        template_id: None,
                    },
                )
                .await?
            }
        };

        let outcome = self
            .attendance
            .add_in_txn(
                &txn,
                organization_id,
                class.id,
                student_id,
                AttendanceType::Reposicao,
                false,
            )
            .await?;

        match outcome {
            AddAttendeeOutcome::Added { attendee } => {
                txn.commit().await?;
                Ok((class.id, attendee.id))
            }
            // A series never displaces anyone on its own
            AddAttendeeOutcome::DisplacementRequired { .. } | AddAttendeeOutcome::Displaced { .. } => {
                Err(ApiError::ClassFull(format!(
                    "Class at {} is full",
                    start_time
                )))
            }
        }
    }

    pub async fn insert_class(
        &self,
        txn: &DatabaseTransaction,
        class: NewClass,
    ) -> Result<classes::Model> {
        let now = time::OffsetDateTime::now_utc();
        let model = classes::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(class.organization_id),
            title: Set(class.title),
            start_time: Set(normalize_instant(class.start_time)),
            duration_minutes: Set(class
                .duration_minutes
                .unwrap_or(self.studio.class_duration_minutes)),
            student_id: Set(None),
            template_id: Set(class.template_id),
            notes: Set(class.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;

        Ok(model)
    }
}

pub struct NewClass {
    pub organization_id: Uuid,
    pub start_time: time::OffsetDateTime,
    pub duration_minutes: Option<i32>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub template_id: Option<Uuid>,
}

async fn class_detail<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    class_id: Uuid,
) -> Result<ClassDetail> {
    let class = find_class(conn, organization_id, class_id).await?;
    let attendees = load_roster(conn, organization_id, class_id)
        .await?
        .into_iter()
        .map(|(attendee, student)| AttendeeResponse::from_parts(attendee, student.as_ref()))
        .collect();

    Ok(ClassDetail {
        class: ClassResponse::from(class),
        attendees,
    })
}
