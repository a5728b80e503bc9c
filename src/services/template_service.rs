use crate::{
    config::StudioConfig,
    error::{ApiError, Result},
    models::{
        common::normalize_instant,
        templates::{GenerationReport, SavedTemplate, TemplateRequest, TemplateResponse, TemplateSlot},
    },
    services::{
        attendance_service::{insert_attendee_row, sync_primary_student},
        class_service::{ClassService, NewClass},
        student_service::find_student,
    },
};
use entity::{
    classes, recurring_class_templates, recurring_template_slots,
    sea_orm_active_enums::{AttendanceType, StudentStatus},
};
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, TransactionTrait,
};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use uuid::Uuid;

/// Every slot occurrence between two studio-local dates, inclusive, as UTC instants
pub fn expand_occurrences(
    from: time::Date,
    to: time::Date,
    slots: &[TemplateSlot],
    offset: time::UtcOffset,
) -> Vec<time::OffsetDateTime> {
    let mut occurrences = Vec::new();
    let mut day = from;

    while day <= to {
        let weekday = day.weekday().number_days_from_sunday();
        for slot in slots.iter().filter(|s| s.weekday == weekday) {
            let local = time::PrimitiveDateTime::new(day, slot.time).assume_offset(offset);
            occurrences.push(normalize_instant(local));
        }
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }

    occurrences.sort();
    occurrences
}

fn validate_slots(request: &TemplateRequest) -> Result<()> {
    if request.slots.is_empty() {
        return Err(ApiError::BadRequest(
            "A template needs at least one weekly slot".to_string(),
        ));
    }
    if let Some(end_date) = request.end_date {
        if end_date < request.start_date {
            return Err(ApiError::BadRequest(
                "End date must not be before start date".to_string(),
            ));
        }
    }

    let mut sorted = request.slots.clone();
    sorted.sort();
    if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(ApiError::BadRequest("Duplicate weekly slot".to_string()));
    }
    if let Some(slot) = sorted.iter().find(|s| s.weekday > 6) {
        return Err(ApiError::BadRequest(format!(
            "Invalid weekday {}",
            slot.weekday
        )));
    }

    Ok(())
}

pub async fn find_template<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    template_id: Uuid,
) -> Result<recurring_class_templates::Model> {
    recurring_class_templates::Entity::find_by_id(template_id)
        .filter(recurring_class_templates::Column::OrganizationId.eq(organization_id))
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Template {} not found", template_id)))
}

async fn load_slots<C: ConnectionTrait>(
    conn: &C,
    template_id: Uuid,
) -> Result<Vec<recurring_template_slots::Model>> {
    let slots = recurring_template_slots::Entity::find()
        .filter(recurring_template_slots::Column::TemplateId.eq(template_id))
        .all(conn)
        .await?;
    Ok(slots)
}

fn to_slots(rows: &[recurring_template_slots::Model]) -> Vec<TemplateSlot> {
    rows.iter()
        .map(|s| TemplateSlot {
            weekday: s.weekday as u8,
            time: s.start_time,
        })
        .collect()
}

/// Recurring class templates and their expansion into classes
pub struct TemplateService {
    db: DatabaseConnection,
    classes: Arc<ClassService>,
    studio: StudioConfig,
}

impl TemplateService {
    pub fn new(db: DatabaseConnection, classes: Arc<ClassService>, studio: &StudioConfig) -> Self {
        Self {
            db,
            classes,
            studio: studio.clone(),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_template(
        &self,
        organization_id: Uuid,
        request: TemplateRequest,
    ) -> Result<SavedTemplate> {
        validate_slots(&request)?;

        let txn = self.db.begin().await?;
        if let Some(student_id) = request.student_id {
            find_student(&txn, organization_id, student_id).await?;
        }

        let now = time::OffsetDateTime::now_utc();
        let template = recurring_class_templates::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            student_id: Set(request.student_id),
            title: Set(request.title.clone()),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            duration_minutes: Set(request
                .duration_minutes
                .unwrap_or(self.studio.class_duration_minutes)),
            is_active: Set(request.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let slots = insert_slots(&txn, template.id, &request.slots).await?;
        txn.commit().await?;

        info!(
            "Created template: id={}, slots={}",
            template.id,
            slots.len()
        );

        let template_id = template.id;
        let generation = if request.generate {
            Some(self.generate_classes(organization_id, template_id).await?)
        } else {
            None
        };

        Ok(SavedTemplate {
            template: TemplateResponse::from_parts(template, &slots),
            generation,
        })
    }

    pub async fn list_templates(&self, organization_id: Uuid) -> Result<Vec<TemplateResponse>> {
        let templates = recurring_class_templates::Entity::find()
            .filter(recurring_class_templates::Column::OrganizationId.eq(organization_id))
            .order_by_asc(recurring_class_templates::Column::CreatedAt)
            .all(&self.db)
            .await?;

        if templates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = templates.iter().map(|t| t.id).collect();
        let mut slots_by_template: HashMap<Uuid, Vec<recurring_template_slots::Model>> =
            HashMap::new();
        for slot in recurring_template_slots::Entity::find()
            .filter(recurring_template_slots::Column::TemplateId.is_in(ids))
            .all(&self.db)
            .await?
        {
            slots_by_template.entry(slot.template_id).or_default().push(slot);
        }

        Ok(templates
            .into_iter()
            .map(|t| {
                let slots = slots_by_template.remove(&t.id).unwrap_or_default();
                TemplateResponse::from_parts(t, &slots)
            })
            .collect())
    }

    pub async fn get_template(
        &self,
        organization_id: Uuid,
        template_id: Uuid,
    ) -> Result<TemplateResponse> {
        let template = find_template(&self.db, organization_id, template_id).await?;
        let slots = load_slots(&self.db, template_id).await?;
        Ok(TemplateResponse::from_parts(template, &slots))
    }

    /// Replace the template's fields and slots; existing classes only change on regeneration
    #[instrument(skip(self, request))]
    pub async fn update_template(
        &self,
        organization_id: Uuid,
        template_id: Uuid,
        request: TemplateRequest,
    ) -> Result<SavedTemplate> {
        validate_slots(&request)?;

        let txn = self.db.begin().await?;
        let template = find_template(&txn, organization_id, template_id).await?;
        if let Some(student_id) = request.student_id {
            find_student(&txn, organization_id, student_id).await?;
        }

        let mut active: recurring_class_templates::ActiveModel = template.into();
        active.student_id = Set(request.student_id);
        active.title = Set(request.title.clone());
        active.start_date = Set(request.start_date);
        active.end_date = Set(request.end_date);
        if let Some(duration) = request.duration_minutes {
            active.duration_minutes = Set(duration);
        }
        active.is_active = Set(request.is_active);
        active.updated_at = Set(time::OffsetDateTime::now_utc());
        let template = active.update(&txn).await?;

        recurring_template_slots::Entity::delete_many()
            .filter(recurring_template_slots::Column::TemplateId.eq(template_id))
            .exec(&txn)
            .await?;
        let slots = insert_slots(&txn, template_id, &request.slots).await?;
        txn.commit().await?;

        info!("Updated template: id={}", template_id);

        let generation = if request.generate {
            Some(self.generate_classes(organization_id, template_id).await?)
        } else {
            None
        };

        Ok(SavedTemplate {
            template: TemplateResponse::from_parts(template, &slots),
            generation,
        })
    }

    /// Delete a template with its future classes; past classes stay, detached
    #[instrument(skip(self))]
    pub async fn delete_template(
        &self,
        organization_id: Uuid,
        template_id: Uuid,
    ) -> Result<GenerationReport> {
        let txn = self.db.begin().await?;
        find_template(&txn, organization_id, template_id).await?;

        let report = self
            .delete_future_classes(&txn, organization_id, template_id)
            .await?;

        classes::Entity::update_many()
            .col_expr(
                classes::Column::TemplateId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(classes::Column::TemplateId.eq(template_id))
            .filter(classes::Column::OrganizationId.eq(organization_id))
            .exec(&txn)
            .await?;

        recurring_template_slots::Entity::delete_many()
            .filter(recurring_template_slots::Column::TemplateId.eq(template_id))
            .exec(&txn)
            .await?;
        recurring_class_templates::Entity::delete_by_id(template_id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(
            "Deleted template: id={}, future_classes_removed={}",
            template_id, report.deleted
        );

        Ok(report)
    }

    /// Rebuild the template's future classes in one transaction
    ///
    /// Future classes derived from the template are removed (refunding any
    /// `Reposicao` attendees) and recreated from the current slots, so running
    /// it twice yields the same schedule.
    #[instrument(skip(self))]
    pub async fn generate_classes(
        &self,
        organization_id: Uuid,
        template_id: Uuid,
    ) -> Result<GenerationReport> {
        let txn = self.db.begin().await?;
        let template = find_template(&txn, organization_id, template_id).await?;
        let slots = to_slots(&load_slots(&txn, template_id).await?);

        let mut report = self
            .delete_future_classes(&txn, organization_id, template_id)
            .await?;

        if !template.is_active {
            txn.commit().await?;
            info!(
                "Template inactive, future classes cleared: id={}, deleted={}",
                template_id, report.deleted
            );
            return Ok(report);
        }

        let today = self.studio.today();
        let from = template.start_date.max(today);
        let to = template.end_date.unwrap_or_else(|| {
            today + time::Duration::weeks(i64::from(self.studio.template_horizon_weeks))
        });

        let attendee = match template.student_id {
            Some(student_id) => {
                let student = find_student(&txn, organization_id, student_id).await?;
                (student.status == StudentStatus::Ativo).then_some(student.id)
            }
            None => None,
        };

        let now = normalize_instant(time::OffsetDateTime::now_utc());
        let occurrences: Vec<time::OffsetDateTime> =
            expand_occurrences(from, to, &slots, self.studio.utc_offset())
                .into_iter()
                .filter(|at| *at >= now)
                .collect();

        for start_time in occurrences {
            let class = self
                .classes
                .insert_class(
                    &txn,
                    NewClass {
                        organization_id,
                        start_time,
                        duration_minutes: Some(template.duration_minutes),
                        title: template.title.clone(),
                        notes: None,
                        template_id: Some(template_id),
                    },
                )
                .await?;

            if let Some(student_id) = attendee {
                insert_attendee_row(
                    &txn,
                    organization_id,
                    class.id,
                    student_id,
                    AttendanceType::Recorrente,
                )
                .await?;
                sync_primary_student(&txn, organization_id, class.id).await?;
            }
            report.created += 1;
        }

        txn.commit().await?;

        info!(
            "Generated classes from template: id={}, deleted={}, created={}",
            template_id, report.deleted, report.created
        );

        Ok(report)
    }

    async fn delete_future_classes(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        template_id: Uuid,
    ) -> Result<GenerationReport> {
        let now = normalize_instant(time::OffsetDateTime::now_utc());
        let future = classes::Entity::find()
            .filter(classes::Column::OrganizationId.eq(organization_id))
            .filter(classes::Column::TemplateId.eq(template_id))
            .filter(classes::Column::StartTime.gte(now))
            .all(txn)
            .await?;

        let mut report = GenerationReport::default();
        for class in &future {
            let credited = self.classes.delete_in_txn(txn, organization_id, class).await?;
            report.credits_returned_to.extend(credited);
            report.deleted += 1;
        }

        Ok(report)
    }
}

async fn insert_slots(
    txn: &DatabaseTransaction,
    template_id: Uuid,
    slots: &[TemplateSlot],
) -> Result<Vec<recurring_template_slots::Model>> {
    let mut rows = Vec::with_capacity(slots.len());
    for slot in slots {
        let row = recurring_template_slots::ActiveModel {
            id: Set(Uuid::new_v4()),
            template_id: Set(template_id),
            weekday: Set(i16::from(slot.weekday)),
            start_time: Set(slot.time),
        }
        .insert(txn)
        .await?;
        rows.push(row);
    }
    Ok(rows)
}
