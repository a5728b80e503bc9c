use crate::{
    config::StudioConfig,
    error::{ApiError, Result},
    models::students::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
    services::attendance_service::sync_primary_student,
};
use entity::{sea_orm_active_enums::StudentStatus, students};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

/// Tenant-scoped student lookup shared by the other services
pub async fn find_student<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    student_id: Uuid,
) -> Result<students::Model> {
    students::Entity::find_by_id(student_id)
        .filter(students::Column::OrganizationId.eq(organization_id))
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Student {} not found", student_id)))
}

pub struct StudentService {
    db: DatabaseConnection,
    studio: StudioConfig,
}

impl StudentService {
    pub fn new(db: DatabaseConnection, studio: &StudioConfig) -> Self {
        Self {
            db,
            studio: studio.clone(),
        }
    }

    /// New students start with no credits and count as renewed for the current month
    #[instrument(skip(self, request))]
    pub async fn create_student(
        &self,
        organization_id: Uuid,
        request: CreateStudentRequest,
    ) -> Result<students::Model> {
        let now = time::OffsetDateTime::now_utc();

        let student = students::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            full_name: Set(request.full_name.trim().to_string()),
            email: Set(request.email),
            phone: Set(request.phone),
            birth_date: Set(request.birth_date),
            enrollment_type: Set(request.enrollment_type),
            status: Set(StudentStatus::Ativo),
            reposition_credits: Set(0),
            last_credit_renewal: Set(Some(self.studio.today())),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(
            "Created student: id={}, organization={}, enrollment={:?}",
            student.id, organization_id, student.enrollment_type
        );

        Ok(student)
    }

    pub async fn get_student(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
    ) -> Result<students::Model> {
        find_student(&self.db, organization_id, student_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_students(
        &self,
        organization_id: Uuid,
        query: &StudentListQuery,
    ) -> Result<Vec<students::Model>> {
        let mut select =
            students::Entity::find().filter(students::Column::OrganizationId.eq(organization_id));

        if let Some(status) = query.status {
            select = select.filter(students::Column::Status.eq(status));
        }

        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(search) = search {
            select = select.filter(students::Column::FullName.contains(search));
        }

        let students = select
            .order_by_asc(students::Column::FullName)
            .all(&self.db)
            .await?;

        Ok(students)
    }

    /// Balance fields are never touched here; credits only move through `CreditsService`
    #[instrument(skip(self, request))]
    pub async fn update_student(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
        request: UpdateStudentRequest,
    ) -> Result<students::Model> {
        let student = find_student(&self.db, organization_id, student_id).await?;
        let mut active: students::ActiveModel = student.into();

        if let Some(full_name) = request.full_name {
            active.full_name = Set(full_name.trim().to_string());
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(birth_date) = request.birth_date {
            active.birth_date = Set(Some(birth_date));
        }
        if let Some(enrollment_type) = request.enrollment_type {
            active.enrollment_type = Set(enrollment_type);
        }
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(time::OffsetDateTime::now_utc());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Removes the student with their attendee rows and credit history
    #[instrument(skip(self))]
    pub async fn delete_student(&self, organization_id: Uuid, student_id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;
        find_student(&txn, organization_id, student_id).await?;

        let class_ids: Vec<Uuid> = entity::class_attendees::Entity::find()
            .filter(entity::class_attendees::Column::StudentId.eq(student_id))
            .filter(entity::class_attendees::Column::OrganizationId.eq(organization_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|attendee| attendee.class_id)
            .collect();

        let attendees = entity::class_attendees::Entity::delete_many()
            .filter(entity::class_attendees::Column::StudentId.eq(student_id))
            .filter(entity::class_attendees::Column::OrganizationId.eq(organization_id))
            .exec(&txn)
            .await?;

        // Primary student moves to the next attendee in seating order
        for class_id in class_ids {
            sync_primary_student(&txn, organization_id, class_id).await?;
        }

        entity::credit_events::Entity::delete_many()
            .filter(entity::credit_events::Column::StudentId.eq(student_id))
            .exec(&txn)
            .await?;

        students::Entity::delete_by_id(student_id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            "Deleted student: id={}, removed_attendances={}",
            student_id, attendees.rows_affected
        );

        Ok(())
    }

    /// Active students born in `month`, ordered by day of month
    #[instrument(skip(self))]
    pub async fn birthdays_for_month(
        &self,
        organization_id: Uuid,
        month: u8,
    ) -> Result<Vec<students::Model>> {
        let month = time::Month::try_from(month)
            .map_err(|_| ApiError::BadRequest(format!("Invalid month: {}", month)))?;

        let mut students: Vec<students::Model> = students::Entity::find()
            .filter(students::Column::OrganizationId.eq(organization_id))
            .filter(students::Column::Status.eq(StudentStatus::Ativo))
            .filter(students::Column::BirthDate.is_not_null())
            .all(&self.db)
            .await?
            .into_iter()
            .filter(|s| s.birth_date.is_some_and(|d| d.month() == month))
            .collect();

        students.sort_by_key(|s| (s.birth_date.map(|d| d.day()), s.full_name.clone()));
        Ok(students)
    }
}
