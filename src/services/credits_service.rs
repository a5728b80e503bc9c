use crate::{
    config::StudioConfig,
    error::{ApiError, Result},
    models::credits::{CreditBalance, CreditEventRecord},
    services::student_service::find_student,
};
use entity::{sea_orm_active_enums::CreditEventKind, students};
use sea_orm::{
    entity::*, query::*, sea_query::Expr, Condition, DatabaseConnection, DatabaseTransaction,
    TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

const DEFAULT_HISTORY_LIMIT: u64 = 50;
const MAX_HISTORY_LIMIT: u64 = 500;

/// Reposition-credit bookkeeping
///
/// Every balance change is a single conditional `UPDATE` checked through rows
/// affected, so concurrent writers can never push a balance below zero. Each
/// operation has an `_in_txn` form for callers that combine credit changes
/// with class or attendee writes.
pub struct CreditsService {
    db: DatabaseConnection,
    studio: StudioConfig,
}

impl CreditsService {
    pub fn new(db: DatabaseConnection, studio: &StudioConfig) -> Self {
        Self {
            db,
            studio: studio.clone(),
        }
    }

    /// Current balance, applying the monthly renewal first
    #[instrument(skip(self))]
    pub async fn get_balance(&self, organization_id: Uuid, student_id: Uuid) -> Result<CreditBalance> {
        let txn = self.db.begin().await?;
        let balance = self.balance_in_txn(&txn, organization_id, student_id).await?;
        txn.commit().await?;
        Ok(balance)
    }

    pub async fn balance_in_txn(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        student_id: Uuid,
    ) -> Result<CreditBalance> {
        let renewed = self.renew_if_due(txn, organization_id, student_id).await?;
        let student = find_student(txn, organization_id, student_id).await?;

        Ok(CreditBalance {
            student_id,
            credits: student.reposition_credits,
            last_credit_renewal: student.last_credit_renewal,
            renewed_this_month: renewed,
        })
    }

    /// Take one credit for a make-up booking
    #[instrument(skip(self))]
    pub async fn consume_credit(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
        class_id: Option<Uuid>,
    ) -> Result<i32> {
        let txn = self.db.begin().await?;
        let balance = self
            .consume_in_txn(&txn, organization_id, student_id, class_id)
            .await?;
        txn.commit().await?;
        Ok(balance)
    }

    /// Returns the balance left after consuming
    pub async fn consume_in_txn(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        student_id: Uuid,
        class_id: Option<Uuid>,
    ) -> Result<i32> {
        self.renew_if_due(txn, organization_id, student_id).await?;

        let balance = apply_delta(txn, organization_id, student_id, -1)
            .await?
            .ok_or_else(|| {
                warn!(student_id = %student_id, "Reposition credit consumption blocked: no credits");
                ApiError::InsufficientCredits { student_id }
            })?;

        record_event(
            txn,
            NewCreditEvent {
                organization_id,
                student_id,
                kind: CreditEventKind::Consumed,
                amount: -1,
                balance_after: balance,
                reason: None,
                class_id,
                performed_by: None,
            },
        )
        .await?;

        info!(
            "Consumed reposition credit: student={}, class={:?}, balance={}",
            student_id, class_id, balance
        );

        Ok(balance)
    }

    /// Give credits back after a cancellation, displacement or edit
    #[instrument(skip(self))]
    pub async fn return_credit(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
        amount: i32,
        class_id: Option<Uuid>,
    ) -> Result<i32> {
        let txn = self.db.begin().await?;
        let balance = self
            .return_in_txn(&txn, organization_id, student_id, amount, class_id)
            .await?;
        txn.commit().await?;
        Ok(balance)
    }

    pub async fn return_in_txn(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        student_id: Uuid,
        amount: i32,
        class_id: Option<Uuid>,
    ) -> Result<i32> {
        if amount < 1 {
            return Err(ApiError::BadRequest(
                "Returned credit amount must be positive".to_string(),
            ));
        }

        self.renew_if_due(txn, organization_id, student_id).await?;

        let balance = apply_delta(txn, organization_id, student_id, amount)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Student {} not found", student_id)))?;

        record_event(
            txn,
            NewCreditEvent {
                organization_id,
                student_id,
                kind: CreditEventKind::Returned,
                amount,
                balance_after: balance,
                reason: None,
                class_id,
                performed_by: None,
            },
        )
        .await?;

        info!(
            "Returned {} reposition credit(s): student={}, class={:?}, balance={}",
            amount, student_id, class_id, balance
        );

        Ok(balance)
    }

    /// Admin correction with an audit reason; never drives the balance negative
    #[instrument(skip(self, reason))]
    pub async fn adjust_manual(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
        amount: i32,
        reason: &str,
        performed_by: Option<Uuid>,
    ) -> Result<CreditBalance> {
        if amount == 0 {
            return Err(ApiError::BadRequest(
                "Adjustment amount must not be zero".to_string(),
            ));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApiError::BadRequest(
                "Adjustment reason is required".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        self.renew_if_due(&txn, organization_id, student_id).await?;

        let balance = apply_delta(&txn, organization_id, student_id, amount)
            .await?
            .ok_or(ApiError::InsufficientCredits { student_id })?;

        record_event(
            &txn,
            NewCreditEvent {
                organization_id,
                student_id,
                kind: CreditEventKind::ManualAdjustment,
                amount,
                balance_after: balance,
                reason: Some(reason.to_string()),
                class_id: None,
                performed_by,
            },
        )
        .await?;

        let student = find_student(&txn, organization_id, student_id).await?;
        txn.commit().await?;

        info!(
            "Manual reposition credit adjustment: student={}, amount={}, balance={}",
            student_id, amount, balance
        );

        Ok(CreditBalance {
            student_id,
            credits: balance,
            last_credit_renewal: student.last_credit_renewal,
            renewed_this_month: false,
        })
    }

    /// One credit for a missed class
    pub async fn grant_for_absence_in_txn(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        student_id: Uuid,
        class_id: Uuid,
    ) -> Result<i32> {
        self.renew_if_due(txn, organization_id, student_id).await?;

        let balance = apply_delta(txn, organization_id, student_id, 1)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Student {} not found", student_id)))?;

        record_event(
            txn,
            NewCreditEvent {
                organization_id,
                student_id,
                kind: CreditEventKind::AbsenceGrant,
                amount: 1,
                balance_after: balance,
                reason: Some("Absence".to_string()),
                class_id: Some(class_id),
                performed_by: None,
            },
        )
        .await?;

        info!(
            "Granted absence reposition credit: student={}, class={}, balance={}",
            student_id, class_id, balance
        );

        Ok(balance)
    }

    /// Credit ledger, newest first
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
        limit: Option<u64>,
    ) -> Result<Vec<CreditEventRecord>> {
        find_student(&self.db, organization_id, student_id).await?;

        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);

        let events = entity::credit_events::Entity::find()
            .filter(entity::credit_events::Column::OrganizationId.eq(organization_id))
            .filter(entity::credit_events::Column::StudentId.eq(student_id))
            .order_by_desc(entity::credit_events::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(events.into_iter().map(CreditEventRecord::from).collect())
    }

    /// Lazy monthly reset as an idempotent conditional transition
    ///
    /// Only the first caller in a new month matches the `WHERE` clause; any
    /// concurrent caller sees zero rows affected and leaves the balance alone.
    async fn renew_if_due(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        student_id: Uuid,
    ) -> Result<bool> {
        let student = find_student(txn, organization_id, student_id).await?;
        let today = self.studio.today();

        if !renewal_due(student.last_credit_renewal, today) {
            return Ok(false);
        }

        let result = students::Entity::update_many()
            .col_expr(students::Column::RepositionCredits, Expr::value(0))
            .col_expr(students::Column::LastCreditRenewal, Expr::value(today))
            .col_expr(
                students::Column::UpdatedAt,
                Expr::value(time::OffsetDateTime::now_utc()),
            )
            .filter(students::Column::Id.eq(student_id))
            .filter(students::Column::OrganizationId.eq(organization_id))
            .filter(
                Condition::any()
                    .add(students::Column::LastCreditRenewal.is_null())
                    .add(students::Column::LastCreditRenewal.lt(first_of_month(today))),
            )
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(false);
        }

        record_event(
            txn,
            NewCreditEvent {
                organization_id,
                student_id,
                kind: CreditEventKind::MonthlyReset,
                amount: -student.reposition_credits,
                balance_after: 0,
                reason: Some(format!("Monthly renewal {}", today)),
                class_id: None,
                performed_by: None,
            },
        )
        .await?;

        info!(
            "Renewed reposition credits: student={}, discarded={}, renewal_date={}",
            student_id, student.reposition_credits, today
        );

        Ok(true)
    }
}

/// A renewal is due when the student was never renewed or last renewed before this month
pub fn renewal_due(last_renewal: Option<time::Date>, today: time::Date) -> bool {
    match last_renewal {
        None => true,
        Some(last) => last < first_of_month(today),
    }
}

fn first_of_month(date: time::Date) -> time::Date {
    date - time::Duration::days(date.day() as i64 - 1)
}

/// Apply a signed change; a decrement only matches while the balance covers it
///
/// Returns the new balance, or `None` when no row matched.
async fn apply_delta(
    txn: &DatabaseTransaction,
    organization_id: Uuid,
    student_id: Uuid,
    delta: i32,
) -> Result<Option<i32>> {
    let mut update = students::Entity::update_many()
        .col_expr(
            students::Column::RepositionCredits,
            Expr::col(students::Column::RepositionCredits).add(delta),
        )
        .col_expr(
            students::Column::UpdatedAt,
            Expr::value(time::OffsetDateTime::now_utc()),
        )
        .filter(students::Column::Id.eq(student_id))
        .filter(students::Column::OrganizationId.eq(organization_id));

    if delta < 0 {
        update = update.filter(students::Column::RepositionCredits.gte(-delta));
    }

    let result = update.exec(txn).await?;
    if result.rows_affected == 0 {
        return Ok(None);
    }

    let student = find_student(txn, organization_id, student_id).await?;
    Ok(Some(student.reposition_credits))
}

struct NewCreditEvent {
    organization_id: Uuid,
    student_id: Uuid,
    kind: CreditEventKind,
    amount: i32,
    balance_after: i32,
    reason: Option<String>,
    class_id: Option<Uuid>,
    performed_by: Option<Uuid>,
}

async fn record_event(txn: &DatabaseTransaction, event: NewCreditEvent) -> Result<()> {
    let model = entity::credit_events::ActiveModel {
        id: Set(Uuid::now_v7()),
        organization_id: Set(event.organization_id),
        student_id: Set(event.student_id),
        kind: Set(event.kind),
        amount: Set(event.amount),
        balance_after: Set(event.balance_after),
        reason: Set(event.reason),
        class_id: Set(event.class_id),
        performed_by: Set(event.performed_by),
        created_at: Set(time::OffsetDateTime::now_utc()),
    };

    entity::credit_events::Entity::insert(model)
        .exec_without_returning(txn)
        .await?;

    Ok(())
}
