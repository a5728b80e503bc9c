use crate::{
    error::{ApiError, Result},
    models::finance::{CreateTransactionRequest, FinancialSummary, TransactionListQuery},
    services::student_service::find_student,
};
use entity::{financial_transactions, sea_orm_active_enums::TransactionKind};
use sea_orm::{entity::*, query::*, DatabaseConnection};
use tracing::{info, instrument};
use uuid::Uuid;

pub struct FinanceService {
    db: DatabaseConnection,
}

impl FinanceService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn create_transaction(
        &self,
        organization_id: Uuid,
        request: CreateTransactionRequest,
    ) -> Result<financial_transactions::Model> {
        if request.amount_cents < 1 {
            return Err(ApiError::BadRequest(
                "Amount must be positive".to_string(),
            ));
        }
        if let Some(student_id) = request.student_id {
            find_student(&self.db, organization_id, student_id).await?;
        }

        let now = time::OffsetDateTime::now_utc();
        let tx = financial_transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            student_id: Set(request.student_id),
            kind: Set(request.kind),
            category: Set(request.category.trim().to_string()),
            description: Set(request.description),
            amount_cents: Set(request.amount_cents),
            occurred_on: Set(request.occurred_on),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(
            "Recorded transaction: id={}, kind={:?}, amount_cents={}",
            tx.id, tx.kind, tx.amount_cents
        );

        Ok(tx)
    }

    /// Newest first
    pub async fn list_transactions(
        &self,
        organization_id: Uuid,
        query: &TransactionListQuery,
    ) -> Result<Vec<financial_transactions::Model>> {
        let mut select = financial_transactions::Entity::find()
            .filter(financial_transactions::Column::OrganizationId.eq(organization_id));

        if let Some(from) = query.from {
            select = select.filter(financial_transactions::Column::OccurredOn.gte(from));
        }
        if let Some(to) = query.to {
            select = select.filter(financial_transactions::Column::OccurredOn.lte(to));
        }
        if let Some(kind) = query.kind {
            select = select.filter(financial_transactions::Column::Kind.eq(kind));
        }

        let transactions = select
            .order_by_desc(financial_transactions::Column::OccurredOn)
            .order_by_desc(financial_transactions::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(transactions)
    }

    #[instrument(skip(self))]
    pub async fn delete_transaction(&self, organization_id: Uuid, transaction_id: Uuid) -> Result<()> {
        let result = financial_transactions::Entity::delete_many()
            .filter(financial_transactions::Column::Id.eq(transaction_id))
            .filter(financial_transactions::Column::OrganizationId.eq(organization_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ApiError::NotFound(format!(
                "Transaction {} not found",
                transaction_id
            )));
        }

        Ok(())
    }

    /// Income, expense and balance over an inclusive date range
    pub async fn summary(
        &self,
        organization_id: Uuid,
        from: Option<time::Date>,
        to: Option<time::Date>,
    ) -> Result<FinancialSummary> {
        let query = TransactionListQuery {
            from,
            to,
            kind: None,
        };
        let transactions = self.list_transactions(organization_id, &query).await?;
        Ok(summarize(&transactions))
    }
}

pub fn summarize(transactions: &[financial_transactions::Model]) -> FinancialSummary {
    let (income_cents, expense_cents) =
        transactions
            .iter()
            .fold((0i64, 0i64), |(income, expense), tx| match tx.kind {
                TransactionKind::Income => (income + tx.amount_cents, expense),
                TransactionKind::Expense => (income, expense + tx.amount_cents),
            });

    FinancialSummary {
        income_cents,
        expense_cents,
        balance_cents: income_cents - expense_cents,
    }
}
