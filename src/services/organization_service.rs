use crate::{
    config::StudioConfig,
    error::{ApiError, Result},
    models::organizations::{CreateOrganizationRequest, UpdateOrganizationRequest},
};
use entity::{organization_members, organizations, sea_orm_active_enums::MemberRole};
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Seats per class for the tenant
pub async fn class_capacity<C: ConnectionTrait>(conn: &C, organization_id: Uuid) -> Result<i32> {
    let org = organizations::Entity::find_by_id(organization_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Organization {} not found", organization_id))
        })?;
    Ok(org.class_capacity)
}

pub struct OrganizationService {
    db: DatabaseConnection,
    studio: StudioConfig,
}

impl OrganizationService {
    pub fn new(db: DatabaseConnection, studio: &StudioConfig) -> Self {
        Self {
            db,
            studio: studio.clone(),
        }
    }

    /// Create an organization owned by `owner_id`
    #[instrument(skip(self, request))]
    pub async fn create_organization(
        &self,
        owner_id: Uuid,
        request: CreateOrganizationRequest,
    ) -> Result<organizations::Model> {
        let now = time::OffsetDateTime::now_utc();
        let txn = self.db.begin().await?;

        let org = organizations::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            class_capacity: Set(request
                .class_capacity
                .unwrap_or(self.studio.default_class_capacity)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        organization_members::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(org.id),
            user_id: Set(owner_id),
            role: Set(MemberRole::Owner),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!("Created organization: id={}, owner={}", org.id, owner_id);
        Ok(org)
    }

    /// Add a user to an organization, or change their role
    #[instrument(skip(self))]
    pub async fn add_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<organization_members::Model> {
        let existing = organization_members::Entity::find()
            .filter(organization_members::Column::OrganizationId.eq(organization_id))
            .filter(organization_members::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        let member = match existing {
            Some(member) => {
                let mut active: organization_members::ActiveModel = member.into();
                active.role = Set(role);
                active.update(&self.db).await?
            }
            None => {
                organization_members::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    organization_id: Set(organization_id),
                    user_id: Set(user_id),
                    role: Set(role),
                    created_at: Set(time::OffsetDateTime::now_utc()),
                }
                .insert(&self.db)
                .await?
            }
        };

        Ok(member)
    }

    /// Resolve which organization a request acts on
    ///
    /// An explicitly requested organization must be one the user belongs to;
    /// without one the user's earliest membership is used.
    #[instrument(skip(self))]
    pub async fn resolve_tenant(
        &self,
        user_id: Uuid,
        requested: Option<Uuid>,
    ) -> Result<organization_members::Model> {
        let mut select = organization_members::Entity::find()
            .filter(organization_members::Column::UserId.eq(user_id));

        if let Some(organization_id) = requested {
            select = select.filter(organization_members::Column::OrganizationId.eq(organization_id));
        }

        let membership = select
            .order_by_asc(organization_members::Column::CreatedAt)
            .one(&self.db)
            .await?;

        membership.ok_or_else(|| {
            warn!(user_id = %user_id, requested = ?requested, "Tenant resolution failed");
            match requested {
                Some(org) => ApiError::Forbidden(format!("Not a member of organization {}", org)),
                None => ApiError::Forbidden("User has no organization".to_string()),
            }
        })
    }

    pub async fn get_organization(&self, organization_id: Uuid) -> Result<organizations::Model> {
        organizations::Entity::find_by_id(organization_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Organization {} not found", organization_id))
            })
    }

    #[instrument(skip(self, request))]
    pub async fn update_settings(
        &self,
        organization_id: Uuid,
        request: UpdateOrganizationRequest,
    ) -> Result<organizations::Model> {
        let org = self.get_organization(organization_id).await?;
        let mut active: organizations::ActiveModel = org.into();

        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(capacity) = request.class_capacity {
            if capacity < 1 {
                return Err(ApiError::BadRequest(
                    "Class capacity must be at least 1".to_string(),
                ));
            }
            active.class_capacity = Set(capacity);
        }
        active.updated_at = Set(time::OffsetDateTime::now_utc());

        let updated = active.update(&self.db).await?;
        info!(
            "Updated organization settings: id={}, class_capacity={}",
            updated.id, updated.class_capacity
        );
        Ok(updated)
    }
}
