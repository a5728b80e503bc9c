use entity::sea_orm_active_enums::MemberRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(range(min = 1, max = 200))]
    pub class_capacity: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(range(min = 1, max = 200))]
    pub class_capacity: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResponse {
    pub id: Uuid,
    pub name: String,
    pub class_capacity: i32,
    pub role: Option<MemberRole>,
}

impl OrganizationResponse {
    pub fn from_parts(org: entity::organizations::Model, role: Option<MemberRole>) -> Self {
        Self {
            id: org.id,
            name: org.name,
            class_capacity: org.class_capacity,
            role,
        }
    }
}

/// Grant a user access to the current organization
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub role: MemberRole,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: MemberRole,
}

impl From<entity::organization_members::Model> for MemberResponse {
    fn from(member: entity::organization_members::Model) -> Self {
        Self {
            user_id: member.user_id,
            organization_id: member.organization_id,
            role: member.role,
        }
    }
}
