use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tenant-scoped employment record linked one-to-one with a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub employee_code: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Code assigned at registration, derived from the user id.
    pub fn code_for(user_id: Uuid) -> String {
        let simple = user_id.simple().to_string();
        format!("EMP-{}", simple[..8].to_ascii_uppercase())
    }
}
