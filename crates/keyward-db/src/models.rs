//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Principal row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PrincipalRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string; `None` for principals created from an external identity
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub principal_id: Uuid,
    pub app_id: Uuid,
    pub refresh_token: String,
    pub updated_at: DateTime<Utc>,
}

/// Stored refresh token joined with the owning principal's profile
#[derive(Debug, Clone, FromRow)]
pub struct SessionWithPrincipal {
    pub refresh_token: String,
    pub name: String,
    pub email: String,
}

/// Token pair parked for an app's callback to collect
#[derive(Debug, Clone, FromRow)]
pub struct HandoffRow {
    pub id: Uuid,
    pub app_id: Uuid,
    pub principal_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
}

// Conversion implementations from Row types to keyward-types domain types
impl PrincipalRow {
    /// Convert to domain PrincipalId
    pub fn principal_id(&self) -> keyward_types::PrincipalId {
        keyward_types::PrincipalId(self.id)
    }

    /// Convert to the domain principal, dropping the credential hash
    pub fn to_principal(&self) -> keyward_types::Principal {
        keyward_types::Principal {
            id: self.principal_id(),
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

impl SessionRow {
    /// Convert to domain PrincipalId
    pub fn principal_id(&self) -> keyward_types::PrincipalId {
        keyward_types::PrincipalId(self.principal_id)
    }

    /// Convert to domain AppId
    pub fn app_id(&self) -> keyward_types::AppId {
        keyward_types::AppId(self.app_id)
    }
}
