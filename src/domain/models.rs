use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Manager,
    Employee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Manager => "MANAGER",
            UserRole::Employee => "EMPLOYEE",
        }
    }

    /// Admins and managers run the dashboard; employees only see their own area.
    pub fn is_manager(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }
}

impl TryFrom<&str> for UserRole {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(UserRole::Admin),
            "MANAGER" => Ok(UserRole::Manager),
            "EMPLOYEE" => Ok(UserRole::Employee),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    // argon2 PHC string, never serialized; web DTOs carry everything else
    pub hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    Inactive,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
        }
    }
}

impl TryFrom<&str> for ClientStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "active" => Ok(ClientStatus::Active),
            "inactive" => Ok(ClientStatus::Inactive),
            _ => Err(()),
        }
    }
}

/// External-survey customer record managed from the client screens.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: Option<String>,
    pub surveys_count: i64,
    pub rating: f64,
    pub status: ClientStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [UserRole::Admin, UserRole::Manager, UserRole::Employee] {
            assert_eq!(UserRole::try_from(role.as_str()), Ok(role));
        }
        assert_eq!(UserRole::try_from(" manager "), Ok(UserRole::Manager));
        assert!(UserRole::try_from("founder").is_err());
    }

    #[test]
    fn test_manager_gate() {
        assert!(UserRole::Admin.is_manager());
        assert!(UserRole::Manager.is_manager());
        assert!(!UserRole::Employee.is_manager());
    }
}
