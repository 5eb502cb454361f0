use core::str::FromStr;

use serde::{Deserialize, Serialize};

use hrdesk_core::DomainError;

/// Role of an authenticated user.
///
/// The set is closed: anything the backend or persisted storage sends that
/// is not one of these fails deserialisation, so downstream code never sees
/// an unrecognised role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Hr,
    Manager,
    Employee,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Hr, Role::Manager, Role::Employee];

    /// Role granted to freshly registered accounts.
    pub const DEFAULT: Role = Role::Employee;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Hr => "hr",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Hr => "Human Resources",
            Role::Manager => "Manager",
            Role::Employee => "Employee",
        }
    }

    /// Landing page after a successful login.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Hr => "/hr/dashboard",
            Role::Manager => "/manager/dashboard",
            Role::Employee => "/employee/dashboard",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown role '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Role::Hr).unwrap(), "\"hr\"");
        let role: Role = serde_json::from_str("\"manager\"").unwrap();
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn every_role_has_a_distinct_home() {
        let homes: std::collections::HashSet<_> = Role::ALL.iter().map(Role::home_path).collect();
        assert_eq!(homes.len(), Role::ALL.len());
        assert_eq!(Role::Employee.home_path(), "/employee/dashboard");
    }
}
