//! Staff roles and the permissions they grant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emporium_core::{CatalogError, Permission, PredefinedRole, RoleId};

/// A stored role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin-supplied role fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub permissions: Vec<Permission>,
}

impl RoleInput {
    /// Trim the name and description, drop duplicate permissions and keep
    /// them in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the name is empty or no
    /// permission is granted.
    pub fn normalized(self) -> Result<Self, CatalogError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(CatalogError::validation("Role name is required."));
        }

        let permissions: Vec<Permission> = Permission::ALL
            .into_iter()
            .filter(|p| self.permissions.contains(p))
            .collect();
        if permissions.is_empty() {
            return Err(CatalogError::validation(
                "A role needs at least one permission.",
            ));
        }

        Ok(Self {
            name,
            description: self.description.trim().to_owned(),
            permissions,
        })
    }
}

impl From<&PredefinedRole> for RoleInput {
    fn from(role: &PredefinedRole) -> Self {
        Self {
            name: role.name.to_owned(),
            description: role.description.to_owned(),
            permissions: role.permissions.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::predefined_roles;

    use super::*;

    #[test]
    fn test_normalized_orders_and_dedups_permissions() {
        let input: RoleInput = serde_json::from_str(
            r#"{"name": " Support ", "permissions": ["reviews:delete", "dashboard:view", "reviews:delete"]}"#,
        )
        .unwrap();
        let input = input.normalized().unwrap();
        assert_eq!(input.name, "Support");
        assert_eq!(
            input.permissions,
            vec![Permission::DashboardView, Permission::ReviewsDelete]
        );
    }

    #[test]
    fn test_unknown_permission_is_rejected_by_serde() {
        let parsed = serde_json::from_str::<RoleInput>(
            r#"{"name": "Support", "permissions": ["reviews:approve"]}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_role_needs_name_and_permissions() {
        let blank = RoleInput {
            name: "  ".into(),
            description: String::new(),
            permissions: vec![Permission::DashboardView],
        };
        assert!(blank.normalized().is_err());

        let empty = RoleInput {
            name: "Support".into(),
            description: String::new(),
            permissions: vec![],
        };
        assert_eq!(
            empty.normalized().unwrap_err().to_string(),
            "A role needs at least one permission."
        );
    }

    #[test]
    fn test_predefined_roles_are_valid_inputs() {
        for role in predefined_roles() {
            let input = RoleInput::from(&role).normalized().unwrap();
            assert_eq!(input.name, role.name);
        }
    }
}
