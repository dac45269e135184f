//! Admin permissions and the predefined roles.
//!
//! Permissions are `resource:action` strings carried in access tokens and
//! stored on roles. A `resource:*` grant covers every action on that resource.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A single back-office permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Permission {
    DashboardView,
    ProductsView,
    ProductsCreate,
    ProductsEdit,
    ProductsDelete,
    CategoriesView,
    CategoriesCreate,
    CategoriesEdit,
    CategoriesDelete,
    OrdersView,
    OrdersEdit,
    CustomersView,
    AnalyticsView,
    MarketingView,
    MarketingEdit,
    ReviewsView,
    ReviewsDelete,
    SettingsView,
    SettingsEdit,
    RolesView,
    RolesEdit,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Self; 21] = [
        Self::DashboardView,
        Self::ProductsView,
        Self::ProductsCreate,
        Self::ProductsEdit,
        Self::ProductsDelete,
        Self::CategoriesView,
        Self::CategoriesCreate,
        Self::CategoriesEdit,
        Self::CategoriesDelete,
        Self::OrdersView,
        Self::OrdersEdit,
        Self::CustomersView,
        Self::AnalyticsView,
        Self::MarketingView,
        Self::MarketingEdit,
        Self::ReviewsView,
        Self::ReviewsDelete,
        Self::SettingsView,
        Self::SettingsEdit,
        Self::RolesView,
        Self::RolesEdit,
    ];

    /// The wire form, e.g. `categories:edit`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DashboardView => "dashboard:view",
            Self::ProductsView => "products:view",
            Self::ProductsCreate => "products:create",
            Self::ProductsEdit => "products:edit",
            Self::ProductsDelete => "products:delete",
            Self::CategoriesView => "categories:view",
            Self::CategoriesCreate => "categories:create",
            Self::CategoriesEdit => "categories:edit",
            Self::CategoriesDelete => "categories:delete",
            Self::OrdersView => "orders:view",
            Self::OrdersEdit => "orders:edit",
            Self::CustomersView => "customers:view",
            Self::AnalyticsView => "analytics:view",
            Self::MarketingView => "marketing:view",
            Self::MarketingEdit => "marketing:edit",
            Self::ReviewsView => "reviews:view",
            Self::ReviewsDelete => "reviews:delete",
            Self::SettingsView => "settings:view",
            Self::SettingsEdit => "settings:edit",
            Self::RolesView => "roles:view",
            Self::RolesEdit => "roles:edit",
        }
    }

    /// The resource half of the permission, e.g. `categories`.
    #[must_use]
    pub fn resource(self) -> &'static str {
        let s = self.as_str();
        s.split_once(':').map_or(s, |(resource, _)| resource)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("invalid permission: {s}"))
    }
}

impl From<Permission> for String {
    fn from(p: Permission) -> Self {
        p.as_str().to_owned()
    }
}

impl TryFrom<String> for Permission {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A set of granted permission strings, as carried by an access token.
///
/// Grants are kept as raw strings so tokens minted with wildcards (`all`,
/// `products:*`) or permissions unknown to this build still round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    /// Grant that covers every permission.
    pub const ALL_GRANT: &'static str = "all";

    /// Build a set from raw grant strings.
    pub fn from_grants<I, S>(grants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            grants
                .into_iter()
                .map(Into::into)
                .map(|g| g.trim().to_owned())
                .filter(|g| !g.is_empty())
                .collect(),
        )
    }

    /// Whether `permission` is granted exactly, by `resource:*`, or by `all`.
    #[must_use]
    pub fn allows(&self, permission: Permission) -> bool {
        if self.0.contains(Self::ALL_GRANT) || self.0.contains(permission.as_str()) {
            return true;
        }
        let wildcard = format!("{}:*", permission.resource());
        self.0.contains(&wildcard)
    }

    /// Whether every permission in `required` is granted.
    #[must_use]
    pub fn allows_all(&self, required: &[Permission]) -> bool {
        required.iter().all(|p| self.allows(*p))
    }

    /// The raw grants.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of raw grants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self::from_grants(iter.into_iter().map(Permission::as_str))
    }
}

/// A role that ships with the store and can be seeded into the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredefinedRole {
    pub name: &'static str,
    pub description: &'static str,
    pub permissions: Vec<Permission>,
}

/// The roles every store starts with.
#[must_use]
pub fn predefined_roles() -> Vec<PredefinedRole> {
    use Permission as P;

    vec![
        PredefinedRole {
            name: "Super Admin",
            description: "Has all permissions and can manage all aspects of the store.",
            permissions: Permission::ALL.to_vec(),
        },
        PredefinedRole {
            name: "Product Manager",
            description: "Can manage products, categories, and view analytics.",
            permissions: vec![
                P::DashboardView,
                P::ProductsView,
                P::ProductsCreate,
                P::ProductsEdit,
                P::ProductsDelete,
                P::CategoriesView,
                P::CategoriesCreate,
                P::CategoriesEdit,
                P::CategoriesDelete,
                P::AnalyticsView,
            ],
        },
        PredefinedRole {
            name: "Order Manager",
            description: "Can view and manage orders and customers.",
            permissions: vec![
                P::DashboardView,
                P::OrdersView,
                P::OrdersEdit,
                P::CustomersView,
                P::AnalyticsView,
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_round_trips_through_str() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>(), Ok(p));
        }
        assert!("products:fly".parse::<Permission>().is_err());
    }

    #[test]
    fn exact_grant_allows_only_that_permission() {
        let set = PermissionSet::from_grants(["products:view"]);
        assert!(set.allows(Permission::ProductsView));
        assert!(!set.allows(Permission::ProductsEdit));
    }

    #[test]
    fn wildcard_grant_covers_resource() {
        let set = PermissionSet::from_grants(["categories:*"]);
        assert!(set.allows(Permission::CategoriesCreate));
        assert!(set.allows(Permission::CategoriesDelete));
        assert!(!set.allows(Permission::ProductsView));
    }

    #[test]
    fn all_grant_covers_everything() {
        let set = PermissionSet::from_grants(["all"]);
        assert!(set.allows_all(&Permission::ALL));
    }

    #[test]
    fn predefined_roles_are_distinct() {
        let roles = predefined_roles();
        assert_eq!(roles.len(), 3);
        let super_admin: PermissionSet = roles[0].permissions.iter().copied().collect();
        assert!(super_admin.allows_all(&Permission::ALL));

        let product_manager: PermissionSet = roles[1].permissions.iter().copied().collect();
        assert!(product_manager.allows(Permission::CategoriesEdit));
        assert!(!product_manager.allows(Permission::OrdersView));
    }
}
