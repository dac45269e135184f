//! Role repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use emporium_core::{Permission, RoleId};

use super::RepositoryError;
use crate::models::{Role, RoleInput};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    id: i32,
    name: String,
    description: String,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoleRow> for Role {
    type Error = RepositoryError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let permissions = row
            .permissions
            .iter()
            .map(|p| p.parse::<Permission>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("role '{}': {e}", row.name))
            })?;

        Ok(Self {
            id: RoleId::new(row.id),
            name: row.name,
            description: row.description,
            permissions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ROLE_COLUMNS: &str = "id, name, description, permissions, created_at, updated_at";

fn permission_strings(input: &RoleInput) -> Vec<String> {
    input.permissions.iter().map(|p| p.as_str().to_owned()).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for role database operations.
pub struct RoleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RoleRepository<'a> {
    /// Create a new role repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All roles, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row holds an unknown permission.
    pub async fn list_all(&self) -> Result<Vec<Role>, RepositoryError> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM role ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Role::try_from).collect()
    }

    /// Insert a new role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create(&self, input: &RoleInput) -> Result<Role, RepositoryError> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "INSERT INTO role (name, description, permissions)
             VALUES ($1, $2, $3)
             RETURNING {ROLE_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(permission_strings(input))
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        row.try_into()
    }

    /// Overwrite a role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the role does not exist, or
    /// `RepositoryError::Conflict` if the new name is taken.
    pub async fn update(&self, id: RoleId, input: &RoleInput) -> Result<Role, RepositoryError> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "UPDATE role
             SET name = $2, description = $3, permissions = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {ROLE_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(permission_strings(input))
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Insert the role or, if one with the same name exists, replace its
    /// description and permissions. Running it twice changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn upsert_by_name(&self, input: &RoleInput) -> Result<Role, RepositoryError> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "INSERT INTO role (name, description, permissions)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT role_name_key DO UPDATE
             SET description = EXCLUDED.description,
                 permissions = EXCLUDED.permissions,
                 updated_at = NOW()
             RETURNING {ROLE_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(permission_strings(input))
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }
}
