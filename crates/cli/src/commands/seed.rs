//! Seed the database with predefined roles or a category tree.
//!
//! # Usage
//!
//! ```bash
//! # Insert or refresh the roles every store starts with
//! emporium seed roles
//!
//! # Create a category hierarchy from YAML
//! emporium seed categories categories.yaml
//!
//! # Show what would be created without touching the database
//! emporium seed categories categories.yaml --dry-run
//! ```
//!
//! # Category file format
//!
//! ```yaml
//! - name: Electronics
//!   description: Gadgets and gear
//!   image: https://cdn.example.com/electronics.jpg
//!   children:
//!     - name: Headphones
//!       description: Over-ear and in-ear
//!       image: https://cdn.example.com/headphones.jpg
//! ```
//!
//! Seeding is idempotent: a category whose name already exists under the
//! same parent is reused, not duplicated.

use std::collections::VecDeque;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use emporium_admin::db::{self, RepositoryError, roles::RoleRepository};
use emporium_admin::models::RoleInput;
use emporium_core::catalog::{
    Category, CategoryInput, CategoryStore, CategoryTree, MemoryStore, PgCatalogStore,
};
use emporium_core::config::{ConfigError, get_database_url};
use emporium_core::{CatalogError, CategoryId, predefined_roles};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid category file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Category '{name}': {source}")]
    Category { name: String, source: CatalogError },
}

/// One node of the category file.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub children: Vec<CategorySeed>,
}

impl CategorySeed {
    fn input(&self, parent: Option<CategoryId>) -> CategoryInput {
        CategoryInput {
            name: self.name.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            parent,
        }
    }
}

/// Outcome of seeding a category file.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub created: Vec<Category>,
    pub existing: usize,
}

/// Parse a category file.
///
/// # Errors
///
/// Returns `SeedError::Yaml` if the document does not match the format.
pub fn parse_categories(yaml: &str) -> Result<Vec<CategorySeed>, SeedError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Create every category in `seeds` through the category rules, parents
/// before children.
///
/// # Errors
///
/// Stops at the first category the rules reject.
pub async fn seed_tree<S: CategoryStore>(
    tree: &CategoryTree<S>,
    seeds: &[CategorySeed],
) -> Result<SeedReport, SeedError> {
    let existing = tree.list().await.map_err(|source| SeedError::Category {
        name: "(listing)".to_string(),
        source,
    })?;

    let mut report = SeedReport::default();
    let mut queue: VecDeque<(Option<CategoryId>, &CategorySeed)> =
        seeds.iter().map(|seed| (None, seed)).collect();

    while let Some((parent, seed)) = queue.pop_front() {
        let found = existing
            .iter()
            .chain(&report.created)
            .find(|c| c.parent == parent && c.name.eq_ignore_ascii_case(seed.name.trim()))
            .map(|c| c.id);

        let id = if let Some(id) = found {
            report.existing += 1;
            id
        } else {
            let category = tree
                .create(seed.input(parent))
                .await
                .map_err(|source| SeedError::Category {
                    name: seed.name.clone(),
                    source,
                })?;
            info!(path = %category.path(), "Category created");
            let id = category.id;
            report.created.push(category);
            id
        };

        queue.extend(seed.children.iter().map(|child| (Some(id), child)));
    }

    Ok(report)
}

/// Seed categories from a YAML file.
///
/// With `dry_run`, the tree is built in memory and nothing is written.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database is
/// unreachable, or a category is rejected.
pub async fn categories(file_path: &str, dry_run: bool) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: file_path.to_string(),
            source,
        })?;
    let seeds = parse_categories(&content)?;

    info!(path = %file_path, roots = seeds.len(), dry_run, "Loaded category file");

    let report = if dry_run {
        seed_tree(&CategoryTree::new(MemoryStore::new()), &seeds).await?
    } else {
        dotenvy::dotenv().ok();
        let pool = db::create_pool(&get_database_url("DATABASE_URL")?).await?;
        info!("Connected to database");
        seed_tree(&CategoryTree::new(PgCatalogStore::new(pool)), &seeds).await?
    };

    info!("Seeding complete!");
    info!("  Categories created: {}", report.created.len());
    info!("  Categories already present: {}", report.existing);
    if dry_run {
        for category in &report.created {
            info!("  {} ({})", category.path(), category.name);
        }
    }

    Ok(())
}

/// Insert the predefined roles, refreshing any that already exist.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing or a write fails.
pub async fn roles() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();
    let pool = db::create_pool(&get_database_url("DATABASE_URL")?).await?;
    let repo = RoleRepository::new(&pool);

    for role in predefined_roles() {
        let role = repo.upsert_by_name(&RoleInput::from(&role)).await?;
        info!(role = %role.name, permissions = role.permissions.len(), "Role seeded");
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FILE: &str = r"
- name: Electronics
  description: Gadgets and gear
  image: https://cdn.example.com/electronics.jpg
  children:
    - name: Headphones
      description: Over-ear and in-ear
      image: https://cdn.example.com/headphones.jpg
      children:
        - name: Wireless
          description: Bluetooth headphones
          image: https://cdn.example.com/wireless.jpg
    - name: Cameras
      description: Digital and film
      image: https://cdn.example.com/cameras.jpg
- name: Books
  description: Paper and ink
  image: https://cdn.example.com/books.jpg
";

    #[test]
    fn test_parse_nested_file() {
        let seeds = parse_categories(FILE).unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].children.len(), 2);
        assert!(seeds[1].children.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert!(parse_categories("- name: Electronics\n").is_err());
    }

    #[tokio::test]
    async fn test_seed_builds_ancestors() {
        let tree = CategoryTree::new(MemoryStore::new());
        let report = seed_tree(&tree, &parse_categories(FILE).unwrap()).await.unwrap();

        assert_eq!(report.created.len(), 5);
        assert_eq!(report.existing, 0);

        let wireless = tree.get_by_slug("wireless").await.unwrap().unwrap();
        assert_eq!(wireless.path(), "electronics/headphones/wireless");
        assert_eq!(wireless.ancestors.len(), 2);
    }

    #[tokio::test]
    async fn test_seed_twice_reuses_categories() {
        let tree = CategoryTree::new(MemoryStore::new());
        let seeds = parse_categories(FILE).unwrap();
        seed_tree(&tree, &seeds).await.unwrap();

        let again = seed_tree(&tree, &seeds).await.unwrap();
        assert!(again.created.is_empty());
        assert_eq!(again.existing, 5);
        assert_eq!(tree.list().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_invalid_category_names_the_culprit() {
        let tree = CategoryTree::new(MemoryStore::new());
        let seeds = parse_categories(
            "- name: Books\n  description: ''\n  image: https://cdn.example.com/b.jpg\n",
        )
        .unwrap();

        let err = seed_tree(&tree, &seeds).await.unwrap_err();
        assert!(matches!(err, SeedError::Category { ref name, .. } if name == "Books"));
    }
}
