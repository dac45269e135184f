//! The category hierarchy.
//!
//! Categories live in a flat table keyed by ID. Each row points at its parent
//! and carries a materialized copy of its ancestor path (`{id, name, slug}`
//! from the root down to the immediate parent) so breadcrumbs and URLs render
//! without walking the tree.
//!
//! [`CategoryTree`] owns the save protocol:
//!
//! 1. If the name changed (or there is no slug yet), derive a fresh unique slug.
//! 2. If the parent changed, rebuild the ancestor path from the new parent.
//!
//! Ancestor snapshots are copied, not linked: renaming a category does not
//! touch the snapshots stored on its descendants. They are refreshed the next
//! time each descendant's parent is set.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{CatalogError, CatalogResult, ConflictKind, StoreError};
use crate::types::{CategoryId, Slug};

use super::slug::unique_slug;
use super::store::CategoryStore;

/// How many times a write is retried after losing a slug race.
const MAX_SLUG_RETRIES: usize = 3;

/// Parent chains deeper than this are treated as corrupt.
const MAX_DEPTH: usize = 64;

/// Snapshot of an ancestor taken when the descendant's parent was set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
}

impl AncestorRef {
    /// Snapshot a category as it is right now.
    #[must_use]
    pub fn snapshot(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }
}

/// A stored category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    /// Public URL of the category image.
    pub image: String,
    pub parent: Option<CategoryId>,
    /// Root first, immediate parent last. Empty for top-level categories.
    pub ancestors: Vec<AncestorRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Whether this is a top-level (navigation menu) category.
    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    /// Slash-joined slug path from the root, e.g. `electronics/headphones`.
    #[must_use]
    pub fn path(&self) -> String {
        self.ancestors
            .iter()
            .map(|a| a.slug.as_str())
            .chain(std::iter::once(self.slug.as_str()))
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Admin-supplied fields for creating or editing a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub parent: Option<CategoryId>,
}

impl CategoryInput {
    /// Trim fields and reject missing required values.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` naming the first missing field.
    pub fn normalized(self) -> CatalogResult<Self> {
        let name = self.name.trim().to_owned();
        let description = self.description.trim().to_owned();
        let image = self.image.trim().to_owned();

        if name.is_empty() {
            return Err(CatalogError::validation("Category name is required."));
        }
        if description.is_empty() {
            return Err(CatalogError::validation("Category description is required."));
        }
        if image.is_empty() {
            return Err(CatalogError::validation("Category image is required."));
        }

        Ok(Self {
            name,
            description,
            image,
            parent: self.parent,
        })
    }
}

/// A category row with its derived fields computed, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub image: String,
    pub parent: Option<CategoryId>,
    pub ancestors: Vec<AncestorRef>,
}

/// A category with its children, for menus.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

enum Target {
    Insert,
    Update(CategoryId),
}

/// Keeps the category hierarchy consistent on top of a [`CategoryStore`].
#[derive(Debug, Clone)]
pub struct CategoryTree<S> {
    store: S,
}

impl<S: CategoryStore> CategoryTree<S> {
    /// Wrap a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Derive a slug for `name` that is unused or already belongs to `exclude`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lookup fails.
    pub async fn unique_slug(&self, name: &str, exclude: Option<CategoryId>) -> CatalogResult<Slug> {
        unique_slug(&self.store, name, exclude).await
    }

    /// Ancestor path for a category placed under `parent`.
    ///
    /// `category` is the ID of the category being moved (`None` when it is
    /// being created); it is used to reject moves that would create a cycle.
    ///
    /// # Errors
    ///
    /// - `CatalogError::ParentNotFound` if `parent` does not exist.
    /// - `CatalogError::CycleDetected` if `parent` is `category` or one of its descendants.
    pub async fn recompute_ancestors(
        &self,
        category: Option<CategoryId>,
        parent: Option<CategoryId>,
    ) -> CatalogResult<Vec<AncestorRef>> {
        let Some(parent_id) = parent else {
            return Ok(Vec::new());
        };

        let parent = self
            .store
            .get_category(parent_id)
            .await?
            .ok_or(CatalogError::ParentNotFound(parent_id))?;

        if let Some(id) = category {
            self.ensure_not_descendant(id, &parent).await?;
        }

        let mut ancestors = parent.ancestors.clone();
        ancestors.push(AncestorRef::snapshot(&parent));
        Ok(ancestors)
    }

    /// Walk the live parent chain of `parent` and fail if `id` is on it.
    ///
    /// Uses the stored `parent` links rather than the ancestor snapshots,
    /// which can be stale.
    async fn ensure_not_descendant(&self, id: CategoryId, parent: &Category) -> CatalogResult<()> {
        let cycle = || CatalogError::CycleDetected {
            category: id,
            parent: parent.id,
        };

        if parent.id == id {
            return Err(cycle());
        }

        let mut next = parent.parent;
        let mut depth = 0;
        while let Some(current) = next {
            if current == id {
                return Err(cycle());
            }
            depth += 1;
            if depth > MAX_DEPTH {
                return Err(CatalogError::validation("Category hierarchy is too deep."));
            }
            next = self
                .store
                .get_category(current)
                .await?
                .and_then(|c| c.parent);
        }
        Ok(())
    }

    /// Run the save protocol against the previous state (if any).
    async fn prepare(
        &self,
        id: Option<CategoryId>,
        previous: Option<&Category>,
        input: CategoryInput,
    ) -> CatalogResult<CategoryRecord> {
        let name_changed = previous.is_none_or(|p| p.name != input.name);
        let slug = match previous {
            Some(p) if !name_changed && !p.slug.is_empty() => p.slug.clone(),
            _ => self.unique_slug(&input.name, id).await?,
        };

        let parent_changed = previous.is_none_or(|p| p.parent != input.parent);
        let ancestors = match previous {
            Some(p) if !parent_changed => p.ancestors.clone(),
            _ => self.recompute_ancestors(id, input.parent).await?,
        };

        Ok(CategoryRecord {
            name: input.name,
            slug,
            description: input.description,
            image: input.image,
            parent: input.parent,
            ancestors,
        })
    }

    /// Write a prepared record, regenerating the slug if a concurrent
    /// writer claimed it between the probe and the write.
    async fn write(&self, target: Target, mut record: CategoryRecord) -> CatalogResult<Category> {
        let exclude = match target {
            Target::Insert => None,
            Target::Update(id) => Some(id),
        };

        let mut attempt = 0;
        loop {
            let result = match target {
                Target::Insert => self.store.insert_category(&record).await.map(Some),
                Target::Update(id) => self.store.update_category(id, &record).await,
            };

            match result {
                Ok(Some(category)) => return Ok(category),
                Ok(None) => {
                    let id = exclude.unwrap_or_else(|| CategoryId::new(0));
                    return Err(CatalogError::CategoryNotFound(id));
                }
                Err(e) if e.conflict_kind() == Some(ConflictKind::Slug) => {
                    attempt += 1;
                    if attempt > MAX_SLUG_RETRIES {
                        return Err(CatalogError::SlugConflict(record.slug.into_inner()));
                    }
                    warn!(slug = %record.slug, attempt, "slug claimed concurrently, regenerating");
                    record.slug = self.unique_slug(&record.name, exclude).await?;
                }
                Err(e) => return Err(conflict_to_catalog(e, &record)),
            }
        }
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns validation, missing-parent, conflict or store errors.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CategoryInput) -> CatalogResult<Category> {
        let input = input.normalized()?;
        let record = self.prepare(None, None, input).await?;
        let category = self.write(Target::Insert, record).await?;
        info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    /// Edit a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` if `id` does not exist, plus everything
    /// [`Self::create`] can return and `CycleDetected` for an invalid move.
    #[instrument(skip(self, input), fields(category_id = %id))]
    pub async fn update(&self, id: CategoryId, input: CategoryInput) -> CatalogResult<Category> {
        let input = input.normalized()?;
        let previous = self
            .store
            .get_category(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))?;
        let record = self.prepare(Some(id), Some(&previous), input).await?;
        let category = self.write(Target::Update(id), record).await?;
        info!(slug = %category.slug, "Category updated");
        Ok(category)
    }

    /// Delete a category.
    ///
    /// Children are never orphaned: a category with subcategories or
    /// products must be emptied first.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound`, `HasChildren`, `InUse` or store errors.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete(&self, id: CategoryId) -> CatalogResult<()> {
        if self.store.get_category(id).await?.is_none() {
            return Err(CatalogError::CategoryNotFound(id));
        }
        if self.store.count_children(id).await? > 0 {
            return Err(CatalogError::HasChildren(id));
        }
        if self.store.category_in_use(id).await? {
            return Err(CatalogError::InUse(id));
        }
        if !self.store.delete_category(id).await? {
            return Err(CatalogError::CategoryNotFound(id));
        }
        info!("Category deleted");
        Ok(())
    }

    /// Every category, flat.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list(&self) -> CatalogResult<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    /// One category by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get(&self, id: CategoryId) -> CatalogResult<Option<Category>> {
        Ok(self.store.get_category(id).await?)
    }

    /// One category by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_by_slug(&self, slug: &str) -> CatalogResult<Option<Category>> {
        Ok(self.store.get_category_by_slug(slug).await?)
    }

    /// Categories without a parent, for navigation menus.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn top_level(&self) -> CatalogResult<Vec<Category>> {
        let all = self.store.list_categories().await?;
        Ok(all.into_iter().filter(Category::is_top_level).collect())
    }

    /// The whole hierarchy as nested nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn tree(&self) -> CatalogResult<Vec<CategoryNode>> {
        Ok(build_tree(self.store.list_categories().await?))
    }
}

/// Translate a non-slug store conflict into a catalog error.
fn conflict_to_catalog(err: StoreError, record: &CategoryRecord) -> CatalogError {
    match err.conflict_kind() {
        Some(ConflictKind::SiblingName) => CatalogError::Conflict(format!(
            "A category named '{}' already exists at this level.",
            record.name
        )),
        Some(_) => CatalogError::Conflict(err.to_string()),
        None => CatalogError::Store(err),
    }
}

/// Nest a flat category list under its parents.
///
/// Categories whose parent is missing from the list are treated as roots.
/// Sibling order follows the input order.
#[must_use]
pub fn build_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    let known: HashSet<CategoryId> = categories.iter().map(|c| c.id).collect();
    let mut by_parent: HashMap<Option<CategoryId>, Vec<Category>> = HashMap::new();
    for category in categories {
        let key = category.parent.filter(|p| known.contains(p));
        by_parent.entry(key).or_default().push(category);
    }

    let mut visited = HashSet::new();
    attach(None, &mut by_parent, &mut visited)
}

fn attach(
    parent: Option<CategoryId>,
    by_parent: &mut HashMap<Option<CategoryId>, Vec<Category>>,
    visited: &mut HashSet<CategoryId>,
) -> Vec<CategoryNode> {
    let Some(children) = by_parent.remove(&parent) else {
        return Vec::new();
    };

    children
        .into_iter()
        .filter_map(|category| {
            if !visited.insert(category.id) {
                return None;
            }
            let children = attach(Some(category.id), by_parent, visited);
            Some(CategoryNode { category, children })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryStore;

    fn input(name: &str, parent: Option<CategoryId>) -> CategoryInput {
        CategoryInput {
            name: name.to_owned(),
            description: format!("All things {name}"),
            image: format!("https://cdn.example.com/{name}.jpg"),
            parent,
        }
    }

    fn tree() -> CategoryTree<MemoryStore> {
        CategoryTree::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn test_repeated_names_get_increasing_suffixes() {
        let tree = tree();
        let a = tree.create(input("Foo", None)).await.unwrap();
        let b = tree.create(input("Other", Some(a.id))).await.unwrap();
        let c = tree.create(input("Foo", Some(b.id))).await.unwrap();
        let d = tree.create(input("foo", Some(c.id))).await.unwrap();

        assert_eq!(a.slug.as_str(), "foo");
        assert_eq!(c.slug.as_str(), "foo-1");
        assert_eq!(d.slug.as_str(), "foo-2");

        let slugs: HashSet<_> = tree.list().await.unwrap().into_iter().map(|c| c.slug).collect();
        assert_eq!(slugs.len(), 4);
    }

    #[tokio::test]
    async fn test_rename_to_own_slug_keeps_it() {
        let tree = tree();
        let cat = tree.create(input("Home Goods", None)).await.unwrap();

        let renamed = tree.update(cat.id, input("home goods", None)).await.unwrap();
        assert_eq!(renamed.name, "home goods");
        assert_eq!(renamed.slug.as_str(), "home-goods");
    }

    #[tokio::test]
    async fn test_rename_regenerates_slug() {
        let tree = tree();
        let cat = tree.create(input("Shoes", None)).await.unwrap();
        let renamed = tree.update(cat.id, input("Sneakers", None)).await.unwrap();
        assert_eq!(renamed.slug.as_str(), "sneakers");
        assert!(tree.get_by_slug("shoes").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ancestors_follow_parent_chain() {
        let tree = tree();
        let root = tree.create(input("Electronics", None)).await.unwrap();
        let mid = tree.create(input("Audio", Some(root.id))).await.unwrap();
        let leaf = tree.create(input("Headphones", Some(mid.id))).await.unwrap();

        assert!(root.ancestors.is_empty());
        assert_eq!(mid.ancestors, vec![AncestorRef::snapshot(&root)]);

        let mut expected = mid.ancestors.clone();
        expected.push(AncestorRef::snapshot(&mid));
        assert_eq!(leaf.ancestors, expected);
        assert_eq!(leaf.path(), "electronics/audio/headphones");
    }

    #[tokio::test]
    async fn test_clearing_parent_empties_ancestors() {
        let tree = tree();
        let root = tree.create(input("Fashion", None)).await.unwrap();
        let child = tree.create(input("Watches", Some(root.id))).await.unwrap();
        assert_eq!(child.ancestors.len(), 1);

        let moved = tree.update(child.id, input("Watches", None)).await.unwrap();
        assert!(moved.parent.is_none());
        assert!(moved.ancestors.is_empty());
    }

    #[tokio::test]
    async fn test_renaming_parent_leaves_descendant_snapshot_stale() {
        let tree = tree();
        let root = tree.create(input("Home", None)).await.unwrap();
        let child = tree.create(input("Chairs", Some(root.id))).await.unwrap();

        tree.update(root.id, input("Home Goods", None)).await.unwrap();

        let child_now = tree.get(child.id).await.unwrap().unwrap();
        assert_eq!(child_now.ancestors[0].name, "Home");
        assert_eq!(child_now.ancestors[0].slug.as_str(), "home");

        // Re-saving with the same parent does not refresh the snapshot either.
        let resaved = tree.update(child.id, input("Chairs", Some(root.id))).await.unwrap();
        assert_eq!(resaved.ancestors[0].name, "Home");

        // Moving away and back does.
        tree.update(child.id, input("Chairs", None)).await.unwrap();
        let refreshed = tree.update(child.id, input("Chairs", Some(root.id))).await.unwrap();
        assert_eq!(refreshed.ancestors[0].name, "Home Goods");
        assert_eq!(refreshed.ancestors[0].slug.as_str(), "home-goods");
    }

    #[tokio::test]
    async fn test_missing_parent_is_rejected() {
        let tree = tree();
        let err = tree
            .create(input("Drones", Some(CategoryId::new(999))))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ParentNotFound(id) if id == CategoryId::new(999)));
        assert!(tree.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cycles_are_rejected() {
        let tree = tree();
        let a = tree.create(input("A", None)).await.unwrap();
        let b = tree.create(input("B", Some(a.id))).await.unwrap();
        let c = tree.create(input("C", Some(b.id))).await.unwrap();

        let own = tree.update(a.id, input("A", Some(a.id))).await.unwrap_err();
        assert!(matches!(own, CatalogError::CycleDetected { .. }));

        let deep = tree.update(a.id, input("A", Some(c.id))).await.unwrap_err();
        assert!(matches!(deep, CatalogError::CycleDetected { category, parent }
            if category == a.id && parent == c.id));

        // Moving a leaf elsewhere is fine.
        let d = tree.create(input("D", None)).await.unwrap();
        assert!(tree.update(c.id, input("C", Some(d.id))).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_refuses_to_orphan_children() {
        let tree = tree();
        let root = tree.create(input("Electronics", None)).await.unwrap();
        let child = tree.create(input("Cameras", Some(root.id))).await.unwrap();

        let err = tree.delete(root.id).await.unwrap_err();
        assert!(matches!(err, CatalogError::HasChildren(_)));

        tree.delete(child.id).await.unwrap();
        tree.delete(root.id).await.unwrap();
        assert!(tree.list().await.unwrap().is_empty());

        let err = tree.delete(root.id).await.unwrap_err();
        assert!(matches!(err, CatalogError::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn test_lost_slug_race_is_retried() {
        let store = MemoryStore::new();
        store.inject_slug_conflicts(2);
        let tree = CategoryTree::new(store);

        let cat = tree.create(input("Speakers", None)).await.unwrap();
        assert_eq!(cat.slug.as_str(), "speakers");
    }

    #[tokio::test]
    async fn test_persistent_slug_conflict_surfaces() {
        let store = MemoryStore::new();
        store.inject_slug_conflicts(10);
        let tree = CategoryTree::new(store);

        let err = tree.create(input("Speakers", None)).await.unwrap_err();
        assert!(matches!(err, CatalogError::SlugConflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_sibling_name_conflicts() {
        let tree = tree();
        let root = tree.create(input("Fashion", None)).await.unwrap();
        tree.create(input("Shoes", Some(root.id))).await.unwrap();

        let err = tree.create(input("Shoes", Some(root.id))).await.unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_validation_runs_before_writes() {
        let tree = tree();
        let mut bad = input("Bags", None);
        bad.description = "   ".to_owned();
        let err = tree.create(bad).await.unwrap_err();
        assert_eq!(err.to_string(), "Category description is required.");
        assert!(tree.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_level_and_tree() {
        let tree = tree();
        let electronics = tree.create(input("Electronics", None)).await.unwrap();
        let fashion = tree.create(input("Fashion", None)).await.unwrap();
        tree.create(input("Speakers", Some(electronics.id))).await.unwrap();
        tree.create(input("Drones", Some(electronics.id))).await.unwrap();

        let top: Vec<_> = tree.top_level().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(top, vec![electronics.id, fashion.id]);

        let nodes = tree.tree().await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].category.id, electronics.id);
        let names: Vec<_> = nodes[0].children.iter().map(|n| n.category.name.as_str()).collect();
        assert_eq!(names, vec!["Drones", "Speakers"]);
        assert!(nodes[1].children.is_empty());
    }
}
