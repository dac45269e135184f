//! Product variants and option resolution.
//!
//! A variant is one purchasable SKU of a product, identified by its option
//! assignments (e.g. `Color=Red, Size=M`). The storefront shows one picker
//! per option axis, starts from the first value of every axis, and resolves
//! the current selection to exactly one variant or to "unavailable".
//!
//! Everything here is pure: no store access, no locking. Axes are kept in
//! `Vec`s and selections in a `BTreeMap`, so results never depend on hash
//! iteration order.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::types::VariantId;

/// One `name = value` option on a variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionAssignment {
    pub name: String,
    pub value: String,
}

impl OptionAssignment {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Package dimensions in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_cm: Decimal,
    pub width_cm: Decimal,
    pub height_cm: Decimal,
}

/// Anything that carries a SKU and option assignments.
pub trait OptionSet {
    /// The option assignments, in the order they were entered.
    fn options(&self) -> &[OptionAssignment];

    /// Stock keeping unit.
    fn sku(&self) -> &str;

    /// Value assigned to `axis`, if any.
    fn option(&self, axis: &str) -> Option<&str> {
        self.options()
            .iter()
            .find(|o| o.name == axis)
            .map(|o| o.value.as_str())
    }
}

/// A variant as submitted by the admin, before it has an ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVariant {
    pub sku: String,
    #[serde(default)]
    pub price_override: Option<Decimal>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub weight_grams: Option<i32>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub options: Vec<OptionAssignment>,
}

/// A stored variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub sku: String,
    pub price_override: Option<Decimal>,
    pub stock: i32,
    pub weight_grams: Option<i32>,
    pub dimensions: Option<Dimensions>,
    pub options: Vec<OptionAssignment>,
}

impl Variant {
    /// Attach an ID to a submitted variant.
    #[must_use]
    pub fn from_new(id: VariantId, new: NewVariant) -> Self {
        Self {
            id,
            sku: new.sku,
            price_override: new.price_override,
            stock: new.stock,
            weight_grams: new.weight_grams,
            dimensions: new.dimensions,
            options: new.options,
        }
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl OptionSet for Variant {
    fn options(&self) -> &[OptionAssignment] {
        &self.options
    }

    fn sku(&self) -> &str {
        &self.sku
    }
}

impl OptionSet for NewVariant {
    fn options(&self) -> &[OptionAssignment] {
        &self.options
    }

    fn sku(&self) -> &str {
        &self.sku
    }
}

/// One option axis with its values in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionAxis {
    pub name: String,
    pub values: Vec<String>,
}

/// The option axes of a product, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionAxes(Vec<OptionAxis>);

impl OptionAxes {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionAxis> {
        self.0.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionAxis> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Derive the option axes offered by a set of variants.
pub fn collect_option_axes<V: OptionSet>(variants: &[V]) -> OptionAxes {
    let mut axes: Vec<OptionAxis> = Vec::new();
    for option in variants.iter().flat_map(OptionSet::options) {
        match axes.iter_mut().find(|a| a.name == option.name) {
            Some(axis) => {
                if !axis.values.contains(&option.value) {
                    axis.values.push(option.value.clone());
                }
            }
            None => axes.push(OptionAxis {
                name: option.name.clone(),
                values: vec![option.value.clone()],
            }),
        }
    }
    OptionAxes(axes)
}

/// A shopper's current choice of value per axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<String, String>);

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The selection with `axis` set to `value`; other axes are untouched.
    #[must_use]
    pub fn select(mut self, axis: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(axis.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, axis: &str) -> Option<&str> {
        self.0.get(axis).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether `options` assigns exactly the selected value to every
    /// selected axis and nothing else.
    fn matches(&self, options: &[OptionAssignment]) -> bool {
        options.len() == self.0.len()
            && options
                .iter()
                .all(|o| self.get(&o.name) == Some(o.value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Selection {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The selection a product page starts with: the first value of every axis.
#[must_use]
pub fn default_selection(axes: &OptionAxes) -> Selection {
    axes.iter()
        .filter_map(|axis| axis.values.first().map(|v| (axis.name.clone(), v.clone())))
        .collect()
}

/// Outcome of resolving a selection.
#[derive(Debug, PartialEq)]
pub enum Resolution<'a, V> {
    /// Exactly this variant carries the selected options.
    Matched(&'a V),
    /// No variant carries this combination.
    Unavailable,
}

impl<'a, V> Resolution<'a, V> {
    #[must_use]
    pub const fn variant(&self) -> Option<&'a V> {
        match self {
            Self::Matched(v) => Some(*v),
            Self::Unavailable => None,
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

/// Find the variant whose full option set equals `selection`.
///
/// A variant with fewer or more axes than the selection never matches, so a
/// partial selection resolves to [`Resolution::Unavailable`].
pub fn resolve_variant<'a, V: OptionSet>(variants: &'a [V], selection: &Selection) -> Resolution<'a, V> {
    variants
        .iter()
        .find(|v| selection.matches(v.options()))
        .map_or(Resolution::Unavailable, Resolution::Matched)
}

/// Check a product's variants before they are written.
///
/// # Errors
///
/// Returns `CatalogError::Validation` on an empty or duplicate SKU, a
/// duplicate option combination, an axis named twice in one variant, an
/// empty option name or value, negative stock, or a negative price override.
pub fn validate_variants(variants: &[NewVariant]) -> CatalogResult<()> {
    let mut skus = HashSet::new();
    let mut tuples: HashSet<BTreeMap<&str, &str>> = HashSet::new();

    for variant in variants {
        let sku = variant.sku.trim();
        if sku.is_empty() {
            return Err(CatalogError::validation("Every variant needs a SKU."));
        }
        if !skus.insert(sku) {
            return Err(CatalogError::validation(format!("Duplicate SKU '{sku}'.")));
        }
        if variant.stock < 0 {
            return Err(CatalogError::validation(format!(
                "Stock for '{sku}' cannot be negative."
            )));
        }
        if variant.price_override.is_some_and(|p| p.is_sign_negative()) {
            return Err(CatalogError::validation(format!(
                "Price for '{sku}' cannot be negative."
            )));
        }

        let mut tuple = BTreeMap::new();
        for option in &variant.options {
            if option.name.trim().is_empty() || option.value.trim().is_empty() {
                return Err(CatalogError::validation(format!(
                    "Options for '{sku}' need a name and a value."
                )));
            }
            if tuple.insert(option.name.as_str(), option.value.as_str()).is_some() {
                return Err(CatalogError::validation(format!(
                    "Variant '{sku}' sets option '{}' more than once.",
                    option.name
                )));
            }
        }
        if !tuples.insert(tuple) {
            return Err(CatalogError::validation(format!(
                "Variant '{sku}' repeats the options of another variant."
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn variant(id: i32, sku: &str, options: &[(&str, &str)]) -> Variant {
        Variant {
            id: VariantId::new(id),
            sku: sku.to_owned(),
            price_override: None,
            stock: 5,
            weight_grams: None,
            dimensions: None,
            options: options
                .iter()
                .map(|(n, v)| OptionAssignment::new(*n, *v))
                .collect(),
        }
    }

    fn tee_shirts() -> Vec<Variant> {
        vec![
            variant(1, "TEE-RED-M", &[("Color", "Red"), ("Size", "M")]),
            variant(2, "TEE-RED-L", &[("Color", "Red"), ("Size", "L")]),
            variant(3, "TEE-BLUE-M", &[("Color", "Blue"), ("Size", "M")]),
        ]
    }

    fn new_variant(sku: &str, options: &[(&str, &str)]) -> NewVariant {
        NewVariant {
            sku: sku.to_owned(),
            price_override: None,
            stock: 1,
            weight_grams: Some(200),
            dimensions: None,
            options: options
                .iter()
                .map(|(n, v)| OptionAssignment::new(*n, *v))
                .collect(),
        }
    }

    #[test]
    fn test_axes_keep_first_seen_order() {
        let axes = collect_option_axes(&tee_shirts());
        let names: Vec<_> = axes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Color", "Size"]);
        assert_eq!(axes.get("Color").unwrap().values, vec!["Red", "Blue"]);
        assert_eq!(axes.get("Size").unwrap().values, vec!["M", "L"]);
    }

    #[test]
    fn test_default_selection_picks_first_values() {
        let variants = tee_shirts();
        let selection = default_selection(&collect_option_axes(&variants));
        assert_eq!(selection.get("Color"), Some("Red"));
        assert_eq!(selection.get("Size"), Some("M"));

        let resolved = resolve_variant(&variants, &selection);
        assert_eq!(resolved.variant().unwrap().sku, "TEE-RED-M");
    }

    #[test]
    fn test_exact_match_resolves() {
        let variants = tee_shirts();
        let selection = Selection::new().select("Size", "L").select("Color", "Red");
        match resolve_variant(&variants, &selection) {
            Resolution::Matched(v) => assert_eq!(v.sku, "TEE-RED-L"),
            Resolution::Unavailable => panic!("expected a match"),
        }
    }

    #[test]
    fn test_missing_combination_is_unavailable() {
        let variants = tee_shirts();
        let selection = Selection::new().select("Color", "Blue").select("Size", "L");
        assert_eq!(resolve_variant(&variants, &selection), Resolution::Unavailable);
    }

    #[test]
    fn test_partial_selection_never_matches() {
        let variants = tee_shirts();
        let selection = Selection::new().select("Color", "Blue");
        assert!(!resolve_variant(&variants, &selection).is_available());

        let extra = Selection::new()
            .select("Color", "Red")
            .select("Size", "M")
            .select("Fit", "Slim");
        assert!(!resolve_variant(&variants, &extra).is_available());
    }

    #[test]
    fn test_select_changes_one_axis() {
        let variants = tee_shirts();
        let start = default_selection(&collect_option_axes(&variants));
        let next = start.clone().select("Color", "Blue");
        assert_eq!(next.get("Size"), start.get("Size"));
        assert_eq!(resolve_variant(&variants, &next).variant().unwrap().sku, "TEE-BLUE-M");
    }

    #[test]
    fn test_no_variants_has_no_axes() {
        let variants: Vec<Variant> = Vec::new();
        let axes = collect_option_axes(&variants);
        assert!(axes.is_empty());
        assert!(default_selection(&axes).is_empty());
        assert!(!resolve_variant(&variants, &Selection::new()).is_available());
    }

    #[test]
    fn test_validate_accepts_distinct_variants() {
        let variants = vec![
            new_variant("A", &[("Color", "Red")]),
            new_variant("B", &[("Color", "Blue")]),
        ];
        assert!(validate_variants(&variants).is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_sku() {
        let variants = vec![
            new_variant("A", &[("Color", "Red")]),
            new_variant("A", &[("Color", "Blue")]),
        ];
        let err = validate_variants(&variants).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate SKU 'A'.");
    }

    #[test]
    fn test_validate_rejects_duplicate_tuple_in_any_order() {
        let variants = vec![
            new_variant("A", &[("Color", "Red"), ("Size", "M")]),
            new_variant("B", &[("Size", "M"), ("Color", "Red")]),
        ];
        assert!(validate_variants(&variants).is_err());
    }

    #[test]
    fn test_validate_rejects_repeated_axis() {
        let variants = vec![new_variant("A", &[("Color", "Red"), ("Color", "Blue")])];
        assert!(validate_variants(&variants).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_numbers() {
        let mut stock = new_variant("A", &[]);
        stock.stock = -1;
        assert!(validate_variants(&[stock]).is_err());

        let mut price = new_variant("A", &[]);
        price.price_override = Some(Decimal::new(-1, 0));
        assert!(validate_variants(&[price]).is_err());
    }
}
