//! Restaurant catalog
//!
//! Two read-only tables:
//! - **Brand table**: one row per distinct restaurant brand, carrying the
//!   fields that drive base scoring
//! - **Branch table**: one row per physical location of a brand
//!
//! Brand tags are normalized on construction so they compare equal to
//! normalized user tags. Branch tags are display-only and kept as given.

use std::collections::HashMap;

use mnm_common::normalize::normalize_tags;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One restaurant brand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandRow {
    pub name: String,

    #[serde(default)]
    pub cuisines: Vec<String>,

    #[serde(default, rename = "rest_type", alias = "restaurant_types")]
    pub restaurant_types: Vec<String>,

    #[serde(rename = "approx_cost", alias = "approx_cost_for_two")]
    pub approx_cost_for_two: f64,

    /// Mean rating in [0, 5]
    pub mean_rating: f64,

    /// Dish corpus used to build the text similarity index
    #[serde(default)]
    pub dishes: Vec<String>,
}

impl BrandRow {
    /// Text document for this brand in the dish similarity index
    pub fn dish_document(&self) -> String {
        self.dishes.join(" ")
    }
}

/// One physical branch of a brand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRow {
    /// Brand name this branch belongs to
    #[serde(rename = "name", alias = "brand_name")]
    pub brand_name: String,

    /// Location name, resolved through the gazetteer
    pub location: String,

    #[serde(default)]
    pub rate: Option<f64>,

    #[serde(default)]
    pub approx_cost: Option<f64>,

    /// Branch-level tags; empty means "same as brand"
    #[serde(default)]
    pub cuisines: Vec<String>,

    #[serde(default, rename = "rest_type", alias = "restaurant_types")]
    pub restaurant_types: Vec<String>,
}

/// Brand and branch tables with a brand-name index over branches
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    brands: Vec<BrandRow>,
    branches_by_brand: HashMap<String, Vec<BranchRow>>,
}

impl CatalogStore {
    /// Build the catalog, normalizing tags
    ///
    /// Brand names must be unique; later duplicates are dropped with a warning.
    pub fn new(brands: Vec<BrandRow>, branches: Vec<BranchRow>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let brands: Vec<BrandRow> = brands
            .into_iter()
            .filter(|b| {
                let fresh = seen.insert(b.name.clone());
                if !fresh {
                    warn!("Duplicate brand row '{}' ignored", b.name);
                }
                fresh
            })
            .map(|mut b| {
                b.cuisines = normalize_tags(&b.cuisines);
                b.restaurant_types = normalize_tags(&b.restaurant_types);
                b
            })
            .collect();

        let mut branches_by_brand: HashMap<String, Vec<BranchRow>> = HashMap::new();
        for branch in branches {
            branches_by_brand
                .entry(branch.brand_name.clone())
                .or_default()
                .push(branch);
        }

        Self {
            brands,
            branches_by_brand,
        }
    }

    pub fn brands(&self) -> &[BrandRow] {
        &self.brands
    }

    pub fn brand(&self, index: usize) -> Option<&BrandRow> {
        self.brands.get(index)
    }

    /// Branches of a brand, in table order
    pub fn branches_of(&self, brand_name: &str) -> &[BranchRow] {
        self.branches_by_brand
            .get(brand_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn branch_count(&self) -> usize {
        self.branches_by_brand.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand(name: &str, cuisines: &[&str]) -> BrandRow {
        BrandRow {
            name: name.to_string(),
            cuisines: cuisines.iter().map(|s| s.to_string()).collect(),
            restaurant_types: vec!["Casual Dining".to_string()],
            approx_cost_for_two: 600.0,
            mean_rating: 4.0,
            dishes: vec!["Chicken Biryani".to_string(), "Paneer Tikka".to_string()],
        }
    }

    fn branch(name: &str, location: &str) -> BranchRow {
        BranchRow {
            brand_name: name.to_string(),
            location: location.to_string(),
            rate: Some(4.1),
            approx_cost: None,
            cuisines: Vec::new(),
            restaurant_types: Vec::new(),
        }
    }

    #[test]
    fn test_tags_are_normalized() {
        let catalog = CatalogStore::new(vec![brand("Truffles", &["North Indian", "Cafe"])], vec![]);
        let b = &catalog.brands()[0];
        assert_eq!(b.cuisines, vec!["north_indian", "cafe"]);
        assert_eq!(b.restaurant_types, vec!["casual_dining"]);
    }

    #[test]
    fn test_duplicate_brands_keep_first() {
        let catalog = CatalogStore::new(
            vec![brand("Truffles", &["Cafe"]), brand("Truffles", &["Thai"])],
            vec![],
        );
        assert_eq!(catalog.brands().len(), 1);
        assert_eq!(catalog.brands()[0].cuisines, vec!["cafe"]);
    }

    #[test]
    fn test_branch_index() {
        let catalog = CatalogStore::new(
            vec![brand("Truffles", &["Cafe"])],
            vec![
                branch("Truffles", "Koramangala"),
                branch("Truffles", "Indiranagar"),
                branch("Empire", "HSR"),
            ],
        );
        assert_eq!(catalog.branches_of("Truffles").len(), 2);
        assert_eq!(catalog.branches_of("Empire").len(), 1);
        assert!(catalog.branches_of("Nobody").is_empty());
        assert_eq!(catalog.branch_count(), 3);
    }

    #[test]
    fn test_brand_row_wire_format() {
        let json = r#"{"name": "Empire", "cuisines": ["North Indian"], "rest_type": ["Casual Dining"],
                       "approx_cost": 750, "mean_rating": 4.1, "dishes": ["Kebab"]}"#;
        let row: BrandRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.approx_cost_for_two, 750.0);
        assert_eq!(row.dish_document(), "Kebab");
    }
}
