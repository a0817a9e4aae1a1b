//! Read-only lookup and search over the fixed product set.
//!
//! The catalog is small enough that search is a linear scan. Whatever index
//! replaces it must keep the same contract: case-insensitive, substring (not
//! prefix) on name or brand, catalog order, and an empty result for a blank
//! query.

use std::collections::HashMap;

use log::info;

use crate::app_response::AppResponse;
use crate::product_model::{CertificationStatus, CompositionGrade, Product};

/// How many certified products a category-scoped recommendation returns.
pub const CATEGORY_RECOMMENDATION_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub struct ProductCatalog {
    products: Vec<Product>,
    by_id: HashMap<String, usize>,
    by_scan_code: HashMap<String, usize>,
}

impl ProductCatalog {
    /// Builds the catalog, rejecting duplicate ids or scan codes.
    pub fn new(products: Vec<Product>) -> Result<Self, AppResponse> {
        let mut by_id = HashMap::with_capacity(products.len());
        let mut by_scan_code = HashMap::with_capacity(products.len());

        for (index, product) in products.iter().enumerate() {
            if product.id.trim().is_empty() {
                return Err(AppResponse::ValidationError(format!(
                    "Product at position {index} has an empty id"
                )));
            }
            if by_id.insert(product.id.clone(), index).is_some() {
                return Err(AppResponse::ValidationError(format!(
                    "Duplicate product id: {}",
                    product.id
                )));
            }
            if by_scan_code.insert(product.barcode.clone(), index).is_some() {
                return Err(AppResponse::ValidationError(format!(
                    "Duplicate scan code {} on product {}",
                    product.barcode, product.id
                )));
            }
        }

        info!("Catalog loaded with {} products", products.len());
        Ok(Self {
            products,
            by_id,
            by_scan_code,
        })
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find_by_scan_code(&self, code: &str) -> Option<&Product> {
        self.by_scan_code.get(code).map(|&index| &self.products[index])
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Product> {
        self.by_id.get(id).map(|&index| &self.products[index])
    }

    /// Products for `ids` in the given order. Ids no longer in the catalog
    /// are skipped.
    pub fn resolve(&self, ids: &[String]) -> Vec<&Product> {
        ids.iter().filter_map(|id| self.find_by_id(id)).collect()
    }

    pub fn search(&self, query: &str) -> Vec<&Product> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle) || p.brand.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Certified products. A category narrows the result to the first
    /// [`CATEGORY_RECOMMENDATION_LIMIT`] entries; products carry no category
    /// tags yet, so the category value itself is not inspected.
    pub fn recommendations(&self, category: Option<&str>) -> Vec<&Product> {
        let certified = self.products.iter().filter(|p| p.is_certified());
        match category {
            Some(_) => certified.take(CATEGORY_RECOMMENDATION_LIMIT).collect(),
            None => certified.collect(),
        }
    }
}

/// Reference products shipped with the client for offline first launch.
pub fn seed_products() -> Vec<Product> {
    fn ingredients(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    vec![
        Product {
            id: "1".to_string(),
            name: "Organic Face Cream".to_string(),
            brand: "Green Beauty".to_string(),
            barcode: "1234567890123".to_string(),
            certification: CertificationStatus::Certified,
            composition_grade: CompositionGrade::A,
            ingredients: ingredients(&["Aqua", "Aloe Vera", "Jojoba Oil", "Vitamin E", "Glycerin"]),
            image: Some("https://images.pexels.com/photos/4465124/pexels-photo-4465124.jpeg?auto=compress&cs=tinysrgb&dpr=1&w=500".to_string()),
            description: Some("Natural organic face cream with certified cruelty-free ingredients.".to_string()),
        },
        Product {
            id: "2".to_string(),
            name: "Moisturizing Shampoo".to_string(),
            brand: "HairCare Plus".to_string(),
            barcode: "9876543210987".to_string(),
            certification: CertificationStatus::NotCertified,
            composition_grade: CompositionGrade::C,
            ingredients: ingredients(&[
                "Water",
                "Sodium Lauryl Sulfate",
                "Cocamidopropyl Betaine",
                "Fragrance",
                "Parabens",
            ]),
            image: Some("https://images.pexels.com/photos/4465831/pexels-photo-4465831.jpeg?auto=compress&cs=tinysrgb&dpr=1&w=500".to_string()),
            description: Some("Moisturizing shampoo for all hair types.".to_string()),
        },
        Product {
            id: "3".to_string(),
            name: "Natural Lip Balm".to_string(),
            brand: "Pure Lips".to_string(),
            barcode: "5555666677778".to_string(),
            certification: CertificationStatus::Certified,
            composition_grade: CompositionGrade::A,
            ingredients: ingredients(&["Beeswax", "Coconut Oil", "Shea Butter", "Vitamin E"]),
            image: Some("https://images.pexels.com/photos/5069432/pexels-photo-5069432.jpeg?auto=compress&cs=tinysrgb&dpr=1&w=500".to_string()),
            description: Some("100% natural lip balm with organic ingredients.".to_string()),
        },
    ]
}
