//! Data model shared by the catalog, the local store and the host app.
//!
//! Every type here is plain data with serde derives. Field names on the wire
//! follow the presentation layer's JSON (`crueltyFree`, `compositionGrade`,
//! `totalScans`, ...) so values persisted by earlier client builds decode
//! without migration.

use serde::{Deserialize, Deserializer, Serialize};

/// Ethical-sourcing classification of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertificationStatus {
    Certified,
    NotCertified,
    Unknown,
}

/// Ordinal rating of a product's ingredient makeup, `A` best through `E`.
///
/// The derived `Ord` follows declaration order, so `A < E` and sorting
/// ascending puts the best grades first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompositionGrade {
    A,
    B,
    C,
    D,
    E,
}

/// A catalog entry. Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable identifier, unique within the catalog.
    pub id: String,

    pub name: String,

    pub brand: String,

    /// Scan code (EAN-13 barcode value), unique within the catalog.
    pub barcode: String,

    #[serde(rename = "crueltyFree")]
    pub certification: CertificationStatus,

    pub composition_grade: CompositionGrade,

    /// Ordered as printed on the package.
    #[serde(default)]
    pub ingredients: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    pub fn is_certified(&self) -> bool {
        self.certification == CertificationStatus::Certified
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

/// Subscription record. An absent or unreadable record means free tier with
/// no features.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "type")]
    pub tier: SubscriptionTier,

    #[serde(default)]
    pub features: Vec<String>,

    /// ISO-8601 timestamp as written by the host app.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<BillingCycle>,
}

impl Subscription {
    pub fn is_premium(&self) -> bool {
        self.tier == SubscriptionTier::Premium
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Aggregate usage counters, recomputed by the dashboard and written whole.
///
/// The host computes these as plain JSON numbers, so counters accept any
/// number (rounded, negatives read as zero) and the percentage keeps its
/// fraction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserStats {
    #[serde(deserialize_with = "count_from_number")]
    pub total_scans: u32,

    /// Share of scanned products that are certified, `0.0..=100.0`.
    pub cruelty_free_percentage: f64,

    #[serde(deserialize_with = "count_from_number")]
    pub favorite_products: u32,

    #[serde(deserialize_with = "count_from_number")]
    pub monthly_scans: u32,

    #[serde(deserialize_with = "count_from_number")]
    pub streak: u32,
}

fn count_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value <= 0.0 {
        return Ok(0);
    }
    Ok(value.round().min(f64::from(u32::MAX)) as u32)
}
