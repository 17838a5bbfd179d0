//! Plan Catalog
//!
//! Immutable mapping from enrollment plan identifier to price. Loaded once at
//! start-up and shared read-only afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::{Amount, DomainError};

/// Enrollment plan identifier, e.g. `"Basic"` or `"Fast Track"`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlanId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Built-in price list (rupees)
const DEFAULT_PRICES: &[(&str, i64)] = &[
    ("Basic", 5000),
    ("Standard", 7000),
    ("Premium", 9000),
    ("Advanced", 11000),
    ("Heavy", 10000),
    ("Elite", 11000),
    ("Fast Track", 12000),
    ("Custom", 7000),
    ("Rc name transfer", 2000),
    ("Insurance renewal", 1200),
    ("Conductor License Renewal", 3000),
    ("Fancy Number", 11000),
    ("Own Car Driving", 7000),
];

/// Errors loading a catalog from an external source
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read plan catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed plan catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid price for plan {plan}: {reason}")]
    InvalidPrice { plan: String, reason: String },

    #[error("Plan catalog is empty")]
    Empty,
}

/// Price list keyed by plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCatalog {
    prices: BTreeMap<PlanId, Amount>,
}

impl PlanCatalog {
    /// Catalog with the school's standard price list
    pub fn standard() -> Self {
        let prices = DEFAULT_PRICES
            .iter()
            .filter_map(|(plan, price)| {
                Amount::from_integer(*price)
                    .ok()
                    .map(|amount| (PlanId::from(*plan), amount))
            })
            .collect();

        Self { prices }
    }

    /// Build a catalog from raw prices, rejecting any non-positive price
    pub fn from_prices<I>(prices: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut catalog = BTreeMap::new();
        for (plan, price) in prices {
            let amount = Amount::new(price).map_err(|e| CatalogError::InvalidPrice {
                plan: plan.clone(),
                reason: e.to_string(),
            })?;
            catalog.insert(PlanId::new(plan), amount);
        }

        if catalog.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(Self { prices: catalog })
    }

    /// Load a catalog from a JSON object of `{"<plan>": "<price>"}`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let parsed: BTreeMap<String, Decimal> = serde_json::from_str(raw)?;
        Self::from_prices(parsed)
    }

    /// Price of a plan.
    ///
    /// Absence is a configuration error, never a zero-cost plan.
    pub fn price_of(&self, plan: &PlanId) -> Result<Amount, DomainError> {
        self.prices
            .get(plan)
            .copied()
            .ok_or_else(|| DomainError::UnknownPlan(plan.to_string()))
    }

    pub fn contains(&self, plan: &PlanId) -> bool {
        self.prices.contains_key(plan)
    }

    pub fn plans(&self) -> impl Iterator<Item = (&PlanId, &Amount)> {
        self.prices.iter()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
