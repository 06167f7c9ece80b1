//! Package Catalog
//!
//! Read-only lookup of the purchasable module bundles. Built once at
//! startup and never mutated. Amounts use `rust_decimal` - never f64 for money!

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StorefrontError};

/// Package id for the entry tier
pub const STARTER: &str = "starter";

/// Package id for the middle tier
pub const PREMIUM: &str = "premium";

/// Package id for the complete tier
pub const DSA_EXPRESS: &str = "dsa_express";

/// A purchasable bundle of content modules
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Catalog identifier (e.g., "starter")
    pub id: String,

    /// Display name
    pub name: String,

    /// Display price (e.g., "20 €")
    pub price: String,

    /// Amount charged, in `currency` units
    pub amount: Decimal,

    /// ISO currency code, lowercase
    pub currency: String,

    /// Number of modules unlocked by this package
    pub module_count: u32,

    /// Ordered feature descriptions
    pub features: Vec<String>,
}

impl Package {
    fn new(
        id: &str,
        name: &str,
        amount: Decimal,
        module_count: u32,
        features: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: format!("{} €", amount.normalize()),
            amount,
            currency: "eur".into(),
            module_count,
            features: features.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}

/// Ordered, immutable set of packages
#[derive(Clone, Debug)]
pub struct PackageCatalog {
    packages: Vec<Package>,
}

impl Default for PackageCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl PackageCatalog {
    /// Build a catalog from explicit entries (order is preserved)
    pub fn new(packages: Vec<Package>) -> Self {
        Self { packages }
    }

    /// The storefront's three tiers
    pub fn standard() -> Self {
        Self::new(vec![
            Package::new(
                STARTER,
                "Starter",
                dec!(20),
                6,
                &[
                    "Idée de business",
                    "Nom de marque",
                    "Offre claire à vendre",
                    "Mini tunnel de vente",
                    "Plan d'action simple",
                    "Pitch à poster",
                ],
            ),
            Package::new(
                PREMIUM,
                "Premium",
                dec!(49),
                11,
                &[
                    "Tout Starter +",
                    "Tunnel complet",
                    "Plan sur 30 jours",
                    "Idées de contenu",
                    "Messages prospection",
                    "Check-list lancement",
                ],
            ),
            Package::new(
                DSA_EXPRESS,
                "DSA Express",
                dec!(99),
                19,
                &[
                    "Tout Premium +",
                    "Introduction entrepreneuriat",
                    "Mindset & Positionnement",
                    "Offre haut de gamme",
                    "Tunnel stratégique",
                    "Outils recommandés",
                    "Plan de lancement",
                    "Exercices guidés",
                    "Objectif 1er client",
                ],
            ),
        ])
    }

    /// Look up a package by id
    pub fn lookup(&self, id: &str) -> Result<&Package> {
        self.packages
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StorefrontError::PackageNotFound(id.to_string()))
    }

    /// All packages, in display order
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    /// The highest tier (used for the full trial offered after a demo)
    pub fn top_tier(&self) -> Option<&Package> {
        self.packages.iter().max_by_key(|p| p.module_count)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
