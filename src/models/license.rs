// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! License categories and the category schemes a deployment can select.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;
use std::str::FromStr;

/// A racing discipline as identified by the remote `category_id`,
/// together with the prefix used for its named values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LicenseCategory {
    pub id: u8,
    pub prefix: Cow<'static, str>,
}

impl LicenseCategory {
    pub const OVAL: Self = Self::builtin(1, "oval");
    pub const ROAD: Self = Self::builtin(2, "road");
    pub const DIRT_OVAL: Self = Self::builtin(3, "dirt_oval");
    pub const DIRT_ROAD: Self = Self::builtin(4, "dirt_road");
    pub const SPORTS_CAR: Self = Self::builtin(5, "sports_car");
    pub const FORMULA_CAR: Self = Self::builtin(6, "formula_car");

    const fn builtin(id: u8, prefix: &'static str) -> Self {
        Self {
            id,
            prefix: Cow::Borrowed(prefix),
        }
    }

    pub fn new(id: u8, prefix: impl Into<String>) -> Self {
        Self {
            id,
            prefix: Cow::Owned(prefix.into()),
        }
    }
}

/// Fixed, ordered list of categories reported in every snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryScheme {
    categories: Vec<LicenseCategory>,
}

impl CategoryScheme {
    /// Oval, dirt oval, dirt road, sports car and formula car.
    pub fn current() -> Self {
        Self {
            categories: vec![
                LicenseCategory::OVAL,
                LicenseCategory::DIRT_OVAL,
                LicenseCategory::DIRT_ROAD,
                LicenseCategory::SPORTS_CAR,
                LicenseCategory::FORMULA_CAR,
            ],
        }
    }

    /// The four-category scheme from before road was split.
    pub fn legacy() -> Self {
        Self {
            categories: vec![
                LicenseCategory::OVAL,
                LicenseCategory::ROAD,
                LicenseCategory::DIRT_OVAL,
                LicenseCategory::DIRT_ROAD,
            ],
        }
    }

    /// Build a custom scheme. Ids and prefixes must be unique and the list non-empty.
    pub fn custom(categories: Vec<LicenseCategory>) -> Result<Self, SchemeError> {
        if categories.is_empty() {
            return Err(SchemeError::Empty);
        }

        let mut ids = HashSet::new();
        let mut prefixes = HashSet::new();
        for category in &categories {
            if !ids.insert(category.id) {
                return Err(SchemeError::DuplicateId(category.id));
            }
            if category.prefix.is_empty() || !prefixes.insert(category.prefix.clone()) {
                return Err(SchemeError::BadPrefix(category.prefix.to_string()));
            }
        }

        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[LicenseCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryScheme {
    fn default() -> Self {
        Self::current()
    }
}

impl FromStr for CategoryScheme {
    type Err = SchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" => Ok(Self::current()),
            "legacy" => Ok(Self::legacy()),
            other => Err(SchemeError::Unknown(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemeError {
    #[error("Category scheme must not be empty")]
    Empty,

    #[error("Duplicate category id {0}")]
    DuplicateId(u8),

    #[error("Empty or duplicate category prefix '{0}'")]
    BadPrefix(String),

    #[error("Unknown category scheme '{0}' (expected 'current' or 'legacy')")]
    Unknown(String),
}
