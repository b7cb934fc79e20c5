//! Product catalog enums.

use serde::{Deserialize, Serialize};

/// The fixed set of product categories the storefront sells.
///
/// Products carry one of these values directly; the category *tree*
/// (user-managed, hierarchical) is a separate entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    Handicrafts,
    Textiles,
    Jewelry,
    Paintings,
    #[serde(rename = "Forest Goods")]
    ForestGoods,
}

impl ProductCategory {
    /// All categories, in display order.
    pub const ALL: [Self; 5] = [
        Self::Handicrafts,
        Self::Textiles,
        Self::Jewelry,
        Self::Paintings,
        Self::ForestGoods,
    ];

    /// The wire/display name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Handicrafts => "Handicrafts",
            Self::Textiles => "Textiles",
            Self::Jewelry => "Jewelry",
            Self::Paintings => "Paintings",
            Self::ForestGoods => "Forest Goods",
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Handicrafts" => Ok(Self::Handicrafts),
            "Textiles" => Ok(Self::Textiles),
            "Jewelry" => Ok(Self::Jewelry),
            "Paintings" => Ok(Self::Paintings),
            "Forest Goods" => Ok(Self::ForestGoods),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_trip() {
        for category in ProductCategory::ALL {
            assert_eq!(
                ProductCategory::from_str(category.as_str()),
                Ok(category)
            );
        }
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&ProductCategory::ForestGoods).expect("serialize");
        assert_eq!(json, "\"Forest Goods\"");
        let back: ProductCategory = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, ProductCategory::ForestGoods);
    }

    #[test]
    fn test_rejects_unknown() {
        assert!(ProductCategory::from_str("Electronics").is_err());
    }
}
