//! Category tree domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use banyan_core::CategoryId;

/// A user-managed catalog category.
///
/// Categories form a tree through the nullable `parent` reference. A
/// category with children cannot be deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    /// Unique display name.
    pub name: String,
    /// URL-safe identifier derived from `name`; recomputed on every save,
    /// never set directly.
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub parent: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derive the slug for a category name.
///
/// Lowercases and maps every non-ASCII-alphanumeric character to a
/// hyphen, one for one. Runs are intentionally not collapsed; existing
/// slugs were generated this way and live in URLs.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases() {
        assert_eq!(slugify("Textiles"), "textiles");
    }

    #[test]
    fn test_slugify_replaces_each_separator() {
        assert_eq!(slugify("Forest Goods"), "forest-goods");
        // One hyphen per character, runs not collapsed.
        assert_eq!(slugify("Arts & Crafts"), "arts---crafts");
    }

    #[test]
    fn test_slugify_non_ascii_becomes_hyphen() {
        assert_eq!(slugify("Café"), "caf-");
    }

    #[test]
    fn test_slugify_is_a_pure_function_of_name() {
        assert_eq!(slugify("Jewelry"), slugify("Jewelry"));
    }
}
