//! Domain models for expense categories.

use serde::{Deserialize, Serialize};

/// An expense category owned by one user.
///
/// Categories are soft-deactivated via `is_active` and never hard-deleted
/// while expenses reference them. Name uniqueness per user is an
/// application-level rule (see [`merge_with_defaults`]), not a database
/// constraint.
///
/// [`merge_with_defaults`]: fn.merge_with_defaults.html
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub user_id: i32,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Built-in category offered to every user until they create their own row
/// for it. Default categories have no local id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultCategory {
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// The built-in set shown during onboarding.
pub fn default_categories() -> Vec<DefaultCategory> {
    [
        ("Groceries", "#4CAF50", "cart"),
        ("Rent", "#9C27B0", "home"),
        ("Utilities", "#2196F3", "bolt"),
        ("Transport", "#FF9800", "car"),
        ("Dining", "#F44336", "restaurant"),
        ("Health", "#00BCD4", "heart"),
        ("Entertainment", "#E91E63", "film"),
        ("Other", "#607D8B", "dots"),
    ]
    .into_iter()
    .map(|(name, color, icon)| DefaultCategory {
        name: name.to_string(),
        color: color.to_string(),
        icon: icon.to_string(),
    })
    .collect()
}

/// Merge a user's own categories with the default set, filtering defaults
/// whose name (case-insensitive) is already taken by a user category.
pub fn merge_with_defaults(
    user_categories: Vec<Category>,
    defaults: Vec<DefaultCategory>,
) -> (Vec<Category>, Vec<DefaultCategory>) {
    let taken: Vec<String> = user_categories
        .iter()
        .map(|c| c.name.trim().to_lowercase())
        .collect();
    let remaining = defaults
        .into_iter()
        .filter(|d| !taken.contains(&d.name.trim().to_lowercase()))
        .collect();
    (user_categories, remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_category(name: &str) -> Category {
        Category {
            id: 1,
            user_id: 7,
            name: name.to_string(),
            color: "#112233".to_string(),
            icon: "star".to_string(),
            is_active: true,
        }
    }

    #[test]
    fn merge_filters_defaults_with_taken_names_case_insensitively() {
        let (own, remaining) = merge_with_defaults(
            vec![user_category("groceries"), user_category(" Rent ")],
            default_categories(),
        );
        assert_eq!(own.len(), 2);
        assert!(remaining.iter().all(|d| d.name != "Groceries"));
        assert!(remaining.iter().all(|d| d.name != "Rent"));
        assert!(remaining.iter().any(|d| d.name == "Utilities"));
    }
}
