//! Small helpers shared by the repositories.

use budgetbook_core::errors::Result;

/// Serialize a serde enum to its bare snake_case database name.
pub(crate) fn enum_to_db<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

/// Parse a bare database name back into a serde enum.
pub(crate) fn enum_from_db<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    Ok(serde_json::from_str(&format!("\"{}\"", value))?)
}
