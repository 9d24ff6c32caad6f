//! Pre-sync data validation and sanitization.
//!
//! Candidates arrive as loosely-shaped JSON (form input, queue snapshots),
//! so the validators work over `serde_json::Value` rather than typed
//! structs. Validation never mutates; sanitization never rejects.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};

/// Entities the dispatching [`validate`] function understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatedEntity {
    Expense,
    User,
    Category,
}

/// Outcome of a validation pass. Warnings never make a candidate invalid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

pub fn validate(entity: ValidatedEntity, candidate: &Value) -> ValidationReport {
    match entity {
        ValidatedEntity::Expense => validate_expense(candidate),
        ValidatedEntity::User => validate_user(candidate),
        ValidatedEntity::Category => validate_category(candidate),
    }
}

/// Expense rules: positive amount and a category/title handle are hard
/// errors; suspicious-but-usable values (future date, very large amount,
/// malformed date) only warn, and the caller applies defaults.
pub fn validate_expense(candidate: &Value) -> ValidationReport {
    let mut report = ValidationReport::new();

    match numeric_field(candidate, "amount") {
        None => report.error("amount is required and must be a number"),
        Some(amount) if amount <= 0.0 => report.error("amount must be greater than zero"),
        Some(amount) => {
            if amount > 10_000.0 {
                report.warn("amount is unusually large (> 10000)");
            }
        }
    }

    if let Some(description) = string_field(candidate, "description") {
        if description.chars().count() > 200 {
            report.error("description must be 200 characters or fewer");
        }
    }

    let has_handle = ["category", "categoryId", "title"]
        .iter()
        .any(|key| field_present(candidate, key));
    if !has_handle {
        report.error("one of category, categoryId or title is required");
    }

    if let Some(date) = string_field(candidate, "date") {
        match parse_flexible_date(&date) {
            Some(parsed) => {
                if parsed > Utc::now() {
                    report.warn("date is in the future");
                }
            }
            None => report.warn("date is malformed; a default will be applied"),
        }
    }

    report
}

/// User rules: email shape, display name length, password strength and
/// non-negative budget/income figures are all hard errors.
pub fn validate_user(candidate: &Value) -> ValidationReport {
    let mut report = ValidationReport::new();

    match string_field(candidate, "email") {
        Some(email) if is_valid_email(email.trim()) => {}
        _ => report.error("email must look like local@domain.tld"),
    }

    match string_field(candidate, "name") {
        Some(name) if name.trim().chars().count() >= 2 => {}
        _ => report.error("name must be at least 2 characters"),
    }

    if let Some(password) = string_field(candidate, "password") {
        if password.chars().count() < 8
            || !password.chars().any(|c| c.is_ascii_uppercase())
            || !password.chars().any(|c| c.is_ascii_lowercase())
            || !password.chars().any(|c| c.is_ascii_digit())
        {
            report.error("password must be 8+ characters with upper, lower and digit");
        }
    }

    for key in ["budget", "income", "monthlyBudget", "monthlyIncome"] {
        if let Some(value) = numeric_field(candidate, key) {
            if value < 0.0 {
                report.error(format!("{key} must not be negative"));
            }
        }
    }

    report
}

/// Category rules: only the name is load-bearing; cosmetic fields warn.
pub fn validate_category(candidate: &Value) -> ValidationReport {
    let mut report = ValidationReport::new();

    match string_field(candidate, "name") {
        Some(name) if !name.trim().is_empty() && name.trim().chars().count() <= 50 => {}
        _ => report.error("name is required and must be 50 characters or fewer"),
    }

    if let Some(color) = string_field(candidate, "color") {
        if !is_valid_hex_color(color.trim()) {
            report.warn("color is not a valid hex value");
        }
    }

    if let Some(icon) = string_field(candidate, "icon") {
        if icon.chars().count() > 50 {
            report.warn("icon name is unusually long");
        }
    }

    report
}

/// Normalize a candidate without rejecting anything:
/// - drop null fields
/// - trim strings and collapse internal runs of whitespace
/// - lower-case `email`
/// - coerce numeric-looking strings in amount-like fields to numbers
/// - coerce date-like fields to canonical RFC3339
pub fn sanitize(candidate: &Value, entity: ValidatedEntity) -> Value {
    let Some(object) = candidate.as_object() else {
        return candidate.clone();
    };

    let mut out = Map::new();
    for (key, value) in object {
        let cleaned = match value {
            Value::Null => continue,
            Value::String(s) => {
                let collapsed = collapse_whitespace(s);
                if collapsed.is_empty() {
                    continue;
                }
                if key == "email" {
                    Value::String(collapsed.to_lowercase())
                } else if is_numeric_key(key) {
                    match collapsed.parse::<f64>() {
                        Ok(n) => {
                            Value::Number(serde_json::Number::from_f64(n).unwrap_or(0.into()))
                        }
                        Err(_) => Value::String(collapsed),
                    }
                } else if is_date_key(key) {
                    match parse_flexible_date(&collapsed) {
                        Some(parsed) => {
                            Value::String(parsed.to_rfc3339_opts(SecondsFormat::Secs, true))
                        }
                        None => Value::String(collapsed),
                    }
                } else {
                    Value::String(collapsed)
                }
            }
            Value::Object(_) | Value::Array(_) => sanitize(value, entity),
            other => other.clone(),
        };
        out.insert(key.clone(), cleaned);
    }
    Value::Object(out)
}

fn field_present(candidate: &Value, key: &str) -> bool {
    match candidate.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn string_field<'a>(candidate: &'a Value, key: &str) -> Option<&'a str> {
    candidate.get(key).and_then(Value::as_str)
}

fn numeric_field(candidate: &Value, key: &str) -> Option<f64> {
    match candidate.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn is_numeric_key(key: &str) -> bool {
    matches!(
        key,
        "amount" | "budget" | "income" | "percentage" | "targetAmount"
    )
}

fn is_date_key(key: &str) -> bool {
    matches!(
        key,
        "date" | "dueDate" | "startDate" | "endDate" | "recurrenceEnd"
    )
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_valid_email(input: &str) -> bool {
    let mut parts = input.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || input.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic)
}

fn is_valid_hex_color(input: &str) -> bool {
    let Some(hex) = input.strip_prefix('#') else {
        return false;
    };
    (hex.len() == 3 || hex.len() == 6) && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Accepts RFC3339 or a bare `YYYY-MM-DD`.
fn parse_flexible_date(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}
