// src/domain/validation.rs
use serde::{Deserialize, Serialize};

/// One failed rule. Serializes to the `{loc, msg, type}` shape the dashboard
/// already knows how to unpack from a 422 body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type", default = "value_error")]
    pub kind: String,
}

fn value_error() -> String {
    "value_error".to_string()
}

impl FieldError {
    pub fn new(field: &str, msg: impl Into<String>) -> Self {
        Self {
            loc: vec!["body".to_string(), field.to_string()],
            msg: msg.into(),
            kind: value_error(),
        }
    }

    /// Last path segment, i.e. the field name.
    pub fn field(&self) -> &str {
        self.loc.last().map(String::as_str).unwrap_or("")
    }
}

/// Collects errors for a whole payload so a single response reports all of them.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_text(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if value.map(str::trim).unwrap_or("").is_empty() {
            self.errors.push(FieldError::new(field, "field required"));
        }
        self
    }

    pub fn require<T>(&mut self, field: &str, value: Option<T>) -> &mut Self {
        if value.is_none() {
            self.errors.push(FieldError::new(field, "field required"));
        }
        self
    }

    pub fn check(&mut self, field: &str, ok: bool, msg: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, msg));
        }
        self
    }

    pub fn date(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            if !is_iso_date(v) {
                self.errors
                    .push(FieldError::new(field, "invalid date, expected YYYY-MM-DD"));
            }
        }
        self
    }

    pub fn time(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            if parse_hhmm(v).is_none() {
                self.errors
                    .push(FieldError::new(field, "invalid time, expected HH:MM"));
            }
        }
        self
    }

    pub fn extend(&mut self, errors: Vec<FieldError>) -> &mut Self {
        self.errors.extend(errors);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

pub fn is_iso_date(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_ok()
}

/// Parses `HH:MM` (seconds tolerated) into `(hour, minute)`.
pub fn parse_hhmm(value: &str) -> Option<(u32, u32)> {
    let mut parts = value.trim().split(':');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = parts.next()?.trim().parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Minutes since midnight for a `HH:MM` string.
pub fn minutes_of_day(value: &str) -> Option<u32> {
    parse_hhmm(value).map(|(h, m)| h * 60 + m)
}

/// Empty or whitespace-only text becomes `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let t = v.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Joins errors as `field: message, field: message`.
pub fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field(), e.msg))
        .collect::<Vec<_>>()
        .join(", ")
}
