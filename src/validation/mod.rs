//! Field-level validation shared by the enrollment forms.
//!
//! Forms collect every problem instead of stopping at the first one, so a
//! rejected submission reports all of its issues at once.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("phone pattern compiles"));

static MOBILE_MONEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10,15}$").expect("mobile money pattern compiles"));

/// A single field-level validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub field: String,
    pub message: String,
}

impl Issue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FieldValidator {
    issues: Vec<Issue>,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(Issue::new(field, message));
    }

    /// Trimmed, non-empty text
    pub fn required(&mut self, field: &str, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.issue(field, "This field is required");
            return None;
        }
        Some(trimmed.to_string())
    }

    /// Trimmed text; blank becomes `None`
    pub fn optional(&self, value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn email(&mut self, field: &str, value: &str) -> Option<String> {
        let value = self.required(field, value)?;
        if !EMAIL_RE.is_match(&value) {
            self.issue(field, "Invalid email address");
            return None;
        }
        Some(value.to_lowercase())
    }

    pub fn phone(&mut self, field: &str, value: &str) -> Option<String> {
        let value = self.required(field, value)?;
        if !PHONE_RE.is_match(&value) {
            self.issue(field, "Phone number must contain 10 to 15 digits");
            return None;
        }
        Some(value)
    }

    pub fn mobile_money_number(&mut self, field: &str, value: &str) -> Option<String> {
        let value = self.required(field, value)?;
        if !MOBILE_MONEY_RE.is_match(&value) {
            self.issue(field, "Mobile money number must contain 10 to 15 digits");
            return None;
        }
        Some(value)
    }

    /// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp
    pub fn date(&mut self, field: &str, value: &str) -> Option<NaiveDate> {
        let value = self.required(field, value)?;
        match parse_date(&value) {
            Some(date) => Some(date),
            None => {
                self.issue(field, "Invalid date");
                None
            }
        }
    }

    pub fn one_of<T: FromStr>(&mut self, field: &str, value: &str, allowed: &[&str]) -> Option<T> {
        let value = self.required(field, value)?;
        match value.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.issue(field, format!("Must be one of: {}", allowed.join(", ")));
                None
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

/// Decode a JSON object into a text-only form.
///
/// Known fields holding anything but a string (or null) are reported as
/// issues rather than failing the whole body. Unknown fields are ignored.
pub fn decode_form<T>(body: Value) -> Result<T, Vec<Issue>>
where
    T: DeserializeOwned + Serialize + Default,
{
    let Value::Object(mut fields) = body else {
        return Err(vec![Issue::new("body", "Expected a JSON object")]);
    };

    let known = match serde_json::to_value(T::default()) {
        Ok(Value::Object(template)) => template,
        _ => Default::default(),
    };

    let mut issues = Vec::new();
    for name in known.keys() {
        match fields.get(name) {
            None | Some(Value::String(_)) => {}
            // null means absent
            Some(Value::Null) => {
                fields.remove(name);
            }
            Some(_) => {
                issues.push(Issue::new(name.as_str(), "Must be a string"));
                fields.remove(name);
            }
        }
    }
    if !issues.is_empty() {
        return Err(issues);
    }

    serde_json::from_value(Value::Object(fields)).map_err(|e| vec![Issue::new("body", e.to_string())])
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}
