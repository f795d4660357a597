//! Request body validation.
//!
//! Bodies are accepted as raw JSON and checked field by field so that every
//! problem is reported at once, keyed by field name. Reference checks
//! (does this contact belong to the caller?) happen later, in the store.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use rolo_core::{
  activity::{DESCRIPTION_MAX_CHARS, NewActivity, SUMMARY_MAX_CHARS},
  activity_type::NewActivityType,
  contact::NewContact,
};
use serde::Serialize;
use serde_json::Value;

// ─── Error report ─────────────────────────────────────────────────────────────

/// Field name → messages for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
  pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.entry(field.into()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn get(&self, field: &str) -> Option<&[String]> {
    self.0.get(field).map(Vec::as_slice)
  }

  fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
    if self.is_empty() { Ok(value()) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for message in self.0.values().flatten() {
      if !first {
        f.write_str(" ")?;
      }
      f.write_str(message)?;
      first = false;
    }
    Ok(())
  }
}

// ─── Payloads ─────────────────────────────────────────────────────────────────

/// Validate a create/update activity body.
pub fn activity(payload: &Value) -> Result<NewActivity, ValidationErrors> {
  let mut errors = ValidationErrors::default();

  let summary = required_string(payload, "summary", SUMMARY_MAX_CHARS, &mut errors);
  let description =
    required_string(payload, "description", DESCRIPTION_MAX_CHARS, &mut errors);
  let date_it_happened = required_date(payload, "date_it_happened", &mut errors);
  let activity_type_id = optional_integer(payload, "activity_type_id", &mut errors);
  let contacts = required_id_list(payload, "contacts", &mut errors);

  match (summary, description, date_it_happened, contacts) {
    (Some(summary), Some(description), Some(date_it_happened), Some(contacts))
      if errors.is_empty() =>
    {
      Ok(NewActivity {
        summary,
        description,
        date_it_happened,
        activity_type_id,
        contacts,
      })
    }
    _ => Err(errors),
  }
}

/// Validate a create contact body.
pub fn contact(payload: &Value) -> Result<NewContact, ValidationErrors> {
  let mut errors = ValidationErrors::default();
  let first_name = required_string(payload, "first_name", 50, &mut errors);
  let last_name = optional_string(payload, "last_name", 100, &mut errors);

  match first_name {
    Some(first_name) => errors.into_result(|| NewContact { first_name, last_name }),
    None => Err(errors),
  }
}

/// Validate a create activity type body.
pub fn activity_type(payload: &Value) -> Result<NewActivityType, ValidationErrors> {
  let mut errors = ValidationErrors::default();
  match required_string(payload, "name", 255, &mut errors) {
    Some(name) => errors.into_result(|| NewActivityType { name }),
    None => Err(errors),
  }
}

// ─── Field rules ──────────────────────────────────────────────────────────────

fn label(field: &str) -> String { field.replace('_', " ") }

fn required_message(field: &str) -> String {
  format!("The {} field is required.", label(field))
}

/// A present, non-blank string of at most `max` characters, trimmed.
fn required_string(
  payload: &Value,
  field: &str,
  max: usize,
  errors: &mut ValidationErrors,
) -> Option<String> {
  match payload.get(field) {
    None | Some(Value::Null) => {
      errors.add(field, required_message(field));
      None
    }
    Some(Value::String(s)) if s.trim().is_empty() => {
      errors.add(field, required_message(field));
      None
    }
    Some(Value::String(s)) => checked_length(field, s.trim(), max, errors),
    Some(_) => {
      errors.add(field, format!("The {} must be a string.", label(field)));
      None
    }
  }
}

/// Like [`required_string`], but absent, null, and blank all mean `None`.
fn optional_string(
  payload: &Value,
  field: &str,
  max: usize,
  errors: &mut ValidationErrors,
) -> Option<String> {
  match payload.get(field) {
    None | Some(Value::Null) => None,
    Some(Value::String(s)) if s.trim().is_empty() => None,
    Some(Value::String(s)) => checked_length(field, s.trim(), max, errors),
    Some(_) => {
      errors.add(field, format!("The {} must be a string.", label(field)));
      None
    }
  }
}

fn checked_length(
  field: &str,
  s: &str,
  max: usize,
  errors: &mut ValidationErrors,
) -> Option<String> {
  if s.chars().count() > max {
    errors.add(
      field,
      format!("The {} may not be greater than {max} characters.", label(field)),
    );
    None
  } else {
    Some(s.to_owned())
  }
}

fn required_date(
  payload: &Value,
  field: &str,
  errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
  match payload.get(field) {
    None | Some(Value::Null) => {
      errors.add(field, required_message(field));
      None
    }
    Some(Value::String(s)) if s.trim().is_empty() => {
      errors.add(field, required_message(field));
      None
    }
    Some(Value::String(s)) => match parse_date(s.trim()) {
      Some(date) => Some(date),
      None => {
        errors.add(field, format!("The {} is not a valid date.", label(field)));
        None
      }
    },
    Some(_) => {
      errors.add(field, format!("The {} is not a valid date.", label(field)));
      None
    }
  }
}

/// Accepts `YYYY-MM-DD`, RFC 3339, or `YYYY-MM-DD HH:MM:SS`; only the date
/// part is kept. Years outside 1..=9999 are rejected.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
  let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
    .or_else(|| {
      NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
    })?;
  (1..=9999).contains(&date.year()).then_some(date)
}

/// A JSON integer or a string holding one.
fn as_integer(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn optional_integer(
  payload: &Value,
  field: &str,
  errors: &mut ValidationErrors,
) -> Option<i64> {
  match payload.get(field) {
    None | Some(Value::Null) => None,
    Some(value) => match as_integer(value) {
      Some(id) => Some(id),
      None => {
        errors.add(field, format!("The {} must be an integer.", label(field)));
        None
      }
    },
  }
}

/// A non-empty array of integer ids.
fn required_id_list(
  payload: &Value,
  field: &str,
  errors: &mut ValidationErrors,
) -> Option<Vec<i64>> {
  let items = match payload.get(field) {
    None | Some(Value::Null) => {
      errors.add(field, required_message(field));
      return None;
    }
    Some(Value::Array(items)) if items.is_empty() => {
      errors.add(field, required_message(field));
      return None;
    }
    Some(Value::Array(items)) => items,
    Some(_) => {
      errors.add(field, format!("The {} must be an array.", label(field)));
      return None;
    }
  };

  let mut ids = Vec::with_capacity(items.len());
  for (i, item) in items.iter().enumerate() {
    match as_integer(item) {
      Some(id) => ids.push(id),
      None => errors.add(
        format!("{field}.{i}"),
        format!("The {}.{i} must be an integer.", label(field)),
      ),
    }
  }
  (ids.len() == items.len()).then_some(ids)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn lunch() -> Value {
    json!({
      "summary":          "Lunch",
      "description":      "Lunch with Bob",
      "date_it_happened": "2024-03-01",
      "contacts":         [7],
    })
  }

  #[test]
  fn valid_activity() {
    let input = activity(&lunch()).unwrap();
    assert_eq!(input.summary, "Lunch");
    assert_eq!(input.date_it_happened, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert_eq!(input.activity_type_id, None);
    assert_eq!(input.contacts, vec![7]);
  }

  #[test]
  fn integer_strings_are_accepted() {
    let mut body = lunch();
    body["activity_type_id"] = json!("3");
    body["contacts"] = json!(["7", 8]);
    let input = activity(&body).unwrap();
    assert_eq!(input.activity_type_id, Some(3));
    assert_eq!(input.contacts, vec![7, 8]);
  }

  #[test]
  fn zero_activity_type_id_is_kept() {
    let mut body = lunch();
    body["activity_type_id"] = json!(0);
    assert_eq!(activity(&body).unwrap().activity_type_id, Some(0));

    body["activity_type_id"] = Value::Null;
    assert_eq!(activity(&body).unwrap().activity_type_id, None);
  }

  #[test]
  fn every_missing_field_is_reported() {
    let errors = activity(&json!({})).unwrap_err();
    for field in ["summary", "description", "date_it_happened", "contacts"] {
      assert!(errors.get(field).is_some(), "no error for {field}");
    }
    assert!(errors.get("activity_type_id").is_none());
    assert_eq!(
      errors.get("date_it_happened").unwrap(),
      ["The date it happened field is required."]
    );
  }

  #[test]
  fn blank_and_mistyped_fields_are_rejected() {
    let mut body = lunch();
    body["summary"] = json!("   ");
    body["description"] = json!(42);
    body["activity_type_id"] = json!("meal");
    body["contacts"] = json!([]);

    let errors = activity(&body).unwrap_err();
    assert_eq!(errors.get("summary").unwrap(), ["The summary field is required."]);
    assert_eq!(errors.get("description").unwrap(), ["The description must be a string."]);
    assert_eq!(
      errors.get("activity_type_id").unwrap(),
      ["The activity type id must be an integer."]
    );
    assert_eq!(errors.get("contacts").unwrap(), ["The contacts field is required."]);
  }

  #[test]
  fn contacts_must_be_integers() {
    let mut body = lunch();
    body["contacts"] = json!([7, "bob", null]);
    let errors = activity(&body).unwrap_err();
    assert!(errors.get("contacts.1").is_some());
    assert!(errors.get("contacts.2").is_some());

    body["contacts"] = json!(7);
    let errors = activity(&body).unwrap_err();
    assert_eq!(errors.get("contacts").unwrap(), ["The contacts must be an array."]);
  }

  #[test]
  fn length_limits_count_characters() {
    let mut body = lunch();
    body["summary"] = json!("é".repeat(SUMMARY_MAX_CHARS));
    assert!(activity(&body).is_ok());

    body["summary"] = json!("é".repeat(SUMMARY_MAX_CHARS + 1));
    let errors = activity(&body).unwrap_err();
    assert_eq!(
      errors.get("summary").unwrap(),
      ["The summary may not be greater than 100000 characters."]
    );
  }

  #[test]
  fn dates() {
    let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    assert_eq!(parse_date("2024-03-01"), Some(d));
    assert_eq!(parse_date("2024-03-01T23:30:00+02:00"), Some(d));
    assert_eq!(parse_date("2024-03-01 08:15:00"), Some(d));
    assert_eq!(parse_date("2024-02-30"), None);
    assert_eq!(parse_date("next tuesday"), None);
    assert_eq!(parse_date("0000-01-01"), None);
  }

  #[test]
  fn contact_and_activity_type_bodies() {
    let c = contact(&json!({"first_name": " Bob ", "last_name": ""})).unwrap();
    assert_eq!(c.first_name, "Bob");
    assert_eq!(c.last_name, None);
    assert!(contact(&json!({"last_name": "Loblaw"})).is_err());

    assert_eq!(activity_type(&json!({"name": "Meal"})).unwrap().name, "Meal");
    assert!(activity_type(&json!({"name": null})).is_err());
  }

  #[test]
  fn display_joins_messages() {
    let errors = activity(&json!({"summary": "x", "description": "y", "contacts": [1]}))
      .unwrap_err();
    assert_eq!(errors.to_string(), "The date it happened field is required.");
  }
}
