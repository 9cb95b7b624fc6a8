//! Upstream todo records and their normalized form
//!
//! `RawTask` mirrors the GraphQL item shape with every field optional.
//! `normalize` maps it into `NormalizedTask`, reading custom fields by
//! name and defaulting anything absent.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::FieldsConfig;
use crate::error::{Error, Result};

pub const NO_DESCRIPTION: &str = "No description";
pub const UNTITLED: &str = "Untitled";
pub const ELLIPSIS: &str = "...";

/// GraphQL lists come back as `null` as often as `[]`.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
    pub id: Option<String>,
    pub uid: Option<String>,
    pub position: Option<f64>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub html: Option<String>,
    pub started_at: Option<String>,
    pub dued_at: Option<String>,
    pub timezone: Option<String>,
    pub color: Option<String>,
    pub cover: Option<String>,
    pub done: Option<bool>,
    pub created_by: Option<RawCreator>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_fields: Vec<RawCustomField>,
    pub todo_list: Option<RawTodoList>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<RawUser>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<RawTag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCreator {
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCustomField {
    pub name: Option<String>,
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTodoList {
    pub id: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTag {
    pub id: Option<String>,
    pub title: Option<String>,
    pub color: Option<String>,
}

impl RawTask {
    /// Decode a single page item. Shape errors only affect this record.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|err| Error::malformed(err.to_string()))
    }

    /// Custom field value by logical name, first match wins.
    pub fn custom_field(&self, name: &str) -> Option<String> {
        let wanted = name.trim();
        self.custom_fields
            .iter()
            .find(|field| {
                field
                    .name
                    .as_deref()
                    .map(|candidate| candidate.trim().eq_ignore_ascii_case(wanted))
                    .unwrap_or(false)
            })
            .and_then(|field| field.value.as_ref())
            .and_then(scalar_text)
    }
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::String(text) => text.trim().to_string(),
        serde_json::Value::Number(number) => number.to_string(),
        serde_json::Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Unrecognized or missing values are Low.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
            Some("high") => Priority::High,
            Some("medium") => Priority::Medium,
            _ => Priority::Low,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignee {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
}

impl Assignee {
    fn from_raw(user: &RawUser) -> Option<Self> {
        let id = non_empty(user.id.as_deref())?;
        Some(Self {
            id,
            first_name: non_empty(user.first_name.as_deref()),
            last_name: non_empty(user.last_name.as_deref()),
            full_name: non_empty(user.full_name.as_deref()),
        })
    }

    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => match self.full_name.as_deref() {
                Some(full) => full.to_string(),
                None => format!("User ID: {}", self.id),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTask {
    pub id: String,
    pub uid: Option<String>,
    pub title: String,
    pub description: String,
    pub due: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub stage: String,
    pub requestor: Option<String>,
    pub done: bool,
    pub creator: String,
    pub assignees: Vec<Assignee>,
    pub tags: Vec<String>,
}

/// Map one raw record into the canonical shape. Only a missing id is fatal
/// for the record.
pub fn normalize(raw: &RawTask, fields: &FieldsConfig) -> Result<NormalizedTask> {
    let id = non_empty(raw.id.as_deref())
        .ok_or_else(|| Error::malformed("record has no id"))?;

    let mut assignees = Vec::with_capacity(raw.users.len());
    for user in &raw.users {
        match Assignee::from_raw(user) {
            Some(assignee) => assignees.push(assignee),
            None => tracing::debug!(task = %id, "ignoring assignee without id"),
        }
    }

    let due = raw.dued_at.as_deref().and_then(|value| {
        let parsed = parse_timestamp(value);
        if parsed.is_none() {
            tracing::debug!(task = %id, value, "unparseable due date");
        }
        parsed
    });

    Ok(NormalizedTask {
        title: verbatim(raw.title.as_deref()).unwrap_or_else(|| UNTITLED.to_string()),
        description: verbatim(raw.text.as_deref()).unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        uid: non_empty(raw.uid.as_deref()),
        due,
        priority: Priority::parse(raw.custom_field(&fields.priority).as_deref()),
        stage: raw
            .todo_list
            .as_ref()
            .and_then(|list| non_empty(list.title.as_deref()))
            .unwrap_or_default(),
        requestor: raw.custom_field(&fields.requestor),
        done: raw.done.unwrap_or(false),
        creator: raw
            .created_by
            .as_ref()
            .and_then(|creator| non_empty(creator.full_name.as_deref()))
            .unwrap_or_default(),
        assignees,
        tags: raw
            .tags
            .iter()
            .filter_map(|tag| non_empty(tag.title.as_deref()))
            .collect(),
        id,
    })
}

/// The "exclude done" stage; each view applies it with its own flag.
pub fn admits_done(task: &NormalizedTask, exclude_done: bool) -> bool {
    !(exclude_done && task.done)
}

/// Truncate to `max` characters, appending an ellipsis when cut.
pub fn trim_description(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Trimmed description on a single line, for board entries.
pub fn description_line(text: &str, max: usize) -> String {
    trim_description(text, max)
        .split(['\r', '\n'])
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

// Free text is kept as sent; only an absent or empty string falls back.
fn verbatim(value: Option<&str>) -> Option<String> {
    value.filter(|text| !text.is_empty()).map(str::to_string)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawTask {
        RawTask::from_value(value).expect("decode raw task")
    }

    #[test]
    fn missing_priority_field_defaults_to_low() {
        let task = normalize(
            &raw(json!({ "id": "t1", "customFields": [{ "name": "Requestor", "value": "Ann" }] })),
            &FieldsConfig::default(),
        )
        .expect("normalize");
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.requestor.as_deref(), Some("Ann"));
    }

    #[test]
    fn priority_is_read_by_name_not_position() {
        let task = normalize(
            &raw(json!({
                "id": "t1",
                "customFields": [
                    { "name": "Size", "value": "Large" },
                    { "name": "Requestor", "value": "Ann" },
                    { "name": "priority", "value": " high " }
                ]
            })),
            &FieldsConfig::default(),
        )
        .expect("normalize");
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn unrecognized_priority_is_low() {
        assert_eq!(Priority::parse(Some("Urgent")), Priority::Low);
        assert_eq!(Priority::parse(Some("")), Priority::Low);
        assert_eq!(Priority::parse(None), Priority::Low);
        assert_eq!(Priority::parse(Some("Medium")), Priority::Medium);
    }

    #[test]
    fn null_lists_and_missing_fields_are_tolerated() {
        let task = normalize(
            &raw(json!({
                "id": "t1",
                "users": null,
                "customFields": null,
                "tags": null,
                "todoList": null,
                "createdBy": null
            })),
            &FieldsConfig::default(),
        )
        .expect("normalize");
        assert_eq!(task.title, UNTITLED);
        assert_eq!(task.description, NO_DESCRIPTION);
        assert_eq!(task.stage, "");
        assert_eq!(task.creator, "");
        assert!(task.assignees.is_empty());
        assert!(task.due.is_none());
        assert!(!task.done);
    }

    #[test]
    fn title_and_text_keep_their_whitespace() {
        let task = normalize(
            &raw(json!({ "id": "t1", "title": " Spaced ", "text": "  indented note\n" })),
            &FieldsConfig::default(),
        )
        .expect("normalize");
        assert_eq!(task.title, " Spaced ");
        assert_eq!(task.description, "  indented note\n");

        let blank = normalize(
            &raw(json!({ "id": "t2", "title": "", "text": "   " })),
            &FieldsConfig::default(),
        )
        .expect("normalize");
        assert_eq!(blank.title, UNTITLED);
        assert_eq!(blank.description, "   ");
    }

    #[test]
    fn missing_id_is_malformed() {
        let err = normalize(&raw(json!({ "title": "x" })), &FieldsConfig::default())
            .expect_err("no id");
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let err = RawTask::from_value(json!({ "id": "t1", "users": "nope" })).expect_err("bad");
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn due_date_and_stage_are_derived() {
        let task = normalize(
            &raw(json!({
                "id": "t1",
                "duedAt": "2025-03-01T09:30:00.000Z",
                "todoList": { "id": "l1", "title": "Fundamentals" },
                "createdBy": { "fullName": "Pat Doe" }
            })),
            &FieldsConfig::default(),
        )
        .expect("normalize");
        assert_eq!(
            task.due.map(|due| due.to_rfc3339()),
            Some("2025-03-01T09:30:00+00:00".to_string())
        );
        assert_eq!(task.stage, "Fundamentals");
        assert_eq!(task.creator, "Pat Doe");
    }

    #[test]
    fn display_name_falls_back_to_user_id() {
        let named = Assignee {
            id: "u1".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            full_name: None,
        };
        assert_eq!(named.display_name(), "Ada Lovelace");

        let anonymous = Assignee {
            id: "u2".to_string(),
            first_name: None,
            last_name: None,
            full_name: None,
        };
        assert_eq!(anonymous.display_name(), "User ID: u2");
    }

    #[test]
    fn description_line_flattens_breaks() {
        assert_eq!(description_line("first\nsecond\r\n", 100), "first second");
        assert_eq!(description_line("abcdefg", 3), "abc...");
        assert_eq!(description_line("  kept  ", 100), "  kept  ");
    }

    #[test]
    fn trim_description_counts_characters() {
        assert_eq!(trim_description("short", 100), "short");
        assert_eq!(trim_description("abcdef", 6), "abcdef");
        assert_eq!(trim_description("abcdefg", 6), "abcdef...");
        assert_eq!(trim_description("ééééé", 3), "ééé...");
    }

    #[test]
    fn done_filter_is_configurable() {
        let mut task = normalize(&raw(json!({ "id": "t1", "done": true })), &FieldsConfig::default())
            .expect("normalize");
        assert!(!admits_done(&task, true));
        assert!(admits_done(&task, false));
        task.done = false;
        assert!(admits_done(&task, true));
    }
}
