//! Flat task table: one row per (task, assignee)

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::config::TableConfig;
use crate::dedup::{CompositeKey, SeenKeys};
use crate::record::{admits_done, trim_description, NormalizedTask, Priority};

pub const NO_DUE_DATE: &str = "No due date";

/// Due date relative to a reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueState {
    Overdue,
    Today,
    Upcoming,
    None,
}

impl DueState {
    /// Compares calendar days in UTC.
    pub fn of(due: Option<DateTime<Utc>>, today: NaiveDate) -> Self {
        match due.map(|due| due.date_naive()) {
            None => DueState::None,
            Some(day) if day < today => DueState::Overdue,
            Some(day) if day == today => DueState::Today,
            Some(_) => DueState::Upcoming,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub key: CompositeKey,
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub due: Option<DateTime<Utc>>,
    pub due_label: String,
    pub priority: Priority,
    pub stage: String,
    pub assignee_id: String,
    pub assignee: String,
    pub requestor: Option<String>,
    pub done: bool,
}

impl FlatRow {
    /// Milliseconds since the epoch; rows without a due date count as 0.
    pub fn due_timestamp(&self) -> i64 {
        self.due.map(|due| due.timestamp_millis()).unwrap_or(0)
    }

    pub fn due_state(&self, today: NaiveDate) -> DueState {
        DueState::of(self.due, today)
    }
}

/// Due label for display; `format` must already be validated.
pub fn format_due(due: Option<DateTime<Utc>>, format: &str) -> String {
    match due {
        Some(due) => due.format(format).to_string(),
        None => NO_DUE_DATE.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    description_max_len: usize,
    exclude_done: bool,
    date_format: String,
    rows: Vec<FlatRow>,
    seen: SeenKeys,
}

impl Table {
    pub fn new(config: &TableConfig) -> Self {
        Self {
            description_max_len: config.description_max_len,
            exclude_done: config.exclude_done,
            date_format: config.date_format.clone(),
            rows: Vec::new(),
            seen: SeenKeys::new(),
        }
    }

    /// Emit one row per assignee. Returns the number of new rows.
    pub fn ingest(&mut self, task: &NormalizedTask) -> usize {
        if !admits_done(task, self.exclude_done) {
            return 0;
        }

        let mut added = 0;
        for assignee in &task.assignees {
            let key = CompositeKey::new(&task.id, &assignee.id, &task.creator);
            if !self.seen.admit(&key) {
                continue;
            }
            self.rows.push(FlatRow {
                key,
                task_id: task.id.clone(),
                title: task.title.clone(),
                description: trim_description(&task.description, self.description_max_len),
                due: task.due,
                due_label: format_due(task.due, &self.date_format),
                priority: task.priority,
                stage: task.stage.clone(),
                assignee_id: assignee.id.clone(),
                assignee: assignee.display_name(),
                requestor: task.requestor.clone(),
                done: task.done,
            });
            added += 1;
        }
        added
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    /// Distinct non-empty stages, first-seen order
    pub fn stages(&self) -> Vec<String> {
        let mut stages: Vec<String> = Vec::new();
        for row in &self.rows {
            if !row.stage.is_empty() && !stages.contains(&row.stage) {
                stages.push(row.stage.clone());
            }
        }
        stages
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.seen.clear();
    }
}
