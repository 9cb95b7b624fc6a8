//! Sort and filter over the flat table
//!
//! Everything here is a pure function of the rows and the query; callers
//! re-run `apply` on every change instead of caching results.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::table::FlatRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Title,
    Assignee,
    Requestor,
    Priority,
    DueDate,
    Stage,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Title,
        SortKey::Assignee,
        SortKey::Requestor,
        SortKey::Priority,
        SortKey::DueDate,
        SortKey::Stage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::Assignee => "assignee",
            SortKey::Requestor => "requestor",
            SortKey::Priority => "priority",
            SortKey::DueDate => "due date",
            SortKey::Stage => "stage",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Stage ranking; the first entry ranks highest, unknown stages lowest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOrder {
    stages: Vec<String>,
}

impl StageOrder {
    pub fn new(stages: &[String]) -> Self {
        Self {
            stages: stages.iter().map(|stage| stage.trim().to_string()).collect(),
        }
    }

    pub fn rank(&self, stage: &str) -> usize {
        let stage = stage.trim();
        self.stages
            .iter()
            .position(|candidate| candidate == stage)
            .map(|pos| self.stages.len() - pos)
            .unwrap_or(0)
    }

    pub fn stages(&self) -> &[String] {
        &self.stages
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableQuery {
    pub search: String,
    pub stage: Option<String>,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            stage: None,
            sort: SortKey::Priority,
            direction: SortDirection::Desc,
        }
    }
}

impl TableQuery {
    /// Header-click behavior: the active key flips direction, a new key
    /// starts descending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort == key {
            self.direction = self.direction.flipped();
        } else {
            self.sort = key;
            self.direction = SortDirection::Desc;
        }
    }

    fn stage_filter(&self) -> Option<&str> {
        self.stage
            .as_deref()
            .map(str::trim)
            .filter(|stage| !stage.is_empty())
    }

    pub fn matches(&self, row: &FlatRow) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() && !row.title.to_lowercase().contains(&search) {
            return false;
        }
        match self.stage_filter() {
            Some(stage) => row.stage == stage,
            None => true,
        }
    }
}

/// Filter then sort. Total order: primary key in the requested direction,
/// then title ascending, then composite key ascending.
pub fn apply<'a>(rows: &'a [FlatRow], query: &TableQuery, stages: &StageOrder) -> Vec<&'a FlatRow> {
    let mut selected: Vec<&FlatRow> = rows.iter().filter(|row| query.matches(row)).collect();
    selected.sort_by(|left, right| compare_rows(left, right, query, stages));
    selected
}

pub fn compare_rows(
    left: &FlatRow,
    right: &FlatRow,
    query: &TableQuery,
    stages: &StageOrder,
) -> Ordering {
    let primary = match query.sort {
        SortKey::Title => locale_cmp(&left.title, &right.title),
        SortKey::Assignee => locale_cmp(&left.assignee, &right.assignee),
        SortKey::Requestor => {
            compare_missing_last(left.requestor.as_deref(), right.requestor.as_deref())
        }
        SortKey::Priority => left.priority.rank().cmp(&right.priority.rank()),
        SortKey::DueDate => left.due_timestamp().cmp(&right.due_timestamp()),
        SortKey::Stage => stages.rank(&left.stage).cmp(&stages.rank(&right.stage)),
    };
    query
        .direction
        .apply(primary)
        .then_with(|| locale_cmp(&left.title, &right.title))
        .then_with(|| left.key.cmp(&right.key))
}

fn compare_missing_last(left: Option<&str>, right: Option<&str>) -> Ordering {
    let left = left.filter(|value| !value.trim().is_empty());
    let right = right.filter(|value| !value.trim().is_empty());
    match (left, right) {
        (Some(left), Some(right)) => locale_cmp(left, right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case-folded comparison first, raw text as the tie-break.
pub fn locale_cmp(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::CompositeKey;
    use crate::record::Priority;
    use chrono::{TimeZone, Utc};

    fn row(id: &str, title: &str, priority: Priority, stage: &str) -> FlatRow {
        FlatRow {
            key: CompositeKey::new(id, "u1", "Pat"),
            task_id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            due: None,
            due_label: String::new(),
            priority,
            stage: stage.to_string(),
            assignee_id: "u1".to_string(),
            assignee: "Ada Lovelace".to_string(),
            requestor: None,
            done: false,
        }
    }

    fn stages() -> StageOrder {
        StageOrder::new(&crate::config::TableConfig::default().stage_order)
    }

    fn titles(rows: &[&FlatRow]) -> Vec<String> {
        rows.iter().map(|row| row.title.clone()).collect()
    }

    #[test]
    fn search_is_case_insensitive_substring_on_title() {
        let rows = vec![
            row("1", "Fix Sync", Priority::Low, ""),
            row("2", "Add watcher", Priority::Low, ""),
        ];
        let query = TableQuery {
            search: "SYNC".to_string(),
            ..TableQuery::default()
        };
        assert_eq!(titles(&apply(&rows, &query, &stages())), vec!["Fix Sync"]);
    }

    #[test]
    fn stage_filter_requires_equality_and_empty_means_all() {
        let rows = vec![
            row("1", "A", Priority::Low, "Fundamentals"),
            row("2", "B", Priority::Low, "Parking Lot"),
        ];
        let mut query = TableQuery {
            stage: Some("Parking Lot".to_string()),
            ..TableQuery::default()
        };
        assert_eq!(titles(&apply(&rows, &query, &stages())), vec!["B"]);
        query.stage = Some(String::new());
        assert_eq!(apply(&rows, &query, &stages()).len(), 2);
    }

    #[test]
    fn priority_sort_respects_direction_with_title_tiebreak() {
        let rows = vec![
            row("1", "b", Priority::Low, ""),
            row("2", "c", Priority::High, ""),
            row("3", "a", Priority::High, ""),
            row("4", "d", Priority::Medium, ""),
        ];
        let mut query = TableQuery::default();
        assert_eq!(titles(&apply(&rows, &query, &stages())), vec!["a", "c", "d", "b"]);
        query.direction = SortDirection::Asc;
        assert_eq!(titles(&apply(&rows, &query, &stages())), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn stage_sort_ranks_unknown_lowest() {
        let rows = vec![
            row("1", "a", Priority::Low, "Mystery"),
            row("2", "b", Priority::Low, "Parking Lot"),
            row("3", "c", Priority::Low, "Game Changers"),
        ];
        let query = TableQuery {
            sort: SortKey::Stage,
            direction: SortDirection::Desc,
            ..TableQuery::default()
        };
        assert_eq!(titles(&apply(&rows, &query, &stages())), vec!["c", "b", "a"]);
    }

    #[test]
    fn missing_due_date_sorts_first_ascending() {
        let mut dated = row("1", "dated", Priority::Low, "");
        dated.due = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let undated = row("2", "undated", Priority::Low, "");
        let rows = vec![dated, undated];
        let mut query = TableQuery {
            sort: SortKey::DueDate,
            direction: SortDirection::Asc,
            ..TableQuery::default()
        };
        assert_eq!(titles(&apply(&rows, &query, &stages())), vec!["undated", "dated"]);
        query.direction = SortDirection::Desc;
        assert_eq!(titles(&apply(&rows, &query, &stages())), vec!["dated", "undated"]);
    }

    #[test]
    fn missing_requestor_sorts_after_present_ascending() {
        let mut ann = row("1", "a", Priority::Low, "");
        ann.requestor = Some("ann".to_string());
        let mut zed = row("2", "b", Priority::Low, "");
        zed.requestor = Some("Zed".to_string());
        let nobody = row("3", "c", Priority::Low, "");
        let rows = vec![nobody, zed, ann];
        let query = TableQuery {
            sort: SortKey::Requestor,
            direction: SortDirection::Asc,
            ..TableQuery::default()
        };
        assert_eq!(titles(&apply(&rows, &query, &stages())), vec!["a", "b", "c"]);
    }

    #[test]
    fn identical_rows_fall_back_to_composite_key() {
        let rows = vec![
            row("2", "same", Priority::Low, ""),
            row("1", "same", Priority::Low, ""),
        ];
        let sorted = apply(&rows, &TableQuery::default(), &stages());
        assert_eq!(sorted[0].task_id, "1");
        assert_eq!(sorted[1].task_id, "2");
    }

    #[test]
    fn apply_is_idempotent() {
        let rows = vec![
            row("1", "b", Priority::Medium, "Fundamentals"),
            row("2", "a", Priority::Medium, "Parking Lot"),
            row("3", "c", Priority::High, "Fundamentals"),
        ];
        let query = TableQuery {
            sort: SortKey::Stage,
            ..TableQuery::default()
        };
        let first: Vec<FlatRow> = apply(&rows, &query, &stages()).into_iter().cloned().collect();
        let second: Vec<FlatRow> = apply(&first, &query, &stages()).into_iter().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(titles(&apply(&rows, &query, &stages())), titles(&apply(&rows, &query, &stages())));
    }

    #[test]
    fn toggle_flips_same_key_and_resets_new_key() {
        let mut query = TableQuery::default();
        query.toggle_sort(SortKey::Priority);
        assert_eq!(query.direction, SortDirection::Asc);
        query.toggle_sort(SortKey::Title);
        assert_eq!(query.sort, SortKey::Title);
        assert_eq!(query.direction, SortDirection::Desc);
    }

    #[test]
    fn locale_cmp_folds_case_first() {
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("Apple", "apple"), Ordering::Less);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
    }
}
