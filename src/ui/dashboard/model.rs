use crate::board::AssigneeBucket;

/// Stage filter choices: configured order first, then stages only seen in data.
pub fn stage_choices(configured: &[String], seen: &[String]) -> Vec<String> {
    let mut choices: Vec<String> = configured
        .iter()
        .map(|stage| stage.trim().to_string())
        .filter(|stage| !stage.is_empty())
        .collect();
    for stage in seen {
        let stage = stage.trim();
        if !stage.is_empty() && !choices.iter().any(|choice| choice == stage) {
            choices.push(stage.to_string());
        }
    }
    choices
}

/// Cycle all -> first -> ... -> last -> all.
pub fn next_stage(current: Option<&str>, choices: &[String]) -> Option<String> {
    match current {
        None => choices.first().cloned(),
        Some(current) => choices
            .iter()
            .position(|choice| choice == current)
            .and_then(|pos| choices.get(pos + 1))
            .cloned(),
    }
}

pub fn clamp_selection(selected: usize, total: usize) -> usize {
    selected.min(total.saturating_sub(1))
}

pub fn move_selection(selected: usize, delta: isize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let max = total.saturating_sub(1) as isize;
    (selected as isize + delta).clamp(0, max) as usize
}

/// Number of rendered board lines: a header per bucket, then two lines per
/// task (or one placeholder line).
pub fn board_line_count(buckets: &[AssigneeBucket]) -> usize {
    buckets
        .iter()
        .map(|bucket| 1 + (bucket.tasks.len() * 2).max(1))
        .sum()
}

pub fn list_window(total: usize, selected: Option<usize>, height: usize) -> (usize, usize) {
    if total == 0 || height == 0 {
        return (0, 0);
    }
    if total <= height {
        return (0, total);
    }
    let selected = selected.unwrap_or(0);
    let mut start = selected.saturating_sub(height / 2);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn stage_choices_append_unknown_stages() {
        let choices = stage_choices(
            &names(&["Fundamentals", "Parking Lot"]),
            &names(&["Parking Lot", "", "Backlog"]),
        );
        assert_eq!(choices, names(&["Fundamentals", "Parking Lot", "Backlog"]));
    }

    #[test]
    fn next_stage_wraps_to_all() {
        let choices = names(&["A", "B"]);
        assert_eq!(next_stage(None, &choices).as_deref(), Some("A"));
        assert_eq!(next_stage(Some("A"), &choices).as_deref(), Some("B"));
        assert_eq!(next_stage(Some("B"), &choices), None);
        assert_eq!(next_stage(Some("gone"), &choices), None);
        assert_eq!(next_stage(None, &[]), None);
    }

    #[test]
    fn selection_stays_in_bounds() {
        assert_eq!(move_selection(0, -1, 3), 0);
        assert_eq!(move_selection(1, 5, 3), 2);
        assert_eq!(move_selection(4, 1, 0), 0);
        assert_eq!(clamp_selection(9, 4), 3);
        assert_eq!(clamp_selection(9, 0), 0);
    }

    #[test]
    fn board_lines_cover_title_and_description_rows() {
        use crate::record::{Assignee, NormalizedTask, Priority};

        let assignee = Assignee {
            id: "u1".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Nobles".to_string()),
            full_name: None,
        };
        let task = NormalizedTask {
            id: "t1".to_string(),
            uid: None,
            title: "Plan".to_string(),
            description: "Details".to_string(),
            due: None,
            priority: Priority::High,
            stage: String::new(),
            requestor: None,
            done: false,
            creator: String::new(),
            assignees: vec![assignee.clone()],
            tags: Vec::new(),
        };
        let busy = AssigneeBucket {
            assignee: assignee.clone(),
            tasks: vec![task.clone(), task],
        };
        let idle = AssigneeBucket {
            assignee,
            tasks: Vec::new(),
        };
        assert_eq!(board_line_count(&[busy, idle]), 5 + 2);
    }

    #[test]
    fn list_window_centers_selection() {
        assert_eq!(list_window(5, Some(1), 10), (0, 5));
        assert_eq!(list_window(20, Some(10), 6), (7, 13));
        assert_eq!(list_window(20, Some(19), 6), (14, 20));
        assert_eq!(list_window(0, None, 6), (0, 0));
    }
}
