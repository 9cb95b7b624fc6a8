//! Composite identity for (task, assignee) pairs

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

/// (task id, assignee id, creator full name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CompositeKey {
    pub task_id: String,
    pub assignee_id: String,
    pub creator: String,
}

impl CompositeKey {
    pub fn new(
        task_id: impl Into<String>,
        assignee_id: impl Into<String>,
        creator: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            assignee_id: assignee_id.into(),
            creator: creator.into(),
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.task_id, self.assignee_id, self.creator)
    }
}

/// Keys admitted so far in one dedup scope. Never evicts.
#[derive(Debug, Clone, Default)]
pub struct SeenKeys {
    keys: HashSet<CompositeKey>,
}

impl SeenKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time a key is seen, false afterwards.
    pub fn admit(&mut self, key: &CompositeKey) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.clone())
    }

    pub fn contains(&self, key: &CompositeKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
