//! Assignee board: each tracked assignee's top tasks by priority

use std::collections::HashMap;

use serde::Serialize;

use crate::config::BoardConfig;
use crate::dedup::{CompositeKey, SeenKeys};
use crate::record::{admits_done, Assignee, NormalizedTask};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssigneeBucket {
    pub assignee: Assignee,
    pub tasks: Vec<NormalizedTask>,
}

impl AssigneeBucket {
    fn new(assignee: Assignee) -> Self {
        Self {
            assignee,
            tasks: Vec::new(),
        }
    }

    /// Stable, so equal priorities keep insertion order.
    fn rank_and_truncate(&mut self, cap: usize) {
        self.tasks
            .sort_by(|left, right| right.priority.rank().cmp(&left.priority.rank()));
        self.tasks.truncate(cap);
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    staff: Vec<String>,
    track_all: bool,
    bucket_size: usize,
    exclude_done: bool,
    buckets: Vec<AssigneeBucket>,
    index: HashMap<String, usize>,
    seen: SeenKeys,
}

impl Board {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            staff: config
                .staff
                .iter()
                .map(|name| name.trim().to_ascii_lowercase())
                .collect(),
            track_all: config.track_all,
            bucket_size: config.bucket_size.max(1),
            exclude_done: config.exclude_done,
            buckets: Vec::new(),
            index: HashMap::new(),
            seen: SeenKeys::new(),
        }
    }

    /// Feed one task into every tracked assignee's bucket. Returns how many
    /// (task, assignee) entries were newly admitted.
    pub fn ingest(&mut self, task: &NormalizedTask) -> usize {
        if !admits_done(task, self.exclude_done) {
            return 0;
        }

        let mut admitted = 0;
        for assignee in &task.assignees {
            if !self.is_tracked(assignee) {
                continue;
            }
            let slot = self.bucket_slot(assignee);
            let key = CompositeKey::new(&task.id, &assignee.id, &task.creator);
            if !self.seen.admit(&key) {
                continue;
            }
            let bucket = &mut self.buckets[slot];
            bucket.tasks.push(task.clone());
            bucket.rank_and_truncate(self.bucket_size);
            admitted += 1;
        }
        admitted
    }

    pub fn is_tracked(&self, assignee: &Assignee) -> bool {
        if self.track_all {
            return true;
        }
        assignee
            .last_name
            .as_deref()
            .map(|last| {
                let last = last.trim().to_ascii_lowercase();
                self.staff.iter().any(|name| *name == last)
            })
            .unwrap_or(false)
    }

    fn bucket_slot(&mut self, assignee: &Assignee) -> usize {
        if let Some(slot) = self.index.get(&assignee.id) {
            return *slot;
        }
        let slot = self.buckets.len();
        self.buckets.push(AssigneeBucket::new(assignee.clone()));
        self.index.insert(assignee.id.clone(), slot);
        slot
    }

    /// Buckets in the order their assignee was first seen
    pub fn buckets(&self) -> &[AssigneeBucket] {
        &self.buckets
    }

    pub fn bucket(&self, assignee_id: &str) -> Option<&AssigneeBucket> {
        self.index
            .get(assignee_id)
            .and_then(|slot| self.buckets.get(*slot))
    }

    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.index.clear();
        self.seen.clear();
    }
}
