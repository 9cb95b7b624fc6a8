#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use taskboard::config::Config;
use taskboard::paging::{Page, PageFetcher, PageInfo, PageRequest};
use taskboard::{Error, Result};
use tempfile::TempDir;

/// Builder for one upstream todo record
#[derive(Clone)]
pub struct TodoFixture {
    value: Value,
}

impl TodoFixture {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            value: json!({
                "id": id,
                "title": title,
                "text": format!("{title} details"),
                "done": false,
                "createdBy": { "fullName": "Casey Creator" },
                "customFields": [],
                "users": [],
                "tags": [],
            }),
        }
    }

    pub fn priority(mut self, priority: &str) -> Self {
        self.push_field("Priority", json!(priority));
        self
    }

    pub fn requestor(mut self, requestor: &str) -> Self {
        self.push_field("Requestor", json!(requestor));
        self
    }

    pub fn stage(mut self, stage: &str) -> Self {
        self.value["todoList"] = json!({ "id": format!("list-{stage}"), "title": stage });
        self
    }

    pub fn due(mut self, rfc3339: &str) -> Self {
        self.value["duedAt"] = json!(rfc3339);
        self
    }

    pub fn done(mut self) -> Self {
        self.value["done"] = json!(true);
        self
    }

    pub fn creator(mut self, name: &str) -> Self {
        self.value["createdBy"] = json!({ "fullName": name });
        self
    }

    pub fn assignee(mut self, id: &str, first: &str, last: &str) -> Self {
        if let Some(users) = self.value["users"].as_array_mut() {
            users.push(json!({
                "id": id,
                "firstName": first,
                "lastName": last,
                "fullName": format!("{first} {last}"),
            }));
        }
        self
    }

    pub fn build(self) -> Value {
        self.value
    }

    fn push_field(&mut self, name: &str, value: Value) {
        if let Some(fields) = self.value["customFields"].as_array_mut() {
            fields.push(json!({ "name": name, "value": value }));
        }
    }
}

pub fn page(items: Vec<Value>, per_page: usize, has_next_page: bool) -> Page {
    Page {
        items,
        info: PageInfo {
            per_page: Some(per_page),
            has_next_page: Some(has_next_page),
            ..PageInfo::default()
        },
    }
}

/// Fetcher that replays canned results and records every request
pub struct ScriptedFetcher {
    results: RefCell<VecDeque<Result<Page>>>,
    requests: RefCell<Vec<PageRequest>>,
}

impl ScriptedFetcher {
    pub fn new(results: Vec<Result<Page>>) -> Self {
        Self {
            results: RefCell::new(results.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.borrow().clone()
    }
}

impl PageFetcher for ScriptedFetcher {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        self.requests.borrow_mut().push(*request);
        self.results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(Error::OperationFailed("no scripted page left".to_string())))
    }
}

/// Config tracking the given staff last names, paging by `page_size`
pub fn config(staff: &[&str], page_size: usize) -> Config {
    let mut config = Config::default();
    config.board.staff = staff.iter().map(|name| name.to_string()).collect();
    config.upstream.page_size = page_size;
    config
}

pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }
}
