//! taskboard table command implementation

use serde::Serialize;

use super::load::{self, LoadSummary, PageLimit};
use super::GlobalOptions;
use crate::error::Result;
use crate::output::HumanOutput;
use crate::paging::Coordinator;
use crate::query::{SortDirection, SortKey, TableQuery};
use crate::table::FlatRow;

pub struct TableOptions {
    pub pages: PageLimit,
    pub search: Option<String>,
    pub stage: Option<String>,
    pub sort: SortKey,
    pub ascending: bool,
    /// Overrides `table.exclude_done` when set
    pub exclude_done: Option<bool>,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct TableReport<'a> {
    query: &'a TableQuery,
    total_rows: usize,
    rows: Vec<&'a FlatRow>,
    stages: Vec<String>,
    load: LoadSummary,
}

pub fn run(options: TableOptions) -> Result<()> {
    let (mut config, _) = options.global.load_config()?;
    if let Some(exclude_done) = options.exclude_done {
        config.table.exclude_done = exclude_done;
    }

    let query = TableQuery {
        search: options.search.unwrap_or_default(),
        stage: options.stage,
        sort: options.sort,
        direction: if options.ascending {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        },
    };

    let client = options.global.client(&config)?;
    let mut coordinator = Coordinator::from_config(&config);
    let mut summary = load::load_pages(&mut coordinator, &client, options.pages)?;
    let failure = summary.take_failure();

    let rows = coordinator.rows(&query);
    let report = TableReport {
        query: &query,
        total_rows: coordinator.table().len(),
        stages: coordinator.table().stages(),
        rows,
        load: summary,
    };

    let mut human = HumanOutput::new(format!(
        "Table: {} of {} row(s), sorted by {} {}",
        report.rows.len(),
        report.total_rows,
        query.sort,
        match query.direction {
            SortDirection::Asc => "ascending",
            SortDirection::Desc => "descending",
        }
    ));
    load::describe(&report.load, &mut human);
    for row in &report.rows {
        let mut line = format!(
            "{} | {} | {} | {} | {}",
            row.title, row.assignee, row.priority, row.due_label, row.stage
        );
        if let Some(requestor) = row.requestor.as_deref() {
            line.push_str(&format!(" | requested by {requestor}"));
        }
        human.push_detail(line);
    }

    load::emit(options.global.output, "table", &report, &human, failure)
}
