//! Pagination coordinator
//!
//! Owns the dashboard session: cursor, "more available" flag, and the board
//! and table aggregates. Fetching is split into `begin` and `complete` so a
//! UI can run the network call on another thread while the coordinator stays
//! on the UI thread; `load_next` does both in one call.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::config::{Config, FieldsConfig};
use crate::error::{Error, Result};
use crate::query::{self, StageOrder, TableQuery};
use crate::record::{normalize, RawTask};
use crate::table::{FlatRow, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub skip: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_pages: Option<u64>,
    pub total_items: Option<u64>,
    pub per_page: Option<usize>,
    pub page: Option<u64>,
    pub has_next_page: Option<bool>,
}

/// One upstream page; items are decoded record by record during the merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<serde_json::Value>,
    pub info: PageInfo,
}

/// The upstream fetch collaborator
pub trait PageFetcher {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page>;
}

/// Marks one outstanding fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub request: PageRequest,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub request: PageRequest,
    pub received: usize,
    pub board_entries: usize,
    pub table_rows: usize,
    pub skipped: Vec<SkippedRecord>,
    pub cursor: usize,
    pub has_more: bool,
}

/// Coordinator settings derived from config
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub page_size: usize,
    pub fields: FieldsConfig,
    pub board: crate::config::BoardConfig,
    pub table: crate::config::TableConfig,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.upstream.page_size,
            fields: config.fields.clone(),
            board: config.board.clone(),
            table: config.table.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    version: u64,
    cursor: usize,
    has_more: bool,
    pages_loaded: usize,
    skipped_records: usize,
    last_error: Option<String>,
    in_flight: Option<PageTicket>,
    board: Board,
    table: Table,
}

impl Session {
    fn new(settings: &PipelineSettings) -> Self {
        Self {
            version: 0,
            cursor: 0,
            has_more: true,
            pages_loaded: 0,
            skipped_records: 0,
            last_error: None,
            in_flight: None,
            board: Board::new(&settings.board),
            table: Table::new(&settings.table),
        }
    }
}

#[derive(Debug)]
pub struct Coordinator {
    settings: PipelineSettings,
    stages: StageOrder,
    generation: u64,
    session: Session,
}

impl Coordinator {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            stages: StageOrder::new(&settings.table.stage_order),
            generation: 0,
            session: Session::new(&settings),
            settings,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(PipelineSettings::from(config))
    }

    /// Claim the next page. At most one fetch may be outstanding.
    pub fn begin(&mut self) -> Result<PageTicket> {
        if self.session.in_flight.is_some() {
            return Err(Error::FetchInFlight);
        }
        if !self.session.has_more {
            return Err(Error::NoMorePages);
        }
        let ticket = PageTicket {
            request: PageRequest {
                skip: self.session.cursor,
                limit: self.settings.page_size,
            },
            generation: self.generation,
        };
        self.session.in_flight = Some(ticket);
        tracing::debug!(skip = ticket.request.skip, limit = ticket.request.limit, "page fetch started");
        Ok(ticket)
    }

    /// Merge a fetch result. Results from before a `reset` are discarded
    /// and yield `Ok(None)`. A failed fetch leaves cursor and aggregates as
    /// they were and is returned as the error.
    pub fn complete(&mut self, ticket: PageTicket, result: Result<Page>) -> Result<Option<MergeReport>> {
        if ticket.generation != self.generation || self.session.in_flight != Some(ticket) {
            tracing::debug!(skip = ticket.request.skip, "discarding stale page result");
            return Ok(None);
        }
        self.session.in_flight = None;

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(skip = ticket.request.skip, error = %err, "page fetch failed");
                self.session.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        let advance = page.info.per_page.unwrap_or(ticket.request.limit);
        let Some(cursor) = ticket.request.skip.checked_add(advance) else {
            let err = Error::UpstreamResponse(format!(
                "perPage {advance} overflows cursor at skip {}",
                ticket.request.skip
            ));
            tracing::warn!(skip = ticket.request.skip, error = %err, "page fetch failed");
            self.session.last_error = Some(err.to_string());
            return Err(err);
        };

        Ok(Some(self.merge(ticket.request, page, advance, cursor)))
    }

    /// Fetch and merge the next page.
    pub fn load_next<F: PageFetcher + ?Sized>(&mut self, fetcher: &F) -> Result<MergeReport> {
        let ticket = self.begin()?;
        let result = fetcher.fetch_page(&ticket.request);
        match self.complete(ticket, result)? {
            Some(report) => Ok(report),
            None => Err(Error::OperationFailed(
                "page result was superseded by a refresh".to_string(),
            )),
        }
    }

    /// Start over as if freshly opened. Any outstanding fetch becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        let version = self.session.version + 1;
        self.session = Session::new(&self.settings);
        self.session.version = version;
    }

    fn merge(&mut self, request: PageRequest, page: Page, advance: usize, cursor: usize) -> MergeReport {
        let received = page.items.len();
        let mut board_entries = 0;
        let mut table_rows = 0;
        let mut skipped = Vec::new();

        for (index, item) in page.items.into_iter().enumerate() {
            let task = RawTask::from_value(item)
                .and_then(|raw| normalize(&raw, &self.settings.fields));
            match task {
                Ok(task) => {
                    board_entries += self.session.board.ingest(&task);
                    table_rows += self.session.table.ingest(&task);
                }
                Err(err) => {
                    tracing::warn!(skip = request.skip, index, error = %err, "skipping record");
                    skipped.push(SkippedRecord {
                        index,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let has_more = advance > 0
            && match (page.info.has_next_page, page.info.total_items) {
                (Some(flag), _) => flag,
                (None, Some(total)) => (cursor as u64) < total,
                (None, None) => received >= request.limit,
            };

        let session = &mut self.session;
        session.cursor = cursor;
        session.has_more = has_more;
        session.pages_loaded += 1;
        session.skipped_records += skipped.len();
        session.last_error = None;
        session.version += 1;

        tracing::debug!(
            skip = request.skip,
            received,
            board_entries,
            table_rows,
            skipped = skipped.len(),
            cursor,
            has_more,
            "page merged"
        );

        MergeReport {
            request,
            received,
            board_entries,
            table_rows,
            skipped,
            cursor,
            has_more,
        }
    }

    pub fn board(&self) -> &Board {
        &self.session.board
    }

    pub fn table(&self) -> &Table {
        &self.session.table
    }

    /// Current filtered and sorted table rows
    pub fn rows(&self, query: &TableQuery) -> Vec<&FlatRow> {
        query::apply(self.session.table.rows(), query, &self.stages)
    }

    pub fn stage_order(&self) -> &StageOrder {
        &self.stages
    }

    pub fn has_more(&self) -> bool {
        self.session.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.session.in_flight.is_some()
    }

    pub fn cursor(&self) -> usize {
        self.session.cursor
    }

    pub fn pages_loaded(&self) -> usize {
        self.session.pages_loaded
    }

    /// Bumped on every merge and reset
    pub fn version(&self) -> u64 {
        self.session.version
    }

    pub fn skipped_records(&self) -> usize {
        self.session.skipped_records
    }

    pub fn last_error(&self) -> Option<&str> {
        self.session.last_error.as_deref()
    }
}
