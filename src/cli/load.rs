//! Page loading shared by the one-shot commands

use serde::Serialize;

use crate::error::{Error, Result};
use crate::output::{emit_partial, emit_success, HumanOutput, OutputOptions};
use crate::paging::{Coordinator, PageFetcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    Pages(usize),
    All,
}

/// Skipped record, located by the page offset it came from
#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    pub skip: usize,
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct LoadSummary {
    pub pages: usize,
    pub received: usize,
    pub cursor: usize,
    pub has_more: bool,
    pub skipped: Vec<SkippedEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    failure: Option<Error>,
}

impl LoadSummary {
    /// The retryable failure that cut the load short, if any
    pub fn take_failure(&mut self) -> Option<Error> {
        self.failure.take()
    }
}

/// Load pages until the limit is reached or upstream runs dry. An empty
/// page stops the loop even if upstream still claims more.
///
/// A retryable failure after at least one page ends the loop and is kept
/// on the summary, so the pages already merged can still be shown.
pub fn load_pages<F: PageFetcher + ?Sized>(
    coordinator: &mut Coordinator,
    fetcher: &F,
    limit: PageLimit,
) -> Result<LoadSummary> {
    let mut summary = LoadSummary {
        pages: 0,
        received: 0,
        cursor: coordinator.cursor(),
        has_more: coordinator.has_more(),
        skipped: Vec::new(),
        error: None,
        failure: None,
    };

    while coordinator.has_more() {
        if let PageLimit::Pages(max) = limit {
            if summary.pages >= max {
                break;
            }
        }
        let report = match coordinator.load_next(fetcher) {
            Ok(report) => report,
            Err(err) if err.is_retryable() && summary.pages > 0 => {
                summary.error = Some(err.to_string());
                summary.failure = Some(Error::PartialLoad {
                    pages: summary.pages,
                    source: Box::new(err),
                });
                break;
            }
            Err(err) => return Err(err),
        };
        summary.pages += 1;
        summary.received += report.received;
        summary.cursor = report.cursor;
        summary.has_more = report.has_more;
        summary.skipped.extend(report.skipped.into_iter().map(|skipped| SkippedEntry {
            skip: report.request.skip,
            index: skipped.index,
            reason: skipped.reason,
        }));
        if report.received == 0 {
            tracing::debug!(cursor = report.cursor, "empty page; stopping");
            break;
        }
    }

    Ok(summary)
}

/// Common summary lines and warnings for a load
pub fn describe(summary: &LoadSummary, human: &mut HumanOutput) {
    human.push_summary("pages loaded", summary.pages.to_string());
    human.push_summary("records received", summary.received.to_string());
    human.push_summary(
        "more available",
        if summary.has_more { "yes" } else { "no" },
    );
    if !summary.skipped.is_empty() {
        human.push_warning(format!(
            "{} malformed record(s) skipped",
            summary.skipped.len()
        ));
        for skipped in &summary.skipped {
            human.push_warning(format!(
                "record {} at offset {}: {}",
                skipped.index, skipped.skip, skipped.reason
            ));
        }
    }
    if let Some(error) = summary.error.as_deref() {
        human.push_warning(format!(
            "loading stopped after {} page(s): {error}",
            summary.pages
        ));
        human.push_next_step("rerun the command to retry");
    } else if summary.has_more {
        human.push_next_step("rerun with --pages N or --all to load more");
    }
}

/// Emit the report, then hand back any stored failure as the command's
/// error so the exit code reflects it.
pub fn emit<T: Serialize>(
    output: OutputOptions,
    command: &str,
    report: &T,
    human: &HumanOutput,
    failure: Option<Error>,
) -> Result<()> {
    match failure {
        None => emit_success(output, command, report, Some(human)),
        Some(err) => {
            emit_partial(output, command, report, Some(human))?;
            Err(err)
        }
    }
}
