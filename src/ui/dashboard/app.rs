use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::paging::{Coordinator, Page, PageFetcher, PageTicket};
use crate::query::{SortKey, TableQuery};
use crate::table::FlatRow;

use super::model;
use super::view;

const EVENT_POLL_MS: u64 = 120;

pub(crate) enum LoadRequest {
    Page(PageTicket),
}

pub(crate) enum UiMsg {
    PageLoaded(PageTicket, Result<Page>),
}

#[derive(Clone, Copy)]
pub(crate) enum StatusKind {
    Error,
    Info,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Tab {
    Board,
    Table,
}

#[derive(Default, Clone, Copy)]
struct Viewport {
    width: u16,
    height: u16,
}

pub struct AppState {
    pub(crate) coordinator: Coordinator,
    pub(crate) tab: Tab,
    pub(crate) query: TableQuery,
    pub(crate) search_active: bool,
    pub(crate) table_selected: usize,
    pub(crate) board_scroll: usize,
    pub(crate) today: NaiveDate,
    pub(crate) date_format: String,
    pub(crate) description_max_len: usize,
    configured_stages: Vec<String>,
    status_message: Option<String>,
    info_message: Option<String>,
    viewport: Viewport,
}

impl AppState {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            coordinator: Coordinator::from_config(config),
            tab: Tab::Board,
            query: TableQuery::default(),
            search_active: false,
            table_selected: 0,
            board_scroll: 0,
            today: Utc::now().date_naive(),
            date_format: config.table.date_format.clone(),
            description_max_len: config.table.description_max_len,
            configured_stages: config.table.stage_order.clone(),
            status_message: None,
            info_message: None,
            viewport: Viewport::default(),
        }
    }

    fn update_viewport(&mut self, width: u16, height: u16) {
        self.viewport = Viewport { width, height };
    }

    pub(crate) fn visible_rows(&self) -> Vec<&FlatRow> {
        self.coordinator.rows(&self.query)
    }

    pub(crate) fn stage_choices(&self) -> Vec<String> {
        model::stage_choices(&self.configured_stages, &self.coordinator.table().stages())
    }

    pub(crate) fn status_line(&self) -> Option<(String, StatusKind)> {
        if let Some(message) = self.status_message.as_ref() {
            return Some((message.clone(), StatusKind::Error));
        }
        if self.coordinator.is_loading() {
            return Some(("loading...".to_string(), StatusKind::Info));
        }
        if let Some(info) = self.info_message.as_ref() {
            return Some((info.clone(), StatusKind::Info));
        }
        None
    }

    pub(crate) fn footer_hint(&self) -> String {
        if self.search_active {
            return "type search  backspace delete  enter done  esc clear".to_string();
        }
        match self.tab {
            Tab::Board => "tab/1/2 switch  j/k scroll  m more  R refresh  q quit".to_string(),
            Tab::Table => {
                "j/k move  / search  s stage  t/a/r/p/d/g sort  m more  R refresh  q quit"
                    .to_string()
            }
        }
    }

    pub(crate) fn count_summary(&self) -> String {
        let more = if self.coordinator.has_more() {
            "more available"
        } else {
            "all loaded"
        };
        let mut summary = format!(
            "{} assignees  {} rows  {} pages  {}",
            self.coordinator.board().len(),
            self.coordinator.table().len(),
            self.coordinator.pages_loaded(),
            more
        );
        let skipped = self.coordinator.skipped_records();
        if skipped > 0 {
            summary.push_str(&format!("  {skipped} skipped"));
        }
        summary
    }

    fn page_height(&self) -> usize {
        self.viewport.height.saturating_sub(6).max(1) as usize
    }

    fn set_error(&mut self, message: String) {
        self.status_message = Some(message);
        self.info_message = None;
    }

    fn set_info(&mut self, message: String) {
        self.info_message = Some(message);
        self.status_message = None;
    }

    /// Ask the loader for the next page unless one is already in flight.
    pub(crate) fn request_more(&mut self, req_tx: &Sender<LoadRequest>) {
        if self.coordinator.is_loading() {
            return;
        }
        if !self.coordinator.has_more() {
            self.set_info("no more tasks".to_string());
            return;
        }
        let ticket = match self.coordinator.begin() {
            Ok(ticket) => ticket,
            Err(err) => {
                self.set_error(err.to_string());
                return;
            }
        };
        self.status_message = None;
        if req_tx.send(LoadRequest::Page(ticket)).is_err() {
            let err = Error::OperationFailed("task loader stopped".to_string());
            let _ = self.coordinator.complete(ticket, Err(err));
            self.set_error("task loader stopped".to_string());
        }
    }

    pub(crate) fn refresh(&mut self, req_tx: &Sender<LoadRequest>) {
        self.coordinator.reset();
        self.table_selected = 0;
        self.board_scroll = 0;
        self.request_more(req_tx);
    }

    pub(crate) fn apply_message(&mut self, msg: UiMsg) {
        match msg {
            UiMsg::PageLoaded(ticket, result) => match self.coordinator.complete(ticket, result) {
                Ok(Some(report)) => {
                    let mut message = format!("loaded {} tasks", report.received);
                    if !report.skipped.is_empty() {
                        message.push_str(&format!(", skipped {} malformed", report.skipped.len()));
                    }
                    self.set_info(message);
                    self.clamp_selection();
                }
                Ok(None) => {}
                Err(err) => self.set_error(format!("load error: {err}")),
            },
        }
    }

    fn clamp_selection(&mut self) {
        let total = self.visible_rows().len();
        self.table_selected = model::clamp_selection(self.table_selected, total);
        let lines = model::board_line_count(self.coordinator.board().buckets());
        self.board_scroll = model::clamp_selection(self.board_scroll, lines);
    }

    fn move_cursor(&mut self, delta: isize) {
        match self.tab {
            Tab::Board => {
                let lines = model::board_line_count(self.coordinator.board().buckets());
                self.board_scroll = model::move_selection(self.board_scroll, delta, lines);
            }
            Tab::Table => {
                let total = self.visible_rows().len();
                self.table_selected = model::move_selection(self.table_selected, delta, total);
            }
        }
    }

    fn toggle_sort(&mut self, key: SortKey) {
        self.query.toggle_sort(key);
        self.set_info(format!(
            "sort: {} {}",
            self.query.sort,
            match self.query.direction {
                crate::query::SortDirection::Asc => "asc",
                crate::query::SortDirection::Desc => "desc",
            }
        ));
    }

    fn cycle_stage(&mut self) {
        let choices = self.stage_choices();
        self.query.stage = model::next_stage(self.query.stage.as_deref(), &choices);
        self.table_selected = 0;
        let label = self.query.stage.clone().unwrap_or_else(|| "all".to_string());
        self.set_info(format!("stage: {label}"));
    }
}

pub fn run<F>(config: &Config, fetcher: F) -> Result<()>
where
    F: PageFetcher + Send + 'static,
{
    let (ui_tx, ui_rx) = mpsc::channel();
    let (req_tx, req_rx) = mpsc::channel();

    spawn_loader(fetcher, req_rx, ui_tx);

    let mut app = AppState::new(config);
    app.request_more(&req_tx);
    run_terminal(&mut app, ui_rx, req_tx)
}

fn run_terminal(
    app: &mut AppState,
    ui_rx: Receiver<UiMsg>,
    req_tx: Sender<LoadRequest>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let size = terminal.size()?;
    app.update_viewport(size.width, size.height);

    let result = run_loop(&mut terminal, app, ui_rx, req_tx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    ui_rx: Receiver<UiMsg>,
    req_tx: Sender<LoadRequest>,
) -> Result<()> {
    let mut dirty = true;
    loop {
        while let Ok(msg) = ui_rx.try_recv() {
            app.apply_message(msg);
            dirty = true;
        }

        if dirty {
            terminal.draw(|frame| {
                app.update_viewport(frame.size().width, frame.size().height);
                view::render(frame, app);
            })?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    if handle_key(app, key, &req_tx) {
                        break;
                    }
                    dirty = true;
                }
                Event::Resize(width, height) => {
                    app.update_viewport(width, height);
                    dirty = true;
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Returns true when the dashboard should exit.
pub(crate) fn handle_key(app: &mut AppState, key: KeyEvent, req_tx: &Sender<LoadRequest>) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    if app.search_active {
        match key.code {
            KeyCode::Esc => {
                app.query.search.clear();
                app.search_active = false;
            }
            KeyCode::Enter => app.search_active = false,
            KeyCode::Backspace => {
                app.query.search.pop();
            }
            KeyCode::Char(ch) => app.query.search.push(ch),
            _ => {}
        }
        app.table_selected = 0;
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Tab => {
            app.tab = match app.tab {
                Tab::Board => Tab::Table,
                Tab::Table => Tab::Board,
            };
        }
        KeyCode::Char('1') => app.tab = Tab::Board,
        KeyCode::Char('2') => app.tab = Tab::Table,
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::PageDown => {
            let jump = app.page_height() as isize;
            app.move_cursor(jump);
        }
        KeyCode::PageUp => {
            let jump = app.page_height() as isize;
            app.move_cursor(-jump);
        }
        KeyCode::Char('m') => app.request_more(req_tx),
        KeyCode::Char('R') => app.refresh(req_tx),
        KeyCode::Char('/') if app.tab == Tab::Table => app.search_active = true,
        KeyCode::Char('s') if app.tab == Tab::Table => app.cycle_stage(),
        KeyCode::Char(ch) if app.tab == Tab::Table => {
            if let Some(sort) = sort_key_for(ch) {
                app.toggle_sort(sort);
            }
        }
        _ => {}
    }
    false
}

fn sort_key_for(ch: char) -> Option<SortKey> {
    match ch {
        't' => Some(SortKey::Title),
        'a' => Some(SortKey::Assignee),
        'r' => Some(SortKey::Requestor),
        'p' => Some(SortKey::Priority),
        'd' => Some(SortKey::DueDate),
        'g' => Some(SortKey::Stage),
        _ => None,
    }
}

fn spawn_loader<F>(fetcher: F, req_rx: Receiver<LoadRequest>, ui_tx: Sender<UiMsg>)
where
    F: PageFetcher + Send + 'static,
{
    thread::spawn(move || {
        while let Ok(req) = req_rx.recv() {
            match req {
                LoadRequest::Page(ticket) => {
                    let result = fetcher.fetch_page(&ticket.request);
                    if ui_tx.send(UiMsg::PageLoaded(ticket, result)).is_err() {
                        break;
                    }
                }
            }
        }
    });
}
