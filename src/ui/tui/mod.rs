use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation,
    ScrollbarState, Wrap,
};
use tracing::{info, warn};

mod cover;
mod detail;
mod home;

pub(crate) use cover::image_to_ascii as ascii_preview;

use crate::base_system::context::Config;
use crate::base_system::logging::take_broadcast_rx;
use crate::catalog::client::{CatalogClient, SearchError, SearchOutcome};
use crate::catalog::session::{Phase, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Menu,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Home,
    Detail,
    Cover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MenuAction {
    Confirm,
    CycleField,
    Quit,
}

#[derive(Debug)]
enum WorkerMsg {
    SearchDone {
        seq: u64,
        result: Result<SearchOutcome, SearchError>,
    },
    CoverResolved {
        seq: u64,
        url: Option<String>,
    },
    CoverArt {
        seq: u64,
        result: Result<Vec<String>>,
    },
}

pub(super) struct App {
    input: String,
    focus: Focus,
    status: String,
    messages: Vec<String>,
    logs: Vec<String>,

    session: Session,
    list_state: ListState,
    menu_state: ListState,
    config: Config,
    should_quit: bool,
    view: View,

    // cover state
    cover_lines: Vec<String>,
    cover_title: String,
    cover_art_seq: Option<u64>,
    cover_art_counter: u64,

    // detail scroll
    detail_scroll: u16,

    // home layout（鼠标命中用）
    last_home_layout: Option<[Rect; 5]>,

    // worker
    worker_tx: Sender<WorkerMsg>,
    worker_rx: Receiver<WorkerMsg>,

    // spinner
    spinner_active: bool,
    spinner_text: String,
    spinner_idx: usize,
    spinner_last: Instant,

    // log
    log_rx: Option<crossbeam_channel::Receiver<String>>,
}

impl App {
    fn new(config: Config, worker_tx: Sender<WorkerMsg>, worker_rx: Receiver<WorkerMsg>) -> Self {
        let mut menu_state = ListState::default();
        menu_state.select(Some(0));

        Self {
            input: String::new(),
            focus: Focus::Input,
            status: "输入关键词，Enter 搜索，Tab 切换焦点，q 退出".to_string(),
            messages: Vec::new(),
            logs: Vec::new(),
            session: Session::new(),
            list_state: ListState::default(),
            menu_state,
            config,
            should_quit: false,
            view: View::Home,
            cover_lines: Vec::new(),
            cover_title: String::new(),
            cover_art_seq: None,
            cover_art_counter: 0,
            detail_scroll: 0,
            last_home_layout: None,
            worker_tx,
            worker_rx,
            spinner_active: false,
            spinner_text: String::new(),
            spinner_idx: 0,
            spinner_last: Instant::now(),
            log_rx: take_broadcast_rx(),
        }
    }

    fn push_message(&mut self, msg: impl Into<String>) {
        self.messages.push(msg.into());
        if self.messages.len() > 8 {
            let overflow = self.messages.len() - 8;
            self.messages.drain(0..overflow);
        }
    }

    fn push_log(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        let trimmed = msg.trim_end_matches(['\r', '\n']);
        self.logs.push(trimmed.to_string());
        if self.logs.len() > 200 {
            let overflow = self.logs.len() - 200;
            self.logs.drain(0..overflow);
        }
    }

    fn select_next(&mut self) {
        let len = self.session.results().len();
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        let next = match self.list_state.selected() {
            Some(idx) if idx + 1 < len => idx + 1,
            _ => 0,
        };
        self.list_state.select(Some(next));
    }

    fn select_prev(&mut self) {
        let len = self.session.results().len();
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        let prev = match self.list_state.selected() {
            Some(0) | None => len.saturating_sub(1),
            Some(idx) => idx - 1,
        };
        self.list_state.select(Some(prev));
    }
}

pub fn run(config: Config) -> Result<()> {
    let (worker_tx, worker_rx) = mpsc::channel();
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    execute!(stdout, EnableMouseCapture).context("enable mouse capture")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("init terminal")?;

    let result = run_loop(&mut terminal, config, worker_tx, worker_rx);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), DisableMouseCapture).ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    config: Config,
    worker_tx: Sender<WorkerMsg>,
    worker_rx: Receiver<WorkerMsg>,
) -> Result<()> {
    let mut app = App::new(config, worker_tx, worker_rx);

    loop {
        tick_spinner(&mut app);
        poll_worker(&mut app);
        drain_log_channel(&mut app);

        terminal.draw(|f| draw_ui(f, &mut app))?;

        if !handle_event(&mut app)? {
            break;
        }
    }

    Ok(())
}

fn draw_ui(frame: &mut ratatui::Frame, app: &mut App) {
    match app.view {
        View::Home => home::draw_home(frame, app),
        View::Detail => detail::draw_detail(frame, app),
        View::Cover => cover::draw_cover(frame, app),
    }
}

fn handle_event(app: &mut App) -> Result<bool> {
    if !event::poll(Duration::from_millis(200)).context("poll event")? {
        return Ok(true);
    }

    let evt = event::read().context("read event")?;
    match app.view {
        View::Home => home::handle_event_home(app, evt)?,
        View::Detail => detail::handle_event_detail(app, evt)?,
        View::Cover => cover::handle_event_cover(app, evt)?,
    }

    Ok(!app.should_quit)
}

pub(super) fn start_search_task(app: &mut App) -> Result<()> {
    let term = app.session.query.clone();
    let criterion = app.session.search_by;
    let seq = app.session.begin_search();
    app.list_state.select(None);

    info!(target: "ui", "开始搜索: {}={}", criterion.param(), term);
    start_spinner(app, format!("按{}搜索中…", criterion.label()));

    let tx = app.worker_tx.clone();
    let cfg = app.config.clone();
    thread::spawn(move || {
        let result = match CatalogClient::new(&cfg) {
            Ok(client) => client.search(&term, criterion),
            Err(err) => Err(SearchError::Transport(err.to_string())),
        };
        let _ = tx.send(WorkerMsg::SearchDone { seq, result });
    });
    Ok(())
}

/// 选中一行：详情同步投影，封面异步确认。
pub(super) fn open_detail(app: &mut App, index: usize) -> Result<()> {
    let Some(token) = app.session.select(index) else {
        return Ok(());
    };
    app.view = View::Detail;
    app.detail_scroll = 0;
    app.cover_lines.clear();
    app.cover_title.clear();
    app.cover_art_seq = None;

    match app.session.selected_isbn().map(str::to_string) {
        Some(isbn) => {
            info!(target: "ui", "解析封面: isbn={isbn}");
            start_spinner(app, "检查封面…");
            let tx = app.worker_tx.clone();
            let cfg = app.config.clone();
            thread::spawn(move || {
                let url = CatalogClient::new(&cfg)
                    .ok()
                    .and_then(|client| client.resolve_cover(&isbn));
                let _ = tx.send(WorkerMsg::CoverResolved { seq: token, url });
            });
        }
        None => {
            app.session.skip_cover();
            app.status = "该书没有 ISBN，跳过封面检查".to_string();
        }
    }
    Ok(())
}

/// 拉取封面字节并转成 ASCII，行宽按当前终端算。
pub(super) fn start_cover_art_task(app: &mut App, url: String) -> Result<()> {
    let Some(selection) = app.session.selection() else {
        return Ok(());
    };
    let title = selection.detail.title.clone();
    app.cover_art_counter += 1;
    let seq = app.cover_art_counter;
    app.cover_art_seq = Some(seq);
    app.cover_title = title;

    start_spinner(app, "加载封面…");
    let (term_w, term_h) = crossterm::terminal::size().unwrap_or((80, 24));
    let tx = app.worker_tx.clone();
    let cfg = app.config.clone();
    thread::spawn(move || {
        let result = CatalogClient::new(&cfg)
            .and_then(|client| client.fetch_cover_bytes(&url))
            .and_then(|bytes| cover::image_to_ascii(&bytes, term_w, term_h));
        let _ = tx.send(WorkerMsg::CoverArt { seq, result });
    });
    Ok(())
}

fn poll_worker(app: &mut App) {
    while let Ok(msg) = app.worker_rx.try_recv() {
        match msg {
            WorkerMsg::SearchDone { seq, result } => {
                // 过期响应不动 spinner：更新的请求还在路上
                if !app.session.apply_search(seq, result) {
                    app.push_log("忽略过期搜索响应");
                    continue;
                }
                stop_spinner(app);
                if let Some(err) = app.session.error() {
                    let err = err.to_string();
                    app.status = format!("搜索失败: {err}");
                    app.push_message(format!("搜索失败: {err}"));
                    warn!(target: "ui", "搜索失败: {err}");
                } else if app.session.results().is_empty() {
                    app.status = "未找到匹配图书".to_string();
                    app.list_state.select(None);
                    app.focus = Focus::Input;
                } else {
                    app.status = format!(
                        "展示 {} 条（共命中 {}），上下键选择，Enter 查看详情。",
                        app.session.results().len(),
                        app.session.total()
                    );
                    app.list_state.select(Some(0));
                    app.focus = Focus::Results;
                }
            }
            WorkerMsg::CoverResolved { seq, url } => {
                let had_url = url.is_some();
                if !app.session.apply_cover(seq, url) {
                    app.push_log("忽略过期封面响应");
                    continue;
                }
                stop_spinner(app);
                app.status = if had_url {
                    "封面可用，按 p 预览，Esc 返回列表".to_string()
                } else {
                    "未找到封面（不影响详情），Esc 返回列表".to_string()
                };
            }
            WorkerMsg::CoverArt { seq, result } => {
                if app.cover_art_seq != Some(seq) || app.session.selection().is_none() {
                    app.push_log("忽略过期封面图");
                    continue;
                }
                stop_spinner(app);
                match result {
                    Ok(lines) => {
                        app.cover_lines = lines;
                        app.view = View::Cover;
                        app.status = "封面预览（按任意键返回详情）".to_string();
                    }
                    Err(err) => {
                        app.status = format!("封面加载失败: {err}");
                        warn!(target: "ui", "封面加载失败: {err}");
                    }
                }
            }
        }
    }
}

fn drain_log_channel(app: &mut App) {
    if let Some(rx) = app.log_rx.as_ref() {
        let rx = rx.clone();
        for line in rx.try_iter() {
            app.push_log(line);
        }
    }
}

pub(super) fn start_spinner(app: &mut App, text: impl Into<String>) {
    app.spinner_active = true;
    app.spinner_text = text.into();
    app.spinner_idx = 0;
    app.spinner_last = Instant::now();
    app.status = format!("{} {}", app.spinner_text, SPINNER_FRAMES[app.spinner_idx]);
}

pub(super) fn stop_spinner(app: &mut App) {
    app.spinner_active = false;
    app.spinner_text.clear();
}

fn tick_spinner(app: &mut App) {
    if !app.spinner_active {
        return;
    }
    if app.spinner_last.elapsed() < Duration::from_millis(140) {
        return;
    }
    app.spinner_idx = (app.spinner_idx + 1) % SPINNER_FRAMES.len();
    app.spinner_last = Instant::now();
    app.status = format!("{} {}", app.spinner_text, SPINNER_FRAMES[app.spinner_idx]);
}

const MENU_ITEMS: &[(&str, MenuAction)] = &[
    ("搜索", MenuAction::Confirm),
    ("切换搜索字段", MenuAction::CycleField),
    ("退出", MenuAction::Quit),
];

const SPINNER_FRAMES: &[char] = &['|', '/', '-', '\\'];

const LOG_HEIGHT: u16 = 7;

pub(super) fn switch_view(app: &mut App, action: MenuAction) -> Result<()> {
    let idx = MENU_ITEMS.iter().position(|(_, a)| *a == action);
    if let Some(i) = idx {
        app.menu_state.select(Some(i));
    }
    match action {
        MenuAction::Confirm => home::process_input(app)?,
        MenuAction::CycleField => {
            app.session.search_by = app.session.search_by.next();
            app.status = format!("搜索字段: {}", app.session.search_by.label());
        }
        MenuAction::Quit => app.should_quit = true,
    }
    Ok(())
}

pub(super) fn trigger_menu_action(app: &mut App) -> Result<()> {
    let idx = app.menu_state.selected().unwrap_or(0);
    let action = MENU_ITEMS
        .get(idx)
        .map(|(_, a)| *a)
        .unwrap_or(MenuAction::Confirm);
    switch_view(app, action)
}

fn pos_in(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x
        && col < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

/// 鼠标行坐标换算列表下标（块有边框，首行内容在 area.y+1）。
///
/// 列表滚动后可见首行不再是第 0 项，必须加上滚动偏移。
fn list_index_from_mouse_row(area: Rect, row: u16, state: &ListState, len: usize) -> Option<usize> {
    if len == 0 || row <= area.y {
        return None;
    }
    let visible = (row - area.y - 1) as usize;
    if visible >= area.height.saturating_sub(2) as usize {
        return None;
    }
    let idx = state.offset() + visible;
    (idx < len).then_some(idx)
}

fn split_with_log(area: Rect) -> (Rect, Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(LOG_HEIGHT.max(4)),
            Constraint::Length(LOG_HEIGHT),
        ])
        .split(area);
    let main = layout.first().copied().unwrap_or(area);
    let log = layout.get(1).copied().unwrap_or(Rect {
        x: area.x,
        y: area
            .y
            .saturating_add(area.height.saturating_sub(LOG_HEIGHT)),
        width: area.width,
        height: LOG_HEIGHT,
    });
    (main, log)
}

fn render_log_box(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();
    if app.logs.is_empty() {
        lines.push(Line::from("日志: 暂无"));
    } else {
        let visible = area.height.saturating_sub(2).max(1) as usize;
        lines.extend(
            app.logs
                .iter()
                .rev()
                .take(visible)
                .rev()
                .map(|m| style_log_line(m)),
        );
    }

    let log = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("日志"));
    frame.render_widget(log, area);
}

fn style_log_line(line: &str) -> Line<'static> {
    let style = if line.contains("ERROR") {
        Style::default().fg(Color::Red)
    } else if line.contains("WARN") {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Line::from(Span::styled(line.to_string(), style))
}

pub(super) fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_row_accounts_for_scroll_offset() {
        // 10 行高的块，内容首行在 y=11
        let area = Rect::new(0, 10, 40, 10);
        let state = ListState::default().with_offset(5);
        assert_eq!(list_index_from_mouse_row(area, 11, &state, 30), Some(5));
        assert_eq!(list_index_from_mouse_row(area, 14, &state, 30), Some(8));

        let unscrolled = ListState::default();
        assert_eq!(list_index_from_mouse_row(area, 11, &unscrolled, 30), Some(0));
    }

    #[test]
    fn mouse_row_outside_content_is_rejected() {
        let area = Rect::new(0, 10, 40, 10);
        let state = ListState::default();
        // 上边框
        assert_eq!(list_index_from_mouse_row(area, 10, &state, 30), None);
        // 下边框（内容只有 height-2 行）
        assert_eq!(list_index_from_mouse_row(area, 19, &state, 30), None);
        // 超出列表长度
        assert_eq!(list_index_from_mouse_row(area, 15, &state, 2), None);
        // 空列表
        assert_eq!(list_index_from_mouse_row(area, 11, &state, 0), None);
    }

    #[test]
    fn stale_response_keeps_spinner_running() {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(Config::default(), tx, rx);

        let stale = app.session.begin_search();
        let fresh = app.session.begin_search();
        start_spinner(&mut app, "搜索中");

        app.worker_tx
            .send(WorkerMsg::SearchDone {
                seq: stale,
                result: Err(SearchError::Status(500)),
            })
            .unwrap();
        poll_worker(&mut app);
        assert!(app.spinner_active);
        assert!(app.session.error().is_none());

        app.worker_tx
            .send(WorkerMsg::SearchDone {
                seq: fresh,
                result: Ok(SearchOutcome {
                    summaries: Vec::new(),
                    total: 0,
                }),
            })
            .unwrap();
        poll_worker(&mut app);
        assert!(!app.spinner_active);
    }
}
