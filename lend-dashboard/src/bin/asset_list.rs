//! Asset List - Lend/Borrow Market Table TUI
//!
//! Two tables fed by lend-snapshot-server:
//! - Global pools (with hotkey badges)
//! - Isolated pools
//!
//! Keys: [f] filter, [s] sort, [l] lend/borrow, [d] USD/native, [p] positions only,
//! Up/Down/Tab to move, Ctrl+K then a row number to jump, [q]/Esc quit

use std::{
    error::Error,
    fs::File,
    io,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lend_dashboard::{
    derive_asset_list,
    shared::{format, sort::next_sort, table::columns},
    AssetListView, AssetRow, ColumnKind, ConnectionStatus, DashboardConfig, HotkeyAction,
    HotkeyInput, HotkeyRouter, LendingMode, MarketSnapshot, SnapshotClient, UiSettings,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rustls::crypto::ring::default_provider;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// COLORS
// ============================================================================
const C_LIVE: Color = Color::Rgb(100, 220, 100);      // Green
const C_FILLED: Color = Color::Rgb(220, 100, 100);    // Red
const C_HIGH: Color = Color::Rgb(220, 200, 100);      // Yellow
const C_DIM: Color = Color::Rgb(120, 120, 120);       // Gray
const C_BRIGHT: Color = Color::Rgb(220, 220, 220);    // White
const C_ACCENT: Color = Color::Rgb(100, 180, 220);    // Cyan
const C_HEADER: Color = Color::Rgb(180, 130, 220);    // Purple

const INPUT_POLL: Duration = Duration::from_millis(20);

/// Which table Up/Down moves in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Global,
    Isolated,
}

struct App {
    settings: UiSettings,
    router: HotkeyRouter,
    view: AssetListView,
    focus: Focus,
    global_state: TableState,
    isolated_state: TableState,
    status: ConnectionStatus,
}

impl App {
    fn new(config: &DashboardConfig) -> Self {
        Self {
            settings: config.initial,
            router: HotkeyRouter::new(config.hotkey_window),
            view: AssetListView::default(),
            focus: Focus::Global,
            global_state: TableState::default(),
            isolated_state: TableState::default(),
            status: ConnectionStatus::Reconnecting,
        }
    }

    fn refresh(&mut self, snapshot: &MarketSnapshot, config: &DashboardConfig) {
        self.view = derive_asset_list(snapshot, &self.settings, &config.symbols);
        clamp_selection(&mut self.global_state, self.view.global.len());
        clamp_selection(&mut self.isolated_state, self.view.isolated.len());
    }

    fn focused(&mut self) -> (&mut TableState, usize) {
        match self.focus {
            Focus::Global => (&mut self.global_state, self.view.global.len()),
            Focus::Isolated => (&mut self.isolated_state, self.view.isolated.len()),
        }
    }

    fn move_selection(&mut self, down: bool) {
        let (state, len) = self.focused();
        if len == 0 {
            return;
        }
        let next = match (state.selected(), down) {
            (None, _) => 0,
            (Some(i), true) => (i + 1).min(len - 1),
            (Some(i), false) => i.saturating_sub(1),
        };
        state.select(Some(next));
    }

    fn focus_symbol(&mut self, symbol: &str) {
        if let Some(index) = self.view.global_index(symbol) {
            self.focus = Focus::Global;
            self.global_state.select(Some(index));
        } else {
            debug!(symbol, "Hotkey target hidden by the current filter");
        }
    }

    /// Returns false when the app should quit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let now = Instant::now();
        let was_armed = self.router.is_armed(now);
        let input = hotkey_input(&key);

        match self.router.handle(input, now, &self.view.hotkey_ranking) {
            HotkeyAction::Armed => return true,
            HotkeyAction::Focus(symbol) => {
                self.focus_symbol(&symbol);
                return true;
            }
            HotkeyAction::ToggleMode => {
                self.settings.mode = self.settings.mode.toggled();
                return true;
            }
            // Digits and Enter belong to the hotkey session while it is armed
            HotkeyAction::None if was_armed && input != HotkeyInput::Other => return true,
            HotkeyAction::None => {}
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.settings.pool_filter = self.settings.pool_filter.next();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.settings.sort = next_sort(self.settings.sort);
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.settings.mode = self.settings.mode.toggled();
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                self.settings.denomination = self.settings.denomination.toggled();
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.settings.positions_only = !self.settings.positions_only;
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Global => Focus::Isolated,
                    Focus::Isolated => Focus::Global,
                };
            }
            KeyCode::Down => self.move_selection(true),
            KeyCode::Up => self.move_selection(false),
            _ => {}
        }
        true
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        _ => {}
    }
}

fn hotkey_input(key: &KeyEvent) -> HotkeyInput {
    let arm_modifier = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER);
    match key.code {
        KeyCode::Char('k') | KeyCode::Char('K') if arm_modifier => HotkeyInput::Arm,
        KeyCode::Char(c) if !arm_modifier && c.is_ascii_digit() => {
            HotkeyInput::Digit(c as u8 - b'0')
        }
        KeyCode::Char('q') if !arm_modifier => HotkeyInput::ToggleMode,
        KeyCode::Enter => HotkeyInput::Confirm,
        _ => HotkeyInput::Other,
    }
}

/// Send logs to a file; stdout belongs to the alternate screen
fn init_logging(config: &DashboardConfig) -> Result<(), Box<dyn Error>> {
    let file = File::create(&config.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ============================================================================
// MAIN
// ============================================================================
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = default_provider().install_default();

    let config = DashboardConfig::from_env();
    init_logging(&config)?;
    info!(url = %config.feed.url, "Starting asset list");

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let client = SnapshotClient::with_config(config.feed.clone());
    let (snapshot_rx, mut status_rx) = client.start();

    let mut app = App::new(&config);
    let mut last_draw: Option<Instant> = None;

    let result = loop {
        let mut dirty = false;

        if event::poll(INPUT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if !app.handle_key(key) {
                        break Ok(());
                    }
                    dirty = true;
                }
            }
        }

        while let Ok(status) = status_rx.try_recv() {
            if status != app.status {
                info!(?status, "Feed connection status changed");
            }
            app.status = status;
            dirty = true;
        }

        if app.router.expire(Instant::now()) {
            debug!("Hotkey mode expired");
            dirty = true;
        }

        let due = last_draw.map_or(true, |at| at.elapsed() >= config.tick_rate);
        if dirty || due {
            let snapshot: Arc<MarketSnapshot> = Arc::clone(&snapshot_rx.borrow());
            app.refresh(&snapshot, &config);

            terminal.draw(|f| render_ui(f, f.area(), &mut app, &snapshot))?;
            last_draw = Some(Instant::now());
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    if let Err(e) = &result {
        warn!("Asset list exited with error: {}", e);
    }
    result
}

// ============================================================================
// RENDER
// ============================================================================
fn render_ui(f: &mut Frame, area: Rect, app: &mut App, snapshot: &MarketSnapshot) {
    // Layout: Header | Global | Isolated | Footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(60),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, chunks[0], app, snapshot);

    let armed = app.router.is_armed(Instant::now());
    let mode = app.settings.mode;
    render_table(
        f,
        chunks[1],
        " GLOBAL POOLS ",
        &app.view.global,
        &mut app.global_state,
        mode,
        armed,
        app.focus == Focus::Global,
    );
    render_table(
        f,
        chunks[2],
        " ISOLATED POOLS ",
        &app.view.isolated,
        &mut app.isolated_state,
        mode,
        false,
        app.focus == Focus::Isolated,
    );

    render_footer(f, chunks[3]);
}

/// Header: Status | Mode | Filter | Sort | Denomination | Hotkey
fn render_header(f: &mut Frame, area: Rect, app: &App, snapshot: &MarketSnapshot) {
    let block = Block::default()
        .title(" LEND DASHBOARD ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_HEADER));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let (status, status_color) = match app.status {
        ConnectionStatus::Connected => ("[LIVE]", C_LIVE),
        ConnectionStatus::Reconnecting => ("[CONN]", C_HIGH),
        ConnectionStatus::Disconnected => ("[DISC]", C_FILLED),
    };
    let label = |text: &str| Span::styled(text.to_string(), Style::default().fg(C_DIM));
    let value = |text: String| {
        Span::styled(text, Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD))
    };

    let mut spans = vec![
        Span::styled(status, Style::default().fg(status_color).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(
            app.settings.mode.as_str(),
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        label("Filter:"),
        value(app.settings.pool_filter.as_str().to_string()),
        Span::raw("  "),
        label("Sort:"),
        value(app.settings.sort.map(|s| s.label()).unwrap_or("none").to_string()),
        Span::raw("  "),
        label("Units:"),
        value(app.settings.denomination.as_str().to_string()),
    ];

    if app.settings.positions_only {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("MY POSITIONS", Style::default().fg(C_HIGH)));
    }

    if snapshot.native_sol_balance > rust_decimal::Decimal::ZERO {
        spans.push(Span::raw("  "));
        spans.push(label("SOL:"));
        spans.push(value(format::token_amount(snapshot.native_sol_balance)));
    }

    spans.push(Span::raw("  "));
    spans.push(label(&snapshot.time_published.format("%H:%M:%S").to_string()));

    if app.router.is_armed(Instant::now()) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("HOTKEY {}_", app.router.pending()),
            Style::default().fg(Color::Black).bg(C_HIGH).add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

#[allow(clippy::too_many_arguments)]
fn render_table(
    f: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[AssetRow],
    state: &mut TableState,
    mode: LendingMode,
    show_badges: bool,
    focused: bool,
) {
    let border = if focused { C_ACCENT } else { C_DIM };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    if rows.is_empty() {
        let empty = Paragraph::new(Span::styled("No pools to show", Style::default().fg(C_DIM)))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let columns = columns(mode);
    let header_cells = columns.iter().map(|column| {
        Cell::from(column.header).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells).height(1);

    let table_rows = rows.iter().map(|row| {
        let color = if row.metrics.is_filled {
            C_FILLED
        } else if row.metrics.is_high {
            C_HIGH
        } else {
            C_BRIGHT
        };
        let cells = columns.iter().map(|column| {
            let content = match (column.kind, row.hotkey) {
                (ColumnKind::Asset, Some(badge)) if show_badges => format!("[{}] {}", badge, row.symbol),
                (kind, _) => row.cell(kind),
            };
            Cell::from(content)
        });
        Row::new(cells).style(Style::default().fg(color)).height(1)
    });

    let widths: Vec<Constraint> = columns.iter().map(|c| Constraint::Length(c.width)).collect();
    let table = Table::new(table_rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    f.render_stateful_widget(table, area, state);
}

/// Footer
fn render_footer(f: &mut Frame, area: Rect) {
    let key = |k: &str| Span::styled(k.to_string(), Style::default().fg(C_HIGH).add_modifier(Modifier::BOLD));
    let line = Line::from(vec![
        Span::raw(" ["),
        key("f"),
        Span::raw("]ilter  ["),
        key("s"),
        Span::raw("]ort  ["),
        key("l"),
        Span::raw("]end/borrow  ["),
        key("d"),
        Span::raw("]enom  ["),
        key("p"),
        Span::raw("]ositions  ["),
        key("^K"),
        Span::raw("] jump  │  "),
        Span::styled("ASSET LIST", Style::default().fg(C_HEADER)),
        Span::raw("  │  [q] Quit"),
    ]);

    f.render_widget(Paragraph::new(line), area);
}
