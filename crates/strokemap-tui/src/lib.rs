// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use strokemap_app::{
    AppCommand, AppEvent, AppState, Card, Dataset, FieldMap, InputField, ViewMode, ViewModel,
    on_query_changed, range_headers,
};
use tracing::{debug, info, warn};

const PAGE_ROWS: isize = 10;
const TABLE_COLUMNS: usize = 5;
const CARD_MIN_WIDTH: u16 = 34;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

/// A parsed dataset handed to the UI once the initial load finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLoad {
    pub dataset: Dataset,
    pub summary: String,
}

pub trait AppRuntime {
    fn source_label(&self) -> String;
    fn load_dataset(&mut self) -> Result<DatasetLoad>;
    /// Starts the initial load. The default runs it inline; runtimes that can
    /// load in the background override this and report through `tx`.
    fn spawn_dataset_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let event = match self.load_dataset() {
            Ok(load) => InternalEvent::DatasetLoaded(load),
            Err(error) => InternalEvent::DatasetFailed(format!("{error:#}")),
        };
        tx.send(event)
            .map_err(|_| anyhow::anyhow!("dataset event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    DatasetLoaded(DatasetLoad),
    DatasetFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum LoadStatus {
    #[default]
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Pane {
    #[default]
    Table,
    Cards,
}

impl Pane {
    const fn toggle(self) -> Self {
        match self {
            Self::Table => Self::Cards,
            Self::Cards => Self::Table,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Cards => "cards",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    dataset: Dataset,
    fields: FieldMap,
    view: ViewModel,
    load: LoadStatus,
    source_label: String,
    pane: Pane,
    table_scroll: usize,
    column_offset: usize,
    card_scroll: usize,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn new(fields: FieldMap, source_label: String) -> Self {
        Self {
            fields,
            source_label,
            ..Self::default()
        }
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    fields: FieldMap,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(fields, runtime.source_label());
    let (internal_tx, internal_rx) = mpsc::channel();

    // Inputs typed before the load lands filter the empty dataset.
    refresh_view(state, &mut view_data);
    emit_status(
        state,
        &mut view_data,
        &internal_tx,
        format!("loading {}", runtime.source_label()),
    );
    if let Err(error) = runtime.spawn_dataset_load(internal_tx.clone()) {
        mark_load_failed(state, &mut view_data, format!("{error:#}"));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::DatasetLoaded(load) => {
                info!(summary = %load.summary, "dataset ready");
                view_data.dataset = load.dataset;
                view_data.load = LoadStatus::Loaded;
                refresh_view(state, view_data);
                emit_status(state, view_data, tx, load.summary);
            }
            InternalEvent::DatasetFailed(error) => {
                mark_load_failed(state, view_data, error);
            }
        }
    }
}

fn mark_load_failed(state: &mut AppState, view_data: &mut ViewData, error: String) {
    warn!(%error, "dataset load failed");
    view_data.dataset = Dataset::default();
    view_data.load = LoadStatus::Failed;
    refresh_view(state, view_data);
    // Stays up until the next status; there is nothing to retry from here.
    view_data.status_token = view_data.status_token.saturating_add(1);
    state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
            view_data.help_visible = false;
        }
        return false;
    }

    if ctrl {
        match key.code {
            KeyCode::Char('w') => {
                dispatch_and_refresh(state, view_data, AppCommand::ToggleViewMode, internal_tx);
            }
            KeyCode::Char('u') => {
                dispatch_and_refresh(state, view_data, AppCommand::ClearField, internal_tx);
            }
            KeyCode::Char('p') => {
                view_data.pane = view_data.pane.toggle();
                let label = format!("{} pane", view_data.pane.label());
                emit_status(state, view_data, internal_tx, label);
            }
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::F(1) => view_data.help_visible = true,
        KeyCode::Tab => {
            dispatch_and_refresh(state, view_data, AppCommand::FocusNext, internal_tx);
        }
        KeyCode::BackTab => {
            dispatch_and_refresh(state, view_data, AppCommand::FocusPrev, internal_tx);
        }
        KeyCode::Esc => {
            dispatch_and_refresh(state, view_data, AppCommand::ClearQuery, internal_tx);
        }
        KeyCode::Backspace => {
            dispatch_and_refresh(state, view_data, AppCommand::Backspace, internal_tx);
        }
        KeyCode::Up => scroll(view_data, -1),
        KeyCode::Down => scroll(view_data, 1),
        KeyCode::PageUp => scroll(view_data, -PAGE_ROWS),
        KeyCode::PageDown => scroll(view_data, PAGE_ROWS),
        KeyCode::Home => scroll(view_data, isize::MIN),
        KeyCode::End => scroll(view_data, isize::MAX),
        KeyCode::Left => shift_columns(state, view_data, internal_tx, -1),
        KeyCode::Right => shift_columns(state, view_data, internal_tx, 1),
        KeyCode::Char(ch) => {
            dispatch_and_refresh(state, view_data, AppCommand::InsertChar(ch), internal_tx);
        }
        _ => {}
    }
    false
}

fn dispatch_and_refresh(
    state: &mut AppState,
    view_data: &mut ViewData,
    command: AppCommand,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(command);
    let query_changed = events
        .iter()
        .any(|event| matches!(event, AppEvent::QueryChanged(_)));
    if query_changed {
        view_data.table_scroll = 0;
        view_data.card_scroll = 0;
    }
    let view_mode_changed = events
        .iter()
        .any(|event| matches!(event, AppEvent::ViewModeChanged(_)));
    if query_changed || view_mode_changed {
        refresh_view(state, view_data);
    }
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn refresh_view(state: &AppState, view_data: &mut ViewData) {
    view_data.view = on_query_changed(
        &view_data.dataset,
        &state.query,
        &view_data.fields,
        state.view_mode,
    );
    if state.view_mode == ViewMode::Wrapped {
        view_data.column_offset = 0;
    }
    clamp_scroll(view_data);
    debug!(
        load = %state.query.load,
        search = %state.query.search,
        rows = view_data.view.row_count(),
        error = ?view_data.view.error,
        "view recomputed"
    );
}

fn clamp_scroll(view_data: &mut ViewData) {
    view_data.table_scroll = view_data
        .table_scroll
        .min(view_data.view.table.len().saturating_sub(1));
    view_data.card_scroll = view_data
        .card_scroll
        .min(view_data.view.cards.len().saturating_sub(1));
}

fn scroll(view_data: &mut ViewData, delta: isize) {
    let (offset, len) = match view_data.pane {
        Pane::Table => (&mut view_data.table_scroll, view_data.view.table.len()),
        Pane::Cards => (&mut view_data.card_scroll, view_data.view.cards.len()),
    };
    let max = len.saturating_sub(1);
    *offset = offset.saturating_add_signed(delta).min(max);
}

fn shift_columns(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    delta: isize,
) {
    if state.view_mode != ViewMode::Scrollable {
        emit_status(
            state,
            view_data,
            internal_tx,
            "columns fit the pane; ctrl+w for scrollable view",
        );
        return;
    }
    view_data.column_offset = view_data
        .column_offset
        .saturating_add_signed(delta)
        .min(TABLE_COLUMNS - 1);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_inputs(frame, layout[0], state, view_data);

    if let Some(message) = &view_data.view.message {
        let color = if view_data.view.error.is_some() {
            Color::Red
        } else {
            Color::Yellow
        };
        let notice = Paragraph::new(message.as_str()).style(Style::default().fg(color));
        frame.render_widget(notice, layout[1]);
    }

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[2]);
    render_table(frame, body[0], state, view_data);
    render_cards(frame, body[1], state, view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[3]);

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_inputs(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
        ])
        .split(area);

    for (field, column) in InputField::ALL.into_iter().zip(columns.iter()) {
        let focused = state.focus == field;
        let border = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let input = Paragraph::new(input_text(state, field)).block(
            Block::default()
                .title(input_title(field, &view_data.dataset))
                .borders(Borders::ALL)
                .border_style(border),
        );
        frame.render_widget(input, *column);
    }

    let info = Paragraph::new(format!("view: {}", state.view_mode.as_str()))
        .block(Block::default().title("strokemap").borders(Borders::ALL))
        .style(Style::default().fg(Color::White));
    frame.render_widget(info, columns[2]);
}

/// The load title carries the span the range columns cover, e.g. `% load 1-100`.
fn input_title(field: InputField, dataset: &Dataset) -> String {
    if field != InputField::Load {
        return field.label().to_owned();
    }
    let ranges = range_headers(dataset.headers());
    let min = ranges.iter().map(|range| range.min).reduce(f64::min);
    let max = ranges.iter().map(|range| range.max).reduce(f64::max);
    match min.zip(max) {
        Some((min, max)) => format!("{} {min}-{max}", field.label()),
        None => field.label().to_owned(),
    }
}

fn input_text(state: &AppState, field: InputField) -> String {
    let value = match field {
        InputField::Load => state.query.load.as_str(),
        InputField::Search => state.query.search.as_str(),
    };
    if state.focus == field {
        format!("{value}_")
    } else {
        value.to_owned()
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let columns = visible_columns(state.view_mode, view_data.column_offset);
    let labels = view_data.fields.table_labels();

    let header = Row::new(columns.iter().map(|index| {
        Cell::from(labels[*index].to_owned()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = view_data
        .view
        .table
        .iter()
        .skip(view_data.table_scroll)
        .map(|line| {
            let cells = line.cells();
            Row::new(
                columns
                    .iter()
                    .map(|index| Cell::from(cells[*index].to_owned()))
                    .collect::<Vec<_>>(),
            )
        });

    let table = Table::new(rows, column_constraints(state.view_mode, &columns, view_data))
        .header(header)
        .column_spacing(1)
        .block(pane_block(table_title(view_data), view_data.pane == Pane::Table));
    frame.render_widget(table, area);
}

fn visible_columns(view_mode: ViewMode, column_offset: usize) -> Vec<usize> {
    match view_mode {
        ViewMode::Wrapped => (0..TABLE_COLUMNS).collect(),
        ViewMode::Scrollable => (column_offset.min(TABLE_COLUMNS - 1)..TABLE_COLUMNS).collect(),
    }
}

fn column_constraints(
    view_mode: ViewMode,
    columns: &[usize],
    view_data: &ViewData,
) -> Vec<Constraint> {
    match view_mode {
        ViewMode::Wrapped => {
            let share = u32::try_from(columns.len()).unwrap_or(1).max(1);
            columns
                .iter()
                .map(|_| Constraint::Ratio(1, share))
                .collect()
        }
        ViewMode::Scrollable => {
            let widths = column_widths(&view_data.fields, &view_data.view);
            columns
                .iter()
                .map(|index| Constraint::Length(widths[*index]))
                .collect()
        }
    }
}

/// Natural width of each table column: the widest of its label and cells.
fn column_widths(fields: &FieldMap, view: &ViewModel) -> [u16; TABLE_COLUMNS] {
    let mut widths = fields
        .table_labels()
        .map(|label| label.chars().count());
    for line in &view.table {
        for (width, cell) in widths.iter_mut().zip(line.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths.map(|width| u16::try_from(width).unwrap_or(u16::MAX))
}

fn table_title(view_data: &ViewData) -> String {
    let rows = view_data.view.table.len();
    match view_data.load {
        LoadStatus::Pending => "table (loading)".to_owned(),
        LoadStatus::Failed => "table (load failed)".to_owned(),
        LoadStatus::Loaded if rows == 0 => "table".to_owned(),
        LoadStatus::Loaded => format!(
            "table {}/{rows} | {}",
            (view_data.table_scroll + 1).min(rows),
            view_data.source_label
        ),
    }
}

fn render_cards(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let block = pane_block(cards_title(view_data), view_data.pane == Pane::Cards);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let per_row = cards_per_row(state.view_mode, inner.width);
    let cards = view_data
        .view
        .cards
        .iter()
        .skip(view_data.card_scroll)
        .collect::<Vec<_>>();

    let mut y = inner.y;
    for chunk in cards.chunks(per_row) {
        if y >= inner.bottom() {
            break;
        }
        let wanted = chunk.iter().map(|card| card_height(card)).max().unwrap_or(0);
        let height = wanted.min(inner.bottom() - y);
        let row_area = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height,
        };
        let share = u32::try_from(per_row).unwrap_or(1);
        let slots = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, share); per_row])
            .split(row_area);

        for (card, slot) in chunk.iter().zip(slots.iter()) {
            let mut paragraph = Paragraph::new(render_card_text(card)).block(
                Block::default()
                    .title(card.title.clone())
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
            if state.view_mode == ViewMode::Wrapped {
                paragraph = paragraph.wrap(Wrap { trim: true });
            }
            frame.render_widget(paragraph, *slot);
        }
        y = y.saturating_add(height);
    }
}

fn cards_per_row(view_mode: ViewMode, width: u16) -> usize {
    match view_mode {
        ViewMode::Wrapped => usize::from((width / CARD_MIN_WIDTH).max(1)),
        ViewMode::Scrollable => 1,
    }
}

fn card_height(card: &Card) -> u16 {
    let lines = card.entries.len().saturating_mul(2).saturating_add(2);
    u16::try_from(lines).unwrap_or(u16::MAX)
}

fn render_card_text(card: &Card) -> String {
    card.entries
        .iter()
        .map(|entry| format!("{}\n  {}", entry.heading, entry.detail))
        .collect::<Vec<_>>()
        .join("\n")
}

fn cards_title(view_data: &ViewData) -> String {
    match view_data.view.cards.len() {
        0 => "cards".to_owned(),
        1 => "cards 1 pump".to_owned(),
        count => format!("cards {count} pumps"),
    }
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let field = state.focus.label();
    let view = state.view_mode.as_str();
    let pane = view_data.pane.label();
    let default = format!(
        "tab field:{field} | ctrl+u clear | esc reset | ctrl+w view:{view} | ctrl+p pane:{pane} | arrows scroll | F1 help | ctrl+q"
    );
    match &state.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default,
    }
}

fn help_overlay_text() -> &'static str {
    "inputs: type to edit | tab/shift+tab switch field | backspace | ctrl+u clear field | esc clear both\n\
view: ctrl+w wrapped/scrollable | ctrl+p focus table/cards\n\
scroll: up/down pgup/pgdn home/end rows | left/right columns (scrollable view)\n\
global: F1 help | ctrl+q quit"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, DatasetLoad, InternalEvent, LoadStatus, Pane, ViewData, cards_per_row,
        cards_title, column_widths, handle_key_event, help_overlay_text, input_text, input_title,
        process_internal_events, refresh_view, render, render_card_text, status_text, table_title,
        visible_columns,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc::{self, Sender};
    use strokemap_app::{AppState, Dataset, FieldMap, InputField, ViewMode};
    use strokemap_testkit::sample_dataset;

    #[derive(Debug, Default)]
    struct TestRuntime {
        fail: bool,
        load_count: usize,
    }

    impl AppRuntime for TestRuntime {
        fn source_label(&self) -> String {
            "sample".to_owned()
        }

        fn load_dataset(&mut self) -> Result<DatasetLoad> {
            self.load_count += 1;
            if self.fail {
                return Err(anyhow!("cannot reach sample server"));
            }
            Ok(DatasetLoad {
                dataset: sample_dataset(),
                summary: "loaded 4 rows x 6 columns from sample".to_owned(),
            })
        }
    }

    fn internal_tx() -> Sender<InternalEvent> {
        let (tx, _rx) = mpsc::channel();
        tx
    }

    fn loaded_view_data(state: &AppState) -> ViewData {
        let mut view_data = ViewData::new(FieldMap::default(), "sample".to_owned());
        view_data.dataset = sample_dataset();
        view_data.load = LoadStatus::Loaded;
        refresh_view(state, &mut view_data);
        view_data
    }

    fn press(
        state: &mut AppState,
        view_data: &mut ViewData,
        tx: &Sender<InternalEvent>,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> bool {
        handle_key_event(state, view_data, tx, KeyEvent::new(code, modifiers))
    }

    fn type_text(
        state: &mut AppState,
        view_data: &mut ViewData,
        tx: &Sender<InternalEvent>,
        text: &str,
    ) {
        for ch in text.chars() {
            press(state, view_data, tx, KeyCode::Char(ch), KeyModifiers::NONE);
        }
    }

    #[test]
    fn typing_a_load_filters_and_fills_strokes() {
        let mut state = AppState::default();
        let mut view_data = loaded_view_data(&state);
        let tx = internal_tx();

        type_text(&mut state, &mut view_data, &tx, "75");
        assert_eq!(state.query.load, "75");
        let strokes = view_data
            .view
            .table
            .iter()
            .map(|line| line.stroke.as_str())
            .collect::<Vec<_>>();
        assert_eq!(strokes, vec!["18", "N/A", "7", "22"]);
    }

    #[test]
    fn tab_moves_typing_to_search_field() {
        let mut state = AppState::default();
        let mut view_data = loaded_view_data(&state);
        let tx = internal_tx();

        press(&mut state, &mut view_data, &tx, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(state.focus, InputField::Search);
        type_text(&mut state, &mut view_data, &tx, "Booster");
        assert_eq!(state.query.search, "Booster");
        assert_eq!(view_data.view.table.len(), 1);

        press(&mut state, &mut view_data, &tx, KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(state.focus, InputField::Load);
    }

    #[test]
    fn invalid_load_shows_error_and_esc_resets() {
        let mut state = AppState::default();
        let mut view_data = loaded_view_data(&state);
        let tx = internal_tx();

        type_text(&mut state, &mut view_data, &tx, "abc");
        assert!(view_data.view.error.is_some());
        assert!(view_data.view.table.is_empty());

        press(&mut state, &mut view_data, &tx, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(state.query.load, "");
        assert_eq!(view_data.view.error, None);
        assert_eq!(view_data.view.table.len(), 4);
    }

    #[test]
    fn backspace_and_ctrl_u_edit_focused_field() {
        let mut state = AppState::default();
        let mut view_data = loaded_view_data(&state);
        let tx = internal_tx();

        type_text(&mut state, &mut view_data, &tx, "755");
        press(&mut state, &mut view_data, &tx, KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(state.query.load, "75");

        press(&mut state, &mut view_data, &tx, KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(state.query.load, "");
        assert!(view_data.view.table.iter().all(|line| line.stroke == "-"));
    }

    #[test]
    fn ctrl_w_toggles_view_mode_and_resets_columns() {
        let mut state = AppState::default();
        let mut view_data = loaded_view_data(&state);
        let tx = internal_tx();

        press(&mut state, &mut view_data, &tx, KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(view_data.column_offset, 0);
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("ctrl+w"))
        );

        press(&mut state, &mut view_data, &tx, KeyCode::Char('w'), KeyModifiers::CONTROL);
        assert_eq!(state.view_mode, ViewMode::Scrollable);
        assert_eq!(view_data.view.view_mode, ViewMode::Scrollable);
        assert_eq!(state.status_line.as_deref(), Some("view scrollable"));

        press(&mut state, &mut view_data, &tx, KeyCode::Right, KeyModifiers::NONE);
        press(&mut state, &mut view_data, &tx, KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(view_data.column_offset, 2);
        assert_eq!(visible_columns(state.view_mode, view_data.column_offset), vec![2, 3, 4]);

        press(&mut state, &mut view_data, &tx, KeyCode::Char('w'), KeyModifiers::CONTROL);
        assert_eq!(state.view_mode, ViewMode::Wrapped);
        assert_eq!(view_data.column_offset, 0);
    }

    #[test]
    fn scrolling_clamps_to_rows_and_follows_pane() {
        let mut state = AppState::default();
        let mut view_data = loaded_view_data(&state);
        let tx = internal_tx();

        press(&mut state, &mut view_data, &tx, KeyCode::PageDown, KeyModifiers::NONE);
        assert_eq!(view_data.table_scroll, 3);
        press(&mut state, &mut view_data, &tx, KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(view_data.table_scroll, 2);
        press(&mut state, &mut view_data, &tx, KeyCode::Home, KeyModifiers::NONE);
        assert_eq!(view_data.table_scroll, 0);

        press(&mut state, &mut view_data, &tx, KeyCode::Char('p'), KeyModifiers::CONTROL);
        assert_eq!(view_data.pane, Pane::Cards);
        press(&mut state, &mut view_data, &tx, KeyCode::End, KeyModifiers::NONE);
        assert_eq!(view_data.card_scroll, view_data.view.cards.len() - 1);
        assert_eq!(view_data.table_scroll, 0);
    }

    #[test]
    fn query_change_resets_scroll() {
        let mut state = AppState::default();
        let mut view_data = loaded_view_data(&state);
        let tx = internal_tx();

        press(&mut state, &mut view_data, &tx, KeyCode::Down, KeyModifiers::NONE);
        assert_eq!(view_data.table_scroll, 1);
        type_text(&mut state, &mut view_data, &tx, "5");
        assert_eq!(view_data.table_scroll, 0);
    }

    #[test]
    fn help_overlay_swallows_keys_until_closed() {
        let mut state = AppState::default();
        let mut view_data = loaded_view_data(&state);
        let tx = internal_tx();

        press(&mut state, &mut view_data, &tx, KeyCode::F(1), KeyModifiers::NONE);
        assert!(view_data.help_visible);
        assert_eq!(status_text(&state, &view_data), "");

        type_text(&mut state, &mut view_data, &tx, "12");
        assert_eq!(state.query.load, "");

        press(&mut state, &mut view_data, &tx, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!view_data.help_visible);
        assert!(help_overlay_text().contains("ctrl+w"));
    }

    #[test]
    fn ctrl_q_quits_even_with_help_open() {
        let mut state = AppState::default();
        let mut view_data = loaded_view_data(&state);
        let tx = internal_tx();

        view_data.help_visible = true;
        assert!(press(&mut state, &mut view_data, &tx, KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert!(!press(&mut state, &mut view_data, &tx, KeyCode::Char('q'), KeyModifiers::NONE));
    }

    #[test]
    fn runtime_load_reports_through_internal_events() -> Result<()> {
        let mut state = AppState::default();
        let mut view_data = ViewData::new(FieldMap::default(), "sample".to_owned());
        let (tx, rx) = mpsc::channel();
        let mut runtime = TestRuntime::default();

        type_text(&mut state, &mut view_data, &tx, "10");
        assert!(view_data.view.table.is_empty());
        assert_eq!(table_title(&view_data), "table (loading)");

        runtime.spawn_dataset_load(tx.clone())?;
        process_internal_events(&mut state, &mut view_data, &tx, &rx);
        assert_eq!(runtime.load_count, 1);
        assert_eq!(view_data.load, LoadStatus::Loaded);
        assert_eq!(view_data.view.table.len(), 4);
        assert_eq!(view_data.view.table[0].stroke, "12");
        assert_eq!(
            state.status_line.as_deref(),
            Some("loaded 4 rows x 6 columns from sample")
        );
        assert_eq!(table_title(&view_data), "table 1/4 | sample");
        Ok(())
    }

    #[test]
    fn failed_load_keeps_error_status() -> Result<()> {
        let mut state = AppState::default();
        let mut view_data = ViewData::new(FieldMap::default(), "sample".to_owned());
        let (tx, rx) = mpsc::channel();
        let mut runtime = TestRuntime {
            fail: true,
            ..TestRuntime::default()
        };

        runtime.spawn_dataset_load(tx.clone())?;
        process_internal_events(&mut state, &mut view_data, &tx, &rx);
        assert_eq!(view_data.load, LoadStatus::Failed);
        assert_eq!(table_title(&view_data), "table (load failed)");
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("cannot reach sample server"))
        );

        let stale = view_data.status_token.saturating_sub(1);
        tx.send(InternalEvent::ClearStatus { token: stale })?;
        process_internal_events(&mut state, &mut view_data, &tx, &rx);
        assert!(state.status_line.is_some());
        Ok(())
    }

    #[test]
    fn current_status_token_clears_status() -> Result<()> {
        let mut state = AppState::default();
        let mut view_data = loaded_view_data(&state);
        let (tx, rx) = mpsc::channel();

        handle_key_event(
            &mut state,
            &mut view_data,
            &tx,
            KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL),
        );
        assert_eq!(state.status_line.as_deref(), Some("cards pane"));

        tx.send(InternalEvent::ClearStatus {
            token: view_data.status_token,
        })?;
        process_internal_events(&mut state, &mut view_data, &tx, &rx);
        assert_eq!(state.status_line, None);
        Ok(())
    }

    #[test]
    fn focused_input_shows_cursor() {
        let state = AppState {
            focus: InputField::Search,
            ..AppState::default()
        };
        assert_eq!(input_text(&state, InputField::Search), "_");
        assert_eq!(input_text(&state, InputField::Load), "");
    }

    #[test]
    fn card_text_and_titles() {
        let state = AppState::default();
        let view_data = loaded_view_data(&state);
        assert_eq!(cards_title(&view_data), "cards 3 pumps");
        assert_eq!(
            render_card_text(&view_data.view.cards[0]),
            "D-101 (Scale)\n  Well 1 = -\nD-104 (Paraffin)\n  Well 4 = -"
        );
        assert_eq!(cards_per_row(ViewMode::Wrapped, 100), 2);
        assert_eq!(cards_per_row(ViewMode::Wrapped, 10), 1);
        assert_eq!(cards_per_row(ViewMode::Scrollable, 100), 1);
    }

    #[test]
    fn column_widths_fit_labels_and_cells() {
        let state = AppState::default();
        let view_data = loaded_view_data(&state);
        let widths = column_widths(&view_data.fields, &view_data.view);
        assert_eq!(widths[0], "Feed Pump A".len() as u16);
        assert_eq!(widths[4], "%Stroke".len() as u16);
    }

    #[test]
    fn render_draws_table_rows() -> Result<()> {
        let state = AppState::default();
        let view_data = loaded_view_data(&state);
        let mut terminal = Terminal::new(TestBackend::new(120, 40))?;
        terminal.draw(|frame| render(frame, &state, &view_data))?;

        let buffer = terminal.backend().buffer();
        let text = buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>();
        assert!(text.contains("Feed Pump A"));
        assert!(text.contains("% load 1-100"));
        Ok(())
    }

    #[test]
    fn load_title_shows_declared_range_span() {
        let view_data = loaded_view_data(&AppState::default());
        assert_eq!(input_title(InputField::Load, &view_data.dataset), "% load 1-100");
        assert_eq!(input_title(InputField::Search, &view_data.dataset), "pump search");

        let fractional = Dataset::parse("Feed pump,0.5-40%,40.5-80% load\nA,1,2\n");
        assert_eq!(input_title(InputField::Load, &fractional), "% load 0.5-80");

        let bare = Dataset::parse("Feed pump,Drum\nA,D-1\n");
        assert_eq!(input_title(InputField::Load, &bare), "% load");
    }
}
