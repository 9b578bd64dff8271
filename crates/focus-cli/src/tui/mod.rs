use std::{
    io,
    time::{Duration, Instant},
};

use chrono::NaiveDate;
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use focus_core::{
    clock::Clock,
    format::{format_duration, format_hours},
    stats::{budget_progress, progress_fraction, total_elapsed},
    storage::KeyValueStore,
    tasks::Task,
};
use focus_tracker::Tracker;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, BorderType, Borders, Gauge, List, ListItem, ListState,
        Paragraph,
    },
    Frame, Terminal,
};
use uuid::Uuid;

use crate::{to_eyre, watch};

/// Dashboard: goal gauge, today's tasks and the recent-days chart.
/// Press `q` or `Esc` to exit; the timer keeps its state on disk.
pub async fn launch<S, C>(mut tracker: Tracker<S, C>, chart_days: usize, tick: Duration) -> Result<()>
where
    S: KeyValueStore,
    C: Clock,
{
    // Guard restores the terminal even if we early-return.
    let guard = TerminalGuard::enter()?;
    let mut terminal = guard.terminal()?;
    let mut view = View::default();
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| draw(frame, &tracker, &view, chart_days))?;

        if event::poll(Duration::from_millis(150))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = Action::from_key(key.code) {
                        if apply(action, &mut view, &mut tracker).await {
                            break;
                        }
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick {
            refresh(&mut view, &mut tracker).await;
            last_tick = Instant::now();
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    Up,
    Down,
    Toggle,
    Delete,
    Older,
    Newer,
    Today,
}

impl Action {
    fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
            KeyCode::Enter | KeyCode::Char('s') | KeyCode::Char(' ') => Some(Action::Toggle),
            KeyCode::Char('x') | KeyCode::Delete => Some(Action::Delete),
            KeyCode::Char('h') | KeyCode::Left => Some(Action::Older),
            KeyCode::Char('l') | KeyCode::Right => Some(Action::Newer),
            KeyCode::Char('t') => Some(Action::Today),
            _ => None,
        }
    }
}

/// Which day is on screen and which row is selected.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct View {
    selected: usize,
    /// Days back from today; 0 is the live view.
    day_offset: u32,
    notice: Option<String>,
}

impl View {
    fn is_today(&self) -> bool {
        self.day_offset == 0
    }

    fn date(&self, today: NaiveDate) -> NaiveDate {
        today - chrono::Duration::days(i64::from(self.day_offset))
    }

    fn select_next(&mut self, rows: usize) {
        if rows > 0 {
            self.selected = (self.selected + 1).min(rows - 1);
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp(&mut self, rows: usize) {
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    /// Step one day back, stopping at the oldest archived day.
    fn older(&mut self, today: NaiveDate, oldest: Option<NaiveDate>) {
        let Some(oldest) = oldest else {
            return;
        };
        let limit = (today - oldest).num_days().max(0);
        if i64::from(self.day_offset) < limit {
            self.day_offset += 1;
            self.selected = 0;
        }
    }

    fn newer(&mut self) {
        if self.day_offset > 0 {
            self.day_offset -= 1;
            self.selected = 0;
        }
    }

    fn back_to_today(&mut self) {
        self.day_offset = 0;
        self.selected = 0;
    }
}

/// Tasks for a date, newest first.
fn rows<S: KeyValueStore, C: Clock>(tracker: &Tracker<S, C>, date: NaiveDate) -> Vec<&Task> {
    let mut rows: Vec<&Task> = tracker.day_tasks(date).iter().collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    rows
}

fn selected_id<S: KeyValueStore, C: Clock>(tracker: &Tracker<S, C>, view: &View) -> Option<Uuid> {
    rows(tracker, view.date(tracker.today()))
        .get(view.selected)
        .map(|t| t.id)
}

/// Apply a key action. Returns `true` when the dashboard should close.
/// Timer and task changes only apply to the live day.
async fn apply<S: KeyValueStore, C: Clock>(
    action: Action,
    view: &mut View,
    tracker: &mut Tracker<S, C>,
) -> bool {
    let today = tracker.today();
    view.notice = None;
    match action {
        Action::Quit => return true,
        Action::Up => view.select_prev(),
        Action::Down => view.select_next(tracker.day_tasks(view.date(today)).len()),
        Action::Older => {
            let oldest = tracker.history().keys().next().copied();
            view.older(today, oldest);
        }
        Action::Newer => view.newer(),
        Action::Today => view.back_to_today(),
        Action::Toggle | Action::Delete if !view.is_today() => {
            view.notice = Some("History is read-only; press t for today.".into());
        }
        Action::Toggle => {
            let Some(id) = selected_id(tracker, view) else {
                return false;
            };
            let result = if tracker.timer().active() == Some(id) {
                tracker.stop().await
            } else {
                tracker.start(id).await
            };
            if let Err(err) = result {
                report_failure(view, err);
            }
        }
        Action::Delete => {
            let Some(id) = selected_id(tracker, view) else {
                return false;
            };
            if let Err(err) = tracker.remove(id).await {
                report_failure(view, err);
            }
            view.clamp(tracker.tasks().len());
        }
    }
    false
}

/// Periodic tick: day rollover and timer accrual.
async fn refresh<S: KeyValueStore, C: Clock>(view: &mut View, tracker: &mut Tracker<S, C>) {
    if let Err(err) = watch::step(tracker).await {
        view.notice = Some(format!("Could not save: {err}"));
    }
    view.clamp(tracker.day_tasks(view.date(tracker.today())).len());
}

// Logging would write over the alternate screen; the footer carries errors.
fn report_failure(view: &mut View, err: anyhow::Error) {
    view.notice = Some(format!("Could not save: {}", to_eyre(err)));
}

fn draw<S: KeyValueStore, C: Clock>(
    frame: &mut Frame,
    tracker: &Tracker<S, C>,
    view: &View,
    chart_days: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(10),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let today = tracker.today();
    let date = view.date(today);
    let tasks = rows(tracker, date);

    draw_header(frame, chunks[0], tracker, view, date);
    draw_gauge(frame, chunks[1], tracker, view, &tasks);
    draw_tasks(frame, chunks[2], view, &tasks);
    draw_chart(frame, chunks[3], tracker, chart_days);
    draw_footer(frame, chunks[4], view);
}

fn draw_header<S: KeyValueStore, C: Clock>(
    frame: &mut Frame,
    area: Rect,
    tracker: &Tracker<S, C>,
    view: &View,
    date: NaiveDate,
) {
    let (title, color) = if view.is_today() {
        (format!("Today {date}"), Color::Green)
    } else {
        (format!("History {date}"), Color::Yellow)
    };
    let running = match tracker.active_task() {
        Some(task) => format!("▶ {} {}", task.name, format_duration(task.elapsed_ms)),
        None => "⏸ idle".to_string(),
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Focus",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(running),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(Span::styled(
                title,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
    );
    frame.render_widget(header, area);
}

fn draw_gauge<S: KeyValueStore, C: Clock>(
    frame: &mut Frame,
    area: Rect,
    tracker: &Tracker<S, C>,
    view: &View,
    tasks: &[&Task],
) {
    let total: u64 = tasks.iter().map(|t| t.elapsed_ms).sum();
    let ratio = progress_fraction(total, tracker.target_hours()).unwrap_or(0.0);
    let label = if view.is_today() {
        format!("{}  {}", format_duration(total), tracker.goal_status())
    } else {
        format!("{} of {}h", format_duration(total), tracker.target_hours())
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Daily goal {}h", tracker.target_hours())),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}

fn draw_tasks(frame: &mut Frame, area: Rect, view: &View, tasks: &[&Task]) {
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|t| {
            let marker = if t.is_running() { "▶ " } else { "  " };
            let mut line = vec![
                Span::styled(marker, Style::default().fg(Color::Green)),
                Span::styled(
                    t.name.as_str(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("  {}", format_duration(t.elapsed_ms))),
            ];
            if let Some(progress) = budget_progress(t) {
                line.push(Span::styled(
                    format!(" / {}m ({:.0}%)", t.budget_minutes, progress * 100.0),
                    Style::default().fg(Color::Yellow),
                ));
            }
            if let Some(desc) = &t.description {
                line.push(Span::styled(
                    format!("  {desc}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(line))
        })
        .collect();

    let title = if tasks.is_empty() {
        "Tasks (add with `focus task add`)"
    } else {
        "Tasks"
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !tasks.is_empty() {
        state.select(Some(view.selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_chart<S: KeyValueStore, C: Clock>(
    frame: &mut Frame,
    area: Rect,
    tracker: &Tracker<S, C>,
    chart_days: usize,
) {
    let bars: Vec<Bar> = tracker
        .window(chart_days)
        .map(|day| {
            let style = if day.is_today {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::Blue)
            };
            Bar::default()
                .value(day.total_ms / 60_000)
                .text_value(format_hours(day.total_ms))
                .label(Line::from(day.date.format("%a").to_string()))
                .style(style)
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Last {chart_days} days")),
        )
        .bar_width(5)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, view: &View) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));
    let line = match &view.notice {
        Some(notice) => Line::from(Span::styled(
            notice.as_str(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(vec![
            key("↑/↓"),
            Span::raw(" select  "),
            key("Enter"),
            Span::raw(" start/stop  "),
            key("x"),
            Span::raw(" delete  "),
            key("h/l"),
            Span::raw(" browse days  "),
            key("t"),
            Span::raw(" today  "),
            key("q"),
            Span::raw(" quit"),
        ]),
    };
    let footer =
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Controls"));
    frame.render_widget(footer, area);
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        // Enter alternate screen to avoid polluting the shell buffer.
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }

    fn terminal(&self) -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
        let backend = CrosstermBackend::new(io::stdout());
        Ok(Terminal::new(backend)?)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best-effort cleanup; errors are logged but not propagated from Drop.
        if let Err(err) = disable_raw_mode() {
            eprintln!("failed to disable raw mode: {err}");
        }
        if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen) {
            eprintln!("failed to restore terminal: {err}");
        }
    }
}
