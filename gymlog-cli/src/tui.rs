use anyhow::Result;
use crossterm::event::{self, KeyCode};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    widgets::{
        Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, ListState, Paragraph,
        Tabs,
    },
};

use gymlog::Tracker;
use gymlog::metrics::{MetricKey, MetricPoint, summarize};

const LIST_HELP: &str = "j/k: navigate | Enter: show chart | q: quit";
const CHART_HELP: &str = "Tab/m: next metric | 1-4: pick metric | Esc/b: back | q: quit";

#[derive(Debug, Clone, Copy, PartialEq)]
enum View {
    Exercises,
    Chart,
}

struct ProgressViewer<'a> {
    tracker: &'a Tracker,
    names: Vec<String>,
    selected: usize,
    view: View,
    exercise: String,
    series: Vec<MetricPoint>,
    metric: MetricKey,
    status_message: String,
}

impl<'a> ProgressViewer<'a> {
    async fn new(tracker: &'a Tracker) -> Result<Self> {
        let names = tracker.logged_exercise_names().await?;
        let status_message = if names.is_empty() {
            "No data yet. Log a workout to see progression. q: quit".to_string()
        } else {
            LIST_HELP.to_string()
        };

        Ok(Self {
            tracker,
            names,
            selected: 0,
            view: View::Exercises,
            exercise: String::new(),
            series: Vec::new(),
            metric: MetricKey::MaxWeight,
            status_message,
        })
    }

    fn scroll_down(&mut self) {
        if !self.names.is_empty() {
            self.selected = (self.selected + 1).min(self.names.len() - 1);
        }
    }

    fn scroll_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    async fn open_chart(&mut self, name: &str) -> Result<()> {
        self.series = self.tracker.progression(name).await?;
        self.exercise = name.to_string();
        if let Some(idx) = self.names.iter().position(|n| n == name) {
            self.selected = idx;
        }
        self.view = View::Chart;
        self.status_message = CHART_HELP.to_string();
        Ok(())
    }

    async fn open_selected(&mut self) -> Result<()> {
        if let Some(name) = self.names.get(self.selected).cloned() {
            self.open_chart(&name).await?;
        }
        Ok(())
    }

    fn back(&mut self) {
        self.view = View::Exercises;
        self.status_message = LIST_HELP.to_string();
    }
}

fn draw_exercises(frame: &mut Frame, area: Rect, viewer: &ProgressViewer) {
    if viewer.names.is_empty() {
        let empty_msg = Paragraph::new("No exercises logged yet.")
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL).title("Exercises"));
        frame.render_widget(empty_msg, area);
        return;
    }

    let items: Vec<ListItem> = viewer
        .names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let style = if idx == viewer.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(name.as_str()).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Exercises ({} total)", viewer.names.len())),
    );

    let mut list_state = ListState::default();
    list_state.select(Some(viewer.selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Value bounds padded so a flat series still gets a visible range.
fn y_bounds(values: &[f64]) -> [f64; 2] {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let pad = ((max - min) * 0.1).max(1.0);
    [(min - pad).max(0.0), max + pad]
}

fn draw_tile(frame: &mut Frame, area: Rect, title: &str, value: String, color: Color) {
    let tile = Paragraph::new(value)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(tile, area);
}

fn draw_chart(frame: &mut Frame, area: Rect, viewer: &ProgressViewer) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(3),
    ])
    .split(area);

    let selected_tab = MetricKey::ALL
        .iter()
        .position(|k| *k == viewer.metric)
        .unwrap_or(0);
    let tabs = Tabs::new(MetricKey::ALL.iter().map(|k| k.label()))
        .select(selected_tab)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("Metric"));
    frame.render_widget(tabs, chunks[0]);

    let metric = viewer.metric;
    let title = format!("{} · {}", viewer.exercise, metric.label());

    if viewer.series.is_empty() {
        let empty_msg = Paragraph::new(format!("No data for {}.", viewer.exercise))
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(empty_msg, chunks[1]);
    } else {
        let points: Vec<(f64, f64)> = viewer
            .series
            .iter()
            .enumerate()
            .map(|(idx, point)| (idx as f64, point.value(metric)))
            .collect();
        let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
        let [low, high] = y_bounds(&values);

        let mut x_labels = vec![viewer.series[0].label.clone()];
        if let Some(last) = viewer.series.last().filter(|_| viewer.series.len() > 1) {
            x_labels.push(last.label.clone());
        }

        let dataset = Dataset::default()
            .name(metric.label())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&points);

        let chart = Chart::new(vec![dataset])
            .block(Block::default().borders(Borders::ALL).title(title))
            .x_axis(
                Axis::default()
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, (points.len().max(2) - 1) as f64])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title(metric.unit())
                    .style(Style::default().fg(Color::Gray))
                    .bounds([low, high])
                    .labels(vec![format!("{:.1}", low), format!("{:.1}", high)]),
            );
        frame.render_widget(chart, chunks[1]);
    }

    let summary = summarize(&viewer.series, metric);
    let tiles = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(chunks[2]);
    let delta_color = if summary.delta >= 0.0 {
        Color::Green
    } else {
        Color::Red
    };

    draw_tile(frame, tiles[0], "Latest", metric.format_value(summary.latest), Color::White);
    draw_tile(
        frame,
        tiles[1],
        "Record",
        summary
            .record
            .map(|r| metric.format_value(r))
            .unwrap_or_else(|| "—".to_string()),
        Color::Cyan,
    );
    draw_tile(
        frame,
        tiles[2],
        "Δ total",
        format!("{} {}", summary.delta_display(), metric.unit())
            .trim()
            .to_string(),
        delta_color,
    );
    draw_tile(frame, tiles[3], "Sessions", summary.count.to_string(), Color::White);
}

/// Browse the logged exercises and chart their progression. Starts on the
/// chart of `initial` when given.
pub async fn run_progress_viewer(
    mut terminal: DefaultTerminal,
    tracker: &Tracker,
    initial: Option<String>,
) -> Result<()> {
    let mut viewer = ProgressViewer::new(tracker).await?;
    if let Some(name) = initial {
        viewer.open_chart(&name).await?;
    }

    loop {
        terminal.draw(|frame| {
            let chunks = Layout::vertical([
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(frame.area());

            let header = Paragraph::new("Gymlog - Progress")
                .style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(header, chunks[0]);

            match viewer.view {
                View::Exercises => draw_exercises(frame, chunks[1], &viewer),
                View::Chart => draw_chart(frame, chunks[1], &viewer),
            }

            let footer = Paragraph::new(viewer.status_message.as_str())
                .style(Style::default().fg(Color::White))
                .block(Block::default().borders(Borders::ALL).title("Status"));
            frame.render_widget(footer, chunks[2]);
        })?;

        if let event::Event::Key(key) = event::read()? {
            match viewer.view {
                View::Exercises => match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                    KeyCode::Char('j') | KeyCode::Down => viewer.scroll_down(),
                    KeyCode::Char('k') | KeyCode::Up => viewer.scroll_up(),
                    KeyCode::Enter => viewer.open_selected().await?,
                    _ => {}
                },
                View::Chart => match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                    KeyCode::Esc | KeyCode::Char('b') => viewer.back(),
                    KeyCode::Tab | KeyCode::Char('m') => viewer.metric = viewer.metric.next(),
                    KeyCode::Char(c @ '1'..='4') => {
                        let idx = c as usize - '1' as usize;
                        viewer.metric = MetricKey::ALL[idx];
                    }
                    _ => {}
                },
            }
        }
    }
}
