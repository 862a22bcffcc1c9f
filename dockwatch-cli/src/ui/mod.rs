//! Dashboard rendering. Pulls everything from the orchestrator on each frame.

pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, TableState,
    },
};

use dockwatch_core::model::{LifecycleAction, Metric};
use dockwatch_core::orchestrator::RefreshOrchestrator;
use dockwatch_core::timeseries::TimeSeriesStore;

use theme::styles;

const SHORT_ID_LEN: usize = 12;

pub fn draw(f: &mut Frame, orch: &RefreshOrchestrator) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Length(3),
            Constraint::Min(5),
        ])
        .split(f.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let charts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(top[1]);

    draw_entities(f, top[0], orch);
    draw_metric(f, charts[0], orch.store(), Metric::Cpu);
    draw_metric(f, charts[1], orch.store(), Metric::Memory);
    draw_controls(f, rows[1], orch);
    draw_logs(f, rows[2], orch);
}

fn panel(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .title(Span::styled(format!(" {} ", title.into()), styles::title()))
        .borders(Borders::ALL)
        .border_style(styles::border())
}

fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn draw_entities(f: &mut Frame, area: Rect, orch: &RefreshOrchestrator) {
    let selection = orch.selection();
    let header = Row::new(["ID", "Image", "Status", "Ports"]).style(styles::text_dim());

    let rows: Vec<Row> = if selection.entities().is_empty() {
        vec![Row::new([Cell::from("No Containers"), "".into(), "".into(), "".into()])
            .style(styles::text_dim())]
    } else {
        selection
            .entities()
            .iter()
            .map(|e| {
                Row::new([
                    Cell::from(short_id(&e.id).to_string()),
                    Cell::from(e.image.clone()),
                    Cell::from(e.status.clone()).style(styles::status(e)),
                    Cell::from(e.ports.clone()),
                ])
                .style(styles::text())
            })
            .collect()
    };

    let widths = [
        Constraint::Length(SHORT_ID_LEN as u16 + 1),
        Constraint::Percentage(30),
        Constraint::Percentage(30),
        Constraint::Fill(1),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel("Containers"))
        .row_highlight_style(styles::selection())
        .highlight_symbol("> ");

    let mut state = TableState::default();
    if !selection.entities().is_empty() {
        state.select(Some(selection.selected_index()));
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_metric(f: &mut Frame, area: Rect, store: &TimeSeriesStore, metric: Metric) {
    let series = store.series_for_chart(metric);
    let points: Vec<Vec<(f64, f64)>> = series
        .iter()
        .map(|s| {
            s.y.iter()
                .enumerate()
                .map(|(i, v)| (i as f64, *v))
                .collect()
        })
        .collect();

    let datasets: Vec<Dataset> = series
        .iter()
        .zip(&points)
        .map(|(s, data)| {
            Dataset::default()
                .name(s.label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(styles::series(s.color))
                .data(data)
        })
        .collect();

    let len = series.iter().map(|s| s.y.len()).max().unwrap_or(0);
    let x_max = len.saturating_sub(1).max(1) as f64;
    let x_labels = series
        .first()
        .map(|s| {
            let first = s.x.iter().find(|l| !l.is_empty()).cloned().unwrap_or_default();
            let last = s.x.last().cloned().unwrap_or_default();
            vec![Span::raw(first), Span::raw(last)]
        })
        .unwrap_or_default();

    let (y_min, y_max) = store.axis_bounds(metric);
    let chart = Chart::new(datasets)
        .block(panel(metric.title()))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(x_labels)
                .style(styles::text_dim()),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.0}", y_min)),
                    Span::raw(format!("{:.0}", y_max / 2.0)),
                    Span::raw(format!("{:.0}", y_max)),
                ])
                .style(styles::text_dim()),
        );
    f.render_widget(chart, area);
}

fn key_hint(key: &str, label: &str) -> Vec<Span<'static>> {
    vec![
        Span::styled(key.to_string(), styles::key_hint()),
        Span::styled(format!(" {}  ", label), styles::text_dim()),
    ]
}

fn draw_controls(f: &mut Frame, area: Rect, orch: &RefreshOrchestrator) {
    let mut spans = Vec::new();
    spans.extend(key_hint("↑/↓", "select"));
    spans.extend(key_hint("Enter", "logs"));
    spans.extend(key_hint("Esc", "stop logs"));
    for action in LifecycleAction::ALL {
        spans.extend(key_hint(&action.key().to_string(), action.label()));
    }
    spans.extend(key_hint("q", "quit"));

    let pending = orch.pending_commands();
    if pending > 0 {
        spans.push(Span::styled(
            format!("[{} command(s) running]", pending),
            styles::key_hint(),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).block(panel("Controls")), area);
}

fn draw_logs(f: &mut Frame, area: Rect, orch: &RefreshOrchestrator) {
    let logs = orch.logs();
    let title = match logs.current_entity() {
        Some(id) if logs.has_ended() => format!("Logs: {} (ended)", short_id(id)),
        Some(id) => format!("Logs: {}", short_id(id)),
        None => "Logs".to_string(),
    };

    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = logs
        .sink()
        .tail(visible)
        .map(|line| Line::styled(line.display(), styles::log_line(line.kind)))
        .collect();

    f.render_widget(Paragraph::new(lines).block(panel(title)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("Error"), "Error");
    }
}
