use crate::app::{MetricsFocus, MetricsState};
use crate::theme::{series_color, Theme};
use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::{
    Axis, Block, Chart, Dataset, GraphType, HighlightSpacing, LegendPosition, List, ListItem,
    Paragraph,
};
use vigil_core::chart::{bounds, chart_series, time_label};

pub fn render(frame: &mut Frame, metrics: &mut MetricsState, area: Rect) {
    let [header_area, main_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
    let [side_area, chart_area] =
        Layout::horizontal([Constraint::Length(34), Constraint::Fill(1)]).areas(main_area);
    let [names_area, jobs_area] =
        Layout::vertical([Constraint::Fill(2), Constraint::Fill(1)]).areas(side_area);

    render_header(frame, metrics, header_area);
    render_names(frame, metrics, names_area);
    render_jobs(frame, metrics, jobs_area);
    render_chart(frame, metrics, chart_area);
}

fn render_header(frame: &mut Frame, metrics: &MetricsState, area: Rect) {
    let target = match metrics.agent {
        Some(ref agent) => agent.name.clone(),
        None => "All Agents".to_string(),
    };
    let mut spans = vec![
        Span::styled(
            format!(" Metrics: {target}"),
            Style::new().fg(Theme::TEXT_PRIMARY).bold(),
        ),
        Span::styled("  range ", Style::new().fg(Theme::TEXT_MUTED)),
        Span::styled(
            metrics.selection.time_range.as_str(),
            Style::new().fg(Theme::ACCENT_BLUE),
        ),
    ];
    if metrics.polling {
        spans.push(Span::styled(
            "  refreshing...",
            Style::new().fg(Theme::ACCENT_YELLOW).italic(),
        ));
    } else if let Some(at) = metrics.last_update {
        spans.push(Span::styled(
            format!("  updated {}", at.format("%H:%M:%S")),
            Style::new().fg(Theme::TEXT_MUTED),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_names(frame: &mut Frame, metrics: &mut MetricsState, area: Rect) {
    let focused = metrics.focus == MetricsFocus::Names;
    let selected = metrics.selection.metrics().len();
    let title = if selected > 0 {
        format!(" Metrics ({selected} selected) ")
    } else {
        " Metrics ".to_string()
    };
    let block = Theme::block_focus(focused).title(title);

    if metrics.discovering && metrics.names.is_empty() {
        let msg = Paragraph::new("Loading metrics...")
            .block(block)
            .style(Style::new().fg(Theme::ACCENT_BLUE));
        frame.render_widget(msg, area);
        return;
    }
    if metrics.names.is_empty() {
        let msg = Paragraph::new("No metrics found")
            .block(block)
            .style(Style::new().fg(Color::DarkGray));
        frame.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = metrics
        .names
        .iter()
        .map(|name| {
            let on = metrics.selection.is_selected(name);
            let (mark, color) = if on {
                ("[x] ", Theme::TOGGLE_ON)
            } else {
                ("[ ] ", Theme::TOGGLE_OFF)
            };
            ListItem::new(Line::from(vec![
                Span::styled(mark, Style::new().fg(color)),
                Span::styled(name.clone(), Style::new().fg(Theme::TEXT_PRIMARY)),
            ]))
        })
        .collect();

    let list = highlighted(items, block, focused);
    frame.render_stateful_widget(list, area, &mut metrics.names_state);
}

fn render_jobs(frame: &mut Frame, metrics: &mut MetricsState, area: Rect) {
    let focused = metrics.focus == MetricsFocus::Jobs;
    let block = Theme::block_focus(focused).title(" Job ");
    let current = metrics.selection.job();

    let radio = |label: String, on: bool| {
        let (mark, color) = if on {
            ("(*) ", Theme::TOGGLE_ON)
        } else {
            ("( ) ", Theme::TOGGLE_OFF)
        };
        ListItem::new(Line::from(vec![
            Span::styled(mark, Style::new().fg(color)),
            Span::styled(label, Style::new().fg(Theme::TEXT_PRIMARY)),
        ]))
    };

    let mut items = vec![radio("All jobs".to_string(), current.is_none())];
    items.extend(
        metrics
            .jobs
            .iter()
            .map(|job| radio(job.clone(), current == Some(job.as_str()))),
    );

    let list = highlighted(items, block, focused);
    frame.render_stateful_widget(list, area, &mut metrics.jobs_state);
}

fn highlighted<'a>(items: Vec<ListItem<'a>>, block: Block<'a>, focused: bool) -> List<'a> {
    let style = if focused {
        Style::new().bg(Theme::BG_SURFACE).add_modifier(Modifier::BOLD)
    } else {
        Style::new()
    };
    List::new(items)
        .block(block)
        .highlight_style(style)
        .highlight_symbol(" > ")
        .highlight_spacing(HighlightSpacing::Always)
}

fn render_chart(frame: &mut Frame, metrics: &MetricsState, area: Rect) {
    let block = Theme::block().title(" Chart ");
    let range = metrics.selection.time_range;

    let placeholder = if !metrics.selection.is_active() {
        Some("Select a metric to start charting.")
    } else if metrics.series.is_empty() && metrics.polling {
        Some("Fetching data...")
    } else if metrics.series.is_empty() {
        Some("No data for the current selection.")
    } else {
        None
    };
    if let Some(text) = placeholder {
        let msg = Paragraph::new(text)
            .block(block.padding(Theme::PADDING_CARD))
            .style(Style::new().fg(Theme::TEXT_MUTED));
        frame.render_widget(msg, area);
        return;
    }

    let series = chart_series(&metrics.series, Some(range));
    let Some(b) = bounds(&series) else {
        let msg = Paragraph::new("No data points in range.")
            .block(block.padding(Theme::PADDING_CARD))
            .style(Style::new().fg(Theme::TEXT_MUTED));
        frame.render_widget(msg, area);
        return;
    };

    let datasets: Vec<Dataset> = series
        .iter()
        .map(|s| {
            Dataset::default()
                .name(s.label.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::new().fg(series_color(s.color)))
                .data(&s.points)
        })
        .collect();

    let mid_x = (b.x[0] + b.x[1]) / 2.0;
    let x_axis = Axis::default()
        .style(Style::new().fg(Theme::TEXT_MUTED))
        .bounds(b.x)
        .labels(vec![
            time_label(b.x[0], range),
            time_label(mid_x, range),
            time_label(b.x[1], range),
        ]);
    let y_axis = Axis::default()
        .style(Style::new().fg(Theme::TEXT_MUTED))
        .bounds(b.y)
        .labels(vec![
            format_value(b.y[0]),
            format_value(b.y[1] / 2.0),
            format_value(b.y[1]),
        ]);

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(x_axis)
        .y_axis(y_axis)
        .legend_position(Some(LegendPosition::TopLeft));
    frame.render_widget(chart, area);
}

fn format_value(v: f64) -> String {
    if v.abs() >= 1000.0 || v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::{format_value, render};
    use crate::app::{AgentContext, MetricsState};
    use crate::views::test_support::draw_text;
    use vigil_core::testing::series_map;

    fn render_text(metrics: &mut MetricsState) -> String {
        draw_text(120, 30, |frame| render(frame, metrics, frame.area()))
    }

    fn discovered() -> MetricsState {
        let mut m = MetricsState {
            names: vec!["node_load1".into(), "up".into()],
            jobs: vec!["node".into()],
            ..MetricsState::default()
        };
        m.names_state.select(Some(0));
        m.jobs_state.select(Some(0));
        m
    }

    #[test]
    fn header_names_agent_or_all() {
        let mut m = discovered();
        assert!(render_text(&mut m).contains("Metrics: All Agents"));

        m.agent = Some(AgentContext {
            id: "1".into(),
            name: "web-01".into(),
        });
        assert!(render_text(&mut m).contains("Metrics: web-01"));
    }

    #[test]
    fn discovering_shows_loading() {
        let mut m = MetricsState {
            discovering: true,
            ..MetricsState::default()
        };
        assert!(render_text(&mut m).contains("Loading metrics..."));
    }

    #[test]
    fn lists_mark_selection() {
        let mut m = discovered();
        m.selection.select_metric("up".into());
        m.selection.set_job(Some("node".into()));

        let text = render_text(&mut m);
        assert!(text.contains("[x] up"));
        assert!(text.contains("[ ] node_load1"));
        assert!(text.contains("( ) All jobs"));
        assert!(text.contains("(*) node"));
        assert!(text.contains("1 selected"));
    }

    #[test]
    fn empty_selection_prompts() {
        let mut m = discovered();
        assert!(render_text(&mut m).contains("Select a metric to start charting."));
    }

    #[test]
    fn selection_without_data_says_so() {
        let mut m = discovered();
        m.selection.select_metric("up".into());
        assert!(render_text(&mut m).contains("No data for the current selection."));

        m.polling = true;
        assert!(render_text(&mut m).contains("Fetching data..."));
    }

    #[test]
    fn chart_shows_series_legend() {
        let mut m = discovered();
        m.selection.select_metric("up".into());
        m.series = series_map(
            "up",
            "web-01:9100",
            &[(1_700_000_000_000, 1.0), (1_700_000_060_000, 1.0)],
        );

        let text = render_text(&mut m);
        assert!(text.contains("up (web-01:9100)"));
        assert!(!text.contains("No data"));
    }

    #[test]
    fn values_are_compact() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(0.25), "0.25");
        assert_eq!(format_value(12345.6), "12346");
    }
}
