use crate::app::{App, FlashLevel, View};
use crate::guard::Route;
use crate::theme::Theme;
use crate::views::{agents, login, metrics, modal};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn render(frame: &mut Frame, app: &mut App) {
    let [header_area, banner_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(if app.banner.is_some() { 1 } else { 0 }),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, app, header_area);
    render_banner(frame, app, banner_area);

    let route = app.route();
    match route {
        Route::Loading => {
            let msg = Paragraph::new("Checking session...")
                .block(Theme::block_dim().padding(Theme::PADDING_CARD))
                .style(Style::new().fg(Theme::ACCENT_BLUE));
            frame.render_widget(msg, body_area);
        }
        Route::Login => login::render(frame, &app.login, &app.server_url, body_area),
        Route::Protected(View::Agents) => agents::render(frame, &mut app.agents, body_area),
        Route::Protected(View::Metrics) => metrics::render(frame, &mut app.metrics, body_area),
    }

    render_footer(frame, app, route, footer_area);

    // Modal overlay
    if let Some(ref m) = app.modal {
        modal::render(frame, m);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Theme::block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let left = Line::from(vec![
        Span::styled(" vigil ", Style::new().fg(Theme::ACCENT_ORANGE).bold()),
        Span::styled("  ", Style::new()),
        Span::styled(app.server_url.clone(), Style::new().fg(Theme::TEXT_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(left), inner);

    if app.auth.authenticated {
        let right = Line::from(vec![
            Span::styled("signed in as ", Style::new().fg(Theme::TEXT_MUTED)),
            Span::styled(
                format!("{} ", app.user_name()),
                Style::new().fg(Theme::ACCENT_GREEN).bold(),
            ),
        ]);
        frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), inner);
    }
}

fn render_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref banner) = app.banner else {
        return;
    };
    let line = Line::from(vec![
        Span::styled(
            " ! ",
            Style::new().fg(Color::Black).bg(Theme::ACCENT_RED).bold(),
        ),
        Span::styled(
            format!(" {}", banner.message),
            Style::new().fg(Theme::ACCENT_RED),
        ),
        Span::styled("  x dismiss", Style::new().fg(Theme::TEXT_HINT)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_footer(frame: &mut Frame, app: &App, route: Route, area: Rect) {
    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let hint = |key: &'static str, desc: &'static str| {
        [
            Span::styled(key, key_style),
            Span::styled(desc, desc_style),
        ]
    };

    let pairs: Vec<[Span; 2]> = match route {
        Route::Loading => vec![hint(" q ", "quit")],
        Route::Login => vec![
            hint(" Tab ", "switch field  "),
            hint("Enter ", "sign in  "),
            hint("Esc ", "quit"),
        ],
        Route::Protected(View::Agents) if app.agents.form.is_some() => vec![
            hint(" Tab ", "switch field  "),
            hint("Enter ", "create  "),
            hint("Esc ", "cancel"),
        ],
        Route::Protected(View::Agents) => vec![
            hint(" j/k ", "navigate  "),
            hint("n ", "new  "),
            hint("d ", "delete  "),
            hint("c ", "copy token  "),
            hint("m ", "metrics  "),
            hint("M ", "all metrics  "),
            hint("r ", "refresh  "),
            hint("L ", "logout  "),
            hint("q ", "quit"),
        ],
        Route::Protected(View::Metrics) => vec![
            hint(" Tab ", "focus  "),
            hint("j/k ", "navigate  "),
            hint("Space ", "toggle  "),
            hint("t ", "range  "),
            hint("c ", "clear  "),
            hint("r ", "reload  "),
            hint("Esc ", "back  "),
            hint("q ", "quit"),
        ],
    };
    let mut spans: Vec<Span> = pairs.into_iter().flatten().collect();

    // Append flash message to any view's footer
    if let Some((ref msg, level)) = app.flash_message {
        let color = match level {
            FlashLevel::Success => Theme::ACCENT_GREEN,
            FlashLevel::Error => Theme::ACCENT_RED,
            FlashLevel::Info => Theme::ACCENT_BLUE,
        };
        spans.push(Span::styled("  ", Style::new()));
        spans.push(Span::styled(msg.as_str(), Style::new().fg(color)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
