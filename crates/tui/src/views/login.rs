use crate::app::{LoginField, LoginState};
use crate::theme::Theme;
use crate::views::modal::popup_area;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

pub fn render(frame: &mut Frame, login: &LoginState, server_url: &str, area: Rect) {
    let card = popup_area(area, 56, 13);
    frame.render_widget(Clear, card);

    let block = Theme::block_accent()
        .title(" Sign in ")
        .padding(Theme::PADDING_CARD);
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let masked = "\u{2022}".repeat(login.password.chars().count());
    let mut lines = vec![
        Line::from(Span::styled(
            server_url.to_string(),
            Style::new().fg(Theme::TEXT_MUTED),
        )),
        Line::raw(""),
        field_line("Username", &login.username, login.field == LoginField::Username),
        field_line("Password", &masked, login.field == LoginField::Password),
        Line::raw(""),
    ];

    if login.submitting {
        lines.push(Line::from(Span::styled(
            "Signing in...",
            Style::new().fg(Theme::ACCENT_BLUE).italic(),
        )));
    } else if let Some(ref err) = login.error {
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::new().fg(Theme::ACCENT_RED),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::new().fg(Theme::ACCENT_BLUE).bold()
    } else {
        Style::new().fg(Theme::TEXT_SECONDARY)
    };
    let mut spans = vec![
        Span::styled(format!("{label:<10}"), label_style),
        Span::styled(value.to_string(), Style::new().fg(Theme::TEXT_PRIMARY)),
    ];
    if focused {
        spans.push(Span::styled("_", Style::new().fg(Theme::ACCENT_YELLOW)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::render;
    use crate::app::{LoginField, LoginState};
    use crate::views::test_support::draw_text;

    fn render_text(login: &LoginState) -> String {
        draw_text(80, 20, |frame| {
            render(frame, login, "http://localhost:3000", frame.area())
        })
    }

    #[test]
    fn password_is_masked() {
        let login = LoginState {
            field: LoginField::Password,
            username: "admin".into(),
            password: "secret".into(),
            ..LoginState::default()
        };
        let text = render_text(&login);
        assert!(text.contains("admin"));
        assert!(!text.contains("secret"));
        assert!(text.contains("\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}"));
        assert!(text.contains("http://localhost:3000"));
    }

    #[test]
    fn error_is_shown_below_fields() {
        let login = LoginState {
            error: Some("Invalid username or password".into()),
            ..LoginState::default()
        };
        assert!(render_text(&login).contains("Invalid username or password"));
    }

    #[test]
    fn submitting_replaces_error() {
        let login = LoginState {
            error: Some("old error".into()),
            submitting: true,
            ..LoginState::default()
        };
        let text = render_text(&login);
        assert!(text.contains("Signing in..."));
        assert!(!text.contains("old error"));
    }
}
