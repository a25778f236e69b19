use crate::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Clear, Paragraph, Wrap};

/// Kinds of modal overlay.
pub enum Modal {
    /// Confirmation dialog.
    Confirm {
        title: String,
        message: String,
        action: ConfirmAction,
    },
}

/// What happens when a Confirm modal is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteAgent { id: String, name: String },
}

/// Centered rect of at most `width` x `height` inside `area`.
pub fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(x, y, popup_width, popup_height)
}

/// Render the current modal overlay on top of everything.
pub fn render(frame: &mut Frame, modal: &Modal) {
    let popup_area = popup_area(frame.area(), 50, 8);
    frame.render_widget(Clear, popup_area);

    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);

    let Modal::Confirm { title, message, .. } = modal;

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .title(format!(" {title} "))
        .border_style(Style::new().fg(Theme::ACCENT_YELLOW));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            format!("  {message}"),
            Style::new().fg(Theme::TEXT_PRIMARY),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::styled("  y/Enter ", key_style),
            Span::styled("confirm  ", desc_style),
            Span::styled("n/Esc ", key_style),
            Span::styled("cancel", desc_style),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
