use crate::app::{AgentField, AgentForm, AgentsState};
use crate::theme::Theme;
use crate::views::modal::popup_area;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, HighlightSpacing, List, ListItem, Paragraph};
use vigil_api::Agent;

pub fn render(frame: &mut Frame, agents: &mut AgentsState, area: Rect) {
    if agents.loading && agents.items.is_empty() {
        let block = Theme::block_dim()
            .title(" Agents ")
            .padding(Theme::PADDING_CARD);
        let msg = Paragraph::new("Loading agents...")
            .block(block)
            .style(Style::new().fg(Theme::ACCENT_BLUE));
        frame.render_widget(msg, area);
    } else if agents.items.is_empty() {
        let block = Theme::block_dim()
            .title(" Agents ")
            .padding(Theme::PADDING_CARD);
        let msg = Paragraph::new("No agents yet. Press 'n' to register one.")
            .block(block)
            .style(Style::new().fg(Color::DarkGray));
        frame.render_widget(msg, area);
    } else {
        let copied = agents.copied.as_deref();
        let items: Vec<ListItem> = agents
            .items
            .iter()
            .map(|agent| agent_to_list_item(agent, copied == Some(agent.id.as_str())))
            .collect();

        let list = List::new(items)
            .block(Theme::block_dim().title(format!(" Agents ({}) ", agents.items.len())))
            .highlight_style(
                Style::new()
                    .bg(Theme::BG_SURFACE)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(" > ")
            .highlight_spacing(HighlightSpacing::Always);

        frame.render_stateful_widget(list, area, &mut agents.list_state);
    }

    if let Some(ref form) = agents.form {
        render_form(frame, form, area);
    }
}

fn agent_to_list_item(agent: &Agent, copied: bool) -> ListItem<'static> {
    let mut line1 = vec![
        Span::styled(
            agent.name.clone(),
            Style::new().fg(Theme::TEXT_PRIMARY).bold(),
        ),
        Span::styled(format!("  id {}", agent.id), Style::new().fg(Theme::TEXT_MUTED)),
    ];
    if copied {
        line1.push(Span::styled("  copied", Style::new().fg(Theme::ACCENT_GREEN)));
    }

    let mut line2 = vec![
        Span::styled("   ", Style::new()),
        Span::styled(agent.token.clone(), Style::new().fg(Theme::TOKEN)),
    ];
    if let Some(ref created) = agent.created_at {
        let date = created.get(..10).unwrap_or(created.as_str());
        line2.push(Span::styled("  ", Style::new()));
        line2.push(Span::styled(date.to_string(), Style::new().fg(Color::DarkGray)));
    }

    ListItem::new(vec![Line::from(line1), Line::from(line2), Line::raw("")])
}

fn render_form(frame: &mut Frame, form: &AgentForm, area: Rect) {
    let popup = popup_area(area, 56, 11);
    frame.render_widget(Clear, popup);

    let block = Theme::block_accent()
        .title(" Register agent ")
        .padding(Theme::PADDING_CARD);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let field = |label: &str, value: &str, focused: bool| {
        let label_style = if focused {
            Style::new().fg(Theme::ACCENT_BLUE).bold()
        } else {
            Style::new().fg(Theme::TEXT_SECONDARY)
        };
        let mut spans = vec![
            Span::styled(format!("{label:<7}"), label_style),
            Span::styled(value.to_string(), Style::new().fg(Theme::TEXT_PRIMARY)),
        ];
        if focused {
            spans.push(Span::styled("_", Style::new().fg(Theme::ACCENT_YELLOW)));
        }
        Line::from(spans)
    };

    let mut lines = vec![
        field("Name", &form.name, form.field == AgentField::Name),
        field("Token", &form.token, form.field == AgentField::Token),
    ];
    if form.token.trim().is_empty() {
        lines.push(Line::from(Span::styled(
            "       leave blank to generate",
            Style::new().fg(Theme::TEXT_HINT),
        )));
    }
    lines.push(Line::raw(""));
    match form.error {
        Some(ref err) => lines.push(Line::from(Span::styled(
            err.clone(),
            Style::new().fg(Theme::ACCENT_RED),
        ))),
        None => lines.push(Line::from(vec![
            Span::styled("Enter ", Style::new().fg(Theme::TEXT_KEY)),
            Span::styled("create  ", Style::new().fg(Theme::TEXT_KEY_DESC)),
            Span::styled("Esc ", Style::new().fg(Theme::TEXT_KEY)),
            Span::styled("cancel", Style::new().fg(Theme::TEXT_KEY_DESC)),
        ])),
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
