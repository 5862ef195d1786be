use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use casino_core::Section;

use crate::app::{App, FocusPane, InputMode, Screen};
use crate::call::CallOutcome;
use crate::form::{FieldKind, FieldSpec, FormState, Lookup, LookupOption};

const SECRET_MASK: char = '•';

fn no_options(_: Lookup) -> &'static [LookupOption] {
    &[]
}

fn highlight_style() -> Style {
    Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn pane_block<'a>(title: impl Into<Line<'a>>, focused: bool) -> Block<'a> {
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Login => render_login(app, frame, body_area),
        Screen::Page => render_page(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.show_goto {
        render_goto(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(" Casino MIS ", Style::default().fg(Color::Cyan).bold())];

    if app.screen == Screen::Page {
        for section in Section::all() {
            let style = if section == app.section {
                Style::default().fg(Color::Black).bg(Color::Cyan).bold()
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!(" {} ", section.display_name()), style));
        }
    }

    let session = app.store.session();
    let user = session.username.as_deref().unwrap_or("-");
    let base = if session.base_url.is_empty() {
        app.client.proxy_origin().to_string()
    } else {
        session.base_url.clone()
    };
    spans.push(Span::styled(format!("  {} @ {} ", user, base), Style::default().fg(Color::White)));
    spans.push(Span::styled(
        format!("v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::Gray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match (app.screen, app.input_mode) {
        (Screen::Login, _) => " LOGIN ",
        (Screen::Page, InputMode::Normal) => " NORMAL ",
        (Screen::Page, InputMode::Editing) => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let key = |k: &'static str, label: &'static str| {
        [Span::styled(format!(" {} ", k), key_style), Span::styled(format!(" {} ", label), label_style)]
    };

    let mut hints: Vec<Span> = match (app.screen, app.input_mode) {
        (Screen::Login, _) => [key("Tab", "поле"), key("Enter", "войти"), key("^C", "выход")].concat(),
        (Screen::Page, InputMode::Normal) => {
            let mut hints = [key("Tab", "панель"), key("j/k", "выбор"), key("Enter", "открыть")].concat();
            if app.focus == FocusPane::Form {
                hints.extend(key("h/l", "вариант"));
            }
            hints.extend([key("s", "отправить"), key("[ ]", "раздел"), key(":", "перейти")].concat());
            if app.pending.is_some() {
                hints.extend(key("Esc", "отменить"));
            }
            hints.extend([key("^L", "выйти"), key("q", "выход")].concat());
            hints
        }
        (Screen::Page, InputMode::Editing) => [
            key("Enter", "отправить"),
            key("Tab", "поле"),
            key("←/→", "вариант"),
            key("PgUp/PgDn", "справочник"),
            key("Esc", "готово"),
        ]
        .concat(),
    };

    if app.is_loading() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        hints.push(Span::styled(format!(" Загрузка{} ", dots), Style::default().fg(Color::Yellow)));
    } else if let Some(banner) = &app.banner {
        hints.push(Span::styled(format!(" {} ", banner), Style::default().fg(Color::Yellow)));
    }

    let footer_content = Line::from(
        vec![Span::styled(mode_text, mode_style), Span::styled(" ", label_style)]
            .into_iter()
            .chain(hints)
            .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_login(app: &App, frame: &mut Frame, area: Rect) {
    let popup_width = 64.min(area.width.saturating_sub(4));
    let popup_height = (app.login_form.fields.len() as u16 * 2 + 6).min(area.height);
    let popup_area = Rect::new(
        area.x + (area.width.saturating_sub(popup_width)) / 2,
        area.y + (area.height.saturating_sub(popup_height)) / 2,
        popup_width,
        popup_height,
    );

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Вход в систему ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [fields_area, message_area] = Layout::vertical([Constraint::Min(0), Constraint::Length(2)]).areas(inner);
    render_form_fields(frame, fields_area, &app.login_form, true, &no_options);

    let message = match &app.login_message {
        Some(message) => Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
        None if app.is_loading() => {
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            Line::from(Span::styled(format!("Проверка учётных данных{}", dots), Style::default().fg(Color::Yellow)))
        }
        None => Line::from(Span::styled(
            "Пустой базовый URL: запросы идут через локальный прокси.",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(message).wrap(Wrap { trim: true }), message_area);
}

fn render_page(app: &mut App, frame: &mut Frame, area: Rect) {
    let [pages_area, main_area] = Layout::horizontal([Constraint::Length(32), Constraint::Min(0)]).areas(area);
    let [top_area, result_area] =
        Layout::vertical([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(main_area);
    let [actions_area, form_area] =
        Layout::horizontal([Constraint::Length(36), Constraint::Min(0)]).areas(top_area);

    // Store areas for mouse hit-testing
    app.pages_area = Some(pages_area);
    app.result_area = Some(result_area);

    render_pages(app, frame, pages_area);
    render_actions(app, frame, actions_area);
    render_form(app, frame, form_area);
    render_result(app, frame, result_area);
}

fn render_pages(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = pane_block(format!(" {} ", app.section.display_name()), app.focus == FocusPane::Pages);

    let items: Vec<ListItem> = app
        .page_links()
        .iter()
        .map(|page| ListItem::new(format!(" {} ", page.label())))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style())
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.page_state);
}

fn render_actions(app: &mut App, frame: &mut Frame, area: Rect) {
    let title = app.current_page().map(|p| p.label()).unwrap_or_default();
    let block = pane_block(format!(" {} ", title), app.focus == FocusPane::Actions);

    let items: Vec<ListItem> = app
        .actions
        .iter()
        .map(|action| ListItem::new(format!(" {} ", action.title)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style())
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.action_state);
}

fn render_form(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Form;
    let title = app.selected_action().map(|a| a.title).unwrap_or("Форма");
    let block = pane_block(format!(" {} ", title), focused || app.input_mode == InputMode::Editing);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(form) = &app.form else {
        return;
    };

    let [fields_area, error_area] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

    if form.fields.is_empty() {
        let hint = Paragraph::new("Параметры не требуются. Enter или s для отправки.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, fields_area);
    } else {
        let editing = app.input_mode == InputMode::Editing;
        render_form_fields(frame, fields_area, form, editing, &|lookup| app.lookup_options(lookup));
    }

    if let Some(error) = &app.form_error {
        let line = Paragraph::new(Span::styled(error.clone(), Style::default().fg(Color::Red)));
        frame.render_widget(line, error_area);
    }
}

fn display_value(field: &FieldSpec, value: &str) -> String {
    match field.kind {
        FieldKind::Secret => SECRET_MASK.to_string().repeat(value.chars().count()),
        _ => value.to_string(),
    }
}

/// One line per field: label, value and whatever helps fill it in.
fn render_form_fields<'a>(
    frame: &mut Frame,
    area: Rect,
    form: &FormState,
    editing: bool,
    options: &dyn Fn(Lookup) -> &'a [LookupOption],
) {
    let label_width = form
        .fields
        .iter()
        .map(|f| f.label.chars().count() + 2)
        .max()
        .unwrap_or(0);

    let mut lines = Vec::new();
    for (i, (field, value)) in form.fields.iter().zip(&form.values).enumerate() {
        let is_focused = i == form.focused;
        let is_missing = form.missing.contains(&field.label);

        let marker = if field.required { "*" } else { " " };
        let label = format!("{}{:<width$}", marker, field.label, width = label_width);
        let label_style = if is_missing {
            Style::default().fg(Color::Red).bold()
        } else if is_focused {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };

        let value_style = if is_focused {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        } else {
            Style::default()
        };

        let mut spans = vec![
            Span::styled(label, label_style),
            Span::styled(format!(" {} ", display_value(field, value)), value_style),
        ];

        match field.kind {
            FieldKind::Choice(choices) => {
                spans.push(Span::styled(
                    format!(" ({})", choices.join("/")),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            FieldKind::Lookup(lookup) => {
                let known = options(lookup);
                if let Some(option) = known.iter().find(|o| o.id == *value) {
                    spans.push(Span::styled(format!(" {}", option.label), Style::default().fg(Color::Green)));
                } else if known.is_empty() && is_focused {
                    spans.push(Span::styled(" (справочник не загружен, введите ID)", Style::default().fg(Color::DarkGray)));
                }
            }
            _ => {
                if let Some(hint) = field.hint().filter(|_| is_focused) {
                    spans.push(Span::styled(format!(" {}", hint), Style::default().fg(Color::DarkGray)));
                }
            }
        }
        lines.push(Line::from(spans));
    }

    let scroll = (form.focused as u16).saturating_sub(area.height.saturating_sub(1));
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);

    if editing {
        if form.focused_field().is_some_and(|f| !f.is_choice()) {
            // marker + padded label + the space before the value
            let cursor_x = (1 + label_width + 1 + form.cursor) as u16;
            let cursor_y = (form.focused as u16).saturating_sub(scroll);
            if cursor_x < area.width && cursor_y < area.height {
                frame.set_cursor_position((area.x + cursor_x, area.y + cursor_y));
            }
        }
    }
}

fn render_result(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Result;

    let Some(result) = &app.result else {
        let text = match &app.pending {
            Some(pending) => {
                let dots = ".".repeat((app.animation_frame as usize) + 1);
                format!("{}: выполняется{}", pending.title, dots)
            }
            None => "Выберите действие и отправьте форму.".to_string(),
        };
        let placeholder = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(pane_block(" Ответ ", focused));
        frame.render_widget(placeholder, area);
        return;
    };

    let outcome = &result.outcome;
    let status_color = if outcome.is_ok() { Color::Green } else { Color::Red };
    let mut title = vec![
        Span::raw(format!(" {} ", result.title)),
        Span::styled(format!("[{}]", outcome.status_label()), Style::default().fg(status_color).bold()),
    ];
    if let CallOutcome::Response(response) = outcome {
        title.push(Span::styled(
            format!(" {} ", response.duration_label()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let block = pane_block(Line::from(title), focused);
    let inner_area = block.inner(area);
    app.result_height = inner_area.height;

    let mut lines = vec![
        Line::from(Span::styled(outcome.request_line(), Style::default().fg(Color::DarkGray))),
        Line::default(),
    ];
    lines.extend(outcome.body().lines().map(|l| Line::from(l.to_string())));

    // Scroll limits follow the wrapped height, not the number of source lines
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    let wrapped = paragraph.line_count(inner_area.width);
    app.result_lines = u16::try_from(wrapped).unwrap_or(u16::MAX);
    app.result_scroll = app.result_scroll.min(app.result_lines.saturating_sub(app.result_height));

    frame.render_widget(paragraph.block(block).scroll((app.result_scroll, 0)), area);

    // Render scrollbar
    if app.result_lines > app.result_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(app.result_lines as usize).position(app.result_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_goto(app: &App, frame: &mut Frame, area: Rect) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 3;
    let popup_area = Rect::new(
        (area.width.saturating_sub(popup_width)) / 2,
        (area.height.saturating_sub(popup_height)) / 2,
        popup_width,
        popup_height,
    );

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Перейти по адресу (Enter, Esc) ");
    let input_area = block.inner(popup_area);
    frame.render_widget(Paragraph::new(app.goto_input.as_str()).block(block), popup_area);

    let cursor_x = (app.goto_input.chars().count() as u16).min(input_area.width.saturating_sub(1));
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ResultView;
    use casino_core::testing::RecordingTransport;
    use casino_core::{ApiClient, Config, MemoryStorage, PageId, Route, SessionStore};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_long_wrapped_body_scrolls_to_its_end() {
        let mut store = SessionStore::load(Box::new(MemoryStorage::new()));
        store.login("admin", "Basic YWRtaW46YWRtaW4=", "").unwrap();
        let client = ApiClient::with_transport(Arc::new(RecordingTransport::new()), "http://proxy");
        let mut app = App::new(Config::new(), store, client);
        app.navigate(Route::Page(PageId::Operations));
        app.result = Some(ResultView {
            title: "Журнал операций",
            outcome: CallOutcome::Failed {
                request_line: "GET /api/finance/operations".to_string(),
                status: Some(500),
                error: format!("{} END_MARKER", "a".repeat(6000)),
            },
        });

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(app.result_lines > 90, "wrapped height was {}", app.result_lines);
        assert!(!screen_text(&terminal).contains("END_MARKER"));

        for _ in 0..500 {
            app.scroll_down();
        }
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert_eq!(app.result_scroll, app.result_lines - app.result_height);
        assert!(screen_text(&terminal).contains("END_MARKER"));
    }
}
