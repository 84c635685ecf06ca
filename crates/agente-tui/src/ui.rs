use agente_core::ebook::{self, CHAPTER_MISSION, EBOOK_SUBTITLE, EBOOK_TITLE};
use agente_core::prompts::{DAILY_INSIGHT, DAILY_INSIGHT_AUTHOR};
use agente_core::Role;
use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use crate::app::{App, DashboardCard, InputMode, Screen};

/// Take text up to the closing `marker`. `None` if the marker never closes.
fn take_until(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, marker: &str) -> Option<String> {
    let mut taken = String::new();
    let double = marker.len() == 2;
    while let Some(c) = chars.next() {
        if c == '*' {
            if !double {
                return Some(taken);
            }
            if chars.peek() == Some(&'*') {
                chars.next();
                return Some(taken);
            }
        }
        taken.push(c);
    }
    None
}

/// Parse a line of text and convert **bold** and *italic* markdown to styled spans
pub fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' {
            current_text.push(c);
            continue;
        }

        let bold = chars.peek() == Some(&'*');
        if bold {
            chars.next();
        }
        let marker = if bold { "**" } else { "*" };

        // A lone "* " is a list bullet, not emphasis
        if !bold && matches!(chars.peek(), Some(' ') | None) {
            current_text.push(c);
            continue;
        }

        // Unclosed markers stay literal
        let mut lookahead = chars.clone();
        match take_until(&mut lookahead, marker) {
            Some(inner) if !inner.is_empty() => {
                chars = lookahead;
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                let modifier = if bold { Modifier::BOLD } else { Modifier::ITALIC };
                spans.push(Span::styled(inner, Style::default().add_modifier(modifier)));
            }
            _ => current_text.push_str(marker),
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
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
        Screen::Auth => render_auth_screen(app, frame, body_area),
        Screen::Dashboard => render_dashboard_screen(app, frame, body_area),
        Screen::Ebook => render_ebook_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.confirm_clear {
        render_confirm_clear(frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
        " Agente Cirúrgico ",
        Style::default().fg(Color::Cyan).bold(),
    )];

    if app.session.is_authenticated() {
        spans.push(Span::styled(
            format!(" {} ", app.session.user().name),
            Style::default().fg(Color::White),
        ));
    }

    if app.podcast_loading() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        spans.push(Span::styled(
            format!(" ♪ gerando{} ", dots),
            Style::default().fg(Color::Magenta),
        ));
    } else if app.session.is_playing() {
        spans.push(Span::styled(" ♪ tocando ", Style::default().fg(Color::Magenta).bold()));
    }

    spans.push(Span::styled(
        format!(" v{}", env!("CARGO_PKG_VERSION")),
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

    let mode_text = match app.screen {
        Screen::Auth => " ENTRAR ",
        Screen::Dashboard => " INÍCIO ",
        Screen::Ebook => " EBOOK ",
        Screen::Chat => " AGENTE ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let mut hints: Vec<Span> = match (app.screen, app.input_mode) {
        (Screen::Auth, _) => [hint("Enter", "entrar"), hint("Esc", "sair")].concat(),
        (Screen::Dashboard, _) => [
            hint("Tab", "cartão"),
            hint("Enter", "abrir"),
            hint("p", "podcast"),
            hint("L", "sair da conta"),
            hint("q", "fechar"),
        ]
        .concat(),
        (Screen::Ebook, _) => [
            hint("j/k", "capítulo"),
            hint("Enter", "abrir"),
            hint("J/K", "rolar"),
            hint("p", "podcast"),
            hint("a", "agente"),
            hint("Esc", "início"),
        ]
        .concat(),
        (Screen::Chat, InputMode::Normal) => [
            hint("i", "digitar"),
            hint("j/k", "rolar"),
            hint("x", "limpar memória"),
            hint("e", "ebook"),
            hint("Esc", "início"),
            hint("q", "fechar"),
        ]
        .concat(),
        (Screen::Chat, InputMode::Editing) => [
            hint("Enter", "enviar"),
            hint("Esc", "parar de digitar"),
            hint("Ctrl+L", "limpar memória"),
        ]
        .concat(),
    };

    if let Some(status) = &app.status {
        hints.push(Span::styled(
            format!("  {}", status),
            Style::default().bg(Color::Black).fg(Color::Yellow),
        ));
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

/// A rectangle of at most `width` x `height`, centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}

fn render_auth_screen(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered(area, 56, 13);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(" Agente Cirúrgico ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [title_area, _, label_area, input_area, error_area, _, note_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(inner.inner(Margin {
        vertical: 0,
        horizontal: 1,
    }));

    let title = Paragraph::new(vec![
        Line::from(Span::styled("Agente Cirúrgico", Style::default().fg(Color::White).bold())),
        Line::from(Span::styled(
            "CRIADO POR CHRISTIAN RIBEIRO",
            Style::default().fg(Color::LightBlue),
        )),
    ])
    .centered();
    frame.render_widget(title, title_area);

    frame.render_widget(
        Paragraph::new("IDENTIFICAÇÃO").style(Style::default().fg(Color::Gray).bold()),
        label_area,
    );

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let (text, style) = if app.name_input.is_empty() {
        (
            "Digite seu nome para iniciar".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (app.name_input.clone(), Style::default().fg(Color::Cyan))
    };
    frame.render_widget(Paragraph::new(text).style(style).block(input_block), input_area);
    frame.set_cursor_position((
        input_area.x + 1 + app.name_cursor.min(input_area.width.saturating_sub(3) as usize) as u16,
        input_area.y + 1,
    ));

    if let Some(err) = &app.auth_error {
        frame.render_widget(
            Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)),
            error_area,
        );
    }

    frame.render_widget(
        Paragraph::new("Ferramenta exclusiva baseada em neurociência aplicada a vendas.")
            .style(Style::default().fg(Color::DarkGray))
            .centered(),
        note_area,
    );
}

fn render_dashboard_screen(app: &App, frame: &mut Frame, area: Rect) {
    let [greeting_area, cards_area, insight_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(8),
        Constraint::Length(7),
    ])
    .areas(area.inner(Margin {
        vertical: 1,
        horizontal: 2,
    }));

    let greeting = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Olá, ", Style::default().bold()),
            Span::styled(app.session.user().name.clone(), Style::default().fg(Color::Cyan).bold()),
            Span::styled(".", Style::default().bold()),
        ]),
        Line::from(Span::styled(
            "Sua central de comando para vendas de alta complexidade está pronta.",
            Style::default().fg(Color::Gray),
        )),
    ]);
    frame.render_widget(greeting, greeting_area);

    let [chat_card, ebook_card] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(cards_area);

    render_card(
        frame,
        chat_card,
        app.dashboard_card == DashboardCard::Chat,
        "Iniciar Consultoria",
        "Ative o Agente Cirúrgico para estruturar seus scripts, analisar objeções e guiar suas negociações em tempo real.",
        "ACESSAR IA →",
        Color::Blue,
    );
    render_card(
        frame,
        ebook_card,
        app.dashboard_card == DashboardCard::Ebook,
        "Metodologia SPIN",
        "Acesse o material de apoio. Da Caverna de Platão à Mentalidade de Kobe Bryant. A base teórica da sua prática.",
        "LER CONTEÚDO →",
        Color::Magenta,
    );

    let insight_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Insight Diário ");

    let insight = Paragraph::new(vec![
        Line::from(Span::styled(DAILY_INSIGHT, Style::default().fg(Color::LightBlue))),
        Line::default(),
        Line::from(Span::styled(
            format!("— {}", DAILY_INSIGHT_AUTHOR.to_uppercase()),
            Style::default().fg(Color::Blue).bold(),
        )),
        Line::from(Span::styled(
            "Pressione p para ouvir o podcast sobre SPIN",
            Style::default().fg(Color::DarkGray).italic(),
        )),
    ])
    .block(insight_block)
    .wrap(Wrap { trim: true });
    frame.render_widget(insight, insight_area);
}

fn render_card(
    frame: &mut Frame,
    area: Rect,
    selected: bool,
    title: &str,
    body: &str,
    action: &str,
    accent: Color,
) {
    let border_color = if selected { accent } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", title));

    let action_style = if selected {
        Style::default().fg(Color::White).bg(accent).bold()
    } else {
        Style::default().fg(accent).bold()
    };

    let card = Paragraph::new(vec![
        Line::from(Span::styled(body.to_string(), Style::default().fg(Color::Gray))),
        Line::default(),
        Line::from(Span::styled(format!(" {} ", action), action_style)),
    ])
    .block(block)
    .wrap(Wrap { trim: true });

    frame.render_widget(card, area.inner(Margin {
        vertical: 0,
        horizontal: 1,
    }));
}

fn render_ebook_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", EBOOK_TITLE));

    let selected = app.chapter_state.selected().unwrap_or(0);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(EBOOK_SUBTITLE, Style::default().fg(Color::Gray))),
        Line::default(),
    ];

    for (idx, chapter) in ebook::chapters().iter().enumerate() {
        let is_selected = idx == selected;
        let is_open = app.expanded_chapter == Some(idx);

        let number_style = if is_open {
            Style::default().fg(Color::White).bg(Color::Blue).bold()
        } else {
            Style::default().fg(Color::Gray).bg(Color::DarkGray)
        };
        let title_style = if is_selected {
            Style::default().fg(Color::Yellow).bold()
        } else if is_open {
            Style::default().fg(Color::White).bold()
        } else {
            Style::default().fg(Color::Gray)
        };

        lines.push(Line::from(vec![
            Span::raw(if is_selected { "> " } else { "  " }),
            Span::styled(format!(" {} ", chapter.id), number_style),
            Span::raw(" "),
            Span::styled(chapter.title, title_style),
            Span::styled(if is_open { "  ▾" } else { "  ▸" }, Style::default().fg(Color::DarkGray)),
        ]));

        if is_open {
            lines.push(Line::default());
            if let Some(url) = chapter.image_url {
                lines.push(Line::from(Span::styled(
                    format!("    [imagem] {}", url),
                    Style::default().fg(Color::DarkGray).underlined(),
                )));
                lines.push(Line::default());
            }
            for paragraph in chapter.content.lines() {
                lines.push(Line::from(format!("    {}", paragraph)));
            }
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("    ★ {}", CHAPTER_MISSION),
                Style::default().fg(Color::LightBlue).bold(),
            )));
        }
        lines.push(Line::default());
    }

    let total_lines = lines.len() as u16;
    let visible = area.height.saturating_sub(2);
    app.ebook_scroll = app.ebook_scroll.min(total_lines.saturating_sub(1));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.ebook_scroll, 0));
    frame.render_widget(paragraph, area);

    if total_lines > visible {
        render_scrollbar(frame, area, total_lines, app.ebook_scroll);
    }
}

fn render_scrollbar(frame: &mut Frame, area: Rect, total: u16, position: u16) {
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("^"))
        .end_symbol(Some("v"));

    let mut scrollbar_state = ScrollbarState::new(total as usize).position(position as usize);

    frame.render_stateful_widget(
        scrollbar,
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);
    app.chat_scroll = app.chat_scroll.min(app.max_chat_scroll());

    let memory = if app.session.has_client() {
        "Memória Ativa"
    } else {
        "Offline"
    };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.input_mode == InputMode::Normal {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
        .title(format!(" Agente Cirúrgico · {} ", memory));

    let mut lines: Vec<Line> = Vec::new();
    let user_name = app.session.user().name.clone();

    for msg in app.session.transcript() {
        match msg.role {
            Role::User => {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{}:", user_name),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" {}", msg.timestamp.format("%H:%M")),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]));
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Role::Model => {
                lines.push(Line::from(vec![
                    Span::styled(
                        "Agente:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" {}", msg.timestamp.format("%H:%M")),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]));
                for line in msg.text.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.chat_loading {
        lines.push(Line::from(Span::styled(
            "Agente:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Processando resposta{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    // Input at the bottom, highlighted while editing
    let input_border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let input_title = if app.chat_loading {
        " Aguarde a resposta... "
    } else {
        " Digite sua mensagem aqui "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(input_title);

    // Horizontal scrolling keeps the cursor visible; inner width excludes borders
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, input_area);

    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_confirm_clear(frame: &mut Frame, area: Rect) {
    let popup_area = centered(area, 60, 5);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Limpar Memória da Conversa ");

    let text = Paragraph::new(vec![
        Line::from("Tem certeza que deseja apagar toda a memória desta conversa?"),
        Line::from(Span::styled(
            "y para confirmar, qualquer outra tecla para cancelar",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(block)
    .wrap(Wrap { trim: true });

    frame.render_widget(text, popup_area);
}
