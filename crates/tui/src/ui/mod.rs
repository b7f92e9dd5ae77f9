use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame,
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::{controller::EditState, App};
use crate::strings::{
    build_status_line, build_stick_label, help_lines_ascii, StatusInfo, INPUT_HINT, TITLE_HELP,
    TITLE_INPUT, TITLE_OUTPUT, TITLE_SERVER_HELP,
};
use crate::theme::THEME;

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();
    let inner_width = area.width.saturating_sub(2);
    let input_total_lines =
        measure_total_lines(app.controller.input().text(), inner_width).max(1) as u16;
    let target_lines = input_total_lines.min(app.input_max_lines);
    let current = app.input_visible_lines.max(1);
    app.input_visible_lines = if current < target_lines {
        current + 1
    } else if current > target_lines {
        current - 1
    } else {
        current
    };
    let prompt_height = if app.prompt.trim().is_empty() { 0 } else { 1 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(prompt_height),
            Constraint::Length(app.input_visible_lines + 2),
        ])
        .split(area);

    app.output_area = Some(chunks[0]);
    draw_output(f, chunks[0], app);
    draw_status(f, chunks[1], app);
    if prompt_height > 0 {
        let prompt = Paragraph::new(Span::styled(
            app.prompt.clone(),
            Style::default().fg(THEME.prompt),
        ));
        f.render_widget(prompt, chunks[2]);
    }
    draw_input(f, chunks[3], app, inner_width);

    if let Some(text) = &app.help_popup {
        draw_server_help(f, area, text);
    }
    if app.show_help {
        draw_help(f, area);
    }
}

fn draw_output(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .title(TITLE_OUTPUT)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.output_border));

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    app.ensure_output_wrapped(inner_width);
    app.output_viewport = inner_height;

    let viewport = inner_height as usize;
    let first = app.output_first_row(viewport);
    let mut skip = first;
    let mut vis_lines: Vec<Line> = Vec::with_capacity(viewport);
    'outer: for cached in &app.output_cache {
        if skip >= cached.rows.len() {
            skip -= cached.rows.len();
            continue;
        }
        let style = THEME
            .line_color(&cached.class)
            .map(|c| Style::default().fg(c))
            .unwrap_or_default();
        for row in cached.rows.iter().skip(skip) {
            if vis_lines.len() >= viewport {
                break 'outer;
            }
            vis_lines.push(Line::from(Span::styled(row.clone(), style)));
        }
        skip = 0;
    }

    let para = Paragraph::new(vis_lines).block(block);
    f.render_widget(para, area);

    if app.output_total_rows > viewport {
        let inner = Rect {
            x: area.x.saturating_add(1),
            y: area.y.saturating_add(1),
            width: inner_width,
            height: inner_height,
        };
        let mut sb_state = ScrollbarState::new(app.output_total_rows.saturating_sub(viewport))
            .position(first);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(sb, inner, &mut sb_state);
    }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let stick = build_stick_label(app.output_scroll);
    let info = StatusInfo {
        connected: app.connected,
        logged_in: app.logged_in,
        recalling: app.controller.state() == EditState::Recalling,
        history_len: app.controller.history().committed_len(),
        unread: app.unread,
        debug: app.config.options.debug_enabled,
        stick: &stick,
        notice: app.last_notice.as_deref(),
    };
    let text = build_status_line(&info, area.width);
    let para = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(para, area);
}

fn draw_input(f: &mut Frame, area: Rect, app: &App, inner_width: u16) {
    let block = Block::default()
        .title(TITLE_INPUT)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.border_focus));
    let input = app.controller.input();
    let graphemes: Vec<&str> = input.text().graphemes(true).collect();
    let upto = input.cursor().min(graphemes.len());
    let (line_idx, col_width) = measure_prefix_line_col(&graphemes, upto, inner_width);
    let offset_y = line_idx.saturating_sub(app.input_visible_lines.saturating_sub(1));

    let para = if input.is_empty() {
        Paragraph::new(Line::from(Span::styled(
            INPUT_HINT,
            Style::default().fg(Color::DarkGray),
        )))
        .block(block)
    } else {
        Paragraph::new(input.text().to_string())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((offset_y, 0))
    };
    f.render_widget(para, area);

    let cursor_x = area.x + 1 + col_width;
    let cursor_y = area.y + 1 + line_idx.saturating_sub(offset_y);
    f.set_cursor_position(Position::new(cursor_x, cursor_y));
}

fn draw_server_help(f: &mut Frame, area: Rect, text: &str) {
    let popup_area = centered_rect(70, 70, area);
    let block = Block::default()
        .title(Span::styled(
            TITLE_SERVER_HELP,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let mut lines: Vec<Line> = text.lines().map(|l| Line::from(l.to_string())).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Esc/Enter: close",
        Style::default().fg(Color::DarkGray),
    )));
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(70, 70, area);
    let block = Block::default()
        .title(Span::styled(
            TITLE_HELP,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let lines = help_lines_ascii()
        .iter()
        .map(|s| Line::from(*s))
        .collect::<Vec<Line>>();
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1]);
    horiz[1]
}

fn measure_total_lines(s: &str, width: u16) -> usize {
    let graphemes: Vec<&str> = s.graphemes(true).collect();
    measure_prefix_line_col(&graphemes, graphemes.len(), width).0 as usize + 1
}

fn measure_prefix_line_col(graphemes: &[&str], upto: usize, width: u16) -> (u16, u16) {
    if width == 0 {
        return (0, 0);
    }
    let mut line = 0usize;
    let mut col = 0usize;
    for g in graphemes.iter().take(upto) {
        if *g == "\n" {
            line += 1;
            col = 0;
            continue;
        }
        let w = UnicodeWidthStr::width(*g);
        if col + w > width as usize {
            line += 1;
            col = 0;
        }
        col += w;
    }
    (line as u16, col as u16)
}
