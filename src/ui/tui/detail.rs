//! 详情页：展示选中图书的投影字段与封面状态。

use super::*;

pub(super) fn handle_event_detail(app: &mut App, event: Event) -> Result<()> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => go_back(app),
            KeyCode::Char('p') => {
                if let Some(url) = app.session.cover().map(str::to_string) {
                    if app.config.cover_preview {
                        super::start_cover_art_task(app, url)?;
                    } else {
                        app.status = "封面预览已在配置中关闭".to_string();
                    }
                } else {
                    app.status = "该书没有可用封面".to_string();
                }
            }
            KeyCode::Up => app.detail_scroll = app.detail_scroll.saturating_sub(1),
            KeyCode::Down => app.detail_scroll = app.detail_scroll.saturating_add(1),
            _ => {}
        },
        Event::Mouse(me) => match me.kind {
            MouseEventKind::ScrollUp => app.detail_scroll = app.detail_scroll.saturating_sub(1),
            MouseEventKind::ScrollDown => app.detail_scroll = app.detail_scroll.saturating_add(1),
            MouseEventKind::Down(MouseButton::Right) => go_back(app),
            _ => {}
        },
        _ => {}
    }
    Ok(())
}

fn go_back(app: &mut App) {
    app.session.go_back();
    app.view = View::Home;
    app.detail_scroll = 0;
    app.cover_lines.clear();
    app.cover_art_seq = None;
    app.status = "已返回结果列表".to_string();
}

fn cover_status_line(app: &App) -> Line<'static> {
    match (app.session.phase(), app.session.cover()) {
        (Phase::DetailLoading, _) => Line::from("封面: 检查中…"),
        (_, Some(url)) => Line::from(vec![
            Span::raw("封面: "),
            Span::styled(url.to_string(), Style::default().fg(Color::Blue)),
            Span::raw("  (p 预览)"),
        ]),
        (_, None) => Line::from("封面: 无"),
    }
}

pub(super) fn draw_detail(frame: &mut ratatui::Frame, app: &mut App) {
    let (main, log_area) = super::split_with_log(frame.size());

    let Some(selection) = app.session.selection() else {
        let empty = Paragraph::new("没有选中的图书，Esc 返回")
            .block(Block::default().borders(Borders::ALL).title("图书详情"));
        frame.render_widget(empty, main);
        super::render_log_box(frame, log_area, app);
        return;
    };
    let d = &selection.detail;

    let field = |label: &str, value: &str| -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("{label}: "),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(value.to_string()),
        ])
    };

    let mut lines = vec![
        field("标题", &d.title),
        field("作者", &d.authors),
        field("初版年份", &d.first_publish_year),
        field("出版社", &d.publishers),
        field("语言", &d.languages),
        field("主题", &d.subjects),
        field("ISBN", d.isbn.as_deref().unwrap_or("N/A")),
        Line::from(""),
        cover_status_line(app),
        Line::from(""),
        Line::from(Span::styled(
            "Esc 返回列表 | p 预览封面 | 上下滚动",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(err) = app.session.error() {
        lines.push(Line::from(Span::styled(
            format!("错误: {err}"),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(app.status.clone()));

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .scroll((app.detail_scroll, 0))
        .block(Block::default().borders(Borders::ALL).title(format!(
            "图书详情 (第 {} 条)",
            selection.index + 1
        )));
    frame.render_widget(body, main);

    super::render_log_box(frame, log_area, app);
}
