//! TUI 首页：搜索输入、菜单与结果列表。

use super::*;

pub(super) fn handle_event_home(app: &mut App, event: Event) -> Result<()> {
    match event {
        Event::Paste(s) => {
            if app.focus == Focus::Input {
                app.input.push_str(&s);
            }
        }
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') => {
                if app.focus == Focus::Input {
                    app.input.push('q');
                } else {
                    app.should_quit = true;
                }
            }
            KeyCode::Char('f') => {
                if app.focus == Focus::Input {
                    app.input.push('f');
                } else {
                    super::switch_view(app, MenuAction::CycleField)?;
                }
            }
            KeyCode::Esc => {
                app.focus = Focus::Input;
                app.list_state.select(None);
            }
            KeyCode::Tab => cycle_focus(app),
            KeyCode::Backspace => {
                if app.focus == Focus::Input {
                    app.input.pop();
                }
            }
            KeyCode::Char(c)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                if app.focus == Focus::Input {
                    app.input.push(c);
                }
            }
            KeyCode::Up => match app.focus {
                Focus::Results => app.select_prev(),
                Focus::Menu => select_prev_menu(app),
                Focus::Input => {}
            },
            KeyCode::Down => match app.focus {
                Focus::Results => app.select_next(),
                Focus::Menu => select_next_menu(app),
                Focus::Input => {}
            },
            KeyCode::Enter => match app.focus {
                Focus::Input => process_input(app)?,
                Focus::Results => {
                    if let Some(idx) = app.list_state.selected() {
                        super::open_detail(app, idx)?;
                    }
                }
                Focus::Menu => super::trigger_menu_action(app)?,
            },
            _ => {}
        },
        Event::Mouse(me) => handle_mouse_home(app, me)?,
        Event::Resize(_, _) => {}
        _ => {}
    }

    Ok(())
}

fn handle_mouse_home(app: &mut App, me: event::MouseEvent) -> Result<()> {
    let Some(layout) = app.last_home_layout else {
        return Ok(());
    };
    let input_area = layout[1];
    let menu_area = layout[2];
    let results_area = layout[3];

    match me.kind {
        MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
            if pos_in(results_area, me.column, me.row) && !app.session.results().is_empty() {
                if matches!(me.kind, MouseEventKind::ScrollUp) {
                    app.select_prev();
                } else {
                    app.select_next();
                }
                app.focus = Focus::Results;
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if pos_in(input_area, me.column, me.row) {
                app.focus = Focus::Input;
            } else if pos_in(menu_area, me.column, me.row) {
                app.focus = Focus::Menu;
                if let Some(idx) = super::list_index_from_mouse_row(
                    menu_area,
                    me.row,
                    &app.menu_state,
                    MENU_ITEMS.len(),
                ) {
                    app.menu_state.select(Some(idx));
                    super::trigger_menu_action(app)?;
                }
            } else if pos_in(results_area, me.column, me.row)
                && let Some(idx) = super::list_index_from_mouse_row(
                    results_area,
                    me.row,
                    &app.list_state,
                    app.session.results().len(),
                )
            {
                app.list_state.select(Some(idx));
                app.focus = Focus::Results;
                super::open_detail(app, idx)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn cycle_focus(app: &mut App) {
    app.focus = match app.focus {
        Focus::Input => Focus::Menu,
        Focus::Menu => {
            if app.session.results().is_empty() {
                Focus::Input
            } else {
                Focus::Results
            }
        }
        Focus::Results => Focus::Input,
    };
}

fn select_next_menu(app: &mut App) {
    let len = MENU_ITEMS.len();
    let next = app
        .menu_state
        .selected()
        .map(|i| (i + 1) % len)
        .unwrap_or(0);
    app.menu_state.select(Some(next));
}

fn select_prev_menu(app: &mut App) {
    let len = MENU_ITEMS.len();
    let prev = app
        .menu_state
        .selected()
        .map(|i| if i == 0 { len - 1 } else { i - 1 })
        .unwrap_or(len - 1);
    app.menu_state.select(Some(prev));
}

/// 回车提交：把输入同步进会话并发起搜索。空串也照发，由后端决定结果。
pub(super) fn process_input(app: &mut App) -> Result<()> {
    app.session.query = app.input.clone();
    super::start_search_task(app)
}

fn current_selection_lines(app: &App) -> Option<Vec<Line<'static>>> {
    let idx = app.list_state.selected()?;
    let item = app.session.results().get(idx)?;
    let mut lines = Vec::new();
    lines.push(Line::from(format!(
        "选中: 《{}》 | 作者: {}",
        item.title.as_deref().unwrap_or("N/A"),
        item.primary_author
    )));

    let mut meta_parts: Vec<String> = Vec::new();
    if let Some(year) = item.first_publish_year {
        meta_parts.push(format!("初版: {year}"));
    }
    if !item.languages.is_empty() {
        meta_parts.push(format!("语言: {}", item.languages.join("/")));
    }
    if !item.isbns.is_empty() {
        meta_parts.push(format!("ISBN: {}", item.isbns.len()));
    }
    if !meta_parts.is_empty() {
        lines.push(Line::from(meta_parts.join(" | ")));
    }
    if !item.subjects.is_empty() {
        lines.push(Line::from(format!(
            "主题: {}",
            super::truncate(&item.subjects.join(", "), 120)
        )));
    }

    Some(lines)
}

pub(super) fn draw_home(frame: &mut ratatui::Frame, app: &mut App) {
    let (main, log_area) = super::split_with_log(frame.size());
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Min(5),
        ])
        .split(main);
    if layout.len() == 5 {
        let mut arr = [Rect::default(); 5];
        arr.copy_from_slice(&layout);
        app.last_home_layout = Some(arr);
    }

    let header_line = Line::from(vec![
        Span::styled(
            "Open Library 图书检索",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  搜索字段: "),
        Span::styled(
            app.session.search_by.label(),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  |  f: 切换字段, q: 退出"),
    ]);
    let header = Paragraph::new(header_line).block(
        Block::default()
            .borders(Borders::ALL)
            .title("openlib-explorer"),
    );
    frame.render_widget(header, layout[0]);

    let input_style = if app.focus == Focus::Input {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let input = Paragraph::new(format!("> {}", app.input))
        .style(input_style)
        .block(Block::default().borders(Borders::ALL).title(format!(
            "按{}搜索 (Enter 确认, Tab 切换焦点)",
            app.session.search_by.label()
        )));
    frame.render_widget(input, layout[1]);

    let menu_items: Vec<ListItem> = MENU_ITEMS
        .iter()
        .map(|(label, _)| ListItem::new(*label))
        .collect();
    let menu_style = if app.focus == Focus::Menu {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let menu = List::new(menu_items)
        .highlight_style(menu_style.add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ")
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("操作 (Enter 或鼠标点击)"),
        );
    frame.render_stateful_widget(menu, layout[2], &mut app.menu_state);

    let results = app.session.results();
    let items: Vec<ListItem> = if results.is_empty() {
        vec![ListItem::new("无搜索结果")]
    } else {
        results
            .iter()
            .map(|b| {
                let year = b
                    .first_publish_year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                ListItem::new(format!(
                    "{} | {} | {}",
                    b.title.as_deref().unwrap_or("N/A"),
                    b.primary_author,
                    year
                ))
            })
            .collect()
    };

    let results_title = if results.is_empty() {
        "搜索结果".to_string()
    } else {
        format!(
            "搜索结果 {}/{} (上下选择, Enter 详情)",
            results.len(),
            app.session.total()
        )
    };
    let results_block = Block::default().borders(Borders::ALL).title(results_title);
    frame.render_widget(results_block.clone(), layout[3]);
    let results_inner = results_block.inner(layout[3]);

    let results_len = results.len();
    let need_scrollbar =
        results_len > 0 && results_inner.height > 0 && results_len > results_inner.height as usize;
    let (list_area, sb_area) = if need_scrollbar && results_inner.width > 0 {
        let list_w = results_inner.width.saturating_sub(1).max(1);
        (
            Rect {
                x: results_inner.x,
                y: results_inner.y,
                width: list_w,
                height: results_inner.height,
            },
            Some(Rect {
                x: results_inner.x.saturating_add(list_w),
                y: results_inner.y,
                width: 1,
                height: results_inner.height,
            }),
        )
    } else {
        (results_inner, None)
    };

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    frame.render_stateful_widget(list, list_area, &mut app.list_state);

    if let Some(sb_area) = sb_area {
        let pos = app
            .list_state
            .selected()
            .unwrap_or(0)
            .min(results_len.saturating_sub(1));
        let mut sb_state = ScrollbarState::new(results_len).position(pos);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        frame.render_stateful_widget(sb, sb_area, &mut sb_state);
    }

    let mut msg_lines: Vec<Line> = Vec::new();
    if let Some(detail) = current_selection_lines(app) {
        msg_lines.extend(detail);
        msg_lines.push(Line::from(""));
    }
    if let Some(err) = app.session.error() {
        msg_lines.push(Line::from(Span::styled(
            format!("错误: {err}"),
            Style::default().fg(Color::Red),
        )));
    }
    msg_lines.push(Line::from(app.status.clone()));
    if !app.messages.is_empty() {
        msg_lines.push(Line::from(""));
        msg_lines.extend(
            app.messages
                .iter()
                .rev()
                .take(6)
                .rev()
                .map(|m| Line::from(m.as_str())),
        );
    }

    let messages = Paragraph::new(msg_lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("状态 / 消息"));
    frame.render_widget(messages, layout[4]);

    super::render_log_box(frame, log_area, app);
}
