//! 无 UI 模式：纯标准输入输出的逐行交互，供不支持 TUI 的终端使用。

use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing::info;

use crate::base_system::context::Config;
use crate::catalog::client::CatalogClient;
use crate::catalog::session::Session;
use crate::ui::tui::ascii_preview;

/// 读到 EOF（零字节）返回 None，调用方应当退出而不是重试。
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    read_trimmed(&mut io::stdin().lock())
}

fn read_trimmed(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}

pub fn run(config: &Config) -> Result<()> {
    println!("=== Open Library 图书检索（无 UI 模式） ===");
    println!("输入关键词搜索；f 切换搜索字段；q 退出。");

    let client = CatalogClient::new(config)?;
    let mut session = Session::new();

    loop {
        let Some(input) = read_line(&format!("[按{}搜索]> ", session.search_by.label()))? else {
            break;
        };
        match input.as_str() {
            "q" | "quit" | "exit" => break,
            "f" => {
                session.search_by = session.search_by.next();
                println!("搜索字段已切换为: {}", session.search_by.label());
                continue;
            }
            term => {
                session.query = term.to_string();
                let seq = session.begin_search();
                let outcome = client.search(&session.query, session.search_by);
                session.apply_search(seq, outcome);
            }
        }

        if let Some(err) = session.error() {
            println!("搜索失败: {err}");
            continue;
        }
        if session.results().is_empty() {
            println!("未找到匹配图书。");
            continue;
        }

        println!(
            "展示 {} 条（共命中 {}）:",
            session.results().len(),
            session.total()
        );
        for (i, b) in session.results().iter().enumerate() {
            let year = b
                .first_publish_year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            println!(
                "{:>3}. {} | {} | {}",
                i + 1,
                b.title.as_deref().unwrap_or("N/A"),
                b.primary_author,
                year
            );
        }

        show_detail_loop(config, &client, &mut session)?;
    }

    println!("再见。");
    Ok(())
}

/// 在当前结果列表上反复选号看详情，回车返回搜索。
fn show_detail_loop(
    config: &Config,
    client: &CatalogClient,
    session: &mut Session,
) -> Result<()> {
    loop {
        let pick = read_line("输入序号查看详情（回车返回搜索）> ")?;
        let Some(pick) = pick else {
            session.go_back();
            return Ok(());
        };
        if pick.is_empty() {
            session.go_back();
            return Ok(());
        }
        let Ok(n) = pick.parse::<usize>() else {
            println!("无效序号: {pick}");
            continue;
        };
        let Some(token) = n.checked_sub(1).and_then(|i| session.select(i)) else {
            println!("序号超出范围: {n}");
            continue;
        };

        // 封面同步确认，无 ISBN 直接跳过
        match session.selected_isbn().map(str::to_string) {
            Some(isbn) => {
                info!("检查封面: isbn={isbn}");
                let url = client.resolve_cover(&isbn);
                session.apply_cover(token, url);
            }
            None => session.skip_cover(),
        }

        let Some(selection) = session.selection() else {
            continue;
        };
        let d = &selection.detail;
        println!("----------------------------------------");
        println!("标题:     {}", d.title);
        println!("作者:     {}", d.authors);
        println!("初版年份: {}", d.first_publish_year);
        println!("出版社:   {}", d.publishers);
        println!("语言:     {}", d.languages);
        // 主题列表经常很长，折行到 70 列免得刷屏
        let mut subject_lines = textwrap::wrap(&d.subjects, 70).into_iter();
        println!("主题:     {}", subject_lines.next().unwrap_or_default());
        for cont in subject_lines {
            println!("          {cont}");
        }
        println!("ISBN:     {}", d.isbn.as_deref().unwrap_or("N/A"));
        match session.cover() {
            Some(url) => println!("封面:     {url}"),
            None => println!("封面:     无"),
        }
        println!("----------------------------------------");

        if config.cover_preview
            && let Some(url) = session.cover().map(str::to_string)
        {
            let answer = read_line("在终端预览封面? [y/N]> ")?.unwrap_or_default();
            if answer.eq_ignore_ascii_case("y") {
                match client
                    .fetch_cover_bytes(&url)
                    .and_then(|bytes| ascii_preview(&bytes, 80, 40))
                {
                    Ok(lines) => {
                        for line in lines {
                            println!("{line}");
                        }
                    }
                    Err(err) => println!("封面加载失败: {err}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::read_trimmed;
    use std::io::Cursor;

    #[test]
    fn eof_yields_none() {
        assert!(read_trimmed(&mut Cursor::new("")).unwrap().is_none());
    }

    #[test]
    fn line_is_trimmed() {
        assert_eq!(
            read_trimmed(&mut Cursor::new("  hello \n")).unwrap().as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn blank_line_is_empty_not_eof() {
        assert_eq!(
            read_trimmed(&mut Cursor::new("\n")).unwrap().as_deref(),
            Some("")
        );
    }
}
