//! 封面 ASCII 预览页。

use anyhow::Context as _;
use image::imageops::FilterType;

use super::*;

/// 亮度从暗到亮映射的字符表。
const PALETTE: &[u8] = b" .:-=+*#%@";

pub(super) fn handle_event_cover(app: &mut App, event: Event) -> Result<()> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            app.view = View::Detail;
            app.status = "已返回详情".to_string();
        }
        Event::Mouse(me) => {
            if matches!(me.kind, MouseEventKind::Down(_)) {
                app.view = View::Detail;
                app.status = "已返回详情".to_string();
            }
        }
        _ => {}
    }
    Ok(())
}

pub(super) fn draw_cover(frame: &mut ratatui::Frame, app: &mut App) {
    let (main, log_area) = super::split_with_log(frame.size());

    let lines: Vec<Line> = if app.cover_lines.is_empty() {
        vec![Line::from("封面尚未加载")]
    } else {
        app.cover_lines
            .iter()
            .map(|l| Line::from(l.as_str()))
            .collect()
    };

    let title = if app.cover_title.is_empty() {
        "封面预览 (任意键返回)".to_string()
    } else {
        format!("封面预览: {} (任意键返回)", app.cover_title)
    };
    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(body, main);

    super::render_log_box(frame, log_area, app);
}

/// 把封面图片字节缩放为适配终端的 ASCII 行。
///
/// 字符单元高约为宽的两倍，按 0.5 比例压缩行数以保持画面比例。
pub(crate) fn image_to_ascii(bytes: &[u8], term_w: u16, term_h: u16) -> Result<Vec<String>> {
    let img = image::load_from_memory(bytes).context("解析封面图片失败")?;
    let gray = img.to_luma8();

    let max_w = term_w.saturating_sub(4).clamp(16, 120) as u32;
    let max_h = term_h
        .saturating_sub(LOG_HEIGHT + 4)
        .clamp(8, 60) as u32;

    let (src_w, src_h) = (gray.width().max(1), gray.height().max(1));
    let scale = f64::min(
        max_w as f64 / src_w as f64,
        max_h as f64 / (src_h as f64 * 0.5),
    );
    let out_w = ((src_w as f64 * scale) as u32).max(1);
    let out_h = ((src_h as f64 * scale * 0.5) as u32).max(1);

    let resized = image::imageops::resize(&gray, out_w, out_h, FilterType::Triangle);

    let mut lines = Vec::with_capacity(out_h as usize);
    for row in resized.rows() {
        let mut line = String::with_capacity(out_w as usize);
        for px in row {
            let idx = px.0[0] as usize * (PALETTE.len() - 1) / 255;
            line.push(PALETTE[idx] as char);
        }
        lines.push(line);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::image_to_ascii;
    use image::{GrayImage, Luma};

    fn png_bytes(w: u32, h: u32, fill: u8) -> Vec<u8> {
        let img = GrayImage::from_pixel(w, h, Luma([fill]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn ascii_fits_terminal_bounds() {
        let bytes = png_bytes(300, 450, 128);
        let lines = image_to_ascii(&bytes, 80, 24).unwrap();
        assert!(!lines.is_empty());
        assert!(lines.len() <= 60);
        assert!(lines.iter().all(|l| l.chars().count() <= 120));
    }

    #[test]
    fn dark_image_maps_to_dark_glyphs() {
        let bytes = png_bytes(64, 64, 0);
        let lines = image_to_ascii(&bytes, 80, 24).unwrap();
        assert!(lines.iter().all(|l| l.chars().all(|c| c == ' ')));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(image_to_ascii(b"not an image", 80, 24).is_err());
    }
}
