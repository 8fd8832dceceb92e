use crate::state::{Entry, EntryState, Speaker};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Split the frame into transcript, input, and status rows.
pub fn split_layout(area: Rect) -> (Rect, Rect, Rect) {
    let reserved = 2u16.min(area.height);
    let transcript = Rect {
        height: area.height - reserved,
        ..area
    };
    let input = Rect {
        y: area.y + transcript.height,
        height: reserved.min(1),
        ..area
    };
    let status = Rect {
        y: input.y + input.height,
        height: reserved.saturating_sub(1),
        ..area
    };
    (transcript, input, status)
}

pub fn transcript_lines(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(entry_line).collect()
}

fn entry_line(entry: &Entry) -> String {
    let speaker = match entry.speaker {
        Speaker::User => "you",
        Speaker::Bot => "bot",
    };
    let mut line = format!("{speaker}: {}", entry.text);
    if let Some(label) = &entry.label {
        line.push_str(&format!(" [{label}]"));
    }
    if entry.state == EntryState::Streaming {
        line.push('▌');
    }
    line
}

pub fn render_transcript(frame: &mut Frame<'_>, area: Rect, lines: &[String], scroll: usize) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let body = lines.join("\n");
    let paragraph = Paragraph::new(body)
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false })
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);
}

pub fn render_input(frame: &mut Frame<'_>, area: Rect, input: &str, cursor_byte: usize) {
    if area.height == 0 || area.width <= 2 {
        return;
    }

    let line = Line::from(format!("> {input}"));
    frame.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::Gray).add_modifier(Modifier::DIM)),
        area,
    );

    let cursor_col = 2 + UnicodeWidthStr::width(&input[..cursor_byte]);
    let cursor_x = area
        .x
        .saturating_add(cursor_col as u16)
        .min(area.x + area.width.saturating_sub(1));
    frame.set_cursor_position((cursor_x, area.y));
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let text = truncate_line(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

/// Byte index of the char boundary left of `idx`.
pub fn prev_char_boundary(s: &str, idx: usize) -> usize {
    s[..idx].char_indices().last().map(|(i, _)| i).unwrap_or(0)
}

/// Byte index of the char boundary right of `idx`.
pub fn next_char_boundary(s: &str, idx: usize) -> usize {
    s[idx..]
        .chars()
        .next()
        .map(|c| idx + c.len_utf8())
        .unwrap_or(idx)
}

fn truncate_line(input: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::new();
    let mut used = 0usize;

    for ch in input.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }

    out
}
