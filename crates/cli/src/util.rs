use unicode_width::UnicodeWidthStr;

use mailmatch_engine::Dataset;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
/// Uses Unicode display width so CJK/emoji alignment stays correct.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if width < 3 {
        for ch in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
            if cw <= width {
                return ch.to_string();
            }
        }
        return String::new();
    }

    if display_width(s) <= width {
        return s.to_string();
    }

    // Stop at width - 2 to leave room for ".."
    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// Aligned text table of the first `max_rows` rows.
///
/// Each column is as wide as its widest shown cell, capped at `max_width`.
pub(crate) fn render_preview(dataset: &Dataset, max_rows: usize, max_width: usize) -> String {
    let shown = &dataset.rows()[..dataset.row_count().min(max_rows)];

    let widths: Vec<usize> = dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(c, name)| {
            shown
                .iter()
                .map(|r| display_width(r[c].as_field()))
                .chain(std::iter::once(display_width(name)))
                .max()
                .unwrap_or(0)
                .min(max_width)
        })
        .collect();

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| pad_right(cell, w))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&line(dataset.columns().iter().map(|s| s.as_str()).collect()));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&line(rule.iter().map(String::as_str).collect()));
    out.push('\n');
    for row in shown {
        out.push_str(&line(row.iter().map(|v| v.as_field()).collect()));
        out.push('\n');
    }
    if dataset.row_count() > shown.len() {
        out.push_str(&format!("... {} more row(s)\n", dataset.row_count() - shown.len()));
    }
    out
}
