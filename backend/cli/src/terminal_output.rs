//! Terminal output utilities: notes and table rendering.
//!
//! Notes go to stderr; stdout is reserved for command output.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

pub fn note_info(msg: &str) {
    if supports_color() {
        eprintln!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        eprintln!("INFO: {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        eprintln!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        eprintln!("OK: {msg}");
    }
}

/// Render a left-aligned table. Cells wider than `max_width` are cut with `…`.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], max_width: usize) -> String {
    let clip = |s: &str| -> String {
        if s.chars().count() > max_width {
            let mut cut: String = s.chars().take(max_width.saturating_sub(1)).collect();
            cut.push('…');
            cut
        } else {
            s.to_string()
        }
    };

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| clip(c)).collect())
        .collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(strip_ansi(cell).chars().count());
        }
    }

    let line = |cells: Vec<String>| format!("  {}  \n", cells.join("  ").trim_end());
    let pad = |s: &str, w: usize| {
        let visible = strip_ansi(s).chars().count();
        format!("{s}{}", " ".repeat(w.saturating_sub(visible)))
    };

    let mut out = String::new();
    out.push_str(&line(
        headers.iter().zip(&widths).map(|(h, w)| pad(h, *w)).collect(),
    ));
    out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in &rows {
        out.push_str(&line(
            widths
                .iter()
                .enumerate()
                .map(|(i, w)| pad(row.get(i).map(String::as_str).unwrap_or(""), *w))
                .collect(),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn renders_table() {
        let rows = vec![
            vec!["Fanta".to_string(), "4 bottles".to_string()],
            vec!["Parle-G".to_string(), "10 packs".to_string()],
        ];
        let table = render_table(&["product", "quantity"], &rows, 40);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("  product  quantity"));
        assert!(lines[2].contains("Fanta    4 bottles"));
    }

    #[test]
    fn long_cells_are_clipped() {
        let rows = vec![vec!["Flat 204, Sunrise Apartments, Sector 21".to_string()]];
        let table = render_table(&["address"], &rows, 10);
        assert!(table.contains("Flat 204,…"));
        assert!(!table.contains("Sunrise"));
    }
}
