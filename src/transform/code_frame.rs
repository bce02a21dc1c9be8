//! Source excerpts pointing at an error location

use colored::Colorize;

/// Lines of context shown above and below the offending line
const CONTEXT_LINES: usize = 2;

/// Render a code frame around `line`:`column` (both 1-indexed).
///
/// ```text
///   1 | function f() {
/// > 2 |   return (1;
///     |          ^
///   3 | }
/// ```
pub fn code_frame(source: &str, line: usize, column: usize, highlight: bool) -> String {
    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let line = line.clamp(1, lines.len());
    let first = line.saturating_sub(CONTEXT_LINES).max(1);
    let last = (line + CONTEXT_LINES).min(lines.len());
    let gutter_width = last.to_string().len();

    let mut frame = Vec::with_capacity(last - first + 2);
    for number in first..=last {
        let text = lines[number - 1];
        let gutter = format!("{:>width$} |", number, width = gutter_width);

        if number == line {
            let marker = if highlight {
                ">".red().bold().to_string()
            } else {
                ">".to_string()
            };
            frame.push(format!("{} {} {}", marker, gutter, text).trim_end().to_string());

            // Keep tabs so the caret lines up with the source
            let padding: String = text
                .chars()
                .take(column.saturating_sub(1))
                .map(|c| if c == '\t' { '\t' } else { ' ' })
                .collect();
            let caret = if highlight {
                "^".red().bold().to_string()
            } else {
                "^".to_string()
            };
            frame.push(format!(
                "  {:>width$} | {}{}",
                "",
                padding,
                caret,
                width = gutter_width
            ));
        } else {
            frame.push(format!("  {} {}", gutter, text).trim_end().to_string());
        }
    }

    frame.join("\n")
}
