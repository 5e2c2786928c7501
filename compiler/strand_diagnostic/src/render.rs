//! Plain-text rendering with source excerpts.

use std::fmt::Write;

use strand_ir::Span;

use crate::Diagnostic;

/// Byte offsets of line starts, for O(log L) offset to `line:col` lookup.
#[derive(Clone, Debug, Default)]
pub struct LineOffsetTable {
    offsets: Vec<u32>,
}

impl LineOffsetTable {
    pub fn build(source: &str) -> Self {
        let mut offsets = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                offsets.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        LineOffsetTable { offsets }
    }

    /// 1-based line containing `offset`.
    pub fn line_from_offset(&self, offset: u32) -> u32 {
        let line_idx = match self.offsets.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        u32::try_from(line_idx).unwrap_or(u32::MAX - 1) + 1
    }

    /// 1-based `(line, column)`; the column counts characters.
    pub fn offset_to_line_col(&self, source: &str, offset: u32) -> (u32, u32) {
        let line = self.line_from_offset(offset);
        let line_start = self.offsets[(line - 1) as usize] as usize;
        let end = (offset as usize).min(source.len());
        let col = source
            .get(line_start..end)
            .map_or(0, |prefix| prefix.chars().count());
        (line, u32::try_from(col).unwrap_or(u32::MAX - 1) + 1)
    }

    /// Text of a 1-based line without its trailing newline.
    pub fn line_text<'s>(&self, source: &'s str, line: u32) -> &'s str {
        let idx = (line as usize).saturating_sub(1);
        let Some(&start) = self.offsets.get(idx) else {
            return "";
        };
        let end = self
            .offsets
            .get(idx + 1)
            .map_or(source.len(), |&next| next as usize);
        source
            .get(start as usize..end)
            .unwrap_or("")
            .trim_end_matches(['\n', '\r'])
    }
}

/// Render a diagnostic against its source text.
///
/// Each label prints its line with a caret underline; spans crossing a
/// line break are underlined to the end of their first line.
pub fn render(diagnostic: &Diagnostic, source: &str) -> String {
    let table = LineOffsetTable::build(source);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}[{}]: {}",
        diagnostic.severity, diagnostic.code, diagnostic.message
    );

    for label in &diagnostic.labels {
        render_label(&mut out, &table, source, label.span, &label.message, label.is_primary);
    }
    for note in &diagnostic.notes {
        let _ = writeln!(out, "  = note: {note}");
    }
    for suggestion in &diagnostic.suggestions {
        let _ = writeln!(out, "  = help: {suggestion}");
    }
    out
}

fn render_label(
    out: &mut String,
    table: &LineOffsetTable,
    source: &str,
    span: Span,
    message: &str,
    is_primary: bool,
) {
    let (line, col) = table.offset_to_line_col(source, span.start);
    let text = table.line_text(source, line);
    let gutter = line.to_string().len();
    let marker = if is_primary { '^' } else { '-' };

    let _ = writeln!(out, "{:gutter$}--> {line}:{col}", "");
    let _ = writeln!(out, "{:gutter$} |", "");
    let _ = writeln!(out, "{line} | {text}");

    let available = text.chars().count().saturating_sub(col as usize - 1);
    let width = (span.len() as usize).clamp(1, available.max(1));
    let _ = writeln!(
        out,
        "{:gutter$} | {:pad$}{} {message}",
        "",
        "",
        marker.to_string().repeat(width),
        pad = col as usize - 1,
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ErrorCode;

    #[test]
    fn line_lookup() {
        let source = "a = 1\nb = a\n";
        let table = LineOffsetTable::build(source);
        assert_eq!(table.offset_to_line_col(source, 0), (1, 1));
        assert_eq!(table.offset_to_line_col(source, 10), (2, 5));
        assert_eq!(table.line_text(source, 2), "b = a");
        assert_eq!(table.line_text(source, 9), "");
    }

    #[test]
    fn renders_caret_under_span() {
        let source = "x = 1\ny = x + z\n";
        let diag = Diagnostic::error(ErrorCode::E1001)
            .with_message("undefined value z")
            .with_label(Span::new(14, 15), "not found");
        assert_eq!(
            render(&diag, source),
            "error[E1001]: undefined value z\n \
             --> 2:9\n  |\n\
             2 | y = x + z\n  |         ^ not found\n"
        );
    }
}
