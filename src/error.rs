//! Crate-level error type and source-annotated reporting

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::config::ConfigError;
use crate::directive::{NameError, ResolveError};
use crate::page::{HostError, MarkupError};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Any failure of the library's entry points
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("namespace error: {0}")]
    Name(#[from] NameError),

    #[error("resolution failed {0}")]
    Resolve(#[from] ResolveError),

    #[error("{0}")]
    Host(#[from] HostError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl From<MarkupError> for Error {
    fn from(err: MarkupError) -> Self {
        Error::Host(HostError::Markup(err))
    }
}

impl Error {
    /// Span in the input the error points at, when known
    pub fn span(&self, source: &str) -> Option<Span> {
        match self {
            Error::Host(HostError::Markup(err)) => Some(err.span().clone()),
            Error::Json(err) if err.line() > 0 => {
                let start = offset_of(source, err.line(), err.column());
                Some(start..(start + 1).min(source.len()).max(start))
            }
            _ => None,
        }
    }

    /// Format the error with source context using ariadne
    ///
    /// Errors without a position in `source` format as their message.
    pub fn format(&self, source: &str, filename: &str) -> String {
        self.format_with(source, filename, true)
    }

    pub fn format_with(&self, source: &str, filename: &str, color: bool) -> String {
        if let Error::Host(HostError::Markup(err)) = self {
            return err.format_with(source, filename, color);
        }
        let Some(span) = self.span(source) else {
            return self.to_string();
        };
        let span = char_span(source, &span);
        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_config(Config::default().with_color(color))
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message("here")
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        match (written, String::from_utf8(buf)) {
            (Ok(()), Ok(report)) => report,
            _ => self.to_string(),
        }
    }
}

/// Convert a byte span into the char span ariadne expects
pub(crate) fn char_span(source: &str, span: &Span) -> Span {
    let chars_before = |offset: usize| source.char_indices().take_while(|(i, _)| *i < offset).count();
    chars_before(span.start)..chars_before(span.end)
}

/// Byte offset of a one-based line and column
fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_span() {
        let source = "{\n  \"cls\": Map\n}";
        let err: Error = serde_json::from_str::<serde_json::Value>(source)
            .unwrap_err()
            .into();
        let span = err.span(source).unwrap();
        assert_eq!(source[..span.start].matches('\n').count(), 1);
        let report = err.format_with(source, "map.json", false);
        assert!(report.contains("map.json"));
        assert!(report.contains("invalid JSON"));
    }

    #[test]
    fn test_unpositioned_error_formats_as_message() {
        let err = Error::Name(NameError::Duplicate {
            path: "LatLng".to_string(),
        });
        assert_eq!(err.format("", "x"), err.to_string());
    }

    #[test]
    fn test_char_span() {
        assert_eq!(char_span("ab", &(1..2)), 1..2);
        assert_eq!(char_span("ñañ", &(2..3)), 1..2);
        assert_eq!(char_span("ñañ", &(3..5)), 2..3);
    }

    #[test]
    fn test_json_error_report_after_multibyte_text() {
        let source = "{\"title\": \"Señor Café\", \"zoom\": }";
        let err: Error = serde_json::from_str::<serde_json::Value>(source)
            .unwrap_err()
            .into();
        let report = err.format_with(source, "map.json", false);
        assert!(report.contains("map.json"));
        assert!(report.contains("here"));
    }

    #[test]
    fn test_offset_of() {
        assert_eq!(offset_of("ab\ncd", 2, 2), 4);
        assert_eq!(offset_of("ab", 1, 1), 0);
        assert_eq!(offset_of("ab", 5, 9), 2);
    }
}
