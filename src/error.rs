use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Boxed cause carried by render errors (setup hook failures and the like).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Position in template source (byte offset plus 0-indexed line/column)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// Byte offset in source
    pub byte: usize,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters)
    pub col: usize,
}

impl Position {
    pub fn new(byte: usize, line: usize, col: usize) -> Self {
        Self { byte, line, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// Byte offset -> line/column lookup for one source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    source: Arc<str>,
}

impl LineIndex {
    pub fn new(source: Arc<str>) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts, source }
    }

    pub fn position(&self, byte: usize) -> Position {
        let byte = byte.min(self.source.len());
        let line = match self.line_starts.binary_search(&byte) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let col = self.source[start..byte].chars().count();
        Position { byte, line, col }
    }
}

/// Errors raised while compiling or rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Compile-time failure: the enclosing template cannot be built.
    #[error("{template}:{position}: {message}")]
    Syntax {
        template: String,
        position: Position,
        message: String,
    },

    /// Render-time failure: aborts the current render call.
    #[error("{template}:{position}: {message}")]
    Render {
        template: String,
        position: Position,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The loader could not produce the template source.
    #[error("template '{name}' could not be loaded: {source}")]
    Load {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl TemplateError {
    pub fn syntax(template: &str, position: Position, message: impl Into<String>) -> Self {
        TemplateError::Syntax {
            template: template.to_string(),
            position,
            message: message.into(),
        }
    }

    pub fn render_error(template: &str, position: Position, message: impl Into<String>) -> Self {
        TemplateError::Render {
            template: template.to_string(),
            position,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the original cause to a render error (no-op for other kinds)
    pub fn with_source(mut self, cause: BoxError) -> Self {
        if let TemplateError::Render { source, .. } = &mut self {
            *source = Some(cause);
        }
        self
    }

    pub fn template(&self) -> &str {
        match self {
            TemplateError::Syntax { template, .. } | TemplateError::Render { template, .. } => template,
            TemplateError::Load { name, .. } => name,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            TemplateError::Syntax { position, .. } | TemplateError::Render { position, .. } => Some(*position),
            TemplateError::Load { .. } => None,
        }
    }

    /// Render the error with source context (no color)
    pub fn render(&self, source: &str) -> String {
        self.render_inner(source, false)
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str) -> String {
        self.render_inner(source, true)
    }

    fn render_inner(&self, source: &str, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let message = match self {
            TemplateError::Syntax { message, .. } | TemplateError::Render { message, .. } => message.clone(),
            TemplateError::Load { .. } => self.to_string(),
        };

        let mut output = String::new();
        output.push('\n');

        let Some(position) = self.position() else {
            output.push_str(&format!("{}error:{} {}\n\n", red, reset, message));
            return output;
        };

        output.push_str(&format!(" file: {}:{}\n", self.template(), position));
        output.push_str(&format!("{}error:{} {}\n", red, reset, message));

        if let Some(source_line) = source.lines().nth(position.line) {
            let line_no = position.line + 1;
            let width = format!("{}", line_no).len().max(2);
            output.push_str(&format!("{}{:>width$} |{}\n", dim, "", reset, width = width));
            output.push_str(&format!("{}{:>width$} |{} {}\n", dim, line_no, reset, source_line, width = width));

            // Underline up to the end of the tag that starts here
            let rest: String = source_line.chars().skip(position.col).collect();
            let underline_len = match rest.find("%}").or_else(|| rest.find("}}")) {
                Some(end) => rest[..end + 2].chars().count(),
                None => rest.chars().count().max(1),
            };
            output.push_str(&format!(
                "{}{:>width$} |{} {}{}{}{}\n",
                dim, "", reset,
                " ".repeat(position.col), red, "^".repeat(underline_len), reset,
                width = width
            ));
        }

        if let TemplateError::Render { source: Some(cause), .. } = self {
            output.push_str(&format!("\n caused by: {}\n", cause));
        }

        output.push('\n');
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index() {
        let index = LineIndex::new(Arc::from("ab\ncdé\nf"));
        assert_eq!(index.position(0), Position::new(0, 0, 0));
        assert_eq!(index.position(4), Position::new(4, 1, 1));
        assert_eq!(index.position(8), Position::new(8, 2, 0));
    }

    #[test]
    fn test_display_is_one_based() {
        let err = TemplateError::syntax("index.html", Position::new(10, 2, 4), "boom");
        assert_eq!(err.to_string(), "index.html:3:5: boom");
    }

    #[test]
    fn test_render_underlines_tag() {
        let source = "<p>\n{% component \"nope\" %}\n</p>";
        let err = TemplateError::syntax("index.html", Position::new(4, 1, 0), "component 'nope' can not be resolved.");
        let rendered = err.render(source);
        assert!(rendered.contains(" file: index.html:2:1"));
        assert!(rendered.contains("error: component 'nope' can not be resolved."));
        assert!(rendered.contains(&"^".repeat("{% component \"nope\" %}".len())));
    }

    #[test]
    fn test_render_error_keeps_cause() {
        let err = TemplateError::render_error("a", Position::default(), "setup failed")
            .with_source("database down".into());
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.render("x").contains("caused by: database down"));
    }
}
