use pulldown_cmark_escape::escape_html;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::errors::{StreamError, StreamResult};

/// Hook invoked by the markdown transform for every code block.
///
/// Implementations return the markup that goes *inside* the `<code>`
/// element, so they are responsible for escaping the source text.
pub trait CodeHighlighter: Send + Sync {
    fn highlight(&self, code: &str, lang: Option<&str>) -> StreamResult<String>;
}

/// Escapes the code and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl CodeHighlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _lang: Option<&str>) -> StreamResult<String> {
        let mut escaped = String::with_capacity(code.len());
        escape_html(&mut escaped, code).map_err(|e| StreamError::Highlight(e.to_string()))?;
        Ok(escaped)
    }
}

/// Class-based highlighting, so the colour scheme lives in a stylesheet.
///
/// The syntax comes from the fence language when one is given and known,
/// otherwise it is guessed from the first line (shebangs, `<?xml`, ...),
/// otherwise the block is treated as plain text.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
        }
    }

    fn find_syntax(&self, code: &str, lang: Option<&str>) -> &SyntaxReference {
        lang.and_then(|token| self.syntaxes.find_syntax_by_token(token))
            .or_else(|| {
                code.lines()
                    .next()
                    .and_then(|first| self.syntaxes.find_syntax_by_first_line(first))
            })
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: Option<&str>) -> StreamResult<String> {
        let syntax = self.find_syntax(code, lang);
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, ClassStyle::Spaced);

        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|e| StreamError::Highlight(e.to_string()))?;
        }

        Ok(generator.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_highlighter_only_escapes() -> StreamResult<()> {
        let out = PlainHighlighter.highlight("if a < b && c > \"d\" {}\n", Some("rust"))?;
        assert_eq!(out, "if a &lt; b &amp;&amp; c &gt; &quot;d&quot; {}\n");
        Ok(())
    }

    #[test]
    fn test_syntect_uses_fence_language() -> StreamResult<()> {
        let highlighter = SyntectHighlighter::new();
        let out = highlighter.highlight("fn main() {}\n", Some("rust"))?;
        assert!(out.contains(r#"class="source rust""#), "got {out}");
        assert!(out.contains("main"));
        Ok(())
    }

    #[test]
    fn test_syntect_guesses_from_first_line() -> StreamResult<()> {
        let highlighter = SyntectHighlighter::new();
        let out = highlighter.highlight("#!/bin/bash\necho hi\n", None)?;
        assert!(out.contains("source shell"), "got {out}");
        Ok(())
    }

    #[test]
    fn test_syntect_falls_back_to_plain_text() -> StreamResult<()> {
        let highlighter = SyntectHighlighter::new();
        let out = highlighter.highlight("<b>just words</b>\n", Some("no-such-language"))?;
        assert!(out.contains("text plain"), "got {out}");
        assert!(out.contains("&lt;b&gt;"));
        Ok(())
    }
}
