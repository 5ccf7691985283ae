//! Markdown to HTML, with code blocks routed through a highlighter hook.

use std::sync::Arc;

use pulldown_cmark_escape::escape_html;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::errors::{StreamError, StreamResult};
use crate::highlight::{CodeHighlighter, PlainHighlighter, SyntectHighlighter};

#[derive(Clone)]
pub struct MarkdownRenderer {
    options: Options,
    highlighter: Arc<dyn CodeHighlighter>,
}

impl MarkdownRenderer {
    pub fn new(highlighter: Arc<dyn CodeHighlighter>) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        Self {
            options,
            highlighter,
        }
    }

    pub fn plain() -> Self {
        Self::new(Arc::new(PlainHighlighter))
    }

    pub fn highlighted() -> Self {
        Self::new(Arc::new(SyntectHighlighter::new()))
    }

    /// Render the whole document. Output depends only on `source`.
    pub fn render(&self, source: &str) -> StreamResult<String> {
        let mut events = Vec::new();
        // (language, accumulated body) while inside a code block
        let mut code_block: Option<(Option<String>, String)> = None;

        for event in Parser::new_ext(source, self.options) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().map(str::to_string)
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, body)) = code_block.as_mut() {
                        body.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, body)) = code_block.take() {
                        let markup = self.code_block(&body, lang.as_deref())?;
                        events.push(Event::Html(CowStr::from(markup)));
                    }
                }
                other => events.push(other),
            }
        }

        let mut markup = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut markup, events.into_iter());
        Ok(markup)
    }

    fn code_block(&self, code: &str, lang: Option<&str>) -> StreamResult<String> {
        let highlighted = self.highlighter.highlight(code, lang)?;
        Ok(match lang {
            Some(lang) => {
                let mut class = String::with_capacity(lang.len());
                escape_html(&mut class, lang).map_err(|e| StreamError::Highlight(e.to_string()))?;
                format!(
                    "<pre><code class=\"language-{}\">{}</code></pre>\n",
                    class, highlighted
                )
            }
            None => format!("<pre><code>{}</code></pre>\n", highlighted),
        })
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::plain()
    }
}
