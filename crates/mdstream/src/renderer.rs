use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::configuration::Settings;
use crate::decoder::Utf8Decoder;
use crate::errors::{StreamError, StreamResult};
use crate::markdown::MarkdownRenderer;
use crate::models::{ChatRequest, StreamBuffer, UiState};
use crate::target::RenderTarget;

/// Sends a prompt to the streaming chat endpoint and renders the reply into
/// a target as it arrives.
///
/// Every chunk re-renders the *whole* accumulated text and replaces the
/// target's content with the result. Failures are returned as they happen,
/// with no retry and no attempt to flush partial output.
#[derive(Clone)]
pub struct StreamRenderer {
    client: Client,
    url: String,
    markdown: MarkdownRenderer,
    strict_utf8: bool,
    error_for_status: bool,
}

impl StreamRenderer {
    pub fn new(settings: &Settings) -> StreamResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.server.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let markdown = if settings.render.highlight {
            MarkdownRenderer::highlighted()
        } else {
            MarkdownRenderer::plain()
        };

        Ok(Self {
            client,
            url: settings.server.url(),
            markdown,
            strict_utf8: settings.render.strict_utf8,
            error_for_status: settings.server.error_for_status,
        })
    }

    pub fn with_markdown(mut self, markdown: MarkdownRenderer) -> Self {
        self.markdown = markdown;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn markdown(&self) -> &MarkdownRenderer {
        &self.markdown
    }

    /// Run one invocation. An empty prompt returns `(false, "")` without
    /// touching the network or the target.
    pub async fn run<T>(&self, request: &ChatRequest, target: &mut T) -> StreamResult<UiState>
    where
        T: RenderTarget + ?Sized,
    {
        if request.prompt.is_empty() {
            debug!("empty prompt, nothing to send");
            return Ok(UiState::idle());
        }

        let response = self.send(request).await?;
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(StreamError::from));

        let buffer = self.render_stream(chunks, target).await?;

        // Read back what the target holds rather than reusing our own copy
        let output = target.content()?;
        info!(
            chunks = buffer.chunks(),
            text_len = buffer.len(),
            output_len = output.len(),
            "stream finished"
        );

        Ok(UiState::finished(output))
    }

    /// Decode, accumulate and render every chunk of `chunks` into `target`.
    pub async fn render_stream<S, T>(&self, chunks: S, target: &mut T) -> StreamResult<StreamBuffer>
    where
        S: Stream<Item = StreamResult<Bytes>>,
        T: RenderTarget + ?Sized,
    {
        futures::pin_mut!(chunks);

        let mut decoder = if self.strict_utf8 {
            Utf8Decoder::strict()
        } else {
            Utf8Decoder::new()
        };
        let mut buffer = StreamBuffer::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            let text = decoder.decode(&chunk)?;
            buffer.append_chunk(&text);
            debug!(
                chunk_bytes = chunk.len(),
                buffered = buffer.len(),
                "received chunk"
            );

            target.replace(&self.markdown.render(buffer.as_str())?)?;
        }

        let tail = decoder.finish()?;
        if !tail.is_empty() {
            buffer.append(&tail);
            target.replace(&self.markdown.render(buffer.as_str())?)?;
        }

        Ok(buffer)
    }

    async fn send(&self, request: &ChatRequest) -> StreamResult<Response> {
        debug!(url = %self.url, "sending streaming chat request");
        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            if self.error_for_status {
                let body = response.text().await.unwrap_or_default();
                return Err(StreamError::Status { status, body });
            }
            warn!(%status, "streaming chat returned an error status, rendering the body");
        }

        Ok(response)
    }
}
