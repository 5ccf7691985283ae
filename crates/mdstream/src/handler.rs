//! Named client-side handlers, registered explicitly at start-up.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{StreamError, StreamResult};
use crate::models::{ChatRequest, UiState};
use crate::renderer::StreamRenderer;
use crate::target::RenderTarget;

pub const CLIENTSIDE_NAMESPACE: &str = "clientside";
pub const STREAMING_CHAT_HANDLER: &str = "streaming_chat";

/// Inputs a UI callback passes to a handler, in callback order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub formatted_context: String,
    /// Only there so the callback fires on every click. Never read.
    pub n_clicks: u64,
    pub prompt: String,
    pub chat_history: String,
}

impl Invocation {
    pub fn to_request(&self) -> ChatRequest {
        ChatRequest::new(
            self.prompt.clone(),
            self.formatted_context.clone(),
            self.chat_history.clone(),
        )
    }
}

#[async_trait]
pub trait ClientsideHandler: Send + Sync {
    async fn call(
        &self,
        invocation: &Invocation,
        target: &mut dyn RenderTarget,
    ) -> StreamResult<UiState>;
}

/// Streams a chat reply into the target.
pub struct StreamingChatHandler {
    renderer: StreamRenderer,
}

impl StreamingChatHandler {
    pub fn new(renderer: StreamRenderer) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl ClientsideHandler for StreamingChatHandler {
    async fn call(
        &self,
        invocation: &Invocation,
        target: &mut dyn RenderTarget,
    ) -> StreamResult<UiState> {
        self.renderer.run(&invocation.to_request(), target).await
    }
}

#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ClientsideHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` as `namespace.function`, replacing any previous
    /// handler under that name.
    pub fn register(
        &mut self,
        namespace: &str,
        function: &str,
        handler: Arc<dyn ClientsideHandler>,
    ) -> &mut Self {
        let name = qualified_name(namespace, function);
        tracing::debug!(handler = %name, "registering clientside handler");
        self.handlers.insert(name, handler);
        self
    }

    pub fn get(&self, namespace: &str, function: &str) -> Option<Arc<dyn ClientsideHandler>> {
        self.handlers
            .get(&qualified_name(namespace, function))
            .cloned()
    }

    pub fn contains(&self, namespace: &str, function: &str) -> bool {
        self.handlers
            .contains_key(&qualified_name(namespace, function))
    }

    pub async fn dispatch(
        &self,
        namespace: &str,
        function: &str,
        invocation: &Invocation,
        target: &mut dyn RenderTarget,
    ) -> StreamResult<UiState> {
        let handler = self
            .get(namespace, function)
            .ok_or_else(|| StreamError::UnknownHandler(qualified_name(namespace, function)))?;
        handler.call(invocation, target).await
    }
}

/// Registers the handlers this crate provides. Call once during
/// application start-up.
pub fn register_default_handlers(registry: &mut HandlerRegistry, renderer: StreamRenderer) {
    registry.register(
        CLIENTSIDE_NAMESPACE,
        STREAMING_CHAT_HANDLER,
        Arc::new(StreamingChatHandler::new(renderer)),
    );
}

fn qualified_name(namespace: &str, function: &str) -> String {
    format!("{}.{}", namespace, function)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Settings;
    use crate::target::MemoryTarget;

    struct EchoHandler;

    #[async_trait]
    impl ClientsideHandler for EchoHandler {
        async fn call(
            &self,
            invocation: &Invocation,
            target: &mut dyn RenderTarget,
        ) -> StreamResult<UiState> {
            target.replace(&invocation.prompt)?;
            Ok(UiState::finished(target.content()?))
        }
    }

    #[tokio::test]
    async fn test_dispatch_by_name() -> StreamResult<()> {
        let mut registry = HandlerRegistry::new();
        registry.register("test", "echo", Arc::new(EchoHandler));

        let invocation = Invocation {
            prompt: "ping".to_string(),
            ..Default::default()
        };
        let mut target = MemoryTarget::new();
        let state = registry
            .dispatch("test", "echo", &invocation, &mut target)
            .await?;

        assert_eq!(state, UiState::finished("ping"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_handler() {
        let registry = HandlerRegistry::new();
        let mut target = MemoryTarget::new();

        let result = registry
            .dispatch("clientside", "missing", &Invocation::default(), &mut target)
            .await;

        match result {
            Err(StreamError::UnknownHandler(name)) => assert_eq!(name, "clientside.missing"),
            other => panic!("Expected UnknownHandler, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_default_handlers_registered() -> StreamResult<()> {
        let mut registry = HandlerRegistry::new();
        register_default_handlers(&mut registry, StreamRenderer::new(&Settings::default())?);

        assert!(registry.contains(CLIENTSIDE_NAMESPACE, STREAMING_CHAT_HANDLER));

        // Empty prompt never reaches the network
        let mut target = MemoryTarget::new();
        let state = registry
            .dispatch(
                CLIENTSIDE_NAMESPACE,
                STREAMING_CHAT_HANDLER,
                &Invocation {
                    formatted_context: "ctx".to_string(),
                    n_clicks: 3,
                    ..Default::default()
                },
                &mut target,
            )
            .await?;
        assert_eq!(state, UiState::idle());
        Ok(())
    }

    #[test]
    fn test_invocation_to_request() {
        let invocation = Invocation {
            formatted_context: "ctx".to_string(),
            n_clicks: 7,
            prompt: "hi".to_string(),
            chat_history: r#"{"chat_history":[]}"#.to_string(),
        };
        assert_eq!(
            invocation.to_request(),
            ChatRequest::new("hi", "ctx", r#"{"chat_history":[]}"#)
        );
    }
}
