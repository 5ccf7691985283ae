use serde::{Deserialize, Serialize};

/// What an invocation hands back to the caller's UI layer.
///
/// `busy == false` tells the caller it may re-enable whatever control
/// triggered the invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    pub busy: bool,
    pub output: String,
}

impl UiState {
    /// Result of an invocation that did nothing, e.g. for an empty prompt.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn finished(output: impl Into<String>) -> Self {
        Self {
            busy: false,
            output: output.into(),
        }
    }
}

impl From<UiState> for (bool, String) {
    fn from(state: UiState) -> Self {
        (state.busy, state.output)
    }
}

/// Text received so far in one invocation. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamBuffer {
    text: String,
    chunks: usize,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the decoded text of one chunk.
    pub fn append_chunk(&mut self, text: &str) {
        self.text.push_str(text);
        self.chunks += 1;
    }

    /// Append text that does not correspond to a chunk (decoder flush).
    pub fn append(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_is_not_busy_and_empty() {
        let (busy, output) = UiState::idle().into();
        assert!(!busy);
        assert_eq!(output, "");
    }

    #[test]
    fn test_buffer_grows_monotonically() {
        let mut buffer = StreamBuffer::new();
        let mut last_len = 0;
        for chunk in ["Hel", "lo **wor", "", "ld**"] {
            buffer.append_chunk(chunk);
            assert!(buffer.len() >= last_len);
            last_len = buffer.len();
        }
        assert_eq!(buffer.as_str(), "Hello **world**");
        assert_eq!(buffer.chunks(), 4);
    }
}
