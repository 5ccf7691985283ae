pub mod request;
pub mod state;

pub use request::{ChatHistory, ChatRequest, ChatTurn, Role};
pub use state::{StreamBuffer, UiState};
