pub mod configuration;
pub mod decoder;
pub mod errors;
pub mod handler;
pub mod highlight;
pub mod markdown;
pub mod models;
pub mod renderer;
pub mod target;

pub use errors::{StreamError, StreamResult};
pub use renderer::StreamRenderer;
