pub mod error;
pub mod session;
pub mod settings;
pub mod turn;

// Re-export common error type
pub use error::{ParleyError, Result};
