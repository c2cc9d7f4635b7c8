//! Session domain: conversations, messages, and the session store.

pub mod message;
pub mod model;
pub mod repository;
pub mod store;

pub use message::{GroundingSource, Message, MessagePatch, Role};
pub use model::ChatSession;
pub use repository::SessionRepository;
pub use store::SessionStore;
