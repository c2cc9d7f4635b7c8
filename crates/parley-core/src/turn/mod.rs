//! Turn orchestration: the agent seam and the controller that folds a
//! response stream into the session store.

pub mod agent;
pub mod controller;

pub use agent::{ChatAgent, TurnChunk, TurnStream};
pub use controller::{TurnController, TurnOutcome};
