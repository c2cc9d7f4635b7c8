//! The external LLM capability: a Gemini REST API agent with streaming and
//! search grounding.

pub mod config;
pub mod gemini_api_agent;
mod sse;

pub use gemini_api_agent::GeminiApiAgent;
