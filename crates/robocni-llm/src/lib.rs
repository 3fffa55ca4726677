//! robocni-llm: client for the text generation service
//!
//! Sends a prompt to an Ollama-style `/api/generate` endpoint and
//! reassembles the newline-delimited JSON reply stream into one string.
//!
//! ## Key Components
//!
//! - `OllamaClient`: implements `robocni_core::ModelQuery` over HTTP
//! - `NdjsonDecoder`: chunk-boundary-safe line decoder for the reply body

pub mod client;
pub mod ndjson;

pub use client::{OllamaClient, OllamaConfig, DEFAULT_MODEL, DEFAULT_PORT};
pub use ndjson::{GenerateFragment, NdjsonDecoder};
