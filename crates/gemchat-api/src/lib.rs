//! Streaming client for the external text-generation service
//!
//! This crate defines the client seam the session manager talks to
//! (`GenerativeClient`) and the HTTP implementation of it
//! (`GeminiClient`). The service yields a lazily-produced, finite,
//! non-restartable sequence of text chunks terminated by normal stream
//! end or an error.

use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use gemchat_types::Turn;

mod gemini_client;

pub use gemini_client::{GeminiClient, DEFAULT_BASE_URL};

/// Chunk sequence produced by a streaming generation call.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>>>>;

/// Seam to the text-generation service.
///
/// `?Send` because the browser build runs on a single-threaded event loop
/// and its futures are not `Send`.
#[async_trait(?Send)]
pub trait GenerativeClient {
    /// Open a streaming generation call for the given ordered turn
    /// sequence. Transport and auth failures surface as a single
    /// catchable error; failures after establishment surface as an
    /// `Err` item in the returned stream.
    async fn stream_generate(
        &self,
        api_key: &str,
        model: &str,
        turns: Vec<Turn>,
    ) -> Result<TextStream>;
}

/// Failure taxonomy for the streaming call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent at all.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service rejected the request (bad key, unknown model, quota).
    #[error("API request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response stream broke after it was established.
    #[error("error reading stream: {0}")]
    Stream(String),
}
