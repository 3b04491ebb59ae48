//! Core types and structures for gemchat
//!
//! This crate provides the conversation log entry type shared by the
//! session manager and the UI, and the wire types exchanged with the
//! generative-text API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Conversation log types
// ============================================================================

/// Who produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

impl Author {
    /// Map to the role tag the generation API expects.
    pub fn role(self) -> Role {
        match self {
            Author::User => Role::User,
            Author::Assistant => Role::Model,
        }
    }
}

/// One entry in the conversation log.
///
/// `text` starts empty for a streaming assistant entry and grows by
/// append-only concatenation while chunks arrive. `id` and `created_at`
/// are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(author: Author, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            author,
            created_at: Utc::now(),
        }
    }

    /// A completed user entry.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Author::User, text.into())
    }

    /// An assistant entry; pass an empty string for a streaming placeholder.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Author::Assistant, text.into())
    }
}

// ============================================================================
// Wire types (generateContent request/response shapes)
// ============================================================================

/// Role tag on a conversation turn as the API defines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One piece of turn content. Only text parts are produced or consumed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// One ordered conversation turn in a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl From<&Message> for Turn {
    fn from(msg: &Message) -> Self {
        Turn {
            role: msg.author.role(),
            parts: vec![Part {
                text: msg.text.clone(),
            }],
        }
    }
}

/// Body of a streaming generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub contents: Vec<Turn>,
}

/// One parsed server-sent event of a streaming generation response.
///
/// Fields the client does not consume are left out; serde ignores them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl StreamChunk {
    /// Concatenated text of the first candidate's parts, empty if absent.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// One response candidate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Content block of a candidate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Error body the API returns on a rejected request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: ApiErrorDetail,
}

/// Detail record inside an error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}
