//! Conversation session management for gemchat
//!
//! This crate owns the ordered message log and the exchange lifecycle:
//! accepting a user message, streaming the assistant reply into the log
//! (or synthesizing a canned one when no API key is configured), and
//! surfacing failures as assistant-authored error entries. The UI layer
//! observes state snapshots and renders them; it never mutates the log
//! directly.

mod filler;
mod session;
mod store;


pub use filler::SIMULATED_DISCLAIMER;
pub use session::{
    ChatSession, NullObserver, SessionObserver, SessionState, ERROR_REPLY_PREFIX,
    SIMULATED_REPLY_DELAY_MS,
};
pub use store::{MemoryStore, PreferenceStore, API_KEY_PREF, DEFAULT_MODEL, MODEL_PREF};
