use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;
use chrono::Utc;
use futures_util::StreamExt;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use gemchat_api::GenerativeClient;
use gemchat_types::{Message, Turn};

use crate::filler::simulated_reply;
use crate::store::{PreferenceStore, API_KEY_PREF, DEFAULT_MODEL, MODEL_PREF};

/// Delay before a simulated reply lands, so the typing indicator shows.
pub const SIMULATED_REPLY_DELAY_MS: u32 = 600;

/// Prefix of the assistant-authored entry appended on a failed exchange.
pub const ERROR_REPLY_PREFIX: &str = "There was an error generating a response.";

/// Session state the UI renders from.
///
/// Invariant: `composing` implies `busy`. The only entry ever mutated
/// after creation is the assistant placeholder of the in-flight exchange.
#[derive(Debug, Default)]
pub struct SessionState {
    pub messages: Vec<Message>,
    pub busy: bool,
    pub composing: bool,
}

/// Receives a read-only state snapshot after every mutation.
pub trait SessionObserver {
    fn state_changed(&self, state: &SessionState);
}

/// Observer that ignores updates.
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn state_changed(&self, _state: &SessionState) {}
}

/// Conversation session manager.
///
/// Single-threaded and cooperative: state lives behind `Rc<RefCell<_>>`
/// and borrows are never held across an await point, so the advisory
/// `busy` guard is the only exchange-level coordination needed.
pub struct ChatSession {
    state: Rc<RefCell<SessionState>>,
    client: Rc<dyn GenerativeClient>,
    store: Rc<dyn PreferenceStore>,
    observer: Rc<dyn SessionObserver>,
    api_key: RefCell<String>,
    model: RefCell<String>,
    rng: RefCell<SmallRng>,
    generation: Cell<u64>,
}

impl ChatSession {
    /// Create a session, loading the API key and model preference from
    /// the store. An absent or empty key leaves the session in the
    /// simulated-reply fallback mode.
    pub fn new(
        client: Rc<dyn GenerativeClient>,
        store: Rc<dyn PreferenceStore>,
        observer: Rc<dyn SessionObserver>,
    ) -> Self {
        let seed = Utc::now().timestamp_millis() as u64;
        Self::with_seed(client, store, observer, seed)
    }

    /// Like [`ChatSession::new`] with a fixed seed for the filler-reply
    /// selection.
    pub fn with_seed(
        client: Rc<dyn GenerativeClient>,
        store: Rc<dyn PreferenceStore>,
        observer: Rc<dyn SessionObserver>,
        seed: u64,
    ) -> Self {
        let api_key = store.get(API_KEY_PREF).unwrap_or_default();
        let model = store
            .get(MODEL_PREF)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            state: Rc::new(RefCell::new(SessionState::default())),
            client,
            store,
            observer,
            api_key: RefCell::new(api_key),
            model: RefCell::new(model),
            rng: RefCell::new(SmallRng::seed_from_u64(seed)),
            generation: Cell::new(0),
        }
    }

    pub fn api_key(&self) -> String {
        self.api_key.borrow().clone()
    }

    pub fn model(&self) -> String {
        self.model.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().busy
    }

    pub fn is_composing(&self) -> bool {
        self.state.borrow().composing
    }

    pub fn message_count(&self) -> usize {
        self.state.borrow().messages.len()
    }

    /// Read access to the current state snapshot.
    pub fn with_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Run one exchange: append the user entry, then resolve the
    /// assistant reply through the configured provider or the simulated
    /// fallback. A call while an exchange is in flight is a no-op.
    ///
    /// Callers are expected to pass trimmed, non-empty text.
    pub async fn send_message(&self, text: &str) {
        if self.state.borrow().busy {
            log::debug!("send ignored: an exchange is already in flight");
            return;
        }

        {
            let mut state = self.state.borrow_mut();
            state.messages.push(Message::user(text));
            state.busy = true;
            state.composing = true;
        }
        self.notify();

        let generation = self.generation.get();
        if self.api_key.borrow().is_empty() {
            self.simulated_exchange(generation).await;
        } else {
            self.streaming_exchange(generation).await;
        }
    }

    /// Empty the log unconditionally. An in-flight exchange is not
    /// cancelled, but its remaining output is abandoned: the bumped
    /// generation makes late chunks, replies, and error entries land
    /// nowhere instead of resurrecting content onto the cleared log.
    pub fn clear_messages(&self) {
        self.generation.set(self.generation.get() + 1);
        self.state.borrow_mut().messages.clear();
        self.notify();
    }

    /// Update the API key; an empty value removes the persisted entry
    /// rather than storing an empty string.
    pub fn set_api_key(&self, value: &str) {
        *self.api_key.borrow_mut() = value.to_string();
        if value.is_empty() {
            self.store.remove(API_KEY_PREF);
        } else {
            self.store.set(API_KEY_PREF, value);
        }
    }

    /// Update the model name; persisted only when non-empty.
    pub fn set_model(&self, value: &str) {
        *self.model.borrow_mut() = value.to_string();
        if !value.is_empty() {
            self.store.set(MODEL_PREF, value);
        }
    }

    async fn simulated_exchange(&self, generation: u64) {
        delay_ms(SIMULATED_REPLY_DELAY_MS).await;

        let reply = simulated_reply(&mut self.rng.borrow_mut());
        {
            let mut state = self.state.borrow_mut();
            state.composing = false;
            state.busy = false;
            if self.generation.get() == generation {
                state.messages.push(Message::assistant(reply));
            }
        }
        self.notify();
    }

    async fn streaming_exchange(&self, generation: u64) {
        let outcome = self.stream_reply(generation).await;

        {
            let mut state = self.state.borrow_mut();
            state.composing = false;
            state.busy = false;
            if let Err(e) = outcome {
                log::warn!("exchange failed: {:#}", e);
                if self.generation.get() == generation {
                    state
                        .messages
                        .push(Message::assistant(format!("{} {:#}", ERROR_REPLY_PREFIX, e)));
                }
            }
        }
        self.notify();
    }

    async fn stream_reply(&self, generation: u64) -> Result<()> {
        let turns: Vec<Turn> = self
            .state
            .borrow()
            .messages
            .iter()
            .map(Turn::from)
            .collect();
        let api_key = self.api_key.borrow().clone();
        let model = self.model.borrow().clone();

        // The placeholder goes in before any data arrives; chunks then
        // grow it in place. On failure it is left as-is.
        let placeholder_id = {
            let mut state = self.state.borrow_mut();
            let placeholder = Message::assistant("");
            let id = placeholder.id;
            state.messages.push(placeholder);
            id
        };
        self.notify();

        let mut chunks = self.client.stream_generate(&api_key, &model, turns).await?;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            if self.generation.get() != generation {
                log::debug!("discarding stream output for a cleared conversation");
                return Ok(());
            }
            {
                let mut state = self.state.borrow_mut();
                if let Some(entry) = state
                    .messages
                    .iter_mut()
                    .find(|m| m.id == placeholder_id)
                {
                    entry.text.push_str(&chunk);
                }
            }
            self.notify();
        }

        Ok(())
    }

    fn notify(&self) {
        self.observer.state_changed(&self.state.borrow());
    }
}

#[cfg(target_arch = "wasm32")]
async fn delay_ms(ms: u32) {
    gloo_timers::future::TimeoutFuture::new(ms).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn delay_ms(ms: u32) {
    tokio::time::sleep(std::time::Duration::from_millis(ms.into())).await;
}
