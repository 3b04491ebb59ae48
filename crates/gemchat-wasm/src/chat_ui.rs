use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Document;

use gemchat_api::GeminiClient;
use gemchat_chat::{ChatSession, SessionObserver, SessionState};
use gemchat_types::{Author, Message};

use crate::dom;
use crate::markdown;
use crate::storage::LocalStore;

const MAX_INPUT_HEIGHT_PX: i32 = 120;

pub struct ChatApp {
    document: Document,
    session: Rc<ChatSession>,
    renderer: Rc<Renderer>,
}

impl ChatApp {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document"))?;

        let renderer = Rc::new(Renderer {
            document: document.clone(),
        });
        let session = Rc::new(ChatSession::new(
            Rc::new(GeminiClient::new()),
            Rc::new(LocalStore::new()),
            renderer.clone(),
        ));

        Ok(Self {
            document,
            session,
            renderer,
        })
    }

    pub fn start(self) -> Result<(), JsValue> {
        self.setup_message_input()?;
        self.setup_clear_button()?;
        self.setup_settings_modal()?;
        self.setup_example_prompts()?;

        // Initial paint before any interaction.
        self.session.with_state(|state| self.renderer.render(state))?;

        Ok(())
    }

    fn setup_message_input(&self) -> Result<(), JsValue> {
        let input = dom::get_textarea_by_id(&self.document, "messageInput")?;

        // Auto-resize the textarea up to a fixed cap.
        let resize_target = input.clone();
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let _ = resize_target.style().set_property("height", "auto");
            let height = resize_target.scroll_height().min(MAX_INPUT_HEIGHT_PX);
            let _ = resize_target
                .style()
                .set_property("height", &format!("{}px", height));
        }) as Box<dyn FnMut(_)>);
        input.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref())?;
        closure.forget();

        // Enter sends, Shift+Enter inserts a newline.
        let session = self.session.clone();
        let document = self.document.clone();
        let closure = Closure::wrap(Box::new(move |event: web_sys::KeyboardEvent| {
            if event.key() == "Enter" && !event.shift_key() {
                event.prevent_default();
                if let Err(e) = submit_message(&session, &document) {
                    log::error!("failed to send message: {:?}", e);
                }
            }
        }) as Box<dyn FnMut(_)>);
        input.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();

        let send_btn = dom::get_element_by_id(&self.document, "sendButton")?;
        let session = self.session.clone();
        let document = self.document.clone();
        dom::add_click_listener(&send_btn, move || {
            if let Err(e) = submit_message(&session, &document) {
                log::error!("failed to send message: {:?}", e);
            }
        })?;

        Ok(())
    }

    fn setup_clear_button(&self) -> Result<(), JsValue> {
        let clear_btn = dom::get_element_by_id(&self.document, "clearButton")?;
        let session = self.session.clone();
        dom::add_click_listener(&clear_btn, move || {
            let confirmed = web_sys::window()
                .and_then(|w| {
                    w.confirm_with_message("Are you sure you want to clear all messages?")
                        .ok()
                })
                .unwrap_or(false);
            if confirmed {
                session.clear_messages();
            }
        })?;
        Ok(())
    }

    fn setup_settings_modal(&self) -> Result<(), JsValue> {
        let open_btn = dom::get_element_by_id(&self.document, "settingsButton")?;
        let session = self.session.clone();
        let document = self.document.clone();
        dom::add_click_listener(&open_btn, move || {
            if let Err(e) = open_settings(&session, &document) {
                log::error!("failed to open settings: {:?}", e);
            }
        })?;

        for id in ["settingsCancel", "settingsBackdrop"] {
            let element = dom::get_element_by_id(&self.document, id)?;
            let document = self.document.clone();
            dom::add_click_listener(&element, move || {
                let _ = close_settings(&document);
            })?;
        }

        let save_btn = dom::get_element_by_id(&self.document, "settingsSave")?;
        let session = self.session.clone();
        let document = self.document.clone();
        dom::add_click_listener(&save_btn, move || {
            if let Err(e) = save_settings(&session, &document) {
                log::error!("failed to save settings: {:?}", e);
            }
        })?;

        Ok(())
    }

    fn setup_example_prompts(&self) -> Result<(), JsValue> {
        let cards = self.document.query_selector_all(".example-prompt")?;
        for i in 0..cards.length() {
            if let Some(node) = cards.item(i) {
                if let Ok(card) = node.dyn_into::<web_sys::Element>() {
                    if let Some(prompt) = card.get_attribute("data-prompt") {
                        let session = self.session.clone();
                        dom::add_click_listener(&card, move || {
                            let session = session.clone();
                            let prompt = prompt.clone();
                            wasm_bindgen_futures::spawn_local(async move {
                                session.send_message(&prompt).await;
                            });
                        })?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Read, validate and dispatch the input box content.
fn submit_message(session: &Rc<ChatSession>, document: &Document) -> Result<(), JsValue> {
    let input = dom::get_textarea_by_id(document, "messageInput")?;
    let text = input.value().trim().to_string();

    if text.is_empty() || session.is_busy() {
        return Ok(());
    }

    input.set_value("");
    let _ = input.style().set_property("height", "auto");

    let session = session.clone();
    wasm_bindgen_futures::spawn_local(async move {
        session.send_message(&text).await;
    });

    Ok(())
}

fn open_settings(session: &Rc<ChatSession>, document: &Document) -> Result<(), JsValue> {
    dom::get_input_by_id(document, "apiKeyInput")?.set_value(&session.api_key());
    dom::get_select_by_id(document, "modelSelect")?.set_value(&session.model());
    dom::show_element(&dom::get_html_element_by_id(document, "settingsModal")?);
    Ok(())
}

fn close_settings(document: &Document) -> Result<(), JsValue> {
    dom::hide_element(&dom::get_html_element_by_id(document, "settingsModal")?);
    Ok(())
}

fn save_settings(session: &Rc<ChatSession>, document: &Document) -> Result<(), JsValue> {
    let key = dom::get_input_by_id(document, "apiKeyInput")?.value();
    let model = dom::get_select_by_id(document, "modelSelect")?.value();

    session.set_api_key(key.trim());
    session.set_model(&model);

    close_settings(document)
}

/// Repaints the page from a session state snapshot after every mutation.
struct Renderer {
    document: Document,
}

impl SessionObserver for Renderer {
    fn state_changed(&self, state: &SessionState) {
        if let Err(e) = self.render(state) {
            log::error!("render failed: {:?}", e);
        }
    }
}

impl Renderer {
    fn render(&self, state: &SessionState) -> Result<(), JsValue> {
        self.render_header(state)?;
        self.render_messages(state)?;
        self.render_input(state)?;
        Ok(())
    }

    fn render_header(&self, state: &SessionState) -> Result<(), JsValue> {
        let count = dom::get_element_by_id(&self.document, "messageCount")?;
        if state.messages.is_empty() {
            count.set_text_content(Some("Ready to help"));
        } else {
            count.set_text_content(Some(&format!("{} messages", state.messages.len())));
        }

        let clear_btn = dom::get_html_element_by_id(&self.document, "clearButton")?;
        if state.messages.is_empty() {
            dom::hide_element(&clear_btn);
        } else {
            dom::show_element(&clear_btn);
        }
        Ok(())
    }

    fn render_messages(&self, state: &SessionState) -> Result<(), JsValue> {
        let container = dom::get_element_by_id(&self.document, "messagesContainer")?;
        let welcome = dom::get_html_element_by_id(&self.document, "welcomeScreen")?;

        if state.messages.is_empty() && !state.busy {
            dom::clear_element(&container);
            dom::show_element(&welcome);
            return Ok(());
        }
        dom::hide_element(&welcome);

        let mut html = String::new();
        for msg in &state.messages {
            html.push_str(&message_html(msg));
        }
        if state.composing && !streaming_has_text(state) {
            html.push_str(
                r#"<div class="message assistant typing"><span class="dot"></span><span class="dot"></span><span class="dot"></span></div>"#,
            );
        }
        container.set_inner_html(&html);
        dom::scroll_to_bottom(&container);
        Ok(())
    }

    fn render_input(&self, state: &SessionState) -> Result<(), JsValue> {
        dom::get_textarea_by_id(&self.document, "messageInput")?.set_disabled(state.busy);
        dom::get_button_by_id(&self.document, "sendButton")?.set_disabled(state.busy);
        Ok(())
    }
}

/// Streamed content has started arriving for the in-flight exchange.
fn streaming_has_text(state: &SessionState) -> bool {
    state
        .messages
        .last()
        .map(|m| m.author == Author::Assistant && !m.text.is_empty())
        .unwrap_or(false)
}

/// One message bubble.
fn message_html(msg: &Message) -> String {
    let (class, use_markdown) = match msg.author {
        Author::User => ("user", false),
        Author::Assistant => ("assistant", true),
    };
    let content = markdown::render_message_content(&msg.text, use_markdown);
    format!(
        r#"<div class="message {}"><div class="message-content">{}</div><div class="message-time">{}</div></div>"#,
        class,
        content,
        msg.created_at.format("%H:%M"),
    )
}
