//! Browser front end for gemchat
//!
//! Wires the conversation session manager to the DOM: message list,
//! input box, header, welcome panel, and the settings modal.

use wasm_bindgen::prelude::*;

mod chat_ui;
mod dom;
mod markdown;
mod storage;
mod utils;

/// Initialize panic reporting and logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());

    log::info!("gemchat initialized");
}

/// Bind the chat application to the current document.
#[wasm_bindgen]
pub fn init_chat() -> Result<(), JsValue> {
    chat_ui::ChatApp::new()?.start()
}
