/// Impulse Saver - browser extension client for Amazon impulse-risk analysis
/// Built with Rust + WASM + Yew

pub mod background;
pub mod badge;
pub mod client;
pub mod config;
pub mod content;
pub mod domain;
pub mod error;
pub mod model;
pub mod navigation;
pub mod pipeline;
pub mod presentation;
pub mod relay;
pub mod ui;

use wasm_bindgen::prelude::*;

pub use background::BackgroundController;
pub use config::ClientConfig;
pub use content::ContentScript;
pub use error::AnalyzeError;
pub use model::AnalysisResult;
pub use pipeline::{AnalysisSession, RequestLifecycle};

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

fn load_config(config_json: Option<String>) -> Result<ClientConfig, JsValue> {
    match config_json {
        Some(json) => ClientConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string())),
        None => Ok(ClientConfig::default()),
    }
}

// Re-export the eligibility check for JavaScript access
#[wasm_bindgen]
pub fn is_eligible_domain(url: &str) -> bool {
    domain::is_eligible_domain(url)
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup(config_json: Option<String>) -> Result<(), JsValue> {
    let config = load_config(config_json)?;
    yew::Renderer::<ui::popup::App>::with_props(ui::popup::PopupProps { config }).render();
    Ok(())
}

// Start page watching and overlay injection in a content script
#[wasm_bindgen]
pub fn start_content_script(config_json: Option<String>) -> Result<ContentScript, JsValue> {
    ContentScript::start(load_config(config_json)?)
}
