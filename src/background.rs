/// Background (service worker) context: badge state and the fetch relay.
/// The toolbar action opens the popup, which asks the page for the overlay.
use log::{debug, info};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::badge::{BadgeSink, BadgeState, BadgeSync, TabId, TabUpdate};
use crate::client::HttpClient;
use crate::domain::DomainClassifier;
use crate::relay::{KEEP_CHANNEL_OPEN, RelayRequest, RelayResponse, serve_relay};

// Import JS bridge functions
#[wasm_bindgen(module = "/background_bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn setBadge(tab_id: i32, badge: JsValue) -> Result<(), JsValue>;
}

struct ActionBadge;

impl BadgeSink for ActionBadge {
    fn apply(&self, tab_id: TabId, badge: &BadgeState) -> Result<(), String> {
        let badge_js = serde_wasm_bindgen::to_value(badge)
            .map_err(|e| format!("Failed to serialize badge: {:?}", e))?;
        setBadge(tab_id, badge_js).map_err(|e| format!("{:?}", e))
    }
}

/// Created once by the service worker script and fed host events
#[wasm_bindgen]
pub struct BackgroundController {
    badges: BadgeSync,
    client: HttpClient,
    classifier: DomainClassifier,
}

#[wasm_bindgen]
impl BackgroundController {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<BackgroundController, JsValue> {
        let config = crate::load_config(config_json)?;
        let classifier = DomainClassifier::from_config(&config);

        Ok(BackgroundController {
            badges: BadgeSync::new(classifier.clone()),
            client: HttpClient::new(config),
            classifier,
        })
    }

    #[wasm_bindgen(js_name = onInstalled)]
    pub fn on_installed(&self, reason: String) {
        info!(
            "Impulse Saver installed - reason={}, api={}",
            reason,
            self.client.config().api_base_url
        );
    }

    #[wasm_bindgen(js_name = onTabUpdated)]
    pub fn on_tab_updated(&mut self, update: JsValue) {
        match serde_wasm_bindgen::from_value::<TabUpdate>(update) {
            Ok(update) => {
                self.badges.on_tab_updated(&update, &ActionBadge);
            }
            Err(e) => debug!("Ignoring malformed tab update: {:?}", e),
        }
    }

    #[wasm_bindgen(js_name = onTabRemoved)]
    pub fn on_tab_removed(&mut self, tab_id: i32) {
        self.badges.on_tab_removed(tab_id);
    }

    /// Runtime message listener. Returns true when the reply will be sent
    /// asynchronously, which keeps the host's reply port open.
    #[wasm_bindgen(js_name = onMessage)]
    pub fn on_message(&self, message: JsValue, send_response: js_sys::Function) -> bool {
        let request: RelayRequest = match serde_wasm_bindgen::from_value(message) {
            Ok(request) => request,
            Err(_) => return false,
        };

        let client = self.client.clone();
        let classifier = self.classifier.clone();

        spawn_local(async move {
            serve_relay(&client, &classifier, request, move |reply: RelayResponse| {
                // Plain objects, not Maps: the host clones replies as JSON
                let serializer = serde_wasm_bindgen::Serializer::json_compatible();
                let reply_js = match reply.serialize(&serializer) {
                    Ok(value) => value,
                    Err(e) => {
                        debug!("Failed to serialize relay reply: {:?}", e);
                        return;
                    }
                };
                if let Err(e) = send_response.call1(&JsValue::NULL, &reply_js) {
                    debug!("Relay reply not delivered: {:?}", e);
                }
            })
            .await;
        });

        KEEP_CHANNEL_OPEN
    }
}
