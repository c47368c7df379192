/// Content script context: page classification, SPA navigation watching and
/// overlay injection on product pages.
use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{Document, MutationObserver, MutationObserverInit};
use yew::AppHandle;

use crate::config::ClientConfig;
use crate::domain::{DomainClassifier, PRODUCT_ELEMENT_IDS, PageContext, extract_asin, is_product_page};
use crate::navigation::NavigationWatcher;
use crate::relay::{MessageChannel, OverlayCommand, RelayRequest, RelayResponse};
use crate::ui::overlay::{Overlay, OverlayProps};

pub const OVERLAY_ROOT_ID: &str = "impulse-saver-root";

// Import JS bridge functions
#[wasm_bindgen(module = "/content_bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn sendRuntimeMessage(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    fn onTabMessage(callback: &js_sys::Function) -> Result<(), JsValue>;
}

/// `chrome.runtime.sendMessage` as a relay channel
pub struct RuntimeChannel;

impl MessageChannel for RuntimeChannel {
    async fn send(&self, request: &RelayRequest) -> Result<RelayResponse, String> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let message = request
            .serialize(&serializer)
            .map_err(|e| format!("Failed to serialize message: {:?}", e))?;

        let reply = sendRuntimeMessage(message)
            .await
            .map_err(|e| format!("Extension messaging failed: {:?}", e))?;

        if reply.is_null() || reply.is_undefined() {
            return Err("No reply from the extension background".to_string());
        }
        serde_wasm_bindgen::from_value(reply).map_err(|e| format!("Failed to parse reply: {:?}", e))
    }
}

/// Build the classifier input from the live document
pub fn page_context(document: &Document, path: &str) -> PageContext {
    let has_product_element = PRODUCT_ELEMENT_IDS
        .iter()
        .any(|id| document.get_element_by_id(id).is_some());
    PageContext::new(path, has_product_element)
}

struct ContentState {
    config: ClientConfig,
    classifier: DomainClassifier,
    watcher: NavigationWatcher,
    /// Generation and browser timeout handle of the pending re-check
    timer: Option<(u64, i32)>,
    overlay: Option<AppHandle<Overlay>>,
}

impl ContentState {
    fn evaluate(&mut self, open: bool) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let location = window.location();
        let url = location.href()?;
        let page = page_context(&document, &location.pathname()?);

        if self.classifier.is_eligible(&url) && is_product_page(&page) {
            debug!("Product page detected - asin={:?}", extract_asin(&url));
            self.mount_overlay(&document, url, open)
        } else {
            self.unmount_overlay(&document);
            Ok(())
        }
    }

    /// Any previous overlay is removed first so at most one root exists
    fn mount_overlay(&mut self, document: &Document, url: String, open: bool) -> Result<(), JsValue> {
        self.unmount_overlay(document);

        let root = document.create_element("div")?;
        root.set_id(OVERLAY_ROOT_ID);
        document
            .body()
            .ok_or_else(|| JsValue::from_str("no document body"))?
            .append_child(&root)?;

        let props = OverlayProps {
            url,
            config: self.config.clone(),
            start_open: open,
        };
        self.overlay = Some(yew::Renderer::<Overlay>::with_root_and_props(root, props).render());
        Ok(())
    }

    fn unmount_overlay(&mut self, document: &Document) {
        if let Some(handle) = self.overlay.take() {
            handle.destroy();
        }
        while let Some(existing) = document.get_element_by_id(OVERLAY_ROOT_ID) {
            existing.remove();
        }
    }

    fn clear_timer(&mut self) {
        if let Some((_, handle)) = self.timer.take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(handle);
            }
        }
    }
}

fn schedule_recheck(state: &Rc<RefCell<ContentState>>, generation: u64, delay_ms: u32) -> Result<i32, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let state = Rc::clone(state);

    let callback = Closure::once_into_js(move || {
        let mut state = state.borrow_mut();
        if state.watcher.on_timer(generation).is_some() {
            state.timer = None;
            if let Err(e) = state.evaluate(false) {
                debug!("Re-evaluation failed: {:?}", e);
            }
        }
    });

    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        delay_ms as i32,
    )
}

fn on_mutation(state: &Rc<RefCell<ContentState>>) {
    let Some(href) = web_sys::window().and_then(|w| w.location().href().ok()) else {
        return;
    };

    let check = state.borrow_mut().watcher.on_mutation(&href);
    let Some(check) = check else {
        return;
    };

    if check.replaces.is_some() {
        state.borrow_mut().clear_timer();
    }
    match schedule_recheck(state, check.generation, check.delay_ms) {
        Ok(handle) => state.borrow_mut().timer = Some((check.generation, handle)),
        Err(e) => debug!("Could not schedule re-check: {:?}", e),
    }
}

/// Handle held by the content script loader for the page's lifetime
#[wasm_bindgen]
pub struct ContentScript {
    state: Rc<RefCell<ContentState>>,
    observer: MutationObserver,
    _on_mutation: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
    _on_message: Closure<dyn FnMut(JsValue)>,
}

impl ContentScript {
    pub fn start(config: ClientConfig) -> Result<ContentScript, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let href = window.location().href()?;

        let state = Rc::new(RefCell::new(ContentState {
            classifier: DomainClassifier::from_config(&config),
            watcher: NavigationWatcher::new(&href, config.settle_delay_ms),
            config,
            timer: None,
            overlay: None,
        }));

        state.borrow_mut().evaluate(false)?;

        let on_mutation_cb = {
            let state = Rc::clone(&state);
            Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(move |_records, _observer| {
                on_mutation(&state);
            })
        };
        let observer = MutationObserver::new(on_mutation_cb.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(&document, &options)?;

        // "Show on page" from the popup
        let on_message = {
            let state = Rc::clone(&state);
            Closure::<dyn FnMut(JsValue)>::new(move |message: JsValue| {
                let Ok(command) = serde_wasm_bindgen::from_value::<OverlayCommand>(message) else {
                    return;
                };
                if command.is_show() {
                    if let Err(e) = state.borrow_mut().evaluate(true) {
                        debug!("Could not open overlay: {:?}", e);
                    }
                }
            })
        };
        if let Err(e) = onTabMessage(on_message.as_ref().unchecked_ref()) {
            debug!("Tab messages unavailable: {:?}", e);
        }

        info!("Content script watching {}", href);
        Ok(ContentScript {
            state,
            observer,
            _on_mutation: on_mutation_cb,
            _on_message: on_message,
        })
    }

    /// Re-evaluate the page and mount the overlay opened
    pub fn show_overlay(&self) -> Result<(), JsValue> {
        self.state.borrow_mut().evaluate(true)
    }

    pub fn has_overlay(&self) -> bool {
        self.state.borrow().overlay.is_some()
    }
}

#[wasm_bindgen]
impl ContentScript {
    /// Page unload: stop observing, cancel the pending re-check, remove the overlay
    pub fn stop(&self) {
        self.observer.disconnect();
        let mut state = self.state.borrow_mut();
        state.watcher.cancel();
        state.clear_timer();
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            state.unmount_overlay(&document);
        }
    }
}
