/// Per-tab eligibility state and the toolbar badge that mirrors it
use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::DomainClassifier;

pub type TabId = i32;

pub const READY_BADGE_TEXT: &str = "!";
pub const READY_BADGE_COLOR: &str = "#FF6B35";
pub const READY_TITLE: &str = "Impulse Saver - Ready to analyze";
pub const DEFAULT_TITLE: &str = "Impulse Saver";

/// Tab status reported by the host once a navigation has finished loading
pub const STATUS_COMPLETE: &str = "complete";

/// Subset of a host tab-updated event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabUpdate {
    #[serde(rename = "tabId")]
    pub tab_id: TabId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabPageState {
    pub tab_id: TabId,
    pub url: String,
    pub is_eligible_page: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeState {
    pub text: String,
    pub color: Option<String>,
    pub title: String,
}

impl BadgeState {
    pub fn ready() -> BadgeState {
        BadgeState {
            text: READY_BADGE_TEXT.to_string(),
            color: Some(READY_BADGE_COLOR.to_string()),
            title: READY_TITLE.to_string(),
        }
    }

    pub fn cleared() -> BadgeState {
        BadgeState {
            text: String::new(),
            color: None,
            title: DEFAULT_TITLE.to_string(),
        }
    }

    pub fn for_page(state: &TabPageState) -> BadgeState {
        if state.is_eligible_page {
            BadgeState::ready()
        } else {
            BadgeState::cleared()
        }
    }
}

/// Host surface that draws the badge. Errors are reported but never retried.
pub trait BadgeSink {
    fn apply(&self, tab_id: TabId, badge: &BadgeState) -> Result<(), String>;
}

/// Sole owner and writer of per-tab page state
#[derive(Debug, Default)]
pub struct BadgeSync {
    classifier: DomainClassifier,
    tabs: HashMap<TabId, TabPageState>,
}

impl BadgeSync {
    pub fn new(classifier: DomainClassifier) -> Self {
        BadgeSync {
            classifier,
            tabs: HashMap::new(),
        }
    }

    /// Only completed navigations with a known URL change state
    pub fn on_tab_updated<S: BadgeSink>(&mut self, update: &TabUpdate, sink: &S) -> Option<&TabPageState> {
        if update.status.as_deref() != Some(STATUS_COMPLETE) {
            return None;
        }
        let url = update.url.as_deref()?;

        let state = TabPageState {
            tab_id: update.tab_id,
            url: url.to_string(),
            is_eligible_page: self.classifier.is_eligible(url),
        };

        // Tab may have closed since the event fired
        if let Err(e) = sink.apply(update.tab_id, &BadgeState::for_page(&state)) {
            debug!("Badge update skipped - tab={}, error={}", update.tab_id, e);
        }

        self.tabs.insert(update.tab_id, state);
        self.tabs.get(&update.tab_id)
    }

    pub fn on_tab_removed(&mut self, tab_id: TabId) -> Option<TabPageState> {
        self.tabs.remove(&tab_id)
    }

    pub fn tab_state(&self, tab_id: TabId) -> Option<&TabPageState> {
        self.tabs.get(&tab_id)
    }

    pub fn tracked_tabs(&self) -> usize {
        self.tabs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        applied: RefCell<Vec<(TabId, BadgeState)>>,
        fail: bool,
    }

    impl BadgeSink for RecordingSink {
        fn apply(&self, tab_id: TabId, badge: &BadgeState) -> Result<(), String> {
            if self.fail {
                return Err("No tab with id".to_string());
            }
            self.applied.borrow_mut().push((tab_id, badge.clone()));
            Ok(())
        }
    }

    fn complete(tab_id: TabId, url: &str) -> TabUpdate {
        TabUpdate {
            tab_id,
            url: Some(url.to_string()),
            status: Some(STATUS_COMPLETE.to_string()),
        }
    }

    #[test]
    fn test_eligible_tab_gets_ready_badge() {
        let mut sync = BadgeSync::default();
        let sink = RecordingSink::default();

        let state = sync
            .on_tab_updated(&complete(7, "https://www.amazon.com/dp/B0863TXGM3"), &sink)
            .unwrap();

        assert!(state.is_eligible_page);
        assert_eq!(sink.applied.borrow()[0], (7, BadgeState::ready()));
    }

    #[test]
    fn test_ineligible_tab_clears_badge() {
        let mut sync = BadgeSync::default();
        let sink = RecordingSink::default();

        sync.on_tab_updated(&complete(3, "https://github.com/"), &sink);

        let applied = sink.applied.borrow();
        assert_eq!(applied[0].1.text, "");
        assert_eq!(applied[0].1.color, None);
        assert_eq!(applied[0].1.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_loading_events_are_ignored() {
        let mut sync = BadgeSync::default();
        let sink = RecordingSink::default();
        let update = TabUpdate {
            tab_id: 1,
            url: Some("https://www.amazon.com/dp/B0863TXGM3".to_string()),
            status: Some("loading".to_string()),
        };

        assert!(sync.on_tab_updated(&update, &sink).is_none());
        assert!(sink.applied.borrow().is_empty());
        assert_eq!(sync.tracked_tabs(), 0);
    }

    #[test]
    fn test_navigation_overwrites_state() {
        let mut sync = BadgeSync::default();
        let sink = RecordingSink::default();

        sync.on_tab_updated(&complete(5, "https://www.amazon.com/dp/B0863TXGM3"), &sink);
        sync.on_tab_updated(&complete(5, "https://www.ebay.com/"), &sink);

        let state = sync.tab_state(5).unwrap();
        assert!(!state.is_eligible_page);
        assert_eq!(state.url, "https://www.ebay.com/");
        assert_eq!(sync.tracked_tabs(), 1);
    }

    #[test]
    fn test_sink_failure_is_swallowed() {
        let mut sync = BadgeSync::default();
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let state = sync.on_tab_updated(&complete(9, "https://amzn.to/abc"), &sink);
        assert!(state.is_some());
    }

    #[test]
    fn test_tab_close_discards_state() {
        let mut sync = BadgeSync::default();
        let sink = RecordingSink::default();
        sync.on_tab_updated(&complete(2, "https://www.amazon.de/dp/B0002AR0II"), &sink);

        assert!(sync.on_tab_removed(2).is_some());
        assert!(sync.tab_state(2).is_none());
        assert!(sync.on_tab_removed(2).is_none());
    }

    #[test]
    fn test_tab_update_from_host_json() {
        let update: TabUpdate =
            serde_json::from_str(r#"{"tabId": 4, "status": "complete", "url": "https://a.co/d/x"}"#)
                .unwrap();

        assert_eq!(update.tab_id, 4);
        assert_eq!(update.status.as_deref(), Some(STATUS_COMPLETE));
    }
}
