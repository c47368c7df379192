/// Detection of client-side (history API) navigation.
///
/// Product pages swap content without reloading. The content script feeds
/// every DOM mutation batch into `NavigationWatcher::on_mutation`; a URL change
/// schedules one re-check after the settle delay so the new page can finish
/// rendering. A later change cancels the pending check and starts a new one.
/// Timer bookkeeping lives in the caller; the watcher only hands out
/// generations and says which one is still current.
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCheck {
    pub generation: u64,
    pub delay_ms: u32,
    /// Pending check this one replaces; its timer should be cleared
    pub replaces: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct NavigationWatcher {
    last_url: String,
    settle_delay_ms: u32,
    generation: u64,
    pending: Option<u64>,
}

impl NavigationWatcher {
    pub fn new(initial_url: &str, settle_delay_ms: u32) -> Self {
        NavigationWatcher {
            last_url: initial_url.to_string(),
            settle_delay_ms,
            generation: 0,
            pending: None,
        }
    }

    pub fn last_url(&self) -> &str {
        &self.last_url
    }

    pub fn pending(&self) -> Option<u64> {
        self.pending
    }

    /// Returns a check to schedule when `current_url` differs from the last
    /// observed URL; mutations on the same URL are ignored.
    pub fn on_mutation(&mut self, current_url: &str) -> Option<ScheduledCheck> {
        if current_url == self.last_url {
            return None;
        }

        self.last_url = current_url.to_string();
        self.generation += 1;
        let replaces = self.pending.replace(self.generation);

        debug!(
            "URL changed, re-check in {}ms - url={}, generation={}",
            self.settle_delay_ms, current_url, self.generation
        );

        Some(ScheduledCheck {
            generation: self.generation,
            delay_ms: self.settle_delay_ms,
            replaces,
        })
    }

    /// Timer callback. Yields the URL to re-evaluate, or `None` if this
    /// generation was replaced or cancelled in the meantime.
    pub fn on_timer(&mut self, generation: u64) -> Option<String> {
        if self.pending != Some(generation) {
            debug!("Stale navigation timer ignored - generation={}", generation);
            return None;
        }
        self.pending = None;
        Some(self.last_url.clone())
    }

    /// Drop the pending check (page unload); returns it so its timer can be cleared
    pub fn cancel(&mut self) -> Option<u64> {
        self.pending.take()
    }
}
