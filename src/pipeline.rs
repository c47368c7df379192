/// Request lifecycle for one analysis attempt.
///
/// Each UI surface owns one `AnalysisSession`. Starting a request bumps the
/// session's generation; a response is applied only if its ticket still
/// matches, so a superseded request that resolves late is dropped.
use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::domain::DomainClassifier;
use crate::error::{AnalyzeError, GENERIC_SERVER_MESSAGE, INVALID_URL_MESSAGE};
use crate::model::{AnalysisResult, AnalyzeRequest, ErrorBody};

const INTERRUPTED_MESSAGE: &str = "Analysis was interrupted. Please try again.";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestLifecycle {
    #[default]
    Idle,
    Loading,
    Succeeded(Box<AnalysisResult>),
    Failed(AnalyzeError),
}

impl RequestLifecycle {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestLifecycle::Loading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestLifecycle::Succeeded(_) | RequestLifecycle::Failed(_)
        )
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            RequestLifecycle::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AnalyzeError> {
        match self {
            RequestLifecycle::Failed(err) => Some(err),
            _ => None,
        }
    }

    fn from_outcome(outcome: Result<AnalysisResult, AnalyzeError>) -> Self {
        match outcome {
            Ok(result) => RequestLifecycle::Succeeded(Box::new(result)),
            Err(err) => RequestLifecycle::Failed(err),
        }
    }
}

/// Something that can carry an analyze request to the service: a direct
/// HTTP client or the content-script relay through the background context.
#[allow(async_fn_in_trait)]
pub trait AnalysisTransport {
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, AnalyzeError>;
}

impl<T: AnalysisTransport> AnalysisTransport for &T {
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, AnalyzeError> {
        (**self).analyze(request).await
    }
}

impl<T: AnalysisTransport> AnalysisTransport for Rc<T> {
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, AnalyzeError> {
        (**self).analyze(request).await
    }
}

/// Reject empty or off-marketplace input before any network activity
pub fn validate_url(
    classifier: &DomainClassifier,
    url: &str,
) -> Result<AnalyzeRequest, AnalyzeError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AnalyzeError::Validation(
            "Please enter an Amazon product URL".to_string(),
        ));
    }
    if !classifier.is_eligible(url) {
        return Err(AnalyzeError::Validation(INVALID_URL_MESSAGE.to_string()));
    }
    Ok(AnalyzeRequest::new(url))
}

/// Map an HTTP status and body onto the analysis outcome
pub fn interpret_response(status: u16, body: &str) -> Result<AnalysisResult, AnalyzeError> {
    if (200..300).contains(&status) {
        return serde_json::from_str(body).map_err(|e| AnalyzeError::Parse(e.to_string()));
    }

    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string());

    Err(AnalyzeError::Server(detail))
}

/// Validate then send one request
pub async fn analyze<T: AnalysisTransport>(
    transport: &T,
    classifier: &DomainClassifier,
    url: &str,
) -> Result<AnalysisResult, AnalyzeError> {
    let request = validate_url(classifier, url)?;
    transport.analyze(&request).await
}

/// Identifies one started request within a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct RequestTracker {
    generation: u64,
    state: RequestLifecycle,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `Loading`, superseding any request still in flight
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.state = RequestLifecycle::Loading;
        Ticket(self.generation)
    }

    /// Apply an outcome; returns false when the ticket was superseded
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<AnalysisResult, AnalyzeError>,
    ) -> bool {
        if ticket.0 != self.generation {
            return false;
        }
        self.state = RequestLifecycle::from_outcome(outcome);
        true
    }

    /// Back to `Idle`; any in-flight response will be discarded
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = RequestLifecycle::Idle;
    }

    pub fn state(&self) -> &RequestLifecycle {
        &self.state
    }

    /// The triggering control is disabled while this is true
    pub fn is_busy(&self) -> bool {
        self.state.is_loading()
    }
}

/// Completes its ticket exactly once, even when the awaiting future is dropped
struct InFlight {
    tracker: Rc<RefCell<RequestTracker>>,
    ticket: Ticket,
    done: bool,
}

impl InFlight {
    fn finish(mut self, outcome: Result<AnalysisResult, AnalyzeError>) -> Option<RequestLifecycle> {
        self.done = true;
        let mut tracker = self.tracker.borrow_mut();
        if tracker.complete(self.ticket, outcome) {
            Some(tracker.state().clone())
        } else {
            None
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Ok(mut tracker) = self.tracker.try_borrow_mut() {
            tracker.complete(
                self.ticket,
                Err(AnalyzeError::Transport(INTERRUPTED_MESSAGE.to_string())),
            );
        }
    }
}

/// One UI surface's analysis state: popup and overlay each hold their own
pub struct AnalysisSession<T> {
    transport: T,
    classifier: DomainClassifier,
    tracker: Rc<RefCell<RequestTracker>>,
}

impl<T: AnalysisTransport> AnalysisSession<T> {
    pub fn new(transport: T, classifier: DomainClassifier) -> Self {
        AnalysisSession {
            transport,
            classifier,
            tracker: Rc::new(RefCell::new(RequestTracker::new())),
        }
    }

    pub fn state(&self) -> RequestLifecycle {
        self.tracker.borrow().state().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.tracker.borrow().is_busy()
    }

    /// Run one analysis, reporting `Loading` and the terminal state through
    /// `notify`. Returns `None` if a newer request superseded this one, in
    /// which case nothing is reported for the stale outcome.
    pub async fn run<F>(&self, url: &str, notify: F) -> Option<RequestLifecycle>
    where
        F: Fn(&RequestLifecycle),
    {
        let ticket = self.tracker.borrow_mut().begin();

        let request = match validate_url(&self.classifier, url) {
            Ok(request) => request,
            Err(err) => {
                warn!("Rejected analysis input: {}", err);
                let mut tracker = self.tracker.borrow_mut();
                tracker.complete(ticket, Err(err));
                let state = tracker.state().clone();
                drop(tracker);
                notify(&state);
                return Some(state);
            }
        };

        let guard = InFlight {
            tracker: Rc::clone(&self.tracker),
            ticket,
            done: false,
        };
        notify(&RequestLifecycle::Loading);
        info!("Analyzing {}", request.amazon_url);

        let outcome = self.transport.analyze(&request).await;
        if let Err(err) = &outcome {
            warn!("Analysis failed: {}", err);
        }

        match guard.finish(outcome) {
            Some(state) => {
                if state.result().is_some() {
                    info!("Analysis finished for {}", request.amazon_url);
                }
                notify(&state);
                Some(state)
            }
            None => {
                debug!("Discarding superseded response for {}", request.amazon_url);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{sample_json, sample_result};
    use futures::channel::oneshot;
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;
    use std::cell::Cell;
    use std::collections::VecDeque;

    const PRODUCT_URL: &str = "https://www.amazon.com/dp/B0863TXGM3";

    /// Answers every request with a canned HTTP status and body
    struct MockEndpoint {
        status: u16,
        body: String,
        calls: Cell<usize>,
    }

    impl MockEndpoint {
        fn new(status: u16, body: &str) -> Self {
            MockEndpoint {
                status,
                body: body.to_string(),
                calls: Cell::new(0),
            }
        }
    }

    impl AnalysisTransport for MockEndpoint {
        async fn analyze(&self, _request: &AnalyzeRequest) -> Result<AnalysisResult, AnalyzeError> {
            self.calls.set(self.calls.get() + 1);
            interpret_response(self.status, &self.body)
        }
    }

    /// Each request waits until the test sends its outcome
    #[derive(Default)]
    struct ControlledTransport {
        pending: RefCell<VecDeque<oneshot::Receiver<Result<AnalysisResult, AnalyzeError>>>>,
    }

    impl ControlledTransport {
        fn expect_call(&self) -> oneshot::Sender<Result<AnalysisResult, AnalyzeError>> {
            let (tx, rx) = oneshot::channel();
            self.pending.borrow_mut().push_back(rx);
            tx
        }
    }

    impl AnalysisTransport for ControlledTransport {
        async fn analyze(&self, _request: &AnalyzeRequest) -> Result<AnalysisResult, AnalyzeError> {
            let rx = self.pending.borrow_mut().pop_front();
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(AnalyzeError::Transport("cancelled".to_string()))),
                None => Err(AnalyzeError::Transport("unexpected call".to_string())),
            }
        }
    }

    fn result_with_verdict(verdict: &str) -> AnalysisResult {
        let mut result = sample_result();
        result.verdict = verdict.to_string();
        result
    }

    #[test]
    fn test_validation_error_makes_no_network_call() {
        let endpoint = MockEndpoint::new(200, &sample_json());
        let outcome = block_on(analyze(
            &endpoint,
            &DomainClassifier::default(),
            "https://www.ebay.com/itm/123",
        ));

        assert!(matches!(outcome, Err(AnalyzeError::Validation(_))));
        assert_eq!(endpoint.calls.get(), 0);
    }

    #[test]
    fn test_empty_url_is_validation_error() {
        let endpoint = MockEndpoint::new(200, &sample_json());
        let session = AnalysisSession::new(&endpoint, DomainClassifier::default());
        let state = block_on(session.run("   ", |_| {})).unwrap();

        assert!(state.error().map_or(false, AnalyzeError::is_validation));
        assert!(!session.is_busy());
        assert_eq!(endpoint.calls.get(), 0);
    }

    #[test]
    fn test_server_detail_is_surfaced() {
        let endpoint = MockEndpoint::new(500, r#"{"detail":"rate limited"}"#);
        let session = AnalysisSession::new(&endpoint, DomainClassifier::default());
        let state = block_on(session.run(PRODUCT_URL, |_| {})).unwrap();

        assert_eq!(
            state,
            RequestLifecycle::Failed(AnalyzeError::Server("rate limited".to_string()))
        );
        assert_eq!(endpoint.calls.get(), 1);
    }

    #[test]
    fn test_server_error_without_detail_is_generic() {
        assert_eq!(
            interpret_response(502, "<html>Bad Gateway</html>"),
            Err(AnalyzeError::Server(GENERIC_SERVER_MESSAGE.to_string()))
        );
        assert_eq!(
            interpret_response(400, r#"{"detail":""}"#),
            Err(AnalyzeError::Server(GENERIC_SERVER_MESSAGE.to_string()))
        );
    }

    #[test]
    fn test_malformed_success_body_is_parse_error() {
        assert!(matches!(
            interpret_response(200, r#"{"verdict": "BUY"}"#),
            Err(AnalyzeError::Parse(_))
        ));
        assert!(matches!(
            interpret_response(200, "not json"),
            Err(AnalyzeError::Parse(_))
        ));
    }

    #[test]
    fn test_success_transitions_through_loading() {
        let endpoint = MockEndpoint::new(200, &sample_json());
        let session = AnalysisSession::new(&endpoint, DomainClassifier::default());
        let seen = RefCell::new(Vec::new());

        let state = block_on(session.run(PRODUCT_URL, |s| seen.borrow_mut().push(s.clone()))).unwrap();

        assert_eq!(state.result().map(|r| r.asin.as_str()), Some("B0863TXGM3"));
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_loading());
        assert!(seen[1].is_terminal());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_late_response_from_superseded_call_is_discarded() {
        let transport = Rc::new(ControlledTransport::default());
        let session = Rc::new(AnalysisSession::new(
            Rc::clone(&transport),
            DomainClassifier::default(),
        ));
        let shown: Rc<RefCell<Vec<RequestLifecycle>>> = Rc::default();

        let first_tx = transport.expect_call();
        let second_tx = transport.expect_call();

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        for _ in 0..2 {
            let session = Rc::clone(&session);
            let shown = Rc::clone(&shown);
            spawner
                .spawn_local(async move {
                    session
                        .run(PRODUCT_URL, |s| shown.borrow_mut().push(s.clone()))
                        .await;
                })
                .unwrap();
        }
        pool.run_until_stalled();

        // Both calls are in flight, but only one surface state exists
        assert!(session.is_busy());

        second_tx.send(Ok(result_with_verdict("BUY now"))).unwrap();
        pool.run_until_stalled();
        first_tx.send(Ok(result_with_verdict("SKIP this"))).unwrap();
        pool.run_until_stalled();

        let state = session.state();
        assert_eq!(state.result().map(|r| r.verdict.as_str()), Some("BUY now"));
        assert!(!session.is_busy());

        let terminal: Vec<_> = shown.borrow().iter().filter(|s| s.is_terminal()).cloned().collect();
        assert_eq!(terminal.len(), 1);
    }

    #[test]
    fn test_dropped_request_still_releases_control() {
        let transport = ControlledTransport::default();
        let _tx = transport.expect_call();
        let session = AnalysisSession::new(&transport, DomainClassifier::default());

        let mut pool = LocalPool::new();
        {
            let run = session.run(PRODUCT_URL, |_| {});
            futures::pin_mut!(run);
            assert!(pool.run_until(futures::future::poll_immediate(&mut run)).is_none());
            assert!(session.is_busy());
        }

        assert!(!session.is_busy());
        assert!(matches!(session.state(), RequestLifecycle::Failed(AnalyzeError::Transport(_))));
    }

    #[test]
    fn test_reset_discards_in_flight_result() {
        let mut tracker = RequestTracker::new();
        let ticket = tracker.begin();
        tracker.reset();

        assert!(!tracker.complete(ticket, Ok(sample_result())));
        assert_eq!(tracker.state(), &RequestLifecycle::Idle);
    }
}
