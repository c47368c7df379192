/// Content script → background message relay.
///
/// Content scripts may not reach the analysis service directly, so they send an
/// `analyzeProduct` message and the background context performs the fetch. The
/// reply carries the same outcome a direct request would have produced.
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainClassifier;
use crate::error::{AnalyzeError, GENERIC_SERVER_MESSAGE};
use crate::model::{AnalysisResult, AnalyzeRequest};
use crate::pipeline::{AnalysisTransport, analyze};

pub const ANALYZE_ACTION: &str = "analyzeProduct";

/// Popup → content script: open the overlay on the active tab
pub const SHOW_OVERLAY_ACTION: &str = "showOverlay";

/// Value a host `onMessage` listener returns so the reply port survives the
/// asynchronous fetch.
pub const KEEP_CHANNEL_OPEN: bool = true;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub action: String,
    pub url: String,
    #[serde(default, rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl RelayRequest {
    pub fn analyze(url: &str) -> RelayRequest {
        RelayRequest {
            action: ANALYZE_ACTION.to_string(),
            url: url.to_string(),
            request_id: Some(Uuid::new_v4().to_string()),
        }
    }

    pub fn is_analyze(&self) -> bool {
        self.action == ANALYZE_ACTION
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl RelayResponse {
    pub fn from_outcome(
        request_id: Option<String>,
        outcome: Result<AnalysisResult, AnalyzeError>,
    ) -> RelayResponse {
        match outcome {
            Ok(result) => RelayResponse {
                success: true,
                data: Some(result),
                error: None,
                request_id,
            },
            Err(err) => RelayResponse {
                success: false,
                data: None,
                error: Some(err.to_string()),
                request_id,
            },
        }
    }

    pub fn into_outcome(self) -> Result<AnalysisResult, AnalyzeError> {
        match (self.success, self.data) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(AnalyzeError::Parse(
                "Relay reply is missing analysis data".to_string(),
            )),
            (false, _) => Err(AnalyzeError::Server(
                self.error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string()),
            )),
        }
    }
}

/// Tab message sent from the popup to the page's content script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayCommand {
    pub action: String,
}

impl OverlayCommand {
    pub fn show() -> OverlayCommand {
        OverlayCommand {
            action: SHOW_OVERLAY_ACTION.to_string(),
        }
    }

    pub fn is_show(&self) -> bool {
        self.action == SHOW_OVERLAY_ACTION
    }
}

/// Host messaging primitive seen from the sending side. Resolves once the
/// receiver has replied; `Err` means the channel itself failed.
#[allow(async_fn_in_trait)]
pub trait MessageChannel {
    async fn send(&self, request: &RelayRequest) -> Result<RelayResponse, String>;
}

/// Transport used by the in-page overlay
pub struct RelayClient<C> {
    channel: C,
}

impl<C: MessageChannel> RelayClient<C> {
    pub fn new(channel: C) -> Self {
        RelayClient { channel }
    }
}

impl<C: MessageChannel> AnalysisTransport for RelayClient<C> {
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, AnalyzeError> {
        let message = RelayRequest::analyze(&request.amazon_url);
        let reply = self
            .channel
            .send(&message)
            .await
            .map_err(AnalyzeError::Transport)?;

        if reply.request_id.is_some() && reply.request_id != message.request_id {
            warn!("Relay reply id mismatch - sent={:?}, got={:?}", message.request_id, reply.request_id);
        }
        reply.into_outcome()
    }
}

/// Background side: perform the request and hand the reply to `respond`
/// exactly once. The host listener must return `KEEP_CHANNEL_OPEN` while this
/// future is pending.
pub async fn serve_relay<T, R>(
    transport: &T,
    classifier: &DomainClassifier,
    request: RelayRequest,
    respond: R,
) where
    T: AnalysisTransport,
    R: FnOnce(RelayResponse),
{
    if !request.is_analyze() {
        debug!("Ignoring relay message with action {}", request.action);
        respond(RelayResponse::from_outcome(
            request.request_id,
            Err(AnalyzeError::Validation(format!(
                "Unsupported action: {}",
                request.action
            ))),
        ));
        return;
    }

    let outcome = analyze(transport, classifier, &request.url).await;
    respond(RelayResponse::from_outcome(request.request_id, outcome));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::sample_result;
    use crate::pipeline::interpret_response;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::cell::Cell;

    struct FixedEndpoint {
        status: u16,
        body: String,
        calls: Cell<usize>,
    }

    impl AnalysisTransport for FixedEndpoint {
        async fn analyze(&self, _request: &AnalyzeRequest) -> Result<AnalysisResult, AnalyzeError> {
            self.calls.set(self.calls.get() + 1);
            interpret_response(self.status, &self.body)
        }
    }

    /// In-process channel: the "background" answers through a oneshot reply port
    struct Loopback<'a> {
        endpoint: &'a FixedEndpoint,
    }

    impl MessageChannel for Loopback<'_> {
        async fn send(&self, request: &RelayRequest) -> Result<RelayResponse, String> {
            let (tx, rx) = oneshot::channel();
            serve_relay(
                self.endpoint,
                &DomainClassifier::default(),
                request.clone(),
                move |reply| {
                    let _ = tx.send(reply);
                },
            )
            .await;
            rx.await.map_err(|_| "reply port closed".to_string())
        }
    }

    struct BrokenChannel;

    impl MessageChannel for BrokenChannel {
        async fn send(&self, _request: &RelayRequest) -> Result<RelayResponse, String> {
            Err("Could not establish connection. Receiving end does not exist.".to_string())
        }
    }

    fn endpoint(status: u16, body: String) -> FixedEndpoint {
        FixedEndpoint {
            status,
            body,
            calls: Cell::new(0),
        }
    }

    #[test]
    fn test_request_wire_shape() {
        let request = RelayRequest::analyze("https://www.amazon.com/dp/B0863TXGM3");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["action"], "analyzeProduct");
        assert_eq!(value["url"], "https://www.amazon.com/dp/B0863TXGM3");
        assert!(value["requestId"].is_string());
    }

    #[test]
    fn test_failure_reply_shape() {
        let reply = RelayResponse::from_outcome(
            None,
            Err(AnalyzeError::Server("rate limited".to_string())),
        );
        let value = serde_json::to_value(&reply).unwrap();

        assert_eq!(value, serde_json::json!({"success": false, "error": "rate limited"}));
    }

    #[test]
    fn test_relay_preserves_success() {
        let endpoint = endpoint(200, serde_json::to_string(&sample_result()).unwrap());
        let client = RelayClient::new(Loopback { endpoint: &endpoint });

        let outcome = block_on(client.analyze(&AnalyzeRequest::new(
            "https://www.amazon.com/dp/B0863TXGM3",
        )));

        assert_eq!(outcome.unwrap().asin, "B0863TXGM3");
        assert_eq!(endpoint.calls.get(), 1);
    }

    #[test]
    fn test_relay_preserves_server_detail() {
        let endpoint = endpoint(500, r#"{"detail":"rate limited"}"#.to_string());
        let client = RelayClient::new(Loopback { endpoint: &endpoint });

        let outcome = block_on(client.analyze(&AnalyzeRequest::new(
            "https://www.amazon.com/dp/B0863TXGM3",
        )));

        assert_eq!(outcome, Err(AnalyzeError::Server("rate limited".to_string())));
    }

    #[test]
    fn test_background_validates_before_fetching() {
        let endpoint = endpoint(200, String::new());
        let reply = Cell::new(None);

        block_on(serve_relay(
            &endpoint,
            &DomainClassifier::default(),
            RelayRequest::analyze("https://www.ebay.com/itm/1"),
            |r| reply.set(Some(r)),
        ));

        let reply = reply.take().unwrap();
        assert!(!reply.success);
        assert_eq!(endpoint.calls.get(), 0);
    }

    #[test]
    fn test_unknown_action_is_answered() {
        let endpoint = endpoint(200, String::new());
        let reply = Cell::new(None);
        let request = RelayRequest {
            action: "openOptions".to_string(),
            url: String::new(),
            request_id: Some("abc".to_string()),
        };

        block_on(serve_relay(&endpoint, &DomainClassifier::default(), request, |r| {
            reply.set(Some(r))
        }));

        let reply = reply.take().unwrap();
        assert!(!reply.success);
        assert_eq!(reply.request_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_broken_channel_is_transport_error() {
        let client = RelayClient::new(BrokenChannel);
        let outcome = block_on(client.analyze(&AnalyzeRequest::new(
            "https://www.amazon.com/dp/B0863TXGM3",
        )));

        assert!(matches!(outcome, Err(AnalyzeError::Transport(_))));
    }

    #[test]
    fn test_show_overlay_command_shape() {
        let value = serde_json::to_value(OverlayCommand::show()).unwrap();
        assert_eq!(value, serde_json::json!({"action": "showOverlay"}));

        let parsed: OverlayCommand = serde_json::from_value(value).unwrap();
        assert!(parsed.is_show());
    }

    #[test]
    fn test_analyze_message_is_not_an_overlay_command() {
        let message = serde_json::to_value(RelayRequest::analyze("https://www.amazon.com/dp/B0863TXGM3")).unwrap();
        let parsed: OverlayCommand = serde_json::from_value(message).unwrap();
        assert!(!parsed.is_show());

        // No url: the background relay rejects it instead of fetching
        let command = serde_json::to_value(OverlayCommand::show()).unwrap();
        assert!(serde_json::from_value::<RelayRequest>(command).is_err());
    }

    #[test]
    fn test_success_without_data_is_parse_error() {
        let reply = RelayResponse {
            success: true,
            data: None,
            error: None,
            request_id: None,
        };
        assert!(matches!(reply.into_outcome(), Err(AnalyzeError::Parse(_))));
    }
}
