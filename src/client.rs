/// HTTP client for the analysis service
use log::{debug, warn};

use crate::config::ClientConfig;
use crate::error::AnalyzeError;
use crate::model::{AnalysisResult, AnalysisSummary, AnalyzeRequest, HealthStatus};
use crate::pipeline::{AnalysisTransport, interpret_response};

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        HttpClient {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn analyze_url(&self) -> String {
        self.config.endpoint("analyze")
    }

    fn recent_url(&self, limit: u32) -> String {
        format!("{}?limit={}", self.config.endpoint("recent-analyses"), limit)
    }

    fn health_url(&self) -> String {
        self.config.endpoint("")
    }

    /// `GET /api/` liveness probe
    pub async fn health(&self) -> Result<HealthStatus, AnalyzeError> {
        let resp = self.client.get(self.health_url()).send().await?;
        let resp = resp
            .error_for_status()
            .map_err(|e| AnalyzeError::Server(e.to_string()))?;
        Ok(resp.json().await?)
    }

    /// Most recent analyses stored by the service, newest first
    pub async fn recent_analyses(&self, limit: u32) -> Result<Vec<AnalysisSummary>, AnalyzeError> {
        let url = self.recent_url(limit);
        debug!("Fetching recent analyses - url={}", url);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            warn!("Recent analyses unavailable - status={}", resp.status());
            return Err(AnalyzeError::Server(format!(
                "Recent analyses unavailable ({})",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }
}

impl AnalysisTransport for HttpClient {
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, AnalyzeError> {
        let resp = self
            .client
            .post(self.analyze_url())
            .json(request)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!("Analysis response - status={}, bytes={}", status, body.len());

        interpret_response(status, &body)
    }
}
