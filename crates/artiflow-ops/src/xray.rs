//! Xray graph-scan client.

use std::time::{Duration, Instant};

use artiflow_core::config::GlobalConfig;
use artiflow_core::graph::GraphNode;
use artiflow_core::scan::ScanResponse;
use artiflow_util::errors::ArtiflowError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::ops_audit::GraphScanner;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const SCAN_GRAPH_API: &str = "xray/api/v1/scan/graph";

#[derive(Debug, Deserialize)]
struct ScanIdResponse {
    scan_id: String,
}

/// Talks to `{url}/xray/api/v1/scan/graph`.
#[derive(Debug, Clone)]
pub struct XrayClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
    user: Option<String>,
    project: Option<String>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl XrayClient {
    /// Create a client from the `[server]` and `[audit]` configuration.
    pub fn from_config(config: &GlobalConfig) -> miette::Result<Self> {
        let url = config.server.url.as_deref().ok_or_else(|| ArtiflowError::Config {
            message: "no server url configured; set [server] url or ARTIFLOW_URL".to_string(),
        })?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("artiflow/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArtiflowError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            access_token: config.server.access_token.clone(),
            user: config.server.user.clone(),
            project: None,
            poll_interval: Duration::from_secs(config.audit.poll_interval_secs.max(1)),
            max_wait: Duration::from_secs(config.audit.max_wait_secs),
        })
    }

    /// Scope scans to a platform project.
    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project.filter(|p| !p.is_empty());
        self
    }

    fn scan_url(&self) -> String {
        format!("{}/{SCAN_GRAPH_API}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match (&self.access_token, &self.user) {
            (Some(token), Some(user)) => request.basic_auth(user, Some(token)),
            (Some(token), None) => request.bearer_auth(token),
            _ => request,
        }
    }

    async fn submit(&self, graph: &GraphNode) -> miette::Result<String> {
        let mut request = self.client.post(self.scan_url()).json(graph);
        if let Some(project) = &self.project {
            request = request.query(&[("project", project)]);
        }
        let resp = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ArtiflowError::Network {
                message: format!("Xray scan request failed: {e}"),
            })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ArtiflowError::Scan {
                message: format!("Xray returned HTTP {status} for scan request: {body}"),
            }
            .into());
        }
        let scan: ScanIdResponse = resp.json().await.map_err(|e| ArtiflowError::Scan {
            message: format!("Failed to parse Xray scan id: {e}"),
        })?;
        debug!("Xray scan id: {}", scan.scan_id);
        Ok(scan.scan_id)
    }

    async fn poll(&self, scan_id: &str) -> miette::Result<ScanResponse> {
        let url = format!("{}/{scan_id}", self.scan_url());
        let started = Instant::now();
        loop {
            let request = self.client.get(&url).query(&[
                ("include_vulnerabilities", "true"),
                ("include_licenses", "true"),
            ]);
            let resp = self
                .authorize(request)
                .send()
                .await
                .map_err(|e| ArtiflowError::Network {
                    message: format!("Xray results request failed: {e}"),
                })?;
            match resp.status() {
                StatusCode::OK => {
                    return resp.json().await.map_err(|e| {
                        ArtiflowError::Scan {
                            message: format!("Failed to parse Xray scan results: {e}"),
                        }
                        .into()
                    });
                }
                StatusCode::ACCEPTED => {
                    if started.elapsed() >= self.max_wait {
                        return Err(ArtiflowError::Scan {
                            message: format!(
                                "Xray scan {scan_id} did not finish within {}s",
                                self.max_wait.as_secs()
                            ),
                        }
                        .into());
                    }
                    debug!("Xray scan {scan_id} still in progress");
                    tokio::time::sleep(self.poll_interval).await;
                }
                status => {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(ArtiflowError::Scan {
                        message: format!("Xray returned HTTP {status} for scan {scan_id}: {body}"),
                    }
                    .into());
                }
            }
        }
    }
}

impl GraphScanner for XrayClient {
    async fn scan_graph(&self, graph: &GraphNode) -> miette::Result<ScanResponse> {
        let scan_id = self.submit(graph).await?;
        self.poll(&scan_id).await
    }
}
