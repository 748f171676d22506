use super::{AbortHandle, Gateway, GatewayResponse, Method};
use crate::config::VaultConfig;
use crate::error::{ConnectorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Header carrying the Vault client token.
pub const AUTH_HEADER_NAME: &str = "X-Vault-Token";
/// Header selecting a Vault Enterprise namespace.
pub const NAMESPACE_HEADER_NAME: &str = "X-Vault-Namespace";

/// [`Gateway`] backed by `reqwest`.
pub struct HttpGateway {
    base_url: Url,
    token: String,
    namespace: Option<String>,
    client: Client,
    abort: AbortHandle,
}

impl HttpGateway {
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.address)?;
        let token = config
            .token
            .clone()
            .ok_or_else(|| ConnectorError::Config("vault token is not configured".into()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConnectorError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            base_url,
            token,
            namespace: config.namespace.clone(),
            client,
            abort: AbortHandle::new(),
        })
    }

    /// Share a cancellation handle with the orchestrator.
    pub fn with_abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Resolve `path` under the base URL. A path the URL parser would
    /// rewrite (dot segments, stray `?` or `#`) is refused.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let relative = path.trim_start_matches('/');
        let url = self
            .base_url
            .join(relative)
            .map_err(|e| ConnectorError::Config(format!("invalid request path '{path}': {e}")))?;
        if url.path().strip_prefix(self.base_url.path()) != Some(relative) {
            return Err(ConnectorError::InvalidName(path.to_string()));
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<GatewayResponse> {
        let http_method = reqwest::Method::from_bytes(method.as_str().as_bytes())
            .map_err(|e| ConnectorError::transport(None, format!("invalid method: {e}")))?;

        let mut req = self
            .client
            .request(http_method, url)
            .header(AUTH_HEADER_NAME, &self.token);
        if let Some(ref namespace) = self.namespace {
            req = req.header(NAMESPACE_HEADER_NAME, namespace);
        }
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(ref payload) = body {
            req = req.json(payload);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;

        Ok(GatewayResponse::new(status, parse_body(&text)))
    }
}

/// Vault paths are relative to the server root, so the base must end in `/`.
fn parse_base_url(address: &str) -> Result<Url> {
    let mut url = Url::parse(address)
        .map_err(|e| ConnectorError::Config(format!("vault address '{address}' is not valid: {e}")))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConnectorError::Config(format!(
            "vault address '{address}' is not valid"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<GatewayResponse> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url.path());

        let resp = self.abort.run(self.send(method, url, query, body)).await?;

        debug!("{} {} -> {}", method, path, resp.status);
        Ok(resp)
    }
}
