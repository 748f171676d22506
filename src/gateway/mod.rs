//! Authenticated request/response plumbing to the Vault HTTP API.
//!
//! The core never sees connection details: it hands a method, path, optional
//! query and optional JSON body to a [`Gateway`] and gets back the status
//! code and decoded JSON body. Non-2xx statuses are returned as responses so
//! callers can classify them; only transport failures and cancellation are
//! errors.

pub mod cancel;
pub mod http;

pub use cancel::AbortHandle;
pub use http::HttpGateway;

use crate::client::model::ErrorResponse;
use crate::error::{ConnectorError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    List,
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::List => "LIST",
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: Value,
}

impl GatewayResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Messages from a Vault `{"errors": [...]}` body.
    pub fn error_messages(&self) -> Vec<String> {
        match &self.body {
            Value::String(text) if !text.is_empty() => vec![text.clone()],
            body => serde_json::from_value::<ErrorResponse>(body.clone())
                .map(|e| e.errors)
                .unwrap_or_default(),
        }
    }

    /// Turn a non-2xx response into a transport error.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let messages = self.error_messages();
        let message = if messages.is_empty() {
            "no error detail returned".to_string()
        } else {
            messages.join("; ")
        };
        Err(ConnectorError::transport(Some(self.status), message))
    }

    /// Decode a successful body. A `null` body decodes as an empty object so
    /// that all-default shapes still come out.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = match self.error_for_status()?.body {
            Value::Null => Value::Object(Default::default()),
            body => body,
        };
        Ok(serde_json::from_value(body)?)
    }
}

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<GatewayResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_for_status_collects_vault_errors() {
        let resp = GatewayResponse::new(403, json!({"errors": ["permission denied"]}));
        let err = resp.error_for_status().unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::Transport { status: Some(403), ref message } if message == "permission denied"
        ));
    }

    #[test]
    fn json_treats_null_body_as_empty_object() {
        #[derive(serde::Deserialize, Default)]
        struct Shape {
            #[serde(default)]
            keys: Vec<String>,
        }
        let shape: Shape = GatewayResponse::new(204, Value::Null).json().unwrap();
        assert!(shape.keys.is_empty());
    }

    #[test]
    fn plain_text_errors_are_kept() {
        let resp = GatewayResponse::new(502, json!("bad gateway"));
        assert_eq!(resp.error_messages(), vec!["bad gateway"]);
    }
}
