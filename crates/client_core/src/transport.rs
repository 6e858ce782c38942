//! HTTP implementation of [`TransferTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::ApiError,
    protocol::{TransferRequest, TransferResponse},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::collaborators::{TransferFailure, TransferTransport};

pub const TRANSFER_ENDPOINT: &str = "api/v1/patient/transfer/";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid server url '{url}': {source}")]
    InvalidServerUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct HttpTransferTransport {
    http: Client,
    endpoint: Url,
    bearer_token: Option<String>,
}

impl HttpTransferTransport {
    pub fn new(server_url: &str) -> Result<Self, TransportError> {
        Self::with_timeout(server_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let endpoint = transfer_endpoint(server_url)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn transfer_endpoint(server_url: &str) -> Result<Url, TransportError> {
    let trimmed = server_url.trim();
    let mut base = Url::parse(trimmed).map_err(|source| TransportError::InvalidServerUrl {
        url: trimmed.to_string(),
        source,
    })?;
    // `join` replaces the last path segment unless the base ends with '/'.
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(TRANSFER_ENDPOINT)
        .map_err(|source| TransportError::InvalidServerUrl {
            url: trimmed.to_string(),
            source,
        })
}

#[async_trait]
impl TransferTransport for HttpTransferTransport {
    async fn transfer(
        &self,
        request: TransferRequest,
    ) -> Result<TransferResponse, TransferFailure> {
        let mut builder = self.http.post(self.endpoint.clone()).json(&request);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let res = builder.send().await.map_err(|err| {
            warn!(endpoint = %self.endpoint, error = %err, "transfer request could not be sent");
            TransferFailure::without_message()
        })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<ApiError>(&body)
                .ok()
                .map(|api_error| api_error.message);
            debug!(%status, has_message = message.is_some(), "transfer rejected by server");
            return Err(TransferFailure { message });
        }

        res.json::<TransferResponse>().await.map_err(|err| {
            warn!(error = %err, "transfer response could not be decoded");
            TransferFailure::without_message()
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
