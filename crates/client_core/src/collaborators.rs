//! Narrow interfaces to everything outside the dialog: transport,
//! notifications, navigation and the hosting view.

use std::sync::Arc;

use async_trait::async_trait;
use shared::protocol::{TransferRequest, TransferResponse};
use thiserror::Error;
use tracing::{error, info};

/// A transfer that did not succeed. The message, when present, is shown to
/// the operator verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .message.as_deref().unwrap_or("transfer failed"))]
pub struct TransferFailure {
    pub message: Option<String>,
}

impl TransferFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    pub fn without_message() -> Self {
        Self { message: None }
    }
}

#[async_trait]
pub trait TransferTransport: Send + Sync {
    async fn transfer(
        &self,
        request: TransferRequest,
    ) -> Result<TransferResponse, TransferFailure>;
}

pub struct MissingTransferTransport;

#[async_trait]
impl TransferTransport for MissingTransferTransport {
    async fn transfer(
        &self,
        _request: TransferRequest,
    ) -> Result<TransferResponse, TransferFailure> {
        Err(TransferFailure::new("transfer transport is unavailable"))
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
}

/// Notification sink that writes to the tracing subscriber.
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify_success(&self, message: &str) {
        info!(target: "notification", "{message}");
    }

    fn notify_error(&self, message: &str) {
        error!(target: "notification", "{message}");
    }
}

pub trait Navigator: Send + Sync {
    fn go_to(&self, path: &str);
}

/// Callbacks owned by the view that opened the dialog.
pub trait DialogHost: Send + Sync {
    fn on_accepted(&self);
    fn on_cancelled(&self);
}

pub type TransportRef = Arc<dyn TransferTransport>;
pub type NotifierRef = Arc<dyn NotificationSink>;
pub type NavigatorRef = Arc<dyn Navigator>;
