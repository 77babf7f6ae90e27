use std::fmt;

use serde::{Deserialize, Serialize};

pub type MessageId = String;

/// A message id as returned by a mailbox search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: MessageId,
}

impl MessageRef {
    pub fn new(id: impl Into<MessageId>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Outcome recorded for one sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceStatus {
    Unsubscribed,
    NoUnsubscribeUrl,
    /// Only produced when failed attempts are recorded.
    Failed,
}

impl ServiceStatus {
    pub fn label(self) -> &'static str {
        match self {
            ServiceStatus::Unsubscribed => "Unsubscribed",
            ServiceStatus::NoUnsubscribeUrl => "No unsubscribe URL",
            ServiceStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResult {
    /// Raw `From` header value, e.g. `ACME <no-reply@acme.com>`.
    pub sender: String,
    pub status: ServiceStatus,
}

impl ServiceResult {
    pub fn new(sender: impl Into<String>, status: ServiceStatus) -> Self {
        Self {
            sender: sender.into(),
            status,
        }
    }
}
