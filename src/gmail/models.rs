//! Subset of the Gmail API v1 message resources used here.

use serde::{Deserialize, Serialize};

use crate::domain::message::{Header, MessageRef};

#[derive(Debug, Deserialize)]
pub struct ListMessagesResponse {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataMessage {
    pub id: String,
    pub payload: Option<MessagePayload>,
}

impl MetadataMessage {
    pub fn into_headers(self) -> Vec<Header> {
        self.payload.map(|p| p.headers).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub raw: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModifyRequest<'a> {
    #[serde(rename = "removeLabelIds")]
    pub remove_label_ids: &'a [&'a str],
}
