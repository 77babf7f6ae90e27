use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::auth::AccessTokenSource;
use crate::domain::message::{Header, MessageRef};
use crate::error::{Error, Result};
use crate::gmail::MailProvider;
use crate::gmail::models::{ListMessagesResponse, MetadataMessage, ModifyRequest, RawMessage};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Largest page the list endpoint accepts.
const PAGE_SIZE: usize = 500;

/// Gmail REST client for the signed-in user (`users/me`).
pub struct GmailClient<T: AccessTokenSource> {
    http: Client,
    tokens: T,
    base_url: String,
    max_messages: Option<usize>,
}

impl<T: AccessTokenSource> GmailClient<T> {
    pub fn new(tokens: T) -> Result<Self> {
        // No explicit timeout: provider calls use the library defaults.
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            tokens,
            base_url: GMAIL_API_BASE.to_string(),
            max_messages: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Stop paging once this many message ids were collected.
    pub fn with_max_messages(mut self, max: Option<usize>) -> Self {
        self.max_messages = max;
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/users/me/messages", self.base_url)
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .tokens
            .access_token()
            .map_err(|e| Error::Auth(e.to_string()))?;
        Ok(req.bearer_auth(token))
    }

    fn send(&self, operation: &'static str, req: RequestBuilder) -> Result<Response> {
        let resp = self.authorized(req)?.send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(Error::Provider {
            operation,
            status,
            body,
        })
    }
}

impl<T: AccessTokenSource> MailProvider for GmailClient<T> {
    fn search(&self, query: &str) -> Result<Vec<MessageRef>> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;
        let page_size = self
            .max_messages
            .map_or(PAGE_SIZE, |max| max.clamp(1, PAGE_SIZE))
            .to_string();

        loop {
            let mut req = self
                .http
                .get(self.messages_url())
                .query(&[("q", query), ("maxResults", page_size.as_str())]);
            if let Some(tok) = &page_token {
                req = req.query(&[("pageToken", tok.as_str())]);
            }

            let page: ListMessagesResponse = self.send("search", req)?.json()?;
            debug!(
                "search page: {} ids, more={}",
                page.messages.len(),
                page.next_page_token.is_some()
            );
            out.extend(page.messages);

            if let Some(max) = self.max_messages
                && out.len() >= max
            {
                out.truncate(max);
                break;
            }

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(out)
    }

    fn get_metadata(&self, id: &str) -> Result<Vec<Header>> {
        let req = self
            .http
            .get(format!("{}/{id}", self.messages_url()))
            .query(&[("format", "metadata")]);
        let msg: MetadataMessage = self.send("get metadata", req)?.json()?;
        Ok(msg.into_headers())
    }

    fn get_raw(&self, id: &str) -> Result<String> {
        let req = self
            .http
            .get(format!("{}/{id}", self.messages_url()))
            .query(&[("format", "raw")]);
        let msg: RawMessage = self.send("get raw", req)?.json()?;
        msg.raw
            .ok_or_else(|| Error::Decode(format!("message {} has no raw content", msg.id)))
    }

    fn mark_read(&self, id: &str) -> Result<()> {
        let req = self
            .http
            .post(format!("{}/{id}/modify", self.messages_url()))
            .json(&ModifyRequest {
                remove_label_ids: &["UNREAD"],
            });
        self.send("mark read", req)?;
        Ok(())
    }
}
