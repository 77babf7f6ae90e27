pub mod dedup;

use log::{error, info, warn};

use crate::domain::message::{Header, MessageRef, ServiceResult, ServiceStatus};
use crate::extract::body::{decode_raw_message, scan_raw_message};
use crate::extract::headers::{extract_sender, extract_unsubscribe_url};
use crate::gmail::MailProvider;
use crate::unsubscribe::Unsubscriber;

pub use dedup::ProcessedSenders;

/// What to do with a sender whose unsubscribe request failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Leave the sender out of the results.
    #[default]
    Drop,
    /// Add a `Failed` row for the sender.
    Record,
}

impl FailurePolicy {
    pub fn from_record_flag(record: bool) -> Self {
        if record {
            FailurePolicy::Record
        } else {
            FailurePolicy::Drop
        }
    }
}

/// Walks candidate messages one at a time: extract sender and URL, skip
/// senders already handled, unsubscribe, mark read.
pub struct Pipeline<P, U> {
    provider: P,
    unsubscriber: U,
    on_failure: FailurePolicy,
}

impl<P: MailProvider, U: Unsubscriber> Pipeline<P, U> {
    pub fn new(provider: P, unsubscriber: U) -> Self {
        Self {
            provider,
            unsubscriber,
            on_failure: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    /// Results come back in message order.
    pub fn process(
        &self,
        messages: &[MessageRef],
        processed: &mut ProcessedSenders,
    ) -> Vec<ServiceResult> {
        let mut results = Vec::new();
        for msg in messages {
            if let Some(result) = self.process_one(&msg.id, processed) {
                results.push(result);
            }
        }
        results
    }

    fn process_one(&self, id: &str, processed: &mut ProcessedSenders) -> Option<ServiceResult> {
        let headers = self.fetch_headers(id);

        let Some(sender) = extract_sender(&headers) else {
            // Left unread on purpose so it shows up again next run.
            warn!("Email {id} does not have a valid sender.");
            return None;
        };

        let url = extract_unsubscribe_url(&headers).or_else(|| self.scan_body(id));

        if processed.already_processed(&sender) {
            info!("Already processed: {sender}");
            self.mark_read(id);
            return None;
        }

        let result = match url {
            Some(url) => {
                if self.unsubscriber.unsubscribe(&url) {
                    processed.mark_processed(sender.clone());
                    Some(ServiceResult::new(sender, ServiceStatus::Unsubscribed))
                } else {
                    match self.on_failure {
                        FailurePolicy::Drop => None,
                        FailurePolicy::Record => {
                            Some(ServiceResult::new(sender, ServiceStatus::Failed))
                        }
                    }
                }
            }
            None => {
                warn!("No unsubscribe URL found for {sender}");
                Some(ServiceResult::new(sender, ServiceStatus::NoUnsubscribeUrl))
            }
        };

        self.mark_read(id);
        result
    }

    fn fetch_headers(&self, id: &str) -> Vec<Header> {
        self.provider.get_metadata(id).unwrap_or_else(|e| {
            error!("Error getting message details for {id}: {e}");
            Vec::new()
        })
    }

    /// Body fallback; any fetch or decode failure just means no URL.
    fn scan_body(&self, id: &str) -> Option<String> {
        let raw = self
            .provider
            .get_raw(id)
            .and_then(|blob| decode_raw_message(&blob));
        match raw {
            Ok(bytes) => scan_raw_message(&bytes),
            Err(e) => {
                error!("Error processing message body for {id}: {e}");
                None
            }
        }
    }

    fn mark_read(&self, id: &str) {
        match self.provider.mark_read(id) {
            Ok(()) => info!("Marked email {id} as read."),
            Err(e) => error!("Error marking email {id} as read: {e}"),
        }
    }
}
