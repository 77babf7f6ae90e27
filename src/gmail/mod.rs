pub mod client;
pub mod models;

use log::info;

use crate::domain::message::{Header, MessageRef};
use crate::error::Result;

/// Mailbox operations the unsubscribe run needs from a mail provider.
pub trait MailProvider {
    fn search(&self, query: &str) -> Result<Vec<MessageRef>>;
    fn get_metadata(&self, id: &str) -> Result<Vec<Header>>;
    /// Full message as the provider's base64url `raw` blob.
    fn get_raw(&self, id: &str) -> Result<String>;
    fn mark_read(&self, id: &str) -> Result<()>;
}

impl<P: MailProvider + ?Sized> MailProvider for &P {
    fn search(&self, query: &str) -> Result<Vec<MessageRef>> {
        (**self).search(query)
    }
    fn get_metadata(&self, id: &str) -> Result<Vec<Header>> {
        (**self).get_metadata(id)
    }
    fn get_raw(&self, id: &str) -> Result<String> {
        (**self).get_raw(id)
    }
    fn mark_read(&self, id: &str) -> Result<()> {
        (**self).mark_read(id)
    }
}

/// Reads through to the inner provider but never changes labels.
pub struct ReadOnly<P>(pub P);

impl<P: MailProvider> MailProvider for ReadOnly<P> {
    fn search(&self, query: &str) -> Result<Vec<MessageRef>> {
        self.0.search(query)
    }
    fn get_metadata(&self, id: &str) -> Result<Vec<Header>> {
        self.0.get_metadata(id)
    }
    fn get_raw(&self, id: &str) -> Result<String> {
        self.0.get_raw(id)
    }
    fn mark_read(&self, id: &str) -> Result<()> {
        info!("[dry-run] would mark email {id} as read");
        Ok(())
    }
}
