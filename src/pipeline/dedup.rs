use std::collections::HashSet;

/// Senders already unsubscribed during this run. Only grows; never persisted.
#[derive(Debug, Default)]
pub struct ProcessedSenders {
    senders: HashSet<String>,
}

impl ProcessedSenders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact comparison on the raw `From` value.
    pub fn already_processed(&self, sender: &str) -> bool {
        self.senders.contains(sender)
    }

    pub fn mark_processed(&mut self, sender: impl Into<String>) {
        self.senders.insert(sender.into());
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_marked_senders() {
        let mut set = ProcessedSenders::new();
        assert!(set.is_empty());
        assert!(!set.already_processed("A <a@a.com>"));

        set.mark_processed("A <a@a.com>");
        set.mark_processed("A <a@a.com>");
        assert!(set.already_processed("A <a@a.com>"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn keys_are_case_and_whitespace_sensitive() {
        let mut set = ProcessedSenders::new();
        set.mark_processed("Shop <shop@x.com>");
        assert!(!set.already_processed("shop <shop@x.com>"));
        assert!(!set.already_processed("Shop <shop@x.com> "));
    }
}
