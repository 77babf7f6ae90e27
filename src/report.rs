use log::info;
use std::path::Path;

use crate::domain::message::{ServiceResult, ServiceStatus};
use crate::error::Result;

/// Counts over a finished result list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub unsubscribed: usize,
    pub no_url: usize,
    pub failed_requests: usize,
}

impl Summary {
    pub fn from_results(results: &[ServiceResult]) -> Self {
        results.iter().fold(
            Summary {
                total: results.len(),
                ..Summary::default()
            },
            |mut s, r| {
                match r.status {
                    ServiceStatus::Unsubscribed => s.unsubscribed += 1,
                    ServiceStatus::NoUnsubscribeUrl => s.no_url += 1,
                    ServiceStatus::Failed => s.failed_requests += 1,
                }
                s
            },
        )
    }

    /// Every entry that did not end in an unsubscribe.
    pub fn failed(&self) -> usize {
        self.total - self.unsubscribed
    }

    pub fn log(&self) {
        info!("Total services detected: {}", self.total);
        info!("Successfully unsubscribed: {}", self.unsubscribed);
        info!("Failed to unsubscribe: {}", self.failed());
        if self.failed() > 0 {
            info!(
                "  no unsubscribe URL: {}, request failed: {}",
                self.no_url, self.failed_requests
            );
        }
    }
}

/// Writes `Service,Status` plus one row per result, CRLF terminated.
pub fn write_csv(path: &Path, results: &[ServiceResult]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_path(path)?;
    wtr.write_record(["Service", "Status"])?;
    for r in results {
        wtr.write_record([r.sender.as_str(), r.status.label()])?;
    }
    wtr.flush()?;
    info!("Services saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample() -> Vec<ServiceResult> {
        vec![
            ServiceResult::new("A <a@a.com>", ServiceStatus::Unsubscribed),
            ServiceResult::new("B, Inc. <b@b.com>", ServiceStatus::NoUnsubscribeUrl),
            ServiceResult::new("B, Inc. <b@b.com>", ServiceStatus::NoUnsubscribeUrl),
            ServiceResult::new("C <c@c.com>", ServiceStatus::Failed),
        ]
    }

    #[test]
    fn counts_by_status() {
        let s = Summary::from_results(&sample());
        assert_eq!(s.total, 4);
        assert_eq!(s.unsubscribed, 1);
        assert_eq!(s.no_url, 2);
        assert_eq!(s.failed_requests, 1);
        assert_eq!(s.failed(), 3);
    }

    #[test]
    fn summary_is_idempotent() {
        let results = sample();
        assert_eq!(Summary::from_results(&results), Summary::from_results(&results));
        assert_eq!(Summary::from_results(&[]), Summary::default());
    }

    #[test]
    fn csv_has_header_and_quoted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.csv");
        write_csv(&path, &sample()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Service,Status\r\nA <a@a.com>,Unsubscribed\r\n"));
        assert!(text.ends_with("C <c@c.com>,Failed\r\n"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Service,Status");
        assert_eq!(lines[1], "A <a@a.com>,Unsubscribed");
        assert_eq!(lines[2], "\"B, Inc. <b@b.com>\",No unsubscribe URL");
        assert_eq!(lines[4], "C <c@c.com>,Failed");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn csv_with_no_results_is_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_csv(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Service,Status\r\n");
    }
}
