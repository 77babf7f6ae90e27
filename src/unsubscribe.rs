use std::time::Duration;

use log::{error, info};
use reqwest::blocking::Client;

pub const UNSUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can act on an unsubscribe URL.
pub trait Unsubscriber {
    /// Returns `true` when the endpoint accepted the request.
    fn unsubscribe(&self, url: &str) -> bool;
}

impl<U: Unsubscriber + ?Sized> Unsubscriber for &U {
    fn unsubscribe(&self, url: &str) -> bool {
        (**self).unsubscribe(url)
    }
}

/// Fetches the URL with a single GET. Any 2xx/3xx final status counts as done;
/// nothing checks what the endpoint actually did.
pub struct HttpUnsubscriber {
    client: Client,
}

impl HttpUnsubscriber {
    pub fn new() -> crate::error::Result<Self> {
        let client = Client::builder().timeout(UNSUBSCRIBE_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

impl Unsubscriber for HttpUnsubscriber {
    fn unsubscribe(&self, url: &str) -> bool {
        match self.client.get(url).send() {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() || status.is_redirection() {
                    info!("Successfully unsubscribed: {url}");
                    true
                } else {
                    error!("Failed to unsubscribe: {url}. Error: HTTP {status}");
                    false
                }
            }
            Err(e) => {
                error!("Failed to unsubscribe: {url}. Error: {e}");
                false
            }
        }
    }
}

/// Logs the URL and reports success without sending anything.
pub struct DryRunUnsubscriber;

impl Unsubscriber for DryRunUnsubscriber {
    fn unsubscribe(&self, url: &str) -> bool {
        info!("[dry-run] would unsubscribe via {url}");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;
    use tiny_http::{Response, Server};

    /// Serves exactly one request with `status` and returns the base URL.
    fn one_shot_server(status: u16) -> (String, thread::JoinHandle<()>) {
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let server = Server::http(("127.0.0.1", port)).unwrap();
        let handle = thread::spawn(move || {
            if let Ok(req) = server.recv() {
                let _ = req.respond(Response::empty(status));
            }
        });
        (format!("http://127.0.0.1:{port}"), handle)
    }

    #[test]
    fn ok_status_is_success() {
        let (base, h) = one_shot_server(200);
        let u = HttpUnsubscriber::new().unwrap();
        assert!(u.unsubscribe(&format!("{base}/unsubscribe?id=1")));
        h.join().unwrap();
    }

    #[test]
    fn not_modified_counts_as_success() {
        let (base, h) = one_shot_server(304);
        let u = HttpUnsubscriber::new().unwrap();
        assert!(u.unsubscribe(&format!("{base}/unsubscribe")));
        h.join().unwrap();
    }

    #[test]
    fn error_status_is_failure() {
        let (base, h) = one_shot_server(404);
        let u = HttpUnsubscriber::new().unwrap();
        assert!(!u.unsubscribe(&format!("{base}/unsubscribe")));
        h.join().unwrap();
    }

    #[test]
    fn malformed_url_is_a_failure() {
        let u = HttpUnsubscriber::new().unwrap();
        assert!(!u.unsubscribe("http://"));
    }

    #[test]
    fn dry_run_always_succeeds() {
        assert!(DryRunUnsubscriber.unsubscribe("https://x.com/unsubscribe"));
    }
}
