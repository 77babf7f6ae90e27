pub mod oauth;
pub mod token_manager;
pub mod token_store;
pub mod tokens_file;

use anyhow::Result;

/// Gmail scope needed to search, read and relabel messages.
pub const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Hands out a bearer token for provider calls. Implementations own storage
/// and refresh; callers just ask before each request.
pub trait AccessTokenSource {
    fn access_token(&self) -> Result<String>;
}

impl<T: AccessTokenSource + ?Sized> AccessTokenSource for &T {
    fn access_token(&self) -> Result<String> {
        (**self).access_token()
    }
}

impl<T: AccessTokenSource + ?Sized> AccessTokenSource for Box<T> {
    fn access_token(&self) -> Result<String> {
        (**self).access_token()
    }
}

/// A token obtained out of band (e.g. `--access-token`).
pub struct StaticToken(pub String);

impl AccessTokenSource for StaticToken {
    fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
