use anyhow::Result;
use log::{info, warn};
use std::cell::RefCell;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::oauth::{self, TokenGrant};
use crate::auth::tokens_file::{self, CachedToken};
use crate::auth::{AccessTokenSource, GMAIL_MODIFY_SCOPE, token_store};
use crate::config::Config;

/// Assumed lifetime when the provider omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3500;

/// Gmail credentials for one mailbox: cached token, then keyring refresh
/// token, then the interactive browser flow.
pub struct TokenManager {
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
    user_email: String,
    current: RefCell<Option<CachedToken>>,
}

fn now_epoch() -> Result<i64> {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    Ok(i64::try_from(secs)?)
}

fn expiry_epoch(now: i64, expires_in: Option<u64>) -> i64 {
    let lifetime = expires_in.map_or(DEFAULT_TOKEN_LIFETIME_SECS, |s| {
        i64::try_from(s).unwrap_or(i64::MAX)
    });
    now.saturating_add(lifetime)
}

impl TokenManager {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client_secret = token_store::load_client_secret(&cfg.client_id)?
            .or_else(|| std::env::var("OAUTH_CLIENT_SECRET").ok());

        Ok(Self {
            client_id: cfg.client_id.clone(),
            client_secret,
            redirect_uri: cfg.redirect_uri().to_string(),
            user_email: cfg.user_email()?.to_string(),
            current: RefCell::new(None),
        })
    }

    fn remember(&self, grant: TokenGrant, now: i64) -> Result<String> {
        if let Some(rt) = &grant.refresh_token
            && let Err(e) = token_store::save_refresh_token(&self.user_email, rt)
        {
            warn!("could not store refresh token in keyring: {e}");
        }

        let cached = CachedToken {
            access_token: grant.access_token,
            expires_at_epoch: expiry_epoch(now, grant.expires_in),
        };
        if let Err(e) = tokens_file::save_token(&cached) {
            warn!("could not cache access token: {e}");
        }
        let token = cached.access_token.clone();
        *self.current.borrow_mut() = Some(cached);
        Ok(token)
    }

    fn obtain(&self, now: i64) -> Result<String> {
        if let Some(cached) = tokens_file::load_token()?
            && cached.is_fresh(now)
        {
            let token = cached.access_token.clone();
            *self.current.borrow_mut() = Some(cached);
            return Ok(token);
        }

        if let Some(rt) = token_store::load_refresh_token(&self.user_email)? {
            match oauth::refresh_access_token(&self.client_id, self.client_secret.as_deref(), &rt)
            {
                Ok(grant) => {
                    info!("refreshed Gmail access token for {}", self.user_email);
                    return self.remember(grant, now);
                }
                Err(e) => warn!("refresh failed, falling back to interactive auth: {e}"),
            }
        }

        info!("no usable Gmail credentials; starting browser authorization");
        let grant = oauth::authorize_interactive(
            &self.client_id,
            self.client_secret.as_deref(),
            &self.redirect_uri,
            GMAIL_MODIFY_SCOPE,
        )?;
        self.remember(grant, now)
    }
}

impl AccessTokenSource for TokenManager {
    fn access_token(&self) -> Result<String> {
        let now = now_epoch()?;
        if let Some(cached) = self.current.borrow().as_ref()
            && cached.is_fresh(now)
        {
            return Ok(cached.access_token.clone());
        }
        self.obtain(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_uses_provider_lifetime_or_default() {
        assert_eq!(expiry_epoch(1_000, Some(3599)), 4_599);
        assert_eq!(expiry_epoch(1_000, None), 1_000 + DEFAULT_TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn huge_lifetime_saturates() {
        assert_eq!(expiry_epoch(1_000, Some(u64::MAX)), i64::MAX);
        assert_eq!(expiry_epoch(i64::MAX - 1, Some(10)), i64::MAX);
    }

    #[test]
    fn clock_is_after_epoch() {
        assert!(now_epoch().unwrap() > 0);
    }
}
