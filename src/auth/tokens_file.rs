use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::config::app_dir;

/// Seconds shaved off the expiry so a token is not used right as it lapses.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Last access token and its expiry, kept in `<config>/mail_unsubscriber/tokens.json`.
/// The access token is short lived; the refresh token lives in the keyring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at_epoch: i64,
}

impl CachedToken {
    pub fn is_fresh(&self, now_epoch: i64) -> bool {
        now_epoch + EXPIRY_SKEW_SECS < self.expires_at_epoch
    }
}

fn tokens_path() -> Result<PathBuf> {
    Ok(app_dir()?.join("tokens.json"))
}

pub fn save_token(token: &CachedToken) -> Result<()> {
    fs::write(tokens_path()?, serde_json::to_string_pretty(token)?)?;
    Ok(())
}

pub fn load_token() -> Result<Option<CachedToken>> {
    let p = tokens_path()?;
    if !p.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(&p)?;
    // An unreadable cache is just a cache miss.
    Ok(serde_json::from_str(&s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_respects_skew() {
        let t = CachedToken {
            access_token: "abc".into(),
            expires_at_epoch: 1_000,
        };
        assert!(t.is_fresh(900));
        assert!(!t.is_fresh(940));
        assert!(!t.is_fresh(1_000));
    }
}
