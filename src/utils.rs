//! Small helpers shared by the fetcher, the prober and the binaries.

use chrono::{DateTime, SubsecRound, Utc};
use std::time::Duration;
use url::Url;

/// The version of the lliurex-state package
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent sent with every request to the mirror.
pub fn user_agent() -> String {
    format!("lliurex-state/{}", VERSION)
}

/// Build the HTTP client used against the mirror.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent())
        .timeout(timeout)
        .build()
}

/// Resolve `path` below `base`, treating `base` as a directory even when
/// it lacks a trailing slash.
///
/// ```
/// use lliurex_state::utils::join_url;
/// let base = url::Url::parse("http://lliurex.net/mirror").unwrap();
/// assert_eq!(
///     join_url(&base, "jammy/").unwrap().as_str(),
///     "http://lliurex.net/mirror/jammy/"
/// );
/// ```
pub fn join_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    if base.path().ends_with('/') {
        base.join(path)
    } else {
        let mut base = base.clone();
        base.set_path(&format!("{}/", base.path()));
        base.join(path)
    }
}

/// Name of the machine running the probe, if it is valid UTF-8.
pub fn hostname() -> Option<String> {
    gethostname::gethostname().into_string().ok()
}

/// The current time with sub-second precision dropped.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_with_trailing_slash() {
        let base = Url::parse("http://lliurex.net/").unwrap();
        assert_eq!(
            join_url(&base, "noble/dists/noble/Release").unwrap().as_str(),
            "http://lliurex.net/noble/dists/noble/Release"
        );
    }

    #[test]
    fn test_join_url_keeps_base_path() {
        let base = Url::parse("http://lliurex.net/mirror").unwrap();
        assert_eq!(
            join_url(&base, "focal/").unwrap().as_str(),
            "http://lliurex.net/mirror/focal/"
        );
    }

    #[test]
    fn test_now_has_no_subseconds() {
        assert_eq!(now().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_user_agent() {
        assert!(user_agent().starts_with("lliurex-state/"));
    }
}
