use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;

/// Header name Jenkins uses when the crumb comes from configuration instead
/// of the issuer (which names the field itself).
pub const DEFAULT_CRUMB_FIELD: &str = "Jenkins-Crumb";

/// CSRF token issued by `GET {base}/crumbIssuer/api/json`. The
/// `crumbRequestField` value names the header the crumb must be sent under.
#[derive(Debug, Clone, Deserialize)]
pub struct Crumb {
    #[serde(rename = "_class", default)]
    pub class: Option<String>,
    pub crumb: String,
    #[serde(rename = "crumbRequestField")]
    pub crumb_request_field: String,
}

impl Crumb {
    /// Build a crumb from a pre-shared token, e.g. one stored in the config
    /// file, sent under the standard header name.
    pub fn preset(value: impl Into<String>) -> Self {
        Crumb {
            class: None,
            crumb: value.into(),
            crumb_request_field: DEFAULT_CRUMB_FIELD.to_string(),
        }
    }
}

/// Per-client crumb store. A crumb is fetched at most once for the lifetime
/// of the client and reused afterwards; an instance with CSRF protection
/// disabled is remembered so the issuer is not asked again.
#[derive(Clone)]
pub struct CrumbCache {
    state: Arc<Mutex<CrumbState>>,
}

struct CrumbState {
    crumb: Option<Crumb>,
    issuer_disabled: bool,
}

impl CrumbCache {
    pub fn new(preset: Option<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CrumbState {
                crumb: preset.map(Crumb::preset),
                issuer_disabled: false,
            })),
        }
    }

    /// Return the cached crumb, fetching it through `fetch` on first use.
    /// `fetch` resolving to `None` means the instance has no crumb issuer;
    /// that outcome is cached as well and subsequent calls return `None`
    /// without fetching. The lock is held across the check-fetch-store
    /// window so concurrent callers observe a single fetch.
    pub async fn get_or_try_fetch<F, Fut>(&self, fetch: F) -> Result<Option<Crumb>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Crumb>>>,
    {
        let mut state = self.state.lock().await;

        if state.issuer_disabled {
            return Ok(None);
        }
        if let Some(crumb) = &state.crumb {
            return Ok(Some(crumb.clone()));
        }

        match fetch().await? {
            Some(crumb) => {
                debug!(field = %crumb.crumb_request_field, "Caching CSRF crumb");
                state.crumb = Some(crumb.clone());
                Ok(Some(crumb))
            }
            None => {
                debug!("Crumb issuer disabled, remembering");
                state.issuer_disabled = true;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn issued(value: &str) -> Crumb {
        Crumb {
            class: Some("hudson.security.csrf.DefaultCrumbIssuer".to_string()),
            crumb: value.to_string(),
            crumb_request_field: "Jenkins-Crumb".to_string(),
        }
    }

    #[tokio::test]
    async fn fetches_once_and_caches() {
        let cache = CrumbCache::new(None);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let crumb = cache
                .get_or_try_fetch(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(issued("abc123")))
                })
                .await
                .unwrap();
            assert_eq!(crumb.unwrap().crumb, "abc123");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn preset_crumb_skips_fetch() {
        let cache = CrumbCache::new(Some("from-config".to_string()));

        let crumb = cache
            .get_or_try_fetch(|| async { panic!("issuer should not be asked") })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(crumb.crumb, "from-config");
        assert_eq!(crumb.crumb_request_field, DEFAULT_CRUMB_FIELD);
    }

    #[tokio::test]
    async fn disabled_issuer_is_remembered() {
        let cache = CrumbCache::new(None);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let crumb = cache
                .get_or_try_fetch(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .await
                .unwrap();
            assert!(crumb.is_none());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn crumb_deserializes_issuer_response() {
        let raw = r#"{
            "_class": "hudson.security.csrf.DefaultCrumbIssuer",
            "crumb": "6bbabc426436b4ad2f949cf2b6650a0b",
            "crumbRequestField": "Jenkins-Crumb"
        }"#;

        let crumb: Crumb = serde_json::from_str(raw).unwrap();
        assert_eq!(crumb.crumb, "6bbabc426436b4ad2f949cf2b6650a0b");
        assert_eq!(crumb.crumb_request_field, "Jenkins-Crumb");
        assert_eq!(
            crumb.class.as_deref(),
            Some("hudson.security.csrf.DefaultCrumbIssuer")
        );
    }
}
