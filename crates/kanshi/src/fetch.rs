mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

use std::time::Duration;

use async_trait::async_trait;

pub use http::{HttpFetcher, DEFAULT_TIMEOUT};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockFetcher;

use crate::{error::KanshiResult, profile::PlatformProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub url: String,
    pub method: Method,
    /// Sent after the profile headers, replacing them on conflict
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl PageRequest {
    pub fn get<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn post<S: Into<String>, B: Into<String>>(url: S, body: B) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            body: Some(body.into()),
            ..Default::default()
        }
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// Transport used by extractors. Timeouts and cancellation belong to the
/// implementation.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch a page body. Transport errors and non-success statuses are
    /// [crate::KanshiError::FetchFailed].
    async fn fetch_page(&self, profile: &PlatformProfile, request: PageRequest)
        -> KanshiResult<String>;

    /// Probe a url and report its status code, whatever it is.
    async fn fetch_status(
        &self,
        profile: &PlatformProfile,
        url: &str,
        timeout: Duration,
    ) -> KanshiResult<u16>;
}
