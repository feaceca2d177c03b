use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;

use super::{Fetch, PageRequest};
use crate::{
    error::{KanshiError, KanshiResult},
    profile::PlatformProfile,
};

enum MockResponse {
    Body(String),
    Status(u16),
    Error(String),
}

struct MockRoute {
    url: String,
    body_contains: Option<String>,
    response: MockResponse,
}

/// In-memory [Fetch] returning canned responses by url.
///
/// Routes are matched in registration order. Unmatched urls fail with
/// [KanshiError::FetchFailed].
#[derive(Default)]
pub struct MockFetcher {
    routes: Vec<MockRoute>,
    requests: Mutex<Vec<PageRequest>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page<U: Into<String>, B: Into<String>>(mut self, url: U, body: B) -> Self {
        self.routes.push(MockRoute {
            url: url.into(),
            body_contains: None,
            response: MockResponse::Body(body.into()),
        });
        self
    }

    /// Respond only to requests whose body contains `needle`.
    pub fn page_with_body<U, N, B>(mut self, url: U, needle: N, body: B) -> Self
    where
        U: Into<String>,
        N: Into<String>,
        B: Into<String>,
    {
        self.routes.push(MockRoute {
            url: url.into(),
            body_contains: Some(needle.into()),
            response: MockResponse::Body(body.into()),
        });
        self
    }

    pub fn status<U: Into<String>>(mut self, url: U, status: u16) -> Self {
        self.routes.push(MockRoute {
            url: url.into(),
            body_contains: None,
            response: MockResponse::Status(status),
        });
        self
    }

    pub fn error<U: Into<String>, M: Into<String>>(mut self, url: U, message: M) -> Self {
        self.routes.push(MockRoute {
            url: url.into(),
            body_contains: None,
            response: MockResponse::Error(message.into()),
        });
        self
    }

    /// Requests received by [Fetch::fetch_page] so far.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn find(&self, url: &str, body: Option<&str>) -> Option<&MockResponse> {
        self.routes
            .iter()
            .find(|route| {
                route.url == url
                    && match (&route.body_contains, body) {
                        (None, _) => true,
                        (Some(needle), Some(body)) => body.contains(needle.as_str()),
                        (Some(_), None) => false,
                    }
            })
            .map(|route| &route.response)
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch_page(
        &self,
        _profile: &PlatformProfile,
        request: PageRequest,
    ) -> KanshiResult<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match self.find(&request.url, request.body.as_deref()) {
            Some(MockResponse::Body(body)) => Ok(body.clone()),
            Some(MockResponse::Status(status)) => Err(KanshiError::FetchFailed(format!(
                "{} responded with {status}",
                request.url
            ))),
            Some(MockResponse::Error(message)) => Err(KanshiError::FetchFailed(message.clone())),
            None => Err(KanshiError::FetchFailed(format!("no route for {}", request.url))),
        }
    }

    async fn fetch_status(
        &self,
        _profile: &PlatformProfile,
        url: &str,
        _timeout: Duration,
    ) -> KanshiResult<u16> {
        match self.find(url, None) {
            Some(MockResponse::Status(status)) => Ok(*status),
            Some(MockResponse::Body(_)) => Ok(200),
            Some(MockResponse::Error(message)) => Err(KanshiError::FetchFailed(message.clone())),
            None => Err(KanshiError::FetchFailed(format!("no route for {url}"))),
        }
    }
}
