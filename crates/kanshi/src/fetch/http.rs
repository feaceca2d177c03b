use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use fake_user_agent::get_chrome_rua;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, COOKIE, USER_AGENT},
    Client, ClientBuilder, RequestBuilder,
};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};

use super::{Fetch, Method, PageRequest};
use crate::{
    error::{KanshiError, KanshiResult},
    profile::PlatformProfile,
};

/// Request timeout used by the command line.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [Fetch] backed by a shared reqwest client with a cookie store.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    cookies_store: Arc<CookieStoreMutex>,
}

impl HttpFetcher {
    pub fn new(builder: ClientBuilder) -> KanshiResult<Self> {
        let cookies_store = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        let client = builder.cookie_provider(cookies_store.clone()).build()?;

        Ok(Self {
            client,
            cookies_store,
        })
    }

    /// Client with a total request timeout of `timeout`.
    pub fn with_timeout(timeout: Duration) -> KanshiResult<Self> {
        Self::new(Client::builder().timeout(timeout))
    }

    /// Number of cookies collected from `Set-Cookie` responses so far.
    pub fn cookie_count(&self) -> usize {
        self.cookies_store
            .lock()
            .map(|store| store.iter_any().count())
            .unwrap_or_default()
    }

    fn headers(profile: &PlatformProfile, extra: &[(String, String)]) -> KanshiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let user_agent = profile
            .user_agent
            .clone()
            .unwrap_or_else(|| get_chrome_rua().to_string());
        headers.insert(USER_AGENT, header_value(&user_agent)?);
        if let Some(cookies) = &profile.cookies {
            headers.insert(COOKIE, header_value(cookies)?);
        }

        for (key, value) in profile.extra_headers.iter().chain(extra) {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| KanshiError::fetch(format!("invalid header name {key}: {e}")))?;
            headers.insert(name, header_value(value)?);
        }

        Ok(headers)
    }

    fn request(&self, profile: &PlatformProfile, request: &PageRequest) -> KanshiResult<RequestBuilder> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        let mut builder = builder.headers(Self::headers(profile, &request.headers)?);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        Ok(builder)
    }
}

fn header_value(value: &str) -> KanshiResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| KanshiError::fetch(format!("invalid header value: {e}")))
}


#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch_page(
        &self,
        profile: &PlatformProfile,
        request: PageRequest,
    ) -> KanshiResult<String> {
        log::debug!("Fetching {}", request.url);
        let response = self.request(profile, &request)?.send().await?;
        let status = response.status();
        if !status.is_success() {
            if let Ok(body) = response.text().await {
                log::debug!("Error body: {body}");
            }
            return Err(KanshiError::FetchFailed(format!(
                "{} responded with {status}",
                request.url
            )));
        }

        Ok(response.text().await?)
    }

    async fn fetch_status(
        &self,
        profile: &PlatformProfile,
        url: &str,
        timeout: Duration,
    ) -> KanshiResult<u16> {
        let response = self
            .request(profile, &PageRequest::get(url))?
            .timeout(timeout)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }
}
