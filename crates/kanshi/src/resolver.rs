use std::{collections::HashMap, sync::Arc};

use crate::{
    error::{KanshiError, KanshiResult},
    extract::Extract,
    fetch::Fetch,
    model::LiveInfo,
    platform::PlatformKind,
};

/// Single entry point turning a room url into a [LiveInfo].
///
/// The resolver holds no per-call state and may be shared across tasks.
pub struct Resolver {
    fetcher: Arc<dyn Fetch>,
    extractors: HashMap<PlatformKind, Arc<dyn Extract>>,
}

pub struct ResolverBuilder {
    fetcher: Arc<dyn Fetch>,
    extractors: HashMap<PlatformKind, Arc<dyn Extract>>,
}

impl ResolverBuilder {
    /// Register an extractor under its own [PlatformKind], replacing any
    /// previous one.
    pub fn register<E>(mut self, extractor: E) -> Self
    where
        E: Extract + 'static,
    {
        self.extractors.insert(extractor.kind(), Arc::new(extractor));
        self
    }

    pub fn register_arc(mut self, extractor: Arc<dyn Extract>) -> Self {
        self.extractors.insert(extractor.kind(), extractor);
        self
    }

    pub fn build(self) -> Resolver {
        Resolver {
            fetcher: self.fetcher,
            extractors: self.extractors,
        }
    }
}

impl Resolver {
    pub fn builder(fetcher: Arc<dyn Fetch>) -> ResolverBuilder {
        ResolverBuilder {
            fetcher,
            extractors: HashMap::new(),
        }
    }

    pub fn supports(&self, kind: PlatformKind) -> bool {
        self.extractors.contains_key(&kind)
    }

    /// Classify `url` and run the matching extractor once. No retries.
    pub async fn resolve(&self, url: &str) -> KanshiResult<LiveInfo> {
        let url = url.trim();
        let kind = PlatformKind::classify(url);
        let extractor = self
            .extractors
            .get(&kind)
            .ok_or_else(|| KanshiError::UnsupportedPlatform(url.to_string()))?;

        log::debug!("Resolving {url} as {kind}");
        extractor.extract(url, self.fetcher.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        fetch::{MockFetcher, PageRequest},
        model::{LiveStatus, Stream, StreamingProtocol},
        profile::PlatformProfile,
    };

    struct PageLength;

    #[async_trait]
    impl Extract for PageLength {
        fn kind(&self) -> PlatformKind {
            PlatformKind::Huya
        }

        async fn extract(&self, url: &str, fetcher: &dyn Fetch) -> KanshiResult<LiveInfo> {
            let page = fetcher
                .fetch_page(&PlatformProfile::default(), PageRequest::get(url))
                .await?;
            if page == "offline" {
                return Ok(LiveInfo::not_live(url, self.kind()));
            }

            let mut info = LiveInfo::not_live(url, self.kind());
            info.status = LiveStatus::Live;
            info.title = page;
            info.streams
                .push(Stream::new("https://cdn/1.flv", "default", StreamingProtocol::Flv));
            Ok(info)
        }
    }

    fn resolver(fetcher: MockFetcher) -> Resolver {
        Resolver::builder(Arc::new(fetcher)).register(PageLength).build()
    }

    #[tokio::test]
    async fn test_unknown_platform() {
        let resolver = resolver(MockFetcher::new());
        let result = resolver.resolve("https://example.com/room/1").await;
        assert!(matches!(result, Err(KanshiError::UnsupportedPlatform(_))));
    }

    #[tokio::test]
    async fn test_unregistered_platform() {
        let resolver = resolver(MockFetcher::new());
        assert!(!resolver.supports(PlatformKind::Twitch));
        let result = resolver.resolve("https://www.twitch.tv/someone").await;
        assert!(matches!(result, Err(KanshiError::UnsupportedPlatform(_))));
    }

    #[tokio::test]
    async fn test_dispatch_to_extractor() {
        let resolver = resolver(MockFetcher::new().page("https://www.huya.com/1", "hello"));
        let info = resolver.resolve("  https://www.huya.com/1 ").await.unwrap();
        assert!(info.is_live());
        assert_eq!(info.title, "hello");
        assert_eq!(info.platform_kind, PlatformKind::Huya);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let resolver = resolver(MockFetcher::new().error("https://www.huya.com/1", "reset"));
        let result = resolver.resolve("https://www.huya.com/1").await;
        assert!(matches!(result, Err(KanshiError::FetchFailed(_))));
    }

    #[tokio::test]
    async fn test_offline_resolution_is_idempotent() {
        let resolver = resolver(MockFetcher::new().page("https://www.huya.com/2", "offline"));
        let first = resolver.resolve("https://www.huya.com/2").await.unwrap();
        let second = resolver.resolve("https://www.huya.com/2").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.status, LiveStatus::NotLive);
    }
}
