mod ytdlp;

use std::sync::Arc;

use async_trait::async_trait;
use kanshi::{
    delegated::MediaInfoProvider, Extract, Fetch, KanshiResult, LiveInfo, PlatformKind,
};

pub use ytdlp::{parse_info_json, YtDlp};

/// YouTube rooms are resolved by a [MediaInfoProvider], not scraped.
pub struct YoutubeExtractor {
    provider: Arc<dyn MediaInfoProvider>,
}

impl YoutubeExtractor {
    pub fn new(provider: Arc<dyn MediaInfoProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Extract for YoutubeExtractor {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Youtube
    }

    async fn extract(&self, url: &str, _fetcher: &dyn Fetch) -> KanshiResult<LiveInfo> {
        let info = self.provider.media_info(url).await?;
        Ok(info.into_live_info(url, PlatformKind::Youtube))
    }
}

#[cfg(test)]
mod tests {
    use kanshi::{
        delegated::{MediaFormat, MediaInfo},
        fetch::MockFetcher,
        KanshiError, LiveStatus, StreamingProtocol,
    };

    use super::*;

    struct Canned(Option<MediaInfo>);

    #[async_trait]
    impl MediaInfoProvider for Canned {
        async fn media_info(&self, url: &str) -> KanshiResult<MediaInfo> {
            self.0
                .clone()
                .ok_or_else(|| KanshiError::fetch(format!("{url} unavailable")))
        }
    }

    #[tokio::test]
    async fn test_delegated_live_info() {
        let provider = Canned(Some(MediaInfo {
            is_live: true,
            title: "Live now".to_string(),
            author_name: "Some Channel".to_string(),
            formats: vec![MediaFormat {
                url: "https://manifest.googlevideo.com/96.m3u8".to_string(),
                quality_label: "1080p".to_string(),
                is_hls: true,
            }],
            ..Default::default()
        }));
        let extractor = YoutubeExtractor::new(Arc::new(provider));
        let info = extractor
            .extract("https://www.youtube.com/watch?v=abc", &MockFetcher::new())
            .await
            .unwrap();
        assert_eq!(info.status, LiveStatus::Live);
        assert_eq!(info.platform_kind, PlatformKind::Youtube);
        assert_eq!(info.streams[0].protocol, StreamingProtocol::Hls);
        assert_eq!(info.streams[0].resolution, "1080p");
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let extractor = YoutubeExtractor::new(Arc::new(Canned(None)));
        let result = extractor
            .extract("https://youtu.be/abc", &MockFetcher::new())
            .await;
        assert!(matches!(result, Err(KanshiError::FetchFailed(_))));
    }
}
