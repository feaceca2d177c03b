use async_trait::async_trait;

use crate::{error::KanshiResult, fetch::Fetch, model::LiveInfo, platform::PlatformKind};

/// One platform's room extraction.
///
/// Offline rooms are a normal [crate::LiveStatus::NotLive] result, never an
/// error. A missing structural marker is [crate::KanshiError::ParseFailed]
/// and transport problems are [crate::KanshiError::FetchFailed].
#[async_trait]
pub trait Extract: Send + Sync {
    fn kind(&self) -> PlatformKind;

    async fn extract(&self, url: &str, fetcher: &dyn Fetch) -> KanshiResult<LiveInfo>;
}
