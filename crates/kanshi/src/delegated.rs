//! Platforms whose media info comes from a structured extraction service
//! instead of being scraped here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::KanshiResult,
    model::{LiveInfo, LiveStatus, Stream, StreamingProtocol},
    platform::PlatformKind,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaInfo {
    pub is_live: bool,
    pub title: String,
    pub author_name: String,
    pub author_avatar: String,
    pub view_count: String,
    pub thumbnail: String,
    pub formats: Vec<MediaFormat>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaFormat {
    pub url: String,
    pub quality_label: String,
    pub is_hls: bool,
}

#[async_trait]
pub trait MediaInfoProvider: Send + Sync {
    async fn media_info(&self, url: &str) -> KanshiResult<MediaInfo>;
}

impl MediaInfo {
    pub fn into_live_info(self, url: &str, platform_kind: PlatformKind) -> LiveInfo {
        let status = if self.is_live {
            LiveStatus::Live
        } else {
            LiveStatus::NotLive
        };
        let streams = if self.is_live {
            self.formats
                .into_iter()
                .filter(|format| !format.url.is_empty())
                .map(|format| {
                    let protocol = if format.is_hls {
                        StreamingProtocol::Hls
                    } else {
                        StreamingProtocol::Flv
                    };
                    Stream::new(format.url, format.quality_label, protocol)
                })
                .collect()
        } else {
            Vec::new()
        };

        LiveInfo {
            url: url.to_string(),
            anchor_name: self.author_name,
            anchor_avatar: self.author_avatar,
            title: self.title,
            status,
            viewer_count: self.view_count,
            room_cover: self.thumbnail,
            streams,
            platform_kind,
        }
    }
}
