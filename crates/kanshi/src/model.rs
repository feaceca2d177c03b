use serde::{Deserialize, Serialize};

use crate::platform::PlatformKind;

/// Normalized description of a live room, rebuilt on every resolution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveInfo {
    pub url: String,
    pub anchor_name: String,
    pub anchor_avatar: String,
    pub title: String,
    pub status: LiveStatus,
    pub viewer_count: String,
    /// Empty when the platform provides no cover
    pub room_cover: String,
    pub streams: Vec<Stream>,
    pub platform_kind: PlatformKind,
}

impl LiveInfo {
    /// An offline room with every field but the url and platform left empty.
    pub fn not_live<S: Into<String>>(url: S, platform_kind: PlatformKind) -> Self {
        Self {
            url: url.into(),
            anchor_name: String::new(),
            anchor_avatar: String::new(),
            title: String::new(),
            status: LiveStatus::NotLive,
            viewer_count: String::new(),
            room_cover: String::new(),
            streams: Vec::new(),
            platform_kind,
        }
    }

    pub fn is_live(&self) -> bool {
        self.status == LiveStatus::Live
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub url: String,
    /// Free-form label such as `origin`, `hd1` or `720p60`
    pub resolution: String,
    pub protocol: StreamingProtocol,
}

impl Stream {
    pub fn new<U, R>(url: U, resolution: R, protocol: StreamingProtocol) -> Self
    where
        U: Into<String>,
        R: Into<String>,
    {
        Self {
            url: url.into(),
            resolution: resolution.into(),
            protocol,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum StreamingProtocol {
    #[default]
    Flv,
    Hls,
}

impl StreamingProtocol {
    pub fn extension(&self) -> &'static str {
        match self {
            StreamingProtocol::Flv => "flv",
            StreamingProtocol::Hls => "ts",
        }
    }
}

impl std::str::FromStr for StreamingProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flv" => Ok(Self::Flv),
            "hls" | "m3u8" => Ok(Self::Hls),
            _ => Err(format!("unknown streaming protocol: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum LiveStatus {
    Live,
    #[default]
    NotLive,
}

/// A recording plan owned by an external plan store.
///
/// The resolver only reads `url`, `stream_protocol` and `stream_resolution`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingPlan {
    pub url: String,
    pub strategy: RecordingStrategy,
    pub stream_protocol: StreamingProtocol,
    pub stream_resolution: String,
    pub enabled: bool,
    /// Milliseconds since epoch
    pub created_at: i64,
    /// Milliseconds since epoch, 0 if never updated
    pub updated_at: i64,
    pub live_info: Option<LiveInfo>,
}

impl RecordingPlan {
    pub fn new<U, R>(
        url: U,
        stream_protocol: StreamingProtocol,
        stream_resolution: R,
        created_at: i64,
    ) -> Self
    where
        U: Into<String>,
        R: Into<String>,
    {
        Self {
            url: url.into(),
            strategy: RecordingStrategy::AnchorLive,
            stream_protocol,
            stream_resolution: stream_resolution.into(),
            enabled: true,
            created_at,
            updated_at: 0,
            live_info: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum RecordingStrategy {
    /// Record between two timestamps
    Timed(i64, i64),
    /// Start at a timestamp, record for a number of seconds
    TimedWithDuration(i64, i64),
    /// Start at a timestamp, record until the anchor goes offline
    TimedUntilAnchorEnd(i64),
    /// Record whenever the anchor is live
    #[default]
    AnchorLive,
    /// Record for a number of seconds once the anchor is live
    AnchorLiveWithDuration(i64),
}
