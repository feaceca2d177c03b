use std::sync::LazyLock;

use async_trait::async_trait;
use kanshi::{
    util::{
        json::{str_at, text_at},
        sentinel::Sentinel,
    },
    Extract, Fetch, KanshiResult, LiveInfo, LiveStatus, PageRequest, PlatformKind,
    PlatformProfile, Stream, StreamingProtocol,
};
use serde_json::Value;

static SIGI_STATE: LazyLock<Sentinel> = LazyLock::new(|| {
    Sentinel::new(
        "SIGI_STATE",
        r#"<script id="SIGI_STATE" type="application/json">(.*?)</script><script id="SIGI_RETRY" type="application/json">"#,
    )
    .unwrap()
});

const USER_STATUS_LIVE: u64 = 2;

pub struct TiktokExtractor {
    profile: PlatformProfile,
}

impl TiktokExtractor {
    pub fn new(profile: PlatformProfile) -> Self {
        Self { profile }
    }

    pub fn default_profile() -> PlatformProfile {
        PlatformProfile::new()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36 Edg/114.0.1823.79")
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            )
            .cookies("tiktok_webapp_theme=light")
    }
}

impl Default for TiktokExtractor {
    fn default() -> Self {
        Self::new(Self::default_profile())
    }
}

#[async_trait]
impl Extract for TiktokExtractor {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Tiktok
    }

    async fn extract(&self, url: &str, fetcher: &dyn Fetch) -> KanshiResult<LiveInfo> {
        let page = fetcher
            .fetch_page(&self.profile, PageRequest::get(url))
            .await?;
        parse_room_page(url, &page)
    }
}

/// Parse a TikTok `/@user/live` page.
///
/// The state script holds plain JSON, no unescaping needed.
pub fn parse_room_page(url: &str, html: &str) -> KanshiResult<LiveInfo> {
    let state: Value = serde_json::from_str(SIGI_STATE.extract(html)?)?;
    let mut info = LiveInfo::not_live(url, PlatformKind::Tiktok);
    let Some(room_info) = state.pointer("/LiveRoom/liveRoomUserInfo") else {
        log::debug!("{url}: no LiveRoom in page state");
        return Ok(info);
    };

    let user = room_info.get("user").unwrap_or(&Value::Null);
    info.anchor_name = format!(
        "{}(@{})",
        str_at(user, "/nickname"),
        str_at(user, "/uniqueId")
    );
    info.anchor_avatar = str_at(user, "/avatarThumb").to_string();
    let status = user.get("status").and_then(Value::as_u64).unwrap_or_default();
    if status != USER_STATUS_LIVE {
        return Ok(info);
    }

    let room = room_info.get("liveRoom").unwrap_or(&Value::Null);
    let streams = match room_streams(room) {
        Ok(streams) if !streams.is_empty() => streams,
        Ok(_) => {
            log::warn!("{url}: room is live but carries no stream urls");
            return Ok(info);
        }
        Err(e) => {
            log::warn!("{url}: malformed stream data: {e}");
            return Ok(info);
        }
    };

    info.status = LiveStatus::Live;
    info.title = str_at(room, "/title").to_string();
    info.room_cover = str_at(room, "/coverUrl").to_string();
    info.viewer_count = text_at(room, "/liveRoomStats/userCount");
    info.streams = streams;
    Ok(info)
}

/// Streams are a JSON document nested as a string, keyed by quality.
fn room_streams(room: &Value) -> KanshiResult<Vec<Stream>> {
    let stream_data = str_at(room, "/streamData/pull_data/stream_data");
    if stream_data.is_empty() {
        return Ok(Vec::new());
    }
    let stream_data: Value = serde_json::from_str(stream_data)?;
    let Some(qualities) = stream_data.get("data").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    let mut streams = Vec::new();
    for (quality, value) in qualities {
        let flv = str_at(value, "/main/flv");
        if !flv.is_empty() {
            // https flv pulls are rejected by the cdn
            let flv = match flv.strip_prefix("https://") {
                Some(rest) => format!("http://{rest}"),
                None => flv.to_string(),
            };
            streams.push(Stream::new(flv, quality.as_str(), StreamingProtocol::Flv));
        }

        let hls = str_at(value, "/main/hls");
        if !hls.is_empty() {
            streams.push(Stream::new(hls, quality.as_str(), StreamingProtocol::Hls));
        }
    }
    Ok(streams)
}
