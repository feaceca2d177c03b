use std::sync::LazyLock;

use async_trait::async_trait;
use kanshi::{
    util::{
        json::{str_at, text_at},
        sentinel::{unescape_embedded, Sentinel},
    },
    Extract, Fetch, KanshiResult, LiveInfo, LiveStatus, PageRequest, PlatformKind,
    PlatformProfile, Stream, StreamingProtocol,
};
use serde_json::Value;

static STATE: LazyLock<Sentinel> = LazyLock::new(|| {
    Sentinel::new("douyin room state", r#"(\{\\"state\\":.*?)]\\n"]\)"#).unwrap()
});
static ROOM_STORE: LazyLock<Sentinel> = LazyLock::new(|| {
    Sentinel::new("roomStore", r#""roomStore":(.*?),"linkmicStore""#).unwrap()
});
static NICKNAME: LazyLock<Sentinel> = LazyLock::new(|| {
    Sentinel::new("nickname", r#""nickname":"(.*?)","avatar_thumb"#).unwrap()
});

const ROOM_STATUS_LIVE: u64 = 2;
const ROOM_STATUS_DEFAULT: u64 = 4;

pub struct DouyinExtractor {
    profile: PlatformProfile,
}

impl DouyinExtractor {
    pub fn new(profile: PlatformProfile) -> Self {
        Self { profile }
    }

    pub fn default_profile() -> PlatformProfile {
        PlatformProfile::new()
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0",
            )
            .header(
                "Accept-Language",
                "zh-CN,zh;q=0.8,zh-TW;q=0.7,zh-HK;q=0.5,en-US;q=0.3,en;q=0.2",
            )
            .header("Referer", "https://live.douyin.com/")
            .cookies("ttwid=1%7CB1qls3GdnZhUov9o2NxOMxxYS2ff6OSvEWbv0ytbES4%7C1680522049%7C280d802d6d478e3e78d0c807f7c487e7ffec0ae4e5fdd6a0fe74c3c6af149511")
    }
}

impl Default for DouyinExtractor {
    fn default() -> Self {
        Self::new(Self::default_profile())
    }
}

#[async_trait]
impl Extract for DouyinExtractor {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Douyin
    }

    async fn extract(&self, url: &str, fetcher: &dyn Fetch) -> KanshiResult<LiveInfo> {
        let page = fetcher
            .fetch_page(&self.profile, PageRequest::get(url))
            .await?;
        parse_room_page(url, &page)
    }
}

/// Parse a Douyin live room page.
///
/// The room lives in an escaped JSON string pushed to a script queue. Only a
/// missing push call is an error, a page without a room store is offline.
pub fn parse_room_page(url: &str, html: &str) -> KanshiResult<LiveInfo> {
    let state = unescape_embedded(STATE.extract(html)?);
    let Some(room_store) = ROOM_STORE.find(&state) else {
        log::debug!("{url}: no roomStore in page state");
        return Ok(LiveInfo::not_live(url, PlatformKind::Douyin));
    };
    let anchor_name = NICKNAME.find(room_store).unwrap_or_default();

    // The store is cut before a key whose value is not valid JSON after unescaping
    let room_store = room_store
        .split(r#","has_commerce_goods""#)
        .next()
        .unwrap_or_default();
    let room_store: Value = serde_json::from_str(&format!("{room_store}}}}}}}"))?;
    let room = room_store.pointer("/roomInfo/room").unwrap_or(&Value::Null);

    let status = room
        .get("status")
        .and_then(Value::as_u64)
        .unwrap_or(ROOM_STATUS_DEFAULT);
    let mut info = LiveInfo::not_live(url, PlatformKind::Douyin);
    info.anchor_name = anchor_name.to_string();
    if status != ROOM_STATUS_LIVE {
        return Ok(info);
    }

    let streams = room_streams(room);
    if streams.is_empty() {
        log::warn!("{url}: room is live but carries no stream urls");
        return Ok(info);
    }

    info.status = LiveStatus::Live;
    info.title = str_at(room, "/title").to_string();
    info.anchor_avatar = str_at(room, "/owner/avatar_thumb/url_list/0").to_string();
    info.viewer_count = text_at(room, "/user_count_str");
    info.streams = streams;
    Ok(info)
}

fn room_streams(room: &Value) -> Vec<Stream> {
    let maps = [
        ("/stream_url/flv_pull_url", StreamingProtocol::Flv),
        ("/stream_url/hls_pull_url_map", StreamingProtocol::Hls),
    ];

    let mut streams = Vec::new();
    for (pointer, protocol) in maps {
        let Some(map) = room.pointer(pointer).and_then(Value::as_object) else {
            continue;
        };
        for (resolution, url) in map {
            if let Some(url) = url.as_str().filter(|url| !url.is_empty()) {
                streams.push(Stream::new(url, resolution.as_str(), protocol));
            }
        }
    }
    streams
}
