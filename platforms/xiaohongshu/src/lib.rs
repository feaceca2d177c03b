use std::time::Duration;

use async_trait::async_trait;
use kanshi::{
    util::json::{str_at, text_at},
    Extract, Fetch, KanshiError, KanshiResult, LiveInfo, LiveStatus, PageRequest, PlatformKind,
    PlatformProfile, Stream, StreamingProtocol,
};
use serde_json::Value;

const SHARE_INFO_API: &str =
    "https://www.xiaohongshu.com/api/sns/red/live/app/v1/ecology/outside/share_info";
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

pub struct XiaohongshuExtractor {
    profile: PlatformProfile,
}

impl XiaohongshuExtractor {
    pub fn new(profile: PlatformProfile) -> Self {
        Self { profile }
    }

    pub fn default_profile() -> PlatformProfile {
        PlatformProfile::new()
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0",
            )
            .header("Accept", "application/json, text/plain, */*")
            .header(
                "Accept-Language",
                "zh-CN,zh;q=0.8,zh-TW;q=0.7,zh-HK;q=0.5,en-US;q=0.3,en;q=0.2",
            )
            .header("Referer", "https://www.redelight.cn/")
    }
}

impl Default for XiaohongshuExtractor {
    fn default() -> Self {
        Self::new(Self::default_profile())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomUrl<'a> {
    pub room_id: &'a str,
    pub app_uid: Option<&'a str>,
}

impl<'a> RoomUrl<'a> {
    /// Room id is the path segment after `/livestream/`.
    pub fn parse(url: &'a str) -> Option<Self> {
        let (_, rest) = url.split_once("/livestream/")?;
        let room_id = rest.split(['?', '/', '#']).next().unwrap_or_default();
        if room_id.is_empty() {
            return None;
        }

        let app_uid = url
            .split_once('?')
            .and_then(|(_, query)| {
                query
                    .split('&')
                    .find_map(|pair| pair.strip_prefix("appuid="))
            })
            .filter(|uid| !uid.is_empty());

        Some(Self { room_id, app_uid })
    }

    pub fn share_info_url(&self) -> String {
        format!("{SHARE_INFO_API}?room_id={}", self.room_id)
    }

    pub fn flv_url(&self) -> String {
        match self.app_uid {
            Some(uid) => format!(
                "http://live-play.xhscdn.com/live/{}.flv?uid={uid}",
                self.room_id
            ),
            None => format!("http://live-play.xhscdn.com/live/{}.flv", self.room_id),
        }
    }
}

#[async_trait]
impl Extract for XiaohongshuExtractor {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Xiaohongshu
    }

    async fn extract(&self, url: &str, fetcher: &dyn Fetch) -> KanshiResult<LiveInfo> {
        let room = RoomUrl::parse(url)
            .ok_or_else(|| KanshiError::parse(format!("no livestream room id in {url}")))?;

        let body = fetcher
            .fetch_page(&self.profile, PageRequest::get(room.share_info_url()))
            .await?;
        let Some(mut info) = parse_share_info(url, &body)? else {
            return Ok(LiveInfo::not_live(url, PlatformKind::Xiaohongshu));
        };

        // The share info answers for ended rooms too, only the cdn knows
        let flv_url = room.flv_url();
        let status = fetcher
            .fetch_status(&self.profile, &flv_url, PROBE_TIMEOUT)
            .await?;
        if status == 200 {
            info.status = LiveStatus::Live;
            info.streams
                .push(Stream::new(flv_url, "default", StreamingProtocol::Flv));
        } else {
            log::debug!("{url}: flv probe answered {status}");
        }
        Ok(info)
    }
}

/// Room metadata from the share-info api, `None` when the api reports an
/// error code.
pub fn parse_share_info(url: &str, body: &str) -> KanshiResult<Option<LiveInfo>> {
    let json: Value = serde_json::from_str(body)?;
    let code = json.get("code").and_then(Value::as_i64).unwrap_or(-1);
    if code != 0 {
        log::debug!("{url}: share info returned code {code}: {}", str_at(&json, "/msg"));
        return Ok(None);
    }

    let mut info = LiveInfo::not_live(url, PlatformKind::Xiaohongshu);
    info.anchor_name = str_at(&json, "/data/host_info/nickname").to_string();
    info.anchor_avatar = strip_query(str_at(&json, "/data/host_info/avatar"));
    info.room_cover = strip_query(str_at(&json, "/data/room/cover"));
    info.viewer_count = text_at(&json, "/data/room/member_count");
    info.title = str_at(&json, "/data/room/name").to_string();
    Ok(Some(info))
}

fn strip_query(url: &str) -> String {
    url.split('?').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use kanshi::fetch::MockFetcher;

    use super::*;

    const ROOM_URL: &str = "https://www.xiaohongshu.com/hina/livestream/569077534207413574/1707413727088?share_source=&appuid=5f3f478a00000000010005b3&apptime=1707413727";
    const SHARE_INFO: &str = r#"{"code":0,"success":true,"data":{"host_info":{"nickname":"小红","avatar":"https://sns-avatar.xhscdn.com/avatar/a.jpg?imageView2/2/w/80"},"room":{"name":"晚安","cover":"https://sns-img.xhscdn.com/cover.jpg?x=1","member_count":88}}}"#;

    #[test]
    fn test_room_url() {
        let room = RoomUrl::parse(ROOM_URL).unwrap();
        assert_eq!(
            room,
            RoomUrl {
                room_id: "569077534207413574",
                app_uid: Some("5f3f478a00000000010005b3"),
            }
        );
        assert_eq!(
            room.flv_url(),
            "http://live-play.xhscdn.com/live/569077534207413574.flv?uid=5f3f478a00000000010005b3"
        );

        let room = RoomUrl::parse("https://www.redelight.cn/hina/livestream/123?x=1").unwrap();
        assert_eq!(room.app_uid, None);
        assert_eq!(room.flv_url(), "http://live-play.xhscdn.com/live/123.flv");
        assert!(RoomUrl::parse("https://www.xiaohongshu.com/explore").is_none());
    }

    #[test]
    fn test_share_info() {
        let info = parse_share_info(ROOM_URL, SHARE_INFO).unwrap().unwrap();
        assert_eq!(info.anchor_name, "小红");
        assert_eq!(info.anchor_avatar, "https://sns-avatar.xhscdn.com/avatar/a.jpg");
        assert_eq!(info.room_cover, "https://sns-img.xhscdn.com/cover.jpg");
        assert_eq!(info.viewer_count, "88");
        assert_eq!(info.title, "晚安");

        let error = r#"{"code":-1,"success":false,"msg":"room not found"}"#;
        assert_eq!(parse_share_info(ROOM_URL, error).unwrap(), None);
    }

    #[tokio::test]
    async fn test_live_room() {
        let room = RoomUrl::parse(ROOM_URL).unwrap();
        let fetcher = MockFetcher::new()
            .page(room.share_info_url(), SHARE_INFO)
            .status(room.flv_url(), 200);
        let info = XiaohongshuExtractor::default()
            .extract(ROOM_URL, &fetcher)
            .await
            .unwrap();
        assert_eq!(info.status, LiveStatus::Live);
        assert_eq!(
            info.streams,
            vec![Stream::new(room.flv_url(), "default", StreamingProtocol::Flv)]
        );
    }

    #[tokio::test]
    async fn test_ended_room() {
        let room = RoomUrl::parse(ROOM_URL).unwrap();
        let fetcher = MockFetcher::new()
            .page(room.share_info_url(), SHARE_INFO)
            .status(room.flv_url(), 404);
        let info = XiaohongshuExtractor::default()
            .extract(ROOM_URL, &fetcher)
            .await
            .unwrap();
        assert_eq!(info.status, LiveStatus::NotLive);
        assert!(info.streams.is_empty());
        assert_eq!(info.anchor_name, "小红");
    }

    #[tokio::test]
    async fn test_api_error_skips_probe() {
        let room = RoomUrl::parse(ROOM_URL).unwrap();
        let fetcher = MockFetcher::new().page(room.share_info_url(), r#"{"code":-100}"#);
        let info = XiaohongshuExtractor::default()
            .extract(ROOM_URL, &fetcher)
            .await
            .unwrap();
        assert_eq!(info, LiveInfo::not_live(ROOM_URL, PlatformKind::Xiaohongshu));
    }
}
