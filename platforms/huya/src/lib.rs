pub mod sign;

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

use crate::sign::sign_anti_code_now;

static STREAM: LazyLock<Sentinel> = LazyLock::new(|| {
    Sentinel::new(
        "huya stream",
        r#"stream: (\{"data".*?),"iWebDefaultBitRate""#,
    )
    .unwrap()
});

pub struct HuyaExtractor {
    profile: PlatformProfile,
}

impl HuyaExtractor {
    pub fn new(profile: PlatformProfile) -> Self {
        Self { profile }
    }

    pub fn default_profile() -> PlatformProfile {
        PlatformProfile::new()
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0",
            )
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            )
            .header(
                "Accept-Language",
                "zh-CN,zh;q=0.8,zh-TW;q=0.7,zh-HK;q=0.5,en-US;q=0.3,en;q=0.2",
            )
            .cookies("huya_ua=webh5&0.1.0&websocket; game_did=zXyXVqV1NF4ZeNWg7QaOFbpIEWqcsrxkoVy; alphaValue=0.80; isInLiveRoom=; guid=0a7df378828609654d01a205a305fb52; __yamid_tt1=0.8936157401010706; __yamid_new=CA715E8BC9400001E5A313E028F618DE; udb_guiddata=4657813d32ce43d381ea8ff8d416a3c2; udb_deviceid=w_756598227007868928; SoundValue=0.50; sdidshorttest=test; __yasmid=0.8936157401010706; huyawap_rep_cnt=4; udb_passdata=3; huya_web_rep_cnt=89; huya_flash_rep_cnt=20; _rep_cnt=3; huya_hd_rep_cnt=8")
    }
}

impl Default for HuyaExtractor {
    fn default() -> Self {
        Self::new(Self::default_profile())
    }
}

#[async_trait]
impl Extract for HuyaExtractor {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Huya
    }

    async fn extract(&self, url: &str, fetcher: &dyn Fetch) -> KanshiResult<LiveInfo> {
        let page = fetcher
            .fetch_page(&self.profile, PageRequest::get(url))
            .await?;
        parse_room_page(url, &page, sign_anti_code_now)
    }
}

/// Parse a Huya room page, signing playback urls with `sign`.
///
/// `sign` receives the template anti-code and the stream name.
pub fn parse_room_page<F>(url: &str, html: &str, sign: F) -> KanshiResult<LiveInfo>
where
    F: Fn(&str, &str) -> KanshiResult<String>,
{
    let stream: Value = serde_json::from_str(&format!("{}}}", STREAM.extract(html)?))?;
    let live_info = stream.pointer("/data/0/gameLiveInfo").unwrap_or(&Value::Null);

    let mut info = LiveInfo::not_live(url, PlatformKind::Huya);
    info.anchor_name = str_at(live_info, "/nick").to_string();
    info.anchor_avatar = str_at(live_info, "/avatar180").to_string();
    info.title = str_at(live_info, "/introduction").to_string();
    info.room_cover = str_at(live_info, "/screenshot").to_string();
    info.viewer_count = text_at(live_info, "/totalCount");

    let Some(cdn) = stream.pointer("/data/0/gameStreamInfoList/0") else {
        log::debug!("No cdn entry for {url}, room is offline");
        return Ok(info);
    };

    let stream_name = str_at(cdn, "/sStreamName");
    let flv_anti_code = str_at(cdn, "/sFlvAntiCode");
    let flv_url = format!(
        "{}/{stream_name}.{}?{}&ratio=",
        str_at(cdn, "/sFlvUrl"),
        str_at(cdn, "/sFlvUrlSuffix"),
        sign(flv_anti_code, stream_name)?
    );
    info.streams
        .push(Stream::new(flv_url, "default", StreamingProtocol::Flv));

    let hls_base = str_at(cdn, "/sHlsUrl");
    if !hls_base.is_empty() {
        let hls_anti_code = match str_at(cdn, "/sHlsAntiCode") {
            "" => flv_anti_code,
            anti_code => anti_code,
        };
        let hls_url = format!(
            "{hls_base}/{stream_name}.{}?{}&ratio=",
            str_at(cdn, "/sHlsUrlSuffix"),
            sign(hls_anti_code, stream_name)?
        );
        info.streams
            .push(Stream::new(hls_url, "default", StreamingProtocol::Hls));
    }

    log::debug!("{} is live with {} streams", info.anchor_name, info.streams.len());
    info.status = LiveStatus::Live;
    Ok(info)
}
