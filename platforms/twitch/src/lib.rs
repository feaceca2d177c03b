pub mod gql;

use async_trait::async_trait;
use kanshi::{
    hls::group_variants, Extract, Fetch, KanshiError, KanshiResult, LiveInfo, LiveStatus,
    PageRequest, PlatformKind, PlatformProfile, Stream, StreamingProtocol,
};
use rand::seq::SliceRandom;

use crate::gql::{
    channel_shell_body, playback_access_token_body, ChannelUser, PlaybackAccessToken, CLIENT_ID,
    GQL_ENDPOINT,
};

const PLAY_SESSION_IDS: [&str; 2] = [
    "bdd22331a986c7f1073628f2fc5b19da",
    "064bc3ff1722b6f53b0b5b8c01e46ca5",
];
const PLAYER_VERSION: &str = "1.28.0-rc.1";

pub struct TwitchExtractor {
    profile: PlatformProfile,
}

impl TwitchExtractor {
    pub fn new(profile: PlatformProfile) -> Self {
        Self { profile }
    }

    pub fn default_profile() -> PlatformProfile {
        PlatformProfile::new()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36")
            .header("Accept-Language", "en-US")
            .header("Referer", "https://www.twitch.tv/")
            .header("Client-ID", CLIENT_ID)
    }
}

impl Default for TwitchExtractor {
    fn default() -> Self {
        Self::new(Self::default_profile())
    }
}

#[async_trait]
impl Extract for TwitchExtractor {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Twitch
    }

    async fn extract(&self, url: &str, fetcher: &dyn Fetch) -> KanshiResult<LiveInfo> {
        let channel = channel_name(url)
            .ok_or_else(|| KanshiError::parse(format!("no channel name in {url}")))?;

        let response = fetcher
            .fetch_page(
                &self.profile,
                PageRequest::post(GQL_ENDPOINT, playback_access_token_body(channel)),
            )
            .await?;
        let token = PlaybackAccessToken::from_response(&response)?;

        let response = fetcher
            .fetch_page(
                &self.profile,
                PageRequest::post(GQL_ENDPOINT, channel_shell_body(channel))
                    .header("Client-Integrity", token.value.as_str())
                    .header("Content-Type", "text/plain;charset=UTF-8"),
            )
            .await?;
        let Some(user) = ChannelUser::from_response(&response)? else {
            log::debug!("{url}: channel {channel} does not exist");
            return Ok(LiveInfo::not_live(url, PlatformKind::Twitch));
        };

        let mut info = channel_info(url, &user);
        if user.stream.is_none() {
            return Ok(info);
        }

        let session_id = PLAY_SESSION_IDS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(PLAY_SESSION_IDS[0]);
        let manifest_url = manifest_url(&user.login, &token, session_id);
        let manifest = fetcher
            .fetch_page(&self.profile, PageRequest::get(&manifest_url))
            .await?;

        info.streams = manifest_streams(manifest_url, &manifest);
        Ok(info)
    }
}

/// Last non-empty path segment, ignoring query and fragment.
pub fn channel_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = path.split_once("://").map_or(path, |(_, rest)| rest);
    let (_host, path) = path.split_once('/')?;
    path.split('/').filter(|segment| !segment.is_empty()).last()
}

/// Room metadata from the channel shell. Streams are filled in by the caller.
pub fn channel_info(url: &str, user: &ChannelUser) -> LiveInfo {
    let mut info = LiveInfo::not_live(url, PlatformKind::Twitch);
    info.anchor_name = format!("{}-{}", user.display_name, user.login);
    // Channel shell carries no stream title
    info.title = info.anchor_name.clone();
    info.anchor_avatar = user.profile_image_url.clone();
    if let Some(stream) = &user.stream {
        info.status = LiveStatus::Live;
        info.viewer_count = stream.viewers_count.to_string();
    }
    info
}

pub fn manifest_url(login: &str, token: &PlaybackAccessToken, session_id: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("acmb", "e30=")
        .append_pair("allow_sourc", "true")
        .append_pair("browser_family", "firefox")
        .append_pair("browser_version", "124.0")
        .append_pair("cdm", "wv")
        .append_pair("fast_bread", "true")
        .append_pair("os_name", "Windows")
        .append_pair("os_version", "NT 10.0")
        .append_pair("p", "3553732")
        .append_pair("platform", "web")
        .append_pair("play_session_id", session_id)
        .append_pair("player_backend", "mediaplayer")
        .append_pair("player_version", PLAYER_VERSION)
        .append_pair("playlist_include_framerate", "true")
        .append_pair("reassignments_supported", "true")
        .append_pair("sig", &token.signature)
        .append_pair("token", &token.value)
        .append_pair("transcode_mode", "cbr_v1")
        .finish();
    format!("https://usher.ttvnw.net/api/channel/hls/{login}.m3u8?{query}")
}

/// The master manifest itself, followed by one stream per labelled variant.
pub fn manifest_streams(manifest_url: String, manifest: &str) -> Vec<Stream> {
    let mut streams = vec![Stream::new(
        manifest_url,
        "default",
        StreamingProtocol::Hls,
    )];
    streams.extend(
        group_variants(manifest)
            .into_iter()
            .map(|variant| Stream::new(variant.url, variant.group_id, StreamingProtocol::Hls)),
    );
    streams
}

#[cfg(test)]
mod tests {
    use kanshi::fetch::MockFetcher;

    use super::*;

    const CHANNEL_URL: &str = "https://www.twitch.tv/someone";
    const TOKEN_RESPONSE: &str = r#"{"data":{"streamPlaybackAccessToken":{"value":"{\"channel\":\"someone\"}","signature":"c0ffee","__typename":"PlaybackAccessToken"}}}"#;
    const LIVE_SHELL: &str = r#"[{"data":{"userOrError":{"login":"someone","displayName":"SomeOne","profileImageURL":"https://static-cdn.jtvnw.net/a.png","stream":{"viewersCount":1234}}}}]"#;
    const OFFLINE_SHELL: &str = r#"[{"data":{"userOrError":{"login":"someone","displayName":"SomeOne","profileImageURL":"https://static-cdn.jtvnw.net/a.png","stream":null}}}]"#;
    const MANIFEST: &str = r#"#EXTM3U
#EXT-X-TWITCH-INFO:NODE="video-edge-1",MANIFEST-NODE-TYPE="weaver_cluster"
#EXT-X-MEDIA:TYPE=VIDEO,GROUP-ID="chunked",NAME="1080p60 (source)",AUTOSELECT=YES,DEFAULT=YES
#EXT-X-STREAM-INF:BANDWIDTH=6000000,RESOLUTION=1920x1080,CODECS="avc1.64002A,mp4a.40.2",VIDEO="chunked",FRAME-RATE=60.000
https://video-weaver.fra05.hls.ttvnw.net/v1/playlist/source.m3u8
#EXT-X-MEDIA:TYPE=VIDEO,GROUP-ID="720p60",NAME="720p60",AUTOSELECT=YES,DEFAULT=YES
#EXT-X-STREAM-INF:BANDWIDTH=3000000,RESOLUTION=1280x720,CODECS="avc1.4D401F,mp4a.40.2",VIDEO="720p60",FRAME-RATE=60.000
https://video-weaver.fra05.hls.ttvnw.net/v1/playlist/720p60.m3u8
"#;

    fn token() -> PlaybackAccessToken {
        PlaybackAccessToken {
            value: r#"{"channel":"someone"}"#.to_string(),
            signature: "c0ffee".to_string(),
        }
    }

    #[test]
    fn test_channel_name() {
        assert_eq!(channel_name("https://www.twitch.tv/someone"), Some("someone"));
        assert_eq!(channel_name("https://www.twitch.tv/someone/"), Some("someone"));
        assert_eq!(
            channel_name("https://m.twitch.tv/someone?referrer=raid"),
            Some("someone")
        );
        assert_eq!(channel_name("https://www.twitch.tv/"), None);
    }

    #[test]
    fn test_manifest_url() {
        let url = manifest_url("someone", &token(), PLAY_SESSION_IDS[1]);
        assert!(url.starts_with("https://usher.ttvnw.net/api/channel/hls/someone.m3u8?acmb=e30%3D&"));
        assert!(url.contains("&play_session_id=064bc3ff1722b6f53b0b5b8c01e46ca5&"));
        assert!(url.contains("&player_version=1.28.0-rc.1&"));
        assert!(url.contains("&sig=c0ffee&"));
        assert!(url.contains("&token=%7B%22channel%22%3A%22someone%22%7D&"));
        assert!(url.ends_with("&transcode_mode=cbr_v1"));
    }

    #[test]
    fn test_manifest_streams() {
        let streams = manifest_streams("https://usher/someone.m3u8".to_string(), MANIFEST);
        assert_eq!(
            streams,
            vec![
                Stream::new("https://usher/someone.m3u8", "default", StreamingProtocol::Hls),
                Stream::new(
                    "https://video-weaver.fra05.hls.ttvnw.net/v1/playlist/source.m3u8",
                    "chunked",
                    StreamingProtocol::Hls
                ),
                Stream::new(
                    "https://video-weaver.fra05.hls.ttvnw.net/v1/playlist/720p60.m3u8",
                    "720p60",
                    StreamingProtocol::Hls
                ),
            ]
        );
    }

    fn fetcher(shell: &str) -> MockFetcher {
        MockFetcher::new()
            .page_with_body(GQL_ENDPOINT, "PlaybackAccessToken_Template", TOKEN_RESPONSE)
            .page_with_body(GQL_ENDPOINT, "ChannelShell", shell)
    }

    #[tokio::test]
    async fn test_live_channel() {
        let manifest_prefix = "https://usher.ttvnw.net/api/channel/hls/someone.m3u8?";
        let mut fetcher = fetcher(LIVE_SHELL);
        for session_id in PLAY_SESSION_IDS {
            fetcher = fetcher.page(manifest_url("someone", &token(), session_id), MANIFEST);
        }

        let info = TwitchExtractor::default()
            .extract(CHANNEL_URL, &fetcher)
            .await
            .unwrap();
        assert_eq!(info.status, LiveStatus::Live);
        assert_eq!(info.anchor_name, "SomeOne-someone");
        assert_eq!(info.title, "SomeOne-someone");
        assert_eq!(info.viewer_count, "1234");
        assert_eq!(info.streams.len(), 3);
        assert!(info.streams[0].url.starts_with(manifest_prefix));
        assert_eq!(info.streams[2].resolution, "720p60");

        let requests = fetcher.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1]
            .headers
            .contains(&("Client-Integrity".to_string(), token().value)));
    }

    #[tokio::test]
    async fn test_offline_channel() {
        let fetcher = fetcher(OFFLINE_SHELL);
        let info = TwitchExtractor::default()
            .extract(CHANNEL_URL, &fetcher)
            .await
            .unwrap();
        assert_eq!(info.status, LiveStatus::NotLive);
        assert!(info.streams.is_empty());
        assert_eq!(info.anchor_name, "SomeOne-someone");
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_token_failure() {
        let fetcher = MockFetcher::new().error(GQL_ENDPOINT, "timed out");
        let result = TwitchExtractor::default()
            .extract(CHANNEL_URL, &fetcher)
            .await;
        assert!(matches!(result, Err(KanshiError::FetchFailed(_))));
    }
}
