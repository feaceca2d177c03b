use kanshi::{KanshiError, KanshiResult};
use serde::Deserialize;
use serde_json::json;

pub const GQL_ENDPOINT: &str = "https://gql.twitch.tv/gql";
pub const CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

const PLAYBACK_ACCESS_TOKEN_QUERY: &str = r#"query PlaybackAccessToken_Template($login: String!, $isLive: Boolean!, $vodID: ID!, $isVod: Boolean!, $playerType: String!) {  streamPlaybackAccessToken(channelName: $login, params: {platform: "web", playerBackend: "mediaplayer", playerType: $playerType}) @include(if: $isLive) {    value    signature   authorization { isForbidden forbiddenReasonCode }   __typename  }  videoPlaybackAccessToken(id: $vodID, params: {platform: "web", playerBackend: "mediaplayer", playerType: $playerType}) @include(if: $isVod) {    value    signature   __typename  }}"#;
const CHANNEL_SHELL_HASH: &str =
    "580ab410bcd0c1ad194224957ae2241e5d252b2c5173d8e0cce9d32d5bb14efe";

pub fn playback_access_token_body(login: &str) -> String {
    json!({
        "operationName": "PlaybackAccessToken_Template",
        "query": PLAYBACK_ACCESS_TOKEN_QUERY,
        "variables": {
            "isLive": true,
            "login": login,
            "isVod": false,
            "vodID": "",
            "playerType": "site"
        }
    })
    .to_string()
}

pub fn channel_shell_body(login: &str) -> String {
    json!([{
        "operationName": "ChannelShell",
        "variables": { "login": login },
        "extensions": {
            "persistedQuery": {
                "version": 1,
                "sha256Hash": CHANNEL_SHELL_HASH
            }
        }
    }])
    .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaybackAccessToken {
    pub value: String,
    pub signature: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenData {
    stream_playback_access_token: Option<PlaybackAccessToken>,
}

#[derive(Deserialize)]
struct GqlResponse<T> {
    data: Option<T>,
}

impl PlaybackAccessToken {
    pub fn from_response(body: &str) -> KanshiResult<Self> {
        let response: GqlResponse<AccessTokenData> = serde_json::from_str(body)?;
        response
            .data
            .and_then(|data| data.stream_playback_access_token)
            .ok_or_else(|| KanshiError::parse("streamPlaybackAccessToken missing from response"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelUser {
    pub login: String,
    pub display_name: String,
    #[serde(rename = "profileImageURL")]
    pub profile_image_url: String,
    pub stream: Option<ChannelStream>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelStream {
    pub viewers_count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelShellData {
    user_or_error: Option<ChannelUser>,
}

impl ChannelUser {
    /// `None` when the channel does not exist.
    pub fn from_response(body: &str) -> KanshiResult<Option<Self>> {
        let responses: Vec<GqlResponse<ChannelShellData>> = serde_json::from_str(body)?;
        let user = responses
            .into_iter()
            .next()
            .ok_or_else(|| KanshiError::parse("empty ChannelShell response"))?
            .data
            .and_then(|data| data.user_or_error)
            .filter(|user| !user.login.is_empty());
        Ok(user)
    }
}
