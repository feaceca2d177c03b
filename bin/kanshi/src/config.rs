use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use kanshi::{PlatformKind, PlatformProfile, RecordingPlan, StreamingProtocol};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub interval_secs: u64,
    pub save_dir: PathBuf,
    pub recorder: RecorderConfig,
    pub youtube: YoutubeConfig,
    /// Keyed by lower-case platform name
    pub profiles: HashMap<String, ProfileConfig>,
    pub plans: Vec<PlanConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            save_dir: PathBuf::from("recordings"),
            recorder: RecorderConfig::default(),
            youtube: YoutubeConfig::default(),
            profiles: HashMap::new(),
            plans: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Split like a shell command line. `{url}` and `{output}` are replaced
    /// in every argument.
    pub command: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            command: "ffmpeg -hide_banner -loglevel error -y -i {url} -c copy {output}".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// yt-dlp command line, looked up in `PATH` when absent
    pub ytdlp: Option<String>,
    /// A yt-dlp run taking longer is killed and the room fails to resolve
    pub timeout_secs: u64,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            ytdlp: None,
            timeout_secs: 60,
        }
    }
}

impl YoutubeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub user_agent: Option<String>,
    pub cookies: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl From<&ProfileConfig> for PlatformProfile {
    fn from(config: &ProfileConfig) -> Self {
        PlatformProfile {
            user_agent: config.user_agent.clone(),
            extra_headers: config
                .headers
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            cookies: config.cookies.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanConfig {
    pub url: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub resolution: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_protocol() -> String {
    "flv".to_string()
}

fn default_enabled() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&data)
    }

    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(data: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(data)?;
        for name in config.profiles.keys() {
            name.parse::<PlatformKind>()
                .map_err(|e| anyhow::anyhow!("invalid profile section [profiles.{name}]: {e}"))?;
        }
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// Profile override for `kind`, if configured.
    pub fn profile(&self, kind: PlatformKind) -> Option<PlatformProfile> {
        self.profiles
            .iter()
            .find(|(name, _)| name.parse::<PlatformKind>().ok() == Some(kind))
            .map(|(_, profile)| profile.into())
    }

    pub fn recording_plans(&self) -> anyhow::Result<Vec<RecordingPlan>> {
        let created_at = chrono::Utc::now().timestamp_millis();
        self.plans
            .iter()
            .map(|plan| {
                let protocol: StreamingProtocol = plan
                    .protocol
                    .parse()
                    .map_err(|e| anyhow::anyhow!("plan {}: {e}", plan.url))?;
                let mut recording_plan =
                    RecordingPlan::new(&plan.url, protocol, &plan.resolution, created_at);
                recording_plan.enabled = plan.enabled;
                Ok(recording_plan)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
interval_secs = 30
save_dir = "/data/live"

[recorder]
command = "ffmpeg -i {url} -c copy '{output}'"

[profiles.huya]
cookies = "a=1"

[profiles.douyin]
user_agent = "Mozilla/5.0"
headers = { Referer = "https://live.douyin.com/" }

[[plans]]
url = "https://www.huya.com/660000"
protocol = "hls"
resolution = "default"

[[plans]]
url = "https://live.douyin.com/123"
enabled = false
"#;

    #[test]
    fn test_parse_config() {
        let config = Config::parse(CONFIG).unwrap();
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert_eq!(config.save_dir, PathBuf::from("/data/live"));
        assert_eq!(config.youtube.ytdlp, None);
        assert_eq!(config.youtube.timeout(), Duration::from_secs(60));

        let douyin = config.profile(PlatformKind::Douyin).unwrap();
        assert_eq!(douyin.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(
            douyin.extra_headers,
            vec![("Referer".to_string(), "https://live.douyin.com/".to_string())]
        );
        assert!(config.profile(PlatformKind::Twitch).is_none());

        let plans = config.recording_plans().unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].stream_protocol, StreamingProtocol::Hls);
        assert_eq!(plans[0].stream_resolution, "default");
        assert_eq!(plans[1].stream_protocol, StreamingProtocol::Flv);
        assert!(!plans[1].enabled);
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert!(config.recorder.command.contains("{output}"));
        assert!(config.plans.is_empty());
    }

    #[test]
    fn test_youtube_timeout() {
        let config = Config::parse("[youtube]\nytdlp = \"yt-dlp\"\ntimeout_secs = 15").unwrap();
        assert_eq!(config.youtube.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::parse("[profiles.bilibili]\ncookies = \"x\"").is_err());

        let config = Config::parse("[[plans]]\nurl = \"https://www.huya.com/1\"\nprotocol = \"rtmp\"").unwrap();
        assert!(config.recording_plans().is_err());
    }
}
