use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum PlatformKind {
    Douyin,
    Tiktok,
    Xiaohongshu,
    Huya,
    Twitch,
    Youtube,
    Unknown,
}

/// Ordered prefix table, matched against the lower-cased url.
const PLATFORM_PREFIXES: &[(&str, PlatformKind)] = &[
    ("https://live.douyin.com/", PlatformKind::Douyin),
    ("https://v.douyin.com/", PlatformKind::Douyin),
    ("https://www.tiktok.com/", PlatformKind::Tiktok),
    ("https://www.xiaohongshu.com/", PlatformKind::Xiaohongshu),
    ("https://www.redelight.cn/", PlatformKind::Xiaohongshu),
    ("https://www.huya.com/", PlatformKind::Huya),
    ("https://m.huya.com/", PlatformKind::Huya),
    ("https://www.twitch.tv/", PlatformKind::Twitch),
    ("https://m.twitch.tv/", PlatformKind::Twitch),
    ("https://www.youtube.com/", PlatformKind::Youtube),
    ("https://youtube.com/", PlatformKind::Youtube),
    ("https://m.youtube.com/", PlatformKind::Youtube),
    ("https://youtu.be/", PlatformKind::Youtube),
];

impl PlatformKind {
    pub const ALL: [PlatformKind; 6] = [
        PlatformKind::Douyin,
        PlatformKind::Tiktok,
        PlatformKind::Xiaohongshu,
        PlatformKind::Huya,
        PlatformKind::Twitch,
        PlatformKind::Youtube,
    ];

    /// Classify a room url. Never fails, unmatched urls are [PlatformKind::Unknown].
    pub fn classify(url: &str) -> Self {
        let url = url.trim().to_lowercase();
        PLATFORM_PREFIXES
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix))
            .map(|(_, kind)| *kind)
            .unwrap_or(PlatformKind::Unknown)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlatformKind::Douyin => "Douyin",
            PlatformKind::Tiktok => "Tiktok",
            PlatformKind::Xiaohongshu => "Xiaohongshu",
            PlatformKind::Huya => "Huya",
            PlatformKind::Twitch => "Twitch",
            PlatformKind::Youtube => "Youtube",
            PlatformKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PlatformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown platform: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_prefix_classifies() {
        for (prefix, kind) in PLATFORM_PREFIXES {
            let url = format!("{prefix}some/room");
            assert_eq!(PlatformKind::classify(&url), *kind, "{url}");
        }
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(
            PlatformKind::classify("HTTPS://LIVE.DOUYIN.COM/123456"),
            PlatformKind::Douyin
        );
        assert_eq!(
            PlatformKind::classify("https://www.Twitch.tv/someone"),
            PlatformKind::Twitch
        );
    }

    #[test]
    fn test_unmatched_is_unknown() {
        assert_eq!(PlatformKind::classify(""), PlatformKind::Unknown);
        assert_eq!(
            PlatformKind::classify("https://live.bilibili.com/27210217"),
            PlatformKind::Unknown
        );
        assert_eq!(
            PlatformKind::classify("http://www.huya.com/107222"),
            PlatformKind::Unknown
        );
        assert_eq!(PlatformKind::classify("douyin"), PlatformKind::Unknown);
    }

    #[test]
    fn test_parse_name() {
        assert_eq!("huya".parse::<PlatformKind>(), Ok(PlatformKind::Huya));
        assert_eq!("Youtube".parse::<PlatformKind>(), Ok(PlatformKind::Youtube));
        assert!("unknown".parse::<PlatformKind>().is_err());
        assert_eq!(PlatformKind::Xiaohongshu.to_string(), "Xiaohongshu");
    }
}
