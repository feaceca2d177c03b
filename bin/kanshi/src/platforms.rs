use std::sync::Arc;

use kanshi::{HttpFetcher, PlatformKind, PlatformProfile, Resolver};
use kanshi_douyin::DouyinExtractor;
use kanshi_huya::HuyaExtractor;
use kanshi_tiktok::TiktokExtractor;
use kanshi_twitch::TwitchExtractor;
use kanshi_xiaohongshu::XiaohongshuExtractor;
use kanshi_youtube::{YoutubeExtractor, YtDlp};

use crate::config::Config;

fn profile(config: &Config, kind: PlatformKind, default: PlatformProfile) -> PlatformProfile {
    match config.profile(kind) {
        Some(profile) => default.merge(profile),
        None => default,
    }
}

/// Resolver with every supported platform, profiles overridden by `config`.
pub fn build_resolver(config: &Config) -> anyhow::Result<Resolver> {
    let ytdlp = match &config.youtube.ytdlp {
        Some(command) => YtDlp::from_command(command)?,
        None => YtDlp::locate().unwrap_or_else(|e| {
            log::warn!("{e}, YouTube rooms will fail to resolve");
            YtDlp::new("yt-dlp")
        }),
    }
    .with_timeout(config.youtube.timeout());

    let fetcher = HttpFetcher::with_timeout(kanshi::fetch::DEFAULT_TIMEOUT)?;
    let resolver = Resolver::builder(Arc::new(fetcher))
        .register(DouyinExtractor::new(profile(
            config,
            PlatformKind::Douyin,
            DouyinExtractor::default_profile(),
        )))
        .register(TiktokExtractor::new(profile(
            config,
            PlatformKind::Tiktok,
            TiktokExtractor::default_profile(),
        )))
        .register(XiaohongshuExtractor::new(profile(
            config,
            PlatformKind::Xiaohongshu,
            XiaohongshuExtractor::default_profile(),
        )))
        .register(HuyaExtractor::new(profile(
            config,
            PlatformKind::Huya,
            HuyaExtractor::default_profile(),
        )))
        .register(TwitchExtractor::new(profile(
            config,
            PlatformKind::Twitch,
            TwitchExtractor::default_profile(),
        )))
        .register(YoutubeExtractor::new(Arc::new(ytdlp)))
        .build();

    Ok(resolver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_platform_is_registered() {
        let config = Config::parse("[youtube]\nytdlp = \"yt-dlp\"").unwrap();
        let resolver = build_resolver(&config).unwrap();
        for kind in PlatformKind::ALL {
            assert!(resolver.supports(kind), "{kind} is not registered");
        }
        assert!(!resolver.supports(PlatformKind::Unknown));
    }
}
