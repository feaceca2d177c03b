use std::{path::PathBuf, process::Stdio, time::Duration};

use async_trait::async_trait;
use kanshi::{
    delegated::{MediaFormat, MediaInfo, MediaInfoProvider},
    KanshiError, KanshiResult,
};
use serde::Deserialize;
use tokio::process::Command;

/// How long a single `yt-dlp` run may take before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// [MediaInfoProvider] running `yt-dlp -J` on the room url.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl YtDlp {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Find `yt-dlp` in `PATH`.
    pub fn locate() -> KanshiResult<Self> {
        let program = which::which("yt-dlp")
            .map_err(|e| KanshiError::fetch(format!("yt-dlp not found: {e}")))?;
        Ok(Self::new(program))
    }

    /// Build from a shell-like command line, e.g. `python3 -m yt_dlp --cookies c.txt`.
    pub fn from_command(command: &str) -> KanshiResult<Self> {
        let mut parts = shlex::split(command)
            .unwrap_or_default()
            .into_iter();
        let program = parts
            .next()
            .ok_or_else(|| KanshiError::fetch(format!("invalid yt-dlp command: {command}")))?;
        Ok(Self {
            program: program.into(),
            args: parts.collect(),
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

#[async_trait]
impl MediaInfoProvider for YtDlp {
    async fn media_info(&self, url: &str) -> KanshiResult<MediaInfo> {
        log::debug!("Running {} for {url}", self.program.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(["-J", "--no-warnings", "--no-playlist"])
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| {
                KanshiError::fetch(format!(
                    "yt-dlp did not finish within {}s",
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| KanshiError::fetch(format!("failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KanshiError::FetchFailed(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_info_json(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Deserialize)]
struct InfoJson {
    #[serde(default)]
    is_live: Option<bool>,
    #[serde(default)]
    live_status: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    concurrent_view_count: Option<u64>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    formats: Vec<InfoFormat>,
}

#[derive(Deserialize)]
struct InfoFormat {
    #[serde(default)]
    url: String,
    #[serde(default)]
    format_id: String,
    #[serde(default)]
    format_note: Option<String>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    protocol: String,
    #[serde(default)]
    vcodec: Option<String>,
}

impl InfoFormat {
    fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none") && self.protocol != "mhtml"
    }

    fn quality_label(&self) -> String {
        match (&self.format_note, self.height) {
            (Some(note), _) if !note.is_empty() => note.clone(),
            (_, Some(height)) => format!("{height}p"),
            _ => self.format_id.clone(),
        }
    }
}

/// Map `yt-dlp -J` output onto [MediaInfo].
pub fn parse_info_json(json: &str) -> KanshiResult<MediaInfo> {
    let info: InfoJson = serde_json::from_str(json)?;
    let is_live = info
        .is_live
        .unwrap_or_else(|| info.live_status.as_deref() == Some("is_live"));

    Ok(MediaInfo {
        is_live,
        title: info.title,
        author_name: info.channel.or(info.uploader).unwrap_or_default(),
        // yt-dlp does not report channel avatars
        author_avatar: String::new(),
        view_count: info
            .concurrent_view_count
            .or(info.view_count)
            .map(|count| count.to_string())
            .unwrap_or_default(),
        thumbnail: info.thumbnail,
        formats: info
            .formats
            .into_iter()
            .filter(InfoFormat::has_video)
            .map(|format| MediaFormat {
                quality_label: format.quality_label(),
                is_hls: format.protocol.starts_with("m3u8"),
                url: format.url,
            })
            .collect(),
    })
}
