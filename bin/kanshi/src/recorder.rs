use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use kanshi::{
    poller::{Recorder, RecordingStart},
    LiveInfo, Stream,
};
use tokio::process::{Child, Command};

/// Starts one external process per recording, tracked by room url.
pub struct CommandRecorder {
    template: Vec<String>,
    save_dir: PathBuf,
    children: Mutex<HashMap<String, Child>>,
}

impl CommandRecorder {
    pub fn new(command: &str, save_dir: PathBuf) -> anyhow::Result<Self> {
        let template = shlex::split(command).unwrap_or_default();
        if template.is_empty() {
            anyhow::bail!("Invalid recorder command: {command}");
        }

        Ok(Self {
            template,
            save_dir,
            children: Mutex::new(HashMap::new()),
        })
    }

    /// Whether a recording for `url` is still running. Exited processes are
    /// reaped here.
    pub fn is_recording(&self, url: &str) -> bool {
        let Ok(mut children) = self.children.lock() else {
            return false;
        };
        children.retain(|room, child| match child.try_wait() {
            Ok(Some(status)) => {
                log::info!("Recording of {room} finished: {status}");
                false
            }
            Ok(None) => true,
            Err(e) => {
                log::warn!("Failed to poll recording of {room}: {e}");
                false
            }
        });
        children.contains_key(url)
    }
}

/// Keep letters and digits of any script, drop everything else.
fn sanitize(name: &str) -> String {
    let name: String = name.chars().filter(|c| c.is_alphanumeric()).collect();
    if name.is_empty() {
        "unknown".to_string()
    } else {
        name
    }
}

pub fn output_path(
    save_dir: &Path,
    info: &LiveInfo,
    stream: &Stream,
    time: DateTime<Local>,
) -> PathBuf {
    let anchor = sanitize(&info.anchor_name);
    save_dir
        .join(info.platform_kind.to_string())
        .join(&anchor)
        .join(format!(
            "{anchor}_{}.{}",
            time.format("%Y%m%d_%H%M%S"),
            stream.protocol.extension()
        ))
}

pub fn render_command(template: &[String], url: &str, output: &Path) -> Vec<String> {
    let output = output.to_string_lossy();
    template
        .iter()
        .map(|arg| arg.replace("{url}", url).replace("{output}", &output))
        .collect()
}

#[async_trait]
impl Recorder for CommandRecorder {
    async fn start_recording(
        &self,
        stream: Stream,
        live_info: LiveInfo,
        auto_record: bool,
    ) -> anyhow::Result<RecordingStart> {
        if self.is_recording(&live_info.url) {
            return Ok(RecordingStart::AlreadyRecording);
        }

        let output = output_path(&self.save_dir, &live_info, &stream, Local::now());
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let command = render_command(&self.template, &stream.url, &output);
        let child = Command::new(&command[0])
            .args(&command[1..])
            .stdin(Stdio::null())
            .spawn()?;
        log::info!(
            "Recording {} to {} (auto: {auto_record})",
            live_info.anchor_name,
            output.display()
        );

        self.children
            .lock()
            .map_err(|_| anyhow::anyhow!("recorder state poisoned"))?
            .insert(live_info.url, child);
        Ok(RecordingStart::Started)
    }
}
