use std::path::PathBuf;

use clap::Parser;
use kanshi::{select_stream, StreamingProtocol};

use crate::{config::Config, platforms::build_resolver};

/// Resolve a room url and print what was found.
#[derive(Parser)]
#[clap(name = "inspect")]
pub struct InspectCommand {
    /// Preferred protocol: flv or hls
    #[clap(short, long, default_value = "flv")]
    protocol: StreamingProtocol,

    /// Preferred resolution label, e.g. origin, hd1 or 720p60
    #[clap(short, long, default_value = "")]
    resolution: String,

    /// Config file providing platform profiles
    #[clap(short, long, default_value = "kanshi.toml")]
    config: PathBuf,

    url: String,
}

impl InspectCommand {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load_or_default(&self.config)?;
        let resolver = build_resolver(&config)?;

        let info = resolver.resolve(&self.url).await?;
        println!("{}", serde_json::to_string_pretty(&info)?);

        if info.is_live() {
            let stream = select_stream(&info.streams, self.protocol, &self.resolution)?;
            eprintln!(
                "Selected {} ({:?}): {}",
                stream.resolution, stream.protocol, stream.url
            );
        }

        Ok(())
    }
}
