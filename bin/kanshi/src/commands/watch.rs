use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use kanshi::poller::{PlanPoller, PollerConfig};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config, platforms::build_resolver, recorder::CommandRecorder, store::ConfigPlanStore,
};

/// Poll the configured plans and record rooms once they go live.
#[derive(Parser)]
#[clap(name = "watch")]
pub struct WatchCommand {
    #[clap(short, long, default_value = "kanshi.toml")]
    config: PathBuf,
}

impl WatchCommand {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load(&self.config)?;
        let resolver = Arc::new(build_resolver(&config)?);
        let recorder = Arc::new(CommandRecorder::new(
            &config.recorder.command,
            config.save_dir.clone(),
        )?);
        let store = Arc::new(ConfigPlanStore::new(
            config.recording_plans()?,
            recorder.clone(),
        ));
        log::info!(
            "Watching {} plans every {}s",
            store.plan_count(),
            config.interval_secs
        );

        let poller = Arc::new(PlanPoller::new(
            PollerConfig {
                interval: config.interval(),
            },
            resolver,
            store,
            recorder,
        ));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poller.run(cancel.clone()));

        tokio::signal::ctrl_c().await?;
        log::info!("Received Ctrl-C, stopping");
        cancel.cancel();
        handle.await?;

        Ok(())
    }
}
