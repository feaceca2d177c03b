//! Periodic sweep over recording plans.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{task::JoinSet, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    model::{LiveInfo, RecordingPlan, Stream},
    resolver::Resolver,
    select::select_stream,
};

/// Source of plans to check, owned by the application.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Enabled plans which are not being recorded right now.
    async fn plans_not_recording(&self) -> anyhow::Result<Vec<RecordingPlan>>;
}

#[async_trait]
pub trait Recorder: Send + Sync {
    async fn start_recording(
        &self,
        stream: Stream,
        live_info: LiveInfo,
        auto_record: bool,
    ) -> anyhow::Result<RecordingStart>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingStart {
    Started,
    /// The room already had a running recording, nothing new was started
    AlreadyRecording,
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Checking,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub plans: usize,
    pub live: usize,
    pub started: usize,
    pub failed: usize,
}

enum PlanOutcome {
    Offline,
    LiveWithoutStream,
    AlreadyRecording,
    Started,
    Failed,
}

pub struct PlanPoller {
    config: PollerConfig,
    resolver: Arc<Resolver>,
    store: Arc<dyn PlanStore>,
    recorder: Arc<dyn Recorder>,
    checking: AtomicBool,
}

/// Clears the sweep flag even if the sweep future is dropped.
struct CheckingGuard<'a>(&'a AtomicBool);

impl Drop for CheckingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PlanPoller {
    pub fn new(
        config: PollerConfig,
        resolver: Arc<Resolver>,
        store: Arc<dyn PlanStore>,
        recorder: Arc<dyn Recorder>,
    ) -> Self {
        Self {
            config,
            resolver,
            store,
            recorder,
            checking: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> PollerState {
        if self.checking.load(Ordering::Acquire) {
            PollerState::Checking
        } else {
            PollerState::Idle
        }
    }

    /// Sweep immediately, then once per interval until `cancel` fires.
    ///
    /// A tick arriving while the previous sweep is still running is skipped.
    /// Cancellation does not abort a sweep already in flight.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if self.state() == PollerState::Checking {
                        log::info!("Previous sweep still running, skipping this tick");
                        continue;
                    }

                    let poller = self.clone();
                    tokio::spawn(async move {
                        if let Some(report) = poller.sweep().await {
                            log::debug!("Sweep finished: {report:?}");
                        }
                    });
                }
            }
        }

        log::info!("Plan poller stopped");
    }

    /// Check every plan once. Returns `None` when another sweep holds the
    /// single-flight flag.
    pub async fn sweep(&self) -> Option<SweepReport> {
        if self
            .checking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        let _guard = CheckingGuard(&self.checking);

        log::info!("Checking recording plans");
        let plans = match self.store.plans_not_recording().await {
            Ok(plans) => plans,
            Err(e) => {
                log::error!("Failed to load recording plans: {e:?}");
                return Some(SweepReport::default());
            }
        };

        let mut report = SweepReport {
            plans: plans.len(),
            ..Default::default()
        };
        if plans.is_empty() {
            return Some(report);
        }

        let mut tasks = JoinSet::new();
        for plan in plans {
            let resolver = self.resolver.clone();
            let recorder = self.recorder.clone();
            tasks.spawn(check_plan(resolver, recorder, plan));
        }

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(PlanOutcome::Offline) => {}
                Ok(PlanOutcome::LiveWithoutStream | PlanOutcome::AlreadyRecording) => {
                    report.live += 1
                }
                Ok(PlanOutcome::Started) => {
                    report.live += 1;
                    report.started += 1;
                }
                Ok(PlanOutcome::Failed) => report.failed += 1,
                Err(e) => {
                    log::warn!("Plan check task aborted: {e}");
                    report.failed += 1;
                }
            }
        }

        Some(report)
    }
}

async fn check_plan(
    resolver: Arc<Resolver>,
    recorder: Arc<dyn Recorder>,
    plan: RecordingPlan,
) -> PlanOutcome {
    let info = match resolver.resolve(&plan.url).await {
        Ok(info) => info,
        Err(e) => {
            log::warn!("Failed to resolve {}: {e}", plan.url);
            return PlanOutcome::Failed;
        }
    };
    if !info.is_live() {
        log::debug!("{} is not live", plan.url);
        return PlanOutcome::Offline;
    }

    let stream = match select_stream(&info.streams, plan.stream_protocol, &plan.stream_resolution)
    {
        Ok(stream) => stream.clone(),
        Err(e) => {
            log::warn!("{} is live but unusable: {e}", plan.url);
            return PlanOutcome::LiveWithoutStream;
        }
    };

    log::info!(
        "{} is live, recording {} ({:?})",
        info.anchor_name,
        stream.resolution,
        stream.protocol
    );
    match recorder.start_recording(stream, info, false).await {
        Ok(RecordingStart::Started) => PlanOutcome::Started,
        Ok(RecordingStart::AlreadyRecording) => {
            log::debug!("{} is already being recorded", plan.url);
            PlanOutcome::AlreadyRecording
        }
        Err(e) => {
            log::warn!("Failed to start recording {}: {e:?}", plan.url);
            PlanOutcome::Failed
        }
    }
}
