use std::sync::Arc;

use async_trait::async_trait;
use kanshi::{poller::PlanStore, RecordingPlan};

use crate::recorder::CommandRecorder;

/// Plans from the config file, minus those the recorder is busy with.
pub struct ConfigPlanStore {
    plans: Vec<RecordingPlan>,
    recorder: Arc<CommandRecorder>,
}

impl ConfigPlanStore {
    pub fn new(plans: Vec<RecordingPlan>, recorder: Arc<CommandRecorder>) -> Self {
        Self { plans, recorder }
    }

    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }
}

#[async_trait]
impl PlanStore for ConfigPlanStore {
    async fn plans_not_recording(&self) -> anyhow::Result<Vec<RecordingPlan>> {
        Ok(self
            .plans
            .iter()
            .filter(|plan| plan.enabled && !self.recorder.is_recording(plan.url.trim()))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use kanshi::StreamingProtocol;

    use super::*;

    #[tokio::test]
    async fn test_disabled_plans_are_skipped() {
        let recorder = Arc::new(CommandRecorder::new("true", PathBuf::new()).unwrap());
        let mut disabled = RecordingPlan::new("https://www.huya.com/2", StreamingProtocol::Flv, "", 0);
        disabled.enabled = false;
        let store = ConfigPlanStore::new(
            vec![
                RecordingPlan::new("https://www.huya.com/1", StreamingProtocol::Flv, "", 0),
                disabled,
            ],
            recorder,
        );

        let plans = store.plans_not_recording().await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].url, "https://www.huya.com/1");
    }
}
