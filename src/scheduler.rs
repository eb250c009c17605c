//! Interval scheduler for the ingestion and alert jobs.
//!
//! Every job runs once at startup and then on its own fixed interval. A failed
//! run is logged and counted; the loop keeps going.

use crate::config::SchedulerConfig;
use crate::jobs::{self, JobContext};
use crate::types::Sport;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Ingest(Sport),
    Anomalies(Sport),
    Ev(Sport),
    Smoke,
}

impl Job {
    /// All scheduled jobs, three per sport plus the smoke check
    pub fn all() -> Vec<Job> {
        let mut jobs: Vec<Job> = Sport::ALL
            .iter()
            .flat_map(|&s| [Job::Ingest(s), Job::Anomalies(s), Job::Ev(s)])
            .collect();
        jobs.push(Job::Smoke);
        jobs
    }

    pub fn name(&self) -> String {
        match self {
            Job::Ingest(s) => format!("ingest_{}", s),
            Job::Anomalies(s) => format!("anomalies_{}", s),
            Job::Ev(s) => format!("ev_{}", s),
            Job::Smoke => "flashscore_smoke".to_string(),
        }
    }

    pub fn interval(&self, config: &SchedulerConfig) -> Duration {
        let secs = match self {
            Job::Ingest(Sport::Basketball) => config.basketball_ingest_secs,
            Job::Ingest(Sport::Football) => config.football_ingest_secs,
            Job::Ingest(Sport::Tennis) => config.tennis_ingest_secs,
            Job::Anomalies(Sport::Basketball) => config.basketball_anomaly_secs,
            Job::Anomalies(Sport::Football) => config.football_anomaly_secs,
            Job::Anomalies(Sport::Tennis) => config.tennis_anomaly_secs,
            Job::Ev(Sport::Basketball) => config.basketball_ev_secs,
            Job::Ev(Sport::Football) => config.football_ev_secs,
            Job::Ev(Sport::Tennis) => config.tennis_ev_secs,
            Job::Smoke => config.smoke_secs,
        };
        Duration::from_secs(secs.max(1))
    }

    /// Run the job once
    pub async fn run(&self, ctx: &JobContext) -> Result<()> {
        match *self {
            Job::Ingest(sport) => {
                jobs::run_ingest(ctx, sport).await?;
            }
            Job::Anomalies(sport) => {
                jobs::run_anomalies(ctx, sport).await?;
            }
            Job::Ev(Sport::Basketball) => {
                jobs::run_basketball_ev(ctx).await?;
            }
            Job::Ev(sport) => {
                jobs::run_model_ev(ctx, sport).await?;
            }
            Job::Smoke => {
                jobs::run_smoke(ctx).await?;
            }
        }
        Ok(())
    }
}

/// Run a job, recording the outcome in the metrics
pub async fn run_and_record(ctx: &JobContext, job: Job) -> bool {
    ctx.metrics.inc_job_runs();
    match job.run(ctx).await {
        Ok(()) => true,
        Err(e) => {
            let name = job.name();
            error!("❌ Job {} FAILED: {:#}", name, e);
            ctx.metrics.record_job_failure(&name, &format!("{:#}", e)).await;
            false
        }
    }
}

/// Spawn one task per job. The handles can be aborted to stop the scheduler.
pub fn start(ctx: Arc<JobContext>) -> Vec<JoinHandle<()>> {
    let config = ctx.config.scheduler.clone();
    let jobs = Job::all();

    let handles = jobs
        .iter()
        .map(|&job| {
            let ctx = ctx.clone();
            let period = job.interval(&config);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    // first tick completes immediately
                    ticker.tick().await;
                    run_and_record(&ctx, job).await;
                }
            })
        })
        .collect();

    info!("✅ Scheduler started with {} jobs ({} sports)", jobs.len(), Sport::ALL.len());
    for sport in Sport::ALL {
        info!("   {} {}: 3 jobs", sport.emoji(), sport);
    }
    info!("   🔧 Utils: 1 job");
    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::test_support::context;
    use std::collections::HashSet;

    #[test]
    fn test_job_catalog() {
        let jobs = Job::all();
        assert_eq!(jobs.len(), 10);
        let names: HashSet<String> = jobs.iter().map(Job::name).collect();
        assert_eq!(names.len(), 10);
        assert!(names.contains("ev_basketball"));
        assert!(names.contains("flashscore_smoke"));
    }

    #[test]
    fn test_intervals() {
        let config = SchedulerConfig::default();
        assert_eq!(Job::Ingest(Sport::Basketball).interval(&config), Duration::from_secs(600));
        assert_eq!(Job::Ingest(Sport::Tennis).interval(&config), Duration::from_secs(1200));
        assert_eq!(Job::Anomalies(Sport::Football).interval(&config), Duration::from_secs(180));
        assert_eq!(Job::Ev(Sport::Football).interval(&config), Duration::from_secs(300));
        assert_eq!(Job::Smoke.interval(&config), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_run_and_record_counts_runs() {
        let ctx = context().await;
        assert!(run_and_record(&ctx, Job::Anomalies(Sport::Tennis)).await);
        assert!(run_and_record(&ctx, Job::Ev(Sport::Basketball)).await);

        let snapshot = ctx.metrics.snapshot().await;
        assert_eq!(snapshot.job_runs, 2);
        assert_eq!(snapshot.job_failures, 0);
    }
}
