//! Top-level run: platform gate, then every project sync in order.

use anyhow::Result;
use log::{error, info};

use crate::config::{Config, SyncTarget};
use crate::error::SyncError;
use crate::platform::{Platform, PlatformDetector};
use crate::release::ReleaseSource;
use crate::runtime::Runtime;
use crate::sync::{ReleaseAssetSyncer, SyncReport};

/// Result of one project's sync
#[derive(Debug)]
pub struct SyncOutcome {
    pub project: String,
    pub result: Result<SyncReport, SyncError>,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug)]
pub enum RunSummary {
    /// The host is not a platform dependencies are published for
    Skipped(Platform),
    Completed(Vec<SyncOutcome>),
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        match self {
            RunSummary::Skipped(_) => 0,
            RunSummary::Completed(outcomes) => outcomes.iter().filter(|o| !o.is_success()).count(),
        }
    }

    /// 0 when skipped or everything synced, 1 when a project failed and
    /// failures are not allowed.
    pub fn exit_code(&self, allow_failures: bool) -> u8 {
        if self.failures() > 0 && !allow_failures {
            1
        } else {
            0
        }
    }

    /// Human-readable status lines.
    pub fn lines(&self) -> Vec<String> {
        match self {
            RunSummary::Skipped(platform) => vec![format!(
                "Host is not x86_64 Windows (detected {}); nothing to sync.",
                platform
            )],
            RunSummary::Completed(outcomes) => outcomes
                .iter()
                .map(|outcome| match &outcome.result {
                    Ok(report) => format!(
                        "{}: {} ({}) extracted to {}",
                        outcome.project,
                        report.asset_name,
                        report.release,
                        report.extract_dir.display()
                    ),
                    Err(e) => format!("{}: failed ({}): {}", outcome.project, e.kind(), e),
                })
                .collect(),
        }
    }
}

/// Checks the platform gate and syncs every target for the host.
///
/// A failing project never stops the projects after it.
pub async fn run<R, S>(
    runtime: &R,
    source: &S,
    config: &Config,
    detector: &dyn PlatformDetector,
) -> Result<RunSummary>
where
    R: Runtime + ?Sized,
    S: ReleaseSource + ?Sized,
{
    let platform = detector.detect();
    if !platform.is_supported() {
        info!("Skipping dependency sync on {}", platform);
        return Ok(RunSummary::Skipped(platform));
    }

    let targets = config.targets(&platform.arch)?;
    Ok(RunSummary::Completed(
        sync_all(runtime, source, config, &targets).await,
    ))
}

/// Syncs `targets` one after another, collecting every outcome.
pub async fn sync_all<R, S>(
    runtime: &R,
    source: &S,
    config: &Config,
    targets: &[SyncTarget],
) -> Vec<SyncOutcome>
where
    R: Runtime + ?Sized,
    S: ReleaseSource + ?Sized,
{
    let syncer = ReleaseAssetSyncer::new(runtime, source, &config.http)
        .with_cache_policy(config.cache_policy)
        .with_progress(config.progress);

    let mut outcomes = Vec::with_capacity(targets.len());
    for target in targets {
        info!("Syncing {}...", target.project);
        let result = syncer.sync(target).await;
        if let Err(e) = &result {
            error!("Failed to sync {}: {}", target.project, e);
        }
        outcomes.push(SyncOutcome {
            project: target.project.clone(),
            result,
        });
    }
    outcomes
}
