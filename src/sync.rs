//! Release asset synchronization
//!
//! A sync makes a project's extraction directory hold exactly the contents of
//! the release asset selected by the project's matcher:
//!
//! 1. prepare the cache and extraction directories (resetting the cache under
//!    [`CachePolicy::Reset`]),
//! 2. resolve the latest release and select the first matching asset,
//! 3. download the asset into the cache unless it is already there,
//! 4. extract it into a staging directory and swap that in place of the
//!    extraction directory.
//!
//! The extraction directory is only replaced once extraction has succeeded,
//! so a failed sync leaves the previous contents in place.

use log::{debug, info, warn};
use std::path::{Component, Path, PathBuf};

use crate::archive::ZipExtractor;
use crate::config::{CachePolicy, SyncTarget};
use crate::error::SyncError;
use crate::http::HttpClient;
use crate::matcher::select_asset;
use crate::progress::Progress;
use crate::release::{ReleaseAsset, ReleaseSource};
use crate::runtime::Runtime;

/// What a successful sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub project: String,
    pub release: String,
    pub asset_name: String,
    pub archive_path: PathBuf,
    pub extract_dir: PathBuf,
    /// `false` when an archive already present in the cache was reused
    pub downloaded: bool,
    pub entries: usize,
}

pub struct ReleaseAssetSyncer<'a, R: Runtime + ?Sized, S: ReleaseSource + ?Sized> {
    runtime: &'a R,
    source: &'a S,
    http: &'a HttpClient,
    cache_policy: CachePolicy,
    progress: Progress,
}

impl<'a, R: Runtime + ?Sized, S: ReleaseSource + ?Sized> ReleaseAssetSyncer<'a, R, S> {
    pub fn new(runtime: &'a R, source: &'a S, http: &'a HttpClient) -> Self {
        Self {
            runtime,
            source,
            http,
            cache_policy: CachePolicy::default(),
            progress: Progress::hidden(),
        }
    }

    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    #[tracing::instrument(skip(self, target), fields(project = %target.project))]
    pub async fn sync(&self, target: &SyncTarget) -> Result<SyncReport, SyncError> {
        let cache_dir = &target.download_cache_dir;

        self.ensure_dir(cache_dir)?;
        self.ensure_dir(&target.extract_dir)?;

        if self.cache_policy == CachePolicy::Reset {
            debug!("Resetting download cache {:?}", cache_dir);
            self.reset_dir(cache_dir)?;
        }

        let release = self.source.latest_release(&target.endpoint).await?;

        let asset = select_asset(&release.assets, target.matcher.as_ref())
            .ok_or_else(|| SyncError::NoMatchingAsset {
                pattern: target.matcher.describe(),
            })?
            .clone();
        check_asset_name(&asset.name)?;
        info!(
            "{}: selected {} from release {}",
            target.project,
            asset.name,
            release.label()
        );

        if self.cache_policy == CachePolicy::Reuse {
            self.prune_cache(cache_dir, &asset.name)?;
        }

        let archive_path = cache_dir.join(&asset.name);
        let downloaded = if self.cached_archive_usable(&asset, &archive_path)? {
            info!(
                "{}: archive already present: {:?}",
                target.project, archive_path
            );
            false
        } else {
            info!("{}: downloading {}", target.project, asset.name);
            self.download(&asset, cache_dir, &archive_path).await?;
            true
        };

        let entries =
            match self.replace_extract_dir(&target.project, &archive_path, &target.extract_dir) {
                Ok(entries) => entries,
                Err(e @ SyncError::CorruptArchive(_)) => {
                    // A bad archive must not be reused by the next run.
                    if let Err(evict) = self.runtime.remove_file(&archive_path) {
                        warn!("Failed to remove corrupt archive {:?}: {}", archive_path, evict);
                    }
                    return Err(e);
                }
                Err(e) => return Err(e),
            };
        info!(
            "{}: extracted {} entries to {:?}",
            target.project, entries, target.extract_dir
        );

        Ok(SyncReport {
            project: target.project.clone(),
            release: release.label().to_string(),
            asset_name: asset.name,
            archive_path,
            extract_dir: target.extract_dir.clone(),
            downloaded,
            entries,
        })
    }

    fn ensure_dir(&self, path: &Path) -> Result<(), SyncError> {
        self.runtime
            .create_dir_all(path)
            .map_err(SyncError::filesystem)
    }

    fn reset_dir(&self, path: &Path) -> Result<(), SyncError> {
        self.remove_if_exists(path)?;
        self.ensure_dir(path)
    }

    fn remove_if_exists(&self, path: &Path) -> Result<(), SyncError> {
        if self.runtime.exists(path) {
            self.runtime
                .remove_dir_all(path)
                .map_err(SyncError::filesystem)?;
        }
        Ok(())
    }

    /// Removes every cache entry except `keep`.
    fn prune_cache(&self, cache_dir: &Path, keep: &str) -> Result<(), SyncError> {
        let entries = self
            .runtime
            .read_dir(cache_dir)
            .map_err(SyncError::filesystem)?;

        for entry in entries {
            if entry.file_name().is_some_and(|name| name == keep) {
                continue;
            }
            debug!("Pruning stale cache entry {:?}", entry);
            let removed = if self.runtime.is_dir(&entry) {
                self.runtime.remove_dir_all(&entry)
            } else {
                self.runtime.remove_file(&entry)
            };
            removed.map_err(SyncError::filesystem)?;
        }
        Ok(())
    }

    /// Whether the cache already holds a complete copy of `asset`.
    ///
    /// When the release publishes a size, a cached file of any other length is
    /// removed and reported as absent.
    fn cached_archive_usable(
        &self,
        asset: &ReleaseAsset,
        archive_path: &Path,
    ) -> Result<bool, SyncError> {
        if !self.runtime.exists(archive_path) {
            return Ok(false);
        }
        let Some(expected) = asset.size else {
            return Ok(true);
        };

        let actual = self
            .runtime
            .file_size(archive_path)
            .map_err(SyncError::filesystem)?;
        if actual == expected {
            return Ok(true);
        }

        warn!(
            "Cached archive {:?} has {} bytes, release lists {}; downloading again",
            archive_path, actual, expected
        );
        self.runtime
            .remove_file(archive_path)
            .map_err(SyncError::filesystem)?;
        Ok(false)
    }

    /// Streams the asset into `<name>.part` and renames it once complete.
    async fn download(
        &self,
        asset: &ReleaseAsset,
        cache_dir: &Path,
        archive_path: &Path,
    ) -> Result<(), SyncError> {
        let part_path = cache_dir.join(format!("{}.part", asset.name));
        let pb = self.progress.download(&asset.name, asset.size);

        let result = self
            .http
            .download_file(
                &asset.download_url,
                || self.runtime.create_file(&part_path),
                |n| pb.inc(n),
            )
            .await;
        pb.finish_and_clear();

        let bytes = result.map_err(SyncError::network)?;
        debug!("Downloaded {} bytes to {:?}", bytes, part_path);

        self.runtime
            .rename(&part_path, archive_path)
            .map_err(SyncError::filesystem)
    }

    /// Extracts into a sibling staging directory, then swaps it in place of
    /// `extract_dir`.
    fn replace_extract_dir(
        &self,
        project: &str,
        archive_path: &Path,
        extract_dir: &Path,
    ) -> Result<usize, SyncError> {
        let staging = sibling(extract_dir, "staging")?;
        let old = sibling(extract_dir, "old")?;

        self.remove_if_exists(&staging)?;
        self.remove_if_exists(&old)?;
        self.ensure_dir(&staging)?;

        let pb = self.progress.extract(project);
        let result = ZipExtractor.extract(self.runtime, archive_path, &staging, |done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        });
        pb.finish_and_clear();

        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                if let Err(cleanup) = self.runtime.remove_dir_all(&staging) {
                    warn!("Failed to remove staging directory {:?}: {}", staging, cleanup);
                }
                return Err(SyncError::corrupt_archive(e));
            }
        };

        if self.runtime.exists(extract_dir) {
            self.runtime
                .rename(extract_dir, &old)
                .map_err(SyncError::filesystem)?;
        }

        if let Err(e) = self.runtime.rename(&staging, extract_dir) {
            if self.runtime.exists(&old)
                && let Err(restore) = self.runtime.rename(&old, extract_dir)
            {
                warn!("Failed to restore {:?}: {}", extract_dir, restore);
            }
            return Err(SyncError::filesystem(e));
        }

        if self.runtime.exists(&old)
            && let Err(e) = self.runtime.remove_dir_all(&old)
        {
            warn!("Failed to remove previous contents {:?}: {}", old, e);
        }

        Ok(entries)
    }
}

/// `<dir>.<suffix>` next to `dir`.
fn sibling(dir: &Path, suffix: &str) -> Result<PathBuf, SyncError> {
    let name = dir.file_name().ok_or_else(|| {
        SyncError::Filesystem(format!("Invalid extraction directory {:?}", dir))
    })?;
    let mut sibling_name = name.to_os_string();
    sibling_name.push(".");
    sibling_name.push(suffix);
    Ok(dir.with_file_name(sibling_name))
}

/// Asset names become file names in the cache; they must be a single plain
/// path component.
fn check_asset_name(name: &str) -> Result<(), SyncError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(SyncError::MalformedResponse(format!(
            "Asset name {:?} is not a plain file name",
            name
        ))),
    }
}
