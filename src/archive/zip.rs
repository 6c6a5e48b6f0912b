use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Extractor for .zip archives
///
/// Entries keep their archive-relative paths below the destination directory.
pub struct ZipExtractor;

impl ZipExtractor {
    /// Extracts every entry of `archive_path` into `extract_to`, which must
    /// already exist. `on_entry(done, total)` is called after each entry.
    ///
    /// Returns the number of entries written. Entries with unsafe paths are
    /// skipped and not counted.
    #[tracing::instrument(skip(self, runtime, on_entry))]
    pub fn extract<R, P>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
        mut on_entry: P,
    ) -> Result<usize>
    where
        R: Runtime + ?Sized,
        P: FnMut(usize, usize),
    {
        debug!("Extracting zip archive {:?} to {:?}...", archive_path, extract_to);
        let mut reader = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        // zip requires Read + Seek, the runtime only hands out Read
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;

        let mut archive = ZipArchive::new(std::io::Cursor::new(buffer))
            .with_context(|| format!("Failed to parse ZIP archive {:?}", archive_path))?;

        let total = archive.len();
        let mut written = 0;
        for i in 0..total {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("Failed to read ZIP entry {}", i))?;

            let entry_path = match entry.enclosed_name() {
                Some(path) => path,
                None => {
                    warn!("Skipping entry with unsafe path {:?}", entry.name());
                    on_entry(i + 1, total);
                    continue;
                }
            };

            let full_path = extract_to.join(&entry_path);

            if entry.is_dir() {
                runtime.create_dir_all(&full_path)?;
            } else {
                if let Some(parent) = full_path.parent() {
                    runtime.create_dir_all(parent)?;
                }
                let mut dest_file = runtime.create_file(&full_path)?;
                std::io::copy(&mut entry, &mut dest_file)
                    .with_context(|| format!("Failed to extract file {:?}", full_path))?;

                #[cfg(unix)]
                if let Some(mode) = entry.unix_mode()
                    && let Err(e) = runtime.set_permissions(&full_path, mode)
                {
                    debug!("Failed to set permissions on {:?}: {}", full_path, e);
                }
            }

            written += 1;
            on_entry(i + 1, total);
        }

        debug!("Extracted {} of {} entries.", written, total);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use crate::test_utils::create_zip;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_extract_preserves_paths() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("MAA-win-x86_64.zip");
        let extract_path = dir.path().join("deps");
        fs::create_dir(&extract_path)?;

        create_zip(
            &archive_path,
            &[("bin/MaaFramework.dll", "dll"), ("README.md", "readme")],
        )?;

        let count = ZipExtractor.extract(&RealRuntime, &archive_path, &extract_path, |_, _| {})?;

        assert_eq!(count, 2);
        assert_eq!(fs::read_to_string(extract_path.join("bin/MaaFramework.dll"))?, "dll");
        assert_eq!(fs::read_to_string(extract_path.join("README.md"))?, "readme");
        Ok(())
    }

    #[test]
    fn test_extract_does_not_flatten_single_top_level_dir() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("MFA.zip");
        let extract_path = dir.path().join("MFA");
        fs::create_dir(&extract_path)?;

        create_zip(&archive_path, &[("MFAAvalonia/MFAAvalonia.exe", "exe")])?;

        ZipExtractor.extract(&RealRuntime, &archive_path, &extract_path, |_, _| {})?;

        assert!(extract_path.join("MFAAvalonia/MFAAvalonia.exe").exists());
        assert!(!extract_path.join("MFAAvalonia.exe").exists());
        Ok(())
    }

    #[test]
    fn test_extract_reports_every_entry() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("a.zip");
        let extract_path = dir.path().join("out");
        fs::create_dir(&extract_path)?;

        create_zip(&archive_path, &[("a.txt", "a"), ("b.txt", "b"), ("c/d.txt", "d")])?;

        let mut calls = Vec::new();
        ZipExtractor.extract(&RealRuntime, &archive_path, &extract_path, |done, total| {
            calls.push((done, total))
        })?;

        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
        Ok(())
    }

    #[test]
    fn test_extract_empty_archive() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("empty.zip");
        let extract_path = dir.path().join("out");
        fs::create_dir(&extract_path)?;

        create_zip(&archive_path, &[])?;

        let count = ZipExtractor.extract(&RealRuntime, &archive_path, &extract_path, |_, _| {})?;
        assert_eq!(count, 0);
        assert_eq!(fs::read_dir(&extract_path)?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_extract_archive_with_directory_entries() -> Result<()> {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let dir = tempdir()?;
        let archive_path = dir.path().join("dirs.zip");
        let extract_path = dir.path().join("out");
        fs::create_dir(&extract_path)?;

        {
            let mut zip = zip::ZipWriter::new(fs::File::create(&archive_path)?);
            let options = SimpleFileOptions::default();
            zip.add_directory("plugins/empty/", options)?;
            zip.start_file("plugins/agent.py", options)?;
            zip.write_all(b"print()")?;
            zip.finish()?;
        }

        ZipExtractor.extract(&RealRuntime, &archive_path, &extract_path, |_, _| {})?;

        assert!(extract_path.join("plugins/empty").is_dir());
        assert_eq!(fs::read_to_string(extract_path.join("plugins/agent.py"))?, "print()");
        Ok(())
    }

    #[test]
    fn test_extract_skips_unsafe_paths() -> Result<()> {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let dir = tempdir()?;
        let archive_path = dir.path().join("unsafe.zip");
        let extract_path = dir.path().join("out");
        fs::create_dir(&extract_path)?;

        {
            let mut zip = zip::ZipWriter::new(fs::File::create(&archive_path)?);
            let options = SimpleFileOptions::default();
            zip.start_file("../escape.txt", options)?;
            zip.write_all(b"outside")?;
            zip.start_file("inside.txt", options)?;
            zip.write_all(b"inside")?;
            zip.finish()?;
        }

        let mut calls = Vec::new();
        let count = ZipExtractor.extract(&RealRuntime, &archive_path, &extract_path, |done, total| {
            calls.push((done, total))
        })?;

        assert_eq!(count, 1);
        assert_eq!(calls, vec![(1, 2), (2, 2)]);
        assert!(!dir.path().join("escape.txt").exists());
        assert_eq!(fs::read_to_string(extract_path.join("inside.txt"))?, "inside");
        Ok(())
    }

    #[test]
    fn test_extract_corrupted_archive() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("broken.zip");
        let extract_path = dir.path().join("out");
        fs::create_dir(&extract_path).unwrap();

        fs::write(&archive_path, "corrupted data").unwrap();

        let result = ZipExtractor.extract(&RealRuntime, &archive_path, &extract_path, |_, _| {});
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to parse ZIP archive"));
    }

    #[test]
    fn test_extract_nonexistent_archive() {
        let dir = tempdir().unwrap();
        let result = ZipExtractor.extract(
            &RealRuntime,
            &dir.path().join("missing.zip"),
            dir.path(),
            |_, _| {},
        );
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to open archive"));
    }

    #[test]
    fn test_extract_write_failure_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("a.zip");
        create_zip(&archive_path, &[("a.txt", "a")])?;
        let bytes = fs::read(&archive_path)?;

        let mut runtime = MockRuntime::new();
        runtime
            .expect_open()
            .returning(move |_| Ok(Box::new(std::io::Cursor::new(bytes.clone()))));
        runtime.expect_create_dir_all().returning(|_| Ok(()));
        runtime
            .expect_create_file()
            .returning(|_| Err(anyhow::anyhow!("disk full")));

        let result = ZipExtractor.extract(&runtime, &archive_path, Path::new("out"), |_, _| {});
        assert!(format!("{:#}", result.unwrap_err()).contains("disk full"));
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_extract_preserves_file_permissions() -> Result<()> {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;
        use zip::write::SimpleFileOptions;

        let dir = tempdir()?;
        let archive_path = dir.path().join("perm.zip");
        let extract_path = dir.path().join("out");
        fs::create_dir(&extract_path)?;

        {
            let mut zip = zip::ZipWriter::new(fs::File::create(&archive_path)?);
            zip.start_file(
                "run.sh",
                SimpleFileOptions::default().unix_permissions(0o755),
            )?;
            zip.write_all(b"#!/bin/sh")?;
            zip.start_file(
                "config.json",
                SimpleFileOptions::default().unix_permissions(0o644),
            )?;
            zip.write_all(b"{}")?;
            zip.finish()?;
        }

        ZipExtractor.extract(&RealRuntime, &archive_path, &extract_path, |_, _| {})?;

        let script_mode = fs::metadata(extract_path.join("run.sh"))?.permissions().mode();
        assert!(script_mode & 0o111 != 0);
        let config_mode = fs::metadata(extract_path.join("config.json"))?.permissions().mode();
        assert!(config_mode & 0o111 == 0);
        Ok(())
    }
}
