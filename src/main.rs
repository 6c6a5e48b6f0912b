use anyhow::{Context, Result};
use clap::Parser;
use depfetch::config::{CachePolicy, Config};
use depfetch::driver;
use depfetch::platform::{HostPlatformDetector, Platform, PlatformDetector};
use depfetch::progress::Progress;
use depfetch::release::GitHubReleases;
use depfetch::runtime::RealRuntime;
use std::path::PathBuf;
use std::process::ExitCode;

/// depfetch - fetch prebuilt MaaFramework and MFAAvalonia releases
///
/// Downloads the latest x86_64 Windows builds and extracts them into
/// `deps/` and `MFA/` below the project root, replacing previous contents.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Project root directory (defaults to the current directory; also via DEPFETCH_ROOT)
    #[arg(long = "root", short = 'r', env = "DEPFETCH_ROOT", value_name = "PATH")]
    root: Option<PathBuf>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL")]
    api_url: Option<String>,

    /// Whether to empty the download cache before syncing or reuse a cached archive
    #[arg(long = "cache-policy", value_enum, default_value_t = CachePolicy::Reset)]
    cache_policy: CachePolicy,

    /// Hide progress bars
    #[arg(long = "no-progress")]
    no_progress: bool,

    /// Exit successfully even if a project failed to sync
    #[arg(long = "allow-failures")]
    allow_failures: bool,

    /// Use this platform instead of the detected one, e.g. windows/x86_64
    #[arg(long = "assume-platform", value_name = "OS/ARCH", value_parser = Platform::parse)]
    assume_platform: Option<Platform>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("depfetch=info"))
        .init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let config = Config::new(&runtime, root, cli.api_url)?
        .with_cache_policy(cli.cache_policy)
        .with_progress(Progress::new(!cli.no_progress));
    let source = GitHubReleases::new(config.http.clone());

    let detector: Box<dyn PlatformDetector> = match cli.assume_platform {
        Some(platform) => Box::new(platform),
        None => Box::new(HostPlatformDetector),
    };

    let summary = driver::run(&runtime, &source, &config, detector.as_ref()).await?;
    for line in summary.lines() {
        println!("{}", line);
    }

    Ok(ExitCode::from(summary.exit_code(cli.allow_failures)))
}
