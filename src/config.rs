use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::PathBuf;

use crate::http::HttpClient;
use crate::matcher::{AssetMatcher, RegexMatcher, SubstringMatcher};
use crate::progress::Progress;
use crate::runtime::Runtime;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "depfetch";

/// What to do with the download cache at the start of a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CachePolicy {
    /// Empty the cache first; every run downloads the asset again
    #[default]
    Reset,
    /// Keep an already downloaded archive of the selected asset and prune
    /// everything else from the cache
    Reuse,
}

/// Directory layout below the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn download_dir(&self) -> PathBuf {
        self.root.join("download")
    }

    pub fn framework_cache_dir(&self) -> PathBuf {
        self.download_dir().join("MaaFramework")
    }

    pub fn framework_dir(&self) -> PathBuf {
        self.root.join("deps")
    }

    pub fn mfa_cache_dir(&self) -> PathBuf {
        self.download_dir().join("MFAAvalonia")
    }

    pub fn mfa_dir(&self) -> PathBuf {
        self.root.join("MFA")
    }
}

/// Everything one project sync needs to know.
pub struct SyncTarget {
    pub project: String,
    pub endpoint: String,
    pub matcher: Box<dyn AssetMatcher>,
    pub download_cache_dir: PathBuf,
    pub extract_dir: PathBuf,
}

impl std::fmt::Debug for SyncTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncTarget")
            .field("project", &self.project)
            .field("endpoint", &self.endpoint)
            .field("matcher", &self.matcher.describe())
            .field("download_cache_dir", &self.download_cache_dir)
            .field("extract_dir", &self.extract_dir)
            .finish()
    }
}

/// Latest-release endpoint for a GitHub repository.
pub fn latest_release_url(api_url: &str, owner: &str, repo: &str) -> String {
    format!(
        "{}/repos/{}/{}/releases/latest",
        api_url.trim_end_matches('/'),
        owner,
        repo
    )
}

/// The two projects this tool keeps in sync, in the order they are synced.
pub fn default_targets(layout: &Layout, api_url: &str, arch: &str) -> Result<Vec<SyncTarget>> {
    Ok(vec![
        SyncTarget {
            project: "MaaFramework".to_string(),
            endpoint: latest_release_url(api_url, "MaaXYZ", "MaaFramework"),
            matcher: Box::new(SubstringMatcher::new(format!("MAA-win-{}", arch))),
            download_cache_dir: layout.framework_cache_dir(),
            extract_dir: layout.framework_dir(),
        },
        SyncTarget {
            project: "MFAAvalonia".to_string(),
            endpoint: latest_release_url(api_url, "SweetSmellFox", "MFAAvalonia"),
            matcher: Box::new(RegexMatcher::new("MFAAvalonia.*-win-x64")?),
            download_cache_dir: layout.mfa_cache_dir(),
            extract_dir: layout.mfa_dir(),
        },
    ])
}

pub struct Config {
    pub http: HttpClient,
    pub api_url: String,
    pub layout: Layout,
    pub cache_policy: CachePolicy,
    pub progress: Progress,
}

impl Config {
    pub fn new<R: Runtime + ?Sized>(
        runtime: &R,
        root: PathBuf,
        api_url: Option<String>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var("GITHUB_TOKEN")
            && !token.is_empty()
        {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using GITHUB_TOKEN for authentication: {}", mask_token(&token));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http: HttpClient::new(client),
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            layout: Layout::new(root),
            cache_policy: CachePolicy::default(),
            progress: Progress::hidden(),
        })
    }

    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn targets(&self, arch: &str) -> Result<Vec<SyncTarget>> {
        default_targets(&self.layout, &self.api_url, arch)
    }
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
