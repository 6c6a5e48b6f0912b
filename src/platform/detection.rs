use anyhow::{Result, anyhow};
use std::fmt;

/// Operating system family as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsKind {
    Windows,
    Linux,
    Darwin,
    Other(String),
}

impl OsKind {
    /// Maps a raw OS name (`std::env::consts::OS` style, or a user override)
    /// onto an OS family.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "windows" => OsKind::Windows,
            "linux" => OsKind::Linux,
            "macos" | "darwin" => OsKind::Darwin,
            other => OsKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsKind::Windows => write!(f, "Windows"),
            OsKind::Linux => write!(f, "Linux"),
            OsKind::Darwin => write!(f, "Darwin"),
            OsKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Normalizes a machine architecture string.
///
/// The input is lowercased first; `amd64` and `arm64` are folded into
/// `x86_64` and `aarch64`, anything unknown passes through unchanged.
pub fn normalize_arch(raw: &str) -> String {
    let arch = raw.to_lowercase();
    match arch.as_str() {
        "amd64" | "x86_64" => "x86_64".to_string(),
        "aarch64" | "arm64" => "aarch64".to_string(),
        _ => arch,
    }
}

/// Host platform information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: OsKind,
    pub arch: String,
}

impl Platform {
    pub fn new(os: OsKind, arch: &str) -> Self {
        Self {
            os,
            arch: normalize_arch(arch),
        }
    }

    /// Detect the current platform
    pub fn detect() -> Self {
        Self::new(
            OsKind::from_name(std::env::consts::OS),
            std::env::consts::ARCH,
        )
    }

    /// Parses an `OS/ARCH` override such as `windows/amd64`.
    pub fn parse(value: &str) -> Result<Self> {
        let (os, arch) = value
            .split_once('/')
            .ok_or_else(|| anyhow!("Invalid platform {:?}, expected OS/ARCH", value))?;
        if os.is_empty() || arch.is_empty() {
            return Err(anyhow!("Invalid platform {:?}, expected OS/ARCH", value));
        }
        Ok(Self::new(OsKind::from_name(os), arch))
    }

    /// Dependencies are only published for 64-bit x86 Windows.
    pub fn is_supported(&self) -> bool {
        self.os == OsKind::Windows && self.arch == "x86_64"
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.os, self.arch)
    }
}

/// Trait for platform detection (useful for testing)
pub trait PlatformDetector: Send + Sync {
    fn detect(&self) -> Platform;
}

/// Detector backed by the host the binary runs on
pub struct HostPlatformDetector;

impl PlatformDetector for HostPlatformDetector {
    fn detect(&self) -> Platform {
        Platform::detect()
    }
}

impl PlatformDetector for Platform {
    fn detect(&self) -> Platform {
        self.clone()
    }
}
