//! Platform detection module
//!
//! This module reports the host operating system and a normalized CPU
//! architecture, and decides whether dependency syncing applies to the host.

mod detection;

pub use detection::{HostPlatformDetector, OsKind, Platform, PlatformDetector, normalize_arch};
