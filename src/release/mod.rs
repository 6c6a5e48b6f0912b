//! Latest-release metadata and the API that serves it.

mod source;
mod types;

#[cfg(test)]
pub use source::MockReleaseSource;
pub use source::{GitHubReleases, ReleaseSource};
pub use types::{Release, ReleaseAsset};
