//! Asset name matching
//!
//! Each project selects its release asset with an [`AssetMatcher`]. The first
//! asset (in the order the release lists them) whose name matches wins.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::release::ReleaseAsset;

/// Predicate over asset names
pub trait AssetMatcher: Send + Sync {
    fn matches(&self, name: &str) -> bool;

    /// Human-readable pattern, used in logs and errors
    fn describe(&self) -> String;
}

/// Matches names containing a fixed, case-sensitive substring
pub struct SubstringMatcher {
    needle: String,
}

impl SubstringMatcher {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
        }
    }
}

impl AssetMatcher for SubstringMatcher {
    fn matches(&self, name: &str) -> bool {
        name.contains(&self.needle)
    }

    fn describe(&self) -> String {
        self.needle.clone()
    }
}

/// Matches names where a case-insensitive regex is found anywhere in the name
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Invalid asset pattern {:?}", pattern))?;
        Ok(Self { regex })
    }
}

impl AssetMatcher for RegexMatcher {
    fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    fn describe(&self) -> String {
        self.regex.as_str().to_string()
    }
}

/// Returns the first asset whose name satisfies `matcher`.
pub fn select_asset<'a>(
    assets: &'a [ReleaseAsset],
    matcher: &dyn AssetMatcher,
) -> Option<&'a ReleaseAsset> {
    assets.iter().find(|asset| matcher.matches(&asset.name))
}
