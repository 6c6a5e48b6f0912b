use serde::Deserialize;

/// One downloadable file attached to a release
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Latest release of a project, as returned by the release API
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct Release {
    #[serde(default)]
    pub tag_name: Option<String>,
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Tag for log lines; releases without a tag are shown as `latest`.
    pub fn label(&self) -> &str {
        self.tag_name.as_deref().unwrap_or("latest")
    }
}
