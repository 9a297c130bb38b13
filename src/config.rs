/// Endpoint layout and audio settings for one loader session.
///
/// Defaults mirror the hosted asset service layout; tests and self-hosted
/// deployments override the bases. The value is owned by the call site and
/// passed by reference, never stored in a global.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LoaderConfig {
    /// Base URL for project descriptor fetches.
    pub project_base: String,
    /// Suffix appended after the project id.
    pub project_suffix: String,
    /// Base URL for costume/sound asset fetches.
    pub asset_base: String,
    /// Suffix appended after the asset digest.
    pub asset_suffix: String,
    /// Base URL for the fixed instrument bank.
    pub soundbank_base: String,
    /// Output sample rate sound buffers are resampled to.
    pub sample_rate: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            project_base: "https://projects.scratch.mit.edu/internalapi/project/".to_string(),
            project_suffix: "/get/".to_string(),
            asset_base: "https://cdn.scratch.mit.edu/internalapi/asset/".to_string(),
            asset_suffix: "/get/".to_string(),
            soundbank_base: "https://cdn.scratch.mit.edu/soundbank/".to_string(),
            sample_rate: 44_100,
        }
    }
}

impl LoaderConfig {
    /// URL of the serialized descriptor for `project_id`.
    pub fn project_url(&self, project_id: u64) -> String {
        format!("{}{project_id}{}", self.project_base, self.project_suffix)
    }

    /// URL of the asset bytes identified by `digest`.
    pub fn asset_url(&self, digest: &str) -> String {
        format!("{}{digest}{}", self.asset_base, self.asset_suffix)
    }

    /// URL of one instrument bank file. The filename is percent-escaped.
    pub fn soundbank_url(&self, file: &str) -> String {
        format!("{}{}", self.soundbank_base, urlencoding::encode(file))
    }
}
