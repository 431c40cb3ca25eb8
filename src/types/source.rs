use crate::fetch::error::FetchError;
use reqwest::Url;
use std::fmt;

const CAMELS_BASE_URL: &str = "https://ral.ucar.edu/sites/default/files/public/product-tool/camels-catchment-attributes-and-meteorology-for-large-sample-studies-dataset-downloads";

/// Archive names of the pinned CAMELS release, in download order.
pub const CAMELS_ARCHIVES: [&str; 3] = [
    "camels_attributes_v2.0.zip",
    "basin_set_full_res.zip",
    "basin_timeseries_v1p2_metForcing_obsFlow.zip",
];

/// Full URLs of the pinned CAMELS archives.
pub fn default_source_urls() -> Vec<String> {
    CAMELS_ARCHIVES
        .iter()
        .map(|name| format!("{CAMELS_BASE_URL}/{name}"))
        .collect()
}

/// A remote file and the local name it is cached under.
///
/// The local name is the last path segment of the URL, so two sources with
/// the same trailing segment would share a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    url: Url,
    file_name: String,
}

impl DataSource {
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let url = Url::parse(raw).map_err(|e| FetchError::InvalidUrl(raw.to_string(), e))?;
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| FetchError::MissingFileName(raw.to_string()))?
            .to_string();
        Ok(Self { url, file_name })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
