/// Client for the soil-examination list service
/// (apis.data.go.kr / SoilEnviron `getSoilExamList`).
///
/// Fetches one XML page at a time; interpretation of the page body belongs
/// to the service crate. No retry: a failed page is terminal for that call.
use tracing::debug;

use crate::error::CommonError;

/// Default endpoint of the soil-examination list API.
pub const DEFAULT_SOIL_API_URL: &str =
    "http://apis.data.go.kr/1390802/SoilEnviron/SoilExam/getSoilExamList";

/// Records per page requested from the service.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct SoilApiConfig {
    pub base_url: String,
    /// Service key issued by data.go.kr. Keys arrive URL-encoded.
    pub service_key: String,
    /// TLS certificate verification for the soil endpoint. The upstream
    /// host has a history of serving certificates that fail verification;
    /// setting this to `false` accepts them anyway.
    pub verify_certificates: bool,
    pub page_size: u32,
}

impl SoilApiConfig {
    pub fn new(service_key: String) -> Self {
        Self {
            base_url: DEFAULT_SOIL_API_URL.to_string(),
            service_key,
            verify_certificates: true,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

pub struct SoilApiClient {
    config: SoilApiConfig,
    http: reqwest::Client,
}

impl SoilApiClient {
    pub fn new(config: SoilApiConfig) -> Result<Self, CommonError> {
        let http = reqwest::Client::builder()
            .user_agent("soil-info")
            .danger_accept_invalid_certs(!config.verify_certificates)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    /// Fetch one page of soil-examination records as raw XML.
    pub async fn fetch_page(&self, bjd_code: &str, page_no: u32) -> Result<String, CommonError> {
        // The service key is already URL-encoded as issued; building the URL
        // by hand avoids encoding it a second time.
        let url = format!(
            "{}?serviceKey={}&BJD_Code={}&Page_Size={}&Page_No={}",
            self.config.base_url, self.config.service_key, bjd_code, self.config.page_size, page_no
        );
        debug!(bjd_code, page_no, "fetching soil page");

        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
