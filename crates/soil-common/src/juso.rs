/// Client for the road-name address lookup service (juso.go.kr).
///
/// One operation: resolve a free-text keyword to the single best-matching
/// address. The service ranks results itself (`firstSort=location`); the
/// first entry is taken unconditionally, with no disambiguation among
/// candidates.
use serde::Deserialize;
use tracing::{error, info};

use crate::error::CommonError;

/// Default endpoint of the address lookup API.
pub const DEFAULT_JUSO_API_URL: &str = "https://www.juso.go.kr/addrlink/addrLinkApi.do";

/// Message returned when the lookup succeeds but matches nothing.
pub const NO_ADDRESS_FOUND: &str = "검색된 주소가 없습니다. 입력한 주소를 확인해주세요.";

#[derive(Debug, Clone)]
pub struct JusoClientConfig {
    pub base_url: String,
    /// Confirmation key (`confmKey`) issued by juso.go.kr.
    pub api_key: String,
}

impl JusoClientConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            base_url: DEFAULT_JUSO_API_URL.to_string(),
            api_key,
        }
    }
}

/// The selected address from a lookup, normalized for downstream use.
///
/// Immutable once returned; one instance lives for one resolution call.
#[derive(Debug, Clone)]
pub struct AddressRecord {
    /// Road-name address (도로명주소), full form.
    pub road_addr: String,
    /// Parcel address (지번주소), full form.
    pub jibun_addr: String,
    /// 10-digit legal-district (법정동) code.
    pub bjd_code: String,
    /// Whether the parcel is mountain land (`mtYn == "1"`).
    pub mountain: bool,
    /// Main parcel number (본번).
    pub main_no: u32,
    /// Sub parcel number (부번).
    pub sub_no: u32,
}

#[derive(Clone)]
pub struct JusoClient {
    config: JusoClientConfig,
    http: reqwest::Client,
}

impl JusoClient {
    pub fn new(config: JusoClientConfig) -> Result<Self, CommonError> {
        let http = reqwest::Client::builder()
            .user_agent("soil-info")
            .build()?;
        Ok(Self { config, http })
    }

    /// Look up a free-text address and return the best match.
    ///
    /// Upstream business errors and empty result sets surface as
    /// [`CommonError::Upstream`] carrying the service's message; transport
    /// failures surface as [`CommonError::Transport`]. Nothing panics.
    pub async fn resolve(&self, keyword: &str) -> Result<AddressRecord, CommonError> {
        info!(keyword, "address lookup");

        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("confmKey", self.config.api_key.as_str()),
                ("keyword", keyword),
                ("currentPage", "1"),
                ("countPerPage", "10"),
                ("resultType", "json"),
                ("hstryYn", "Y"),
                ("firstSort", "location"),
                ("addInfoYn", "Y"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let parsed: JusoResponse = serde_json::from_str(&body)?;
        let record = select_address(parsed)?;
        info!(road = %record.road_addr, jibun = %record.jibun_addr, "address resolved");
        Ok(record)
    }
}

/// Pick the address record out of a lookup response.
///
/// - Non-zero `errorCode` → the service's own `errorMessage`, verbatim.
/// - `totalCount == "0"` → [`NO_ADDRESS_FOUND`].
/// - Otherwise the first `juso` entry, unconditionally.
pub fn select_address(response: JusoResponse) -> Result<AddressRecord, CommonError> {
    let common = &response.results.common;

    if common.error_code != "0" {
        error!(
            code = %common.error_code,
            message = %common.error_message,
            "address service error"
        );
        return Err(CommonError::Upstream(common.error_message.clone()));
    }

    if common.total_count == "0" {
        return Err(CommonError::Upstream(NO_ADDRESS_FOUND.to_string()));
    }

    let entry = response
        .results
        .juso
        .into_iter()
        .flatten()
        .next()
        .ok_or_else(|| CommonError::Upstream(NO_ADDRESS_FOUND.to_string()))?;

    Ok(entry.into_record())
}

#[derive(Debug, Deserialize)]
pub struct JusoResponse {
    pub results: JusoResults,
}

#[derive(Debug, Deserialize)]
pub struct JusoResults {
    pub common: JusoCommon,
    /// Absent or null on error responses.
    #[serde(default)]
    pub juso: Option<Vec<JusoEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct JusoCommon {
    #[serde(rename = "errorCode")]
    pub error_code: String,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
    /// The service reports counts as strings.
    #[serde(rename = "totalCount")]
    pub total_count: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JusoEntry {
    #[serde(rename = "roadAddr")]
    pub road_addr: String,
    #[serde(rename = "jibunAddr")]
    pub jibun_addr: String,
    #[serde(rename = "admCd")]
    pub adm_cd: String,
    /// "0" for ordinary land (대지), "1" for mountain land (산).
    #[serde(rename = "mtYn")]
    pub mt_yn: String,
    #[serde(rename = "lnbrMnnm")]
    pub lnbr_mnnm: String,
    #[serde(rename = "lnbrSlno")]
    pub lnbr_slno: String,
}

impl JusoEntry {
    fn into_record(self) -> AddressRecord {
        AddressRecord {
            road_addr: self.road_addr,
            jibun_addr: self.jibun_addr,
            bjd_code: self.adm_cd,
            mountain: self.mt_yn == "1",
            main_no: self.lnbr_mnnm.trim().parse().unwrap_or(0),
            sub_no: self.lnbr_slno.trim().parse().unwrap_or(0),
        }
    }
}
