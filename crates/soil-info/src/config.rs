use soil_common::juso::JusoClientConfig;
use soil_common::soil_api::SoilApiConfig;

use crate::error::AppError;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Application configuration loaded explicitly from environment variables.
///
/// Both upstream API keys are required; the server refuses to start without
/// them rather than failing on the first request.
#[derive(Debug, Clone)]
pub struct Config {
    pub juso: JusoClientConfig,
    pub soil: SoilApiConfig,
    /// HTTP listen address for the front-end.
    pub bind_addr: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `JUSO_API_KEY`: confirmation key for the address lookup service
    /// - `SOIL_API_KEY`: service key for the soil-examination service
    ///
    /// Optional:
    /// - `JUSO_API_URL`, `SOIL_API_URL`: endpoint overrides
    /// - `SOIL_VERIFY_CERTS`: set to "false" to accept untrusted soil-service
    ///   certificates (default "true")
    /// - `BIND_ADDR`: HTTP listen address (default "0.0.0.0:8000")
    pub fn from_env() -> Result<Self, AppError> {
        let juso_key = std::env::var("JUSO_API_KEY").map_err(|_| {
            AppError::Config("JUSO_API_KEY environment variable is required".to_string())
        })?;
        let soil_key = std::env::var("SOIL_API_KEY").map_err(|_| {
            AppError::Config("SOIL_API_KEY environment variable is required".to_string())
        })?;

        let mut juso = JusoClientConfig::new(juso_key);
        if let Ok(url) = std::env::var("JUSO_API_URL") {
            juso.base_url = url;
        }

        let mut soil = SoilApiConfig::new(soil_key);
        if let Ok(url) = std::env::var("SOIL_API_URL") {
            soil.base_url = url;
        }
        if let Ok(value) = std::env::var("SOIL_VERIFY_CERTS") {
            soil.verify_certificates = value.trim() != "false";
        }

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            juso,
            soil,
            bind_addr,
        })
    }
}
