/// The address → soil-record resolution pipeline.
///
/// Composition: resolve the address, derive the legal-district code, page
/// through the soil service (stopping early on an exact address hit), and
/// fall back to the numerically nearest parcel when no page matched.
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use soil_common::error::CommonError;
use soil_common::juso::{AddressRecord, JusoClient};

use crate::error::AppError;
use crate::fetch::SoilRecordFetcher;
use crate::matcher;
use crate::model::{ParcelKey, Resolution};
use crate::pnu;

/// Free-text address resolution against the address service.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn resolve(&self, keyword: &str) -> Result<AddressRecord, CommonError>;
}

#[async_trait]
impl AddressLookup for JusoClient {
    async fn resolve(&self, keyword: &str) -> Result<AddressRecord, CommonError> {
        JusoClient::resolve(self, keyword).await
    }
}

pub struct SoilInfoPipeline {
    address: Arc<dyn AddressLookup>,
    fetcher: SoilRecordFetcher,
}

impl SoilInfoPipeline {
    pub fn new(address: Arc<dyn AddressLookup>, fetcher: SoilRecordFetcher) -> Self {
        Self { address, fetcher }
    }

    /// Resolve a free-text address to a single soil-examination record.
    ///
    /// Upstream and transport failures propagate as [`AppError`]; an
    /// address that resolves but matches no record yields
    /// [`Resolution::NotFound`].
    pub async fn resolve(&self, address: &str) -> Result<Resolution, AppError> {
        let record = self.address.resolve(address).await?;

        let pnu = pnu::build_pnu(&record);
        // Only the legal-district prefix of the PNU keys the soil query.
        info!(%pnu, bjd_code = %record.bjd_code, "querying soil examinations");

        let outcome = self.fetcher.fetch(&record.bjd_code, Some(&record)).await;

        let selected = match outcome.exact_match {
            Some(record) => Some(record),
            None => {
                let target = ParcelKey {
                    main: record.main_no,
                    sub: record.sub_no,
                };
                matcher::find_closest(target, &outcome.records).cloned()
            }
        };

        let Some(selected) = selected else {
            info!("no soil record matched");
            return Ok(Resolution::NotFound);
        };

        let exact_match = is_exact_match(address, &selected.address);
        let matched_address = selected.address.clone();
        Ok(Resolution::Found {
            record: selected,
            exact_match,
            matched_address,
        })
    }
}

/// Whitespace-insensitive containment between the input query and the
/// selected record's address, in either direction. Intentionally a separate
/// check from the fetch-time raw-equality match; the two can disagree.
fn is_exact_match(query: &str, address: &str) -> bool {
    let query: String = query.chars().filter(|c| !c.is_whitespace()).collect();
    let address: String = address.chars().filter(|c| !c.is_whitespace()).collect();
    query.contains(&address) || address.contains(&query)
}
