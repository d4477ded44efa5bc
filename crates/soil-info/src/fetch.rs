/// Paginated retrieval of soil-examination records for one legal district.
///
/// The loop is a small state machine: it stays in `Fetching` while pages
/// remain, and terminates as `MatchedExact` (a record's address equaled the
/// target's road or jibun address — raw string equality), `Exhausted` (the
/// service ran out of records), or `Failed` (transport or page-level parse
/// failure). Whatever was accumulated before a failure is kept; nothing is
/// retried.
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use soil_common::error::CommonError;
use soil_common::juso::AddressRecord;
use soil_common::soil_api::SoilApiClient;

use crate::model::SoilRecord;
use crate::parser;

/// A source of raw soil-examination XML pages.
#[async_trait]
pub trait SoilPageSource: Send + Sync {
    fn page_size(&self) -> u32;

    async fn fetch_page(&self, bjd_code: &str, page_no: u32) -> Result<String, CommonError>;
}

#[async_trait]
impl SoilPageSource for SoilApiClient {
    fn page_size(&self) -> u32 {
        SoilApiClient::page_size(self)
    }

    async fn fetch_page(&self, bjd_code: &str, page_no: u32) -> Result<String, CommonError> {
        SoilApiClient::fetch_page(self, bjd_code, page_no).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchState {
    Fetching,
    MatchedExact,
    Exhausted,
    Failed,
}

/// Everything one paging run produced.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// All records parsed, in page order (append-only).
    pub records: Vec<SoilRecord>,
    /// The first record whose address equaled the target's road or jibun
    /// address, if paging stopped on an exact match.
    pub exact_match: Option<SoilRecord>,
}

pub struct SoilRecordFetcher {
    source: Arc<dyn SoilPageSource>,
}

impl SoilRecordFetcher {
    pub fn new(source: Arc<dyn SoilPageSource>) -> Self {
        Self { source }
    }

    /// Page through the soil service for `bjd_code`, stopping early on the
    /// first exact address match against `target`.
    pub async fn fetch(&self, bjd_code: &str, target: Option<&AddressRecord>) -> FetchOutcome {
        let page_size = self.source.page_size();
        let mut outcome = FetchOutcome::default();
        let mut page_no: u32 = 1;
        let mut state = FetchState::Fetching;

        while state == FetchState::Fetching {
            let body = match self.source.fetch_page(bjd_code, page_no).await {
                Ok(body) => body,
                Err(e) => {
                    error!(error = %e, page_no, "soil page fetch failed");
                    state = FetchState::Failed;
                    continue;
                }
            };

            let page = match parser::parse_page(&body) {
                Ok(page) => page,
                Err(e) => {
                    error!(error = %e, page_no, "soil page unparseable");
                    state = FetchState::Failed;
                    continue;
                }
            };

            if page.record_count == 0 {
                state = FetchState::Exhausted;
                continue;
            }

            let first_new = outcome.records.len();
            outcome.records.extend(page.records);

            if let Some(target) = target {
                let hit = outcome.records[first_new..]
                    .iter()
                    .find(|r| r.address == target.road_addr || r.address == target.jibun_addr);
                if let Some(hit) = hit {
                    info!(address = %hit.address, "exact address match");
                    outcome.exact_match = Some(hit.clone());
                    state = FetchState::MatchedExact;
                    continue;
                }
            }

            if u64::from(page_no) * u64::from(page_size) >= page.total_count {
                state = FetchState::Exhausted;
            } else {
                page_no += 1;
            }
        }

        debug!(
            ?state,
            records = outcome.records.len(),
            pages = page_no,
            "soil fetch finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn item(address: &str) -> String {
        format!(
            "<item><BJD_Code>4682033021</BJD_Code><PNU_Nm>{address}</PNU_Nm><ACID>6.0</ACID></item>"
        )
    }

    fn page_xml(total: u32, addresses: &[&str]) -> String {
        let items: String = addresses.iter().map(|a| item(a)).collect();
        format!(
            "<response>\
                <Total_Count>{total}</Total_Count>\
                <Rcdcnt>{}</Rcdcnt>\
                <items>{items}</items>\
            </response>",
            addresses.len()
        )
    }

    /// Serves canned page bodies and records which pages were requested.
    struct StubSource {
        pages: Vec<String>,
        requested: Mutex<Vec<u32>>,
    }

    impl StubSource {
        fn new(pages: Vec<String>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SoilPageSource for StubSource {
        fn page_size(&self) -> u32 {
            10
        }

        async fn fetch_page(&self, _bjd_code: &str, page_no: u32) -> Result<String, CommonError> {
            self.requested.lock().unwrap().push(page_no);
            self.pages
                .get(page_no as usize - 1)
                .cloned()
                .ok_or_else(|| CommonError::Upstream("connection refused".to_string()))
        }
    }

    fn target() -> AddressRecord {
        AddressRecord {
            road_addr: "전남 해남군 산이면 새상골길 292-17".to_string(),
            jibun_addr: "전남 해남군 산이면 덕송리 292-17".to_string(),
            bjd_code: "4682033021".to_string(),
            mountain: false,
            main_no: 292,
            sub_no: 17,
        }
    }

    #[tokio::test]
    async fn exact_match_on_first_page_short_circuits() {
        let addresses: Vec<String> = (0..9)
            .map(|i| format!("전남 해남군 산이면 덕송리 {}", 100 + i))
            .chain(std::iter::once(
                "전남 해남군 산이면 덕송리 292-17".to_string(),
            ))
            .collect();
        let refs: Vec<&str> = addresses.iter().map(String::as_str).collect();
        // total_count implies a second page; it must never be requested
        let source = Arc::new(StubSource::new(vec![page_xml(25, &refs)]));
        let fetcher = SoilRecordFetcher::new(Arc::clone(&source) as Arc<dyn SoilPageSource>);

        let outcome = fetcher.fetch("4682033021", Some(&target())).await;

        assert_eq!(source.requested(), vec![1]);
        let exact = outcome.exact_match.expect("exact match");
        assert_eq!(exact.address, "전남 해남군 산이면 덕송리 292-17");
        assert_eq!(outcome.records.len(), 10);
    }

    #[tokio::test]
    async fn paginates_until_total_count_is_covered() {
        let page1: Vec<String> = (0..10)
            .map(|i| format!("전남 해남군 산이면 덕송리 {}", 100 + i))
            .collect();
        let page2: Vec<String> = (0..5)
            .map(|i| format!("전남 해남군 산이면 덕송리 {}", 200 + i))
            .collect();
        let refs1: Vec<&str> = page1.iter().map(String::as_str).collect();
        let refs2: Vec<&str> = page2.iter().map(String::as_str).collect();
        let source = Arc::new(StubSource::new(vec![
            page_xml(15, &refs1),
            page_xml(15, &refs2),
        ]));
        let fetcher = SoilRecordFetcher::new(Arc::clone(&source) as Arc<dyn SoilPageSource>);

        let outcome = fetcher.fetch("4682033021", Some(&target())).await;

        assert_eq!(source.requested(), vec![1, 2]);
        assert_eq!(outcome.records.len(), 15);
        assert!(outcome.exact_match.is_none());
    }

    #[tokio::test]
    async fn zero_record_page_ends_pagination() {
        let source = Arc::new(StubSource::new(vec![page_xml(0, &[])]));
        let fetcher = SoilRecordFetcher::new(Arc::clone(&source) as Arc<dyn SoilPageSource>);

        let outcome = fetcher.fetch("4682033021", None).await;

        assert_eq!(source.requested(), vec![1]);
        assert!(outcome.records.is_empty());
        assert!(outcome.exact_match.is_none());
    }

    #[tokio::test]
    async fn unparseable_second_page_keeps_first_page_records() {
        let page1: Vec<String> = (0..10)
            .map(|i| format!("전남 해남군 산이면 덕송리 {}", 100 + i))
            .collect();
        let refs1: Vec<&str> = page1.iter().map(String::as_str).collect();
        let source = Arc::new(StubSource::new(vec![
            page_xml(25, &refs1),
            "<response><items></items></response>".to_string(),
        ]));
        let fetcher = SoilRecordFetcher::new(Arc::clone(&source) as Arc<dyn SoilPageSource>);

        let outcome = fetcher.fetch("4682033021", Some(&target())).await;

        assert_eq!(source.requested(), vec![1, 2]);
        assert_eq!(outcome.records.len(), 10);
    }

    #[tokio::test]
    async fn transport_failure_aborts_with_partial_records() {
        let page1: Vec<String> = (0..10)
            .map(|i| format!("전남 해남군 산이면 덕송리 {}", 100 + i))
            .collect();
        let refs1: Vec<&str> = page1.iter().map(String::as_str).collect();
        // total_count says 25 but only page 1 is servable
        let source = Arc::new(StubSource::new(vec![page_xml(25, &refs1)]));
        let fetcher = SoilRecordFetcher::new(Arc::clone(&source) as Arc<dyn SoilPageSource>);

        let outcome = fetcher.fetch("4682033021", None).await;

        assert_eq!(source.requested(), vec![1, 2]);
        assert_eq!(outcome.records.len(), 10);
    }
}
