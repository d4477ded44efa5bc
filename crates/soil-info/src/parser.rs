/// Parser for soil-examination XML pages.
///
/// A page body declares `Total_Count` (records matching the query) and
/// `Rcdcnt` (records on this page), plus repeated `item` elements. The two
/// count tags are mandatory: a page missing either is unusable as a paging
/// signal and fails the whole parse. Individual `item` elements are best
/// effort — a malformed one is skipped with a warning.
use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use crate::error::AppError;
use crate::model::SoilRecord;

/// One parsed page of the soil-examination listing.
#[derive(Debug)]
pub struct SoilPage {
    /// Total records matching the query, across all pages.
    pub total_count: u64,
    /// Records the service returned on this page.
    pub record_count: u64,
    pub records: Vec<SoilRecord>,
}

/// Parse one XML page. Fails only on an unreadable document or a missing
/// count tag; malformed `item` elements are dropped, not fatal.
pub fn parse_page(xml: &str) -> Result<SoilPage, AppError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut total_count: Option<u64> = None;
    let mut record_count: Option<u64> = None;
    let mut records = Vec::new();

    // Fields of the `item` currently being read, if any.
    let mut item: Option<HashMap<String, String>> = None;
    let mut current_tag: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "item" {
                    item = Some(HashMap::new());
                    current_tag = None;
                } else {
                    current_tag = Some(name);
                }
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().unwrap_or_default().into_owned();
                store_text(&current_tag, &mut item, &mut total_count, &mut record_count, text);
            }
            // some service deployments wrap field values in CDATA
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                store_text(&current_tag, &mut item, &mut total_count, &mut record_count, text);
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"item" {
                    if let Some(fields) = item.take() {
                        match record_from_fields(&fields) {
                            Some(record) => records.push(record),
                            None => warn!(?fields, "skipping malformed soil item"),
                        }
                    }
                }
                current_tag = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AppError::Parse(e.to_string())),
            _ => {}
        }
    }

    let (Some(total_count), Some(record_count)) = (total_count, record_count) else {
        return Err(AppError::Parse(
            "missing Total_Count or Rcdcnt in soil response".to_string(),
        ));
    };

    Ok(SoilPage {
        total_count,
        record_count,
        records,
    })
}

/// Route element text to the field map of the open `item`, or to one of the
/// page-level count slots.
fn store_text(
    current_tag: &Option<String>,
    item: &mut Option<HashMap<String, String>>,
    total_count: &mut Option<u64>,
    record_count: &mut Option<u64>,
    text: String,
) {
    let Some(tag) = current_tag else {
        return;
    };
    if let Some(fields) = item.as_mut() {
        fields.insert(tag.clone(), text);
    } else if tag == "Total_Count" {
        *total_count = text.trim().parse().ok();
    } else if tag == "Rcdcnt" {
        *record_count = text.trim().parse().ok();
    }
}

/// Build a record from the collected child-element texts of one `item`.
///
/// `BJD_Code` identifies the record and is required; every other text field
/// defaults to empty and every numeric field to 0.0 when absent or
/// malformed. `VLDSIA` stays raw text (its unit varies across surveys).
fn record_from_fields(fields: &HashMap<String, String>) -> Option<SoilRecord> {
    Some(SoilRecord {
        bjd_code: fields.get("BJD_Code")?.clone(),
        year: text_field(fields, "Any_Year"),
        test_date: text_field(fields, "Exam_Day"),
        exam_type: text_field(fields, "Exam_Type"),
        address: text_field(fields, "PNU_Nm"),
        ph: float_field(fields, "ACID"),
        p2o5: float_field(fields, "VLDPHA"),
        sio2: text_field(fields, "VLDSIA"),
        om: float_field(fields, "OM"),
        mg: float_field(fields, "POSIFERT_MG"),
        k: float_field(fields, "POSIFERT_K"),
        ca: float_field(fields, "POSIFERT_CA"),
        ec: float_field(fields, "SELC"),
    })
}

fn text_field(fields: &HashMap<String, String>, name: &str) -> String {
    fields.get(name).cloned().unwrap_or_default()
}

fn float_field(fields: &HashMap<String, String>, name: &str) -> f64 {
    fields
        .get(name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(total: u32, rcdcnt: u32, items: &str) -> String {
        format!(
            "<response>\
                <Total_Count>{total}</Total_Count>\
                <Rcdcnt>{rcdcnt}</Rcdcnt>\
                <items>{items}</items>\
            </response>"
        )
    }

    #[test]
    fn minimal_item_defaults_every_missing_field() {
        let xml = page(
            1,
            1,
            "<item><BJD_Code>1111010100</BJD_Code><ACID>6.5</ACID></item>",
        );
        let parsed = parse_page(&xml).expect("page parses");
        assert_eq!(parsed.total_count, 1);
        assert_eq!(parsed.record_count, 1);
        assert_eq!(parsed.records.len(), 1);

        let record = &parsed.records[0];
        assert_eq!(record.bjd_code, "1111010100");
        assert_eq!(record.ph, 6.5);
        assert_eq!(record.p2o5, 0.0);
        assert_eq!(record.om, 0.0);
        assert_eq!(record.mg, 0.0);
        assert_eq!(record.k, 0.0);
        assert_eq!(record.ca, 0.0);
        assert_eq!(record.ec, 0.0);
        assert_eq!(record.sio2, "");
        assert_eq!(record.address, "");
    }

    #[test]
    fn full_item_parses_every_field() {
        let xml = page(
            1,
            1,
            "<item>\
                <BJD_Code>4682033021</BJD_Code>\
                <Any_Year>2023</Any_Year>\
                <Exam_Day>2023-04-12</Exam_Day>\
                <Exam_Type>논</Exam_Type>\
                <PNU_Nm>전남 해남군 산이면 덕송리 292-17</PNU_Nm>\
                <ACID>5.8</ACID>\
                <VLDPHA>312.0</VLDPHA>\
                <VLDSIA>157</VLDSIA>\
                <OM>23.0</OM>\
                <POSIFERT_MG>1.482</POSIFERT_MG>\
                <POSIFERT_K>0.319</POSIFERT_K>\
                <POSIFERT_CA>4.8</POSIFERT_CA>\
                <SELC>0.424</SELC>\
            </item>",
        );
        let parsed = parse_page(&xml).expect("page parses");
        let record = &parsed.records[0];
        assert_eq!(record.year, "2023");
        assert_eq!(record.test_date, "2023-04-12");
        assert_eq!(record.exam_type, "논");
        assert_eq!(record.address, "전남 해남군 산이면 덕송리 292-17");
        assert_eq!(record.ph, 5.8);
        assert_eq!(record.p2o5, 312.0);
        assert_eq!(record.sio2, "157");
        assert_eq!(record.om, 23.0);
        assert_eq!(record.mg, 1.482);
        assert_eq!(record.k, 0.319);
        assert_eq!(record.ca, 4.8);
        assert_eq!(record.ec, 0.424);
    }

    #[test]
    fn missing_count_tags_fail_the_page() {
        let err = parse_page("<response><items></items></response>").expect_err("must fail");
        assert!(err.to_string().contains("Total_Count"));

        let only_total =
            "<response><Total_Count>3</Total_Count><items></items></response>";
        assert!(parse_page(only_total).is_err());
    }

    #[test]
    fn unreadable_document_fails_the_page() {
        assert!(parse_page("<response><Total_Count>1</Total_Count").is_err());
    }

    #[test]
    fn malformed_item_is_skipped_not_fatal() {
        let xml = page(
            2,
            2,
            "<item><Any_Year>2023</Any_Year></item>\
             <item><BJD_Code>1111010100</BJD_Code><ACID>7.1</ACID></item>",
        );
        let parsed = parse_page(&xml).expect("page parses");
        assert_eq!(parsed.record_count, 2);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].ph, 7.1);
    }

    #[test]
    fn cdata_wrapped_values_parse_like_text() {
        let xml = page(
            1,
            1,
            "<item>\
                <BJD_Code><![CDATA[1111010100]]></BJD_Code>\
                <PNU_Nm><![CDATA[서울 종로구 청운동 1-1]]></PNU_Nm>\
                <ACID><![CDATA[6.9]]></ACID>\
            </item>",
        );
        let parsed = parse_page(&xml).expect("page parses");
        assert_eq!(parsed.records[0].address, "서울 종로구 청운동 1-1");
        assert_eq!(parsed.records[0].ph, 6.9);
    }

    #[test]
    fn malformed_numeric_values_default_to_zero() {
        let xml = page(
            1,
            1,
            "<item><BJD_Code>1111010100</BJD_Code><ACID>n/a</ACID><OM></OM></item>",
        );
        let parsed = parse_page(&xml).expect("page parses");
        assert_eq!(parsed.records[0].ph, 0.0);
        assert_eq!(parsed.records[0].om, 0.0);
    }
}
