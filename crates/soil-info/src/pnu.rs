use soil_common::juso::AddressRecord;
use tracing::debug;

/// Assemble the PNU (필지 고유번호) for a resolved address: the 10-digit
/// legal-district code, one land-type digit (`"2"` for mountain land,
/// `"1"` otherwise), then the main and sub parcel numbers zero-padded to
/// four digits each.
///
/// Only the 10-digit legal-district prefix keys the soil-examination query;
/// the full identifier is still assembled and logged.
pub fn build_pnu(record: &AddressRecord) -> String {
    let land_type = if record.mountain { "2" } else { "1" };
    let pnu = format!(
        "{}{}{:04}{:04}",
        record.bjd_code, land_type, record.main_no, record.sub_no
    );
    debug!(
        bjd_code = %record.bjd_code,
        land_type,
        main = record.main_no,
        sub = record.sub_no,
        %pnu,
        "assembled PNU"
    );
    pnu
}
