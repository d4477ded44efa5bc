use serde::Serialize;

/// One soil-examination entry, parsed from an `item` element of the soil
/// service's XML. Serialized field names follow the exposed API contract.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SoilRecord {
    /// 10-digit legal-district code of the examined parcel.
    #[serde(rename = "BJD_Code")]
    pub bjd_code: String,
    /// Survey year (`Any_Year`).
    pub year: String,
    /// Examination date (`Exam_Day`).
    pub test_date: String,
    /// Examination type (`Exam_Type`).
    pub exam_type: String,
    /// Free-text parcel address (`PNU_Nm`).
    pub address: String,
    /// Acidity (`ACID`).
    #[serde(rename = "pH")]
    pub ph: f64,
    /// Available phosphate (`VLDPHA`), mg/kg.
    #[serde(rename = "P2O5")]
    pub p2o5: f64,
    /// Available silicate (`VLDSIA`). Kept as raw text; the unit is
    /// ambiguous across survey years.
    #[serde(rename = "SiO2")]
    pub sio2: String,
    /// Organic matter (`OM`), g/kg.
    #[serde(rename = "OM")]
    pub om: f64,
    /// Exchangeable magnesium (`POSIFERT_MG`), cmol/kg.
    #[serde(rename = "Mg")]
    pub mg: f64,
    /// Exchangeable potassium (`POSIFERT_K`), cmol/kg.
    #[serde(rename = "K")]
    pub k: f64,
    /// Exchangeable calcium (`POSIFERT_CA`), cmol/kg.
    #[serde(rename = "Ca")]
    pub ca: f64,
    /// Electrical conductivity (`SELC`), dS/m.
    #[serde(rename = "EC")]
    pub ec: f64,
}

/// Parcel number pair (본번/부번) used only for numeric proximity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParcelKey {
    pub main: u32,
    pub sub: u32,
}

impl ParcelKey {
    /// Parse a key from the trailing whitespace-delimited token of an
    /// address: `"… 123-4"` → (123, 4), `"… 123"` → (123, 0). Returns
    /// `None` when the token is not `int` or `int-int`.
    pub fn from_address(address: &str) -> Option<Self> {
        let token = address.split_whitespace().last()?;
        match token.split_once('-') {
            Some((main, sub)) => Some(Self {
                main: main.parse().ok()?,
                sub: sub.parse().ok()?,
            }),
            None => Some(Self {
                main: token.parse().ok()?,
                sub: 0,
            }),
        }
    }

    /// Weighted distance between two keys. Main-number differences dominate
    /// sub-number differences by two orders of magnitude: parcels sharing a
    /// main number compare on the sub number alone.
    pub fn distance(self, other: ParcelKey) -> u64 {
        u64::from(self.main.abs_diff(other.main)) * 100 + u64::from(self.sub.abs_diff(other.sub))
    }
}

/// Outcome of a full address → soil-record resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// No soil record could be matched for the resolved address.
    NotFound,
    /// A single authoritative record was selected.
    Found {
        record: SoilRecord,
        /// Whitespace-insensitive containment between the input query and
        /// the selected record's address. Computed independently of the
        /// fetch-time equality match.
        exact_match: bool,
        matched_address: String,
    },
}
