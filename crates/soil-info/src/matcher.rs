use tracing::info;

use crate::model::{ParcelKey, SoilRecord};

/// Pick the record whose trailing parcel token is numerically closest to
/// `target`. Used only when no exact address match was found while paging.
///
/// Records whose address does not end in a parseable `N` or `N-M` token are
/// ignored. Ties keep the first record seen. Returns `None` when no record
/// yields a key.
pub fn find_closest(target: ParcelKey, records: &[SoilRecord]) -> Option<&SoilRecord> {
    let mut closest: Option<(&SoilRecord, u64)> = None;

    for record in records {
        let Some(key) = ParcelKey::from_address(&record.address) else {
            continue;
        };
        let distance = target.distance(key);
        match closest {
            Some((_, best)) if distance >= best => {}
            _ => closest = Some((record, distance)),
        }
    }

    let selected = closest.map(|(record, _)| record);
    if let Some(record) = selected {
        info!(
            address = %record.address,
            target_main = target.main,
            target_sub = target.sub,
            "nearest parcel selected"
        );
    }
    selected
}
