use toml::{Table, Value};

/// Merge `overlay` into `base` in place.
///
/// Tables present on both sides are merged key by key; any other value from
/// `overlay` replaces what `base` had. Keys absent from `overlay` are kept, so
/// a sparse layer only overrides what it actually sets.
pub fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(inner)), Value::Table(overlay_inner)) => {
                deep_merge(inner, overlay_inner);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
