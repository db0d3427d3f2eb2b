use uuid::Uuid;

/// Root arc for UUID-derived UIDs (PS3.5 B.2).
pub const UUID_UID_ROOT: &str = "2.25";

/// Generate a globally unique DICOM UID from a random UUID.
///
/// The UUID's 128 bits are written as a decimal integer under the `2.25`
/// root, which keeps the result within 64 characters with no leading zeros.
pub fn generate_uid() -> String {
    format!("{}.{}", UUID_UID_ROOT, Uuid::new_v4().as_u128())
}

/// Check UID syntax: 1..=64 chars, dot separated numeric components, no
/// empty components and no leading zero in multi-digit components.
pub fn is_valid_uid(uid: &str) -> bool {
    if uid.is_empty() || uid.len() > 64 {
        return false;
    }
    uid.split('.').all(|component| {
        !component.is_empty()
            && component.bytes().all(|b| b.is_ascii_digit())
            && (component.len() == 1 || !component.starts_with('0'))
    })
}
