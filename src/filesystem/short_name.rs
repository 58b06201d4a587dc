//! Conversions between user-facing names and the 11-byte 8.3 name field.

/// Length of the raw name field of a directory entry.
pub const SHORT_NAME_LEN: usize = 11;

const BASE_LEN: usize = 8;

/// Builds the 11-byte key a directory entry must hold to match `name`.
///
/// `.` and `..` keep their literal form. Other names are split on their last `.`, uppercased,
/// and the base and extension are truncated to 8 and 3 characters and padded with spaces.
///
/// ```
/// use fat_navigator::filesystem::short_name::to_8_3_name;
///
/// assert_eq!(&to_8_3_name("report.txt"), b"REPORT  TXT");
/// assert_eq!(&to_8_3_name(".."), b"..         ");
/// ```
pub fn to_8_3_name(name: &str) -> [u8; SHORT_NAME_LEN] {
    let (base, ext) = match name {
        "." | ".." => (name, ""),
        _ => name.rsplit_once('.').unwrap_or((name, "")),
    };

    let mut key = [b' '; SHORT_NAME_LEN];
    for (dst, src) in key[..BASE_LEN].iter_mut().zip(base.bytes()) {
        *dst = src.to_ascii_uppercase();
    }
    for (dst, src) in key[BASE_LEN..].iter_mut().zip(ext.bytes()) {
        *dst = src.to_ascii_uppercase();
    }
    key
}

/// Renders a raw name field as `NAME.EXT`, or `NAME` when the extension is blank.
pub fn from_8_3_name(raw: &[u8; SHORT_NAME_LEN]) -> String {
    let name = String::from_utf8_lossy(&raw[..BASE_LEN]);
    let ext = String::from_utf8_lossy(&raw[BASE_LEN..]);

    match ext.trim_end() {
        "" => name.trim_end().to_string(),
        ext => format!("{}.{}", name.trim_end(), ext),
    }
}
