//! Human-readable byte sizes ("512MB", "2GB").

use thiserror::Error;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

const SUFFIXES: [(&str, u64); 6] = [
    ("GB", GB),
    ("G", GB),
    ("MB", MB),
    ("M", MB),
    ("KB", KB),
    ("K", KB),
];

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{0}' - expected format like '2GB', '500MB', or '1024KB'")]
pub struct SizeParseError(String);

/// Parses a size string into bytes.
///
/// Accepts a bare integer (bytes) or an integer followed by `K`/`KB`,
/// `M`/`MB` or `G`/`GB` (binary multiples). Case and surrounding whitespace
/// are ignored.
///
/// ```
/// use maptiles::config::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("2 gb").unwrap(), 2 * 1024 * 1024 * 1024);
/// assert!(parse_size("1.5GB").is_err());
/// ```
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (number, multiplier) = SUFFIXES
        .iter()
        .find_map(|(suffix, mult)| upper.strip_suffix(suffix).map(|n| (n.trim(), *mult)))
        .unwrap_or((upper.as_str(), 1));

    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SizeParseError(trimmed.to_string()));
    }

    number
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| SizeParseError(trimmed.to_string()))
}

/// Formats a byte count using the largest unit that divides it exactly.
///
/// ```
/// use maptiles::config::format_size;
///
/// assert_eq!(format_size(512 * 1024 * 1024), "512MB");
/// assert_eq!(format_size(1000), "1000");
/// ```
pub fn format_size(bytes: u64) -> String {
    for (unit, size) in [("GB", GB), ("MB", MB), ("KB", KB)] {
        if bytes >= size && bytes % size == 0 {
            return format!("{}{}", bytes / size, unit);
        }
    }
    bytes.to_string()
}
