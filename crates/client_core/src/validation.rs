//! Pre-request checks. Nothing here touches the network or the view.

use crate::{error::ValidationError, types::ImageFile};

/// Default upload ceiling: 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

const IMAGE_MEDIA_PREFIX: &str = "image/";

pub fn validate_file(file: &ImageFile) -> Result<(), ValidationError> {
    validate_file_with_limit(file, MAX_UPLOAD_BYTES)
}

/// Size is checked before type, so an oversized file is always `TooLarge`.
pub fn validate_file_with_limit(file: &ImageFile, limit: u64) -> Result<(), ValidationError> {
    let size = file.size();
    if size > limit {
        return Err(ValidationError::TooLarge { size, limit });
    }

    // Declared type is trusted; no magic-byte sniffing.
    if !file
        .media_type()
        .to_ascii_lowercase()
        .starts_with(IMAGE_MEDIA_PREFIX)
    {
        return Err(ValidationError::WrongType {
            media_type: file.media_type().to_string(),
        });
    }

    Ok(())
}

/// Parses raw quantity input, defaulting to 1 rather than rejecting.
///
/// Reads the leading integer like a browser `parseInt`: surrounding whitespace
/// and a sign are accepted, trailing characters are ignored. Anything that does
/// not produce a positive `u32` becomes 1.
pub fn validate_quantity(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() || negative {
        return 1;
    }

    digits.parse::<u32>().map(|q| q.max(1)).unwrap_or(1)
}

pub fn clamp_quantity(quantity: i64) -> u32 {
    if quantity < 1 {
        1
    } else {
        u32::try_from(quantity).unwrap_or(u32::MAX)
    }
}
