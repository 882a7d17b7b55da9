//! Binary detector and UTF-8 prefix validator ("text gate").
//!
//! Both classifiers operate on a bounded prefix of a file's bytes so that
//! ingestion never has to read an entire (possibly huge, possibly binary)
//! file just to decide whether it belongs in the index.

/// Size of the prefix both classifiers share.
pub const PREFIX_LEN: usize = 512;

const SUSPICIOUS_MIN_SCAN: usize = 32;
const SUSPICIOUS_RATIO_PCT: usize = 10;
const PDF_MAGIC: &[u8] = b"%PDF-";
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Classifies a byte prefix as binary or not.
///
/// Exposed standalone for callers indexing loose files outside the
/// archive ingestion pipeline, which uses [`is_text_prefix`] instead.
#[must_use]
pub fn is_binary(prefix: &[u8]) -> bool {
    if prefix.is_empty() {
        return false;
    }
    if prefix.len() >= UTF8_BOM.len() && prefix[..UTF8_BOM.len()] == UTF8_BOM {
        return false;
    }
    if prefix.len() >= PDF_MAGIC.len() && &prefix[..PDF_MAGIC.len()] == PDF_MAGIC {
        return true;
    }

    let mut suspicious = 0usize;
    for (i, &b) in prefix.iter().enumerate() {
        if b == 0x00 {
            return true;
        }
        if !is_plain_byte(b) {
            suspicious += 1;
        }
        let scanned = i + 1;
        if scanned >= SUSPICIOUS_MIN_SCAN && suspicious_ratio_exceeded(suspicious, scanned) {
            return true;
        }
    }
    suspicious_ratio_exceeded(suspicious, prefix.len())
}

fn is_plain_byte(b: u8) -> bool {
    (0x07..0x0E).contains(&b) || (0x20..0x7F).contains(&b)
}

fn suspicious_ratio_exceeded(suspicious: usize, scanned: usize) -> bool {
    scanned > 0 && suspicious * 100 / scanned > SUSPICIOUS_RATIO_PCT
}

/// Validates that a byte prefix decodes as UTF-8, tolerating a single
/// trailing partial rune when the prefix is a truncated read of a larger
/// file (`complete = false`).
///
/// When `complete` is `true` (the prefix *is* the entire file, i.e. the
/// file's size did not exceed [`PREFIX_LEN`]), full UTF-8 validity is
/// required — there is no "tail" to excuse.
#[must_use]
pub fn is_text_prefix(prefix: &[u8], complete: bool) -> bool {
    match std::str::from_utf8(prefix) {
        Ok(_) => true,
        Err(e) => {
            if complete {
                return false;
            }
            // error_len() == None means the tail is an incomplete (truncated)
            // sequence rather than a genuinely invalid one.
            if e.error_len().is_some() {
                return false;
            }
            let valid_up_to = e.valid_up_to();
            let remaining = prefix.len() - valid_up_to;
            if remaining == 0 || remaining > 4 {
                return false;
            }
            is_utf8_leading_byte(prefix[valid_up_to])
        }
    }
}

fn is_utf8_leading_byte(b: u8) -> bool {
    matches!(b, 0xC2..=0xDF | 0xE0..=0xEF | 0xF0..=0xF4)
}
