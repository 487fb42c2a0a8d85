//! Output file naming.
//!
//! Every produced payload gets a deterministic name derived from a base name
//! and, when batching, a 1-based position:
//!
//! | Output | Single asset | Batch of N |
//! |---|---|---|
//! | bitmap / icon | `image.png` | `image-1.png` … `image-N.png` |
//! | screenshot | `iOS_Screen-01.jpg` | `iOS_Screen-01.jpg` … (always padded) |
//! | bundle folder | (none, flat) | `img-1/` … `img-N/` |
//! | document | `images.pdf` | `images.pdf` |
//!
//! The base name comes from the user and is sanitized before use so it can
//! never escape the output directory or an archive folder.

const MAX_BASE_LEN: usize = 80;

/// Clean a user-supplied base name for use as a file name.
///
/// - Keeps ASCII alphanumerics, `-`, `_`, `.` and spaces
/// - Replaces everything else (path separators, control characters) with dashes
/// - Collapses consecutive dashes into one
/// - Strips leading/trailing dashes, dots and spaces
/// - Truncates to `MAX_BASE_LEN` characters
pub fn sanitize_base_name(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    let mut prev_dash = false;
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
            c
        } else {
            '-'
        };
        if c == '-' {
            if !prev_dash {
                cleaned.push('-');
            }
            prev_dash = true;
        } else {
            cleaned.push(c);
            prev_dash = false;
        }
    }

    let trimmed = cleaned.trim_matches(|c| matches!(c, '-' | '.' | ' '));
    trimmed.chars().take(MAX_BASE_LEN).collect()
}

/// Sanitized `name`, or `default` when nothing usable is left.
pub fn base_name_or(name: &str, default: &str) -> String {
    let cleaned = sanitize_base_name(name);
    if cleaned.is_empty() {
        default.to_string()
    } else {
        cleaned
    }
}

/// `{base}.{ext}` for a single output, `{base}-{index+1}.{ext}` in a batch.
///
/// `index` is 0-based.
pub fn indexed_name(base: &str, index: usize, total: usize, ext: &str) -> String {
    if total > 1 {
        format!("{base}-{}.{ext}", index + 1)
    } else {
        format!("{base}.{ext}")
    }
}

/// Two-digit, 1-based name: `iOS_Screen-01.jpg`.
pub fn padded_name(prefix: &str, index: usize, ext: &str) -> String {
    format!("{prefix}-{:02}.{ext}", index + 1)
}

/// Per-asset archive folder: `img-1`.
pub fn folder_name(prefix: &str, index: usize) -> String {
    format!("{prefix}-{}", index + 1)
}
