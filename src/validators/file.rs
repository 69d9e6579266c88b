use crate::form::FileInfo;

use super::{Validation, fail};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// `max_size_mb` must be a finite, non-negative megabyte count. NaN would
/// accept every file and a negative bound would reject every file.
pub fn validate_file_size(file: &FileInfo, max_size_mb: f64) -> Validation {
    debug_assert!(
        max_size_mb.is_finite() && max_size_mb >= 0.0,
        "max_size_mb must be finite and non-negative, got {max_size_mb}"
    );
    if file.size_bytes as f64 > max_size_mb * BYTES_PER_MB {
        return fail(format!("File size must be less than {max_size_mb}MB"));
    }
    Ok(())
}

/// Entries containing `/` match the declared MIME type (`image/*` matches the
/// whole family); other entries match the lower-cased file name suffix.
pub fn validate_file_type<S>(file: &FileInfo, allowed: &[S]) -> Validation
where
    S: AsRef<str>,
{
    let name = file.name.to_lowercase();
    let accepted = allowed.iter().any(|entry| {
        let entry = entry.as_ref().trim();
        if entry.contains('/') {
            mime_matches(entry, &file.mime_type)
        } else {
            let extension = entry.trim_start_matches('.').to_lowercase();
            !extension.is_empty() && name.ends_with(&format!(".{extension}"))
        }
    });
    if !accepted {
        let list = allowed
            .iter()
            .map(|entry| entry.as_ref())
            .collect::<Vec<&str>>()
            .join(", ");
        return fail(format!("File type not allowed. Allowed types: {list}"));
    }
    Ok(())
}

fn mime_matches(pattern: &str, mime_type: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(family) => mime_type
            .split_once('/')
            .is_some_and(|(kind, _)| kind.eq_ignore_ascii_case(family)),
        None => pattern.eq_ignore_ascii_case(mime_type.trim()),
    }
}
