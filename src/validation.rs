//! Request validation helpers.

use crate::error::{ApiError, Result};

const MAX_FILENAME_LEN: usize = 255;
const MAX_NAME_LEN: usize = 512;

/// Reject filenames that are empty, oversized, or pure path syntax.
pub fn validate_filename(filename: &str) -> Result<()> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(
            "filename query parameter is required".to_string(),
        ));
    }
    if trimmed.len() > MAX_FILENAME_LEN {
        return Err(ApiError::BadRequest("filename is too long".to_string()));
    }
    let base = sanitize_filename(trimmed);
    if base.is_empty() {
        return Err(ApiError::BadRequest("filename is invalid".to_string()));
    }
    Ok(())
}

/// Reduce a client-supplied filename to a safe basename: strip directories,
/// leading dots, and control characters.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim()
        .trim_start_matches('.');
    base.chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect()
}

/// Titles and names must be non-empty and bounded.
pub fn validate_name(field: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!("{} is too long", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_must_be_present() {
        assert!(validate_filename("").is_err());
        assert!(validate_filename("   ").is_err());
        assert!(validate_filename("..").is_err());
        assert!(validate_filename("note.md").is_ok());
    }

    #[test]
    fn khmer_filenames_are_accepted() {
        assert!(validate_filename("កំណត់ត្រា.pdf").is_ok());
        assert_eq!(sanitize_filename("កំណត់ត្រា.pdf"), "កំណត់ត្រា.pdf");
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("a\\b\\evil.exe"), "evil.exe");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
    }

    #[test]
    fn name_bounds() {
        assert!(validate_name("name", "ok").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"x".repeat(600)).is_err());
    }
}
