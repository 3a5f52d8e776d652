//! Naming rules for staged entries and produced archives
//!
//! Every path segment written locally or to a destination goes through
//! [`sanitize_segment`]. Archive names have the form `<baseName>.<ext>`.

use chrono::{DateTime, Utc};

use super::input::InputKind;

/// Maximum length (in characters) of a sanitized path segment
pub const MAX_SEGMENT_LEN: usize = 120;

/// Characters that are replaced by `_` in every path segment
pub const FORBIDDEN_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Fallback name for a folder input without a display name
pub const FALLBACK_FOLDER_NAME: &str = "folder";

/// Fallback name for a nested directory without a display name
pub const FALLBACK_DIR_NAME: &str = "dir";

/// Fallback name for a file without a display name
pub const FALLBACK_FILE_NAME: &str = "file";

/// Replaces forbidden characters with `_` and truncates to [`MAX_SEGMENT_LEN`]
///
/// Idempotent: sanitizing an already sanitized name returns it unchanged.
pub fn sanitize_segment(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SEGMENT_LEN)
        .collect()
}

/// Sanitizes `name`, or `fallback` when the name is missing or empty
pub fn sanitize_or(name: Option<&str>, fallback: &str) -> String {
    match name {
        Some(n) if !n.is_empty() => sanitize_segment(n),
        _ => sanitize_segment(fallback),
    }
}

/// Strips the substring from the last `.` onward; keeps names without a `.`
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// Base name contributed by the first selected input
///
/// Folders keep their name verbatim, files lose their trailing extension.
/// Returns `None` when nothing usable remains (e.g. `.bashrc`).
pub fn base_name_for(name: &str, kind: InputKind) -> Option<String> {
    let base = match kind {
        InputKind::FolderTree => name,
        InputKind::File => strip_extension(name),
    };
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

/// Timestamp-based base name used when the selection yields none
pub fn fallback_base_name(now: DateTime<Utc>) -> String {
    format!("archive_{}", now.timestamp_millis())
}

/// `<sanitized base>.<extension>`
pub fn archive_file_name(base: &str, extension: &str) -> String {
    format!("{}.{}", sanitize_segment(base), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_forbidden_chars() {
        assert_eq!(sanitize_segment(r#"a\b/c:d*e?f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_segment("plain name.txt"), "plain name.txt");
    }

    #[test]
    fn sanitize_truncates_to_limit() {
        let long = "x".repeat(300);
        assert_eq!(sanitize_segment(&long).chars().count(), MAX_SEGMENT_LEN);

        let multibyte = "é".repeat(200);
        assert_eq!(sanitize_segment(&multibyte).chars().count(), MAX_SEGMENT_LEN);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let long = "ab/".repeat(80);
        let samples = [
            "report.v2.txt",
            "what?*is<this>|",
            "C:\\Users\\me",
            "",
            long.as_str(),
        ];
        for sample in samples {
            let once = sanitize_segment(sample);
            assert_eq!(sanitize_segment(&once), once);
            assert!(!once.chars().any(|c| FORBIDDEN_CHARS.contains(&c)));
            assert!(once.chars().count() <= MAX_SEGMENT_LEN);
        }
    }

    #[test]
    fn sanitize_or_uses_fallback() {
        assert_eq!(sanitize_or(None, FALLBACK_FILE_NAME), "file");
        assert_eq!(sanitize_or(Some(""), FALLBACK_DIR_NAME), "dir");
        assert_eq!(sanitize_or(Some("a:b"), FALLBACK_FILE_NAME), "a_b");
    }

    #[test]
    fn base_name_strips_last_extension_of_files() {
        assert_eq!(
            base_name_for("report.v2.txt", InputKind::File).as_deref(),
            Some("report.v2")
        );
        assert_eq!(base_name_for("README", InputKind::File).as_deref(), Some("README"));
        assert_eq!(base_name_for(".bashrc", InputKind::File), None);
    }

    #[test]
    fn base_name_keeps_folder_names_verbatim() {
        assert_eq!(
            base_name_for("Photos", InputKind::FolderTree).as_deref(),
            Some("Photos")
        );
        assert_eq!(
            base_name_for("my.folder", InputKind::FolderTree).as_deref(),
            Some("my.folder")
        );
    }

    #[test]
    fn fallback_base_name_is_timestamped() {
        let name = fallback_base_name(Utc::now());
        let digits = name.strip_prefix("archive_").expect("prefix");
        assert!(!digits.is_empty());
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn archive_file_name_appends_extension() {
        assert_eq!(archive_file_name("a", "kitty"), "a.kitty");
        assert_eq!(archive_file_name("x:y", "kitty"), "x_y.kitty");
    }
}
