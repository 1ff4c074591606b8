use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;

use crate::shared::constants::STORAGE_SUFFIX_LEN;

lazy_static! {
    /// Any character that may not appear in a stored filename
    /// - Allowed: ASCII letters, digits, '.', '_', '-'
    /// - Everything else (spaces, slashes, non-ASCII, shell metacharacters) is replaced
    pub static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`
pub fn sanitize_filename_component(component: &str) -> String {
    UNSAFE_FILENAME_CHARS
        .replace_all(component, "_")
        .into_owned()
}

/// Build a collision-resistant storage filename from a client-supplied one.
///
/// `"my photo.jpg"` becomes `"my_photo_<10 random alphanumerics>.jpg"`. Directory
/// components are dropped, the stem and extension are sanitized separately.
pub fn derive_storage_filename(original_filename: &str) -> String {
    let base_name = original_filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(original_filename);

    let (stem, extension) = match base_name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => (stem, Some(ext)),
        Some((stem, _)) => (stem, None),
        None => (base_name, None),
    };

    let suffix = random_suffix(STORAGE_SUFFIX_LEN);
    let stem = sanitize_filename_component(stem);

    match extension {
        Some(ext) => format!(
            "{}_{}.{}",
            stem,
            suffix,
            sanitize_filename_component(ext)
        ),
        None => format!("{}_{}", stem, suffix),
    }
}

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Sniff the image format from magic bytes
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn is_safe(name: &str) -> bool {
        name.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    }

    #[test]
    fn test_sanitize_replaces_each_unsafe_char() {
        assert_eq!(sanitize_filename_component("my photo (1)"), "my_photo__1_");
        assert_eq!(sanitize_filename_component("café"), "caf_");
        assert_eq!(sanitize_filename_component("a.b_c-d"), "a.b_c-d");
    }

    #[test]
    fn test_derive_keeps_stem_and_extension() {
        let name = derive_storage_filename("photo.jpg");

        assert!(name.starts_with("photo_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), "photo_".len() + STORAGE_SUFFIX_LEN + ".jpg".len());
    }

    #[test]
    fn test_derive_strips_directories_and_unsafe_chars() {
        let name = derive_storage_filename("../../etc/pass wd;rm.png");

        assert!(name.starts_with("pass_wd_rm_"));
        assert!(name.ends_with(".png"));
        assert!(!name.contains('/'));
        assert!(is_safe(&name));

        let windows = derive_storage_filename(r"C:\Users\me\shot.webp");
        assert!(windows.starts_with("shot_"));
    }

    #[test]
    fn test_derive_only_last_dot_splits_extension() {
        let name = derive_storage_filename("archive.final.JPG");

        assert!(name.starts_with("archive.final_"));
        assert!(name.ends_with(".JPG"));
    }

    #[test]
    fn test_derive_without_extension() {
        let name = derive_storage_filename("README");

        assert!(name.starts_with("README_"));
        assert_eq!(name.len(), "README_".len() + STORAGE_SUFFIX_LEN);
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_derive_never_collides_for_same_display_name() {
        let names: HashSet<String> = (0..2000)
            .map(|_| derive_storage_filename("same name.png"))
            .collect();

        assert_eq!(names.len(), 2000);
        assert!(names.iter().all(|n| is_safe(n)));
    }

    #[test]
    fn test_detect_image_mime() {
        assert_eq!(detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(
            detect_image_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            Some("image/png")
        );
        assert_eq!(detect_image_mime(b"GIF89a"), Some("image/gif"));
        assert_eq!(
            detect_image_mime(&[
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50
            ]),
            Some("image/webp")
        );
        assert_eq!(detect_image_mime(b"%PDF-1.7"), None);
        assert_eq!(detect_image_mime(&[]), None);
    }
}
