//! Path Resolution
//!
//! Builds fully-qualified resource locators from the server root directory
//! and a caller-supplied filename, optionally prefixed with `service:`.

use tracing::warn;

use crate::MAX_PATH_LEN;

/// Resolves `filename` against `root_dir`.
///
/// With a `service:name` filename the root is interposed after the colon.
/// A leading `/` on the name is dropped when the root is non-empty. No
/// escaping is performed. Locators longer than `MAX_PATH_LEN - 1` bytes
/// are truncated.
pub fn resolve_path(root_dir: &str, filename: &str) -> String {
    let resolved = match filename.split_once(':') {
        Some((service, name)) => {
            format!("{service}:{root_dir}{}", strip_separator(root_dir, name))
        }
        None => format!("{root_dir}{}", strip_separator(root_dir, filename)),
    };
    truncate_locator(resolved)
}

fn strip_separator<'a>(root_dir: &str, name: &'a str) -> &'a str {
    if root_dir.is_empty() {
        name
    } else {
        name.strip_prefix('/').unwrap_or(name)
    }
}

fn truncate_locator(mut locator: String) -> String {
    let limit = MAX_PATH_LEN - 1;
    if locator.len() > limit {
        let mut cut = limit;
        while !locator.is_char_boundary(cut) {
            cut -= 1;
        }
        warn!(length = locator.len(), limit, "Resource locator truncated");
        locator.truncate(cut);
    }
    locator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_without_root() {
        assert_eq!(resolve_path("", "clip.mp4"), "clip.mp4");
        assert_eq!(resolve_path("", "/abs/clip.mp4"), "/abs/clip.mp4");
    }

    #[test]
    fn test_resolve_with_root() {
        assert_eq!(resolve_path("/media/", "clip.mp4"), "/media/clip.mp4");
        assert_eq!(resolve_path("/media/", "/clip.mp4"), "/media/clip.mp4");
    }

    #[test]
    fn test_resolve_service_prefix() {
        assert_eq!(resolve_path("/media/", "svc:/clip.mp4"), "svc:/media/clip.mp4");
        assert_eq!(resolve_path("/media/", "avformat:clip.mp4"), "avformat:/media/clip.mp4");
        assert_eq!(resolve_path("", "color:black"), "color:black");
    }

    #[test]
    fn test_resolve_truncates_long_locators() {
        let long = "a".repeat(MAX_PATH_LEN * 2);
        let resolved = resolve_path("/media/", &long);
        assert_eq!(resolved.len(), MAX_PATH_LEN - 1);
        assert!(resolved.starts_with("/media/a"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let long = "é".repeat(MAX_PATH_LEN);
        let resolved = resolve_path("", &long);
        assert!(resolved.len() <= MAX_PATH_LEN - 1);
        assert!(resolved.chars().all(|c| c == 'é'));
    }
}
