//! File path / URI conversions
//!
//! Documents are identified by `file://` URIs on the wire; the filesystem
//! wants plain paths. `url` handles the percent-encoding rules and the
//! Windows drive-letter quirks.

use std::path::{Path, PathBuf};

use url::Url;

/// Build a `file://` URI for an absolute filesystem path.
pub fn create_file_uri(path: impl AsRef<Path>) -> Option<String> {
    Url::from_file_path(path.as_ref())
        .ok()
        .map(|url| url.into())
}

/// Extract the filesystem path from a `file://` URI.
pub fn parse_uri(uri: &str) -> Option<PathBuf> {
    Url::parse(uri).ok()?.to_file_path().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_and_path_round_trip() {
        let path = if cfg!(windows) {
            PathBuf::from("C:\\rules\\spaced out.yara")
        } else {
            PathBuf::from("/rules/spaced out.yara")
        };
        let uri = create_file_uri(&path).unwrap();
        assert!(uri.starts_with("file://"));
        assert!(uri.contains("spaced%20out.yara"));
        assert_eq!(parse_uri(&uri).unwrap(), path);
    }

    #[test]
    fn relative_paths_have_no_uri() {
        assert!(create_file_uri("relative/rules.yara").is_none());
    }

    #[test]
    fn non_file_schemes_have_no_path() {
        assert!(parse_uri("https://example.com/rules.yara").is_none());
        assert!(parse_uri("not a uri at all").is_none());
    }
}
