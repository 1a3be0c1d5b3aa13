// SPDX-License-Identifier: MIT

//! Logical-path normalization and OneDrive path-addressing encoding.
//!
//! The Graph API addresses items below the drive root as
//! `/root:{percent-encoded absolute path}`. The drive root itself is
//! addressed without the colon marker, which is why [`encode_path`]
//! returns an empty string for it.

/// Normalize a client-supplied path into a clean POSIX-style absolute path.
///
/// The result always starts with a single `/`, contains no `.`/`..`
/// segments and no repeated or trailing separators (the root stays `/`).
/// Malformed input is normalized rather than rejected; `..` never climbs
/// above the root.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Encode a logical path into the Graph path-addressing form, anchored at
/// the configured base directory.
///
/// Returns the empty string for the drive root; callers must omit the `:`
/// separator in that case. Otherwise returns `:` followed by the
/// percent-encoding of the whole joined path. Encoding is applied to the
/// full path (slashes included) rather than per segment, which is what
/// Graph expects for special characters.
pub fn encode_path(base_directory: &str, path: &str) -> String {
    let joined = clean_path(&format!("{}/{}", base_directory, path));
    if joined == "/" {
        return String::new();
    }
    format!(":{}", urlencoding::encode(&joined))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path_normalizes() {
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("docs"), "/docs");
        assert_eq!(clean_path("/docs/"), "/docs");
        assert_eq!(clean_path("//a///b/"), "/a/b");
        assert_eq!(clean_path("/a/./b/../c"), "/a/c");
        assert_eq!(clean_path("/../../x"), "/x");
    }

    #[test]
    fn test_clean_path_is_idempotent() {
        for p in ["/", "/a/b", "/a/./b/..", "weird//path/"] {
            let once = clean_path(p);
            assert_eq!(clean_path(&once), once);
        }
    }

    #[test]
    fn test_encode_root_is_empty() {
        assert_eq!(encode_path("/", "/"), "");
        assert_eq!(encode_path("/", ""), "");
        assert_eq!(encode_path("/base", "/.."), "");
    }

    #[test]
    fn test_encode_trailing_slash_irrelevant() {
        assert_eq!(encode_path("/", "/a/b/"), encode_path("/", "/a/b"));
    }

    #[test]
    fn test_encode_whole_path() {
        // Slashes are encoded too: the whole path is one encoded token.
        assert_eq!(encode_path("/", "/docs"), ":%2Fdocs");
        assert_eq!(encode_path("/base", "/docs"), ":%2Fbase%2Fdocs");
        assert_eq!(encode_path("/", "/a b"), ":%2Fa%20b");
    }
}
