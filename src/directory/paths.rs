//! Path string helpers
//!
//! These work on path *strings* rather than `Path` components because their
//! inputs are often composed on another platform (configuration files,
//! environment variables) and may mix separator styles.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Convert every separator in `path` to the platform's native separator
///
/// Forward and back slashes are both treated as separators, and runs of
/// consecutive separators collapse into one. Everything else, including a
/// drive letter or a leading separator, is left untouched.
///
/// # Examples
///
/// ```rust
/// use fskit::directory::to_native_separators;
///
/// # #[cfg(unix)]
/// assert_eq!(
///     to_native_separators("/mnt/libs//external\\boost\\\\1.66"),
///     "/mnt/libs/external/boost/1.66"
/// );
/// ```
#[must_use]
pub fn to_native_separators(path: &str) -> String {
    normalize_separators(path, MAIN_SEPARATOR)
}

/// Same as [`to_native_separators`] with an explicit target separator
#[must_use]
pub fn normalize_separators(path: &str, separator: char) -> String {
    let mut normalized = String::with_capacity(path.len());
    let mut previous_was_separator = false;

    for c in path.chars() {
        if c == '/' || c == '\\' {
            if !previous_was_separator {
                normalized.push(separator);
            }
            previous_was_separator = true;
        } else {
            normalized.push(c);
            previous_was_separator = false;
        }
    }

    normalized
}

/// Strip `levels` trailing components from `path`
///
/// Stops at the root: navigating further up than the path is deep returns the
/// root (or an empty path for relative inputs).
#[must_use]
pub fn navigate_up(path: &Path, levels: usize) -> PathBuf {
    let mut current = path;
    for _ in 0..levels {
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/mnt/libs//external\\boost\\\\1.66", "/mnt/libs/external/boost/1.66")]
    #[case("relative\\\\dir//file.txt", "relative/dir/file.txt")]
    #[case("//leading", "/leading")]
    #[case("plain", "plain")]
    #[case("", "")]
    fn test_normalize_to_forward_slash(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_separators(input, '/'), expected);
    }

    #[test]
    fn test_normalize_to_backslash_keeps_drive_letter() {
        assert_eq!(
            normalize_separators("W:\\mnt\\libs\\external//boost\\1.66\\\\src/v2", '\\'),
            "W:\\mnt\\libs\\external\\boost\\1.66\\src\\v2"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_native_separator_on_unix() {
        assert_eq!(
            to_native_separators("/mnt/libs//external\\boost\\\\1.66"),
            "/mnt/libs/external/boost/1.66"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_navigate_up() {
        let path = Path::new("/somePath/with/someOther/folder");
        assert_eq!(navigate_up(path, 2), PathBuf::from("/somePath/with"));
        assert_eq!(navigate_up(path, 0), PathBuf::from(path));
        assert_eq!(navigate_up(path, 10), PathBuf::from("/"));
    }
}
