//! Foreign-server driver options.

use serde::{Deserialize, Serialize};

use crate::loader::url_scheme;

use super::HostError;

pub const DRIVER_PATH_OPTION: &str = "driver_path";
pub const DRIVER_CLASS_OPTION: &str = "driver_class";

/// Driver settings taken from one foreign-server definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverOptions {
    /// One or more archive paths or URLs, `:` or `;` separated.
    pub driver_path: String,
    /// Fully-qualified entry-point class, e.g. `org.apache.hive.jdbc.HiveDriver`.
    pub driver_class: String,
}

impl DriverOptions {
    pub fn new(driver_path: impl Into<String>, driver_class: impl Into<String>) -> Self {
        Self {
            driver_path: driver_path.into(),
            driver_class: driver_class.into(),
        }
    }

    /// Build from server option pairs. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, HostError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut driver_path = None;
        let mut driver_class = None;
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            match key.as_ref() {
                DRIVER_PATH_OPTION => driver_path = Some(value.to_string()),
                DRIVER_CLASS_OPTION => driver_class = Some(value.to_string()),
                _ => {}
            }
        }

        let driver_path = driver_path
            .filter(|v| !v.is_empty())
            .ok_or(HostError::MissingOption(DRIVER_PATH_OPTION))?;
        let driver_class = driver_class
            .filter(|v| !v.is_empty())
            .ok_or(HostError::MissingOption(DRIVER_CLASS_OPTION))?;

        Ok(Self {
            driver_path,
            driver_class,
        })
    }

    pub fn paths(&self) -> Vec<String> {
        split_driver_path(&self.driver_path)
    }
}

/// Split a driver-path option into individual locations.
///
/// `;` always separates. `:` separates plain paths, except after a Windows
/// drive letter. A `;`-delimited segment that is a `file:` or `jar:` URL, or
/// any `scheme://` URL, is kept whole so location parsing can accept or
/// reject it. Empty entries and repeats are dropped, first occurrence wins.
pub fn split_driver_path(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |entry: &str| {
        let entry = entry.trim();
        if !entry.is_empty() && !out.iter().any(|e| e == entry) {
            out.push(entry.to_string());
        }
    };

    for segment in raw.split(';') {
        let segment = segment.trim();
        if is_url(segment) {
            push(segment);
            continue;
        }

        let parts: Vec<&str> = segment.split(':').collect();
        let mut i = 0;
        while i < parts.len() {
            match parts.get(i + 1) {
                Some(rest) if is_drive_letter(parts[i]) && starts_drive_path(rest) => {
                    push(&format!("{}:{}", parts[i], rest));
                    i += 2;
                }
                _ => {
                    push(parts[i]);
                    i += 1;
                }
            }
        }
    }

    out
}

fn is_url(segment: &str) -> bool {
    match url_scheme(segment) {
        Some(scheme) => {
            scheme.eq_ignore_ascii_case("file")
                || scheme.eq_ignore_ascii_case("jar")
                || segment[scheme.len() + 1..].starts_with("//")
        }
        None => false,
    }
}

fn is_drive_letter(part: &str) -> bool {
    part.len() == 1 && part.bytes().all(|b| b.is_ascii_alphabetic())
}

/// What may follow `X:` in a drive-qualified path. `\` is unambiguous; `/`
/// only on Windows, where `a:/opt/b.jar` cannot be a relative list entry.
fn starts_drive_path(rest: &str) -> bool {
    rest.starts_with('\\') || (cfg!(windows) && rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_colon_and_semicolon() {
        assert_eq!(
            split_driver_path("/opt/hive/hive-jdbc.jar:/opt/hive/libthrift.jar;/opt/extra"),
            vec!["/opt/hive/hive-jdbc.jar", "/opt/hive/libthrift.jar", "/opt/extra"]
        );
    }

    #[test]
    fn test_split_keeps_urls_whole() {
        assert_eq!(
            split_driver_path("file:///opt/a.jar;jar:file:///opt/b.jar!/;/opt/c.jar"),
            vec!["file:///opt/a.jar", "jar:file:///opt/b.jar!/", "/opt/c.jar"]
        );
    }

    #[test]
    fn test_split_windows_drive_letters() {
        assert_eq!(
            split_driver_path("C:\\drivers\\hive.jar;D:\\lib"),
            vec!["C:\\drivers\\hive.jar", "D:\\lib"]
        );
    }

    #[test]
    fn test_split_relative_lists() {
        assert_eq!(split_driver_path("a.jar:b.jar"), vec!["a.jar", "b.jar"]);
        assert_eq!(
            split_driver_path("hive-jdbc.jar:libthrift.jar"),
            vec!["hive-jdbc.jar", "libthrift.jar"]
        );
        assert_eq!(split_driver_path("hive-2.3.jar:/opt/x.jar"), vec!["hive-2.3.jar", "/opt/x.jar"]);
        assert_eq!(split_driver_path("lib/a.jar:File.jar"), vec!["lib/a.jar", "File.jar"]);
    }

    #[test]
    fn test_split_keeps_unsupported_urls_whole() {
        // Rejected later by location parsing, with the real scheme in the error.
        assert_eq!(
            split_driver_path("https://repo.example/hive.jar"),
            vec!["https://repo.example/hive.jar"]
        );
        assert_eq!(split_driver_path("FILE:///opt/a.jar"), vec!["FILE:///opt/a.jar"]);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_split_one_letter_directory() {
        assert_eq!(split_driver_path("a:/opt/b.jar"), vec!["a", "/opt/b.jar"]);
        assert_eq!(split_driver_path("x:y.jar"), vec!["x", "y.jar"]);
    }

    #[cfg(windows)]
    #[test]
    fn test_split_drive_with_forward_slash() {
        assert_eq!(split_driver_path("C:/drivers/hive.jar"), vec!["C:/drivers/hive.jar"]);
    }

    #[test]
    fn test_split_drops_empty_and_duplicates() {
        assert_eq!(split_driver_path(" :/a.jar::/a.jar; ;/b.jar:"), vec!["/a.jar", "/b.jar"]);
        assert!(split_driver_path("").is_empty());
    }

    #[test]
    fn test_from_pairs() {
        let opts = DriverOptions::from_pairs([
            ("host", "hive.internal"),
            ("driver_path", " /opt/hive-jdbc.jar "),
            ("driver_class", "org.apache.hive.jdbc.HiveDriver"),
        ])
        .unwrap();
        assert_eq!(opts.driver_path, "/opt/hive-jdbc.jar");
        assert_eq!(opts.paths(), vec!["/opt/hive-jdbc.jar"]);
    }

    #[test]
    fn test_from_pairs_missing() {
        let err = DriverOptions::from_pairs([("driver_class", "a.B")]).unwrap_err();
        assert!(matches!(err, HostError::MissingOption(DRIVER_PATH_OPTION)));

        let err = DriverOptions::from_pairs([("driver_path", "/a.jar"), ("driver_class", "  ")]).unwrap_err();
        assert!(matches!(err, HostError::MissingOption(DRIVER_CLASS_OPTION)));
    }
}
