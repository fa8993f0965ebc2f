//! Resource location parsing.
//!
//! A location is validated syntactically when it is appended to a context.
//! Nothing is opened until a class is resolved against it.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use super::error::LoadError;

const JAR_SEPARATOR: &str = "!/";

/// One driver archive or class directory contributing to a loader context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    raw: String,
    path: PathBuf,
}

impl ResourceLocation {
    /// Parse a plain path, a `file:` URL, or a `jar:file:...!/` URL.
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LoadError::invalid_location(raw, "location is empty"));
        }
        if trimmed.contains('\0') {
            return Err(LoadError::invalid_location(raw, "location contains a NUL byte"));
        }

        let path = match url_scheme(trimmed) {
            Some(scheme) if scheme.eq_ignore_ascii_case("jar") => parse_jar_url(raw, trimmed)?,
            Some(scheme) if scheme.eq_ignore_ascii_case("file") => parse_file_url(raw, trimmed)?,
            Some(scheme) => {
                return Err(LoadError::invalid_location(
                    raw,
                    format!("unsupported scheme '{}', only local file locations are allowed", scheme),
                ));
            }
            None => PathBuf::from(trimmed),
        };

        Ok(Self {
            raw: trimmed.to_string(),
            path,
        })
    }

    /// The location as it was supplied (whitespace trimmed).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Local filesystem path the location resolves to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Return the URL scheme if `s` starts with one.
///
/// Single-letter schemes are treated as Windows drive letters, not URLs.
pub(crate) fn url_scheme(s: &str) -> Option<&str> {
    let colon = s.find(':')?;
    let scheme = &s[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if scheme.len() < 2 || !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(scheme)
    } else {
        None
    }
}

fn parse_file_url(raw: &str, s: &str) -> Result<PathBuf, LoadError> {
    let url = Url::parse(s).map_err(|e| LoadError::invalid_location(raw, e.to_string()))?;
    match url.host_str() {
        None | Some("") | Some("localhost") => {}
        Some(host) => {
            return Err(LoadError::invalid_location(
                raw,
                format!("remote host '{}' is not supported", host),
            ));
        }
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(LoadError::invalid_location(raw, "file URL must not carry a query or fragment"));
    }
    url.to_file_path()
        .map_err(|()| LoadError::invalid_location(raw, "URL does not name a local file path"))
}

fn parse_jar_url(raw: &str, s: &str) -> Result<PathBuf, LoadError> {
    let inner = &s["jar:".len()..];
    let Some(sep) = inner.find(JAR_SEPARATOR) else {
        return Err(LoadError::invalid_location(raw, "jar URL is missing the '!/' separator"));
    };
    if !inner[sep + JAR_SEPARATOR.len()..].is_empty() {
        return Err(LoadError::invalid_location(raw, "paths inside a jar URL are not supported"));
    }
    let archive = &inner[..sep];
    match url_scheme(archive) {
        Some(scheme) if scheme.eq_ignore_ascii_case("file") => parse_file_url(raw, archive),
        _ => Err(LoadError::invalid_location(raw, "jar URL must wrap a file: URL")),
    }
}
