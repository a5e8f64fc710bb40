//! `Content-Disposition` filename extraction.
//!
//! Blob downloads name the archive through a `filename=` parameter that may be
//! quoted (`filename="app release.zip"`) or bare (`filename=app.zip`).
//! Malformed or missing values yield `None`; the caller picks a fallback name.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static FILENAME_RE: OnceLock<Regex> = OnceLock::new();

fn filename_re() -> &'static Regex {
    FILENAME_RE.get_or_init(|| {
        Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*(?:"([^"]*)"|([^;]*))"#).unwrap()
    })
}

/// Extract the `filename` parameter from a `Content-Disposition` value.
///
/// The result is reduced to a bare file name so a hostile header cannot
/// write outside the output directory. `filename*` (RFC 5987) is not read.
pub fn filename(header: &str) -> Option<String> {
    let caps = filename_re().captures(header)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
    sanitize(raw)
}

/// Reduce `name` to its final path component, rejecting empty, `.` and `..`.
pub fn sanitize(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Path::new(base)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}
