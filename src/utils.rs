//! Utility functions for file naming and progress arithmetic

use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use std::path::{Path, PathBuf};

/// File name used when neither the headers nor the URL provide one
const FALLBACK_FILE_NAME: &str = "download";

/// Resolve the file name for a download
///
/// Prefers the `Content-Disposition` header (`filename=` or RFC 5987 `filename*=`), then the
/// last non-empty segment of the URL path, then `"download"`. Only the final path component
/// is kept, so a header like `filename="../../etc/passwd"` cannot escape the download directory.
///
/// # Examples
///
/// ```
/// use downunzip::utils::resolve_file_name;
/// use reqwest::header::HeaderMap;
///
/// let name = resolve_file_name(&HeaderMap::new(), "https://example.com/files/tools.zip?x=1");
/// assert_eq!(name, "tools.zip");
/// ```
pub fn resolve_file_name(headers: &HeaderMap, url: &str) -> String {
    if let Some(content_disposition) = headers.get(CONTENT_DISPOSITION)
        && let Ok(value) = content_disposition.to_str()
        && let Some(name) = filename_from_disposition(value)
        && let Some(name) = last_component(&name)
    {
        return name;
    }

    if let Ok(parsed_url) = url::Url::parse(url)
        && let Some(mut segments) = parsed_url.path_segments()
        && let Some(last_segment) = segments.next_back()
        && !last_segment.is_empty()
    {
        let decoded = urlencoding::decode(last_segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| last_segment.to_string());
        if let Some(name) = last_component(&decoded) {
            return name;
        }
    }

    FALLBACK_FILE_NAME.to_string()
}

/// Parse a file name out of a Content-Disposition value
///
/// Format: `attachment; filename="file.zip"` or `attachment; filename*=UTF-8''file.zip`.
/// The extended `filename*` form wins when both are present.
fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for part in value.split(';') {
        let part = part.trim();
        if let Some(encoded) = strip_prefix_ignore_case(part, "filename*=") {
            // charset'lang'encoded-filename
            let encoded = encoded.rsplit('\'').next().unwrap_or(encoded);
            if let Ok(decoded) = urlencoding::decode(encoded.trim_matches('"')) {
                return Some(decoded.into_owned());
            }
        } else if let Some(name) = strip_prefix_ignore_case(part, "filename=") {
            plain = Some(name.trim().trim_matches('"').to_string());
        }
    }
    plain
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    match value.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => Some(&value[prefix.len()..]),
        _ => None,
    }
}

fn last_component(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Whole percent of `transferred` out of `total`, floored and clamped to 100
///
/// Returns `None` when the total is unknown or zero, which the observer treats as an
/// indeterminate progress bar.
pub fn percentage(transferred: u64, total: Option<u64>) -> Option<u8> {
    match total {
        Some(total) if total > 0 => {
            let pct = (transferred as u128 * 100) / total as u128;
            Some(pct.min(100) as u8)
        }
        _ => None,
    }
}

/// Directory an archive is extracted into: the archive path with its extension stripped
///
/// `downloads/tools.zip` becomes `downloads/tools`. A path without an extension gets an
/// `_extracted` suffix instead so the target never collides with the archive itself.
pub fn target_dir_for(archive_path: &Path) -> PathBuf {
    if archive_path.extension().is_some() {
        archive_path.with_extension("")
    } else {
        let mut name = archive_path.as_os_str().to_owned();
        name.push("_extracted");
        PathBuf::from(name)
    }
}
