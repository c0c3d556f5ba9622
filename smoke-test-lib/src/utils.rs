//! Utility functions for reading target lists.
//!
//! URL files hold one URL per line. Blank lines and lines starting with `#`
//! are skipped, and a `#` preceded by whitespace starts an inline comment
//! (a bare `#` inside a URL is its fragment).

use crate::error::SmokeTestError;
use crate::value::Url;
use std::fs;
use std::path::Path;

/// URLs parsed from a list, along with the lines that were rejected.
#[derive(Debug, Default)]
pub struct UrlList {
    pub urls: Vec<Url>,
    /// `Line <n>: '<text>' - <reason>` for each rejected entry
    pub invalid_lines: Vec<String>,
}

/// Parse URL list content.
pub fn parse_url_list(content: &str) -> UrlList {
    let mut list = UrlList::default();

    for (index, line) in content.lines().enumerate() {
        let entry = strip_comment(line);
        if entry.is_empty() {
            continue;
        }

        match Url::new(entry) {
            Ok(url) => list.urls.push(url),
            Err(e) => list
                .invalid_lines
                .push(format!("Line {}: '{}' - {}", index + 1, entry, e)),
        }
    }

    list
}

/// Read target URLs from a file.
///
/// Invalid lines are logged and skipped.
///
/// # Errors
///
/// Returns a file error if the file cannot be read or contains no valid URL.
pub fn read_url_file<P: AsRef<Path>>(path: P) -> Result<Vec<Url>, SmokeTestError> {
    let path = path.as_ref();
    let shown = path.to_string_lossy();

    if !path.exists() {
        return Err(SmokeTestError::file_error(shown, "File not found"));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| SmokeTestError::file_error(shown.clone(), e.to_string()))?;

    let list = parse_url_list(&content);

    if !list.invalid_lines.is_empty() {
        tracing::warn!(
            path = %shown,
            "Found {} invalid entries in the file",
            list.invalid_lines.len()
        );
        for invalid in list.invalid_lines.iter().take(5) {
            tracing::warn!("  {}", invalid);
        }
    }

    if list.urls.is_empty() {
        return Err(SmokeTestError::file_error(shown, "No valid URLs found in the file"));
    }

    Ok(list.urls)
}

fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        return "";
    }

    let end = trimmed
        .char_indices()
        .find(|&(i, c)| c == '#' && i > 0 && trimmed[..i].ends_with(char::is_whitespace))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    trimmed[..end].trim_end()
}
