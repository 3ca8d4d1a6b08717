//! On-disk storage for downloaded files.
//!
//! Each URL maps to one file named after a truncated SHA-256 of the URL,
//! keeping the URL's extension. The first line of the file records when it
//! was downloaded, so freshness does not depend on filesystem mtimes:
//!
//! ```text
//! # https://example.com/objects.inv downloaded at timestamp 1700000000
//! <content bytes>
//! ```

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::CacheError;

/// Length of the hex hash used as the file stem.
const NAME_HASH_LEN: usize = 32;

/// Cache file path for `url` inside `dir`.
pub(crate) fn cache_path(dir: &Path, url: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let hash = hex::encode(hasher.finalize());
    let name = format!("{}{}", &hash[..NAME_HASH_LEN], url_extension(url));
    dir.join(name)
}

/// Extension of the URL path, including the dot, or an empty string.
fn url_extension(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    file.rfind('.').map_or("", |dot| &file[dot..])
}

/// Header line prefix for `url`, up to and excluding the timestamp.
fn header_prefix(url: &str, comment: &[u8]) -> Vec<u8> {
    let mut prefix = comment.to_vec();
    prefix.extend_from_slice(url.as_bytes());
    prefix.extend_from_slice(b" downloaded at timestamp ");
    prefix
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Return the cached content for `url` if present and younger than `max_age`.
///
/// Any read or format problem is logged and treated as a miss.
pub(crate) fn read_fresh(
    path: &Path,
    url: &str,
    comment: &[u8],
    max_age: Duration,
) -> Option<Vec<u8>> {
    let file = fs::File::open(path).ok()?;
    let mut reader = BufReader::new(file);

    let mut line = Vec::new();
    if let Err(e) = reader.read_until(b'\n', &mut line) {
        tracing::debug!(path = %path.display(), error = %e, "Failed to read cache header");
        return None;
    }

    let prefix = header_prefix(url, comment);
    let timestamp = line.strip_prefix(prefix.as_slice())?;
    let timestamp: u64 = match std::str::from_utf8(timestamp).map(str::trim).map(str::parse) {
        Ok(Ok(ts)) => ts,
        _ => {
            tracing::debug!(path = %path.display(), "Invalid cache timestamp");
            return None;
        }
    };

    if Duration::from_secs(now_secs().saturating_sub(timestamp)) > max_age {
        return None;
    }

    let mut content = Vec::new();
    if let Err(e) = reader.read_to_end(&mut content) {
        tracing::debug!(path = %path.display(), error = %e, "Failed to read cached content");
        return None;
    }

    tracing::debug!(path = %path.display(), "Using cached download");
    Some(content)
}

/// Write `content` for `url`, replacing the previous file atomically.
pub(crate) fn write(
    path: &Path,
    url: &str,
    comment: &[u8],
    content: &[u8],
) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut buf = header_prefix(url, comment);
    buf.extend_from_slice(now_secs().to_string().as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(content);

    let tmp = path.with_extension("part");
    fs::write(&tmp, &buf)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
