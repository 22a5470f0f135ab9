//! Tag arithmetic.
//!
//! Downstream tags follow `<prefix>.<number>`, where the last dot-separated
//! component is a zero-padded counter (`ewm-2.1.007`, `cam6_3_109.004`).
//! Release tags carry a marker (`release-ew2.1`, `release-cam6_3_109`) and
//! roll over to the first development tag of the next series.

use crate::error::{Error, Result};

/// Increment the last dot-separated numeric component of `tag`.
///
/// The digit count of the original component is kept as a minimum width, so
/// `v1.2.007` becomes `v1.2.008` and `a.b.999` becomes `a.b.1000`.
pub fn next_tag(tag: &str) -> Result<String> {
    let tag = tag.trim();
    let (head, last) = match tag.rfind('.') {
        Some(pos) => (&tag[..=pos], &tag[pos + 1..]),
        None => ("", tag),
    };

    if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Tag {
            tag: tag.to_string(),
            message: "last component is not a number".to_string(),
        });
    }

    let number: u64 = last.parse().map_err(|_| Error::Tag {
        tag: tag.to_string(),
        message: "last component is out of range".to_string(),
    })?;
    let next = number.checked_add(1).ok_or_else(|| Error::Tag {
        tag: tag.to_string(),
        message: "last component is out of range".to_string(),
    })?;

    Ok(format!("{}{:0width$}", head, next, width = last.len()))
}

/// First development tag after a release.
///
/// If `tag` contains `release_marker`, the marker is stripped, `dev_prefix`
/// is prepended and a `.000` counter appended
/// (`release-ew2.1` with marker `release-ew` and prefix `ewm-` gives
/// `ewm-2.1.000`). Any other tag is incremented with [`next_tag`].
pub fn development_tag(tag: &str, release_marker: &str, dev_prefix: &str) -> Result<String> {
    let tag = tag.trim();
    if !release_marker.is_empty() && tag.contains(release_marker) {
        let version = tag.replacen(release_marker, "", 1);
        if version.is_empty() {
            return Err(Error::Tag {
                tag: tag.to_string(),
                message: "release tag has no version".to_string(),
            });
        }
        Ok(format!("{}{}.000", dev_prefix, version))
    } else {
        next_tag(tag)
    }
}
