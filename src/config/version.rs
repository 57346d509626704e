//! Version gating for mods using semver constraints
//!
//! Mods declare ranges like ">=1.4.0, <2.0.0" and are matched against the
//! version of the bundle being patched.

use crate::cache::get_or_compile_regex;
use semver::{Version, VersionReq};
use thiserror::Error;

/// How far into a bundle the version header is looked for.
const HEADER_SCAN_BYTES: usize = 4096;

const HEADER_VERSION: &str =
    r"(?m)^\s*(?://|/\*|\*)[^\n]*?\bv?(\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?)";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid version '{value}': {reason}")]
    InvalidVersion { value: String, reason: String },

    #[error("invalid version requirement '{value}': {reason}")]
    InvalidRequirement { value: String, reason: String },
}

/// Check if a version matches a requirement string
///
/// # Examples
///
/// ```
/// use bundle_patcher::config::version::matches_requirement;
///
/// assert!(matches_requirement("1.4.0", Some(">=1.4.0")).unwrap());
/// assert!(matches_requirement("1.5.2", Some(">=1.4.0, <2.0.0")).unwrap());
/// assert!(!matches_requirement("2.0.0", Some(">=1.4.0, <2.0.0")).unwrap());
///
/// // No requirement means every version
/// assert!(matches_requirement("0.1.0", None).unwrap());
/// ```
pub fn matches_requirement(
    version: &str,
    requirement: Option<&str>,
) -> Result<bool, VersionError> {
    let Some(req_str) = requirement.map(str::trim) else {
        return Ok(true);
    };
    if req_str.is_empty() {
        return Ok(true);
    }

    let version = Version::parse(version.trim().trim_start_matches('v')).map_err(|e| {
        VersionError::InvalidVersion {
            value: version.to_string(),
            reason: e.to_string(),
        }
    })?;
    let req = VersionReq::parse(req_str).map_err(|e| VersionError::InvalidRequirement {
        value: req_str.to_string(),
        reason: e.to_string(),
    })?;

    Ok(req.matches(&version))
}

/// Read the build version from a bundle's leading comment header,
/// e.g. `/*! Skyforge v1.4.2 */` or `// build 1.4.2-beta.1`.
pub fn detect_bundle_version(source: &str) -> Option<String> {
    let mut end = source.len().min(HEADER_SCAN_BYTES);
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    let header = &source[..end];

    let re = get_or_compile_regex(HEADER_VERSION).ok()?;
    let version = re
        .captures_iter(header)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|candidate| Version::parse(candidate).is_ok())
        .map(str::to_string);
    version
}
