//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::LazyLock as Lazy;

use regex::Regex;
use serde::{Deserialize, Serialize};

// Leading dotted-numeric part of a version string ("4.15.0-20-generic" ->
// "4.15.0").
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)*").unwrap());

// Version comparison operator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum CmpOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

// Version parsing errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VersionError {
    InvalidVersion(String),
    InvalidOperator(String),
}

// ===== impl CmpOp =====

impl CmpOp {
    // Returns whether the result of a version comparison satisfies this
    // operator.
    pub fn eval(&self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ge => ordering != Ordering::Less,
            CmpOp::Gt => ordering == Ordering::Greater,
        }
    }
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CmpOp::Lt => write!(f, "<"),
            CmpOp::Le => write!(f, "<="),
            CmpOp::Eq => write!(f, "="),
            CmpOp::Ge => write!(f, ">="),
            CmpOp::Gt => write!(f, ">"),
        }
    }
}

impl FromStr for CmpOp {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<CmpOp, VersionError> {
        match s {
            "<" => Ok(CmpOp::Lt),
            "<=" => Ok(CmpOp::Le),
            "=" | "==" => Ok(CmpOp::Eq),
            ">=" => Ok(CmpOp::Ge),
            ">" => Ok(CmpOp::Gt),
            _ => Err(VersionError::InvalidOperator(s.to_owned())),
        }
    }
}

// ===== impl VersionError =====

impl std::fmt::Display for VersionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionError::InvalidVersion(version) => {
                write!(f, "invalid version string: {version}")
            }
            VersionError::InvalidOperator(op) => {
                write!(f, "invalid comparison operator: {op}")
            }
        }
    }
}

impl std::error::Error for VersionError {}

// ===== helper functions =====

fn components(version: &str) -> Result<Vec<u64>, VersionError> {
    let invalid = || VersionError::InvalidVersion(version.to_owned());
    let whole = VERSION_RE.find(version.trim()).ok_or_else(invalid)?;
    whole
        .as_str()
        .split('.')
        .map(|c| c.parse::<u64>().map_err(|_| invalid()))
        .collect()
}

// ===== global functions =====

/// Compares two version strings.
///
/// Only the leading dotted-numeric part of each string is considered, and
/// missing trailing components count as zero, so `"4.9"` equals `"4.9.0"`
/// and `"4.15.0-20-generic"` is greater than `"4.9"`.
pub fn version_cmp(v1: &str, v2: &str) -> Result<Ordering, VersionError> {
    let v1 = components(v1)?;
    let v2 = components(v2)?;

    let len = v1.len().max(v2.len());
    for i in 0..len {
        let n1 = v1.get(i).copied().unwrap_or(0);
        let n2 = v2.get(i).copied().unwrap_or(0);
        match n1.cmp(&n2) {
            Ordering::Equal => continue,
            ordering => return Ok(ordering),
        }
    }

    Ok(Ordering::Equal)
}

/// Returns whether `actual <op> required` holds.
pub fn has_version(
    actual: &str,
    op: CmpOp,
    required: &str,
) -> Result<bool, VersionError> {
    version_cmp(actual, required).map(|ordering| op.eval(ordering))
}

#[cfg(test)]
mod test_version {
    use super::*;

    #[test]
    fn test_version_cmp() {
        assert_eq!(version_cmp("4.9", "4.9"), Ok(Ordering::Equal));
        assert_eq!(version_cmp("4.9", "4.9.0.0"), Ok(Ordering::Equal));
        assert_eq!(version_cmp("4.10", "4.9"), Ok(Ordering::Greater));
        assert_eq!(version_cmp("3.16", "4.9"), Ok(Ordering::Less));
        assert_eq!(version_cmp("4.9", "4.9.1"), Ok(Ordering::Less));
        assert_eq!(
            version_cmp("4.15.0-20-generic", "4.9"),
            Ok(Ordering::Greater)
        );
        assert_eq!(version_cmp("3.1-dev", "3.1"), Ok(Ordering::Equal));
    }

    #[test]
    fn test_version_cmp_invalid() {
        assert_eq!(
            version_cmp("unknown", "4.9"),
            Err(VersionError::InvalidVersion("unknown".to_owned()))
        );
        assert!(version_cmp("4.9", "").is_err());
    }

    #[test]
    fn test_cmp_op() {
        assert_eq!("<".parse::<CmpOp>(), Ok(CmpOp::Lt));
        assert_eq!("==".parse::<CmpOp>(), Ok(CmpOp::Eq));
        assert!("=<".parse::<CmpOp>().is_err());
        assert_eq!(CmpOp::Ge.to_string(), ">=");

        assert_eq!(has_version("3.0", CmpOp::Lt, "3.1"), Ok(true));
        assert_eq!(has_version("3.1", CmpOp::Lt, "3.1"), Ok(false));
        assert_eq!(has_version("3.1", CmpOp::Le, "3.1"), Ok(true));
        assert_eq!(has_version("7.2", CmpOp::Gt, "3.1"), Ok(true));
        assert_eq!(has_version("7.2", CmpOp::Eq, "7.2.0"), Ok(true));
    }
}
