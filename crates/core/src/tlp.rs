// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traffic-light-protocol label attached to an observation.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// TLP value out of the 0–3 range
#[derive(Debug, Error, PartialEq, Eq)]
#[error("tlp must be between 0 and 3, got {0}")]
pub struct TlpOutOfRange(pub i64);

/// TLP level, an integer 0–3 (white, green, amber, red).
///
/// Defaults to amber (2), the submission default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Tlp(u8);

impl Tlp {
    pub const WHITE: Tlp = Tlp(0);
    pub const GREEN: Tlp = Tlp(1);
    pub const AMBER: Tlp = Tlp(2);
    pub const RED: Tlp = Tlp(3);

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Tlp {
    fn default() -> Self {
        Tlp::AMBER
    }
}

impl TryFrom<i64> for Tlp {
    type Error = TlpOutOfRange;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            0..=3 => Ok(Tlp(v as u8)),
            other => Err(TlpOutOfRange(other)),
        }
    }
}

impl<'de> Deserialize<'de> for Tlp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = i64::deserialize(deserializer)?;
        Tlp::try_from(v).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Tlp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "tlp_tests.rs"]
mod tests;
