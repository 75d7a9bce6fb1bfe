//! Time-key encoding for dataset instances.
//!
//! A dataset instance (one model run + climatological period) may be realized
//! by up to three files of different temporal resolution. Every selectable
//! instant is identified by a `TimeKey`, the encoded (timescale, timeidx)
//! pair, and a `TimeMap` collects the keys of all files of an instance
//! together with their absolute timestamps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StratusError};

/// Temporal resolution of a data file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Timescale {
    /// Twelve instants per climatology (index 0-11)
    Monthly,
    /// Four instants per climatology (index 0-3)
    Seasonal,
    /// One instant per climatology (index 0)
    Yearly,
}

impl Timescale {
    /// Largest valid time index for this resolution.
    pub fn max_index(&self) -> u32 {
        match self {
            Timescale::Monthly => 11,
            Timescale::Seasonal => 3,
            Timescale::Yearly => 0,
        }
    }

    /// Canonical lowercase name used in encodings and wire formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timescale::Monthly => "monthly",
            Timescale::Seasonal => "seasonal",
            Timescale::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Timescale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timescale {
    type Err = StratusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(Timescale::Monthly),
            "seasonal" => Ok(Timescale::Seasonal),
            "yearly" => Ok(Timescale::Yearly),
            _ => Err(StratusError::InvalidParameter {
                param: "timescale".to_string(),
                message: format!(
                    "Unknown timescale: {}. Must be one of: monthly, seasonal, yearly",
                    s
                ),
            }),
        }
    }
}

/// One selectable instant within a dataset instance.
///
/// The canonical encoded form is `"<timescale>:<timeidx>"`, e.g. `monthly:3`.
/// Keys of different timescales are never numerically comparable - a monthly
/// index 0 and a seasonal index 0 are distinct keys - so consumers must only
/// test encoded forms for equality. The derived `Ord` exists to give maps a
/// deterministic iteration order, nothing more.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct TimeKey {
    /// Temporal resolution the index belongs to
    pub timescale: Timescale,
    /// Index within the resolution (0-11 monthly, 0-3 seasonal, 0 yearly)
    pub timeidx: u32,
}

impl TimeKey {
    /// Create a time key, validating the index against the timescale.
    pub fn new(timescale: Timescale, timeidx: u32) -> Result<Self> {
        if timeidx > timescale.max_index() {
            return Err(StratusError::InvalidParameter {
                param: "timeidx".to_string(),
                message: format!(
                    "Index {} out of range for {} data (max {})",
                    timeidx,
                    timescale,
                    timescale.max_index()
                ),
            });
        }
        Ok(Self { timescale, timeidx })
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.timescale, self.timeidx)
    }
}

impl FromStr for TimeKey {
    type Err = StratusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (scale, idx) = s.split_once(':').ok_or_else(|| StratusError::InvalidTimeKey {
            value: s.to_string(),
        })?;
        let timescale = scale.parse::<Timescale>().map_err(|_| StratusError::InvalidTimeKey {
            value: s.to_string(),
        })?;
        let timeidx = idx.parse::<u32>().map_err(|_| StratusError::InvalidTimeKey {
            value: s.to_string(),
        })?;
        TimeKey::new(timescale, timeidx).map_err(|_| StratusError::InvalidTimeKey {
            value: s.to_string(),
        })
    }
}

impl TryFrom<String> for TimeKey {
    type Error = StratusError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeKey> for String {
    fn from(key: TimeKey) -> Self {
        key.to_string()
    }
}

/// TimeKey to absolute timestamp mapping for one dataset instance/variable.
///
/// Key sets for two variables of the same instance may differ in both
/// cardinality and resolution.
pub type TimeMap = BTreeMap<TimeKey, DateTime<Utc>>;
