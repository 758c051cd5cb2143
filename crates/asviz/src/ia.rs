// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ISD-AS identifiers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing an `isd-as` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIaError {
    #[error("Malformed ISD-AS '{0}': expected <isd>-<as>")]
    Malformed(String),

    #[error("Invalid ISD number '{0}'")]
    InvalidIsd(String),

    #[error("Invalid AS number '{0}'")]
    InvalidAs(String),
}

/// Isolation domain + autonomous system pair, printed as `isd-as`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IsdAs {
    pub isd: u16,
    pub asn: u64,
}

impl IsdAs {
    pub const fn new(isd: u16, asn: u64) -> Self {
        Self { isd, asn }
    }

    /// Socket file name used by the path daemon serving this AS.
    pub fn socket_name(&self) -> String {
        format!("sd{}-{}.sock", self.isd, self.asn)
    }

    /// Conventional daemon bind address, `127.<isd>.<as>.254`.
    ///
    /// Returns `None` when either number does not fit in an octet.
    pub fn default_daemon_addr(&self) -> Option<Ipv4Addr> {
        let isd = u8::try_from(self.isd).ok()?;
        let asn = u8::try_from(self.asn).ok()?;
        Some(Ipv4Addr::new(127, isd, asn, 254))
    }

    /// Endhost configuration directory under a generated-topology root.
    pub fn conf_dir(&self, gen_dir: &Path) -> PathBuf {
        gen_dir
            .join(format!("ISD{}", self.isd))
            .join(format!("AS{}", self.asn))
            .join("endhost")
    }
}

impl fmt::Display for IsdAs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.isd, self.asn)
    }
}

impl FromStr for IsdAs {
    type Err = ParseIaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (isd, asn) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| ParseIaError::Malformed(s.to_string()))?;

        let isd = isd
            .parse::<u16>()
            .map_err(|_| ParseIaError::InvalidIsd(isd.to_string()))?;
        let asn = asn
            .parse::<u64>()
            .map_err(|_| ParseIaError::InvalidAs(asn.to_string()))?;

        Ok(Self { isd, asn })
    }
}

impl Serialize for IsdAs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IsdAs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let ia: IsdAs = "1-18".parse().unwrap();
        assert_eq!(ia, IsdAs::new(1, 18));
        assert_eq!(ia.to_string(), "1-18");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            "118".parse::<IsdAs>(),
            Err(ParseIaError::Malformed(_))
        ));
        assert!(matches!(
            "-1-18".parse::<IsdAs>(),
            Err(ParseIaError::InvalidIsd(_))
        ));
        assert!(matches!(
            "1-x".parse::<IsdAs>(),
            Err(ParseIaError::InvalidAs(_))
        ));
        assert!(matches!(
            "1--18".parse::<IsdAs>(),
            Err(ParseIaError::InvalidAs(_))
        ));
    }

    #[test]
    fn daemon_conventions() {
        let ia = IsdAs::new(2, 26);
        assert_eq!(ia.socket_name(), "sd2-26.sock");
        assert_eq!(
            ia.default_daemon_addr(),
            Some(Ipv4Addr::new(127, 2, 26, 254))
        );
        assert_eq!(IsdAs::new(1, 1024).default_daemon_addr(), None);
        assert_eq!(
            ia.conf_dir(Path::new("gen")),
            Path::new("gen/ISD2/AS26/endhost")
        );
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&IsdAs::new(1, 19)).unwrap();
        assert_eq!(json, "\"1-19\"");
        let back: IsdAs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, IsdAs::new(1, 19));
    }
}
