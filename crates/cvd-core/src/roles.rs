//! CVD roles and actor capabilities.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CvdError;

bitflags! {
    /// Set of roles an actor plays in a case. A single actor may hold several.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CvdRoles: u8 {
        const FINDER = 1 << 0;
        const REPORTER = 1 << 1;
        const VENDOR = 1 << 2;
        const DEPLOYER = 1 << 3;
        const COORDINATOR = 1 << 4;
        const OTHER = 1 << 5;
    }
}

impl CvdRoles {
    pub const NO_ROLE: CvdRoles = CvdRoles::empty();

    pub const FINDER_REPORTER: CvdRoles = Self::FINDER.union(Self::REPORTER);
    pub const FINDER_VENDOR: CvdRoles = Self::FINDER.union(Self::VENDOR);
    pub const FINDER_REPORTER_VENDOR: CvdRoles = Self::FINDER_REPORTER.union(Self::VENDOR);
    pub const FINDER_REPORTER_VENDOR_DEPLOYER: CvdRoles =
        Self::FINDER_REPORTER_VENDOR.union(Self::DEPLOYER);
    pub const FINDER_REPORTER_VENDOR_DEPLOYER_COORDINATOR: CvdRoles =
        Self::FINDER_REPORTER_VENDOR_DEPLOYER.union(Self::COORDINATOR);
    pub const VENDOR_DEPLOYER: CvdRoles = Self::VENDOR.union(Self::DEPLOYER);
    pub const VENDOR_COORDINATOR: CvdRoles = Self::VENDOR.union(Self::COORDINATOR);

    const LETTERS: [(char, CvdRoles); 6] = [
        ('F', Self::FINDER),
        ('R', Self::REPORTER),
        ('V', Self::VENDOR),
        ('D', Self::DEPLOYER),
        ('C', Self::COORDINATOR),
        ('O', Self::OTHER),
    ];

    pub fn is_finder(&self) -> bool {
        self.contains(Self::FINDER)
    }

    pub fn is_reporter(&self) -> bool {
        self.contains(Self::REPORTER)
    }

    pub fn is_vendor(&self) -> bool {
        self.contains(Self::VENDOR)
    }

    pub fn is_deployer(&self) -> bool {
        self.contains(Self::DEPLOYER)
    }

    pub fn is_coordinator(&self) -> bool {
        self.contains(Self::COORDINATOR)
    }
}

impl Default for CvdRoles {
    fn default() -> Self {
        Self::NO_ROLE
    }
}

impl fmt::Display for CvdRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (letter, role) in Self::LETTERS {
            if self.contains(role) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

/// Parses role letters such as `FRV`. `-` or an empty string is no role.
impl FromStr for CvdRoles {
    type Err = CvdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "-" {
            return Ok(Self::NO_ROLE);
        }
        s.chars().try_fold(Self::NO_ROLE, |acc, c| {
            let upper = c.to_ascii_uppercase();
            Self::LETTERS
                .iter()
                .find(|(letter, _)| *letter == upper)
                .map(|(_, role)| acc | *role)
                .ok_or(CvdError::UnknownRole(c))
        })
    }
}

impl Serialize for CvdRoles {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CvdRoles {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let letters = String::deserialize(deserializer)?;
        letters.parse().map_err(serde::de::Error::custom)
    }
}

/// Optional subsystems an actor is able to run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Capabilities {
    pub discover_vulnerability: bool,
    pub report_to_others: bool,
    pub develop_fix: bool,
    pub deploy_fix: bool,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            discover_vulnerability: true,
            report_to_others: true,
            develop_fix: true,
            deploy_fix: true,
        }
    }

    /// Capabilities implied by holding `roles`.
    pub fn for_role(roles: CvdRoles) -> Self {
        Self {
            discover_vulnerability: roles.is_finder() || roles.is_vendor(),
            report_to_others: roles.is_reporter() || roles.is_coordinator(),
            develop_fix: roles.is_vendor(),
            deploy_fix: roles.is_deployer(),
        }
    }
}
