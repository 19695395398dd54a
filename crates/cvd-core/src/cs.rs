//! Case State: two monotone triads of flags.
//!
//! `VFD` tracks vendor awareness, fix readiness and fix deployment. `PXA`
//! tracks public awareness, exploit publication and observed attacks. Bits
//! are only ever set; ordering inside a triad is enforced by the transition
//! guards, not by this type.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CvdError;

/// One case-state flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CsFlag {
    VendorAware,
    FixReady,
    FixDeployed,
    PublicAware,
    ExploitPublic,
    AttacksObserved,
}

impl CsFlag {
    pub const ALL: [CsFlag; 6] = [
        CsFlag::VendorAware,
        CsFlag::FixReady,
        CsFlag::FixDeployed,
        CsFlag::PublicAware,
        CsFlag::ExploitPublic,
        CsFlag::AttacksObserved,
    ];

    /// The single-flag case state for this flag.
    pub fn state(&self) -> CaseState {
        match self {
            CsFlag::VendorAware => CaseState::V,
            CsFlag::FixReady => CaseState::F,
            CsFlag::FixDeployed => CaseState::D,
            CsFlag::PublicAware => CaseState::P,
            CsFlag::ExploitPublic => CaseState::X,
            CsFlag::AttacksObserved => CaseState::A,
        }
    }

    /// Lowercase letter used when the flag is clear.
    pub fn letter(&self) -> char {
        match self {
            CsFlag::VendorAware => 'v',
            CsFlag::FixReady => 'f',
            CsFlag::FixDeployed => 'd',
            CsFlag::PublicAware => 'p',
            CsFlag::ExploitPublic => 'x',
            CsFlag::AttacksObserved => 'a',
        }
    }
}

bitflags! {
    /// Six-bit case state, rendered as `vfdpxa` with set flags in uppercase.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CaseState: u8 {
        const V = 1 << 5;
        const F = 1 << 4;
        const D = 1 << 3;
        const P = 1 << 2;
        const X = 1 << 1;
        const A = 1 << 0;
    }
}

impl CaseState {
    pub const VFD: CaseState = Self::V.union(Self::F).union(Self::D);
    pub const PXA: CaseState = Self::P.union(Self::X).union(Self::A);

    /// Nothing has happened yet: `vfdpxa`.
    pub const fn initial() -> Self {
        Self::empty()
    }

    pub fn from_flags(flags: &[CsFlag]) -> Self {
        flags
            .iter()
            .fold(Self::initial(), |acc, flag| acc | flag.state())
    }

    pub fn has(&self, flag: CsFlag) -> bool {
        self.contains(flag.state())
    }

    /// Copy with `flag` set.
    pub fn with(self, flag: CsFlag) -> Self {
        self | flag.state()
    }

    /// Vendor triad as three bits (`V` high).
    pub fn vfd(&self) -> u8 {
        self.intersection(Self::VFD).bits() >> 3
    }

    /// Public triad as three bits (`P` high).
    pub fn pxa(&self) -> u8 {
        self.intersection(Self::PXA).bits()
    }

    /// Only the public triad of this state. What a newcomer inherits.
    pub fn public_part(&self) -> Self {
        self.intersection(Self::PXA)
    }

    // --- Named predicates ---

    /// Public unaware, no exploit, no attacks: the only window in which an
    /// embargo is viable.
    pub fn is_pxa_clear(&self) -> bool {
        !self.intersects(Self::PXA)
    }

    pub fn vendor_aware(&self) -> bool {
        self.has(CsFlag::VendorAware)
    }

    pub fn fix_ready(&self) -> bool {
        self.has(CsFlag::FixReady)
    }

    pub fn fix_deployed(&self) -> bool {
        self.has(CsFlag::FixDeployed)
    }

    pub fn public_aware(&self) -> bool {
        self.has(CsFlag::PublicAware)
    }

    pub fn exploit_public(&self) -> bool {
        self.has(CsFlag::ExploitPublic)
    }

    pub fn attacks_observed(&self) -> bool {
        self.has(CsFlag::AttacksObserved)
    }

    pub fn vendor_aware_and_fix_ready(&self) -> bool {
        self.vendor_aware() && self.fix_ready()
    }

    pub fn vfd_complete(&self) -> bool {
        self.contains(Self::VFD)
    }

    pub fn public_and_exploit(&self) -> bool {
        self.public_aware() && self.exploit_public()
    }
}

impl fmt::Display for CaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in CsFlag::ALL {
            let c = flag.letter();
            let c = if self.has(flag) { c.to_ascii_uppercase() } else { c };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl FromStr for CaseState {
    type Err = CvdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != CsFlag::ALL.len() {
            return Err(CvdError::UnknownState(s.to_string()));
        }
        let mut state = CaseState::initial();
        for (c, flag) in chars.into_iter().zip(CsFlag::ALL) {
            if c == flag.letter() {
                continue;
            }
            if c == flag.letter().to_ascii_uppercase() {
                state = state.with(flag);
            } else {
                return Err(CvdError::UnknownState(s.to_string()));
            }
        }
        Ok(state)
    }
}

impl Default for CaseState {
    fn default() -> Self {
        Self::initial()
    }
}

impl Serialize for CaseState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CaseState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let letters = String::deserialize(deserializer)?;
        letters.parse().map_err(serde::de::Error::custom)
    }
}
