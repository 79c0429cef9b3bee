//! Build phases of one SoC assembly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SocError};

/// Phase of an assembly. Moves strictly forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildPhase {
    Unconfigured,
    ClockEstablished,
    RegionsComposed,
    PeripheralsWired,
    /// Terminal; the snapshot has been handed off.
    Finalized,
}

impl BuildPhase {
    /// Valid transitions from this phase.
    pub fn valid_transitions(&self) -> &'static [BuildPhase] {
        use BuildPhase::*;
        match self {
            Unconfigured => &[ClockEstablished],
            ClockEstablished => &[RegionsComposed],
            RegionsComposed => &[PeripheralsWired],
            PeripheralsWired => &[Finalized],
            Finalized => &[],
        }
    }

    pub fn can_transition_to(&self, target: BuildPhase) -> bool {
        self.valid_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Whether the system clock domain exists in this phase.
    pub fn has_clock(&self) -> bool {
        *self >= BuildPhase::ClockEstablished
    }

    /// Check that `target` may follow this phase.
    pub fn check_transition(&self, target: BuildPhase) -> Result<()> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(SocError::PhaseOrder {
                from: *self,
                to: target,
            })
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildPhase::Unconfigured => write!(f, "UNCONFIGURED"),
            BuildPhase::ClockEstablished => write!(f, "CLOCK_ESTABLISHED"),
            BuildPhase::RegionsComposed => write!(f, "REGIONS_COMPOSED"),
            BuildPhase::PeripheralsWired => write!(f, "PERIPHERALS_WIRED"),
            BuildPhase::Finalized => write!(f, "FINALIZED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [BuildPhase; 5] = [
        BuildPhase::Unconfigured,
        BuildPhase::ClockEstablished,
        BuildPhase::RegionsComposed,
        BuildPhase::PeripheralsWired,
        BuildPhase::Finalized,
    ];

    #[test]
    fn only_the_next_phase_is_reachable() {
        for (i, from) in ALL.iter().enumerate() {
            for (j, to) in ALL.iter().enumerate() {
                assert_eq!(from.can_transition_to(*to), j == i + 1, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn finalized_is_terminal() {
        assert!(BuildPhase::Finalized.is_terminal());
        assert!(!BuildPhase::PeripheralsWired.is_terminal());
    }

    #[test]
    fn backwards_transition_is_an_error() {
        let err = BuildPhase::RegionsComposed
            .check_transition(BuildPhase::ClockEstablished)
            .unwrap_err();
        assert!(matches!(err, SocError::PhaseOrder { .. }));
        assert_eq!(
            err.to_string(),
            "invalid build phase transition REGIONS_COMPOSED -> CLOCK_ESTABLISHED"
        );
    }

    #[test]
    fn clock_available_from_clock_established() {
        assert!(!BuildPhase::Unconfigured.has_clock());
        assert!(BuildPhase::ClockEstablished.has_clock());
        assert!(BuildPhase::Finalized.has_clock());
    }
}
