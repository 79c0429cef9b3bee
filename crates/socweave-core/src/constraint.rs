//! Timing-constraint records handed to the packaging collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{format_hz, Hz};
use crate::signal::SignalRef;

/// A single timing constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Constraint {
    /// Period constraint on a clock net.
    Period { clock: SignalRef, frequency: Hz },
    /// No synchronous timing relationship between the two clocks.
    FalsePath { from: SignalRef, to: SignalRef },
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Period { clock, frequency } => {
                write!(f, "period {clock} @ {} MHz", format_hz(*frequency))
            }
            Constraint::FalsePath { from, to } => write!(f, "false-path {from} -> {to}"),
        }
    }
}

/// Ordered, duplicate-free list of constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintSet {
    items: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a constraint. Returns `false` if an identical one already existed.
    pub fn add(&mut self, constraint: Constraint) -> bool {
        if self.items.contains(&constraint) {
            return false;
        }
        self.items.push(constraint);
        true
    }

    pub fn add_period(&mut self, clock: SignalRef, frequency: Hz) -> bool {
        self.add(Constraint::Period { clock, frequency })
    }

    pub fn add_false_path(&mut self, from: SignalRef, to: SignalRef) -> bool {
        self.add(Constraint::FalsePath { from, to })
    }

    /// Whether a false path between `a` and `b` exists, in either direction.
    pub fn has_false_path(&self, a: &SignalRef, b: &SignalRef) -> bool {
        self.items.iter().any(|c| match c {
            Constraint::FalsePath { from, to } => {
                (from == a && to == b) || (from == b && to == a)
            }
            _ => false,
        })
    }

    /// Period constraint recorded for `clock`, if any.
    pub fn period_of(&self, clock: &SignalRef) -> Option<Hz> {
        self.items.iter().find_map(|item| match item {
            Constraint::Period { clock: c, frequency } if c == clock => Some(*frequency),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
