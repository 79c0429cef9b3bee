//! Signal references and reset expressions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A reference to a named net in the generated design (e.g. `ps7.fclk_reset0_n`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalRef(String);

impl SignalRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignalRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Combinational expression driving a reset.
///
/// Kept symbolic so the packaging collaborator can lower it to HDL and so
/// tests can assert on its structure instead of on generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetExpr {
    /// A single net.
    Signal(SignalRef),
    /// Logical negation.
    Not(Box<ResetExpr>),
    /// Logical OR of all terms.
    Or(Vec<ResetExpr>),
}

impl ResetExpr {
    pub fn signal(name: impl Into<String>) -> Self {
        ResetExpr::Signal(SignalRef::new(name))
    }

    pub fn not(inner: ResetExpr) -> Self {
        ResetExpr::Not(Box::new(inner))
    }

    /// OR two expressions, flattening nested ORs.
    pub fn or(self, other: ResetExpr) -> Self {
        let mut terms = match self {
            ResetExpr::Or(terms) => terms,
            e => vec![e],
        };
        match other {
            ResetExpr::Or(more) => terms.extend(more),
            e => terms.push(e),
        }
        ResetExpr::Or(terms)
    }

    /// Top-level OR terms (a non-OR expression is its own single term).
    pub fn terms(&self) -> Vec<&ResetExpr> {
        match self {
            ResetExpr::Or(terms) => terms.iter().collect(),
            e => vec![e],
        }
    }

    /// Whether `signal` is one of the top-level OR terms, un-negated.
    pub fn has_term(&self, signal: &SignalRef) -> bool {
        self.terms()
            .iter()
            .any(|t| matches!(t, ResetExpr::Signal(s) if s == signal))
    }

    /// Whether `signal` appears anywhere in the expression.
    pub fn references(&self, signal: &SignalRef) -> bool {
        match self {
            ResetExpr::Signal(s) => s == signal,
            ResetExpr::Not(inner) => inner.references(signal),
            ResetExpr::Or(terms) => terms.iter().any(|t| t.references(signal)),
        }
    }
}

impl fmt::Display for ResetExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetExpr::Signal(s) => write!(f, "{s}"),
            ResetExpr::Not(inner) => write!(f, "~{inner}"),
            ResetExpr::Or(terms) => {
                let parts: Vec<_> = terms.iter().map(|t| t.to_string()).collect();
                write!(f, "({})", parts.join(" | "))
            }
        }
    }
}
