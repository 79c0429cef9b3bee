//! The clock tree under construction: domains, synthesis blocks and constraints.

use log::debug;

use socweave_core::{ClockDomain, ConstraintSet, SignalRef};

use crate::error::{ClockError, Result};
use crate::synthesis::FrequencySynthesisBlock;

/// All clock domains and synthesis blocks of one build.
///
/// Adding a domain records its period constraint; adding a block records the
/// period of its input clock.
#[derive(Debug, Clone)]
pub struct ClockTree {
    soft_reset: SignalRef,
    domains: Vec<ClockDomain>,
    blocks: Vec<FrequencySynthesisBlock>,
    constraints: ConstraintSet,
}

impl ClockTree {
    /// A tree whose first domain is the system domain.
    pub fn new(soft_reset: SignalRef, system: ClockDomain) -> Self {
        let mut constraints = ConstraintSet::new();
        constraints.add_period(system.clock.clone(), system.frequency);
        Self {
            soft_reset,
            domains: vec![system],
            blocks: Vec::new(),
            constraints,
        }
    }

    /// Externally requested soft reset.
    pub fn soft_reset(&self) -> &SignalRef {
        &self.soft_reset
    }

    pub fn system(&self) -> &ClockDomain {
        // The system domain is inserted by `new` and never removed.
        &self.domains[0]
    }

    pub fn domain(&self, name: &str) -> Option<&ClockDomain> {
        self.domains.iter().find(|d| d.name == name)
    }

    pub fn domains(&self) -> &[ClockDomain] {
        &self.domains
    }

    pub fn add_domain(&mut self, domain: ClockDomain) -> Result<()> {
        if self.domain(&domain.name).is_some() {
            return Err(ClockError::DuplicateDomain { name: domain.name });
        }
        debug!("clock domain {domain}");
        self.constraints
            .add_period(domain.clock.clone(), domain.frequency);
        self.domains.push(domain);
        Ok(())
    }

    pub fn blocks(&self) -> &[FrequencySynthesisBlock] {
        &self.blocks
    }

    pub fn block_mut(&mut self, name: &str) -> Option<&mut FrequencySynthesisBlock> {
        self.blocks.iter_mut().find(|b| b.name() == name)
    }

    /// Name for the next synthesis block ("pll0", "pll1", ...).
    pub fn next_block_name(&self) -> String {
        format!("pll{}", self.blocks.len())
    }

    pub fn add_block(&mut self, block: FrequencySynthesisBlock) {
        if let Some(input) = block.input() {
            self.constraints
                .add_period(input.signal.clone(), input.frequency);
        }
        self.blocks.push(block);
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn add_false_path(&mut self, from: SignalRef, to: SignalRef) {
        debug!("false path {from} <-> {to}");
        self.constraints.add_false_path(from, to);
    }

    /// Consume the tree into its domains, blocks and constraints.
    pub fn into_parts(self) -> (Vec<ClockDomain>, Vec<FrequencySynthesisBlock>, ConstraintSet) {
        (self.domains, self.blocks, self.constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socweave_core::{ResetExpr, MHZ};

    fn tree() -> ClockTree {
        ClockTree::new(
            "crg.rst".into(),
            ClockDomain::new("sys", "ps7.fclk0".into(), 100 * MHZ, ResetExpr::signal("rst")),
        )
    }

    #[test]
    fn system_domain_is_constrained() {
        let t = tree();
        assert_eq!(t.system().name, "sys");
        assert_eq!(t.constraints().period_of(&"ps7.fclk0".into()), Some(100 * MHZ));
    }

    #[test]
    fn duplicate_domain_rejected() {
        let mut t = tree();
        let dup = ClockDomain::new("sys", "x".into(), 1, ResetExpr::signal("rst"));
        assert!(matches!(t.add_domain(dup), Err(ClockError::DuplicateDomain { .. })));
        assert_eq!(t.domains().len(), 1);
    }

    #[test]
    fn block_names_are_sequential() {
        let t = tree();
        assert_eq!(t.next_block_name(), "pll0");
    }
}
