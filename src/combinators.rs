//! Boolean idioms
//!
//! Every combinator here is expressed purely in terms of
//! [`Solver::add_clause`] and [`Solver::gen_var`]; none of them talks to the
//! engine directly.

use crate::engine::PbEngine;
use crate::solver::Solver;
use crate::{PbError, Result};

fn names<S: AsRef<str>>(vars: &[S]) -> Vec<&str> {
    vars.iter().map(AsRef::as_ref).collect()
}

fn require_nonempty<S>(vars: &[S]) -> Result<()> {
    if vars.is_empty() {
        Err(PbError::Usage("at least one variable required".into()))
    } else {
        Ok(())
    }
}

impl<E: PbEngine> Solver<E> {
    /// Asserts `v`
    pub fn is_true(&mut self, v: &str) -> Result<()> {
        self.add_clause(&[v], &[])
    }

    /// Asserts `¬v`
    pub fn is_false(&mut self, v: &str) -> Result<()> {
        self.add_clause(&[], &[v])
    }

    /// Asserts `p → q`
    pub fn implies(&mut self, p: &str, q: &str) -> Result<()> {
        self.add_clause(&[q], &[p])
    }

    /// Asserts `p → ¬q`
    pub fn implies_not(&mut self, p: &str, q: &str) -> Result<()> {
        self.add_clause(&[], &[p, q])
    }

    /// Asserts `¬p → q`, i.e. `p ∨ q`
    pub fn not_p_implies_q(&mut self, p: &str, q: &str) -> Result<()> {
        self.add_clause(&[p, q], &[])
    }

    /// Asserts `¬p → ¬q`
    pub fn not_p_implies_not_q(&mut self, p: &str, q: &str) -> Result<()> {
        self.add_clause(&[p], &[q])
    }

    /// Asserts `x ↔ (v1 ∨ … ∨ vn)`
    pub fn equals_or<S: AsRef<str>>(&mut self, x: &str, vars: &[S]) -> Result<()> {
        let vars = names(vars);
        // x → (v1 ∨ … ∨ vn)
        self.add_clause(&vars, &[x])?;
        // (v1 ∨ … ∨ vn) → x
        for v in vars {
            self.implies(v, x)?;
        }
        Ok(())
    }

    /// Asserts that at least one of `vars` is true
    pub fn at_least_one<S: AsRef<str>>(&mut self, vars: &[S]) -> Result<()> {
        require_nonempty(vars)?;
        self.add_clause(&names(vars), &[])
    }

    /// Asserts that exactly one of `vars` is true
    pub fn exactly_one<S: AsRef<str>>(&mut self, vars: &[S]) -> Result<()> {
        require_nonempty(vars)?;
        self.at_most_one(vars)?;
        self.at_least_one(vars)
    }

    /// Asserts that at most one of `vars` is true
    ///
    /// Groups up to [`crate::Options::pairwise_limit`] get one clause
    /// `(¬vi ∨ ¬vj)` per pair. Larger groups use commander variables
    /// (Klieber & Kwon, 2007): split into consecutive groups of
    /// [`crate::Options::commander_group`], constrain each group
    /// recursively, introduce an anonymous commander `c ↔ OR(group)` per
    /// group, and constrain the commanders recursively. Recursion depth is
    /// logarithmic in `vars.len()` and the clause count is linear.
    pub fn at_most_one<S: AsRef<str>>(&mut self, vars: &[S]) -> Result<()> {
        require_nonempty(vars)?;
        let vars = names(vars);
        self.at_most_one_rec(&vars)
    }

    fn at_most_one_rec(&mut self, vars: &[&str]) -> Result<()> {
        let n = vars.len();
        if n <= 1 {
            return Ok(());
        }

        if n <= self.options().pairwise_limit {
            for a in 0..n {
                for b in a + 1..n {
                    self.add_clause(&[], &[vars[a], vars[b]])?;
                }
            }
            return Ok(());
        }

        let group_size = self.options().commander_group;
        let mut commanders = Vec::with_capacity(n.div_ceil(group_size));
        for group in vars.chunks(group_size) {
            self.at_most_one_rec(group)?;
            let commander = self.gen_var()?;
            self.equals_or(&commander, group)?;
            commanders.push(commander);
        }
        let commanders = names(&commanders);
        self.at_most_one_rec(&commanders)
    }
}
