//! Engine trait and implementations
//!
//! The engine is the component that actually searches for models. This layer
//! only talks to it through [`PbEngine`]: variables are opaque [`VarId`]s,
//! clauses are split into positive and negative literals, and linear
//! constraints carry a [`RelOp`].

pub mod rustsat_adapter;

pub use rustsat_adapter::RustSatEngine;

use crate::translator::RelOp;
use crate::vars::VarId;
use crate::{PbError, Result};
use std::collections::VecDeque;

/// Backend used by [`crate::Solver::new`]
pub type DefaultEngine = RustSatEngine<rustsat_batsat::BasicSolver>;

/// Core pseudo-boolean engine trait
///
/// All calls are blocking. Clauses and constraints take effect in submission
/// order and stay in force for every later solve.
pub trait PbEngine {
    /// Allocates a fresh variable
    fn new_var(&mut self) -> VarId;

    /// Adds the clause `(p1 ∨ … ∨ pn ∨ ¬n1 ∨ … ∨ ¬nm)`
    fn add_clause(&mut self, positives: &[VarId], negatives: &[VarId]) -> Result<()>;

    /// Adds the linear constraint `Σ coeffs[i]·vars[i] <op> rhs`
    ///
    /// `vars` and `coeffs` have the same length.
    fn add_constraint(&mut self, vars: &[VarId], coeffs: &[u64], op: RelOp, rhs: u64)
        -> Result<()>;

    /// Runs the first full search
    ///
    /// Returns true if satisfiable.
    fn solve(&mut self) -> Result<bool>;

    /// Searches again, reusing learned state, optionally assuming one
    /// variable true for this search only
    fn solve_again(&mut self, assumption: Option<VarId>) -> Result<bool>;

    /// Opens a conditional scope and returns its guard
    ///
    /// Everything added until [`PbEngine::exit_conditional`] only holds when
    /// the guard is true.
    fn enter_conditional(&mut self) -> VarId;

    /// Closes the current conditional scope
    fn exit_conditional(&mut self);

    /// Number of variables known to the engine, including internal ones
    fn num_variables(&self) -> usize;

    /// Writes the value of every variable in the last model into `bitmap`
    ///
    /// `bitmap[i]` receives the value of variable `i`. Only valid after a
    /// satisfiable solve.
    fn read_solution(&self, bitmap: &mut [bool]) -> Result<()>;
}

/// One call received by a [`MockEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// `new_var` returned this id
    NewVar(VarId),
    /// A clause, with the guard of the enclosing conditional scope
    Clause {
        /// Positive literals
        positives: Vec<VarId>,
        /// Negative literals
        negatives: Vec<VarId>,
        /// Guard of the open conditional scope, if any
        guard: Option<VarId>,
    },
    /// A linear constraint, with its relation code
    Constraint {
        /// Variables
        vars: Vec<VarId>,
        /// Coefficients
        coeffs: Vec<u64>,
        /// Integer relation code (see [`RelOp::code`])
        op_code: i8,
        /// Right-hand side
        rhs: u64,
        /// Guard of the open conditional scope, if any
        guard: Option<VarId>,
    },
    /// First full search
    Solve,
    /// Incremental search
    SolveAgain(Option<VarId>),
    /// Conditional scope opened with this guard
    EnterConditional(VarId),
    /// Conditional scope closed
    ExitConditional,
}

/// A recording engine for tests and encoding inspection
///
/// It doesn't search. Every call is recorded, and solves answer from a
/// script of models pushed with [`MockEngine::push_model`] and
/// [`MockEngine::push_unsat`]. Once the script runs out, solves report a
/// satisfiable all-false model.
#[derive(Debug, Default)]
pub struct MockEngine {
    num_vars: u32,
    calls: Vec<EngineCall>,
    script: VecDeque<Option<Vec<VarId>>>,
    model: Option<Vec<VarId>>,
    guard: Option<VarId>,
}

impl MockEngine {
    /// Creates a new mock engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a satisfiable answer whose model makes exactly `true_vars` true
    pub fn push_model(&mut self, true_vars: impl IntoIterator<Item = VarId>) {
        self.script.push_back(Some(true_vars.into_iter().collect()));
    }

    /// Queues an unsatisfiable answer
    pub fn push_unsat(&mut self) {
        self.script.push_back(None);
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Clauses received so far as `(positives, negatives)` pairs
    pub fn clauses(&self) -> impl Iterator<Item = (&[VarId], &[VarId])> + '_ {
        self.calls.iter().filter_map(|call| match call {
            EngineCall::Clause {
                positives,
                negatives,
                ..
            } => Some((positives.as_slice(), negatives.as_slice())),
            _ => None,
        })
    }

    /// Number of clauses received
    pub fn num_clauses(&self) -> usize {
        self.clauses().count()
    }

    /// Number of linear constraints received
    pub fn num_constraints(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, EngineCall::Constraint { .. }))
            .count()
    }

    /// Number of variables handed out by `new_var` and `enter_conditional`
    pub fn num_vars_allocated(&self) -> u32 {
        self.num_vars
    }

    fn fresh(&mut self) -> VarId {
        let id = VarId::new(self.num_vars);
        self.num_vars += 1;
        id
    }

    fn answer(&mut self) -> bool {
        let next = self.script.pop_front().unwrap_or_else(|| Some(Vec::new()));
        let satisfiable = next.is_some();
        self.model = next;
        satisfiable
    }
}

impl PbEngine for MockEngine {
    fn new_var(&mut self) -> VarId {
        let id = self.fresh();
        self.calls.push(EngineCall::NewVar(id));
        id
    }

    fn add_clause(&mut self, positives: &[VarId], negatives: &[VarId]) -> Result<()> {
        self.calls.push(EngineCall::Clause {
            positives: positives.to_vec(),
            negatives: negatives.to_vec(),
            guard: self.guard,
        });
        Ok(())
    }

    fn add_constraint(
        &mut self,
        vars: &[VarId],
        coeffs: &[u64],
        op: RelOp,
        rhs: u64,
    ) -> Result<()> {
        self.calls.push(EngineCall::Constraint {
            vars: vars.to_vec(),
            coeffs: coeffs.to_vec(),
            op_code: op.code(),
            rhs,
            guard: self.guard,
        });
        Ok(())
    }

    fn solve(&mut self) -> Result<bool> {
        self.calls.push(EngineCall::Solve);
        Ok(self.answer())
    }

    fn solve_again(&mut self, assumption: Option<VarId>) -> Result<bool> {
        self.calls.push(EngineCall::SolveAgain(assumption));
        Ok(self.answer())
    }

    fn enter_conditional(&mut self) -> VarId {
        let guard = self.fresh();
        self.guard = Some(guard);
        self.calls.push(EngineCall::EnterConditional(guard));
        guard
    }

    fn exit_conditional(&mut self) {
        self.guard = None;
        self.calls.push(EngineCall::ExitConditional);
    }

    fn num_variables(&self) -> usize {
        self.num_vars as usize
    }

    fn read_solution(&self, bitmap: &mut [bool]) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PbError::Engine("no model available".into()))?;
        bitmap.fill(false);
        for id in model {
            if let Some(bit) = bitmap.get_mut(id.index() as usize) {
                *bit = true;
            }
        }
        Ok(())
    }
}
