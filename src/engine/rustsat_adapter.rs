//! Adapter for rustsat solver backends
//!
//! Realises [`PbEngine`] on top of any rustsat solver with assumption
//! support. Linear constraints are lowered to CNF with rustsat's default PB
//! encoder. Conditional scopes are implemented by appending the negated guard
//! to every clause produced inside the scope.

use super::PbEngine;
use crate::translator::RelOp;
use crate::vars::VarId;
use crate::{PbError, Result};
use rustsat::encodings::pb::default_encode_pb_constraint;
use rustsat::instances::{BasicVarManager, Cnf, ManageVars};
use rustsat::solvers::{SolveIncremental, SolveStats, SolverResult};
use rustsat::types::constraints::PbConstraint;
use rustsat::types::{Assignment, Clause, Lit, TernaryVal, Var};

/// Adapter that wraps rustsat solvers to implement [`PbEngine`]
///
/// # Example
///
/// ```ignore
/// use rustsat_batsat::BasicSolver;
/// let engine = RustSatEngine::new(BasicSolver::default());
/// ```
pub struct RustSatEngine<S> {
    solver: S,
    vars: BasicVarManager,
    guard: Option<Lit>,
    model: Option<Assignment>,
    num_clauses: usize,
}

impl<S> RustSatEngine<S> {
    /// Creates a new adapter wrapping the given solver
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            vars: BasicVarManager::default(),
            guard: None,
            model: None,
            num_clauses: 0,
        }
    }

    /// Number of CNF clauses handed to the backend, including the ones
    /// produced by PB lowering
    pub fn num_clauses(&self) -> usize {
        self.num_clauses
    }
}

impl<S: Default> Default for RustSatEngine<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

fn lit(id: VarId, positive: bool) -> Lit {
    let var = Var::new(id.index());
    if positive {
        var.pos_lit()
    } else {
        var.neg_lit()
    }
}

fn engine_error(err: impl std::fmt::Display) -> PbError {
    PbError::Engine(err.to_string())
}

fn weight(value: u64) -> Result<isize> {
    isize::try_from(value)
        .map_err(|_| PbError::Engine(format!("weight {value} exceeds the encoder range")))
}

fn total_weight(terms: &[(Lit, u64)]) -> Result<u64> {
    terms.iter().try_fold(0u64, |sum, &(_, w)| {
        sum.checked_add(w)
            .ok_or_else(|| PbError::Engine("sum of coefficients overflows".into()))
    })
}

impl<S: SolveIncremental + SolveStats> RustSatEngine<S> {
    fn push_clause(&mut self, mut lits: Vec<Lit>) -> Result<()> {
        if let Some(guard) = self.guard {
            lits.push(!guard);
        }
        self.num_clauses += 1;
        self.solver
            .add_clause(Clause::from(&lits[..]))
            .map_err(engine_error)
    }

    /// `Σ w·l ≤ bound`; `None` stands for a bound below zero
    fn at_most(&mut self, terms: &[(Lit, u64)], bound: Option<u64>) -> Result<()> {
        let Some(bound) = bound else {
            return self.push_clause(Vec::new());
        };
        if total_weight(terms)? <= bound {
            return Ok(());
        }

        let weighted = terms
            .iter()
            .map(|&(l, w)| Ok((l, weight(w)?)))
            .collect::<Result<Vec<_>>>()?;
        let constraint = PbConstraint::new_ub(weighted, weight(bound)?);

        let mut cnf = Cnf::new();
        default_encode_pb_constraint(constraint, &mut cnf, &mut self.vars)
            .map_err(engine_error)?;
        for clause in cnf {
            self.push_clause(clause.into_iter().collect())?;
        }
        Ok(())
    }

    /// `Σ w·l ≥ bound`, rewritten as an upper bound over the negated literals
    fn at_least(&mut self, terms: &[(Lit, u64)], bound: u64) -> Result<()> {
        if bound == 0 {
            return Ok(());
        }
        let total = total_weight(terms)?;
        if bound > total {
            return self.push_clause(Vec::new());
        }
        let negated: Vec<(Lit, u64)> = terms.iter().map(|&(l, w)| (!l, w)).collect();
        self.at_most(&negated, Some(total - bound))
    }

    fn run(&mut self, assumptions: &[Lit]) -> Result<bool> {
        let result = if assumptions.is_empty() {
            self.solver.solve()
        } else {
            self.solver.solve_assumps(assumptions)
        }
        .map_err(engine_error)?;

        match result {
            SolverResult::Sat => {
                self.model = Some(self.solver.full_solution().map_err(engine_error)?);
                Ok(true)
            }
            SolverResult::Unsat => {
                self.model = None;
                Ok(false)
            }
            SolverResult::Interrupted => Err(PbError::Engine("search was interrupted".into())),
        }
    }
}

impl<S: SolveIncremental + SolveStats> PbEngine for RustSatEngine<S> {
    fn new_var(&mut self) -> VarId {
        VarId::new(self.vars.new_var().idx() as u32)
    }

    fn add_clause(&mut self, positives: &[VarId], negatives: &[VarId]) -> Result<()> {
        let lits = positives
            .iter()
            .map(|&v| lit(v, true))
            .chain(negatives.iter().map(|&v| lit(v, false)))
            .collect();
        self.push_clause(lits)
    }

    fn add_constraint(
        &mut self,
        vars: &[VarId],
        coeffs: &[u64],
        op: RelOp,
        rhs: u64,
    ) -> Result<()> {
        // Zero coefficients never contribute.
        let terms: Vec<(Lit, u64)> = vars
            .iter()
            .zip(coeffs)
            .filter(|&(_, &c)| c > 0)
            .map(|(&v, &c)| (lit(v, true), c))
            .collect();

        match op {
            RelOp::Lt => self.at_most(&terms, rhs.checked_sub(1)),
            RelOp::Le => self.at_most(&terms, Some(rhs)),
            RelOp::Eq => {
                self.at_most(&terms, Some(rhs))?;
                self.at_least(&terms, rhs)
            }
            RelOp::Ge => self.at_least(&terms, rhs),
            RelOp::Gt => match rhs.checked_add(1) {
                Some(bound) => self.at_least(&terms, bound),
                None => self.push_clause(Vec::new()),
            },
        }
    }

    fn solve(&mut self) -> Result<bool> {
        self.run(&[])
    }

    fn solve_again(&mut self, assumption: Option<VarId>) -> Result<bool> {
        match assumption {
            Some(v) => self.run(&[lit(v, true)]),
            None => self.run(&[]),
        }
    }

    fn enter_conditional(&mut self) -> VarId {
        let guard = self.vars.new_var();
        self.guard = Some(guard.pos_lit());
        VarId::new(guard.idx() as u32)
    }

    fn exit_conditional(&mut self) {
        self.guard = None;
    }

    fn num_variables(&self) -> usize {
        self.vars.max_var().map_or(0, |v| v.idx() + 1)
    }

    fn read_solution(&self, bitmap: &mut [bool]) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PbError::Engine("no model available".into()))?;
        for (idx, bit) in bitmap.iter_mut().enumerate() {
            // Variables the backend never saw come back as don't-care.
            *bit = model.var_value(Var::new(idx as u32)) == TernaryVal::True;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustsat_batsat::BasicSolver;

    fn engine() -> RustSatEngine<BasicSolver> {
        RustSatEngine::new(BasicSolver::default())
    }

    fn model(engine: &RustSatEngine<BasicSolver>) -> Vec<bool> {
        let mut bitmap = vec![false; engine.num_variables()];
        engine.read_solution(&mut bitmap).unwrap();
        bitmap
    }

    #[test]
    fn test_batsat_clauses() {
        let mut engine = engine();
        let a = engine.new_var();
        let b = engine.new_var();

        engine.add_clause(&[a], &[]).unwrap();
        engine.add_clause(&[b], &[a]).unwrap();

        assert!(engine.solve().unwrap());
        assert_eq!(model(&engine), vec![true, true]);
    }

    #[test]
    fn test_batsat_unsat() {
        let mut engine = engine();
        let a = engine.new_var();

        engine.add_clause(&[a], &[]).unwrap();
        engine.add_clause(&[], &[a]).unwrap();

        assert!(!engine.solve().unwrap());
    }

    #[test]
    fn test_constraint_relations() {
        // Three indicators, weights 1, 2, 3
        for (op, rhs, feasible) in [
            (RelOp::Lt, 0, false),
            (RelOp::Le, 0, true),
            (RelOp::Eq, 4, true),
            (RelOp::Eq, 7, false),
            (RelOp::Ge, 6, true),
            (RelOp::Gt, 6, false),
            (RelOp::Gt, 5, true),
        ] {
            let mut engine = engine();
            let vars = [engine.new_var(), engine.new_var(), engine.new_var()];
            engine.add_constraint(&vars, &[1, 2, 3], op, rhs).unwrap();

            let sat = engine.solve().unwrap();
            assert_eq!(sat, feasible, "{op} {rhs}");
            if sat {
                let bits = model(&engine);
                let sum: u64 = [1, 2, 3]
                    .iter()
                    .zip(&bits)
                    .filter(|(_, on)| **on)
                    .map(|(w, _)| w)
                    .sum();
                assert!(op.holds(sum, rhs), "{sum} {op} {rhs}");
            }
        }
    }

    #[test]
    fn test_conditional_scope_is_soft() {
        let mut engine = engine();
        let a = engine.new_var();
        let b = engine.new_var();
        engine.add_clause(&[a, b], &[]).unwrap();
        assert!(engine.solve().unwrap());

        let guard = engine.enter_conditional();
        engine.add_constraint(&[a, b], &[1, 1], RelOp::Lt, 1).unwrap();
        engine.exit_conditional();

        // Under the guard the constraint contradicts (a ∨ b)
        assert!(!engine.solve_again(Some(guard)).unwrap());
        // Without it the constraint is inert
        assert!(engine.solve_again(None).unwrap());
    }

    #[test]
    fn test_assumption_is_temporary() {
        let mut engine = engine();
        let a = engine.new_var();
        let b = engine.new_var();
        engine.add_clause(&[], &[a, b]).unwrap();
        engine.add_clause(&[b], &[]).unwrap();
        assert!(engine.solve().unwrap());

        assert!(!engine.solve_again(Some(a)).unwrap());
        assert!(engine.solve_again(None).unwrap());
        assert!(model(&engine)[b.index() as usize]);
    }
}
