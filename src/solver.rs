//! Main solver API
//!
//! [`Solver`] owns one engine instance together with the name registry and
//! the translator. It tracks whether a solve has happened yet (which freezes
//! the set of variable names), runs incremental re-solves under assumptions,
//! and reads models back as sorted name lists.

use crate::engine::{DefaultEngine, PbEngine};
use crate::translator::{Coeffs, RelOp, Translator};
use crate::vars::{Registry, VarId, VarName};
use crate::{PbError, Result};
use std::fmt;

/// Solver options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Largest group that `at_most_one` encodes pairwise (default: 5)
    ///
    /// Pairwise exclusion needs O(n²) clauses but propagates fastest.
    /// Larger groups switch to the commander encoding.
    pub pairwise_limit: usize,
    /// Group size of the commander encoding (default: 3)
    pub commander_group: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            pairwise_limit: 5,
            commander_group: 3,
        }
    }
}

impl Options {
    /// Checks that the at-most-one recursion terminates
    pub fn validate(&self) -> Result<()> {
        if self.commander_group < 2 {
            return Err(PbError::Validation(format!(
                "commander_group must be at least 2, got {}",
                self.commander_group
            )));
        }
        if self.pairwise_limit < self.commander_group {
            return Err(PbError::Validation(format!(
                "pairwise_limit ({}) must be at least commander_group ({})",
                self.pairwise_limit, self.commander_group
            )));
        }
        Ok(())
    }
}

/// Guard variable of a conditional scope
///
/// Assuming the guard true activates everything added inside the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guard(VarId);

impl Guard {
    /// Engine id of the guard variable
    pub fn id(self) -> VarId {
        self.0
    }
}

/// Names of the variables that are true in a model, sorted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solution {
    names: Vec<String>,
}

impl Solution {
    /// Builds a solution from true variable names
    pub fn new(mut names: Vec<String>) -> Self {
        names.sort();
        names.dedup();
        Self { names }
    }

    /// The true variables in sorted order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether `name` is true in this solution
    pub fn contains(&self, name: &str) -> bool {
        self.names
            .binary_search_by(|probe| probe.as_str().cmp(name))
            .is_ok()
    }

    /// Number of true variables
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no variable is true
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over the true variables
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Consumes the solution, returning the names
    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.join(", "))
    }
}

impl IntoIterator for Solution {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

/// Counters collected over the solver's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    num_variables: usize,
    num_engine_variables: usize,
    num_clauses: usize,
    num_constraints: usize,
    num_solves: usize,
}

impl Statistics {
    /// Registered variables, anonymous ones included
    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    /// Variables known to the engine, guards and encoder auxiliaries included
    pub fn num_engine_variables(&self) -> usize {
        self.num_engine_variables
    }

    /// Clauses submitted
    pub fn num_clauses(&self) -> usize {
        self.num_clauses
    }

    /// Linear constraints submitted
    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    /// Solve calls that reached the engine
    pub fn num_solves(&self) -> usize {
        self.num_solves
    }
}

/// Pseudo-boolean solver over named variables (uses batsat by default)
pub struct Solver<E = DefaultEngine> {
    engine: E,
    registry: Registry,
    translator: Translator,
    options: Options,
    num_solves: usize,
}

impl Solver<DefaultEngine> {
    /// Creates a solver with the default backend and options
    pub fn new() -> Self {
        Self::with_engine(DefaultEngine::default())
    }
}

impl Default for Solver<DefaultEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PbEngine> Solver<E> {
    /// Creates a solver on top of the given engine with default options
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            registry: Registry::new(),
            translator: Translator::new(),
            options: Options::default(),
            num_solves: 0,
        }
    }

    /// Creates a solver on top of the given engine
    pub fn with_options(engine: E, options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            ..Self::with_engine(engine)
        })
    }

    /// Adds the clause `(p1 ∨ … ∨ pn ∨ ¬n1 ∨ … ∨ ¬nm)`
    ///
    /// This is the only way plain clauses introduce new variables.
    pub fn add_clause<S: AsRef<str>>(&mut self, positives: &[S], negatives: &[S]) -> Result<()> {
        self.translator
            .add_clause(&mut self.registry, &mut self.engine, positives, negatives)
    }

    /// Adds the linear constraint `Σ coeffs[i]·vars[i] <op> rhs`
    ///
    /// `coeffs` is either one coefficient for every variable or a list as
    /// long as `vars`. `op` is one of `<`, `<=`, `=`, `>=`, `>`.
    pub fn add_constraint<S: AsRef<str>>(
        &mut self,
        vars: &[S],
        coeffs: impl Into<Coeffs>,
        op: &str,
        rhs: i64,
    ) -> Result<()> {
        let op: RelOp = op.parse()?;
        self.add_relation(vars, &coeffs.into(), op, rhs)
    }

    pub(crate) fn add_relation<S: AsRef<str>>(
        &mut self,
        vars: &[S],
        coeffs: &Coeffs,
        op: RelOp,
        rhs: i64,
    ) -> Result<()> {
        self.translator.add_constraint(
            &mut self.registry,
            &mut self.engine,
            vars,
            coeffs,
            op,
            rhs,
        )
    }

    /// Creates a fresh anonymous variable and returns its name
    ///
    /// Anonymous variables never show up in solutions.
    pub fn gen_var(&mut self) -> Result<String> {
        let var = self.registry.generate(&mut self.engine)?;
        Ok(var.name().to_string())
    }

    /// Searches for a model of everything added so far
    ///
    /// The first call runs a full search; later calls search incrementally.
    /// After the first call no new variable names are accepted, whatever the
    /// outcome. Returns `None` if unsatisfiable.
    pub fn solve(&mut self) -> Result<Option<Solution>> {
        let satisfiable = if self.registry.is_sealed() {
            self.engine.solve_again(None)?
        } else {
            self.registry.seal();
            self.engine.solve()?
        };
        self.num_solves += 1;
        tracing::debug!(satisfiable, solves = self.num_solves, "solve");
        self.finish(satisfiable)
    }

    /// Solves again assuming the known variable `name` is true
    pub fn solve_assuming(&mut self, name: &str) -> Result<Option<Solution>> {
        self.require_solved()?;
        let name = VarName::parse(name)?;
        let id = self
            .registry
            .id_of(name.as_str())
            .ok_or_else(|| PbError::Usage(format!("unknown variable '{name}'")))?;
        self.solve_again_assuming(id)
    }

    /// Runs `body` inside a conditional scope and returns the scope's guard
    ///
    /// Every clause and constraint `body` adds only holds while the guard is
    /// assumed true. The scope is closed even when `body` fails.
    pub fn conditionally<F>(&mut self, body: F) -> Result<Guard>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let guard = self.engine.enter_conditional();
        let outcome = body(self);
        self.engine.exit_conditional();
        outcome.map(|()| Guard(guard))
    }

    /// Solves again with the constraints of a conditional scope in force
    pub fn solve_under(&mut self, guard: Guard) -> Result<Option<Solution>> {
        self.require_solved()?;
        self.solve_again_assuming(guard.id())
    }

    /// Tries a provisional constraint
    ///
    /// The constraint is added in its own conditional scope and the solver
    /// searches under its guard. If no model exists the guard is never
    /// assumed again, so the constraint stays inert.
    pub fn solve_with_constraint<S: AsRef<str>>(
        &mut self,
        vars: &[S],
        coeffs: impl Into<Coeffs>,
        op: &str,
        rhs: i64,
    ) -> Result<Option<Solution>> {
        let op: RelOp = op.parse()?;
        self.solve_with_relation(vars, &coeffs.into(), op, rhs)
    }

    pub(crate) fn solve_with_relation<S: AsRef<str>>(
        &mut self,
        vars: &[S],
        coeffs: &Coeffs,
        op: RelOp,
        rhs: i64,
    ) -> Result<Option<Solution>> {
        self.require_solved()?;
        let guard = self.conditionally(|solver| solver.add_relation(vars, coeffs, op, rhs))?;
        self.solve_under(guard)
    }

    fn solve_again_assuming(&mut self, assumption: VarId) -> Result<Option<Solution>> {
        let satisfiable = self.engine.solve_again(Some(assumption))?;
        self.num_solves += 1;
        tracing::debug!(satisfiable, %assumption, "solve under assumption");
        self.finish(satisfiable)
    }

    fn require_solved(&self) -> Result<()> {
        if self.registry.is_sealed() {
            Ok(())
        } else {
            Err(PbError::Usage("must already have called solve()".into()))
        }
    }

    fn finish(&mut self, satisfiable: bool) -> Result<Option<Solution>> {
        if satisfiable {
            self.read_solution().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Maps the engine's bitmap back to sorted names, dropping anonymous
    /// and engine-internal variables
    fn read_solution(&mut self) -> Result<Solution> {
        let registry = &self.registry;
        let mut names = Vec::new();
        self.translator.read_solution(&self.engine, |idx| {
            if let Some(name) = registry.name_of(VarId::new(idx)) {
                if !name.is_anonymous() {
                    names.push(name.to_string());
                }
            }
        })?;
        Ok(Solution::new(names))
    }

    /// Whether a solve has already happened
    pub fn has_solved(&self) -> bool {
        self.registry.is_sealed()
    }

    /// The solver's options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The underlying engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The name registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_and_engine(&mut self) -> (&mut Registry, &mut E) {
        (&mut self.registry, &mut self.engine)
    }

    /// Counters collected so far
    pub fn statistics(&self) -> Statistics {
        Statistics {
            num_variables: self.registry.len(),
            num_engine_variables: self.engine.num_variables(),
            num_clauses: self.translator.num_clauses(),
            num_constraints: self.translator.num_constraints(),
            num_solves: self.num_solves,
        }
    }
}
