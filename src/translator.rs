//! Clause and linear-constraint translation
//!
//! Requests arrive with caller-supplied names and plain integers. Everything
//! is validated up front, so an invalid request never reaches the engine.
//! Names are then registered and the resulting ids are marshaled through a
//! scoped transfer buffer into the engine call.

pub mod arena;

pub use arena::{Scratch, ScratchArena};

use crate::engine::PbEngine;
use crate::vars::{Registry, VarName};
use crate::{PbError, Result};
use std::fmt;
use std::str::FromStr;

/// Relational operator of a linear constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `=`
    Eq,
    /// `>=`
    Ge,
    /// `>`
    Gt,
}

impl RelOp {
    /// Integer code used at the engine boundary
    pub fn code(self) -> i8 {
        match self {
            RelOp::Lt => -2,
            RelOp::Le => -1,
            RelOp::Eq => 0,
            RelOp::Ge => 1,
            RelOp::Gt => 2,
        }
    }

    /// Inverse of [`RelOp::code`]
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -2 => Some(RelOp::Lt),
            -1 => Some(RelOp::Le),
            0 => Some(RelOp::Eq),
            1 => Some(RelOp::Ge),
            2 => Some(RelOp::Gt),
            _ => None,
        }
    }

    /// The operator symbol
    pub fn symbol(self) -> &'static str {
        match self {
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Eq => "=",
            RelOp::Ge => ">=",
            RelOp::Gt => ">",
        }
    }

    /// Evaluates `lhs <op> rhs`
    pub fn holds(self, lhs: u64, rhs: u64) -> bool {
        match self {
            RelOp::Lt => lhs < rhs,
            RelOp::Le => lhs <= rhs,
            RelOp::Eq => lhs == rhs,
            RelOp::Ge => lhs >= rhs,
            RelOp::Gt => lhs > rhs,
        }
    }
}

impl FromStr for RelOp {
    type Err = PbError;

    fn from_str(symbol: &str) -> Result<Self> {
        match symbol {
            "<" => Ok(RelOp::Lt),
            "<=" => Ok(RelOp::Le),
            "=" => Ok(RelOp::Eq),
            ">=" => Ok(RelOp::Ge),
            ">" => Ok(RelOp::Gt),
            other => Err(PbError::Validation(format!(
                "unknown relational operator {other:?} (expected one of <, <=, =, >=, >)"
            ))),
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Coefficients of a linear constraint
///
/// A scalar is broadcast to every variable. A list must be exactly as long
/// as the variable list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coeffs {
    /// Same coefficient for every variable
    Scalar(i64),
    /// One coefficient per variable
    List(Vec<i64>),
}

impl Coeffs {
    /// Broadcasts and validates against `len` variables
    pub fn resolve(&self, len: usize) -> Result<Vec<u64>> {
        match self {
            Coeffs::Scalar(c) => {
                let c = whole_number(*c, "coefficient")?;
                Ok(vec![c; len])
            }
            Coeffs::List(list) => {
                if list.len() != len {
                    return Err(PbError::Validation(format!(
                        "{} coefficients given for {len} variables",
                        list.len()
                    )));
                }
                list.iter()
                    .map(|&c| whole_number(c, "coefficient"))
                    .collect()
            }
        }
    }
}

impl From<i64> for Coeffs {
    fn from(c: i64) -> Self {
        Coeffs::Scalar(c)
    }
}

impl From<Vec<i64>> for Coeffs {
    fn from(list: Vec<i64>) -> Self {
        Coeffs::List(list)
    }
}

impl From<&[i64]> for Coeffs {
    fn from(list: &[i64]) -> Self {
        Coeffs::List(list.to_vec())
    }
}

impl<const N: usize> From<[i64; N]> for Coeffs {
    fn from(list: [i64; N]) -> Self {
        Coeffs::List(list.to_vec())
    }
}

/// Checks that `value` is a non-negative integer
pub fn whole_number(value: i64, what: &str) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| PbError::Validation(format!("{what} must be non-negative, got {value}")))
}

/// Parses every name, failing on the first invalid one
pub fn parse_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<VarName>> {
    names.iter().map(|n| VarName::parse(n.as_ref())).collect()
}

/// Translates validated requests into engine calls
///
/// Owns the transfer arena and the diagnostic counters.
#[derive(Default)]
pub struct Translator {
    arena: ScratchArena,
    num_clauses: usize,
    num_constraints: usize,
}

impl Translator {
    /// Creates a new translator
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the clause `(p1 ∨ … ∨ pn ∨ ¬n1 ∨ … ∨ ¬nm)`
    pub fn add_clause<E: PbEngine + ?Sized, S: AsRef<str>>(
        &mut self,
        registry: &mut Registry,
        engine: &mut E,
        positives: &[S],
        negatives: &[S],
    ) -> Result<()> {
        let positives = parse_names(positives)?;
        let negatives = parse_names(negatives)?;

        let scratch = self.arena.scope();
        let mut pos_ids = scratch.vec(positives.len());
        for name in &positives {
            pos_ids.push(registry.register(name, engine)?.id());
        }
        let mut neg_ids = scratch.vec(negatives.len());
        for name in &negatives {
            neg_ids.push(registry.register(name, engine)?.id());
        }

        tracing::trace!(
            positives = positives.len(),
            negatives = negatives.len(),
            "add clause"
        );
        engine.add_clause(&pos_ids, &neg_ids)?;
        self.num_clauses += 1;
        Ok(())
    }

    /// Adds the linear constraint `Σ coeffs[i]·vars[i] <op> rhs`
    pub fn add_constraint<E: PbEngine + ?Sized, S: AsRef<str>>(
        &mut self,
        registry: &mut Registry,
        engine: &mut E,
        vars: &[S],
        coeffs: &Coeffs,
        op: RelOp,
        rhs: i64,
    ) -> Result<()> {
        let names = parse_names(vars)?;
        let coeffs = coeffs.resolve(names.len())?;
        let rhs = whole_number(rhs, "right-hand side")?;

        let scratch = self.arena.scope();
        let mut ids = scratch.vec(names.len());
        for name in &names {
            ids.push(registry.register(name, engine)?.id());
        }
        let coeffs = scratch.slice_from(coeffs);

        tracing::trace!(vars = names.len(), op = %op, rhs, "add constraint");
        engine.add_constraint(&ids, coeffs, op, rhs)?;
        self.num_constraints += 1;
        Ok(())
    }

    /// Reads the last model back as a bitmap indexed by engine id
    ///
    /// `visit` is called with the index of every true variable.
    pub fn read_solution<E: PbEngine + ?Sized>(
        &mut self,
        engine: &E,
        mut visit: impl FnMut(u32),
    ) -> Result<()> {
        let scratch = self.arena.scope();
        let bitmap = scratch.bitmap(engine.num_variables());
        engine.read_solution(bitmap)?;
        for (idx, _) in bitmap.iter().enumerate().filter(|(_, on)| **on) {
            visit(idx as u32);
        }
        Ok(())
    }

    /// Clauses submitted so far
    pub fn num_clauses(&self) -> usize {
        self.num_clauses
    }

    /// Linear constraints submitted so far
    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    /// The transfer arena
    pub fn arena(&self) -> &ScratchArena {
        &self.arena
    }
}
