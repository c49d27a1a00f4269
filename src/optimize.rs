//! Lexicographic minimization over cost vectors
//!
//! Each variable carries a vector of non-negative weights, one per cost
//! dimension. Dimensions are minimized in order: the optimizer keeps asking
//! for a strictly cheaper model under a provisional `<` constraint until none
//! exists, then pins that dimension's optimum with `=` before moving on.

use crate::engine::PbEngine;
use crate::solver::{Solution, Solver};
use crate::translator::{whole_number, Coeffs, RelOp};
use crate::vars::VarName;
use crate::{PbError, Result};
use std::collections::BTreeMap;

/// Weights per variable, one entry per cost dimension
///
/// Vectors may have different lengths; a missing entry weighs 0.
pub type CostVectorMap = BTreeMap<String, Vec<i64>>;

impl Solution {
    /// Cost of this solution in dimension `dimension`
    ///
    /// Sums the `dimension`-th weight of every variable in `costs` that is
    /// true here. Negative weights and sums beyond `u64` are validation
    /// errors.
    pub fn cost(&self, costs: &CostVectorMap, dimension: usize) -> Result<u64> {
        costs
            .iter()
            .filter(|(name, _)| self.contains(name))
            .filter_map(|(_, weights)| weights.get(dimension))
            .try_fold(0u64, |total, &weight| {
                total
                    .checked_add(whole_number(weight, "cost weight")?)
                    .ok_or_else(|| {
                        PbError::Validation(format!("cost of dimension {dimension} overflows"))
                    })
            })
    }
}

/// Cost variables and per-dimension weight columns
struct CostTable {
    vars: Vec<String>,
    columns: Vec<Vec<i64>>,
}

impl CostTable {
    fn new(costs: &CostVectorMap) -> Result<Self> {
        let num_dimensions = costs.values().map(Vec::len).max().unwrap_or(0);
        let mut columns = vec![Vec::with_capacity(costs.len()); num_dimensions];
        let mut totals = vec![0i64; num_dimensions];

        for (name, weights) in costs {
            VarName::parse(name)?;
            for (dimension, column) in columns.iter_mut().enumerate() {
                let weight = weights.get(dimension).copied().unwrap_or(0);
                whole_number(weight, "cost weight")?;
                totals[dimension] = totals[dimension].checked_add(weight).ok_or_else(|| {
                    PbError::Validation(format!("total cost of dimension {dimension} overflows"))
                })?;
                column.push(weight);
            }
        }

        Ok(Self {
            vars: costs.keys().cloned().collect(),
            columns,
        })
    }

    fn num_dimensions(&self) -> usize {
        self.columns.len()
    }

    fn cost(&self, solution: &Solution, dimension: usize) -> u64 {
        self.vars
            .iter()
            .zip(&self.columns[dimension])
            .filter(|(name, _)| solution.contains(name))
            .map(|(_, &weight)| weight.unsigned_abs())
            .sum()
    }
}

fn rhs(cost: u64) -> Result<i64> {
    i64::try_from(cost).map_err(|_| PbError::Validation(format!("cost {cost} out of range")))
}

impl<E: PbEngine> Solver<E> {
    /// Solves, then minimizes the cost dimensions of `costs` in order
    ///
    /// Replaces the first [`Solver::solve`]; calling it after a solve is a
    /// usage error. Returns `None` if the instance is unsatisfiable. When it
    /// returns, every dimension is pinned to its optimum, so later solves
    /// only see optimal models.
    pub fn optimize(&mut self, costs: &CostVectorMap) -> Result<Option<Solution>> {
        if self.has_solved() {
            return Err(PbError::Usage(
                "optimize() replaces solve() and cannot follow it".into(),
            ));
        }
        let table = CostTable::new(costs)?;

        // Cost variables must exist before the registry is sealed.
        let (registry, engine) = self.registry_and_engine();
        for name in &table.vars {
            registry.register(&VarName::parse(name)?, engine)?;
        }

        let Some(mut solution) = self.solve()? else {
            return Ok(None);
        };

        for dimension in 0..table.num_dimensions() {
            let weights = Coeffs::List(table.columns[dimension].clone());
            let mut cost = table.cost(&solution, dimension);

            while cost > 0 {
                let Some(cheaper) =
                    self.solve_with_relation(&table.vars, &weights, RelOp::Lt, rhs(cost)?)?
                else {
                    break;
                };
                let current = table.cost(&cheaper, dimension);
                if current >= cost {
                    return Err(PbError::CostNotDecreasing {
                        dimension,
                        previous: cost,
                        current,
                    });
                }
                tracing::debug!(dimension, previous = cost, current, "cheaper model");
                cost = current;
                solution = cheaper;
            }

            tracing::debug!(dimension, cost, "dimension pinned");
            self.add_relation(&table.vars, &weights, RelOp::Eq, rhs(cost)?)?;
        }

        Ok(Some(solution))
    }
}
