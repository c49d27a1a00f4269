//! # pbsolver-rs
//!
//! Boolean and pseudo-boolean constraints over named variables, solved by an
//! incremental SAT engine.
//!
//! The crate is the layer that sits in front of the engine. It maps variable
//! names to engine ids, lowers high-level idioms ("exactly one of these",
//! "the weighted sum of these is below k") into clauses and linear
//! constraints, re-solves incrementally under assumptions, and runs a
//! lexicographic minimization loop over several cost dimensions.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pbsolver_rs::solver::Solver;
//!
//! let mut solver = Solver::new();
//! solver.exactly_one(&["red", "green", "blue"])?;
//! solver.is_false("red")?;
//! solver.implies("green", "grass")?;
//!
//! if let Some(solution) = solver.solve()? {
//!     println!("{solution}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2024_compatibility)]

/// Variable names, engine ids and the name registry
pub mod vars;

/// Engine boundary trait and backends
pub mod engine;

/// Validation and marshaling of clauses and linear constraints
pub mod translator;

/// Boolean idioms built from clauses
pub mod combinators;

/// Incremental solving, conditional scopes and solution read-back
pub mod solver;

/// Lexicographic cost minimization
pub mod optimize;

/// Error types
pub mod error {
    //! Error types for pbsolver-rs

    use thiserror::Error;

    /// Errors reported by the solver layer
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum PbError {
        /// Malformed input: bad variable name, negative number, unknown operator
        #[error("validation error: {0}")]
        Validation(String),

        /// Operation not allowed in the current solver state
        #[error("usage error: {0}")]
        Usage(String),

        /// A tightened query returned a model that is not cheaper
        ///
        /// The encoding and the engine disagree about the meaning of the
        /// bound. The optimization is aborted.
        #[error(
            "assertion failure: cost did not decrease in dimension {dimension} \
             (previous {previous}, current {current})"
        )]
        CostNotDecreasing {
            /// Cost dimension being minimized
            dimension: usize,
            /// Cost before the tightened query
            previous: u64,
            /// Cost of the model the query returned
            current: u64,
        },

        /// The backend reported a failure
        #[error("engine error: {0}")]
        Engine(String),
    }

    /// Result type for pbsolver-rs operations
    pub type Result<T> = std::result::Result<T, PbError>;
}

pub use error::{PbError, Result};
pub use optimize::CostVectorMap;
pub use solver::{Guard, Options, Solution, Solver, Statistics};
pub use translator::{Coeffs, RelOp};
pub use vars::{VarId, VarName, Variable};
