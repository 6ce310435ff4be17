use thiserror::Error;

/// Errors reported by the tabulation solver.
///
/// Configuration errors are detected before the first worklist iteration.
/// The remaining variants signal broken preconditions of the problem or of
/// the solver's own tables; none of them is retried.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("no entry points or initial seeds were supplied")]
    NoSeeds,

    #[error("entry point {procedure} has no start node")]
    MissingStartNode { procedure: String },

    #[error("seed {fact} at {node} is not placed on the start node of its procedure")]
    SeedNotAtStart { node: String, fact: String },

    #[error("malformed lattice: {0}")]
    MalformedLattice(String),

    #[error("join regressed for fact {fact} at {node}: {detail}")]
    NonMonotoneJoin {
        node: String,
        fact: String,
        detail: String,
    },

    #[error("inconsistent solver tables: {0}")]
    Inconsistency(String),
}

pub type SolverResult<T> = Result<T, SolverError>;
