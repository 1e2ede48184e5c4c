/// everything that can abort a solve. iteration caps are not here on
/// purpose: hitting one logs a warning and returns the best effort so
/// far. NoAdmissibleDirection is catchable so parameter sweeps can treat
/// a degenerate game as converged and move on.
#[derive(thiserror::Error, Debug)]
pub enum SolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no action supports an APS-feasible payoff tuple")]
    NoFeasibleTuple,
    #[error("sensitivity analysis found no admissible direction")]
    NoAdmissibleDirection,
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization failure: {0}")]
    Serde(#[from] serde_json::Error),
}
