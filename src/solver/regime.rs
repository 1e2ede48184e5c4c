use serde::Deserialize;
use serde::Serialize;

/// how a state's pivot payoff is generated. NonBinding means the
/// unconstrained Bellman image of the pivot; Binding means an
/// IC-constrained continuation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    NonBinding,
    Binding,
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Regime::NonBinding => write!(f, "non-binding"),
            Regime::Binding => write!(f, "binding"),
        }
    }
}
