use super::error::SolveError;
use serde::Deserialize;
use serde::Serialize;

/// numeric tolerances and iteration caps consumed by the solver. a plain
/// value bundle: construct one, tweak fields or use set(), and pass it
/// in. nothing here mutates during a solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// outer fixed-point convergence threshold
    pub error_tol: f64,
    /// slack in half-plane containment for IC checks
    pub ic_tol: f64,
    /// below this gap between levels, an intersection is degenerate
    pub intersect_tol: f64,
    /// flat-along-IC detection when walking the pivot trajectory
    pub flat_tol: f64,
    /// admit historical tuples this far below the threat tuple
    pub past_threat_tol: f64,
    /// policy iteration convergence
    pub policy_iter_tol: f64,
    /// Bellman substep convergence
    pub update_pivot_tol: f64,
    /// outer iteration cap
    pub max_iterations: usize,
    /// policy iteration cap per direction
    pub max_policy_iterations: usize,
    /// Bellman substep cap
    pub max_update_pivot_passes: usize,
    /// 0 = keep no iteration records, 1 = final revolution only, 2 = all
    pub store_iterations: u8,
    /// include surviving action snapshots in iteration records
    pub store_actions: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            error_tol: 1e-8,
            ic_tol: 1e-12,
            intersect_tol: 1e-12,
            flat_tol: 1e-7,
            past_threat_tol: 1e-10,
            policy_iter_tol: 1e-8,
            update_pivot_tol: 1e-10,
            max_iterations: 1_000_000,
            max_policy_iterations: 100,
            max_update_pivot_passes: 1_000,
            store_iterations: 1,
            store_actions: true,
        }
    }
}

impl Environment {
    /// set a recognised option by name. unknown keys are rejected so
    /// configuration typos surface instead of silently defaulting.
    pub fn set(&mut self, key: &str, value: f64) -> Result<(), SolveError> {
        match key {
            "ERRORTOL" => self.error_tol = value,
            "ICTOL" => self.ic_tol = value,
            "INTERSECTTOL" => self.intersect_tol = value,
            "FLATTOL" => self.flat_tol = value,
            "PASTTHREATTOL" => self.past_threat_tol = value,
            "POLICYITERTOL" => self.policy_iter_tol = value,
            "UPDATEPIVOTTOL" => self.update_pivot_tol = value,
            "MAXITERATIONS" => self.max_iterations = value as usize,
            "MAXPOLICYITERATIONS" => self.max_policy_iterations = value as usize,
            "MAXUPDATEPIVOTPASSES" => self.max_update_pivot_passes = value as usize,
            "STOREITERATIONS" => self.store_iterations = value as u8,
            "STOREACTIONS" => self.store_actions = value != 0.,
            _ => {
                return Err(SolveError::InvalidInput(format!(
                    "unrecognised option: {}",
                    key
                )))
            }
        }
        Ok(())
    }
}
