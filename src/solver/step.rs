use super::regime::Regime;
use crate::geometry::Point;
use crate::geometry::Tuple;
use crate::Level;
use serde::Deserialize;
use serde::Serialize;

/// a direction together with the per-state levels attained along it.
/// the boundary of the approximation is the lower envelope of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperplane {
    direction: Point,
    levels: Vec<Level>,
}

impl Hyperplane {
    pub fn new(direction: Point, levels: Vec<Level>) -> Self {
        Self { direction, levels }
    }
    pub fn direction(&self) -> Point {
        self.direction
    }
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }
}

/// one direction's outcome within a revolution: the supporting policy
/// (action profile and regime per state, with the binding endpoint when
/// the regime is binding), the pivot it generates, and the hyperplane it
/// contributes. actions are referenced by their stable profile index, so
/// the record survives action deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    actions: Vec<usize>,
    regimes: Vec<Regime>,
    bindings: Vec<Option<(usize, usize)>>,
    pivot: Tuple,
    hyperplane: Hyperplane,
}

impl Step {
    pub fn new(
        actions: Vec<usize>,
        regimes: Vec<Regime>,
        bindings: Vec<Option<(usize, usize)>>,
        pivot: Tuple,
        hyperplane: Hyperplane,
    ) -> Self {
        Self {
            actions,
            regimes,
            bindings,
            pivot,
            hyperplane,
        }
    }
    pub fn action(&self, state: usize) -> usize {
        self.actions[state]
    }
    pub fn regime(&self, state: usize) -> Regime {
        self.regimes[state]
    }
    /// (player, endpoint) that pinned the pivot in a binding state
    pub fn binding(&self, state: usize) -> Option<(usize, usize)> {
        self.bindings[state]
    }
    pub fn pivot(&self) -> &Tuple {
        &self.pivot
    }
    pub fn hyperplane(&self) -> &Hyperplane {
        &self.hyperplane
    }
}
