use super::action::Action;
use super::step::Step;
use crate::geometry::Point;
use crate::geometry::Tuple;
use serde::Deserialize;
use serde::Serialize;

/// the part of an Action worth keeping in the iteration log: its profile
/// index, IC floor, binding segments and the trajectory indices its
/// endpoints were interpolated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSnapshot {
    profile: usize,
    min_ic: Point,
    points: [Vec<Point>; 2],
    tuples: [Vec<Option<usize>>; 2],
    corner: bool,
}

impl ActionSnapshot {
    pub fn profile(&self) -> usize {
        self.profile
    }
    pub fn min_ic(&self) -> Point {
        self.min_ic
    }
    pub fn points(&self, player: usize) -> &[Point] {
        &self.points[player]
    }
    pub fn tuples(&self, player: usize) -> &[Option<usize>] {
        &self.tuples[player]
    }
    pub fn corner(&self) -> bool {
        self.corner
    }
}

impl From<&Action> for ActionSnapshot {
    fn from(action: &Action) -> Self {
        Self {
            profile: action.profile(),
            min_ic: action.min_ic(),
            points: [action.points(0).to_vec(), action.points(1).to_vec()],
            tuples: [action.tuples(0).to_vec(), action.tuples(1).to_vec()],
            corner: action.corner(),
        }
    }
}

/// snapshot of one outer iteration: the threat tuple it started from,
/// the actions that were still alive, and one Step per direction swept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    number: usize,
    threat: Tuple,
    actions: Option<Vec<Vec<ActionSnapshot>>>,
    steps: Vec<Step>,
}

impl Iteration {
    pub fn new(number: usize, threat: Tuple, actions: Option<Vec<Vec<ActionSnapshot>>>) -> Self {
        Self {
            number,
            threat,
            actions,
            steps: Vec::new(),
        }
    }
    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }
    pub fn number(&self) -> usize {
        self.number
    }
    pub fn threat(&self) -> &Tuple {
        &self.threat
    }
    pub fn actions(&self) -> Option<&Vec<Vec<ActionSnapshot>>> {
        self.actions.as_ref()
    }
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
    /// snapshot of a state's surviving action by profile index
    pub fn snapshot(&self, state: usize, profile: usize) -> Option<&ActionSnapshot> {
        self.actions
            .as_ref()?
            .get(state)?
            .iter()
            .find(|snapshot| snapshot.profile() == profile)
    }
}
