use crate::geometry::Point;
use crate::solver::error::SolveError;
use crate::Arbitrary;
use crate::Discount;
use crate::Probability;
use serde::Deserialize;
use serde::Serialize;

/// slack allowed when checking that transition rows are stochastic
const PROB_TOL: f64 = 1e-3;

/// a two-player stochastic game with perfect monitoring. immutable once
/// constructed; the solver only ever reads from it.
///
/// action profiles are indexed column-major: profile a in state s is
/// a = a0 + a1 * num_actions[s][0]. payoffs and probabilities are total
/// over (state, profile).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    delta: Discount,
    num_actions: Vec<[usize; 2]>,
    payoffs: Vec<Vec<Point>>,
    probabilities: Vec<Vec<Vec<Probability>>>,
    eq_actions: Vec<Vec<bool>>,
    unconstrained: [bool; 2],
}

impl Game {
    pub fn new(
        delta: Discount,
        num_actions: Vec<[usize; 2]>,
        payoffs: Vec<Vec<Point>>,
        probabilities: Vec<Vec<Vec<Probability>>>,
    ) -> Result<Self, SolveError> {
        let states = num_actions.len();
        let eq_actions = num_actions
            .iter()
            .map(|[n0, n1]| vec![true; n0 * n1])
            .collect();
        let game = Self {
            delta,
            num_actions,
            payoffs,
            probabilities,
            eq_actions,
            unconstrained: [false, false],
        };
        game.validate(states)?;
        Ok(game)
    }

    /// skip incentive compatibility for the given players
    pub fn unconstrained(mut self, unconstrained: [bool; 2]) -> Self {
        self.unconstrained = unconstrained;
        self
    }

    /// restrict which action profiles may be played on path. deviations
    /// to excluded profiles are still considered when computing IC.
    pub fn eq_actions(mut self, eq_actions: Vec<Vec<bool>>) -> Result<Self, SolveError> {
        if eq_actions.len() != self.num_states()
            || eq_actions
                .iter()
                .zip(self.num_actions.iter())
                .any(|(row, [n0, n1])| row.len() != n0 * n1)
            || eq_actions.iter().any(|row| row.iter().all(|ok| !ok))
        {
            return Err(SolveError::InvalidInput(
                "equilibrium action sets must be total and nonempty per state".into(),
            ));
        }
        self.eq_actions = eq_actions;
        Ok(self)
    }

    fn validate(&self, states: usize) -> Result<(), SolveError> {
        if !(0. < self.delta && self.delta < 1.) {
            return Err(SolveError::InvalidInput(format!(
                "discount factor {} outside (0, 1)",
                self.delta
            )));
        }
        if states == 0 {
            return Err(SolveError::InvalidInput("at least one state".into()));
        }
        if self.num_actions.iter().any(|[n0, n1]| *n0 < 1 || *n1 < 1) {
            return Err(SolveError::InvalidInput(
                "every player needs at least one action in every state".into(),
            ));
        }
        if self.payoffs.len() != states || self.probabilities.len() != states {
            return Err(SolveError::InvalidInput(
                "payoffs and probabilities must cover every state".into(),
            ));
        }
        for state in 0..states {
            let profiles = self.profiles(state);
            if self.payoffs[state].len() != profiles || self.probabilities[state].len() != profiles
            {
                return Err(SolveError::InvalidInput(format!(
                    "state {} expects {} action profiles",
                    state, profiles
                )));
            }
            for (profile, row) in self.probabilities[state].iter().enumerate() {
                if row.len() != states {
                    return Err(SolveError::InvalidInput(format!(
                        "transition row ({}, {}) must cover every state",
                        state, profile
                    )));
                }
                if row.iter().any(|p| *p < 0.) {
                    return Err(SolveError::InvalidInput(format!(
                        "negative transition probability at ({}, {})",
                        state, profile
                    )));
                }
                let sum = row.iter().sum::<Probability>();
                if (sum - 1.).abs() > PROB_TOL {
                    return Err(SolveError::InvalidInput(format!(
                        "transition row ({}, {}) sums to {}",
                        state, profile, sum
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn delta(&self) -> Discount {
        self.delta
    }
    pub fn num_states(&self) -> usize {
        self.num_actions.len()
    }
    pub fn num_actions(&self, state: usize) -> [usize; 2] {
        self.num_actions[state]
    }
    /// total number of action profiles in a state
    pub fn profiles(&self, state: usize) -> usize {
        let [n0, n1] = self.num_actions[state];
        n0 * n1
    }
    pub fn payoff(&self, state: usize, profile: usize) -> Point {
        self.payoffs[state][profile]
    }
    pub fn probabilities(&self, state: usize, profile: usize) -> &[Probability] {
        &self.probabilities[state][profile]
    }
    pub fn allowed(&self, state: usize, profile: usize) -> bool {
        self.eq_actions[state][profile]
    }
    pub fn is_unconstrained(&self, player: usize) -> bool {
        self.unconstrained[player]
    }

    /// joint profile index from per-player action indices
    pub fn profile(&self, state: usize, pair: [usize; 2]) -> usize {
        let [n0, _] = self.num_actions[state];
        pair[0] + pair[1] * n0
    }
    /// per-player action indices from a joint profile index
    pub fn pair(&self, state: usize, profile: usize) -> [usize; 2] {
        let [n0, _] = self.num_actions[state];
        [profile % n0, profile / n0]
    }
    /// profiles reachable by a unilateral deviation of one player
    pub fn deviations(
        &self,
        state: usize,
        profile: usize,
        player: usize,
    ) -> impl Iterator<Item = usize> + '_ {
        let pair = self.pair(state, profile);
        let range = 0..self.num_actions[state][player];
        range.map(move |action| {
            let mut deviated = pair;
            deviated[player] = action;
            self.profile(state, deviated)
        })
    }

    /// componentwise bounds over all payoffs, (lower, upper)
    pub fn payoff_bounds(&self) -> (Point, Point) {
        let mut lb = Point::new(f64::MAX, f64::MAX);
        let mut ub = Point::new(f64::MIN, f64::MIN);
        for state in self.payoffs.iter() {
            for payoff in state.iter() {
                lb = lb.min(payoff);
                ub = ub.max(payoff);
            }
        }
        (lb, ub)
    }
}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Game: delta={}, states={}, profiles=( ",
            self.delta,
            self.num_states()
        )?;
        for state in 0..self.num_states() {
            write!(f, "{} ", self.profiles(state))?;
        }
        write!(f, ")")
    }
}

impl Arbitrary for Game {
    fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let states = rng.gen_range(1..=3);
        let num_actions = (0..states)
            .map(|_| [rng.gen_range(1..=3), rng.gen_range(1..=3)])
            .collect::<Vec<[usize; 2]>>();
        let payoffs = num_actions
            .iter()
            .map(|[n0, n1]| {
                (0..n0 * n1)
                    .map(|_| Point::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)))
                    .collect()
            })
            .collect();
        let probabilities = num_actions
            .iter()
            .map(|[n0, n1]| {
                (0..n0 * n1)
                    .map(|_| {
                        let raw = (0..states)
                            .map(|_| rng.gen_range(0.01..1.0))
                            .collect::<Vec<Probability>>();
                        let sum = raw.iter().sum::<Probability>();
                        raw.into_iter().map(|p| p / sum).collect()
                    })
                    .collect()
            })
            .collect();
        Self::new(rng.gen_range(0.2..0.8), num_actions, payoffs, probabilities)
            .expect("random games are well formed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prisoners_dilemma() -> Game {
        let payoffs = vec![vec![
            Point::new(3., 3.),
            Point::new(5., 0.),
            Point::new(0., 5.),
            Point::new(1., 1.),
        ]];
        let probabilities = vec![vec![vec![1.]; 4]];
        Game::new(0.6, vec![[2, 2]], payoffs, probabilities).expect("valid game")
    }

    #[test]
    fn profile_indexing_round_trips() {
        let game = prisoners_dilemma();
        for profile in 0..game.profiles(0) {
            assert!(game.profile(0, game.pair(0, profile)) == profile);
        }
    }

    #[test]
    fn deviations_fix_the_other_player() {
        let game = prisoners_dilemma();
        // profile 2 = (cooperate, defect)
        let devs = game.deviations(0, 2, 0).collect::<Vec<usize>>();
        assert!(devs == vec![2, 3]);
        let devs = game.deviations(0, 2, 1).collect::<Vec<usize>>();
        assert!(devs == vec![0, 2]);
    }

    #[test]
    fn payoff_bounds_are_tight() {
        let game = prisoners_dilemma();
        let (lb, ub) = game.payoff_bounds();
        assert!(lb == Point::new(0., 0.));
        assert!(ub == Point::new(5., 5.));
    }

    #[test]
    fn rejects_bad_discounting() {
        let payoffs = vec![vec![Point::new(0., 0.)]];
        let probabilities = vec![vec![vec![1.]]];
        let game = Game::new(1.5, vec![[1, 1]], payoffs, probabilities);
        assert!(matches!(game, Err(SolveError::InvalidInput(_))));
    }

    #[test]
    fn rejects_substochastic_rows() {
        let payoffs = vec![vec![Point::new(0., 0.)]];
        let probabilities = vec![vec![vec![0.9]]];
        let game = Game::new(0.5, vec![[1, 1]], payoffs, probabilities);
        assert!(matches!(game, Err(SolveError::InvalidInput(_))));
    }

    #[test]
    fn random_games_are_valid() {
        for _ in 0..16 {
            let game = Game::random();
            assert!(game.num_states() >= 1);
            for state in 0..game.num_states() {
                for profile in 0..game.profiles(state) {
                    let sum = game.probabilities(state, profile).iter().sum::<f64>();
                    assert!((sum - 1.).abs() < 1e-9);
                }
            }
        }
    }
}
