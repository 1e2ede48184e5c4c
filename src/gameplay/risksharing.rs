use super::game::Game;
use crate::geometry::Point;
use crate::geometry::Tuple;
use crate::solver::error::SolveError;
use crate::Discount;
use crate::Payoff;
use crate::Probability;

/// how the transfer grid is interpreted. Consumption lets the richer
/// agent pick a consumption level directly while the poorer agent has a
/// single action; Endowment gives both agents a transfer grid over their
/// own endowment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndowmentMode {
    Consumption,
    Endowment,
}

/// Kocherlakota-style risk sharing economy. two agents split a unit
/// endowment whose division follows a Markov chain; agents may transfer
/// consumption to each other and utility is sqrt(c).
///
/// the total endowment is discretized into c2e consumption units, so all
/// transfers and consumptions are integer unit counts.
#[derive(Debug, Clone)]
pub struct RiskSharing {
    delta: Discount,
    num_endowments: usize,
    c2e: usize,
    persistence: f64,
    mode: EndowmentMode,
}

impl RiskSharing {
    pub fn new(
        delta: Discount,
        num_endowments: usize,
        c2e: usize,
        persistence: f64,
        mode: EndowmentMode,
    ) -> Self {
        Self {
            delta,
            num_endowments,
            c2e,
            persistence,
            mode,
        }
    }

    /// player 0's endowment in consumption units at the given state.
    /// endowment shares are (s+1)/(num_endowments+1), so two endowment
    /// states split the pie 1/3 vs 2/3.
    fn endowment(&self, state: usize) -> usize {
        let share = (state + 1) as f64 / (self.num_endowments + 1) as f64;
        (share * self.c2e as f64).round() as usize
    }

    fn utility(&self, units: usize) -> Payoff {
        (units as f64 / self.c2e as f64).sqrt()
    }

    /// stationary endowment chain: persistence weight on staying put,
    /// the rest spread uniformly
    fn transition(&self, state: usize) -> Vec<Probability> {
        let uniform = (1. - self.persistence) / self.num_endowments as f64;
        (0..self.num_endowments)
            .map(|next| {
                if next == state {
                    self.persistence + uniform
                } else {
                    uniform
                }
            })
            .collect()
    }

    /// per-player transfer grids in the given state
    fn grids(&self, state: usize) -> [usize; 2] {
        let e0 = self.endowment(state);
        let e1 = self.c2e - e0;
        match self.mode {
            EndowmentMode::Endowment => [e0 + 1, e1 + 1],
            EndowmentMode::Consumption => {
                if e0 >= e1 {
                    [e0 + 1, 1]
                } else {
                    [1, e1 + 1]
                }
            }
        }
    }

    pub fn game(&self) -> Result<Game, SolveError> {
        if self.num_endowments < 1 || self.c2e < 1 {
            return Err(SolveError::InvalidInput(
                "risk sharing needs at least one endowment state and one consumption unit".into(),
            ));
        }
        if !(0. ..=1.).contains(&self.persistence) {
            return Err(SolveError::InvalidInput(format!(
                "persistence {} outside [0, 1]",
                self.persistence
            )));
        }
        let num_actions = (0..self.num_endowments)
            .map(|state| self.grids(state))
            .collect::<Vec<[usize; 2]>>();
        let mut payoffs = Vec::with_capacity(self.num_endowments);
        let mut probabilities = Vec::with_capacity(self.num_endowments);
        for state in 0..self.num_endowments {
            let e = [self.endowment(state), self.c2e - self.endowment(state)];
            let [n0, n1] = num_actions[state];
            let row = self.transition(state);
            let mut state_payoffs = Vec::with_capacity(n0 * n1);
            for t1 in 0..n1 {
                for t0 in 0..n0 {
                    let c0 = e[0] - t0 + t1;
                    let c1 = e[1] - t1 + t0;
                    state_payoffs.push(Point::new(self.utility(c0), self.utility(c1)));
                }
            }
            probabilities.push(vec![row; n0 * n1]);
            payoffs.push(state_payoffs);
        }
        Game::new(self.delta, num_actions, payoffs, probabilities)
    }

    /// expected discounted payoffs when both agents consume their own
    /// endowment forever. this is the worst equilibrium of the economy,
    /// so the solver's terminal threat tuple converges to it.
    pub fn autarky(&self) -> Tuple {
        let flows = (0..self.num_endowments)
            .map(|state| {
                let e0 = self.endowment(state);
                Point::new(self.utility(e0), self.utility(self.c2e - e0))
            })
            .collect::<Vec<Point>>();
        let mut values = Tuple::from(flows.clone());
        loop {
            let next = Tuple::from(
                (0..self.num_endowments)
                    .map(|state| {
                        let continuation = values.expectation(&self.transition(state));
                        flows[state] * (1. - self.delta) + continuation * self.delta
                    })
                    .collect::<Vec<Point>>(),
            );
            let gap = Tuple::distance(&next, &values);
            values = next;
            if gap < 1e-13 {
                break values;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfers_conserve_the_pie() {
        let rsg = RiskSharing::new(0.7, 2, 9, 0., EndowmentMode::Endowment);
        let game = rsg.game().expect("valid economy");
        for state in 0..game.num_states() {
            for profile in 0..game.profiles(state) {
                let payoff = game.payoff(state, profile);
                let units = payoff.x() * payoff.x() + payoff.y() * payoff.y();
                assert!((units - 1.).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn consumption_mode_lets_only_the_rich_transfer() {
        let rsg = RiskSharing::new(0.7, 2, 9, 0., EndowmentMode::Consumption);
        let game = rsg.game().expect("valid economy");
        assert!(game.num_actions(0) == [1, 7]);
        assert!(game.num_actions(1) == [7, 1]);
    }

    #[test]
    fn iid_autarky_matches_closed_form() {
        let rsg = RiskSharing::new(0.7, 2, 9, 0., EndowmentMode::Endowment);
        let autarky = rsg.autarky();
        // with zero persistence the continuation is the same in both
        // states: v = (1-d) u(e_s) + d * mean flow / (1 - d) ... solved
        // directly as v_s = (1-d) u_s + d * vbar, vbar = mean_s u_s
        let u = [(3f64 / 9.).sqrt(), (6f64 / 9.).sqrt()];
        let vbar = (u[0] + u[1]) / 2.;
        for state in 0..2 {
            let expected = (1. - 0.7) * u[state] + 0.7 * vbar;
            assert!((autarky[state][0] - expected).abs() < 1e-9);
        }
        // symmetric economy: player 1's autarky mirrors player 0's
        assert!((autarky[0][1] - autarky[1][0]).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_persistence() {
        let rsg = RiskSharing::new(0.7, 2, 9, 1.5, EndowmentMode::Endowment);
        assert!(matches!(rsg.game(), Err(SolveError::InvalidInput(_))));
    }
}
