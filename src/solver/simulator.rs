use super::solution::Solution;
use super::step::Step;
use crate::geometry::Point;
use crate::Probability;
use rand::distributions::Distribution;
use rand::distributions::WeightedIndex;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;

/// forward simulation of an equilibrium recorded in a solution's final
/// revolution. every period plays the current step's action in the
/// current state, then draws the next state from the transition row and
/// the next step from the continuation regime: non-binding states keep
/// their step, binding states jump to one of the two recorded steps
/// flanking the binding endpoint, randomizing with the weight recovered
/// from the endpoint's position. corners and endpoints without a
/// recorded flank continue from the step with the nearest expected
/// pivot. simulations are independent and run in parallel.
pub struct Simulator<'a> {
    solution: &'a Solution,
}

impl<'a> Simulator<'a> {
    pub fn new(solution: &'a Solution) -> Self {
        Self { solution }
    }

    /// mean discounted long-run payoffs over independent simulations
    /// starting from the given (state, step) of the final revolution
    pub fn simulate(
        &self,
        num_sims: usize,
        num_periods: usize,
        start_state: usize,
        start_step: usize,
    ) -> Point {
        let total = (0..num_sims)
            .into_par_iter()
            .map(|sim| self.episode(sim as u64, num_periods, start_state, start_step))
            .reduce(Point::default, |a, b| a + b);
        total * (1. / num_sims as f64)
    }

    fn episode(&self, seed: u64, num_periods: usize, start_state: usize, start_step: usize) -> Point {
        let game = self.solution.game();
        let iteration = self.solution.last().expect("solved solution");
        let steps = iteration.steps();
        let delta = game.delta();
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut state = start_state;
        let mut step = start_step;
        let mut value = Point::default();
        let mut discount = 1.;

        for _ in 0..num_periods {
            let profile = steps[step].action(state);
            let probabilities = game.probabilities(state, profile);
            value = value + game.payoff(state, profile) * ((1. - delta) * discount);
            discount *= delta;

            step = self.continuation(&mut rng, steps, step, state, probabilities);
            let weights = WeightedIndex::new(probabilities).expect("stochastic row");
            state = weights.sample(&mut rng);
        }
        value
    }

    fn continuation(
        &self,
        rng: &mut SmallRng,
        steps: &[Step],
        position: usize,
        state: usize,
        probabilities: &[Probability],
    ) -> usize {
        use super::regime::Regime;
        let current = &steps[position];
        if current.regime(state) == Regime::NonBinding {
            return position;
        }
        let Some((player, endpoint)) = current.binding(state) else {
            return position;
        };
        let iteration = self.solution.last().expect("solved solution");
        let Some(snapshot) = iteration.snapshot(state, current.action(state)) else {
            return position;
        };
        if endpoint >= snapshot.points(player).len() {
            return position;
        }
        let point = snapshot.points(player)[endpoint];
        match snapshot.tuples(player)[endpoint] {
            Some(index) if index >= 1 && index < steps.len() => {
                // the endpoint interpolates the expected pivots of the
                // flanking steps; recover the randomization weight from
                // this player's coordinate
                let hi = steps[index].pivot().expectation(probabilities)[player];
                let lo = steps[index - 1].pivot().expectation(probabilities)[player];
                let alpha = if (hi - lo).abs() > 1e-12 {
                    ((point[player] - lo) / (hi - lo)).clamp(0., 1.)
                } else {
                    1.
                };
                if rng.gen_bool(alpha) {
                    index
                } else {
                    index - 1
                }
            }
            _ => Self::nearest(steps, &point, probabilities),
        }
    }

    /// step whose expected pivot is closest to the target continuation
    fn nearest(steps: &[Step], target: &Point, probabilities: &[Probability]) -> usize {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let expectation = step.pivot().expectation(probabilities);
                (index, Point::distance(&expectation, target))
            })
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).expect("finite distances"))
            .map(|(index, _)| index)
            .expect("nonempty revolution")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::Game;
    use crate::solver::env::Environment;
    use crate::solver::solver::Solver;

    fn solved_prisoners_dilemma() -> Solution {
        let env = Environment::default();
        let payoffs = vec![vec![
            Point::new(3., 3.),
            Point::new(5., 0.),
            Point::new(0., 5.),
            Point::new(1., 1.),
        ]];
        let probabilities = vec![vec![vec![1.]; 4]];
        let game = Game::new(0.6, vec![[2, 2]], payoffs, probabilities).expect("valid game");
        let mut solver = Solver::new(&env, &game);
        solver.solve(crate::NUM_DIRECTIONS).expect("converges");
        solver.into_solution()
    }

    fn extreme_step(solution: &Solution, direction: Point) -> usize {
        solution
            .last()
            .expect("stored")
            .steps()
            .iter()
            .enumerate()
            .map(|(index, step)| (index, step.pivot()[0].dot(&direction)))
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).expect("finite levels"))
            .map(|(index, _)| index)
            .expect("nonempty revolution")
    }

    #[test]
    fn best_equilibrium_simulates_to_cooperation() {
        let solution = solved_prisoners_dilemma();
        let best = extreme_step(&solution, Point::new(1., 1.));
        let payoffs = Simulator::new(&solution).simulate(8, 200, 0, best);
        assert!(Point::distance(&payoffs, &Point::new(3., 3.)) < 1e-2, "{}", payoffs);
    }

    #[test]
    fn worst_equilibrium_simulates_to_the_threat() {
        let solution = solved_prisoners_dilemma();
        let worst = extreme_step(&solution, Point::new(-1., -1.));
        let payoffs = Simulator::new(&solution).simulate(8, 200, 0, worst);
        let threat = solution.last().expect("stored").threat();
        assert!(Point::distance(&payoffs, &threat[0]) < 1e-2, "{}", payoffs);
    }

    #[test]
    fn simulation_is_deterministic_given_seeds() {
        let solution = solved_prisoners_dilemma();
        let best = extreme_step(&solution, Point::new(1., 1.));
        let simulator = Simulator::new(&solution);
        let a = simulator.simulate(4, 50, 0, best);
        let b = simulator.simulate(4, 50, 0, best);
        assert!(a == b);
    }
}
