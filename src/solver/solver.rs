use super::action::Action;
use super::env::Environment;
use super::error::SolveError;
use super::iteration::ActionSnapshot;
use super::iteration::Iteration;
use super::regime::Regime;
use super::solution::Solution;
use super::step::Hyperplane;
use super::step::Step;
use crate::gameplay::Game;
use crate::geometry::Point;
use crate::geometry::Tuple;
use crate::Level;

/// the fixed-point iteration over the equilibrium payoff
/// correspondence. owns the surviving actions, the threat tuple and the
/// iteration log; everything else lives on the stack of the solve
/// routines. strictly single-threaded: the only loops are the direction
/// sweep and the policy iteration inside it.
pub struct Solver {
    env: Environment,
    game: Game,
    solution: Solution,
    actions: Vec<Vec<Action>>,
    threat: Tuple,
}

impl Solver {
    pub fn new(env: &Environment, game: &Game) -> Self {
        Self {
            env: env.clone(),
            game: game.clone(),
            solution: Solution::new(game.clone()),
            actions: Vec::new(),
            threat: Tuple::default(),
        }
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }
    pub fn into_solution(self) -> Solution {
        self.solution
    }
    pub fn threat(&self) -> &Tuple {
        &self.threat
    }

    /// start from the payoff floor and a bounding-box correspondence:
    /// one action per allowed profile, IC corner rays clipped to the
    /// payoff box
    fn initialize(&mut self) {
        let states = self.game.num_states();
        let (lb, ub) = self.game.payoff_bounds();
        self.threat = Tuple::filled(states, lb);
        let actions = (0..states)
            .map(|state| {
                (0..self.game.profiles(state))
                    .filter(|profile| self.game.allowed(state, *profile))
                    .map(|profile| {
                        let mut action = Action::new(state, profile);
                        action.calculate_min_ic(&self.game, [true, true], &self.threat);
                        action.reset_trimmed(&ub);
                        for direction in Self::cardinals() {
                            let level = direction.dot(&lb).max(direction.dot(&ub));
                            action.trim(&direction, level, &self.env);
                        }
                        action.update_trim();
                        action
                    })
                    .collect()
            })
            .collect();
        self.actions = actions;
    }

    fn cardinals() -> [Point; 4] {
        [
            Point::new(1., 0.),
            Point::new(0., 1.),
            Point::new(-1., 0.),
            Point::new(0., -1.),
        ]
    }

    fn snapshot(&self, number: usize) -> Option<Iteration> {
        if self.env.store_iterations == 0 {
            return None;
        }
        let actions = if self.env.store_actions {
            Some(
                self.actions
                    .iter()
                    .map(|state| state.iter().map(ActionSnapshot::from).collect())
                    .collect(),
            )
        } else {
            None
        };
        Some(Iteration::new(number, self.threat.clone(), actions))
    }

    fn record(&mut self, iteration: Option<Iteration>) {
        if let Some(iteration) = iteration {
            self.solution.push(iteration, self.env.store_iterations == 1);
        }
    }

    /// sweep a fixed circle of directions, rounded up to a multiple of 4
    /// so due west and due south are available for the threat update
    pub fn solve(&mut self, num_directions: usize) -> Result<(), SolveError> {
        let num_directions = (num_directions + 3) / 4 * 4;
        let states = self.game.num_states();
        let directions = (0..num_directions)
            .map(|d| {
                let theta = 2. * std::f64::consts::PI * d as f64 / num_directions as f64;
                Point::new(theta.cos(), theta.sin())
            })
            .collect::<Vec<Point>>();
        let mut levels = vec![vec![0.; states]; num_directions];

        self.initialize();
        let mut pivot = self.threat.clone();
        let mut feasible = self.threat.clone();
        let mut error_level = 1.;
        let mut count = 0;

        while error_level > self.env.error_tol && count < self.env.max_iterations {
            let mut action_tuple = vec![0usize; states];
            let mut regime_tuple = vec![Regime::Binding; states];
            let mut bindings = vec![None; states];

            // commit the previous iteration's trims and drop actions
            // that can no longer be supported
            for state in 0..states {
                for action in self.actions[state].iter_mut() {
                    action.update_trim();
                }
                let game = &self.game;
                let env = &self.env;
                let feas = &feasible;
                self.actions[state].retain(|action| {
                    let expectation =
                        feas.expectation(game.probabilities(state, action.profile()));
                    action.supportable(&expectation, env)
                });
                if self.actions[state].is_empty() {
                    return Err(SolveError::NoFeasibleTuple);
                }
            }

            let mut iteration = self.snapshot(count);
            let mut extreme_tuples = Vec::with_capacity(num_directions);
            error_level = 0.;

            for (d, direction) in directions.iter().enumerate() {
                self.optimize_policy(
                    &mut pivot,
                    &mut action_tuple,
                    &mut regime_tuple,
                    &mut bindings,
                    direction,
                );
                let new_levels = (0..states)
                    .map(|state| pivot[state].dot(direction))
                    .collect::<Vec<Level>>();
                for state in 0..states {
                    error_level = error_level.max((new_levels[state] - levels[d][state]).abs());
                }
                if let Some(ref mut iteration) = iteration {
                    iteration.push(Step::new(
                        action_tuple
                            .iter()
                            .enumerate()
                            .map(|(state, position)| self.actions[state][*position].profile())
                            .collect(),
                        regime_tuple.clone(),
                        bindings.clone(),
                        pivot.clone(),
                        Hyperplane::new(*direction, new_levels.clone()),
                    ));
                }
                extreme_tuples.push(pivot.clone());
                levels[d] = new_levels;
            }

            log::info!(
                "iteration {}: error {:e}, surviving actions ({})",
                count,
                error_level,
                self.actions
                    .iter()
                    .map(|state| state.len().to_string())
                    .collect::<Vec<String>>()
                    .join(" ")
            );
            self.record(iteration);

            self.find_feasible_tuple(&mut feasible)?;

            // west and south levels bound the threat point from below
            let mut updated = [false, false];
            for (player, d) in [(0, num_directions / 2), (1, 3 * num_directions / 4)] {
                for state in 0..states {
                    let new = -levels[d][state];
                    if new > self.threat[state][player] + self.env.past_threat_tol {
                        updated[player] = true;
                    }
                    self.threat[state][player] = new;
                }
            }

            // refresh IC floors and binding segments, then trim against
            // every direction's expected level
            let last_direction = directions[num_directions - 1];
            for state in 0..states {
                for action in self.actions[state].iter_mut() {
                    action.calculate_min_ic(&self.game, [true, true], &self.threat);
                    if updated[0] || updated[1] {
                        action.calculate_binding_continuations(
                            &self.game,
                            &self.env,
                            updated,
                            &extreme_tuples,
                            &self.threat,
                            &pivot,
                            &last_direction,
                            0,
                        );
                    }
                    for (d, direction) in directions.iter().enumerate() {
                        let expected = self
                            .game
                            .probabilities(state, action.profile())
                            .iter()
                            .zip(levels[d].iter())
                            .map(|(p, level)| p * level)
                            .sum::<Level>();
                        action.trim(direction, expected, &self.env);
                    }
                }
            }

            count += 1;
        }

        if count >= self.env.max_iterations {
            log::warn!("maximum iterations reached at error {:e}", error_level);
        }
        Ok(())
    }

    /// sweep directions generated by sensitivity analysis instead of a
    /// fixed circle. terminates each revolution on passing due east and
    /// records the threat point as the sweep crosses west and south.
    pub fn solve_endogenous(&mut self) -> Result<(), SolveError> {
        let states = self.game.num_states();
        let due_east = Point::new(1., 0.);
        let due_north = Point::new(0., 1.);

        self.initialize();
        let mut directions: Vec<Point> = Vec::new();
        let mut levels: Vec<Vec<Level>> = Vec::new();
        let mut pivot = self.threat.clone();
        let mut feasible = self.threat.clone();
        let mut new_threat = self.threat.clone();
        let mut error_level = 1.;
        let mut count = 0;

        while error_level > self.env.error_tol && count < self.env.max_iterations {
            let mut new_directions: Vec<Point> = Vec::new();
            let mut new_levels: Vec<Vec<Level>> = Vec::new();
            let mut action_tuple = vec![0usize; states];
            let mut regime_tuple = vec![Regime::Binding; states];
            let mut bindings = vec![None; states];
            let mut iteration = self.snapshot(count);

            let mut current = due_east;
            let mut passed_east = false;
            while !passed_east {
                self.optimize_policy(
                    &mut pivot,
                    &mut action_tuple,
                    &mut regime_tuple,
                    &mut bindings,
                    &current,
                );
                let best = self.sensitivity(&pivot, &action_tuple, &regime_tuple, &current)?;
                let normal = current.normal();
                let new_dir =
                    (current * (1. / (best + 1.)) + normal * (best / (best + 1.))).normalize();
                let lvls = (0..states)
                    .map(|state| pivot[state].dot(&new_dir))
                    .collect::<Vec<Level>>();
                new_directions.push(new_dir);
                new_levels.push(lvls.clone());
                if let Some(ref mut iteration) = iteration {
                    iteration.push(Step::new(
                        action_tuple
                            .iter()
                            .enumerate()
                            .map(|(state, position)| self.actions[state][*position].profile())
                            .collect(),
                        regime_tuple.clone(),
                        bindings.clone(),
                        pivot.clone(),
                        Hyperplane::new(new_dir, lvls),
                    ));
                }

                // nudge the recorded direction to break ties next step
                let rotated = new_dir.rotate_ccw(std::f64::consts::PI * 1e-3);
                if current.dot(&due_north) > 0. && rotated.dot(&due_north) <= 0. {
                    // passing due west
                    for state in 0..states {
                        new_threat[state][0] = pivot[state][0];
                    }
                } else if current.dot(&due_east) < 0. && rotated.dot(&due_east) >= 0. {
                    // passing due south
                    for state in 0..states {
                        new_threat[state][1] = pivot[state][1];
                    }
                } else if current.dot(&due_north) < 0. && rotated.dot(&due_north) >= 0. {
                    passed_east = true;
                }
                current = rotated;
            }

            self.record(iteration);

            // distance from each new (direction, level) to its nearest
            // predecessor; infinite on the first revolution
            error_level = 0.;
            for (new_dir, new_lvl) in new_directions.iter().zip(new_levels.iter()) {
                let mut nearest = f64::MAX;
                for (old_dir, old_lvl) in directions.iter().zip(levels.iter()) {
                    let gap = old_lvl
                        .iter()
                        .zip(new_lvl.iter())
                        .map(|(o, n)| (o - n).abs())
                        .fold(0., f64::max);
                    nearest = nearest.min(Point::distance(old_dir, new_dir) + gap);
                }
                error_level = error_level.max(nearest);
            }

            log::info!(
                "iteration {}: error {:e}, directions {}, surviving actions ({})",
                count,
                error_level,
                new_directions.len(),
                self.actions
                    .iter()
                    .map(|state| state.len().to_string())
                    .collect::<Vec<String>>()
                    .join(" ")
            );

            self.find_feasible_tuple(&mut feasible)?;

            self.threat = new_threat.clone();
            directions = new_directions;
            levels = new_levels;

            for state in 0..states {
                for action in self.actions[state].iter_mut() {
                    action.calculate_min_ic(&self.game, [true, true], &self.threat);
                    for (direction, lvls) in directions.iter().zip(levels.iter()) {
                        let expected = self
                            .game
                            .probabilities(state, action.profile())
                            .iter()
                            .zip(lvls.iter())
                            .map(|(p, level)| p * level)
                            .sum::<Level>();
                        action.trim(direction, expected, &self.env);
                    }
                    action.update_trim();
                }
                let game = &self.game;
                let env = &self.env;
                let feas = &feasible;
                self.actions[state].retain(|action| {
                    let expectation =
                        feas.expectation(game.probabilities(state, action.profile()));
                    action.supportable(&expectation, env)
                });
                if self.actions[state].is_empty() {
                    return Err(SolveError::NoFeasibleTuple);
                }
            }

            count += 1;
        }

        if count >= self.env.max_iterations {
            log::warn!("maximum iterations reached at error {:e}", error_level);
        }
        Ok(())
    }

    /// policy iteration for one direction. alternates improvement over
    /// all (action, regime) candidates with a Bellman substep for the
    /// non-binding states, switching states to the binding regime when
    /// their gap is within delta of the largest violation. that gap rule
    /// is what keeps the regimes from oscillating; do not weaken it.
    fn optimize_policy(
        &self,
        pivot: &mut Tuple,
        action_tuple: &mut [usize],
        regime_tuple: &mut [Regime],
        bindings: &mut [Option<(usize, usize)>],
        direction: &Point,
    ) {
        let states = self.game.num_states();
        let delta = self.game.delta();
        let mut new_pivot = pivot.clone();
        let mut new_actions = action_tuple.to_vec();
        let mut new_regimes = regime_tuple.to_vec();
        let mut new_bindings = bindings.to_vec();
        let mut best_aps_not_binding = vec![false; states];
        let mut best_binding_payoffs = vec![Point::default(); states];
        let mut best_binding_choices: Vec<Option<(usize, usize)>> = vec![None; states];
        let mut passes = 0;

        loop {
            let mut pivot_error: f64 = 0.;
            for state in 0..states {
                let mut best_level = f64::MIN;
                for (position, action) in self.actions[state].iter().enumerate() {
                    let payoff = self.game.payoff(state, action.profile());
                    let probabilities = self.game.probabilities(state, action.profile());
                    let non_binding =
                        payoff * (1. - delta) + pivot.expectation(probabilities) * delta;
                    let argmax = action.binding_argmax(direction);
                    let aps_not_binding = match argmax {
                        None => true,
                        Some((player, endpoint, _)) => {
                            // the frontier keeps rising past the
                            // endpoint, so the discrete point understates
                            // the binding optimum
                            action.bndry_dir(player, endpoint).dot(direction)
                                > crate::SLIDE_SLACK
                        }
                    };
                    let best_aps = argmax.map(|(player, endpoint, _)| {
                        (
                            payoff * (1. - delta) + action.points(player)[endpoint] * delta,
                            (player, endpoint),
                        )
                    });
                    let non_binding_ok = aps_not_binding
                        || best_aps
                            .map(|(aps, _)| {
                                aps.dot(direction)
                                    > non_binding.dot(direction) - crate::REGIME_SLACK
                            })
                            .unwrap_or(true);
                    if non_binding_ok {
                        if non_binding.dot(direction) > best_level {
                            best_level = non_binding.dot(direction);
                            best_aps_not_binding[state] = aps_not_binding;
                            if let (false, Some((aps, choice))) = (aps_not_binding, best_aps) {
                                best_binding_payoffs[state] = aps;
                                best_binding_choices[state] = Some(choice);
                            } else {
                                best_binding_choices[state] = None;
                            }
                            new_actions[state] = position;
                            new_regimes[state] = Regime::NonBinding;
                            new_bindings[state] = None;
                            new_pivot[state] = non_binding;
                        }
                    } else if let Some((aps, choice)) = best_aps {
                        if aps.dot(direction) < non_binding.dot(direction) + crate::REGIME_SLACK
                            && aps.dot(direction) > best_level
                        {
                            best_level = aps.dot(direction);
                            best_aps_not_binding[state] = false;
                            best_binding_payoffs[state] = aps;
                            best_binding_choices[state] = Some(choice);
                            new_actions[state] = position;
                            new_regimes[state] = Regime::Binding;
                            new_bindings[state] = Some(choice);
                            new_pivot[state] = aps;
                        }
                    }
                }
                pivot_error = pivot_error.max((best_level - pivot[state].dot(direction)).abs());
            }

            pivot.clone_from(&new_pivot);
            action_tuple.copy_from_slice(&new_actions);
            regime_tuple.copy_from_slice(&new_regimes);
            bindings.copy_from_slice(&new_bindings);

            // fix regime reversals against the Bellman fixed point
            loop {
                self.policy_to_payoffs(pivot, action_tuple, regime_tuple);
                let mut gaps = vec![0.; states];
                let mut max_gap = 0.;
                let mut any_violation = false;
                for state in 0..states {
                    if !best_aps_not_binding[state] && regime_tuple[state] == Regime::NonBinding {
                        gaps[state] = pivot[state].dot(direction)
                            - best_binding_payoffs[state].dot(direction);
                        if gaps[state] > max_gap {
                            any_violation = true;
                            max_gap = gaps[state];
                        }
                    }
                }
                if !any_violation {
                    break;
                }
                for state in 0..states {
                    if !best_aps_not_binding[state]
                        && regime_tuple[state] == Regime::NonBinding
                        && gaps[state] >= delta * max_gap
                    {
                        pivot[state] = best_binding_payoffs[state];
                        regime_tuple[state] = Regime::Binding;
                        bindings[state] = best_binding_choices[state];
                    }
                }
            }

            passes += 1;
            if pivot_error <= self.env.policy_iter_tol {
                break;
            }
            if passes >= self.env.max_policy_iterations {
                log::warn!("maximum policy iterations reached at error {:e}", pivot_error);
                break;
            }
            new_pivot.clone_from(pivot);
            new_actions.copy_from_slice(action_tuple);
            new_regimes.copy_from_slice(regime_tuple);
            new_bindings.copy_from_slice(bindings);
        }
    }

    /// Bellman iteration: advance the non-binding states toward the
    /// fixed point of the chosen policy, holding binding states still
    fn policy_to_payoffs(&self, pivot: &mut Tuple, action_tuple: &[usize], regime_tuple: &[Regime]) {
        let delta = self.game.delta();
        let mut passes = 0;
        loop {
            let mut new_pivot = pivot.clone();
            for state in 0..self.game.num_states() {
                if regime_tuple[state] == Regime::NonBinding {
                    let action = &self.actions[state][action_tuple[state]];
                    let payoff = self.game.payoff(state, action.profile());
                    let probabilities = self.game.probabilities(state, action.profile());
                    new_pivot[state] =
                        payoff * (1. - delta) + pivot.expectation(probabilities) * delta;
                }
            }
            let gap = Tuple::distance(&new_pivot, pivot);
            pivot.clone_from(&new_pivot);
            passes += 1;
            if gap <= self.env.update_pivot_tol {
                break;
            }
            if passes >= self.env.max_update_pivot_passes {
                log::warn!("maximum pivot update passes reached at gap {:e}", gap);
                break;
            }
        }
    }

    /// smallest nonnegative rotation weight toward the normal at which a
    /// different (action, regime) pair becomes weakly preferred in some
    /// state. errs when no candidate is admissible, which callers may
    /// treat as convergence at a degenerate point.
    fn sensitivity(
        &self,
        pivot: &Tuple,
        action_tuple: &[usize],
        regime_tuple: &[Regime],
        direction: &Point,
    ) -> Result<f64, SolveError> {
        let normal = direction.normal();
        let delta = self.game.delta();
        let mut best_level: Option<f64> = None;

        for state in 0..self.game.num_states() {
            for (position, action) in self.actions[state].iter().enumerate() {
                let payoff = self.game.payoff(state, action.profile());
                let probabilities = self.game.probabilities(state, action.profile());
                let non_binding = payoff * (1. - delta) + pivot.expectation(probabilities) * delta;

                // rotation at which this action's non-binding payoff
                // catches the pivot
                let denom = normal.dot(&(non_binding - pivot[state]));
                let numer = (pivot[state] - non_binding).dot(direction);
                if Point::distance(&pivot[state], &non_binding) > crate::MERGE_TOL
                    && denom.abs() > crate::DENOM_TOL
                {
                    let level = numer / denom;
                    if level < best_level.unwrap_or(f64::MAX) && level > -crate::MERGE_TOL {
                        let indiff = *direction + normal * level;
                        let mut best_bind: Option<(usize, usize, f64)> = None;
                        for player in 0..2 {
                            for (endpoint, point) in action.points(player).iter().enumerate() {
                                let lvl = point.dot(&indiff);
                                let take = match best_bind {
                                    None => true,
                                    Some((_, _, incumbent)) => {
                                        lvl > incumbent
                                            || (lvl > incumbent - crate::SLIDE_SLACK
                                                && point.dot(&normal) >= 0.)
                                    }
                                };
                                if take {
                                    best_bind = Some((player, endpoint, lvl));
                                }
                            }
                        }
                        let aps_not_binding = match best_bind {
                            None => true,
                            Some((player, endpoint, _)) => {
                                action.bndry_dir(player, endpoint).dot(&indiff) > crate::MERGE_TOL
                            }
                        };
                        let attainable = aps_not_binding
                            || best_bind
                                .map(|(_, _, lvl)| {
                                    lvl > non_binding.dot(&indiff) - crate::INDIFF_SLACK
                                })
                                .unwrap_or(true);
                        if attainable
                            && ((position != action_tuple[state] && denom > crate::MERGE_TOL)
                                || (position == action_tuple[state]
                                    && denom < -crate::MERGE_TOL
                                    && regime_tuple[state] == Regime::Binding))
                        {
                            best_level = Some(level);
                        }
                    }
                }

                // rotations at which a binding endpoint catches the pivot
                for player in 0..2 {
                    for point in action.points(player).iter() {
                        let binding = payoff * (1. - delta) + *point * delta;
                        let denom = normal.dot(&(binding - pivot[state]));
                        let numer = (pivot[state] - binding).dot(direction);
                        if Point::distance(&pivot[state], &binding) <= crate::MERGE_TOL
                            || denom.abs() <= crate::DENOM_TOL
                        {
                            continue;
                        }
                        let level = numer / denom;
                        if level < best_level.unwrap_or(f64::MAX) && level > -crate::MERGE_TOL {
                            let indiff = *direction + normal * level;
                            if non_binding.dot(&indiff) >= binding.dot(&indiff) - crate::MERGE_TOL
                                && ((position != action_tuple[state]
                                    && denom > crate::MERGE_TOL)
                                    || (position == action_tuple[state]
                                        && ((regime_tuple[state] == Regime::NonBinding
                                            && denom < -crate::MERGE_TOL)
                                            || (regime_tuple[state] == Regime::Binding
                                                && denom > crate::MERGE_TOL))))
                            {
                                best_level = Some(level);
                            }
                        }
                    }
                }
            }
        }

        match best_level {
            Some(level) => Ok(level.max(0.)),
            None => Err(SolveError::NoAdmissibleDirection),
        }
    }

    /// keep a payoff tuple that APS can enforce: binding continuations
    /// where some action still has them, otherwise the Bellman fixed
    /// point of an arbitrary policy, advanced until it satisfies IC
    fn find_feasible_tuple(&self, feasible: &mut Tuple) -> Result<(), SolveError> {
        let states = self.game.num_states();
        let delta = self.game.delta();
        let mut action_tuple = vec![0usize; states];
        let mut regime_tuple = vec![Regime::Binding; states];
        let mut any_non_binding = false;

        for state in 0..states {
            let mut found = false;
            for action in self.actions[state].iter() {
                if let Some(player) = (0..2).find(|p| !action.points(*p).is_empty()) {
                    let payoff = self.game.payoff(state, action.profile());
                    feasible[state] =
                        payoff * (1. - delta) + action.points(player)[0] * delta;
                    found = true;
                    break;
                }
            }
            if !found {
                regime_tuple[state] = Regime::NonBinding;
                action_tuple[state] = 0;
                any_non_binding = true;
            }
        }

        let mut not_all_ic = any_non_binding;
        while not_all_ic {
            self.policy_to_payoffs(feasible, &action_tuple, &regime_tuple);
            not_all_ic = false;
            for state in 0..states {
                if regime_tuple[state] == Regime::Binding {
                    continue;
                }
                let action = &self.actions[state][action_tuple[state]];
                let expectation =
                    feasible.expectation(self.game.probabilities(state, action.profile()));
                let min_ic = action.min_ic();
                if !(expectation[0] >= min_ic[0] && expectation[1] >= min_ic[1]) {
                    not_all_ic = true;
                    action_tuple[state] += 1;
                    if action_tuple[state] >= self.actions[state].len() {
                        return Err(SolveError::NoFeasibleTuple);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::EndowmentMode;
    use crate::gameplay::RiskSharing;

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

    fn abreu_sannikov() -> Game {
        let xs = [18., 23., 11., 5., 12., 7., 2., 1., -3.];
        let ys = [11., 3., 2., 15., 6., -2., 5., 2., -13.];
        let payoffs = vec![xs
            .iter()
            .zip(ys.iter())
            .map(|(x, y)| Point::new(*x, *y))
            .collect::<Vec<Point>>()];
        let probabilities = vec![vec![vec![1.]; 9]];
        Game::new(0.3, vec![[3, 3]], payoffs, probabilities).expect("valid game")
    }

    #[test]
    fn prisoners_dilemma_threat_is_static_nash() {
        let env = Environment::default();
        let game = prisoners_dilemma();
        let mut solver = Solver::new(&env, &game);
        solver.solve(crate::NUM_DIRECTIONS).expect("converges");
        let threat = solver.threat();
        assert!((threat[0][0] - 1.).abs() < 1e-3, "threat {}", threat[0]);
        assert!((threat[0][1] - 1.).abs() < 1e-3, "threat {}", threat[0]);
    }

    #[test]
    fn prisoners_dilemma_supports_cooperation() {
        let env = Environment::default();
        let game = prisoners_dilemma();
        let mut solver = Solver::new(&env, &game);
        solver.solve(crate::NUM_DIRECTIONS).expect("converges");
        let northeast = Point::new(1., 1.).normalize();
        let best = solver
            .solution()
            .last()
            .expect("stored")
            .steps()
            .iter()
            .map(|step| step.pivot()[0].dot(&northeast))
            .fold(f64::MIN, f64::max);
        // the cooperative payoff (3, 3) is the northeast extreme
        assert!((best - 6. / 2f64.sqrt()).abs() < 1e-2, "best level {}", best);
    }

    #[test]
    fn pivots_dominate_the_threat() {
        let env = Environment::default();
        let game = abreu_sannikov();
        let mut solver = Solver::new(&env, &game);
        solver.solve(crate::NUM_DIRECTIONS).expect("converges");
        let threat = solver.threat().clone();
        let (lb, _) = game.payoff_bounds();
        for state in 0..game.num_states() {
            for player in 0..2 {
                assert!(threat[state][player] >= lb[player] - env.past_threat_tol);
            }
        }
        for step in solver.solution().last().expect("stored").steps() {
            for state in 0..game.num_states() {
                for player in 0..2 {
                    assert!(
                        step.pivot()[state][player]
                            >= threat[state][player] - env.past_threat_tol - 1e-6
                    );
                }
            }
        }
    }

    #[test]
    fn levels_shrink_monotonically() {
        let mut env = Environment::default();
        env.store_iterations = 2;
        env.store_actions = false;
        env.error_tol = 1e-4;
        let game = abreu_sannikov();
        let mut solver = Solver::new(&env, &game);
        solver.solve(64).expect("converges");
        let iterations = solver.solution().iterations();
        assert!(iterations.len() >= 2);
        for pair in iterations.windows(2) {
            for (before, after) in pair[0].steps().iter().zip(pair[1].steps().iter()) {
                for state in 0..game.num_states() {
                    assert!(
                        after.hyperplane().levels()[state]
                            <= before.hyperplane().levels()[state] + 1e-6
                    );
                }
            }
        }
    }

    #[test]
    fn degenerate_game_has_no_admissible_direction() {
        let env = Environment::default();
        let payoffs = vec![vec![Point::new(0., 0.)]];
        let probabilities = vec![vec![vec![1.]]];
        let game = Game::new(0.5, vec![[1, 1]], payoffs, probabilities).expect("valid game");
        let mut solver = Solver::new(&env, &game);
        assert!(matches!(
            solver.solve_endogenous(),
            Err(SolveError::NoAdmissibleDirection)
        ));
    }

    #[test]
    fn risk_sharing_threat_is_autarky() {
        let env = Environment::default();
        let rsg = RiskSharing::new(0.7, 2, 9, 0., EndowmentMode::Consumption);
        let game = rsg.game().expect("valid economy");
        let mut solver = Solver::new(&env, &game);
        solver.solve_endogenous().expect("converges");
        let autarky = rsg.autarky();
        let threat = solver.threat();
        for state in 0..game.num_states() {
            for player in 0..2 {
                assert!(
                    (threat[state][player] - autarky[state][player]).abs() < 1e-3,
                    "state {} player {}: threat {} vs autarky {}",
                    state,
                    player,
                    threat[state][player],
                    autarky[state][player],
                );
            }
        }
    }

    #[test]
    fn reloaded_game_solves_identically() {
        let env = Environment::default();
        let game = prisoners_dilemma();
        let json = serde_json::to_string(&game).expect("serialize");
        let reloaded = serde_json::from_str::<Game>(&json).expect("deserialize");
        let mut first = Solver::new(&env, &game);
        let mut second = Solver::new(&env, &reloaded);
        first.solve(64).expect("converges");
        second.solve(64).expect("converges");
        assert!(first.threat() == second.threat());
        let a = first.solution().last().expect("stored");
        let b = second.solution().last().expect("stored");
        assert!(a.steps().len() == b.steps().len());
        for (x, y) in a.steps().iter().zip(b.steps().iter()) {
            assert!(x.hyperplane().levels() == y.hyperplane().levels());
            assert!(x.pivot() == y.pivot());
        }
    }

    #[test]
    fn policy_iteration_reaches_a_fixed_point() {
        let env = Environment::default();
        let game = prisoners_dilemma();
        let mut solver = Solver::new(&env, &game);
        solver.initialize();
        let direction = Point::new(0., 1.);
        let mut pivot = solver.threat().clone();
        let mut action_tuple = vec![0usize];
        let mut regime_tuple = vec![Regime::Binding];
        let mut bindings = vec![None];
        solver.optimize_policy(
            &mut pivot,
            &mut action_tuple,
            &mut regime_tuple,
            &mut bindings,
            &direction,
        );
        let fixed = pivot.clone();
        solver.optimize_policy(
            &mut pivot,
            &mut action_tuple,
            &mut regime_tuple,
            &mut bindings,
            &direction,
        );
        assert!(
            (fixed[0].dot(&direction) - pivot[0].dot(&direction)).abs() < env.policy_iter_tol
        );
    }
}
