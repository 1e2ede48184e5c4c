use super::env::Environment;
use crate::gameplay::Game;
use crate::geometry::Point;
use crate::geometry::Tuple;
use crate::Level;
use crate::Payoff;

/// a (state, action profile) pair together with everything the solver
/// learns about it: the minimum incentive compatible continuation for
/// each player, and the segment of binding continuation payoffs that
/// survives trimming against the current approximation.
///
/// per player the binding segment is empty or has exactly two endpoints,
/// ordered descending in the other player's coordinate. each endpoint
/// remembers which recorded pivot it was interpolated from (None for
/// synthesized corners and box points) and the outward frontier
/// direction used by the can-slide test.
#[derive(Debug, Clone)]
pub struct Action {
    state: usize,
    profile: usize,
    min_ic: Point,
    points: [Vec<Point>; 2],
    tuples: [Vec<Option<usize>>; 2],
    bndry_dirs: [Vec<Point>; 2],
    trimmed: [Vec<Point>; 2],
    trimmed_tuples: [Vec<Option<usize>>; 2],
    trimmed_dirs: [Vec<Point>; 2],
    corner: bool,
}

impl Action {
    pub fn new(state: usize, profile: usize) -> Self {
        Self {
            state,
            profile,
            min_ic: Point::default(),
            points: Default::default(),
            tuples: Default::default(),
            bndry_dirs: Default::default(),
            trimmed: Default::default(),
            trimmed_tuples: Default::default(),
            trimmed_dirs: Default::default(),
            corner: false,
        }
    }

    pub fn state(&self) -> usize {
        self.state
    }
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
    pub fn bndry_dir(&self, player: usize, endpoint: usize) -> Point {
        self.bndry_dirs[player][endpoint]
    }
    pub fn corner(&self) -> bool {
        self.corner
    }
    pub fn has_binding(&self) -> bool {
        !self.points[0].is_empty() || !self.points[1].is_empty()
    }

    /// an action stays alive if it still has binding continuations, or
    /// if the given feasible continuation satisfies both IC constraints
    pub fn supportable(&self, expectation: &Point, env: &Environment) -> bool {
        self.has_binding()
            || (expectation[0] >= self.min_ic[0] - env.ic_tol
                && expectation[1] >= self.min_ic[1] - env.ic_tol)
    }

    /// highest deviation gain over all of one player's unilateral
    /// deviations, given the current threat tuple
    pub fn calculate_min_ic(&mut self, game: &Game, update: [bool; 2], threat: &Tuple) {
        let (lb, _) = game.payoff_bounds();
        for player in 0..2 {
            if !update[player] {
                continue;
            }
            if game.is_unconstrained(player) {
                // no constraint inside the payoff box
                self.min_ic[player] = lb[player];
                continue;
            }
            let own = game.payoff(self.state, self.profile)[player];
            let scale = (1. - game.delta()) / game.delta();
            self.min_ic[player] = game
                .deviations(self.state, self.profile, player)
                .map(|dev| {
                    scale * (game.payoff(self.state, dev)[player] - own)
                        + threat.expectation_of(game.probabilities(self.state, dev), player)
                })
                .fold(f64::MIN, f64::max);
        }
    }

    /// restart the trimmed segments from the IC corner rays, clipped to
    /// nothing yet: player 0's segment runs up the line x = min_ic.x to
    /// the payoff ceiling, player 1's runs along y = min_ic.y to the
    /// payoff ceiling. callers trim these against the four cardinal
    /// half-planes of the payoff box before committing.
    pub fn reset_trimmed(&mut self, ub: &Point) {
        self.trimmed[0] = vec![Point::new(self.min_ic[0], ub.y()), self.min_ic];
        self.trimmed[1] = vec![Point::new(ub.x(), self.min_ic[1]), self.min_ic];
        self.trimmed_dirs[0] = vec![Point::new(1., 0.); 2];
        self.trimmed_dirs[1] = vec![Point::new(0., 1.); 2];
        self.trimmed_tuples = [vec![None; 2], vec![None; 2]];
    }

    /// clip the in-progress segments against { x : direction . x <= level }
    pub fn trim(&mut self, direction: &Point, level: Level, env: &Environment) {
        for player in 0..2 {
            Self::clip(
                env,
                player,
                &mut self.trimmed[player],
                &mut self.trimmed_tuples[player],
                &mut self.trimmed_dirs[player],
                direction,
                level,
            );
        }
    }

    /// clip the committed segments against the half-plane below the ray
    /// from the pivot along the direction
    pub fn intersect_ray(&mut self, pivot: &Point, direction: &Point, env: &Environment) {
        let normal = direction.normal();
        let level = normal.dot(pivot);
        for player in 0..2 {
            Self::clip(
                env,
                player,
                &mut self.points[player],
                &mut self.tuples[player],
                &mut self.bndry_dirs[player],
                &normal,
                level,
            );
        }
    }

    /// promote the in-progress trim to the committed segments
    pub fn update_trim(&mut self) {
        self.points = self.trimmed.clone();
        self.tuples = self.trimmed_tuples.clone();
        self.bndry_dirs = self.trimmed_dirs.clone();
        for player in 0..2 {
            if self.points[player].is_empty() {
                self.tuples[player].clear();
                self.bndry_dirs[player].clear();
            }
        }
    }

    fn clip(
        env: &Environment,
        player: usize,
        segment: &mut Vec<Point>,
        tuples: &mut Vec<Option<usize>>,
        dirs: &mut Vec<Point>,
        normal: &Point,
        level: Level,
    ) {
        if segment.len() != 2 {
            segment.clear();
            tuples.clear();
            dirs.clear();
            return;
        }
        let l0 = normal.dot(&segment[0]);
        let l1 = normal.dot(&segment[1]);
        if l0 > level + env.ic_tol && l1 > level + env.ic_tol {
            // both endpoints above the half-plane
            segment.clear();
            tuples.clear();
            dirs.clear();
        } else if l0 < level && l1 < level {
            // both below, nothing to cut
        } else if (l0 - l1).abs() <= env.intersect_tol {
            // straddling but degenerate
            segment.clear();
            tuples.clear();
            dirs.clear();
        } else {
            let weight = (level - l0) / (l1 - l0);
            if weight > 1. {
                segment[0] = segment[1];
                tuples[0] = tuples[1];
                dirs[0] = dirs[1];
            } else if weight < 0. {
                segment[1] = segment[0];
                tuples[1] = tuples[0];
                dirs[1] = dirs[0];
            } else {
                let intersection = segment[1] * weight + segment[0] * (1. - weight);
                let replace = if l0 < l1 { 1 } else { 0 };
                segment[replace] = intersection;
                tuples[replace] = None;
                // the frontier continues from the new endpoint along the
                // cut line. the segment lies on the owner's IC line, so
                // the slack side of the constraint picks the orientation
                let mut tangent = normal.normal();
                if tangent[player] < 0. {
                    tangent = tangent * -1.;
                }
                dirs[replace] = tangent;
            }
        }
    }

    /// recompute the binding continuation segments from the trajectory
    /// of pivots recorded on the last revolution. walks the trajectory
    /// in reverse looking for where each player's expected continuation
    /// crosses min_ic, collects flats, keeps the pair extreme in the
    /// other player's coordinate, substitutes the IC corner when the
    /// lesser endpoint fails the other player's constraint, and finally
    /// clips against the half-plane at the current pivot expectation.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_binding_continuations(
        &mut self,
        game: &Game,
        env: &Environment,
        update: [bool; 2],
        extreme_tuples: &[Tuple],
        threat: &Tuple,
        pivot: &Tuple,
        direction: &Point,
        old_west: usize,
    ) {
        let probabilities = game.probabilities(self.state, self.profile);
        let mut new_points: [Vec<Point>; 2] = Default::default();
        let mut new_tuples: [Vec<usize>; 2] = Default::default();
        let mut new_dirs: [Vec<Point>; 2] = Default::default();
        for player in 0..2 {
            if !update[player] || game.is_unconstrained(player) {
                continue;
            }
            self.points[player].clear();
            self.tuples[player].clear();
            self.bndry_dirs[player].clear();
            let mut next = extreme_tuples
                .last()
                .expect("nonempty trajectory")
                .expectation(probabilities);
            let mut index = extreme_tuples.len() - 1;
            while index > old_west {
                let point = next;
                next = extreme_tuples[index - 1].expectation(probabilities);
                let gap = point[player] - next[player];
                if gap.abs() < env.flat_tol
                    && (point[player] - self.min_ic[player]).abs() < env.flat_tol
                {
                    // a flat along the IC line
                    new_tuples[player].push(index);
                    new_tuples[player].push(index - 1);
                    new_points[player].push(point);
                    new_points[player].push(next);
                    new_dirs[player].push(Point::default());
                    new_dirs[player].push(Point::default());
                } else if (point[player] <= self.min_ic[player]
                    && self.min_ic[player] < next[player])
                    || (point[player] >= self.min_ic[player] && self.min_ic[player] > next[player])
                {
                    // expected continuations flank the IC payoff. the
                    // frontier through the crossing runs along the
                    // trajectory, oriented toward the slack side of the
                    // owner's constraint
                    let alpha = (self.min_ic[player] - next[player]) / gap;
                    let mut tangent = (point - next).normalize();
                    if tangent[player] < 0. {
                        tangent = tangent * -1.;
                    }
                    new_tuples[player].push(index);
                    new_points[player].push(next * (1. - alpha) + point * alpha);
                    new_dirs[player].push(tangent);
                }
                // stop once the trajectory falls below the threat tuple
                // for this player, within half the past-threat slack
                let tuple = &extreme_tuples[index];
                let padded = tuple + Point::new(env.past_threat_tol / 2., env.past_threat_tol / 2.);
                if tuple.strictly_below(threat, player) && !threat.strictly_below(&padded, player) {
                    break;
                }
                index -= 1;
            }
        }

        for player in 0..2 {
            if update[player] && !game.is_unconstrained(player) {
                let other = 1 - player;
                let Some((max_index, min_index)) = Self::argminmax(&new_points[player], other)
                else {
                    continue;
                };
                let max_payoff = new_points[player][max_index][other];
                let min_payoff = new_points[player][min_index][other];
                if max_payoff >= self.min_ic[other] {
                    self.points[player].push(new_points[player][max_index]);
                    self.tuples[player].push(Some(new_tuples[player][max_index]));
                    self.bndry_dirs[player].push(new_dirs[player][max_index]);
                    if min_payoff < self.min_ic[other] {
                        self.points[player].push(self.min_ic);
                        self.tuples[player].push(None);
                        self.bndry_dirs[player].push(Point::default());
                        self.corner = true;
                    } else {
                        self.points[player].push(new_points[player][min_index]);
                        self.tuples[player].push(Some(new_tuples[player][min_index]));
                        self.bndry_dirs[player].push(new_dirs[player][min_index]);
                    }
                    let expectation = pivot.expectation(probabilities);
                    let normal = direction.normal();
                    let level = normal.dot(&expectation);
                    Self::clip(
                        env,
                        player,
                        &mut self.points[player],
                        &mut self.tuples[player],
                        &mut self.bndry_dirs[player],
                        &normal,
                        level,
                    );
                }
                // otherwise nothing on the trajectory is IC
            } else if update[1 - player] && self.points[player].len() == 2 {
                // the other player's threat moved: re-test this
                // player's endpoints against the new constraint
                let other = 1 - player;
                if self.points[player][0][other] >= self.min_ic[other] {
                    if self.points[player][1][other] < self.min_ic[other] {
                        self.points[player][1] = self.min_ic;
                        self.tuples[player][1] = None;
                        self.bndry_dirs[player][1] = Point::default();
                        self.corner = true;
                    }
                } else {
                    self.points[player].clear();
                    self.tuples[player].clear();
                    self.bndry_dirs[player].clear();
                }
            }
        }

        for player in 0..2 {
            debug_assert!(
                self.points[player].is_empty()
                    || (self.points[player].len() == 2
                        && self.points[player][0][1 - player]
                            >= self.points[player][1][1 - player] - env.past_threat_tol)
            );
            debug_assert!(self.tuples[player].len() == self.points[player].len());
        }

        // keep the in-progress trim in sync so later half-plane trims
        // cut the fresh segments rather than stale ones
        self.trimmed = self.points.clone();
        self.trimmed_tuples = self.tuples.clone();
        self.trimmed_dirs = self.bndry_dirs.clone();
    }

    /// indices of the candidates extreme in the given coordinate
    fn argminmax(points: &[Point], coordinate: usize) -> Option<(usize, usize)> {
        if points.is_empty() {
            return None;
        }
        let mut max_index = 0;
        let mut min_index = 0;
        for (index, point) in points.iter().enumerate() {
            if point[coordinate] > points[max_index][coordinate] {
                max_index = index;
            }
            if point[coordinate] < points[min_index][coordinate] {
                min_index = index;
            }
        }
        Some((max_index, min_index))
    }

    /// best binding endpoint in the given direction, breaking near-ties
    /// toward endpoints whose outward frontier direction is clockwise of
    /// the search direction. None when both segments are empty.
    pub fn binding_argmax(&self, direction: &Point) -> Option<(usize, usize, Payoff)> {
        let mut best: Option<(usize, usize, Payoff)> = None;
        for player in 0..2 {
            for (endpoint, point) in self.points[player].iter().enumerate() {
                let level = point.dot(direction);
                let take = match best {
                    None => true,
                    Some((_, _, incumbent)) => {
                        level > incumbent
                            || (level > incumbent - crate::SLIDE_SLACK
                                && self.bndry_dirs[player][endpoint].dot(&direction.normal()) >= 0.)
                    }
                };
                if take {
                    best = Some((player, endpoint, level));
                }
            }
        }
        best
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Action(s={}, a={}, minIC={}, segments=({}, {}))",
            self.state,
            self.profile,
            self.min_ic,
            self.points[0].len(),
            self.points[1].len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::Game;

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

    fn boxed_action(game: &Game, profile: usize) -> Action {
        let env = Environment::default();
        let threat = Tuple::filled(1, Point::new(0., 0.));
        let (lb, ub) = game.payoff_bounds();
        let mut action = Action::new(0, profile);
        action.calculate_min_ic(game, [true, true], &threat);
        action.reset_trimmed(&ub);
        for dir in [
            Point::new(1., 0.),
            Point::new(0., 1.),
            Point::new(-1., 0.),
            Point::new(0., -1.),
        ] {
            let level = dir.dot(&lb).max(dir.dot(&ub));
            action.trim(&dir, level, &env);
        }
        action.update_trim();
        action
    }

    #[test]
    fn min_ic_is_the_best_deviation_gain() {
        let game = prisoners_dilemma();
        let threat = Tuple::filled(1, Point::new(0., 0.));
        let mut action = Action::new(0, 0); // mutual cooperation
        action.calculate_min_ic(&game, [true, true], &threat);
        // defecting gains 2 in flow, scaled by (1-d)/d = 2/3
        assert!((action.min_ic()[0] - 4. / 3.).abs() < 1e-12);
        assert!((action.min_ic()[1] - 4. / 3.).abs() < 1e-12);
    }

    #[test]
    fn boxed_segments_have_two_points() {
        let env = Environment::default();
        let game = prisoners_dilemma();
        let action = boxed_action(&game, 0);
        for player in 0..2 {
            assert!(action.points(player).len() == 2);
            assert!(action.tuples(player).len() == 2);
            for point in action.points(player) {
                assert!(point[player] >= action.min_ic()[player] - env.ic_tol);
            }
        }
        // player 0's segment is the vertical IC ray clipped to the box
        assert!(action.points(0)[0] == Point::new(4. / 3., 5.));
        assert!(action.points(0)[1] == Point::new(4. / 3., 4. / 3.));
    }

    #[test]
    fn trimming_is_idempotent() {
        let env = Environment::default();
        let game = prisoners_dilemma();
        let mut action = boxed_action(&game, 0);
        let dir = Point::new(1., 1.).normalize();
        let level = 4.2;
        action.trim(&dir, level, &env);
        action.update_trim();
        let once: [Vec<Point>; 2] = [action.points(0).to_vec(), action.points(1).to_vec()];
        action.trim(&dir, level, &env);
        action.update_trim();
        for player in 0..2 {
            assert!(action.points(player).len() == once[player].len());
            for (p, q) in action.points(player).iter().zip(once[player].iter()) {
                assert!(Point::distance(p, q) < env.intersect_tol);
            }
        }
    }

    #[test]
    fn trim_below_everything_empties_the_segment() {
        let env = Environment::default();
        let game = prisoners_dilemma();
        let mut action = boxed_action(&game, 0);
        action.trim(&Point::new(1., 0.), -10., &env);
        action.update_trim();
        assert!(action.points(0).is_empty());
        assert!(action.tuples(0).is_empty());
    }

    #[test]
    fn binding_argmax_picks_the_highest_level() {
        let game = prisoners_dilemma();
        let action = boxed_action(&game, 0);
        let (player, endpoint, level) = action
            .binding_argmax(&Point::new(0., 1.))
            .expect("nonempty segments");
        assert!(player == 0);
        assert!(endpoint == 0);
        assert!((level - 5.).abs() < 1e-12);
    }

    #[test]
    fn binding_continuations_cross_the_ic_line() {
        let env = Environment::default();
        let game = prisoners_dilemma();
        let threat = Tuple::filled(1, Point::new(0., 0.));
        let mut action = Action::new(0, 0);
        action.calculate_min_ic(&game, [true, true], &threat);
        // a square trajectory of pivots around the feasible frontier,
        // swept counterclockwise from east
        let trajectory = [
            (5., 0.),
            (5., 5.),
            (3., 5.),
            (0., 5.),
            (0., 0.),
            (5., 0.),
        ]
        .iter()
        .map(|(x, y)| Tuple::filled(1, Point::new(*x, *y)))
        .collect::<Vec<Tuple>>();
        let pivot = Tuple::filled(1, Point::new(0., 0.));
        action.calculate_binding_continuations(
            &game,
            &env,
            [true, true],
            &trajectory,
            &threat,
            &pivot,
            &Point::new(1., 0.),
            0,
        );
        for player in 0..2 {
            assert!(action.points(player).len() == 2);
            assert!(action.tuples(player).len() == 2);
            // both endpoints satisfy the player's own IC constraint
            for point in action.points(player) {
                assert!(point[player] >= action.min_ic()[player] - env.ic_tol);
            }
            // ordered descending in the other player's coordinate
            assert!(
                action.points(player)[0][1 - player]
                    >= action.points(player)[1][1 - player] - env.past_threat_tol
            );
        }
    }
}
