use super::error::SolveError;
use super::iteration::Iteration;
use crate::gameplay::Game;
use serde::Deserialize;
use serde::Serialize;

/// everything a solve produces: the game it ran on and the retained
/// iteration log. the final iteration carries the converged boundary
/// (directions, levels and pivots per step) and the terminal threat
/// tuple. a plain data tree, safe to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    game: Game,
    iterations: Vec<Iteration>,
}

impl Solution {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            iterations: Vec::new(),
        }
    }
    /// append an iteration record. replace = keep only the newest, for
    /// bounded-memory runs that still want the final revolution.
    pub fn push(&mut self, iteration: Iteration, replace: bool) {
        if replace {
            self.iterations.clear();
        }
        self.iterations.push(iteration);
    }
    pub fn game(&self) -> &Game {
        &self.game
    }
    pub fn iterations(&self) -> &[Iteration] {
        &self.iterations
    }
    pub fn last(&self) -> Option<&Iteration> {
        self.iterations.last()
    }

    pub fn save(&self, path: &str) -> Result<(), SolveError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)?;
        Ok(())
    }
    pub fn load(path: &str) -> Result<Self, SolveError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::Game;
    use crate::Arbitrary;

    #[test]
    fn game_round_trips_through_json() {
        let game = Game::random();
        let json = serde_json::to_string(&game).expect("serialize");
        let back = serde_json::from_str::<Game>(&json).expect("deserialize");
        assert!(game == back);
    }

    #[test]
    fn replace_keeps_only_the_newest() {
        use crate::geometry::Point;
        use crate::geometry::Tuple;
        let game = Game::random();
        let mut solution = Solution::new(game);
        let threat = Tuple::filled(1, Point::default());
        solution.push(Iteration::new(0, threat.clone(), None), true);
        solution.push(Iteration::new(1, threat.clone(), None), true);
        assert!(solution.iterations().len() == 1);
        assert!(solution.last().expect("nonempty").number() == 1);
    }
}
