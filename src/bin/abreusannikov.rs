//! Single-state example from Abreu and Sannikov: two players, three
//! actions each, solved with the fixed direction circle.

use subgame::gameplay::Game;
use subgame::geometry::Point;
use subgame::solver::Environment;
use subgame::solver::Solver;

fn main() {
    subgame::log();
    let delta = 0.3;
    let xs = [18., 23., 11., 5., 12., 7., 2., 1., -3.];
    let ys = [11., 3., 2., 15., 6., -2., 5., 2., -13.];
    let payoffs = vec![xs
        .iter()
        .zip(ys.iter())
        .map(|(x, y)| Point::new(*x, *y))
        .collect::<Vec<Point>>()];
    let probabilities = vec![vec![vec![1.]; 9]];
    let game = Game::new(delta, vec![[3, 3]], payoffs, probabilities).expect("well formed game");

    log::info!("{}", game);
    let env = Environment::default();
    let mut solver = Solver::new(&env, &game);
    solver.solve(subgame::NUM_DIRECTIONS).expect("solvable game");
    log::info!("terminal threat tuple: {}", solver.threat());

    std::fs::create_dir_all("solutions").expect("create solutions directory");
    let solution = solver.into_solution();
    solution
        .save("solutions/abreusannikov.json")
        .expect("save solution");
    log::info!("saved solutions/abreusannikov.json");
}
