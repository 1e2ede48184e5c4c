use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use subgame::gameplay::Game;
use subgame::geometry::Point;
use subgame::solver::Environment;
use subgame::solver::Solver;

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

fn bench_fixed(c: &mut Criterion) {
    let env = Environment {
        store_iterations: 0,
        ..Environment::default()
    };
    let game = prisoners_dilemma();
    c.bench_function("solve fixed 64 directions", |b| {
        b.iter(|| {
            let mut solver = Solver::new(&env, &game);
            solver.solve(64).expect("converges");
        })
    });
}

fn bench_endogenous(c: &mut Criterion) {
    let env = Environment {
        store_iterations: 0,
        ..Environment::default()
    };
    let game = prisoners_dilemma();
    c.bench_function("solve endogenous", |b| {
        b.iter(|| {
            let mut solver = Solver::new(&env, &game);
            solver.solve_endogenous().expect("converges");
        })
    });
}

criterion_group!(benches, bench_fixed, bench_endogenous);
criterion_main!(benches);
