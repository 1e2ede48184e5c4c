//! Kocherlakota style risk sharing: sweep persistence values, solve each
//! economy with endogenous directions, then simulate the best and worst
//! equilibria of the middle endowment state.

use clap::Parser;
use subgame::gameplay::EndowmentMode;
use subgame::gameplay::RiskSharing;
use subgame::geometry::Point;
use subgame::solver::Environment;
use subgame::solver::Simulator;
use subgame::solver::SolveError;
use subgame::solver::Solver;

#[derive(Parser)]
struct Args {
    #[arg(long, default_value_t = 0.7)]
    delta: f64,
    #[arg(long, default_value_t = 2)]
    endowments: usize,
    #[arg(long, default_value_t = 80)]
    c2e: usize,
    #[arg(long, default_value_t = 0.)]
    persistence: f64,
    #[arg(long, default_value_t = 0.25)]
    persistence_step: f64,
    #[arg(long, default_value_t = 1)]
    economies: usize,
    #[arg(long, default_value_t = 1_000)]
    sims: usize,
    #[arg(long, default_value_t = 100_000)]
    periods: usize,
}

fn main() {
    subgame::log();
    let args = Args::parse();
    let progress = subgame::progress(args.economies);
    let mut persistence = args.persistence;

    for _ in 0..args.economies {
        match run(&args, persistence) {
            Ok(()) => {}
            Err(SolveError::NoAdmissibleDirection) => {
                log::warn!("degenerate economy at persistence {}, skipping", persistence);
            }
            Err(e) => {
                log::error!("aborting sweep: {}", e);
                break;
            }
        }
        persistence += args.persistence_step;
        progress.inc(1);
    }
    progress.finish();
}

fn run(args: &Args, persistence: f64) -> Result<(), SolveError> {
    log::info!("solving economy with persistence {}", persistence);
    let rsg = RiskSharing::new(
        args.delta,
        args.endowments,
        args.c2e,
        persistence,
        EndowmentMode::Consumption,
    );
    let game = rsg.game()?;
    let env = Environment::default();
    let mut solver = Solver::new(&env, &game);
    solver.solve_endogenous()?;
    log::info!("terminal threat tuple: {}", solver.threat());
    log::info!("autarky payoffs:       {}", rsg.autarky());

    let solution = solver.into_solution();
    let revolution = solution.last().expect("stored revolution");
    let middle = (args.endowments - 1) / 2;
    let northeast = Point::new(1., 1.);
    let (best, worst) = revolution.steps().iter().enumerate().fold(
        ((0, f64::MIN), (0, f64::MAX)),
        |((best, hi), (worst, lo)), (index, step)| {
            let level = step.pivot()[middle].dot(&northeast);
            (
                if level > hi { (index, level) } else { (best, hi) },
                if level < lo { (index, level) } else { (worst, lo) },
            )
        },
    );

    let simulator = Simulator::new(&solution);
    let payoffs = simulator.simulate(args.sims, args.periods, middle, best.0);
    log::info!("best long run payoffs:  {}", payoffs);
    let payoffs = simulator.simulate(args.sims, args.periods, middle, worst.0);
    log::info!("worst long run payoffs: {}", payoffs);
    Ok(())
}
