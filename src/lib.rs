pub mod gameplay;
pub mod geometry;
pub mod solver;

/// dimensional analysis types
pub type Payoff = f64;
pub type Level = f64;
pub type Discount = f64;
pub type Probability = f64;

/// default number of search directions for the fixed-direction solver,
/// rounded up to a multiple of 4 so the cardinal directions are included
pub const NUM_DIRECTIONS: usize = 200;

// policy iteration slacks
const REGIME_SLACK: f64 = 1e-7;
const SLIDE_SLACK: f64 = 1e-8;

// sensitivity analysis slacks
const MERGE_TOL: f64 = 1e-6;
const DENOM_TOL: f64 = 1e-10;
const INDIFF_SLACK: f64 = 1e-10;

pub const PROGRESS_STYLE: &str = "{spinner:.cyan} {elapsed} ~ {percent:>3}% {wide_bar:.cyan}";

/// trait for random generation, mainly (strictly?) for testing
pub trait Arbitrary {
    fn random() -> Self;
}

/// progress bar
pub fn progress(n: usize) -> indicatif::ProgressBar {
    let tick = std::time::Duration::from_secs(60);
    let style = indicatif::ProgressStyle::with_template(PROGRESS_STYLE).unwrap();
    let progress = indicatif::ProgressBar::new(n as u64);
    progress.set_style(style);
    progress.enable_steady_tick(tick);
    progress
}

/// initialize logging to terminal and a timestamped file
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
