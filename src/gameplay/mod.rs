pub mod game;
pub mod risksharing;

pub use game::Game;
pub use risksharing::EndowmentMode;
pub use risksharing::RiskSharing;
