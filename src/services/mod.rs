pub mod circles;
pub mod discussions;
pub mod leaderboard;
pub mod polls;
pub mod ranking;
pub mod store;

pub use leaderboard::LeaderboardService;
pub use store::{CircleDirectory, ContentQuery, ContentStore};
