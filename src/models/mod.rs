pub mod content;
pub mod leaderboard;

pub use content::{CircleInfo, Comment, ContentItem, ContentKind, ContentPayload};
pub use leaderboard::{
    CircleLeaderboardEntry, DiscussionLeaderboardEntry, Leaderboard, PollLeaderboardEntry,
};
