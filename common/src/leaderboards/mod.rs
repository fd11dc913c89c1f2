pub mod errors;
pub mod reducers;
pub mod state;
pub mod sync;
pub mod view;

pub use errors::{CreateLeaderboardError, JoinLeaderboardError, classify_status};
pub use reducers::Mutation;
pub use state::LeaderboardCache;
pub use sync::{LeaderboardApi, LeaderboardSync};
pub use view::CombinedLeaderboard;
