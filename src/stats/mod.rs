mod reducer;
mod types;

pub use reducer::{update_stats, SessionEvent};
pub use types::{level_for_xp, UserStats};
