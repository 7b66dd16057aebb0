use crate::core::game::GameService;
use crate::domain::model::{CountRow, ScoreRow};
use crate::utils::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    pub limit: i64,
    pub by_score: Vec<ScoreRow>,
    pub by_count: Vec<CountRow>,
}

impl GameService {
    /// Clamps the requested size into `[1, leaderboard_max]`.
    pub fn leaderboard_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.rules.leaderboard_default)
            .clamp(1, self.rules.leaderboard_max)
    }

    pub fn leaderboard(&self, requested: Option<i64>) -> Result<Leaderboard> {
        let limit = self.leaderboard_limit(requested);
        Ok(Leaderboard {
            limit,
            by_score: self.store.score_leaderboard(limit)?,
            by_count: self.store.count_leaderboard(limit)?,
        })
    }
}
