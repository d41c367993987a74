//! Simulation state, events and scoring

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current state of a play session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimState {
    /// Playing: aiming or ball in flight
    Active,
    /// Goal reached
    Completed,
    /// Out of attempts
    Failed,
}

/// Things the host may want to react to (sounds, UI, persistence)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    BallLaunched { attempts_left: u32 },
    WallBounced,
    PlatformBounced { index: usize },
    TreasureCollected { index: usize },
    /// An attempt ended without reaching the goal
    AttemptEnded { attempts_left: u32 },
    Completed(LevelScoreData),
    Failed,
    Restarted,
}

/// Result of a completed level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelScoreData {
    pub treasures_collected: u32,
    pub treasures_in_level: u32,
    pub balls_left: u32,
    /// Whole seconds
    pub time_spent: u32,
    pub par_time: u32,
    pub score: u32,
}

impl LevelScoreData {
    /// Score a finished level. `elapsed` is rounded down to whole seconds.
    pub fn new(
        treasures_collected: u32,
        treasures_in_level: u32,
        balls_left: u32,
        elapsed: f32,
        par_time: u32,
    ) -> Self {
        let time_spent = elapsed.max(0.0).floor() as u32;
        let par_bonus = if time_spent <= par_time { PAR_BONUS } else { 0 };
        // Saturates for absurd ball counts from hand-edited levels
        let score = TREASURE_POINTS
            .saturating_mul(treasures_collected)
            .saturating_add(BALL_POINTS.saturating_mul(balls_left))
            .saturating_add(par_bonus)
            .saturating_add(COMPLETION_BONUS);
        Self {
            treasures_collected,
            treasures_in_level,
            balls_left,
            time_spent,
            par_time,
            score,
        }
    }

    pub fn made_par(&self) -> bool {
        self.time_spent <= self.par_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_formula() {
        let data = LevelScoreData::new(2, 3, 1, 45.9, 60);
        assert_eq!(data.time_spent, 45);
        assert_eq!(data.score, 500 * 2 + 150 + 100 + 42);
        assert!(data.made_par());
    }

    #[test]
    fn test_over_par() {
        let data = LevelScoreData::new(0, 0, 0, 61.2, 60);
        assert_eq!(data.time_spent, 61);
        assert_eq!(data.score, 42);
        assert!(!data.made_par());
    }

    #[test]
    fn test_par_is_inclusive_after_flooring() {
        let data = LevelScoreData::new(0, 1, 2, 60.99, 60);
        assert_eq!(data.time_spent, 60);
        assert_eq!(data.score, 300 + 100 + 42);
    }

    #[test]
    fn test_huge_ball_count_saturates() {
        let data = LevelScoreData::new(0, 0, 30_000_000, 1.0, 60);
        assert_eq!(data.balls_left, 30_000_000);
        assert_eq!(data.score, u32::MAX);

        let data = LevelScoreData::new(u32::MAX, u32::MAX, u32::MAX, 1.0, 60);
        assert_eq!(data.score, u32::MAX);
    }
}
