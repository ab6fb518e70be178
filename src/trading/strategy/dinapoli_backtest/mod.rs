//! DiNapoli 点位前向回测：点位在确认后才可见，统计支撑/阻力的守住率和扩展目标的到达率

pub mod engine;
pub mod evaluator;
pub mod stats;
pub mod types;

pub use engine::DinapoliBacktester;
pub use evaluator::{evaluate_objective, evaluate_zone, Evaluation, LevelZone};
pub use types::{
    BacktestResult, CategoryStats, ExcludedSample, HoldRule, LevelCategory, LevelOutcome,
    LevelRole, LevelSource, LevelTest, Rate, RunStatus,
};
