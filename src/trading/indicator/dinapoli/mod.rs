//! DiNapoli Levels：摆动识别 -> 点位计算 -> 聚类

pub mod cluster;
pub mod enums;
pub mod levels;
pub mod swing;

pub use cluster::{centroid_sweep, cluster_levels, ClusterGroup, ClusterOutcome, PriceLevel};
pub use enums::{ClusterKind, FibRatio, ObjectiveKind, Tolerance, Trend};
pub use levels::{
    calculate_fibnodes, calculate_objective_points, Fibnode, ObjectivePoint, SwingKey, SwingPair,
    SwingTriple,
};
pub use swing::{
    detect_swing_points, enforce_alternation, identify_market_swing, push_alternating,
    scan_swing_extrema, MarketSwing, SwingPoint,
};
