use std::fmt;

use serde::{Deserialize, Serialize};

use crate::trading::utils::fibonacci::{
    FIBONACCI_ONE_POINT_SIX_ONE_EIGHT, FIBONACCI_ONE_POINT_ZERO,
    FIBONACCI_ZERO_POINT_SIX_ONE_EIGHT, FIBONACCI_ZERO_POINT_THREE_EIGHT_TWO,
};

/// 波段方向
///
/// - `Up`: Focus(B) 为高点，Reaction(A) 为低点，Fibnode 在下方作为支撑
/// - `Down`: Focus(B) 为低点，Reaction(A) 为高点，Fibnode 在上方作为阻力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// 以 Focus 点的极性确定方向
    pub fn from_focus_is_high(is_high: bool) -> Self {
        if is_high {
            Trend::Up
        } else {
            Trend::Down
        }
    }
}

/// 回撤比率：F3 = .382，F5 = .618
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum FibRatio {
    F3,
    F5,
}

impl FibRatio {
    pub const ALL: [FibRatio; 2] = [FibRatio::F3, FibRatio::F5];

    pub fn ratio(&self) -> f64 {
        match self {
            FibRatio::F3 => FIBONACCI_ZERO_POINT_THREE_EIGHT_TWO,
            FibRatio::F5 => FIBONACCI_ZERO_POINT_SIX_ONE_EIGHT,
        }
    }
}

/// 扩展目标：COP = .618，OP = 1.0，XOP = 1.618
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ObjectiveKind {
    #[serde(rename = "COP")]
    Cop,
    #[serde(rename = "OP")]
    Op,
    #[serde(rename = "XOP")]
    Xop,
}

impl ObjectiveKind {
    pub const ALL: [ObjectiveKind; 3] = [ObjectiveKind::Cop, ObjectiveKind::Op, ObjectiveKind::Xop];

    pub fn ratio(&self) -> f64 {
        match self {
            ObjectiveKind::Cop => FIBONACCI_ZERO_POINT_SIX_ONE_EIGHT,
            ObjectiveKind::Op => FIBONACCI_ONE_POINT_ZERO,
            ObjectiveKind::Xop => FIBONACCI_ONE_POINT_SIX_ONE_EIGHT,
        }
    }
}

impl fmt::Display for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectiveKind::Cop => "COP",
            ObjectiveKind::Op => "OP",
            ObjectiveKind::Xop => "XOP",
        };
        f.write_str(name)
    }
}

/// 聚类类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ClusterKind {
    /// 全部为来自不同波段的 Fibnode
    Confluence,
    /// 至少一个 Fibnode + 至少一个 Objective Point
    Agreement,
}

/// 价格容差：绝对价差，或价格的百分比
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum Tolerance {
    Absolute(f64),
    /// 百分比，0.5 表示 0.5%
    Percent(f64),
}

impl Tolerance {
    /// 在给定价格处的容差宽度
    pub fn width_at(&self, price: f64) -> f64 {
        match *self {
            Tolerance::Absolute(width) => width,
            Tolerance::Percent(pct) => price.abs() * pct / 100.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        let v = match *self {
            Tolerance::Absolute(v) | Tolerance::Percent(v) => v,
        };
        v.is_finite() && v > 0.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Percent(0.5)
    }
}
