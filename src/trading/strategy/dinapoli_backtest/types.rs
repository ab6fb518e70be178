use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidSwing;
use crate::time_util::mill_time_to_date;
use crate::trading::indicator::dinapoli::{
    ClusterKind, FibRatio, ObjectiveKind, PriceLevel, SwingPoint, Trend,
};

/// 支撑/阻力 "守住" 的判定规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HoldRule {
    /// 触及后需要连续多少根收盘留在点位同侧
    pub confirm_closes: usize,
    /// 触及的那根K线收盘在同侧时是否计入
    pub count_touch_bar: bool,
}

impl Default for HoldRule {
    fn default() -> Self {
        Self {
            confirm_closes: 1,
            count_touch_bar: true,
        }
    }
}

/// 点位在回测中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum LevelRole {
    Support,
    Resistance,
}

impl From<Trend> for LevelRole {
    fn from(trend: Trend) -> Self {
        match trend {
            Trend::Up => LevelRole::Support,
            Trend::Down => LevelRole::Resistance,
        }
    }
}

/// 统计分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum LevelCategory {
    F3,
    F5,
    Confluence,
    Agreement,
    #[serde(rename = "COP")]
    Cop,
    #[serde(rename = "OP")]
    Op,
    #[serde(rename = "XOP")]
    Xop,
}

impl LevelCategory {
    pub const ALL: [LevelCategory; 7] = [
        LevelCategory::F3,
        LevelCategory::F5,
        LevelCategory::Confluence,
        LevelCategory::Agreement,
        LevelCategory::Cop,
        LevelCategory::Op,
        LevelCategory::Xop,
    ];

    /// 扩展目标按 "是否到达" 统计，其余按 "是否守住"
    pub fn is_objective(&self) -> bool {
        matches!(self, LevelCategory::Cop | LevelCategory::Op | LevelCategory::Xop)
    }

    pub fn of_level(level: &PriceLevel) -> Self {
        match level {
            PriceLevel::Fibnode(f) => f.ratio.into(),
            PriceLevel::Objective(o) => o.kind.into(),
        }
    }
}

impl From<FibRatio> for LevelCategory {
    fn from(ratio: FibRatio) -> Self {
        match ratio {
            FibRatio::F3 => LevelCategory::F3,
            FibRatio::F5 => LevelCategory::F5,
        }
    }
}

impl From<ObjectiveKind> for LevelCategory {
    fn from(kind: ObjectiveKind) -> Self {
        match kind {
            ObjectiveKind::Cop => LevelCategory::Cop,
            ObjectiveKind::Op => LevelCategory::Op,
            ObjectiveKind::Xop => LevelCategory::Xop,
        }
    }
}

impl From<ClusterKind> for LevelCategory {
    fn from(kind: ClusterKind) -> Self {
        match kind {
            ClusterKind::Confluence => LevelCategory::Confluence,
            ClusterKind::Agreement => LevelCategory::Agreement,
        }
    }
}

impl fmt::Display for LevelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LevelCategory::F3 => "F3",
            LevelCategory::F5 => "F5",
            LevelCategory::Confluence => "Confluence",
            LevelCategory::Agreement => "Agreement",
            LevelCategory::Cop => "COP",
            LevelCategory::Op => "OP",
            LevelCategory::Xop => "XOP",
        };
        f.pad(name)
    }
}

/// 单个点位的测试结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum LevelOutcome {
    /// 触及后收盘守在同侧
    Held { touch_index: usize, confirm_index: usize },
    /// 收盘越过点位超过容差
    Broken { touch_index: usize, break_index: usize },
    /// 触及过，但观察窗口结束前未决
    Unresolved { touch_index: usize },
    /// 观察窗口内未触及
    Untouched,
    /// 扩展目标被价格到达
    Reached { index: usize },
    NotReached,
    /// 确认之后已没有K线
    NoData,
}

impl LevelOutcome {
    pub fn is_evaluated(&self) -> bool {
        !matches!(self, LevelOutcome::NoData)
    }

    pub fn is_touched(&self) -> bool {
        self.first_touch().is_some()
    }

    /// 首次触及（或到达）的K线位置
    pub fn first_touch(&self) -> Option<usize> {
        match *self {
            LevelOutcome::Held { touch_index, .. }
            | LevelOutcome::Broken { touch_index, .. }
            | LevelOutcome::Unresolved { touch_index } => Some(touch_index),
            LevelOutcome::Reached { index } => Some(index),
            LevelOutcome::Untouched | LevelOutcome::NotReached | LevelOutcome::NoData => None,
        }
    }
}

/// 点位来源波段
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LevelSource {
    pub a: SwingPoint,
    pub b: SwingPoint,
    pub c: Option<SwingPoint>,
}

impl From<&PriceLevel> for LevelSource {
    fn from(level: &PriceLevel) -> Self {
        match level {
            PriceLevel::Fibnode(f) => LevelSource {
                a: f.source.a,
                b: f.source.b,
                c: None,
            },
            PriceLevel::Objective(o) => LevelSource {
                a: o.source.pair.a,
                b: o.source.pair.b,
                c: Some(o.source.c),
            },
        }
    }
}

/// 回测明细：每个被测试的点位或聚类一条
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelTest {
    pub category: LevelCategory,
    /// 单点位为价格本身，聚类为质心
    pub price: f64,
    /// 判定区间，单点位 low == high
    pub zone_low: f64,
    pub zone_high: f64,
    pub trend: Trend,
    pub role: LevelRole,
    pub sources: Vec<LevelSource>,
    /// 点位可见的K线位置（Focus 被确认的位置），测试从下一根开始
    pub visible_from: usize,
    pub outcome: LevelOutcome,
    pub first_touch_index: Option<usize>,
    /// 结果判定前触及点位的K线数量
    pub touch_count: usize,
    /// 最大穿透幅度（收盘越过点位的百分比）
    pub max_pierce_pct: f64,
    /// 判定前曾收在点位外侧但未超过突破容差
    pub pierced: bool,
    /// 仅聚类有值
    pub strength: Option<f64>,
}

/// 因波段无效被跳过的样本
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExcludedSample {
    pub focus_index: usize,
    pub reason: InvalidSwing,
}

/// 百分比，分母为 0 时为 N/A
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Rate {
    Pct(f64),
    NotApplicable,
}

impl Rate {
    pub fn ratio(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            Rate::NotApplicable
        } else {
            Rate::Pct(numerator as f64 / denominator as f64 * 100.0)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match *self {
            Rate::Pct(v) => Some(v),
            Rate::NotApplicable => None,
        }
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rate::Pct(v) => f.pad(&format!("{:.2}%", v)),
            Rate::NotApplicable => f.pad("N/A"),
        }
    }
}

/// 分类统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: LevelCategory,
    pub total: usize,
    /// 确认后仍有K线可以观察的数量
    pub evaluated: usize,
    pub touched: usize,
    pub held: usize,
    pub pierced: usize,
    pub broken: usize,
    pub unresolved: usize,
    pub reached: usize,
    /// held / (held + broken)
    pub hold_rate: Rate,
    /// pierced / touched
    pub pierced_rate: Rate,
    /// broken / touched
    pub broken_rate: Rate,
    /// touched / evaluated
    pub touched_rate: Rate,
    /// reached / evaluated，仅扩展目标
    pub reach_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Complete,
    InsufficientData { required: usize, actual: usize },
    /// 配置或输入在进入回测前即被拒绝
    Rejected { reason: String },
}

/// 单个交易对的回测结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub status: RunStatus,
    pub candle_count: usize,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub swing_count: usize,
    /// 产生了至少一个点位的 Focus 数量
    pub snapshot_count: usize,
    pub levels: Vec<LevelTest>,
    pub excluded: Vec<ExcludedSample>,
    pub stats: Vec<CategoryStats>,
    /// 全部支撑/阻力类（含聚类）的 held / (held + broken)
    pub overall_hold_rate: Rate,
}

impl BacktestResult {
    pub fn stats_for(&self, category: LevelCategory) -> Option<&CategoryStats> {
        self.stats.iter().find(|s| s.category == category)
    }
}

impl fmt::Display for BacktestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start_ts.map(mill_time_to_date).unwrap_or_else(|| "-".to_string());
        let end = self.end_ts.map(mill_time_to_date).unwrap_or_else(|| "-".to_string());
        writeln!(
            f,
            "[{}] {} ~ {} candles: {} swings: {} snapshots: {} levels: {} excluded: {}",
            self.symbol,
            start,
            end,
            self.candle_count,
            self.swing_count,
            self.snapshot_count,
            self.levels.len(),
            self.excluded.len()
        )?;
        match &self.status {
            RunStatus::Complete => {}
            RunStatus::InsufficientData { required, actual } => {
                return writeln!(f, "数据不足: 需要 {} 根K线, 实际 {}", required, actual);
            }
            RunStatus::Rejected { reason } => {
                return writeln!(f, "回测被拒绝: {}", reason);
            }
        }
        writeln!(
            f,
            "{:<11} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9}",
            "category", "total", "eval", "touch", "held", "pierce", "broken", "reach", "hold%", "pierce%",
            "broken%", "touch%", "reach%"
        )?;
        for s in &self.stats {
            writeln!(
                f,
                "{:<11} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9}",
                s.category,
                s.total,
                s.evaluated,
                s.touched,
                s.held,
                s.pierced,
                s.broken,
                s.reached,
                s.hold_rate,
                s.pierced_rate,
                s.broken_rate,
                s.touched_rate,
                s.reach_rate
            )?;
        }
        write!(f, "overall hold rate: {}", self.overall_hold_rate)
    }
}
