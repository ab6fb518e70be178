//! 单个点位的前向测试
//!
//! 支撑/阻力按区间 `[low, high]` 判定（单点位 low == high，聚类为成员价格范围）：
//! - 触及：支撑 `bar.low <= high`，阻力 `bar.high >= low`
//! - 突破：收盘越过区间外沿超过容差宽度
//! - 穿透：收盘越过外沿但在容差内，同侧计数清零并记为 pierced
//! - 守住：触及后连续 `confirm_closes` 根收盘在外沿同侧
//!
//! 扩展目标只看是否到达：上涨 `bar.high >= price`，下跌 `bar.low <= price`。

use super::types::{HoldRule, LevelOutcome, LevelRole};
use crate::trading::indicator::dinapoli::{Tolerance, Trend};
use crate::Candle;

/// 支撑/阻力判定区间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelZone {
    pub low: f64,
    pub high: f64,
    pub role: LevelRole,
}

impl LevelZone {
    pub fn point(price: f64, role: LevelRole) -> Self {
        Self {
            low: price,
            high: price,
            role,
        }
    }

    /// 决定突破的外沿：支撑看下沿，阻力看上沿
    pub fn edge(&self) -> f64 {
        match self.role {
            LevelRole::Support => self.low,
            LevelRole::Resistance => self.high,
        }
    }

    fn is_touched_by(&self, candle: &Candle) -> bool {
        match self.role {
            LevelRole::Support => candle.low <= self.high,
            LevelRole::Resistance => candle.high >= self.low,
        }
    }

    /// 收盘越过外沿的距离，<= 0 表示在同侧
    fn close_beyond(&self, candle: &Candle) -> f64 {
        match self.role {
            LevelRole::Support => self.low - candle.close,
            LevelRole::Resistance => candle.close - self.high,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub outcome: LevelOutcome,
    pub touch_count: usize,
    pub max_pierce_pct: f64,
    /// 判定前出现过容差内的穿透
    pub pierced: bool,
}

impl Evaluation {
    fn no_data() -> Self {
        Self {
            outcome: LevelOutcome::NoData,
            touch_count: 0,
            max_pierce_pct: 0.0,
            pierced: false,
        }
    }
}

/// 测试支撑/阻力
///
/// - `candles`: 点位可见之后的K线
/// - `offset`: `candles[0]` 在完整序列中的位置
pub fn evaluate_zone(
    zone: LevelZone,
    candles: &[Candle],
    offset: usize,
    break_tolerance: Tolerance,
    rule: &HoldRule,
) -> Evaluation {
    if candles.is_empty() {
        return Evaluation::no_data();
    }

    let edge = zone.edge();
    let decisive = break_tolerance.width_at(edge);
    let mut touch_index: Option<usize> = None;
    let mut touch_count = 0;
    let mut on_side = 0;
    let mut max_pierce_pct: f64 = 0.0;
    let mut pierced = false;

    for (i, candle) in candles.iter().enumerate() {
        let index = offset + i;
        let touched = zone.is_touched_by(candle);
        if touched {
            touch_count += 1;
        }

        let first_touch = match touch_index {
            Some(t) => t,
            None if touched => {
                touch_index = Some(index);
                index
            }
            None => continue,
        };

        let beyond = zone.close_beyond(candle);
        if beyond > 0.0 && edge != 0.0 {
            max_pierce_pct = max_pierce_pct.max(beyond / edge.abs() * 100.0);
        }

        if beyond > decisive {
            return Evaluation {
                outcome: LevelOutcome::Broken {
                    touch_index: first_touch,
                    break_index: index,
                },
                touch_count,
                max_pierce_pct,
                pierced,
            };
        }
        if beyond > 0.0 {
            pierced = true;
            on_side = 0;
            continue;
        }
        if index == first_touch && !rule.count_touch_bar {
            continue;
        }

        on_side += 1;
        if on_side >= rule.confirm_closes {
            return Evaluation {
                outcome: LevelOutcome::Held {
                    touch_index: first_touch,
                    confirm_index: index,
                },
                touch_count,
                max_pierce_pct,
                pierced,
            };
        }
    }

    let outcome = match touch_index {
        Some(touch_index) => LevelOutcome::Unresolved { touch_index },
        None => LevelOutcome::Untouched,
    };
    Evaluation {
        outcome,
        touch_count,
        max_pierce_pct,
        pierced,
    }
}

/// 测试扩展目标是否到达
pub fn evaluate_objective(price: f64, trend: Trend, candles: &[Candle], offset: usize) -> Evaluation {
    if candles.is_empty() {
        return Evaluation::no_data();
    }

    let reached = candles.iter().position(|c| match trend {
        Trend::Up => c.high >= price,
        Trend::Down => c.low <= price,
    });

    let (outcome, touch_count) = match reached {
        Some(i) => (LevelOutcome::Reached { index: offset + i }, 1),
        None => (LevelOutcome::NotReached, 0),
    };
    Evaluation {
        outcome,
        touch_count,
        max_pierce_pct: 0.0,
        pierced: false,
    }
}
