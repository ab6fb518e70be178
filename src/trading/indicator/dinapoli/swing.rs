//! Swing 高低点识别
//!
//! 对称窗口 `[i-k, i+k]` 内的最高/最低点即为摆动点，距序列两端不足 k 根的位置无法确认，直接跳过。
//! 输出按索引升序且高低交替。

use serde::{Deserialize, Serialize};
use ta::{High, Low};
use tracing::debug;

use super::enums::Trend;
use crate::error::DinapoliError;

/// 摆动点（高点或低点），识别后不再修改
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SwingPoint {
    pub price: f64,
    pub index: usize, // 在K线序列中的位置
    pub is_high: bool,
}

impl SwingPoint {
    pub fn new(price: f64, index: usize, is_high: bool) -> Self {
        Self {
            price,
            index,
            is_high,
        }
    }

    /// 该点可被确认（无未来函数）的最早K线位置
    pub fn confirmed_at(&self, radius: usize) -> usize {
        self.index + radius
    }

    /// 同极性比较：更高的高点 / 更低的低点更强，相等不算
    fn is_stronger_than(&self, other: &SwingPoint) -> bool {
        if self.is_high {
            self.price > other.price
        } else {
            self.price < other.price
        }
    }
}

/// 当前市场波段：Focus Number(B) 与其之前的 Reactions(A)，最近的在前
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSwing {
    pub focus: SwingPoint,
    pub reactions: Vec<SwingPoint>,
    pub trend: Trend,
}

/// 识别交替的摆动高低点
///
/// - `radius`: 左右各回看/前看的K线数量 (k)
/// - 序列长度小于 `2k + 1` 时返回 `InsufficientData`
pub fn detect_swing_points<T: High + Low>(
    candles: &[T],
    radius: usize,
) -> Result<Vec<SwingPoint>, DinapoliError> {
    let raw = scan_swing_extrema(candles, radius)?;
    let raw_len = raw.len();
    let swings = enforce_alternation(raw);
    debug!(
        "swing scan: {} raw extrema, {} after alternation filter",
        raw_len,
        swings.len()
    );
    Ok(swings)
}

/// 未经交替过滤的窗口极值，按索引升序
///
/// 回测按确认顺序逐个喂给 `push_alternating`，保证每个快照只看到当时已确认的点
pub fn scan_swing_extrema<T: High + Low>(
    candles: &[T],
    radius: usize,
) -> Result<Vec<SwingPoint>, DinapoliError> {
    if radius == 0 {
        return Err(DinapoliError::Config(
            "swing_window_radius must be greater than 0".to_string(),
        ));
    }
    let required = radius
        .checked_mul(2)
        .and_then(|r| r.checked_add(1))
        .ok_or_else(|| DinapoliError::Config(format!("swing_window_radius too large: {}", radius)))?;
    if candles.len() < required {
        return Err(DinapoliError::InsufficientData {
            required,
            actual: candles.len(),
        });
    }
    Ok(scan_extrema(candles, radius))
}

/// 原始极值扫描，同一根K线同时是高点和低点时，按与上一个点交替的顺序输出
fn scan_extrema<T: High + Low>(candles: &[T], radius: usize) -> Vec<SwingPoint> {
    let mut points: Vec<SwingPoint> = Vec::new();

    for i in radius..(candles.len() - radius) {
        let high = candles[i].high();
        let low = candles[i].low();
        let is_high = is_window_extreme(candles, i, radius, |c| c.high(), |a, b| a > b);
        let is_low = is_window_extreme(candles, i, radius, |c| c.low(), |a, b| a < b);

        let high_point = SwingPoint::new(high, i, true);
        let low_point = SwingPoint::new(low, i, false);
        match (is_high, is_low) {
            (true, true) => {
                let last_was_high = points.last().map(|p| p.is_high).unwrap_or(false);
                if last_was_high {
                    points.push(low_point);
                    points.push(high_point);
                } else {
                    points.push(high_point);
                    points.push(low_point);
                }
            }
            (true, false) => points.push(high_point),
            (false, true) => points.push(low_point),
            (false, false) => {}
        }
    }

    points
}

/// 窗口极值判断，相等时取最早的位置：
/// 左侧必须严格优于，右侧只需不劣于
fn is_window_extreme<T>(
    candles: &[T],
    i: usize,
    radius: usize,
    value: impl Fn(&T) -> f64,
    beats: impl Fn(f64, f64) -> bool,
) -> bool {
    let current = value(&candles[i]);
    (i - radius..i).all(|j| beats(current, value(&candles[j])))
        && (i + 1..=i + radius).all(|j| !beats(value(&candles[j]), current))
}

/// 交替过滤：连续同极性的点只保留更强的一个（相等保留较早的）
pub fn enforce_alternation(points: Vec<SwingPoint>) -> Vec<SwingPoint> {
    let mut acc = Vec::with_capacity(points.len());
    for point in points {
        push_alternating(&mut acc, point);
    }
    acc
}

/// 交替过滤的单步，返回 `point` 是否成为序列的最后一个点
/// （新增，或替换了较弱的同极性点）
pub fn push_alternating(acc: &mut Vec<SwingPoint>, point: SwingPoint) -> bool {
    match acc.last_mut() {
        Some(last) if last.is_high == point.is_high => {
            if point.is_stronger_than(last) {
                *last = point;
                true
            } else {
                false
            }
        }
        _ => {
            acc.push(point);
            true
        }
    }
}

/// 识别当前市场波段
///
/// 最后一个摆动点作为 Focus Number，方向由其极性决定；
/// Reactions 为 Focus 之前的反向摆动点，最近的在前，最多 `max_reactions` 个
pub fn identify_market_swing(swings: &[SwingPoint], max_reactions: usize) -> Option<MarketSwing> {
    let (focus, earlier) = swings.split_last()?;
    let reactions: Vec<SwingPoint> = earlier
        .iter()
        .rev()
        .filter(|s| s.is_high != focus.is_high)
        .take(max_reactions)
        .copied()
        .collect();

    if reactions.is_empty() {
        return None;
    }

    Some(MarketSwing {
        focus: *focus,
        reactions,
        trend: Trend::from_focus_is_high(focus.is_high),
    })
}
