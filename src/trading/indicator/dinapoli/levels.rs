//! DiNapoli 点位计算
//!
//! 回撤（Fibnode），以 Focus Number B 与 Reaction A 计算：
//! ```text
//! F3 = B - 0.382(B - A)
//! F5 = B - 0.618(B - A)
//! ```
//! 扩展（Objective Point），ABC 三点，注意锚点是 C 而不是 B：
//! ```text
//! COP = 0.618(B - A) + C
//! OP  = 1.000(B - A) + C
//! XOP = 1.618(B - A) + C
//! ```
//! 所有价格只由 A、B、C 推导，不缓存、不修改。

use serde::{Deserialize, Serialize};

use super::enums::{FibRatio, ObjectiveKind, Trend};
use super::swing::SwingPoint;
use crate::error::InvalidSwing;

/// 波段标识，用于判断两个点位是否来自同一波段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct SwingKey {
    pub a_index: usize,
    pub a_is_high: bool,
    pub b_index: usize,
}

/// 已校验的 A-B 两点波段
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SwingPair {
    pub a: SwingPoint,
    pub b: SwingPoint,
    pub trend: Trend,
}

impl SwingPair {
    /// 校验并构建：
    /// - A 与 B 极性相反
    /// - A != B
    /// - 上涨波段 A < B，下跌波段 A > B
    /// - A 在 B 之前
    pub fn new(a: SwingPoint, b: SwingPoint) -> Result<Self, InvalidSwing> {
        if a.is_high == b.is_high {
            return Err(InvalidSwing::SamePolarity {
                a_index: a.index,
                b_index: b.index,
            });
        }
        if a.price == b.price {
            return Err(InvalidSwing::ZeroRange {
                a_index: a.index,
                b_index: b.index,
                price: a.price,
            });
        }
        let trend = Trend::from_focus_is_high(b.is_high);
        let oriented = match trend {
            Trend::Up => a.price < b.price,
            Trend::Down => a.price > b.price,
        };
        if !oriented {
            return Err(InvalidSwing::WrongOrientation {
                a_index: a.index,
                b_index: b.index,
            });
        }
        if a.index >= b.index {
            return Err(InvalidSwing::IndexOrder {
                a_index: a.index,
                b_index: b.index,
                c_index: None,
            });
        }
        Ok(Self { a, b, trend })
    }

    /// 带符号的波段幅度 B - A
    pub fn range(&self) -> f64 {
        self.b.price - self.a.price
    }

    pub fn key(&self) -> SwingKey {
        SwingKey {
            a_index: self.a.index,
            a_is_high: self.a.is_high,
            b_index: self.b.index,
        }
    }

    /// F3、F5 两个回撤点位
    pub fn fibnodes(&self) -> [Fibnode; 2] {
        FibRatio::ALL.map(|ratio| Fibnode {
            ratio,
            price: self.b.price - ratio.ratio() * self.range(),
            source: *self,
        })
    }
}

/// 已校验的 A-B-C 三点结构，C 为 B 之后的回撤点
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SwingTriple {
    pub pair: SwingPair,
    pub c: SwingPoint,
}

impl SwingTriple {
    /// 在 `SwingPair` 校验基础上：
    /// - C 与 A 同极性，且在 B 之后
    /// - C 落在 [A, B) 区间内，越过 B 说明回撤点已失效
    pub fn new(a: SwingPoint, b: SwingPoint, c: SwingPoint) -> Result<Self, InvalidSwing> {
        let pair = SwingPair::new(a, b)?;
        if c.is_high != a.is_high {
            return Err(InvalidSwing::CPolarity { c_index: c.index });
        }
        if c.index <= b.index {
            return Err(InvalidSwing::IndexOrder {
                a_index: a.index,
                b_index: b.index,
                c_index: Some(c.index),
            });
        }
        let in_range = match pair.trend {
            Trend::Up => a.price <= c.price && c.price < b.price,
            Trend::Down => b.price < c.price && c.price <= a.price,
        };
        if !in_range {
            return Err(InvalidSwing::COutOfRange {
                c_index: c.index,
                c_price: c.price,
            });
        }
        Ok(Self { pair, c })
    }

    pub fn key(&self) -> SwingKey {
        self.pair.key()
    }

    /// COP、OP、XOP 三个扩展目标，锚点为 C
    pub fn objective_points(&self) -> [ObjectivePoint; 3] {
        let base = self.pair.range();
        ObjectiveKind::ALL.map(|kind| ObjectivePoint {
            kind,
            price: kind.ratio() * base + self.c.price,
            source: *self,
        })
    }
}

/// 斐波那契回撤点位（支撑/阻力）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Fibnode {
    pub ratio: FibRatio,
    pub price: f64,
    pub source: SwingPair,
}

impl Fibnode {
    pub fn trend(&self) -> Trend {
        self.source.trend
    }
}

/// 斐波那契扩展目标（止盈目标）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ObjectivePoint {
    pub kind: ObjectiveKind,
    pub price: f64,
    pub source: SwingTriple,
}

impl ObjectivePoint {
    /// 扩展方向：Up 表示目标在 C 上方
    pub fn trend(&self) -> Trend {
        self.source.pair.trend
    }
}

/// 计算一个 A-B 波段的 Fibnode
pub fn calculate_fibnodes(reaction: SwingPoint, focus: SwingPoint) -> Result<[Fibnode; 2], InvalidSwing> {
    Ok(SwingPair::new(reaction, focus)?.fibnodes())
}

/// 计算一个 A-B-C 结构的 Objective Point
pub fn calculate_objective_points(
    a: SwingPoint,
    b: SwingPoint,
    c: SwingPoint,
) -> Result<[ObjectivePoint; 3], InvalidSwing> {
    Ok(SwingTriple::new(a, b, c)?.objective_points())
}
