//! Confluence / Agreement 聚类
//!
//! 所有点位按价格排序后单次扫描：新点位与当前组的滚动质心距离在容差内则并入，
//! 否则关闭当前组。以质心而非相邻成员比较，避免一串相邻点位无限延伸。

use std::collections::HashSet;

use serde::Serialize;

use super::enums::{ClusterKind, Tolerance, Trend};
use super::levels::{Fibnode, ObjectivePoint, SwingKey};

/// 参与聚类的点位
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PriceLevel {
    Fibnode(Fibnode),
    Objective(ObjectivePoint),
}

impl PriceLevel {
    pub fn price(&self) -> f64 {
        match self {
            PriceLevel::Fibnode(f) => f.price,
            PriceLevel::Objective(o) => o.price,
        }
    }

    pub fn source_key(&self) -> SwingKey {
        match self {
            PriceLevel::Fibnode(f) => f.source.key(),
            PriceLevel::Objective(o) => o.source.key(),
        }
    }

    pub fn trend(&self) -> Trend {
        match self {
            PriceLevel::Fibnode(f) => f.trend(),
            PriceLevel::Objective(o) => o.trend(),
        }
    }

    pub fn is_fibnode(&self) -> bool {
        matches!(self, PriceLevel::Fibnode(_))
    }
}

impl From<Fibnode> for PriceLevel {
    fn from(f: Fibnode) -> Self {
        PriceLevel::Fibnode(f)
    }
}

impl From<ObjectivePoint> for PriceLevel {
    fn from(o: ObjectivePoint) -> Self {
        PriceLevel::Objective(o)
    }
}

/// 至少两个点位组成的聚类
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterGroup {
    pub kind: ClusterKind,
    pub centroid: f64,
    pub low: f64,
    pub high: f64,
    /// 0-1，1 表示完全重合
    pub strength: f64,
    /// Fibnode 成员的方向，决定聚类作为支撑还是阻力
    pub trend: Trend,
    pub members: Vec<PriceLevel>,
}

/// 聚类结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterOutcome {
    pub groups: Vec<ClusterGroup>,
    /// 单独成组的点位，原样交给回测
    pub standalone: Vec<PriceLevel>,
    /// 多成员但无新信息的组（全部来自同一波段、全部为 Objective Point）
    pub discarded: Vec<Vec<PriceLevel>>,
}

/// 按质心的贪心扫描，返回按价格升序的分组
pub fn centroid_sweep<T>(items: Vec<T>, price: impl Fn(&T) -> f64, tolerance: Tolerance) -> Vec<Vec<T>> {
    let mut items = items;
    items.sort_by(|a, b| price(a).total_cmp(&price(b)));

    let mut groups: Vec<Vec<T>> = Vec::new();
    let mut current: Vec<T> = Vec::new();
    let mut sum = 0.0;

    for item in items {
        let p = price(&item);
        if !current.is_empty() {
            let centroid = sum / current.len() as f64;
            if (p - centroid).abs() > tolerance.width_at(centroid) {
                groups.push(std::mem::take(&mut current));
                sum = 0.0;
            }
        }
        sum += p;
        current.push(item);
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// 对一组点位聚类并分类
pub fn cluster_levels(levels: Vec<PriceLevel>, tolerance: Tolerance) -> ClusterOutcome {
    let mut outcome = ClusterOutcome::default();

    for members in centroid_sweep(levels, |l| l.price(), tolerance) {
        if members.len() < 2 {
            outcome.standalone.extend(members);
            continue;
        }
        match classify(&members) {
            Some(kind) => outcome.groups.push(build_group(kind, members, tolerance)),
            None => outcome.discarded.push(members),
        }
    }

    outcome
}

fn classify(members: &[PriceLevel]) -> Option<ClusterKind> {
    let fibnodes = members.iter().filter(|m| m.is_fibnode()).count();
    let objectives = members.len() - fibnodes;

    if fibnodes > 0 && objectives > 0 {
        return Some(ClusterKind::Agreement);
    }
    if objectives == 0 {
        // 至少两个不同波段即为 Confluence，同波段的其他成员不影响
        let distinct: HashSet<SwingKey> = members.iter().map(|m| m.source_key()).collect();
        if distinct.len() >= 2 {
            return Some(ClusterKind::Confluence);
        }
    }
    None
}

fn build_group(kind: ClusterKind, members: Vec<PriceLevel>, tolerance: Tolerance) -> ClusterGroup {
    let prices: Vec<f64> = members.iter().map(|m| m.price()).collect();
    let centroid = prices.iter().sum::<f64>() / prices.len() as f64;
    let low = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let high = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = tolerance.width_at(centroid);
    let strength = if width > 0.0 {
        (1.0 - (high - low) / width).clamp(0.0, 1.0)
    } else {
        1.0
    };
    // classify 保证至少有一个 Fibnode
    let trend = members
        .iter()
        .find(|m| m.is_fibnode())
        .map(|m| m.trend())
        .unwrap_or(Trend::Up);

    ClusterGroup {
        kind,
        centroid,
        low,
        high,
        strength,
        trend,
        members,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trading::indicator::dinapoli::levels::{SwingPair, SwingTriple};
    use crate::trading::indicator::dinapoli::swing::SwingPoint;
    use crate::trading::indicator::dinapoli::enums::FibRatio;
    use float_cmp::approx_eq;

    fn fibnode_at(price: f64, a_index: usize) -> PriceLevel {
        let pair = SwingPair::new(
            SwingPoint::new(100.0, a_index, false),
            SwingPoint::new(200.0, 50, true),
        )
        .unwrap();
        PriceLevel::Fibnode(Fibnode {
            ratio: FibRatio::F5,
            price,
            source: pair,
        })
    }

    fn objective_at(price: f64) -> PriceLevel {
        let triple = SwingTriple::new(
            SwingPoint::new(100.0, 0, false),
            SwingPoint::new(200.0, 10, true),
            SwingPoint::new(150.0, 20, false),
        )
        .unwrap();
        let mut op = triple.objective_points()[1];
        op.price = price;
        PriceLevel::Objective(op)
    }

    #[test]
    fn merges_fibnodes_from_distinct_swings_into_confluence() {
        let outcome = cluster_levels(
            vec![fibnode_at(138.4, 1), fibnode_at(138.0, 2), fibnode_at(150.0, 3)],
            Tolerance::Absolute(1.0),
        );
        assert_eq!(outcome.groups.len(), 1);
        let group = &outcome.groups[0];
        assert_eq!(group.kind, ClusterKind::Confluence);
        assert!(approx_eq!(f64, group.centroid, 138.2, epsilon = 1e-9));
        assert!(approx_eq!(f64, group.low, 138.0, epsilon = 1e-9));
        assert_eq!(outcome.standalone.len(), 1);
    }

    #[test]
    fn fibnode_and_objective_form_agreement() {
        let outcome = cluster_levels(
            vec![fibnode_at(250.2, 1), objective_at(250.0)],
            Tolerance::Absolute(0.5),
        );
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].kind, ClusterKind::Agreement);
        assert_eq!(outcome.groups[0].trend, Trend::Up);
    }

    #[test]
    fn same_swing_duplicates_are_discarded() {
        let outcome = cluster_levels(
            vec![fibnode_at(138.0, 1), fibnode_at(138.3, 1)],
            Tolerance::Absolute(1.0),
        );
        assert!(outcome.groups.is_empty());
        assert_eq!(outcome.discarded.len(), 1);

        let only_targets = cluster_levels(
            vec![objective_at(250.0), objective_at(250.1)],
            Tolerance::Absolute(1.0),
        );
        assert!(only_targets.groups.is_empty());
        assert_eq!(only_targets.discarded.len(), 1);
    }

    #[test]
    fn mixed_group_with_two_swings_is_confluence() {
        // 两个波段的 F3/F5 落在同一组：100.764 / 101.000 / 101.236 / 101.382
        let first = SwingPair::new(SwingPoint::new(100.0, 0, false), SwingPoint::new(102.0, 10, true)).unwrap();
        let second = SwingPair::new(SwingPoint::new(100.382, 4, false), SwingPoint::new(102.0, 10, true)).unwrap();
        let levels: Vec<PriceLevel> = first
            .fibnodes()
            .into_iter()
            .chain(second.fibnodes())
            .map(PriceLevel::from)
            .collect();

        let outcome = cluster_levels(levels, Tolerance::Absolute(1.0));
        assert!(outcome.discarded.is_empty());
        assert_eq!(outcome.groups.len(), 1);
        let group = &outcome.groups[0];
        assert_eq!(group.kind, ClusterKind::Confluence);
        assert_eq!(group.members.len(), 4);
        assert!(approx_eq!(f64, group.low, 100.764, epsilon = 1e-9));
        assert!(approx_eq!(f64, group.strength, 1.0 - (group.high - group.low), epsilon = 1e-9));
    }

    #[test]
    fn centroid_prevents_chain_drift() {
        // 逐个与上一成员比较会把整串并成一组，按质心比较在 101.6 处断开
        let groups = centroid_sweep(vec![102.4, 100.0, 101.6, 100.8], |p| *p, Tolerance::Absolute(1.0));
        assert_eq!(groups, vec![vec![100.0, 100.8], vec![101.6, 102.4]]);
    }

    #[test]
    fn sweep_is_idempotent_on_centroids() {
        let prices = vec![10.0, 10.4, 10.9, 12.0, 12.5, 14.0, 14.2, 14.9, 20.0];
        let tolerance = Tolerance::Percent(5.0);
        let groups = centroid_sweep(prices, |p| *p, tolerance);
        let centroids: Vec<f64> = groups
            .iter()
            .map(|g| g.iter().sum::<f64>() / g.len() as f64)
            .collect();
        let again = centroid_sweep(centroids.clone(), |p| *p, tolerance);
        assert_eq!(again.len(), centroids.len());
    }
}
