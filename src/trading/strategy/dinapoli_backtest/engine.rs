//! DiNapoli 点位回测引擎
//!
//! 原始极值按确认顺序逐个做交替过滤，每个成为序列末尾的点 p 在 `p.index + k`（确认位置）生成快照：
//! 1. p 作为 Focus，与之前最多 `max_reactions` 个反向摆动点计算 Fibnode
//! 2. (p-2, p-1, p) 三点计算 Objective Point
//! 3. 快照内点位聚类，单点位和聚类都从确认位置的下一根开始测试
//!
//! 快照只使用当时已确认的极值。之后出现更强的同极性点会替换 p，但不会撤销 p 已生成的快照。

use tracing::{debug, info, warn};

use super::evaluator::{evaluate_objective, evaluate_zone, LevelZone};
use super::stats::{aggregate, overall_hold_rate};
use super::types::{
    BacktestResult, ExcludedSample, LevelCategory, LevelRole, LevelSource, LevelTest, Rate,
    RunStatus,
};
use crate::app_config::dinapoli::DinapoliConfig;
use crate::error::{AppError, DinapoliError, InvalidSwing};
use crate::trading::indicator::dinapoli::{
    cluster_levels, identify_market_swing, push_alternating, scan_swing_extrema, ClusterGroup,
    PriceLevel, SwingPair, SwingPoint, SwingTriple,
};
use crate::Candle;

/// 一次快照可测试的K线窗口
struct TestWindow<'a> {
    visible_from: usize,
    offset: usize,
    /// 支撑/阻力观察窗口（受 test_horizon 限制）
    bounded: &'a [Candle],
    /// 扩展目标观察窗口（直到序列结束）
    full: &'a [Candle],
}

#[derive(Debug, Clone)]
pub struct DinapoliBacktester {
    config: DinapoliConfig,
}

impl DinapoliBacktester {
    pub fn new(config: DinapoliConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DinapoliConfig {
        &self.config
    }

    /// 对单个交易对的K线序列回测，K线须按时间升序
    pub fn run(&self, symbol: &str, candles: &[Candle]) -> BacktestResult {
        let mut result = BacktestResult {
            symbol: symbol.to_string(),
            status: RunStatus::Complete,
            candle_count: candles.len(),
            start_ts: candles.first().map(|c| c.ts),
            end_ts: candles.last().map(|c| c.ts),
            swing_count: 0,
            snapshot_count: 0,
            levels: Vec::new(),
            excluded: Vec::new(),
            stats: Vec::new(),
            overall_hold_rate: Rate::NotApplicable,
        };

        let radius = self.config.swing_window_radius;
        let extrema = match scan_swing_extrema(candles, radius) {
            Ok(extrema) => extrema,
            Err(DinapoliError::InsufficientData { required, actual }) => {
                warn!(
                    "[{}] 数据不足，需要 {} 根K线，实际 {}",
                    symbol, required, actual
                );
                result.status = RunStatus::InsufficientData { required, actual };
                return finalize(result);
            }
            Err(e) => {
                warn!("[{}] 回测被拒绝: {}", symbol, e);
                result.status = RunStatus::Rejected {
                    reason: e.to_string(),
                };
                return finalize(result);
            }
        };
        let mut swings: Vec<SwingPoint> = Vec::with_capacity(extrema.len());
        for focus in extrema.iter().copied() {
            if !push_alternating(&mut swings, focus) {
                continue;
            }
            let levels = self.snapshot_levels(&swings, &mut result.excluded);
            if levels.is_empty() {
                continue;
            }
            result.snapshot_count += 1;

            let window = self.test_window(candles, focus);
            for level in &levels {
                result.levels.push(self.test_level(level, &window));
            }

            let clusters = cluster_levels(levels, self.config.cluster_tolerance);
            debug!(
                "[{}] focus @{}: {} groups, {} standalone, {} discarded",
                symbol,
                focus.index,
                clusters.groups.len(),
                clusters.standalone.len(),
                clusters.discarded.len()
            );
            for group in &clusters.groups {
                result.levels.push(self.test_cluster(group, &window));
            }
        }

        result.swing_count = swings.len();
        debug!(
            "[{}] {} raw extrema, {} alternating swing points",
            symbol,
            extrema.len(),
            swings.len()
        );

        let result = finalize(result);
        info!(
            "[{}] 回测完成: swings={} snapshots={} levels={} excluded={} hold_rate={}",
            symbol,
            result.swing_count,
            result.snapshot_count,
            result.levels.len(),
            result.excluded.len(),
            result.overall_hold_rate
        );
        result
    }

    /// 最后一个摆动点为 Focus 时可计算的全部点位
    fn snapshot_levels(&self, swings: &[SwingPoint], excluded: &mut Vec<ExcludedSample>) -> Vec<PriceLevel> {
        let mut levels = Vec::new();
        let Some(&focus) = swings.last() else {
            return levels;
        };

        if let Some(market_swing) = identify_market_swing(swings, self.config.max_reactions) {
            for reaction in &market_swing.reactions {
                match SwingPair::new(*reaction, market_swing.focus) {
                    Ok(pair) => levels.extend(pair.fibnodes().map(PriceLevel::from)),
                    Err(reason) => exclude(excluded, focus, reason),
                }
            }
        }

        if let [.., a, b, c] = swings {
            match SwingTriple::new(*a, *b, *c) {
                Ok(triple) => levels.extend(triple.objective_points().map(PriceLevel::from)),
                Err(reason) => exclude(excluded, focus, reason),
            }
        }

        levels
    }

    fn test_window<'a>(&self, candles: &'a [Candle], focus: SwingPoint) -> TestWindow<'a> {
        let visible_from = focus.confirmed_at(self.config.swing_window_radius);
        let offset = visible_from + 1;
        let full = candles.get(offset..).unwrap_or(&[]);
        let bounded = match self.config.test_horizon {
            Some(horizon) => &full[..horizon.min(full.len())],
            None => full,
        };
        TestWindow {
            visible_from,
            offset,
            bounded,
            full,
        }
    }

    fn test_level(&self, level: &PriceLevel, window: &TestWindow<'_>) -> LevelTest {
        let price = level.price();
        let trend = level.trend();
        let role = LevelRole::from(trend);
        let evaluation = match level {
            PriceLevel::Fibnode(_) => evaluate_zone(
                LevelZone::point(price, role),
                window.bounded,
                window.offset,
                self.config.decisive_tolerance(),
                &self.config.hold_rule,
            ),
            PriceLevel::Objective(_) => evaluate_objective(price, trend, window.full, window.offset),
        };

        LevelTest {
            category: LevelCategory::of_level(level),
            price,
            zone_low: price,
            zone_high: price,
            trend,
            role,
            sources: vec![LevelSource::from(level)],
            visible_from: window.visible_from,
            outcome: evaluation.outcome,
            first_touch_index: evaluation.outcome.first_touch(),
            touch_count: evaluation.touch_count,
            max_pierce_pct: evaluation.max_pierce_pct,
            pierced: evaluation.pierced,
            strength: None,
        }
    }

    /// 聚类按支撑/阻力测试，方向取 Fibnode 成员的方向
    fn test_cluster(&self, group: &ClusterGroup, window: &TestWindow<'_>) -> LevelTest {
        let role = LevelRole::from(group.trend);
        let zone = LevelZone {
            low: group.low,
            high: group.high,
            role,
        };
        let evaluation = evaluate_zone(
            zone,
            window.bounded,
            window.offset,
            self.config.decisive_tolerance(),
            &self.config.hold_rule,
        );

        LevelTest {
            category: group.kind.into(),
            price: group.centroid,
            zone_low: group.low,
            zone_high: group.high,
            trend: group.trend,
            role,
            sources: group.members.iter().map(LevelSource::from).collect(),
            visible_from: window.visible_from,
            outcome: evaluation.outcome,
            first_touch_index: evaluation.outcome.first_touch(),
            touch_count: evaluation.touch_count,
            max_pierce_pct: evaluation.max_pierce_pct,
            pierced: evaluation.pierced,
            strength: Some(group.strength),
        }
    }
}

fn exclude(excluded: &mut Vec<ExcludedSample>, focus: SwingPoint, reason: InvalidSwing) {
    warn!("跳过无效波段 focus @{}: {}", focus.index, reason);
    excluded.push(ExcludedSample {
        focus_index: focus.index,
        reason,
    });
}

fn finalize(mut result: BacktestResult) -> BacktestResult {
    result.stats = aggregate(&result.levels);
    result.overall_hold_rate = overall_hold_rate(&result.stats);
    result
}
