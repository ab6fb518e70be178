//! 回测统计

use super::types::{CategoryStats, LevelCategory, LevelOutcome, LevelTest, Rate};

/// 按分类汇总，每个分类都会输出一行（无样本时各比率为 N/A）
pub fn aggregate(levels: &[LevelTest]) -> Vec<CategoryStats> {
    LevelCategory::ALL
        .iter()
        .map(|&category| category_stats(category, levels.iter().filter(|l| l.category == category)))
        .collect()
}

fn category_stats<'a>(category: LevelCategory, levels: impl Iterator<Item = &'a LevelTest>) -> CategoryStats {
    let mut total = 0;
    let mut evaluated = 0;
    let mut touched = 0;
    let mut held = 0;
    let mut pierced = 0;
    let mut broken = 0;
    let mut unresolved = 0;
    let mut reached = 0;

    for level in levels {
        total += 1;
        if level.outcome.is_evaluated() {
            evaluated += 1;
        }
        if level.outcome.is_touched() {
            touched += 1;
        }
        if level.pierced {
            pierced += 1;
        }
        match level.outcome {
            LevelOutcome::Held { .. } => held += 1,
            LevelOutcome::Broken { .. } => broken += 1,
            LevelOutcome::Unresolved { .. } => unresolved += 1,
            LevelOutcome::Reached { .. } => reached += 1,
            _ => {}
        }
    }

    let reach_rate = if category.is_objective() {
        Rate::ratio(reached, evaluated)
    } else {
        Rate::NotApplicable
    };

    CategoryStats {
        category,
        total,
        evaluated,
        touched,
        held,
        pierced,
        broken,
        unresolved,
        reached,
        hold_rate: Rate::ratio(held, held + broken),
        pierced_rate: Rate::ratio(pierced, touched),
        broken_rate: Rate::ratio(broken, touched),
        touched_rate: Rate::ratio(touched, evaluated),
        reach_rate,
    }
}

/// 全部支撑/阻力分类合并后的守住率
pub fn overall_hold_rate(stats: &[CategoryStats]) -> Rate {
    let (held, broken) = stats
        .iter()
        .filter(|s| !s.category.is_objective())
        .fold((0, 0), |(h, b), s| (h + s.held, b + s.broken));
    Rate::ratio(held, held + broken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trading::indicator::dinapoli::Trend;
    use crate::trading::strategy::dinapoli_backtest::types::LevelRole;

    fn test_with(category: LevelCategory, outcome: LevelOutcome) -> LevelTest {
        LevelTest {
            category,
            price: 100.0,
            zone_low: 100.0,
            zone_high: 100.0,
            trend: Trend::Up,
            role: LevelRole::Support,
            sources: vec![],
            visible_from: 0,
            outcome,
            first_touch_index: outcome.first_touch(),
            touch_count: 0,
            max_pierce_pct: 0.0,
            pierced: false,
            strength: None,
        }
    }

    #[test]
    fn hold_rate_ignores_unresolved_and_untouched() {
        let levels = vec![
            test_with(LevelCategory::F5, LevelOutcome::Held { touch_index: 1, confirm_index: 1 }),
            test_with(LevelCategory::F5, LevelOutcome::Held { touch_index: 2, confirm_index: 3 }),
            test_with(LevelCategory::F5, LevelOutcome::Broken { touch_index: 2, break_index: 2 }),
            test_with(LevelCategory::F5, LevelOutcome::Unresolved { touch_index: 4 }),
            test_with(LevelCategory::F5, LevelOutcome::Untouched),
            test_with(LevelCategory::F5, LevelOutcome::NoData),
        ];
        let stats = aggregate(&levels);
        let f5 = stats.iter().find(|s| s.category == LevelCategory::F5).unwrap();
        assert_eq!(f5.total, 6);
        assert_eq!(f5.evaluated, 5);
        assert_eq!(f5.touched, 4);
        assert_eq!(f5.hold_rate.value().map(|v| v.round()), Some(67.0));
        assert_eq!(f5.touched_rate, Rate::Pct(80.0));
        assert_eq!(f5.reach_rate, Rate::NotApplicable);

        let f3 = stats.iter().find(|s| s.category == LevelCategory::F3).unwrap();
        assert_eq!(f3.hold_rate, Rate::NotApplicable);
    }

    #[test]
    fn pierced_rate_is_over_touched() {
        let mut pierced_hold = test_with(LevelCategory::F3, LevelOutcome::Held { touch_index: 1, confirm_index: 2 });
        pierced_hold.pierced = true;
        let mut pierced_break = test_with(LevelCategory::F3, LevelOutcome::Broken { touch_index: 1, break_index: 3 });
        pierced_break.pierced = true;
        let levels = vec![
            pierced_hold,
            pierced_break,
            test_with(LevelCategory::F3, LevelOutcome::Held { touch_index: 5, confirm_index: 5 }),
            test_with(LevelCategory::F3, LevelOutcome::Unresolved { touch_index: 6 }),
            test_with(LevelCategory::F3, LevelOutcome::Untouched),
        ];
        let stats = aggregate(&levels);
        let f3 = stats.iter().find(|s| s.category == LevelCategory::F3).unwrap();
        assert_eq!(f3.touched, 4);
        assert_eq!(f3.pierced, 2);
        assert_eq!(f3.pierced_rate, Rate::Pct(50.0));

        let f5 = stats.iter().find(|s| s.category == LevelCategory::F5).unwrap();
        assert_eq!(f5.pierced_rate, Rate::NotApplicable);
    }

    #[test]
    fn objective_rates_count_reached() {
        let levels = vec![
            test_with(LevelCategory::Op, LevelOutcome::Reached { index: 9 }),
            test_with(LevelCategory::Op, LevelOutcome::NotReached),
        ];
        let stats = aggregate(&levels);
        let op = stats.iter().find(|s| s.category == LevelCategory::Op).unwrap();
        assert_eq!(op.reach_rate, Rate::Pct(50.0));
        assert_eq!(op.hold_rate, Rate::NotApplicable);
        assert_eq!(overall_hold_rate(&stats), Rate::NotApplicable);
    }
}
