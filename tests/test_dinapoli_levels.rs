#[cfg(test)]
mod test {
    use float_cmp::approx_eq;

    use dinapoli_quant::trading::indicator::dinapoli::{
        calculate_fibnodes, calculate_objective_points, cluster_levels, detect_swing_points,
        identify_market_swing, ClusterKind, PriceLevel, SwingPair, SwingPoint, Tolerance, Trend,
    };
    use dinapoli_quant::{Candle, InvalidSwing};

    fn low(price: f64, index: usize) -> SwingPoint {
        SwingPoint::new(price, index, false)
    }

    fn high(price: f64, index: usize) -> SwingPoint {
        SwingPoint::new(price, index, true)
    }

    /// 两个正弦叠加的摆动行情
    fn wave_series(len: usize) -> Vec<Candle> {
        (0..len)
            .map(|i| {
                let x = i as f64;
                let p = 100.0 + 20.0 * (x * 0.3).sin() + 5.0 * (x * 1.7).sin();
                Candle {
                    ts: 1_700_000_000_000 + i as i64 * 3_600_000,
                    open: p,
                    high: p + 1.0,
                    low: p - 1.0,
                    close: p + 0.3 * x.sin(),
                    volume: 100.0,
                }
            })
            .collect()
    }

    #[test]
    fn fibnodes_sit_between_reaction_and_focus() {
        let [f3, f5] = calculate_fibnodes(low(100.0, 0), high(200.0, 10)).unwrap();
        assert!(approx_eq!(f64, f3.price, 161.8, epsilon = 1e-9));
        assert!(approx_eq!(f64, f5.price, 138.2, epsilon = 1e-9));
        // F3 比 F5 更靠近 Focus
        assert!(100.0 < f5.price && f5.price < f3.price && f3.price < 200.0);
    }

    #[test]
    fn objective_points_extend_from_c() {
        let [cop, op, xop] =
            calculate_objective_points(low(100.0, 0), high(200.0, 10), low(150.0, 20)).unwrap();
        assert!(approx_eq!(f64, cop.price, 211.8, epsilon = 1e-9));
        assert!(approx_eq!(f64, op.price, 250.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, xop.price, 311.8, epsilon = 1e-9));
        assert_eq!(op.trend(), Trend::Up);
    }

    #[test]
    fn zero_range_swing_is_rejected() {
        assert!(matches!(
            calculate_fibnodes(low(100.0, 0), high(100.0, 4)),
            Err(InvalidSwing::ZeroRange { .. })
        ));
    }

    #[test]
    fn confluence_from_two_swings() {
        // 两个不同波段的 F5：138.2 与 138.436
        let f5_a = SwingPair::new(low(100.0, 0), high(200.0, 10)).unwrap().fibnodes()[1];
        let f5_b = SwingPair::new(low(101.0, 5), high(199.0, 12)).unwrap().fibnodes()[1];
        assert!(approx_eq!(f64, f5_b.price, 138.436, epsilon = 1e-9));

        let outcome = cluster_levels(
            vec![PriceLevel::from(f5_a), PriceLevel::from(f5_b)],
            Tolerance::Absolute(1.0),
        );
        assert_eq!(outcome.groups.len(), 1);
        let group = &outcome.groups[0];
        assert_eq!(group.kind, ClusterKind::Confluence);
        assert!(approx_eq!(f64, group.centroid, (f5_a.price + f5_b.price) / 2.0, epsilon = 1e-9));
        assert!(group.low <= group.centroid && group.centroid <= group.high);
        assert!(group.strength > 0.0 && group.strength <= 1.0);

        // 同一波段的 F3/F5 相距很远，不会形成聚类
        let same = SwingPair::new(low(100.0, 0), high(200.0, 10)).unwrap().fibnodes();
        let outcome = cluster_levels(same.map(PriceLevel::from).to_vec(), Tolerance::Absolute(1.0));
        assert!(outcome.groups.is_empty());
        assert_eq!(outcome.standalone.len(), 2);
    }

    #[test]
    fn detected_swings_alternate_and_respect_window() {
        let candles = wave_series(300);
        let radius = 3;
        let swings = detect_swing_points(&candles, radius).unwrap();
        assert!(swings.len() > 10);

        for pair in swings.windows(2) {
            assert_ne!(pair[0].is_high, pair[1].is_high);
            assert!(pair[0].index <= pair[1].index);
        }
        for s in &swings {
            assert!(s.index >= radius && s.index < candles.len() - radius);
            let window = &candles[s.index - radius..=s.index + radius];
            if s.is_high {
                assert!(window.iter().all(|c| c.high <= s.price));
            } else {
                assert!(window.iter().all(|c| c.low >= s.price));
            }
        }

        let market = identify_market_swing(&swings, 3).unwrap();
        assert_eq!(market.focus, *swings.last().unwrap());
        assert!(market.reactions.len() <= 3);
        assert!(market.reactions.iter().all(|r| r.is_high != market.focus.is_high));
    }
}
