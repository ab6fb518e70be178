use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app_config::env::{env_f64, env_f64_opt, env_is_true, env_or_default, env_usize};
use crate::error::AppError;
use crate::trading::indicator::dinapoli::Tolerance;
use crate::trading::strategy::dinapoli_backtest::HoldRule;

/// 摆动窗口半径上限，保证 `2k + 1` 不会溢出
pub const MAX_SWING_WINDOW_RADIUS: usize = 10_000;

/// DiNapoli 回测配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DinapoliConfig {
    /// 摆动识别窗口半径 k
    pub swing_window_radius: usize,
    /// 聚类合并距离，同时作为突破判定阈值
    pub cluster_tolerance: Tolerance,
    /// 单独指定突破判定阈值，不设置时沿用 cluster_tolerance
    pub break_tolerance: Option<Tolerance>,
    pub hold_rule: HoldRule,
    /// 每个 Focus 最多使用的 Reaction 数量
    pub max_reactions: usize,
    /// 支撑/阻力观察的K线数量，None 表示直到序列结束
    pub test_horizon: Option<usize>,
}

impl Default for DinapoliConfig {
    fn default() -> Self {
        Self {
            swing_window_radius: 5,
            cluster_tolerance: Tolerance::Percent(0.5),
            break_tolerance: None,
            hold_rule: HoldRule::default(),
            max_reactions: 5,
            test_horizon: Some(50),
        }
    }
}

impl DinapoliConfig {
    /// 从环境变量读取，未设置的项使用默认值
    ///
    /// - `SWING_WINDOW_RADIUS`
    /// - `CLUSTER_TOLERANCE` + `CLUSTER_TOLERANCE_MODE`（pct | abs）
    /// - `BREAK_TOLERANCE`（与 CLUSTER_TOLERANCE_MODE 同单位）
    /// - `HOLD_CONFIRM_CLOSES` / `HOLD_COUNT_TOUCH_BAR`
    /// - `MAX_REACTIONS`
    /// - `TEST_HORIZON`（0 表示不限制）
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let mode = env_or_default("CLUSTER_TOLERANCE_MODE", "pct");
        let to_tolerance = |value: f64| -> Result<Tolerance, AppError> {
            match mode.trim().to_ascii_lowercase().as_str() {
                "pct" | "percent" => Ok(Tolerance::Percent(value)),
                "abs" | "absolute" => Ok(Tolerance::Absolute(value)),
                other => Err(AppError::Config(format!(
                    "unknown CLUSTER_TOLERANCE_MODE: {}",
                    other
                ))),
            }
        };

        let cluster_tolerance = to_tolerance(env_f64("CLUSTER_TOLERANCE", 0.5))?;
        let break_tolerance = env_f64_opt("BREAK_TOLERANCE").map(to_tolerance).transpose()?;
        let hold_rule = HoldRule {
            confirm_closes: env_usize("HOLD_CONFIRM_CLOSES", defaults.hold_rule.confirm_closes),
            count_touch_bar: env_is_true("HOLD_COUNT_TOUCH_BAR", defaults.hold_rule.count_touch_bar),
        };
        let test_horizon = match env_usize("TEST_HORIZON", defaults.test_horizon.unwrap_or(0)) {
            0 => None,
            n => Some(n),
        };

        let config = Self {
            swing_window_radius: env_usize("SWING_WINDOW_RADIUS", defaults.swing_window_radius),
            cluster_tolerance,
            break_tolerance,
            hold_rule,
            max_reactions: env_usize("MAX_REACTIONS", defaults.max_reactions),
            test_horizon,
        };
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件读取，缺省字段使用默认值
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.swing_window_radius == 0 {
            return Err(AppError::Config(
                "swing_window_radius must be greater than 0".to_string(),
            ));
        }
        if self.swing_window_radius > MAX_SWING_WINDOW_RADIUS {
            return Err(AppError::Config(format!(
                "swing_window_radius must be at most {}: {}",
                MAX_SWING_WINDOW_RADIUS, self.swing_window_radius
            )));
        }
        if !self.cluster_tolerance.is_valid() {
            return Err(AppError::Config(format!(
                "cluster_tolerance must be positive: {:?}",
                self.cluster_tolerance
            )));
        }
        if let Some(t) = self.break_tolerance {
            if !t.is_valid() {
                return Err(AppError::Config(format!(
                    "break_tolerance must be positive: {:?}",
                    t
                )));
            }
        }
        if self.hold_rule.confirm_closes == 0 {
            return Err(AppError::Config(
                "hold_rule.confirm_closes must be at least 1".to_string(),
            ));
        }
        if self.max_reactions == 0 {
            return Err(AppError::Config(
                "max_reactions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// 突破判定阈值
    pub fn decisive_tolerance(&self) -> Tolerance {
        self.break_tolerance.unwrap_or(self.cluster_tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: DinapoliConfig = serde_json::from_str(
            r#"{"swing_window_radius": 3, "cluster_tolerance": {"mode": "absolute", "value": 1.0}}"#,
        )
        .unwrap();
        assert_eq!(config.swing_window_radius, 3);
        assert_eq!(config.cluster_tolerance, Tolerance::Absolute(1.0));
        assert_eq!(config.max_reactions, 5);
        assert_eq!(config.decisive_tolerance(), Tolerance::Absolute(1.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = DinapoliConfig::default();
        config.swing_window_radius = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = DinapoliConfig::default();
        config.cluster_tolerance = Tolerance::Percent(0.0);
        assert!(config.validate().is_err());

        let mut config = DinapoliConfig::default();
        config.hold_rule.confirm_closes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_caps_window_radius() {
        let mut config = DinapoliConfig::default();
        config.swing_window_radius = usize::MAX;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.swing_window_radius = MAX_SWING_WINDOW_RADIUS;
        assert!(config.validate().is_ok());
    }
}
