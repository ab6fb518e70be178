//! DiNapoli 只使用以下固定比率，不计算其他斐波那契比率

/// 回撤比率（Fibnode）
pub const FIBONACCI_ZERO_POINT_THREE_EIGHT_TWO: f64 = 0.382;
pub const FIBONACCI_ZERO_POINT_SIX_ONE_EIGHT: f64 = 0.618;

/// 扩展比率（Objective Point）
pub const FIBONACCI_ONE_POINT_ZERO: f64 = 1.0;
pub const FIBONACCI_ONE_POINT_SIX_ONE_EIGHT: f64 = 1.618;
