use serde::Serialize;
use thiserror::Error;

/// 应用错误
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 行情数据源错误
    #[error("数据源错误: {0}")]
    DataSource(String),

    #[error("解析错误: {0}")]
    Parse(String),

    /// 未知错误
    #[error("未知错误: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Unknown(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::DataSource(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Parse(e.to_string())
    }
}

/// 核心流水线错误（摆动识别 / 点位计算）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DinapoliError {
    /// 序列长度不足以确认任何摆动点
    #[error("数据不足: 需要至少 {required} 根K线, 实际 {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("配置错误: {0}")]
    Config(String),
}

/// 摆动被拒绝的具体原因，全部带上出问题的 K 线索引。
/// 由 `SwingPair::new` / `SwingTriple::new` 直接返回，回测中记为排除样本而不中断
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize)]
pub enum InvalidSwing {
    #[error("A({a_index}) and B({b_index}) have the same polarity")]
    SamePolarity { a_index: usize, b_index: usize },

    #[error("zero-range swing: A({a_index}) == B({b_index}) at {price}")]
    ZeroRange {
        a_index: usize,
        b_index: usize,
        price: f64,
    },

    #[error("A({a_index}) price is on the wrong side of B({b_index}) for its polarity")]
    WrongOrientation { a_index: usize, b_index: usize },

    #[error("swing points out of order: A({a_index}) B({b_index}) C({c_index:?})")]
    IndexOrder {
        a_index: usize,
        b_index: usize,
        c_index: Option<usize>,
    },

    #[error("C({c_index}) must share the polarity of A")]
    CPolarity { c_index: usize },

    #[error("C({c_index}) at {c_price} lies outside [A, B)")]
    COutOfRange { c_index: usize, c_price: f64 },
}

