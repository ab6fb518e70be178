//! K线数据源抽象
//!
//! 回测只依赖 `CandleSource`，数据来自内存还是文件由调用方决定。

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::Candle;

/// K线数据源
#[async_trait]
pub trait CandleSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// 获取按时间升序排列的K线
    ///
    /// # Arguments
    /// * `symbol` - 交易对（如"BTC-USDT"）
    /// * `start` / `end` - 毫秒时间戳，闭区间，None 表示不限制
    async fn fetch_candles(&self, symbol: &str, start: Option<i64>, end: Option<i64>) -> Result<Vec<Candle>>;
}

fn within_range(candle: &Candle, start: Option<i64>, end: Option<i64>) -> bool {
    start.map_or(true, |s| candle.ts >= s) && end.map_or(true, |e| candle.ts <= e)
}

/// 内存数据源，主要用于测试
#[derive(Debug, Clone, Default)]
pub struct InMemoryCandleSource {
    data: HashMap<String, Vec<Candle>>,
}

impl InMemoryCandleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candles(mut self, symbol: impl Into<String>, candles: Vec<Candle>) -> Self {
        self.insert(symbol, candles);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, candles: Vec<Candle>) {
        self.data.insert(symbol.into(), candles);
    }
}

#[async_trait]
impl CandleSource for InMemoryCandleSource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_candles(&self, symbol: &str, start: Option<i64>, end: Option<i64>) -> Result<Vec<Candle>> {
        let candles = self
            .data
            .get(symbol)
            .ok_or_else(|| anyhow!("no candles for symbol {}", symbol))?;
        Ok(candles
            .iter()
            .filter(|c| within_range(c, start, end))
            .copied()
            .collect())
    }
}

/// JSON 文件数据源：`<dir>/<SYMBOL>.json`，内容为 K线数组
#[derive(Debug, Clone)]
pub struct JsonFileCandleSource {
    dir: PathBuf,
}

impl JsonFileCandleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.json", symbol))
    }
}

#[async_trait]
impl CandleSource for JsonFileCandleSource {
    fn name(&self) -> &'static str {
        "json_file"
    }

    async fn fetch_candles(&self, symbol: &str, start: Option<i64>, end: Option<i64>) -> Result<Vec<Candle>> {
        let path = self.path_for(symbol);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("读取K线文件失败: {}", path.display()))?;
        let raw: Vec<Candle> = serde_json::from_str(&content)
            .with_context(|| format!("解析K线文件失败: {}", path.display()))?;

        let mut candles = raw
            .into_iter()
            .filter(|c| within_range(c, start, end))
            .map(|c| {
                Candle::builder()
                    .ts(c.ts)
                    .o(c.open)
                    .h(c.high)
                    .l(c.low)
                    .c(c.close)
                    .v(c.volume)
                    .build()
            })
            .collect::<Result<Vec<Candle>>>()
            .with_context(|| format!("K线数据无效: {}", path.display()))?;
        candles.sort_by_key(|c| c.ts);

        debug!("loaded {} candles for {} from {}", candles.len(), symbol, path.display());
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(ts: i64) -> Candle {
        Candle {
            ts,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 10.0,
        }
    }

    #[tokio::test]
    async fn memory_source_filters_by_range() {
        let source = InMemoryCandleSource::new().with_candles("BTC-USDT", (1..=5).map(candle).collect());
        let candles = source.fetch_candles("BTC-USDT", Some(2), Some(4)).await.unwrap();
        let ts: Vec<i64> = candles.iter().map(|c| c.ts).collect();
        assert_eq!(ts, vec![2, 3, 4]);
        assert!(source.fetch_candles("ETH-USDT", None, None).await.is_err());
    }

    #[tokio::test]
    async fn json_source_sorts_and_validates() {
        let dir = std::env::temp_dir().join(format!("dinapoli_source_{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let source = JsonFileCandleSource::new(&dir);

        let unordered = vec![candle(3), candle(1), candle(2)];
        tokio::fs::write(source.path_for("SOL-USDT"), serde_json::to_string(&unordered).unwrap())
            .await
            .unwrap();
        let candles = source.fetch_candles("SOL-USDT", None, None).await.unwrap();
        assert_eq!(candles.iter().map(|c| c.ts).collect::<Vec<_>>(), vec![1, 2, 3]);

        let mut broken = candle(1);
        broken.high = 0.1;
        tokio::fs::write(source.path_for("BAD-USDT"), serde_json::to_string(&vec![broken]).unwrap())
            .await
            .unwrap();
        assert!(source.fetch_candles("BAD-USDT", None, None).await.is_err());
        assert!(source.fetch_candles("MISSING", None, None).await.is_err());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
