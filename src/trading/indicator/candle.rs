use serde::{Deserialize, Serialize};
use ta::{Close, High, Low, Open, Volume};

/// OHLCV K线
///
/// 序列按时间升序排列，核心计算只使用在序列中的位置，不假设固定间隔（允许缺失K线）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Candle {
    pub ts: i64, // 时间戳 (毫秒)
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    pub fn builder() -> CandleBuilder {
        CandleBuilder::new()
    }
}

impl Open for Candle {
    fn open(&self) -> f64 {
        self.open
    }
}

impl High for Candle {
    fn high(&self) -> f64 {
        self.high
    }
}

impl Low for Candle {
    fn low(&self) -> f64 {
        self.low
    }
}

impl Close for Candle {
    fn close(&self) -> f64 {
        self.close
    }
}

impl Volume for Candle {
    fn volume(&self) -> f64 {
        self.volume
    }
}

#[derive(Default)]
pub struct CandleBuilder {
    ts: Option<i64>,
    o: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    c: Option<f64>,
    v: Option<f64>,
}

impl CandleBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn ts(mut self, val: i64) -> Self {
        self.ts = Some(val);
        self
    }
    pub fn o(mut self, val: f64) -> Self {
        self.o = Some(val);
        self
    }
    pub fn h(mut self, val: f64) -> Self {
        self.h = Some(val);
        self
    }
    pub fn l(mut self, val: f64) -> Self {
        self.l = Some(val);
        self
    }
    pub fn c(mut self, val: f64) -> Self {
        self.c = Some(val);
        self
    }
    pub fn v(mut self, val: f64) -> Self {
        self.v = Some(val);
        self
    }

    pub fn build(self) -> anyhow::Result<Candle> {
        if let (Some(ts), Some(open), Some(high), Some(low), Some(close)) =
            (self.ts, self.o, self.h, self.l, self.c)
        {
            let volume = self.v.unwrap_or(0.0);
            // validate
            if low <= open && low <= close && low <= high && high >= open && high >= close && volume >= 0.0 {
                Ok(Candle {
                    ts,
                    open,
                    high,
                    low,
                    close,
                    volume,
                })
            } else {
                Err(anyhow::anyhow!("CandleInvalid: ts={}", ts))
            }
        } else {
            Err(anyhow::anyhow!("CandleIncomplete"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_inconsistent_bar() {
        let ok = Candle::builder().ts(1).o(10.0).h(12.0).l(9.0).c(11.0).build();
        assert!(ok.is_ok());

        let bad = Candle::builder().ts(1).o(10.0).h(9.5).l(9.0).c(11.0).build();
        assert!(bad.is_err());

        let incomplete = Candle::builder().ts(1).o(10.0).build();
        assert!(incomplete.is_err());
    }
}
