//! 多交易对并行回测
//!
//! 每个交易对一个任务，由信号量限制同时运行的数量；
//! 数据获取为异步，点位计算与测试放到阻塞线程池执行。

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::app_config::dinapoli::DinapoliConfig;
use crate::time_util::mill_time_to_datetime;
use crate::trading::services::candle_source::CandleSource;
use crate::trading::strategy::dinapoli_backtest::{BacktestResult, DinapoliBacktester};

/// 回测任务参数
#[derive(Debug, Clone)]
pub struct BacktestJobParams {
    pub symbols: Vec<String>,
    /// 毫秒时间戳，闭区间
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub max_concurrency: usize,
}

/// 单个交易对的执行结果，某个交易对失败不影响其他交易对
#[derive(Debug)]
pub struct SymbolBacktest {
    pub symbol: String,
    pub result: Result<BacktestResult>,
}

pub async fn run_backtests(
    source: Arc<dyn CandleSource>,
    params: BacktestJobParams,
    config: DinapoliConfig,
) -> Result<Vec<SymbolBacktest>> {
    let backtester = Arc::new(DinapoliBacktester::new(config)?);
    let semaphore = Arc::new(Semaphore::new(params.max_concurrency.max(1)));
    let started = Instant::now();

    info!(
        "开始回测 {} 个交易对，数据源: {}，并发: {}",
        params.symbols.len(),
        source.name(),
        params.max_concurrency.max(1)
    );

    let mut tasks = Vec::with_capacity(params.symbols.len());
    for symbol in &params.symbols {
        let symbol = symbol.clone();
        let source = Arc::clone(&source);
        let backtester = Arc::clone(&backtester);
        let permit = Arc::clone(&semaphore);
        let (start, end) = (params.start, params.end);

        tasks.push(tokio::spawn(async move {
            let _permit = permit
                .acquire_owned()
                .await
                .map_err(|e| anyhow!("semaphore closed: {}", e))?;
            run_symbol(source, backtester, symbol, start, end).await
        }));
    }

    let results = join_all(tasks)
        .await
        .into_iter()
        .zip(params.symbols.iter())
        .map(|(joined, symbol)| {
            let result = joined
                .map_err(|e| anyhow!("backtest task panicked: {}", e))
                .and_then(|r| r);
            if let Err(e) = &result {
                error!("[{}] 回测失败: {:#}", symbol, e);
            }
            SymbolBacktest {
                symbol: symbol.clone(),
                result,
            }
        })
        .collect();

    info!("全部回测完成，用时：{:?}", started.elapsed());
    Ok(results)
}

async fn run_symbol(
    source: Arc<dyn CandleSource>,
    backtester: Arc<DinapoliBacktester>,
    symbol: String,
    start: Option<i64>,
    end: Option<i64>,
) -> Result<BacktestResult> {
    let candles = source
        .fetch_candles(&symbol, start, end)
        .await
        .with_context(|| format!("获取K线失败: {}", symbol))?;
    let span_of = |ts: Option<i64>| {
        ts.and_then(|t| mill_time_to_datetime(t).ok())
            .unwrap_or_else(|| "-".to_string())
    };
    info!(
        "[{}] 获取K线 {} 根: {} ~ {}",
        symbol,
        candles.len(),
        span_of(candles.first().map(|c| c.ts)),
        span_of(candles.last().map(|c| c.ts))
    );

    let result = tokio::task::spawn_blocking(move || backtester.run(&symbol, &candles)).await?;
    Ok(result)
}
