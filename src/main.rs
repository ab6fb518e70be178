use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};

use dinapoli_quant::app_config::dinapoli::DinapoliConfig;
use dinapoli_quant::app_config::log::setup_logging;
use dinapoli_quant::trading::services::candle_source::JsonFileCandleSource;
use dinapoli_quant::trading::strategy::dinapoli_backtest::BacktestResult;
use dinapoli_quant::trading::task::backtest_job::{run_backtests, BacktestJobParams};

#[derive(Parser)]
#[command(name = "dinapoli_quant", about = "DiNapoli 斐波那契点位回测")]
struct Args {
    /// 交易对，逗号分隔（如 BTC-USDT,ETH-USDT）
    #[arg(long, value_delimiter = ',', required = true)]
    symbols: Vec<String>,

    /// K线 JSON 文件目录，文件名为 <SYMBOL>.json
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// 回测配置 JSON，不指定时读取环境变量
    #[arg(long)]
    config: Option<PathBuf>,

    /// 开始时间（毫秒时间戳）
    #[arg(long)]
    start: Option<i64>,

    /// 结束时间（毫秒时间戳）
    #[arg(long)]
    end: Option<i64>,

    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// 回测明细写入 JSON 文件
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = setup_logging()?;
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DinapoliConfig::from_json_file(path)?,
        None => DinapoliConfig::from_env()?,
    };
    info!("回测配置: {:?}", config);

    let source = Arc::new(JsonFileCandleSource::new(&args.data_dir));
    let params = BacktestJobParams {
        symbols: args.symbols.clone(),
        start: args.start,
        end: args.end,
        max_concurrency: args.concurrency,
    };
    let outcomes = run_backtests(source, params, config).await?;

    let mut reports: Vec<&BacktestResult> = Vec::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(result) => {
                info!("\n{}", result);
                reports.push(result);
            }
            Err(e) => error!("[{}] 回测失败: {:#}", outcome.symbol, e),
        }
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&reports)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("写入回测结果失败: {}", path.display()))?;
        info!("回测结果已写入 {}", path.display());
    }

    Ok(())
}
