pub mod backtest_job;
