pub mod dinapoli_backtest;
