pub mod candle;
pub mod dinapoli;
