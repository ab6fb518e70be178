pub mod candle_source;

pub use candle_source::{CandleSource, InMemoryCandleSource, JsonFileCandleSource};
