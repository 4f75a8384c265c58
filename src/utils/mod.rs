pub mod candle;
pub mod env;
pub mod price;
pub mod progress_config;
