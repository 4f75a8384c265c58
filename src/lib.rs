pub mod catalog;
pub mod collectors;
pub mod config;
pub mod error;
pub mod matching;
pub mod models;
pub mod persistence;
pub mod utils;
