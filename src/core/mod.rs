pub mod cache;
pub mod convert;
pub mod error;
pub mod log;
pub mod rates;
pub mod resolver;
