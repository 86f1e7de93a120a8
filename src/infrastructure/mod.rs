pub mod account_store;
pub mod config;
pub mod error;
pub mod export;
pub mod history_store;
pub mod storage;
