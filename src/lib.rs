pub mod aggregate;
pub mod cache;
pub mod collect;
pub mod error;
pub mod export;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod parse;
pub mod query;
pub mod report;
pub mod validate;
