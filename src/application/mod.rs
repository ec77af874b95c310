//! Application layer: asynchronous task execution.

pub mod executor;
pub mod worker_pool;

pub use executor::MatchTaskExecutor;
pub use worker_pool::MatchWorkerPool;
