//! # Pool de Workers y Cola de Tareas
//! src/pool/mod.rs
//!
//! ```text
//! Acceptor → submit → TaskQueue → dequeue (worker libre) → handler
//! ```
//!
//! - `queue`: buffer circular acotado con backpressure
//! - `worker`: threads de larga vida que consumen la cola

pub mod queue;
pub mod worker;

pub use queue::TaskQueue;
pub use worker::WorkerPool;
