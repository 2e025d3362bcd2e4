pub mod engine;

pub use engine::QueryExecutionEngine;
