pub mod batch;
pub mod encapsulate;
pub mod plan;
