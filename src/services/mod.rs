pub mod datafusion; // DataFusion session and Arrow conversion
pub mod insights; // Read side of the trips table for the query API
pub mod pipeline;
pub mod sink;

pub use insights::*;
pub use pipeline::*;
pub use sink::*;
