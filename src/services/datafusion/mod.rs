// DataFusion engine module
//
// DataFusion stands in for the distributed dataframe: every pipeline stage is a
// lazy `DataFrame` transformation, and partition-level parallelism is left to
// the engine's own scheduler.

pub mod converter; // Arrow -> MySQL value conversion
pub mod session; // SessionContext factory

pub use converter::ArrowValueConverter;
pub use session::{DataFusionSessionManager, SessionConfig};
