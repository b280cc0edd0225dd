pub mod insights;

pub use insights::AppState;
