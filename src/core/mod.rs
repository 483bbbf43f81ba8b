/*!
 * Core Module
 * Fundamental scheduler types and error handling
 */

pub mod errors;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use errors::*;
pub use limits::PriorityBounds;
pub use types::*;
