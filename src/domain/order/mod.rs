// ============================================================================
// Order Domain - the order workflow and its types
// ============================================================================

pub mod errors;
pub mod model;
pub mod service;

pub use errors::*;
pub use model::*;
pub use service::*;
