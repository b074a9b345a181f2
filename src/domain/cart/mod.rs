// ============================================================================
// Cart Domain - Session-local cart held by the shopper
// ============================================================================

pub mod value_objects;
pub mod cart;

pub use value_objects::*;
pub use cart::*;
