// ============================================================================
// Order Domain - Business Logic for Order Aggregate
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderNumber, ShippingAddress, PaymentInfo, OrderStatus)
// - Timeline (append-only audit trail)
// - Events (OrderPlaced, PaymentConfirmed, etc.)
// - Commands (PlaceOrder, ConfirmPayment, etc.)
// - Errors (OrderError enum)
// - Factory (checkout validation and snapshot)
// - Aggregate (Order with business logic)
// - Command Handler (OrderCommandHandler)
// - Projection (in-memory read model for listings)
//
// ============================================================================

pub mod value_objects;
pub mod timeline;
pub mod events;
pub mod commands;
pub mod errors;
pub mod factory;
pub mod aggregate;
pub mod command_handler;
pub mod projection;

// Re-export for convenience
pub use value_objects::*;
pub use timeline::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use factory::place_order;
pub use aggregate::*;
pub use command_handler::*;
pub use projection::*;
