// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Shopper-side cart and pricing, the order aggregate with its payment and
// fulfillment lifecycles, and the interfaces of the collaborators the order
// core talks to (product catalog, caller identity).
//
// This layer is completely separate from the event sourcing infrastructure.
//
// ============================================================================

pub mod access;
pub mod catalog;
pub mod pricing;
pub mod cart;
pub mod order;
