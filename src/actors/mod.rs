// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for work that must not block a request.
//
// Note: Domain logic (Order, Cart, etc.) uses CommandHandlers, NOT actors.
//       Actors are reserved for infrastructure concerns only.
//
// ============================================================================

mod receipt_actor;

pub use receipt_actor::{
    FailedReceipt,
    GenerateReceipt,
    GetFailedReceipts,
    GetReceipt,
    ReceiptActor,
    RenderReceipt,
};
