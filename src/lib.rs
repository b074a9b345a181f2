// ============================================================================
// FruitMart Orders - Order and Payment Lifecycle Core
// ============================================================================
//
// Layers, inside out:
// - domain/          cart, pricing, order aggregate, collaborator interfaces
// - event_sourcing/  aggregate trait, envelopes, event stores
// - receipts/        receipt generator collaborator
// - actors/          background receipt generation with dead letters
// - service          authorization and the public operations
// - api/             actix-web transport
// - metrics/         Prometheus registry and scrape endpoint
//
// ============================================================================

pub mod actors;
pub mod api;
pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod metrics;
pub mod receipts;
pub mod service;
pub mod utils;
