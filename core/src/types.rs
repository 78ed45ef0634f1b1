//! Shared primitive types used across the engine.

/// A stable, unique identifier for any entity in the snapshot.
/// Numeric identifiers in the source are carried verbatim as text.
pub type EntityId = String;

/// Name of a source table (`users`, `subscriptions`, `transactions`).
pub type TableName = &'static str;
