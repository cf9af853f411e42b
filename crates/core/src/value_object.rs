//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**; they are defined entirely by their attribute
/// values and are validated once, at construction. A shift's time window is the
/// typical example: two windows with the same start and end are the same window.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
