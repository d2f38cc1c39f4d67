//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values (a unit
/// conversion factor, a field value, a price). Two value objects with the same
/// values are interchangeable.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
