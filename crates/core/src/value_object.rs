//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. A `JobName` or a
/// `LeaseConfig` is fully described by its fields; two instances with the same
/// fields are interchangeable.
///
/// The trait requires:
/// - **Clone**: values are cheap to copy around between tasks
/// - **PartialEq**: comparison is by attribute values
/// - **Debug**: values show up in logs and test failures
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
