//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values.
/// `Money` is one; an `Item` is not (it is an [`crate::Entity`]).
///
/// ```ignore
/// let a = Money::from_cents(1349);
/// let b: Money = "13.49".parse().unwrap();
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
