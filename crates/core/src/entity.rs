//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Items and accounts are entities: they keep their identity while copies,
/// loans and balances change underneath.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
