//! Entity traits: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Entities whose rows carry an optimistic-concurrency version.
///
/// The persistence gateway bumps the version on every committed write.
pub trait Versioned: Entity {
    fn version(&self) -> u64;

    fn set_version(&mut self, version: u64);
}
