//! Records with identity.

/// A record that keeps its identity while its fields change.
///
/// Stores key rows by `Entity::id`; two records with the same id are the same
/// entity regardless of their other fields.
pub trait Entity {
    /// Lowercase name used in error messages ("shift not found").
    const NAME: &'static str;

    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
