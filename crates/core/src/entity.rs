//! Entity trait: identity + continuity across state changes.

use core::fmt;

/// The four record kinds the system stores.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Customer,
    Invoice,
    Product,
    Sale,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Customer => "customer",
            EntityKind::Invoice => "invoice",
            EntityKind::Product => "product",
            EntityKind::Sale => "sale",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity marker + minimal interface.
///
/// An entity is persisted from its `Draft` (all attributes, no identity); the store
/// assigns the identifier on save and hands back the full entity.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync;

    /// Attributes of a not-yet-persisted entity.
    type Draft: Clone + core::fmt::Debug + Send + Sync + 'static;

    /// Which record kind this entity is.
    const KIND: EntityKind;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Combine a store-assigned identifier with the draft attributes.
    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self;
}
