//! Entity trait: a record whose identity outlives its field changes.
//!
//! A car keeps its vin from order to full assembly while every part claim on
//! it changes, and its storage key is derived from that vin alone.

/// Something stored under a key derived from its own identity.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}
