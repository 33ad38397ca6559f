//! Value object trait: equality by value, not identity.
//!
//! A vehicle part claim is the canonical example here: two parts with the same
//! maker and serial are the same part claim, wherever they are stored.

/// Marker trait for value objects.
///
/// Value objects carry no identity of their own and are compared by their
/// attribute values. To "modify" one, replace it with a new value.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq, Default)]
/// struct Part {
///     maker: OrgId,
///     id: String,
/// }
///
/// impl ValueObject for Part {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
