//! The per-entity accessor table.
//!
//! `#[derive(Model)]` generates these three methods from a struct's layout;
//! together they replace the runtime reflection an ORM would otherwise need.
//! [`Model::fields`] describes the declared layout, [`Model::collect`] hands
//! out one write target per scannable field (recursing through embedded
//! records, stopping at any type that implements the scalar protocol), and
//! [`Model::values`] reads every scannable field back out.

use smallvec::SmallVec;

use crate::value::{Sink, Value};

/// Static metadata for one declared field, in declaration order.
///
/// `column` is the derived name: an `#[orm("name=...")]` override when
/// present, otherwise the snake-case form of the field identifier. Schema
/// registration may still rename the column afterwards via the configurator;
/// `ident` is the stable key connecting the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// The Rust field identifier.
    pub ident: &'static str,
    /// Derived column name.
    pub column: &'static str,
    /// Explicit `pk=true` tag, or the identifier is `id` (case-insensitive).
    pub primary_key: bool,
    /// Not a scannable column: an embedded record or a `virtual=true` tag.
    pub is_virtual: bool,
    /// Declared Rust type, for diagnostics.
    pub type_name: &'static str,
}

/// One scannable write target produced by [`Model::collect`].
pub struct SlotEntry<'a> {
    pub ident: &'static str,
    pub column: &'static str,
    pub sink: &'a mut dyn Sink,
}

impl std::fmt::Debug for SlotEntry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotEntry")
            .field("ident", &self.ident)
            .field("column", &self.column)
            .finish()
    }
}

/// Slot list filled by one [`Model::collect`] walk.
pub type Slots<'a> = SmallVec<[SlotEntry<'a>; 8]>;

/// A record type whose fields can be enumerated, written and read without
/// reflection. Derived with `#[derive(Model)]`.
pub trait Model {
    /// Appends this type's field metadata in declaration order. Embedded
    /// records appear as a single virtual field; their layout is a binder
    /// concern, not a schema one.
    fn fields(out: &mut Vec<FieldSpec>);

    /// Appends one slot per scannable field, walking depth-first through
    /// embedded records and stopping at scalar-protocol types.
    fn collect<'a>(&'a mut self, slots: &mut Slots<'a>);

    /// Appends `(ident, value)` for every scannable top-level field, in
    /// declaration order.
    fn values(&self, out: &mut Vec<(&'static str, Value)>);
}
