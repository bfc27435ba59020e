extern crate proc_macro;

mod model;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Implements the `Model` trait for a named struct, generating the accessor
/// table the runtime uses in place of reflection.
///
/// Field behavior is controlled with an `#[orm("...")]` attribute holding
/// space-separated `key=value` pairs (a bare key means `true`):
///
/// - `name=<column>` overrides the derived snake-case column name
/// - `pk` marks the primary key (defaults to the field named `id`)
/// - `virtual` excludes the field from columns and binding
/// - `embed` flattens a nested `Model` struct's fields into this one's
///   slot list; the nested struct is not a column itself
///
/// Untagged fields are scalars and must implement `ToValue` and
/// `FromValue`. A nested struct that implements the scalar protocol is
/// bound as one column; tag it `embed` to flatten it instead.
///
/// # Example
///
/// ```ignore
/// #[derive(Model, Default)]
/// struct User {
///     id: i64,
///     name: String,
///     #[orm("name=mail")]
///     email: String,
///     #[orm("virtual")]
///     dirty: bool,
/// }
/// ```
#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match model::expand(input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}
