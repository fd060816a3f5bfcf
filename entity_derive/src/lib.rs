//! Procedural macro for static entity descriptors
//!
//! `#[derive(Entity)]` turns a struct into a compile-time entity identifier
//! that `Nordic::get_dao_for::<T>()` resolves without any string lookups.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod descriptor;
mod parsing;

use descriptor::generate_entity_impl;
use parsing::parse_entity_attributes;

/// Derive macro for the `Entity` trait
///
/// ```rust,ignore
/// use nordic::prelude::*;
///
/// #[derive(Entity)]
/// #[entity(schema = "secured", table = "articles")]
/// pub struct Article;
///
/// // schema defaults to "public", table to the snake_case struct name
/// #[derive(Entity)]
/// pub struct UserProfile;
/// ```
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let entity_info = match parse_entity_attributes(&input.ident, &input.attrs) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    TokenStream::from(generate_entity_impl(&input, &entity_info))
}
