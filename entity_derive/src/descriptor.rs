//! Code generation for the `Entity` implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::parsing::EntityInfo;

pub fn generate_entity_impl(input: &DeriveInput, info: &EntityInfo) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let schema = &info.schema;
    let table = &info.table;

    quote! {
        impl #impl_generics ::nordic::Entity for #name #ty_generics #where_clause {
            fn entity() -> ::nordic::EntityDescriptor {
                ::nordic::EntityDescriptor::new(#schema, #table)
            }
        }
    }
}
