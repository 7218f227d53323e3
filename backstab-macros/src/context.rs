//! Expansion of `#[derive(Context)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::fields::{has_flag, named_fields};

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut impls = Vec::new();
    for field in named_fields(input, "Context")? {
        if has_flag(&field.attrs, "context", "skip")? {
            continue;
        }
        let field_name = &field.ident;
        let field_type = &field.ty;

        impls.push(quote! {
            impl #impl_generics crate::FromRef<#name #ty_generics> for #field_type #where_clause {
                fn from_ref(ctx: &#name #ty_generics) -> Self {
                    ::std::clone::Clone::clone(&ctx.#field_name)
                }
            }
        });
    }

    Ok(quote! { #(#impls)* })
}
