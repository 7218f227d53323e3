//! Expansion of `#[derive(FromContext)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Type};

use crate::fields::{has_flag, named_fields};

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let context_type = context_type(input)?;

    let mut inits = Vec::new();
    for field in named_fields(input, "FromContext")? {
        let field_name = &field.ident;
        let field_type = &field.ty;

        if has_flag(&field.attrs, "from_context", "default")? {
            inits.push(quote! {
                #field_name: <#field_type as ::std::default::Default>::default()
            });
        } else {
            inits.push(quote! {
                #field_name: <#field_type as crate::FromRef<#context_type>>::from_ref(ctx)
            });
        }
    }

    Ok(quote! {
        impl #impl_generics crate::FromRef<#context_type> for #name #ty_generics #where_clause {
            fn from_ref(ctx: &#context_type) -> Self {
                Self {
                    #(#inits),*
                }
            }
        }
    })
}

/// Reads `#[from_context(context = Type)]`, defaulting to `Context`.
fn context_type(input: &DeriveInput) -> syn::Result<TokenStream> {
    let mut context: Option<Type> = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("from_context")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("context") {
                context = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `context = Type`"))
            }
        })?;
    }

    Ok(match context {
        Some(ty) => quote! { #ty },
        None => quote! { Context },
    })
}
