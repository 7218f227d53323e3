//! Derive macros used to wire the Backstab processor.
//!
//! - `#[derive(Context)]` exposes every field of a root context through `FromRef`
//! - `#[derive(FromContext)]` builds a struct by resolving each field from a context
//!
//! Generated code refers to `crate::FromRef`, so the consuming crate re-exports
//! the trait at its root.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod context;
mod fields;
mod from_context;

/// Derives `FromRef<Self>` for the type of each named field.
///
/// Fields marked `#[context(skip)]` are left out, which is needed when two
/// fields share a type.
///
/// ```ignore
/// #[derive(Context, Clone)]
/// pub struct Context {
///     pub config: Arc<Config>,
///     pub writer: AppWriter,
/// }
///
/// // impl FromRef<Context> for Arc<Config> { ... }
/// // impl FromRef<Context> for AppWriter { ... }
/// ```
#[proc_macro_derive(Context, attributes(context))]
pub fn derive_context(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    context::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives `FromRef<Context>` by resolving every field from the context.
///
/// The context type defaults to `Context` and is overridden with
/// `#[from_context(context = path::ToContext)]`. A field marked
/// `#[from_context(default)]` is built with `Default::default()` instead.
///
/// ```ignore
/// #[derive(FromContext, Clone)]
/// pub struct Processor {
///     parser: AppParser,      // <AppParser as FromRef<Context>>::from_ref(ctx)
///     generator: AppGenerator,
/// }
/// ```
#[proc_macro_derive(FromContext, attributes(from_context))]
pub fn derive_from_context(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_context::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
