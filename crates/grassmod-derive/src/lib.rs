//! Derive macros for grassmod.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, parse_macro_input};

/// How a single field combines its two layers.
enum Strategy {
    /// Delegate to the field's own `Merge` impl.
    Merge,
    /// Keep both layers: `self` items first, then `other` items.
    Append,
}

fn field_strategy(attrs: &[Attribute]) -> syn::Result<Strategy> {
    let mut strategy = Strategy::Merge;
    for attr in attrs.iter().filter(|a| a.path().is_ident("merge")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("append") {
                strategy = Strategy::Append;
                Ok(())
            } else {
                Err(meta.error("unknown merge strategy, expected `append`"))
            }
        })?;
    }
    Ok(strategy)
}

fn merge_expr(strategy: Strategy, lhs: TokenStream2, rhs: TokenStream2) -> TokenStream2 {
    match strategy {
        Strategy::Merge => quote! { ::grassmod_core::Merge::merge(#lhs, #rhs) },
        Strategy::Append => quote! {
            {
                let mut merged = #lhs;
                ::std::iter::Extend::extend(&mut merged, #rhs);
                merged
            }
        },
    }
}

/// Derive the `Merge` trait for a config struct.
///
/// Each field is merged with its own `Merge` impl, so `Option` fields from the
/// higher-priority layer win only when they are set. Mark a collection field
/// `#[merge(append)]` to concatenate both layers instead.
///
/// # Example
///
/// ```ignore
/// use grassmod_core::Merge;
///
/// #[derive(Merge)]
/// struct GrassConfig {
///     gisbase: Option<String>,
///     #[merge(append)]
///     addon_paths: Vec<String>,
/// }
/// ```
#[proc_macro_derive(Merge, attributes(merge))]
pub fn derive_merge(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => {
                let merges = fields
                    .named
                    .iter()
                    .map(|f| {
                        let field = &f.ident;
                        let expr = merge_expr(
                            field_strategy(&f.attrs)?,
                            quote! { self.#field },
                            quote! { other.#field },
                        );
                        Ok(quote! { #field: #expr })
                    })
                    .collect::<syn::Result<Vec<_>>>()?;
                quote! { Self { #(#merges),* } }
            }
            Fields::Unnamed(fields) => {
                let merges = fields
                    .unnamed
                    .iter()
                    .enumerate()
                    .map(|(i, f)| {
                        let index = syn::Index::from(i);
                        Ok(merge_expr(
                            field_strategy(&f.attrs)?,
                            quote! { self.#index },
                            quote! { other.#index },
                        ))
                    })
                    .collect::<syn::Result<Vec<_>>>()?;
                quote! { Self(#(#merges),*) }
            }
            Fields::Unit => quote! { Self },
        },
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Merge cannot be derived for enums",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Merge cannot be derived for unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::grassmod_core::Merge for #name #ty_generics #where_clause {
            fn merge(self, other: Self) -> Self {
                #body
            }
        }
    })
}
