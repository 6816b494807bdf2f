use darling::FromAttributes as _;
use heck::ToKebabCase as _;
use itertools::Itertools as _;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Fields, FieldsNamed, FieldsUnnamed, Ident, Token, Type, Variant,
    ext::IdentExt as _, punctuated::Punctuated, spanned::Spanned as _,
};

use crate::generics::reject_generics;

#[derive(darling::FromAttributes, Debug)]
#[darling(attributes(arg))]
struct VariantAttr {
    rename: Option<String>,
}

/// The variant that receives any text that isn't one of the unit variant
/// names.
struct Fallback<'a> {
    variant: &'a Ident,
    field: Option<&'a Ident>,
}

struct AnalyzedEnum<'a> {
    variants: Vec<(String, &'a Ident)>,
    fallback: Option<Fallback<'a>>,
}

impl<'a> AnalyzedEnum<'a> {
    fn from_variants(variants: impl IntoIterator<Item = &'a Variant>) -> syn::Result<Self> {
        let mut fallback = None;
        let mut collected = Vec::new();

        for variant in variants {
            let attr = VariantAttr::from_attributes(&variant.attrs)?;

            match variant.fields {
                Fields::Unit => {
                    let name = attr
                        .rename
                        .unwrap_or_else(|| variant.ident.unraw().to_string().to_kebab_case());

                    if collected.iter().any(|(existing, _)| *existing == name) {
                        return Err(syn::Error::new(
                            variant.span(),
                            lazy_format::lazy_format!("duplicate variant name {name:?}"),
                        ));
                    }

                    collected.push((name, &variant.ident));
                }
                Fields::Unnamed(FieldsUnnamed {
                    unnamed: ref fields,
                    ..
                })
                | Fields::Named(FieldsNamed {
                    named: ref fields, ..
                }) => match fields.iter().exactly_one() {
                    Ok(field) => match fallback {
                        Some(_) => {
                            return Err(syn::Error::new(
                                variant.span(),
                                "more than one fallback variant",
                            ));
                        }
                        None => {
                            fallback = Some(Fallback {
                                variant: &variant.ident,
                                field: field.ident.as_ref(),
                            })
                        }
                    },
                    Err(_) => {
                        return Err(syn::Error::new(
                            variant.span(),
                            "a fallback variant must have exactly one field",
                        ));
                    }
                },
            }
        }

        Ok(AnalyzedEnum {
            variants: collected,
            fallback,
        })
    }
}

fn derive_value_enum(
    ident: &Ident,
    variants: &Punctuated<Variant, Token![,]>,
) -> syn::Result<TokenStream2> {
    let analyzed = AnalyzedEnum::from_variants(variants)?;

    let unit_arms = analyzed.variants.iter().map(|(name, variant)| {
        quote! {
            #name => ::core::result::Result::Ok(Self::#variant),
        }
    });

    let fallback_arm = match analyzed.fallback {
        Some(fallback) => {
            let variant = fallback.variant;

            let body = match fallback.field {
                Some(field) => quote! { { #field: value } },
                None => quote! { ( value ) },
            };

            quote! {
                _ => ::argbind::Value::from_text(text).map(|value| Self::#variant #body),
            }
        }
        None => {
            let message = format!(
                "expected one of: {}",
                analyzed.variants.iter().map(|(name, _)| name).join(", ")
            );

            quote! {
                _ => ::core::result::Result::Err(::argbind::ConvertError::new(text, #message)),
            }
        }
    };

    Ok(quote! {
        impl ::argbind::Value for #ident {
            fn from_text(text: &str) -> ::core::result::Result<Self, ::argbind::ConvertError> {
                match text {
                    #(#unit_arms)*
                    #fallback_arm
                }
            }
        }

        ::argbind::leaf!(#ident);
    })
}

fn derive_value_newtype(ident: &Ident, field: Option<&Ident>, ty: &Type) -> TokenStream2 {
    let struct_body = match field {
        Some(field) => quote! { { #field: value } },
        None => quote! { ( value ) },
    };

    quote! {
        impl ::argbind::Value for #ident {
            const KIND: ::argbind::ValueKind = <#ty as ::argbind::Value>::KIND;

            fn from_text(text: &str) -> ::core::result::Result<Self, ::argbind::ConvertError> {
                <#ty as ::argbind::Value>::from_text(text).map(|value| Self #struct_body)
            }
        }

        ::argbind::leaf!(#ident);
    }
}

pub fn derive_value_result(item: TokenStream2) -> syn::Result<TokenStream2> {
    let input: DeriveInput = syn::parse2(item)?;
    reject_generics(&input.generics, "Value")?;

    match input.data {
        Data::Struct(ref data) => {
            let field = data.fields.iter().exactly_one().map_err(|_| {
                syn::Error::new(
                    input.span(),
                    "can only derive `Value` on structs with exactly one field",
                )
            })?;

            Ok(derive_value_newtype(
                &input.ident,
                field.ident.as_ref(),
                &field.ty,
            ))
        }
        Data::Enum(ref data) => derive_value_enum(&input.ident, &data.variants),
        Data::Union(_) => Err(syn::Error::new(
            input.span(),
            "can't derive `Value` on a union",
        )),
    }
}
