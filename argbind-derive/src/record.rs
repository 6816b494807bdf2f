use itertools::Itertools as _;
use proc_macro2::{Literal, TokenStream as TokenStream2};
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Ident, Token, punctuated::Punctuated, spanned::Spanned as _};

use crate::common::{FieldInfo, RecordAttr, option_str};
use crate::generics::reject_generics;

fn field_descriptor(field: &FieldInfo<'_>) -> TokenStream2 {
    let name = field.ident.as_str();
    let ty = field.ty;
    let exported = field.exported;
    let embed = field.embed;
    let tag = option_str(field.tag.as_deref());
    let help = option_str(field.help.as_deref());
    let default = option_str(field.default.as_deref());
    let placeholder = option_str(field.placeholder.as_deref());

    quote! {
        ::argbind::FieldInfo {
            name: #name,
            exported: #exported,
            embed: #embed,
            tag: #tag,
            help: #help,
            default: #default,
            placeholder: #placeholder,
            shape: || (&::argbind::probe::Probe::<#ty>::new()).shape(),
        }
    }
}

fn derive_record_struct(
    ident: &Ident,
    fields: &Punctuated<Field, Token![,]>,
    attr: RecordAttr,
) -> syn::Result<TokenStream2> {
    let fields: Vec<FieldInfo<'_>> = fields.iter().map(FieldInfo::from_field).try_collect()?;

    let type_name = ident.to_string();
    let description = option_str(attr.description.as_deref());
    let dispatch = match attr.dispatch {
        Some(dispatch) => quote! {
            ::core::option::Option::Some(::argbind::Dispatch(#dispatch))
        },
        None => quote! { ::core::option::Option::None },
    };

    let descriptors = fields.iter().map(field_descriptor);

    let slot_arms = fields.iter().enumerate().map(|(index, field)| {
        let index = Literal::usize_unsuffixed(index);
        let field_ident = &field.ident;
        let ty = field.ty;

        quote! {
            #index => (&::argbind::probe::Probe::<#ty>::new()).slot(&mut self.#field_ident),
        }
    });

    Ok(quote! {
        impl ::argbind::Slot for #ident {
            fn assign(&mut self, text: &str) -> ::core::result::Result<(), ::argbind::ConvertError> {
                ::core::result::Result::Err(::argbind::ConvertError::new(
                    text,
                    "a record can't be converted from text",
                ))
            }

            fn record(&mut self) -> ::core::option::Option<&mut dyn ::argbind::Record> {
                ::core::option::Option::Some(self)
            }

            fn allocate(&mut self) -> ::core::option::Option<&mut dyn ::argbind::Record> {
                ::core::option::Option::Some(self)
            }
        }

        impl ::argbind::Reflect for #ident {
            fn shape() -> ::argbind::Shape {
                ::argbind::Shape::Record(<Self as ::argbind::Record>::info())
            }

            fn instantiate() -> ::core::option::Option<Self> {
                ::core::option::Option::Some(::core::default::Default::default())
            }
        }

        impl ::argbind::Record for #ident {
            fn info() -> ::argbind::RecordInfo {
                ::argbind::RecordInfo {
                    type_name: #type_name,
                    description: #description,
                    fields: || {
                        #[allow(unused_imports)]
                        use ::argbind::probe::{FallbackProbe as _, ReflectProbe as _};

                        ::std::vec![ #(#descriptors,)* ]
                    },
                    dispatch: #dispatch,
                }
            }

            fn record_info(&self) -> ::argbind::RecordInfo {
                <Self as ::argbind::Record>::info()
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn ::argbind::Slot> {
                #[allow(unused_imports)]
                use ::argbind::probe::{FallbackProbe as _, ReflectProbe as _};

                match index {
                    #(#slot_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }
    })
}

pub fn derive_record_result(item: TokenStream2) -> syn::Result<TokenStream2> {
    let input: DeriveInput = syn::parse2(item)?;
    reject_generics(&input.generics, "Record")?;
    let attr = RecordAttr::from_attributes(&input.attrs)?;

    match input.data {
        Data::Struct(ref data) => match data.fields {
            Fields::Named(ref fields) => derive_record_struct(&input.ident, &fields.named, attr),
            Fields::Unit => derive_record_struct(&input.ident, &Punctuated::new(), attr),
            Fields::Unnamed(_) => Err(syn::Error::new(
                input.span(),
                "can't derive `Record` on a tuple struct; records need named fields",
            )),
        },
        Data::Enum(_) => Err(syn::Error::new(
            input.span(),
            "can't derive `Record` on an enum; use an `Option` field for each subcommand",
        )),
        Data::Union(_) => Err(syn::Error::new(
            input.span(),
            "can't derive `Record` on a union",
        )),
    }
}
