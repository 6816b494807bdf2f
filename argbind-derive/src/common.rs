use darling::{FromAttributes as _, util::SpannedValue};
use itertools::Itertools as _;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, quote};
use syn::{Attribute, Expr, Field, Ident, Type, Visibility, ext::IdentExt as _, spanned::Spanned as _};

pub struct IdentString<'a> {
    raw: &'a Ident,
    string: String,
}

impl<'a> IdentString<'a> {
    pub fn new(ident: &'a Ident) -> Self {
        Self {
            string: ident.unraw().to_string(),
            raw: ident,
        }
    }

    pub fn as_str(&self) -> &str {
        self.string.as_str()
    }
}

impl ToTokens for IdentString<'_> {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        self.raw.to_tokens(tokens);
    }
}

#[derive(darling::FromAttributes, Debug)]
#[darling(attributes(arg))]
struct RawFieldAttr {
    tag: Option<SpannedValue<String>>,
    default: Option<String>,
    placeholder: Option<SpannedValue<String>>,
    help: Option<String>,
    embed: Option<()>,
}

#[derive(darling::FromAttributes, Debug)]
#[darling(attributes(arg))]
struct RawRecordAttr {
    dispatch: Option<Expr>,
}

/// Record-level settings.
pub struct RecordAttr {
    pub dispatch: Option<Expr>,
    pub description: Option<String>,
}

impl RecordAttr {
    pub fn from_attributes(attrs: &[Attribute]) -> syn::Result<Self> {
        let parsed = RawRecordAttr::from_attributes(attrs)?;

        Ok(Self {
            dispatch: parsed.dispatch,
            description: compute_docs(attrs)?,
        })
    }
}

pub struct FieldInfo<'a> {
    pub ident: IdentString<'a>,
    pub ty: &'a Type,
    pub exported: bool,
    pub embed: bool,
    pub tag: Option<String>,
    pub help: Option<String>,
    pub default: Option<String>,
    pub placeholder: Option<String>,
}

impl<'a> FieldInfo<'a> {
    pub fn from_field(field: &'a Field) -> syn::Result<Self> {
        let parsed = RawFieldAttr::from_attributes(&field.attrs)?;

        let ident = field.ident.as_ref().map(IdentString::new).ok_or_else(|| {
            syn::Error::new(field.span(), "records must have named fields")
        })?;

        if let Some(ref placeholder) = parsed.placeholder
            && placeholder.is_empty()
        {
            return Err(syn::Error::new(
                placeholder.span(),
                "placeholder must not be empty",
            ));
        }

        let embed = parsed.embed.is_some();

        if embed && let Some(ref tag) = parsed.tag {
            return Err(syn::Error::new(
                tag.span(),
                "embedded fields can't have a tag",
            ));
        }

        Ok(Self {
            ident,
            ty: &field.ty,
            exported: matches!(field.vis, Visibility::Public(_)),
            embed,
            tag: parsed.tag.map(|tag| (*tag).clone()),
            help: match parsed.help {
                Some(help) => Some(help),
                None => compute_docs(&field.attrs)?,
            },
            default: parsed.default,
            placeholder: parsed.placeholder.map(|placeholder| (*placeholder).clone()),
        })
    }
}

/// Collect the doc comments into a single line of help text: each line is
/// trimmed, and blank lines are dropped.
pub fn compute_docs(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let lines: Vec<String> = attrs
        .iter()
        .filter_map(|attr| match attr.meta {
            syn::Meta::NameValue(ref meta) => Some(meta),
            _ => None,
        })
        .filter(|meta| meta.path.is_ident("doc"))
        .map(|meta| match meta.value {
            Expr::Lit(ref lit) => match lit.lit {
                syn::Lit::Str(ref lit) => Ok(lit.value()),
                _ => Err(syn::Error::new(meta.span(), "malformed #[doc] attribute")),
            },
            Expr::Macro(ref expr) => Err(syn::Error::new(
                expr.span(),
                "macro #[doc] attributes aren't supported",
            )),
            _ => Err(syn::Error::new(meta.span(), "malformed #[doc] attribute")),
        })
        .map_ok(|line| line.trim().to_owned())
        .filter_ok(|line| !line.is_empty())
        .try_collect()?;

    Ok((!lines.is_empty()).then(|| lines.join(" ")))
}

/// Render an optional string as an `Option<&'static str>` expression.
pub fn option_str(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    }
}
