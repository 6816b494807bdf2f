use syn::{GenericParam, Generics, spanned::Spanned as _};

/// Derived types are described by `'static` runtime type information, so
/// they can't have generic parameters of any kind.
pub fn reject_generics(generics: &Generics, derive: &str) -> syn::Result<()> {
    match generics.params.first() {
        None => Ok(()),
        Some(GenericParam::Const(param)) => Err(syn::Error::new(
            param.span(),
            lazy_format::lazy_format!("const generics aren't supported by `derive({derive})`"),
        )),
        Some(GenericParam::Type(param)) => Err(syn::Error::new(
            param.span(),
            lazy_format::lazy_format!("generic types aren't supported by `derive({derive})`"),
        )),
        Some(GenericParam::Lifetime(param)) => Err(syn::Error::new(
            param.span(),
            lazy_format::lazy_format!("`derive({derive})` types can't borrow; remove the lifetime"),
        )),
    }
}
