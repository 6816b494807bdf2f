mod common;
mod generics;
mod record;
mod value;

use proc_macro::TokenStream;

/**
Derive `argbind::Record` for a struct of arguments. The struct must also
implement `Default`.

Fields are configured with `#[arg(...)]`:

- `tag = "..."`: the binding directives (`--long`, `-s`, `required`,
  `positional`, `separate`, `env`, `subcommand`, `help:...`), or `"-"` to
  ignore the field.
- `default = "..."`: text converted into the field when no other source
  supplies a value.
- `placeholder = "..."`: the name of the field's value in help messages.
- `help = "..."`: help text, in place of the doc comment.
- `embed`: treat the fields of a nested struct as though they were declared
  here.

The struct itself accepts `#[arg(dispatch = path::to::function)]` to take
over resolution when it's entered as a subcommand.
*/
#[proc_macro_derive(Record, attributes(arg))]
pub fn derive_record(item: TokenStream) -> TokenStream {
    match record::derive_record_result(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/**
Derive `argbind::Value`, making the type usable as a scalar field.

On an enum, each unit variant is matched by its kebab-case name (or
`#[arg(rename = "...")]`). At most one variant may have a single field; it
receives any other text, converted with that field's own `Value`. On a
newtype, conversion is delegated to the wrapped type.
*/
#[proc_macro_derive(Value, attributes(arg))]
pub fn derive_value(item: TokenStream) -> TokenStream {
    match value::derive_value_result(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
