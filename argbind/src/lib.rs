/*!
A declarative, type-driven command line arguments binder. Describe your
program's arguments as a struct, annotate its fields, and `argbind` fills it
in from the command line, the environment, and declared defaults, in that
order of priority.

```
use argbind::{Config, Parser, Record};

#[derive(Record, Default, Debug)]
/// Fetch something.
struct Args {
    #[arg(tag = "-n,--name,required,env")]
    pub name: String,

    #[arg(default = "3", placeholder = "N")]
    pub count: u32,

    /// Log more.
    pub verbose: bool,
}

let parser = Parser::<Args>::new(Config::new().program("fetch")).unwrap();
let mut args = Args::default();

parser
    .parse(&mut args, &["fetch", "-n", "widget"], &["COUNT=9"])
    .unwrap();

assert_eq!(args.name, "widget");
assert_eq!(args.count, 3);
assert!(!args.verbose);
```

The pieces, from the bottom up:

- [`Value`] converts a single string into a scalar. It's implemented for the
  primitive types, and can be derived for enums and newtypes.
- [`Record`] (always derived) describes a struct of arguments, through the
  types in [`reflect`].
- [`schema`] turns a record type into a [`CommandTree`][schema::CommandTree],
  reporting every problem with the declarations at once.
- [`engine`] runs the resolution phases against a tree, writing into a value
  through the [`path`] resolver.
- [`usage`] renders help and error messages, and [`exit`] connects all of the
  above to a real process.
*/

extern crate self as argbind;

pub mod config;
pub mod engine;
pub mod errors;
pub mod exit;
mod impls;
pub mod path;
pub mod reflect;
pub mod schema;
pub mod tags;
pub mod usage;

pub use argbind_derive::{Record, Value};
pub use argbind_parser::is_flag;

pub use config::Config;
pub use engine::{Continuation, Parser, Resolver};
pub use errors::{ConvertError, Error, SchemaError, SchemaProblem};
pub use exit::{must_parse, report};
pub use reflect::{
    Dispatch, DispatchFn, FieldInfo, Leaf, Record, RecordInfo, Reflect, Shape, Slot, Value,
    ValueKind, probe,
};
