/*!
The runtime type registry that the schema builder walks.

Every type that can appear as a field of an argument record implements
[`Reflect`], which describes the type's [`Shape`] and, through its [`Slot`]
supertrait, lets the resolution engine write into a value of that type without
knowing what it is. Leaf types additionally implement [`Value`], the scalar
converter. Records (structs with `#[derive(Record)]`) implement [`Record`],
which exposes their fields by index.
*/

use core::any::{Any, type_name};
use core::fmt;

use crate::engine::Continuation;
use crate::errors::{ConvertError, Error};

/// How a leaf value is written on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A boolean switch; the option takes no value.
    Flag,

    /// A number. Values starting with `-` are still accepted if they parse,
    /// so that `--offset -5` works.
    Numeric,

    /// Anything else.
    Text,
}

/**
A scalar value that can be converted from a single string.

This is the extension point for custom types. Implement it (or use
`#[derive(Value)]`, or [`from_str_value!`][crate::from_str_value] for types
that implement [`FromStr`][core::str::FromStr]), then call
[`leaf!`][crate::leaf] to make the type usable as a field.
*/
pub trait Value: Sized {
    const KIND: ValueKind = ValueKind::Text;

    fn from_text(text: &str) -> Result<Self, ConvertError>;
}

fn check_text<T: Value>(text: &str) -> Result<(), ConvertError> {
    T::from_text(text).map(drop)
}

/// Type-erased description of a [`Value`] type.
#[derive(Clone, Copy)]
pub struct Leaf {
    pub type_name: &'static str,
    pub kind: ValueKind,
    check: fn(&str) -> Result<(), ConvertError>,
}

impl Leaf {
    #[must_use]
    pub fn of<T: Value>() -> Self {
        Self {
            type_name: type_name::<T>(),
            kind: T::KIND,
            check: check_text::<T>,
        }
    }

    /// Try to convert `text`, discarding the result.
    pub fn check(&self, text: &str) -> Result<(), ConvertError> {
        (self.check)(text)
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Signature of a custom subcommand resolution hook.
pub type DispatchFn = fn(&mut Continuation<'_, '_, '_>) -> Result<(), Error>;

/// A subcommand's custom resolution hook, set with `#[arg(dispatch = f)]`.
#[derive(Clone, Copy)]
pub struct Dispatch(pub DispatchFn);

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatch(..)")
    }
}

/// Static description of a record type.
#[derive(Clone, Copy)]
pub struct RecordInfo {
    pub type_name: &'static str,

    /// From the record's doc comment.
    pub description: Option<&'static str>,

    /// Every declared field, in declaration order. The position of a field
    /// in this list is the index passed to [`Record::field_mut`].
    pub fields: fn() -> Vec<FieldInfo>,

    pub dispatch: Option<Dispatch>,
}

impl fmt::Debug for RecordInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordInfo")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Static description of one field of a record.
#[derive(Clone, Copy)]
pub struct FieldInfo {
    pub name: &'static str,

    /// Only `pub` fields take part in parsing, unless they're embedded.
    pub exported: bool,
    pub embed: bool,

    /// The raw `#[arg(tag = "...")]` directive string.
    pub tag: Option<&'static str>,

    /// From the field's doc comment.
    pub help: Option<&'static str>,
    pub default: Option<&'static str>,
    pub placeholder: Option<&'static str>,

    pub shape: fn() -> Shape,
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("exported", &self.exported)
            .field("embed", &self.embed)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// The structural category of a field type.
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    /// A plain scalar.
    Leaf(Leaf),

    /// `Option<T>` of a scalar.
    Optional(Leaf),

    /// A collection of scalars (`Vec`, `VecDeque`, sets).
    Sequence(Leaf),

    /// A map of scalars, written `key=value`.
    Map { key: Leaf, value: Leaf },

    /// A nested record stored by value. Can only be embedded.
    Record(RecordInfo),

    /// An optional nested record. This is how subcommands are stored.
    OptionalRecord(RecordInfo),

    /// A type that can't be bound from the command line. Carries the type
    /// name for error messages.
    Unsupported(&'static str),
}

impl Shape {
    /// The scalar that a single token converts into, if any.
    #[must_use]
    pub fn element(&self) -> Option<Leaf> {
        match *self {
            Shape::Leaf(leaf) | Shape::Optional(leaf) | Shape::Sequence(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// A scalar or optional scalar, for use as a collection element.
    pub(crate) fn scalar(&self) -> Option<Leaf> {
        match *self {
            Shape::Leaf(leaf) | Shape::Optional(leaf) => Some(leaf),
            _ => None,
        }
    }
}

/**
A settable storage location. This is the object-safe half of [`Reflect`];
the engine only ever sees `&mut dyn Slot`.
*/
pub trait Slot {
    /// Replace the value with one converted from `text`.
    fn assign(&mut self, text: &str) -> Result<(), ConvertError>;

    /// Empty a collection. Does nothing for scalars.
    fn clear(&mut self) {}

    /// Add one converted element to a collection. For scalars this is the
    /// same as [`assign`][Slot::assign].
    fn append(&mut self, text: &str) -> Result<(), ConvertError> {
        self.assign(text)
    }

    /// The nested record stored here, if this is a record that exists.
    fn record(&mut self) -> Option<&mut dyn Record> {
        None
    }

    /// The nested record stored here, creating it first if it's an absent
    /// optional record.
    fn allocate(&mut self) -> Option<&mut dyn Record> {
        None
    }
}

/// A type that can appear as a field of a [`Record`].
pub trait Reflect: Slot {
    fn shape() -> Shape
    where
        Self: Sized;

    /// Convert a single token into a whole value of this type.
    fn parse(text: &str) -> Result<Self, ConvertError>
    where
        Self: Sized,
    {
        Err(ConvertError::new(
            text,
            lazy_format::lazy_format!("{} can't be converted from text", type_name::<Self>()),
        ))
    }

    /// Create a fresh value, if this type can be created without input.
    fn instantiate() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

/// A struct of arguments. Implemented with `#[derive(Record)]`.
pub trait Record: Reflect + Any {
    fn info() -> RecordInfo
    where
        Self: Sized;

    /// Same as [`Record::info`], through a trait object.
    fn record_info(&self) -> RecordInfo;

    /// The storage of the field at `index` in [`RecordInfo::fields`].
    /// Returns `None` for fields whose type isn't [`Reflect`].
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Slot>;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/**
Support for `#[derive(Record)]`. The derive describes every field, including
fields whose types don't implement [`Reflect`]; those are reported as
[`Shape::Unsupported`] so that the mistake becomes a schema error when the
parser is built, rather than a compile error.

```ignore
use argbind::probe::{FallbackProbe as _, ReflectProbe as _};
let shape = (&Probe::<FieldType>::new()).shape();
```
*/
#[doc(hidden)]
pub mod probe {
    use core::any::type_name;
    use core::marker::PhantomData;

    use super::{Reflect, Shape, Slot};

    pub struct Probe<T>(PhantomData<fn() -> T>);

    impl<T> Probe<T> {
        #[inline]
        #[must_use]
        pub const fn new() -> Self {
            Self(PhantomData)
        }
    }

    impl<T> Default for Probe<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    pub trait ReflectProbe<T> {
        fn shape(&self) -> Shape;
        fn slot<'a>(&self, field: &'a mut T) -> Option<&'a mut dyn Slot>;
    }

    impl<T: Reflect> ReflectProbe<T> for Probe<T> {
        #[inline]
        fn shape(&self) -> Shape {
            T::shape()
        }

        #[inline]
        fn slot<'a>(&self, field: &'a mut T) -> Option<&'a mut dyn Slot> {
            Some(field)
        }
    }

    pub trait FallbackProbe<T> {
        fn shape(&self) -> Shape;
        fn slot<'a>(&self, field: &'a mut T) -> Option<&'a mut dyn Slot>;
    }

    impl<T> FallbackProbe<T> for &Probe<T> {
        #[inline]
        fn shape(&self) -> Shape {
            Shape::Unsupported(type_name::<T>())
        }

        #[inline]
        fn slot<'a>(&self, _field: &'a mut T) -> Option<&'a mut dyn Slot> {
            None
        }
    }
}
