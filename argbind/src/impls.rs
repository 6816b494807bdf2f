/*!
Implementations of [`Value`] and [`Reflect`] for primitive and standard
library types.
 */

use core::any::type_name;
use core::hash::Hash;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::errors::ConvertError;
use crate::reflect::{Record, Reflect, Shape, Slot, Value, ValueKind};

/// Make a [`Value`] type usable as a record field. This implements [`Slot`]
/// and [`Reflect`] in terms of [`Value::from_text`].
#[macro_export]
macro_rules! leaf {
    ($($type:ty),* $(,)?) => {$(
        impl $crate::Slot for $type {
            fn assign(&mut self, text: &str) -> ::core::result::Result<(), $crate::ConvertError> {
                *self = <$type as $crate::Value>::from_text(text)?;
                ::core::result::Result::Ok(())
            }
        }

        impl $crate::Reflect for $type {
            fn shape() -> $crate::Shape {
                $crate::Shape::Leaf($crate::Leaf::of::<$type>())
            }

            fn parse(text: &str) -> ::core::result::Result<Self, $crate::ConvertError> {
                <$type as $crate::Value>::from_text(text)
            }
        }
    )*};
}

/// Make types that implement [`FromStr`][core::str::FromStr] into textual
/// leaf values.
#[macro_export]
macro_rules! from_str_value {
    ($($type:ty),* $(,)?) => {$(
        impl $crate::Value for $type {
            fn from_text(text: &str) -> ::core::result::Result<Self, $crate::ConvertError> {
                <$type as ::core::str::FromStr>::from_str(text)
                    .map_err(|err| $crate::ConvertError::new(text, err))
            }
        }

        $crate::leaf!($type);
    )*};
}

macro_rules! numeric {
    ($($type:ty)*) => {$(
        impl Value for $type {
            const KIND: ValueKind = ValueKind::Numeric;

            fn from_text(text: &str) -> Result<Self, ConvertError> {
                text.parse().map_err(|err| ConvertError::new(text, err))
            }
        }

        leaf!($type);
    )*};
}

numeric! {
    u8 u16 u32 u64 u128 usize
    i8 i16 i32 i64 i128 isize
    f32 f64
}

from_str_value! {
    char,
    String,
    PathBuf,
    core::net::Ipv4Addr,
    core::net::Ipv6Addr,
    core::net::IpAddr,
    core::net::SocketAddrV4,
    core::net::SocketAddrV6,
    core::net::SocketAddr,
}

impl Value for bool {
    const KIND: ValueKind = ValueKind::Flag;

    fn from_text(text: &str) -> Result<Self, ConvertError> {
        match text {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(ConvertError::new(text, "expected a boolean")),
        }
    }
}

leaf!(bool);

impl Value for OsString {
    fn from_text(text: &str) -> Result<Self, ConvertError> {
        Ok(OsString::from(text))
    }
}

leaf!(OsString);

impl<T: Reflect> Slot for Option<T> {
    fn assign(&mut self, text: &str) -> Result<(), ConvertError> {
        *self = Some(T::parse(text)?);
        Ok(())
    }

    fn clear(&mut self) {
        *self = None;
    }

    fn record(&mut self) -> Option<&mut dyn Record> {
        self.as_mut()?.record()
    }

    fn allocate(&mut self) -> Option<&mut dyn Record> {
        if self.is_none() {
            *self = Some(T::instantiate()?);
        }

        self.as_mut()?.allocate()
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> Shape {
        match T::shape() {
            Shape::Leaf(leaf) => Shape::Optional(leaf),
            Shape::Record(info) => Shape::OptionalRecord(info),
            _ => Shape::Unsupported(type_name::<Self>()),
        }
    }

    fn parse(text: &str) -> Result<Self, ConvertError> {
        T::parse(text).map(Some)
    }

    fn instantiate() -> Option<Self> {
        Some(None)
    }
}

impl<T: Reflect> Slot for Box<T> {
    fn assign(&mut self, text: &str) -> Result<(), ConvertError> {
        T::assign(self, text)
    }

    fn clear(&mut self) {
        T::clear(self)
    }

    fn append(&mut self, text: &str) -> Result<(), ConvertError> {
        T::append(self, text)
    }

    fn record(&mut self) -> Option<&mut dyn Record> {
        T::record(self)
    }

    fn allocate(&mut self) -> Option<&mut dyn Record> {
        T::allocate(self)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn parse(text: &str) -> Result<Self, ConvertError> {
        T::parse(text).map(Box::new)
    }

    fn instantiate() -> Option<Self> {
        T::instantiate().map(Box::new)
    }
}

fn sequence_shape<T: Reflect, C>() -> Shape {
    match T::shape().scalar() {
        Some(leaf) => Shape::Sequence(leaf),
        None => Shape::Unsupported(type_name::<C>()),
    }
}

macro_rules! sequence {
    ($($type:ident [$($bound:path),*] $push:ident;)*) => {$(
        impl<T: Reflect $(+ $bound)*> Slot for $type<T> {
            fn assign(&mut self, text: &str) -> Result<(), ConvertError> {
                Slot::clear(self);
                Slot::append(self, text)
            }

            fn clear(&mut self) {
                $type::clear(self)
            }

            fn append(&mut self, text: &str) -> Result<(), ConvertError> {
                self.$push(T::parse(text)?);
                Ok(())
            }
        }

        impl<T: Reflect $(+ $bound)*> Reflect for $type<T> {
            fn shape() -> Shape {
                sequence_shape::<T, Self>()
            }

            fn instantiate() -> Option<Self> {
                Some($type::new())
            }
        }
    )*};
}

sequence! {
    Vec [] push;
    VecDeque [] push_back;
    BTreeSet [Ord] insert;
    HashSet [Eq, Hash] insert;
}

fn map_shape<K: Reflect, V: Reflect, C>() -> Shape {
    match (K::shape().scalar(), V::shape().scalar()) {
        (Some(key), Some(value)) => Shape::Map { key, value },
        _ => Shape::Unsupported(type_name::<C>()),
    }
}

fn split_entry(text: &str) -> Result<(&str, &str), ConvertError> {
    text.split_once('=')
        .ok_or_else(|| ConvertError::new(text, "expected a key=value pair"))
}

macro_rules! map {
    ($($type:ident [$($bound:path),*];)*) => {$(
        impl<K: Reflect $(+ $bound)*, V: Reflect> Slot for $type<K, V> {
            fn assign(&mut self, text: &str) -> Result<(), ConvertError> {
                Slot::clear(self);
                Slot::append(self, text)
            }

            fn clear(&mut self) {
                $type::clear(self)
            }

            fn append(&mut self, text: &str) -> Result<(), ConvertError> {
                let (key, value) = split_entry(text)?;
                self.insert(K::parse(key)?, V::parse(value)?);
                Ok(())
            }
        }

        impl<K: Reflect $(+ $bound)*, V: Reflect> Reflect for $type<K, V> {
            fn shape() -> Shape {
                map_shape::<K, V, Self>()
            }

            fn instantiate() -> Option<Self> {
                Some($type::new())
            }
        }
    )*};
}

map! {
    BTreeMap [Ord];
    HashMap [Eq, Hash];
}
