//! Name-mapping tables and by-name field access for library records.
//!
//! Every record type ([`Track`](crate::Track), [`Playlist`](crate::Playlist),
//! [`PlaylistItem`](crate::PlaylistItem) and [`Library`](crate::Library)) is
//! declared through [`plist_record!`], which generates the struct, a static
//! table of [`FieldSpec`]s and the matching accessors from one field list.
//! The same table drives decoding and the by-name getters.

use std::{borrow::Cow, fmt};

use chrono::{DateTime, Utc};

/// Value type of a scalar record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
    Date,
    Data,
}

impl FieldKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a record's name-mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field identifier, e.g. `track_number`.
    pub name: &'static str,
    /// Key in the library document, e.g. `Track Number`.
    pub key: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Matches the field identifier, the document key, or the identifier
    /// in CamelCase, e.g. `TrackNumber` or `ITunesU`.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.key == name || self.matches_camel_case(name)
    }

    /// Compares with underscores dropped and ASCII case ignored.
    fn matches_camel_case(&self, name: &str) -> bool {
        !name.contains('_')
            && self
                .name
                .bytes()
                .filter(|&byte| byte != b'_')
                .map(|byte| byte.to_ascii_lowercase())
                .eq(name.bytes().map(|byte| byte.to_ascii_lowercase()))
    }
}

/// Borrowed value of a scalar record field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRef<'a> {
    Text(&'a str),
    Integer(i64),
    Boolean(bool),
    Date(Option<DateTime<Utc>>),
    Data(&'a [u8]),
}

impl FieldRef<'_> {
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Integer(_) => FieldKind::Integer,
            Self::Boolean(_) => FieldKind::Boolean,
            Self::Date(_) => FieldKind::Date,
            Self::Data(_) => FieldKind::Data,
        }
    }
}

/// Writable slot of a scalar record field, filled while decoding.
#[derive(Debug)]
pub(crate) enum FieldSlot<'a> {
    Text(&'a mut String),
    Integer(&'a mut i64),
    Boolean(&'a mut bool),
    Date(&'a mut Option<DateTime<Utc>>),
    Data(&'a mut Vec<u8>),
}

/// Rust types that may back a scalar record field.
pub(crate) trait FieldType {
    const KIND: FieldKind;

    fn as_field_ref(&self) -> FieldRef<'_>;

    fn as_field_slot(&mut self) -> FieldSlot<'_>;
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::Text;

    fn as_field_ref(&self) -> FieldRef<'_> {
        FieldRef::Text(self)
    }

    fn as_field_slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Text(self)
    }
}

impl FieldType for i64 {
    const KIND: FieldKind = FieldKind::Integer;

    fn as_field_ref(&self) -> FieldRef<'_> {
        FieldRef::Integer(*self)
    }

    fn as_field_slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Integer(self)
    }
}

impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Boolean;

    fn as_field_ref(&self) -> FieldRef<'_> {
        FieldRef::Boolean(*self)
    }

    fn as_field_slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Boolean(self)
    }
}

impl FieldType for Option<DateTime<Utc>> {
    const KIND: FieldKind = FieldKind::Date;

    fn as_field_ref(&self) -> FieldRef<'_> {
        FieldRef::Date(*self)
    }

    fn as_field_slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Date(self)
    }
}

impl FieldType for Vec<u8> {
    const KIND: FieldKind = FieldKind::Data;

    fn as_field_ref(&self) -> FieldRef<'_> {
        FieldRef::Data(self)
    }

    fn as_field_slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Data(self)
    }
}

/// A library entity with a static name-mapping table.
///
/// The typed getters treat an unknown field name or a getter that does not
/// match the field's kind as a caller bug and panic. Use [`Record::field`]
/// when the name comes from untrusted input.
pub trait Record {
    /// Type name used in panic messages.
    const NAME: &'static str;

    /// Scalar fields in declaration order.
    const FIELDS: &'static [FieldSpec];

    /// Looks up a scalar field by identifier, document key or CamelCase identifier.
    fn field(&self, name: &str) -> Option<FieldRef<'_>>;

    #[must_use]
    fn field_spec(name: &str) -> Option<&'static FieldSpec>
    where
        Self: Sized,
    {
        Self::FIELDS.iter().find(|spec| spec.matches(name))
    }

    /// Fetches a text field with HTML entities decoded, e.g. `&amp;` as `&`.
    ///
    /// # Panics
    ///
    /// If the field does not exist or is not a text field.
    fn get_string(&self, name: &str) -> Cow<'_, str> {
        match expect_field(self, name) {
            FieldRef::Text(text) => html_escape::decode_html_entities(text),
            other => kind_mismatch(Self::NAME, name, FieldKind::Text, other.kind()),
        }
    }

    /// # Panics
    ///
    /// If the field does not exist or is not an integer field.
    fn get_int(&self, name: &str) -> i64 {
        match expect_field(self, name) {
            FieldRef::Integer(value) => value,
            other => kind_mismatch(Self::NAME, name, FieldKind::Integer, other.kind()),
        }
    }

    /// # Panics
    ///
    /// If the field does not exist or is not a boolean field.
    fn get_bool(&self, name: &str) -> bool {
        match expect_field(self, name) {
            FieldRef::Boolean(value) => value,
            other => kind_mismatch(Self::NAME, name, FieldKind::Boolean, other.kind()),
        }
    }

    /// Returns `None` if the date was absent from the document.
    ///
    /// # Panics
    ///
    /// If the field does not exist or is not a date field.
    fn get_date(&self, name: &str) -> Option<DateTime<Utc>> {
        match expect_field(self, name) {
            FieldRef::Date(value) => value,
            other => kind_mismatch(Self::NAME, name, FieldKind::Date, other.kind()),
        }
    }
}

/// Decoder access to the writable slots, keyed by document key only.
pub(crate) trait RecordSlots {
    fn slot(&mut self, key: &str) -> Option<FieldSlot<'_>>;
}

fn expect_field<'a, R: Record + ?Sized>(record: &'a R, name: &str) -> FieldRef<'a> {
    match record.field(name) {
        Some(field) => field,
        None => panic!("invalid field: {}.{name}", R::NAME),
    }
}

fn kind_mismatch(record: &str, name: &str, expected: FieldKind, actual: FieldKind) -> ! {
    panic!("field {record}.{name} is not {expected} but {actual}")
}

/// Declares a library record: the struct, its [`FieldSpec`] table and the
/// [`Record`] / [`RecordSlots`] impls.
///
/// Scalar fields carry their document key after `=`. Fields inside the
/// optional `children { .. }` block hold nested containers; they are part of
/// the struct but not of the table and are decoded by the parser directly.
macro_rules! plist_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident: $ty:ty = $key:literal,
            )*
        }
        $(
            children {
                $(
                    $(#[$child_meta:meta])*
                    pub $child:ident: $child_ty:ty,
                )*
            }
        )?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
            $($(
                $(#[$child_meta])*
                pub $child: $child_ty,
            )*)?
        }

        impl $crate::record::Record for $name {
            const NAME: &'static str = stringify!($name);

            const FIELDS: &'static [$crate::record::FieldSpec] = &[
                $(
                    $crate::record::FieldSpec {
                        name: stringify!($field),
                        key: $key,
                        kind: <$ty as $crate::record::FieldType>::KIND,
                    },
                )*
            ];

            fn field(&self, name: &str) -> Option<$crate::record::FieldRef<'_>> {
                match name {
                    $(
                        stringify!($field) | $key => {
                            Some($crate::record::FieldType::as_field_ref(&self.$field))
                        }
                    )*
                    _ => {
                        let spec = <Self as $crate::record::Record>::field_spec(name)?;
                        self.field(spec.name)
                    }
                }
            }
        }

        impl $crate::record::RecordSlots for $name {
            fn slot(&mut self, key: &str) -> Option<$crate::record::FieldSlot<'_>> {
                match key {
                    $(
                        $key => Some($crate::record::FieldType::as_field_slot(&mut self.$field)),
                    )*
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use plist_record;
