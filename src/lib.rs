//! Typed access to iTunes / Music library exports.
//!
//! The export is a property list with a `Tracks` dictionary and a
//! `Playlists` array. [`read_library`] decodes it into a [`Library`];
//! individual fields can be read by name through the [`Record`] trait.
//!
//! ```no_run
//! use tagdeck_itl::{Record as _, parse_library};
//!
//! let library = parse_library("iTunes Music Library.xml")?;
//! for track in library.all_tracks() {
//!     println!("{} - {}", track.get_string("Artist"), track.get_string("Name"));
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod error;
pub mod library_parser;
pub mod models;
pub mod record;
pub mod system_library;

pub use error::{DecodeError, Error, Result};
pub use library_parser::{LibraryParser, read_library};
pub use models::{Library, Playlist, PlaylistItem, Track};
pub use record::{FieldKind, FieldRef, FieldSpec, Record};
pub use system_library::{
    default_library_paths, find_default_library, parse_library, parse_library_with,
};
