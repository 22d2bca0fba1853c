use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use plist::{Dictionary, Value};

use crate::error::{DecodeError, Result};
use crate::models::{Library, Playlist, PlaylistItem, Track};
use crate::record::{FieldKind, FieldSlot, RecordSlots};

const ROOT_PATH: &str = "<root>";

/// Reads a library export (XML or binary property list) from `reader`.
///
/// The stream is consumed entirely before decoding starts.
pub fn read_library<R: Read>(reader: R) -> Result<Library> {
    LibraryParser::new().read(reader)
}

impl Library {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        read_library(reader)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        LibraryParser::new().parse(bytes)
    }
}

/// Decodes library exports into [`Library`] values.
///
/// Either the whole document decodes or an error is returned, there is no
/// partially filled result.
#[derive(Debug, Clone, Default)]
pub struct LibraryParser {
    skip_remote_tracks: bool,
}

impl LibraryParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop tracks without a local file, i.e. of type `Remote`, `URL` or `Stream`.
    ///
    /// Disabled by default.
    #[must_use]
    pub const fn skip_remote_tracks(mut self, skip: bool) -> Self {
        self.skip_remote_tracks = skip;
        self
    }

    pub fn read<R: Read>(&self, mut reader: R) -> Result<Library> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.parse(&bytes)
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Library> {
        let value = Value::from_reader(Cursor::new(bytes)).map_err(DecodeError::from)?;
        let library = self.decode_library(&value)?;
        debug!(
            "Decoded library with {} tracks and {} playlists",
            library.tracks.len(),
            library.playlists.len()
        );
        Ok(library)
    }

    fn decode_library(&self, value: &Value) -> std::result::Result<Library, DecodeError> {
        let root_dict = as_dictionary(value, ROOT_PATH)?;

        let mut library = Library::default();
        for (key, value) in root_dict {
            match key.as_str() {
                Library::TRACKS_KEY => library.tracks = self.decode_tracks(value)?,
                Library::PLAYLISTS_KEY => library.playlists = decode_playlists(value)?,
                _ => assign_field(&mut library, "", key, value)?,
            }
        }
        Ok(library)
    }

    fn decode_tracks(
        &self,
        value: &Value,
    ) -> std::result::Result<HashMap<String, Track>, DecodeError> {
        let tracks_dict = as_dictionary(value, Library::TRACKS_KEY)?;

        let mut tracks = HashMap::with_capacity(tracks_dict.len());
        for (key, track_value) in tracks_dict {
            let path = join_path(Library::TRACKS_KEY, key);
            let track: Track = decode_record(track_value, &path)?;

            // Skip remote/streamed tracks
            if self.skip_remote_tracks && track.is_remote() {
                debug!("Skipping {} track {path}: {track}", track.track_type);
                continue;
            }

            tracks.insert(key.clone(), track);
        }
        Ok(tracks)
    }
}

fn decode_playlists(value: &Value) -> std::result::Result<Vec<Playlist>, DecodeError> {
    as_array(value, Library::PLAYLISTS_KEY)?
        .iter()
        .enumerate()
        .map(|(index, playlist_value)| {
            decode_playlist(
                playlist_value,
                &join_path(Library::PLAYLISTS_KEY, &index.to_string()),
            )
        })
        .collect()
}

fn decode_playlist(value: &Value, path: &str) -> std::result::Result<Playlist, DecodeError> {
    let playlist_dict = as_dictionary(value, path)?;

    let mut playlist = Playlist::default();
    for (key, value) in playlist_dict {
        if key == Playlist::ITEMS_KEY {
            playlist.playlist_items = decode_playlist_items(value, &join_path(path, key))?;
        } else {
            assign_field(&mut playlist, path, key, value)?;
        }
    }
    Ok(playlist)
}

fn decode_playlist_items(
    value: &Value,
    path: &str,
) -> std::result::Result<Vec<PlaylistItem>, DecodeError> {
    as_array(value, path)?
        .iter()
        .enumerate()
        .map(|(index, item)| decode_record(item, &join_path(path, &index.to_string())))
        .collect()
}

fn decode_record<R>(value: &Value, path: &str) -> std::result::Result<R, DecodeError>
where
    R: RecordSlots + Default,
{
    let dict = as_dictionary(value, path)?;
    let mut record = R::default();
    for (key, value) in dict {
        assign_field(&mut record, path, key, value)?;
    }
    Ok(record)
}

fn assign_field<R: RecordSlots>(
    record: &mut R,
    parent: &str,
    key: &str,
    value: &Value,
) -> std::result::Result<(), DecodeError> {
    let Some(slot) = record.slot(key) else {
        trace!("Ignoring unknown key {}", join_path(parent, key));
        return Ok(());
    };
    assign(slot, value).map_err(|expected| DecodeError::TypeMismatch {
        path: join_path(parent, key),
        expected,
        found: value_type(value),
    })
}

/// Stores `value` in `slot`, or returns the expected kind if the types differ.
fn assign(slot: FieldSlot<'_>, value: &Value) -> std::result::Result<(), FieldKind> {
    match slot {
        FieldSlot::Text(field) => {
            let text = value.as_string().ok_or(FieldKind::Text)?;
            text.clone_into(field);
        }
        FieldSlot::Integer(field) => {
            *field = value.as_signed_integer().ok_or(FieldKind::Integer)?;
        }
        FieldSlot::Boolean(field) => {
            *field = value.as_boolean().ok_or(FieldKind::Boolean)?;
        }
        FieldSlot::Date(field) => {
            let date = value.as_date().ok_or(FieldKind::Date)?;
            *field = Some(DateTime::<Utc>::from(SystemTime::from(date)));
        }
        FieldSlot::Data(field) => {
            let data = value.as_data().ok_or(FieldKind::Data)?;
            data.clone_into(field);
        }
    }
    Ok(())
}

fn as_dictionary<'a>(
    value: &'a Value,
    path: &str,
) -> std::result::Result<&'a Dictionary, DecodeError> {
    value.as_dictionary().ok_or_else(|| DecodeError::Shape {
        path: path.to_owned(),
        expected: "dictionary",
        found: value_type(value),
    })
}

fn as_array<'a>(value: &'a Value, path: &str) -> std::result::Result<&'a [Value], DecodeError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| DecodeError::Shape {
            path: path.to_owned(),
            expected: "array",
            found: value_type(value),
        })
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Dictionary(_) => "dictionary",
        Value::Boolean(_) => "boolean",
        Value::Data(_) => "data",
        Value::Date(_) => "date",
        Value::Real(_) => "real",
        Value::Integer(integer) if integer.as_signed().is_none() => "out-of-range integer",
        Value::Integer(_) => "integer",
        Value::String(_) => "string",
        Value::Uid(_) => "uid",
        _ => "unknown",
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}/{key}")
    }
}
