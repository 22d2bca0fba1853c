use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use url::Url;

use crate::error::{Error, Result};
use crate::record::plist_record;

plist_record! {
    /// Root of a library export: header fields, all tracks and all playlists.
    pub struct Library {
        pub major_version: i64 = "Major Version",
        pub minor_version: i64 = "Minor Version",
        pub date: Option<DateTime<Utc>> = "Date",
        pub application_version: String = "Application Version",
        pub features: i64 = "Features",
        pub show_content_ratings: bool = "Show Content Ratings",
        pub music_folder: String = "Music Folder",
        pub library_persistent_id: String = "Library Persistent ID",
    }
    children {
        /// Tracks keyed by the document's dictionary key, i.e. the track ID as text.
        pub tracks: HashMap<String, Track>,
        /// Playlists in document order.
        pub playlists: Vec<Playlist>,
    }
}

impl Library {
    pub const TRACKS_KEY: &'static str = "Tracks";
    pub const PLAYLISTS_KEY: &'static str = "Playlists";

    /// Looks up a track by its identifier.
    pub fn track(&self, id: &str) -> Result<&Track> {
        self.tracks
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_owned()))
    }

    /// Snapshot of all tracks, in no particular order.
    #[must_use]
    pub fn all_tracks(&self) -> Vec<Track> {
        self.tracks.values().cloned().collect()
    }

    /// Finds a playlist by its persistent ID.
    #[must_use]
    pub fn playlist(&self, persistent_id: &str) -> Option<&Playlist> {
        self.playlists
            .iter()
            .find(|playlist| playlist.playlist_persistent_id == persistent_id)
    }

    /// Resolves the items of a playlist in playlist order.
    ///
    /// Items referring to tracks missing from this library are skipped.
    pub fn playlist_tracks<'a>(
        &'a self,
        playlist: &'a Playlist,
    ) -> impl Iterator<Item = &'a Track> + 'a {
        playlist
            .track_ids()
            .filter_map(move |track_id| self.tracks.get(&track_id.to_string()))
    }
}

plist_record! {
    /// A media file, either music or video.
    ///
    /// Identified within a [`Library`] by [`Track::track_id`].
    pub struct Track {
        pub track_id: i64 = "Track ID",
        pub name: String = "Name",
        pub artist: String = "Artist",
        pub composer: String = "Composer",
        pub year: i64 = "Year",
        pub genre: String = "Genre",
        pub kind: String = "Kind",
        /// File size in bytes.
        pub size: i64 = "Size",
        pub bpm: i64 = "BPM",

        pub track_number: i64 = "Track Number",
        pub track_count: i64 = "Track Count",
        pub disc_number: i64 = "Disc Number",
        pub disc_count: i64 = "Disc Count",

        pub part_of_gapless_album: bool = "Part Of Gapless Album",
        pub content_rating: String = "Content Rating",

        /// 0-100, in steps of 20 per star.
        pub rating: i64 = "Rating",
        pub rating_computed: bool = "Rating Computed",
        pub disabled: bool = "Disabled",

        pub album: String = "Album",
        pub album_artist: String = "Album Artist",
        pub album_rating: i64 = "Album Rating",
        pub album_rating_computed: bool = "Album Rating Computed",

        pub sort_name: String = "Sort Name",
        pub sort_artist: String = "Sort Artist",
        pub sort_album_artist: String = "Sort Album Artist",
        pub sort_album: String = "Sort Album",
        pub sort_composer: String = "Sort Composer",

        pub clean: bool = "Clean",
        pub explicit: bool = "Explicit",
        pub series: String = "Series",

        /// Duration in milliseconds.
        pub total_time: i64 = "Total Time",
        pub start_time: i64 = "Start Time",
        pub stop_time: i64 = "Stop Time",
        pub date_modified: Option<DateTime<Utc>> = "Date Modified",
        pub date_added: Option<DateTime<Utc>> = "Date Added",
        /// kbit/s
        pub bit_rate: i64 = "Bit Rate",
        /// Hz
        pub sample_rate: i64 = "Sample Rate",
        pub volume_adjustment: i64 = "Volume Adjustment",
        pub normalization: i64 = "Normalization",
        pub comments: String = "Comments",

        pub play_count: i64 = "Play Count",
        /// Seconds since 1904-01-01 in local time.
        pub play_date: i64 = "Play Date",
        pub play_date_utc: Option<DateTime<Utc>> = "Play Date UTC",

        pub protected: bool = "Protected",
        pub purchased: bool = "Purchased",

        pub skip_count: i64 = "Skip Count",
        pub skip_date: Option<DateTime<Utc>> = "Skip Date",

        pub artwork_count: i64 = "Artwork Count",

        pub episode: String = "Episode",
        pub episode_order: i64 = "Episode Order",
        pub tv_show: bool = "TV Show",
        pub season: i64 = "Season",
        pub podcast: bool = "Podcast",
        pub itunes_u: bool = "iTunesU",
        pub unplayed: bool = "Unplayed",

        pub loved: bool = "Loved",
        pub disliked: bool = "Disliked",
        pub album_loved: bool = "Album Loved",
        pub playlist_only: bool = "Playlist Only",
        pub apple_music: bool = "Apple Music",

        pub persistent_id: String = "Persistent ID",
        /// `File`, `URL` or `Remote`.
        pub track_type: String = "Track Type",
        /// `file://` URL for local files.
        pub location: String = "Location",
        pub file_type: i64 = "File Type",
        pub movie: bool = "Movie",
        pub music_video: bool = "Music Video",
        pub hd: bool = "HD",
        pub has_video: bool = "Has Video",
        pub video_height: i64 = "Video Height",
        pub video_width: i64 = "Video Width",

        pub grouping: String = "Grouping",
        pub work: String = "Work",
        pub movement_name: String = "Movement Name",
        pub movement_number: i64 = "Movement Number",
        pub movement_count: i64 = "Movement Count",
        pub compilation: bool = "Compilation",
        pub release_date: Option<DateTime<Utc>> = "Release Date",

        pub file_folder_count: i64 = "File Folder Count",
        pub library_folder_count: i64 = "Library Folder Count",
    }
}

impl Track {
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.total_time).unwrap_or_default())
    }

    /// Streamed or cloud tracks without a local file.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self.track_type.as_str(), "Remote" | "URL" | "Stream")
    }

    /// Local file path decoded from [`Track::location`].
    ///
    /// Returns `None` unless the location is a `file://` URL.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        decode_location(&self.location)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// iTunes writes locations as file://localhost/Users/... or file://localhost/C:/...
// with percent-encoded segments.
fn decode_location(location: &str) -> Option<PathBuf> {
    let url = Url::parse(location).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}

plist_record! {
    pub struct Playlist {
        pub name: String = "Name",
        /// The library playlist containing every track.
        pub master: bool = "Master",
        pub playlist_id: i64 = "Playlist ID",
        pub playlist_persistent_id: String = "Playlist Persistent ID",
        /// Persistent ID of the enclosing folder, empty at top level.
        pub parent_persistent_id: String = "Parent Persistent ID",
        pub visible: bool = "Visible",
        pub all_items: bool = "All Items",
        pub folder: bool = "Folder",
        /// Non-zero for built-in playlists such as Music or Podcasts.
        pub distinguished_kind: i64 = "Distinguished Kind",
        pub music: bool = "Music",
        pub movies: bool = "Movies",
        pub tv_shows: bool = "TV Shows",
        pub podcasts: bool = "Podcasts",
        pub audiobooks: bool = "Audiobooks",
        pub itunes_u: bool = "iTunesU",
        pub purchased_music: bool = "Purchased Music",
        pub smart_info: Vec<u8> = "Smart Info",
        pub smart_criteria: Vec<u8> = "Smart Criteria",
    }
    children {
        pub playlist_items: Vec<PlaylistItem>,
    }
}

impl Playlist {
    pub const ITEMS_KEY: &'static str = "Playlist Items";

    #[must_use]
    pub fn is_smart(&self) -> bool {
        !self.smart_criteria.is_empty()
    }

    /// Persistent ID of the enclosing folder playlist, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        Some(self.parent_persistent_id.as_str()).filter(|id| !id.is_empty())
    }

    pub fn track_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.playlist_items.iter().map(|item| item.track_id)
    }
}

plist_record! {
    /// Reference to a track of the same [`Library`].
    pub struct PlaylistItem {
        pub track_id: i64 = "Track ID",
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{Library, Playlist, PlaylistItem, Track};
    use crate::{Error, Record as _};

    fn track(track_id: i64, name: &str) -> Track {
        Track {
            track_id,
            name: name.to_owned(),
            ..Default::default()
        }
    }

    fn library() -> Library {
        let mut library = Library::default();
        for track in [track(10, "One"), track(20, "Two"), track(30, "Three")] {
            library.tracks.insert(track.track_id.to_string(), track);
        }
        library.playlists.push(Playlist {
            name: "Mix".to_owned(),
            playlist_persistent_id: "AAAA0000BBBB1111".to_owned(),
            playlist_items: [30, 99, 10]
                .into_iter()
                .map(|track_id| PlaylistItem { track_id })
                .collect(),
            ..Default::default()
        });
        library
    }

    #[test]
    fn track_lookup() {
        let library = library();
        assert_eq!(library.track("20").unwrap().name, "Two");
        assert!(matches!(library.track("21"), Err(Error::NotFound(id)) if id == "21"));
    }

    #[test]
    fn all_tracks_is_a_snapshot() {
        let library = library();
        let mut tracks = library.all_tracks();
        assert_eq!(tracks.len(), library.tracks.len());
        tracks.clear();
        assert_eq!(library.tracks.len(), 3);
    }

    #[test]
    fn playlist_tracks_skip_dangling_items() {
        let library = library();
        let playlist = library.playlist("AAAA0000BBBB1111").unwrap();
        let names: Vec<_> = library
            .playlist_tracks(playlist)
            .map(|track| track.name.as_str())
            .collect();
        assert_eq!(names, ["Three", "One"]);
        assert!(library.playlist("missing").is_none());
        assert_eq!(playlist.parent(), None);
    }

    #[test]
    fn file_path_from_location() {
        let mut track = track(1, "Rock");
        track.location = "file://localhost/Users/me/Music/Rock%20%26%20Roll.mp3".to_owned();
        assert_eq!(
            track.file_path(),
            Some(PathBuf::from("/Users/me/Music/Rock & Roll.mp3"))
        );
        track.location = "http://example.com/stream.mp3".to_owned();
        assert_eq!(track.file_path(), None);
        track.location.clear();
        assert_eq!(track.file_path(), None);
    }

    #[cfg(windows)]
    #[test]
    fn file_path_from_windows_location() {
        let mut track = track(1, "Rock");
        track.location = "file://localhost/C:/Users/me/Music/Rock%20%26%20Roll.mp3".to_owned();
        assert_eq!(
            track.file_path(),
            Some(PathBuf::from(r"C:\Users\me\Music\Rock & Roll.mp3"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn file_path_rejects_remote_hosts() {
        let mut track = track(1, "Rock");
        track.location = "file://nas.local/share/Rock.mp3".to_owned();
        assert_eq!(track.file_path(), None);
        track.location = "file:///Users/me/Music/%C3%89t%C3%A9.m4a".to_owned();
        assert_eq!(track.file_path(), Some(PathBuf::from("/Users/me/Music/\u{c9}t\u{e9}.m4a")));
    }

    #[test]
    fn remote_tracks() {
        let mut track = track(1, "Radio");
        assert!(!track.is_remote());
        track.track_type = "URL".to_owned();
        assert!(track.is_remote());
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(track(1, "Intro").to_string(), "Intro");
    }

    #[test]
    fn track_fields_by_identifier_and_key() {
        let mut track = track(5, "Rock &amp; Roll");
        track.track_number = 3;
        track.compilation = true;
        assert_eq!(track.get_string("name"), "Rock & Roll");
        assert_eq!(track.get_int("Track Number"), 3);
        assert_eq!(track.get_int("track_number"), 3);
        assert!(track.get_bool("Compilation"));
        assert_eq!(track.get_date("date_added"), None);
    }

    #[test]
    fn track_fields_by_camel_case_identifier() {
        let mut track = track(5, "Song");
        track.track_number = 3;
        track.album_artist = "Various".to_owned();
        track.itunes_u = true;
        track.play_count = 9;
        assert_eq!(track.get_int("TrackNumber"), 3);
        assert_eq!(track.get_string("AlbumArtist"), "Various");
        assert!(track.get_bool("ITunesU"));
        assert_eq!(track.get_int("PlayCount"), 9);
        assert_eq!(track.get_date("PlayDateUTC"), None);
        assert!(!track.get_bool("TVShow"));
        assert!(track.field("Track_Number").is_none());
    }

    #[test]
    #[should_panic(expected = "is not boolean but integer")]
    fn track_accessor_kind_mismatch() {
        track(1, "x").get_bool("play_count");
    }

    #[test]
    fn document_keys_are_unique() {
        for fields in [Track::FIELDS, Playlist::FIELDS, Library::FIELDS] {
            let mut keys: Vec<_> = fields.iter().map(|spec| spec.key).collect();
            keys.sort_unstable();
            let count = keys.len();
            keys.dedup();
            assert_eq!(keys.len(), count);

            for spec in fields {
                let camel_case: String = spec.name.split('_').collect();
                let matching = fields.iter().filter(|other| other.matches(&camel_case));
                assert_eq!(matching.count(), 1, "{camel_case}");
            }
        }
    }
}
