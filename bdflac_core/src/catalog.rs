/*!
# bdflac: Catalog

The catalog is a JSON array of known Blu-rays, keyed by the SHA-1 of their
volume key file, describing which chapters of which titles make up which
tracks of which albums.
*/

use chrono::NaiveDate;
use crate::{
	AHASHER,
	AudioPreference,
	BdFlacError,
	CoverSource,
	TrackId,
};
use serde::Deserialize;
use std::{
	collections::HashSet,
	fmt,
	path::{
		Path,
		PathBuf,
	},
};



#[derive(Debug, Clone, Default)]
/// # Catalog.
///
/// A fully-validated collection of [`DiscEntry`]s.
///
/// ```
/// use bdflac_core::Catalog;
///
/// let catalog = Catalog::from_json(r#"[{
///     "disc_volume_key_sha1": "abc123",
///     "bluray_title": "Beethoven Complete",
///     "makemkv_prefix": "BEETHOVEN",
///     "albums": [{
///         "album_number": 1,
///         "album_title": "Symphony No.5",
///         "album_artist": "Orchestra",
///         "genre": "Classical",
///         "release_date": "2020-01-31",
///         "total_discs": 1,
///         "discs": [{
///             "disc_number": 1,
///             "total_tracks": 1,
///             "tracks": [{
///                 "track_number": 1,
///                 "title_number": "00",
///                 "chapter_numbers": [1],
///                 "track_title": "Allegro con brio"
///             }]
///         }]
///     }]
/// }]"#).unwrap();
///
/// let entry = catalog.find("abc123").unwrap();
/// assert_eq!(entry.title(), "Beethoven Complete");
/// assert_eq!(entry.tracks().count(), 1);
/// ```
pub struct Catalog(Vec<DiscEntry>);

impl Catalog {
	/// # Load From File.
	///
	/// ## Errors
	///
	/// This will return an error if the file cannot be read, parsed, or
	/// validated.
	pub fn load<P: AsRef<Path>>(src: P) -> Result<Self, BdFlacError> {
		let src = src.as_ref();
		let raw = std::fs::read_to_string(src)
			.map_err(|_| BdFlacError::CatalogRead(src.to_string_lossy().into_owned()))?;
		Self::from_json(&raw)
	}

	/// # From JSON.
	///
	/// Parse and validate a catalog from a JSON string.
	///
	/// ## Errors
	///
	/// This will return an error if the JSON is malformed, contains unknown
	/// fields, or violates any of the catalog rules. The first problem found
	/// wins.
	pub fn from_json(raw: &str) -> Result<Self, BdFlacError> {
		let mut entries: Vec<DiscEntry> = serde_json::from_str(raw)
			.map_err(|e| BdFlacError::CatalogParse(e.to_string()))?;

		let mut keys = HashSet::with_hasher(AHASHER);
		for entry in &mut entries {
			entry.validate()?;
			if ! keys.insert(entry.key.clone()) {
				return Err(invalid(entry, "duplicate volume key hash"));
			}
		}

		Ok(Self(entries))
	}

	/// # Find Disc.
	///
	/// Return the entry whose volume key hash matches `key` exactly.
	///
	/// ## Errors
	///
	/// If there is no such disc, an error is returned.
	pub fn find(&self, key: &str) -> Result<&DiscEntry, BdFlacError> {
		self.0.iter()
			.find(|e| e.key == key)
			.ok_or_else(|| BdFlacError::UnknownDisc(key.to_owned()))
	}

	#[must_use]
	/// # Entries.
	pub fn entries(&self) -> &[DiscEntry] { &self.0 }
}



#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
/// # Disc Entry.
///
/// One known Blu-ray.
pub struct DiscEntry {
	#[serde(rename = "disc_volume_key_sha1")]
	key: String,

	#[serde(rename = "bluray_title")]
	title: String,

	#[serde(rename = "makemkv_prefix")]
	prefix: String,

	albums: Vec<Album>,
}

impl fmt::Display for DiscEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "disc {}", self.key)
	}
}

impl DiscEntry {
	#[must_use]
	/// # Volume Key Hash.
	pub fn key(&self) -> &str { &self.key }

	#[must_use]
	/// # Blu-ray Title.
	pub fn title(&self) -> &str { &self.title }

	#[must_use]
	/// # Ripper Prefix.
	///
	/// The ripper names the title files `<prefix>_t<title>.mkv`.
	pub fn prefix(&self) -> &str { &self.prefix }

	#[must_use]
	/// # Albums.
	pub fn albums(&self) -> &[Album] { &self.albums }

	/// # Tracks.
	///
	/// Iterate over every track on the disc, in catalog order, along with
	/// its album and album disc.
	pub fn tracks(&self) -> impl Iterator<Item=TrackRef<'_>> {
		self.albums.iter().flat_map(move |album|
			album.discs.iter().flat_map(move |disc|
				disc.tracks.iter().map(move |track| TrackRef {
					entry: self,
					album,
					disc,
					track,
				})
			)
		)
	}

	#[must_use]
	/// # Title Numbers.
	///
	/// Return each distinct title number referenced by the tracks, in order
	/// of first appearance.
	pub fn title_numbers(&self) -> Vec<&str> {
		let mut seen = HashSet::with_hasher(AHASHER);
		self.tracks()
			.map(|t| t.track.title_number.as_str())
			.filter(|t| seen.insert(*t))
			.collect()
	}

	/// # Validate.
	fn validate(&mut self) -> Result<(), BdFlacError> {
		if self.key.is_empty() { return Err(invalid("disc", "missing volume key hash")); }
		if self.title.is_empty() { return Err(invalid(&*self, "missing Blu-ray title")); }
		if self.prefix.is_empty() { return Err(invalid(&*self, "missing MakeMKV prefix")); }
		if self.albums.is_empty() { return Err(invalid(&*self, "no albums")); }

		let mut numbers = HashSet::with_hasher(AHASHER);
		let mut titles = HashSet::with_hasher(AHASHER);
		for album in &mut self.albums {
			let ctx = format!("disc {}, album #{}", self.key, album.number);
			album.validate(&ctx)?;
			if ! numbers.insert(album.number) {
				return Err(invalid(&ctx, "duplicate album number"));
			}
			if ! titles.insert(album.title.clone()) {
				return Err(invalid(&ctx, "duplicate album title"));
			}
		}

		Ok(())
	}
}



#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
/// # Cover Descriptor Type.
enum CoverKind {
	Plain,
	Zip,
	Mp3,
	ZipMp3,
	Url,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
/// # Album.
pub struct Album {
	#[serde(rename = "album_number")]
	number: u16,

	#[serde(rename = "album_title")]
	title: String,

	#[serde(rename = "album_artist")]
	artist: String,

	genre: String,
	release_date: String,
	total_discs: u16,

	#[serde(default)]
	cover_type: Option<CoverKind>,

	#[serde(default)]
	cover_relative_path: Option<String>,

	#[serde(default)]
	cover_container_relative_path: Option<String>,

	#[serde(default)]
	cover_url: Option<String>,

	discs: Vec<AlbumDisc>,

	#[serde(skip)]
	cover: Option<CoverSource>,
}

impl Album {
	#[must_use]
	/// # Album Number.
	pub const fn number(&self) -> u16 { self.number }

	#[must_use]
	/// # Album Title.
	pub fn title(&self) -> &str { &self.title }

	#[must_use]
	/// # Album Artist.
	pub fn artist(&self) -> &str { &self.artist }

	#[must_use]
	/// # Genre.
	pub fn genre(&self) -> &str { &self.genre }

	#[must_use]
	/// # Release Date (YYYY-MM-DD).
	pub fn release_date(&self) -> &str { &self.release_date }

	#[must_use]
	/// # Total Discs.
	///
	/// This is the number of discs in the album as a whole, which can be
	/// more than the number on this Blu-ray.
	pub const fn total_discs(&self) -> u16 { self.total_discs }

	#[must_use]
	/// # Cover Source.
	pub const fn cover(&self) -> Option<&CoverSource> { self.cover.as_ref() }

	#[must_use]
	/// # Discs.
	pub fn discs(&self) -> &[AlbumDisc] { &self.discs }

	/// # Validate.
	fn validate(&mut self, ctx: &str) -> Result<(), BdFlacError> {
		if self.number == 0 { return Err(invalid(ctx, "album numbers start at 1")); }
		if self.title.is_empty() { return Err(invalid(ctx, "missing album title")); }
		if self.artist.is_empty() { return Err(invalid(ctx, "missing album artist")); }
		if self.genre.is_empty() { return Err(invalid(ctx, "missing genre")); }
		if NaiveDate::parse_from_str(&self.release_date, "%Y-%m-%d").is_err() {
			return Err(invalid(ctx, "invalid release date (must be YYYY-MM-DD)"));
		}
		if self.total_discs == 0 { return Err(invalid(ctx, "total discs must be at least 1")); }
		if self.discs.is_empty() { return Err(invalid(ctx, "no discs")); }
		if usize::from(self.total_discs) < self.discs.len() {
			return Err(invalid(ctx, "more discs than total discs"));
		}

		self.cover = self.cover_source(ctx)?;

		let mut numbers = HashSet::with_hasher(AHASHER);
		for disc in &self.discs {
			let ctx = format!("{ctx}, disc #{}", disc.number);
			if disc.number == 0 || self.total_discs < disc.number {
				return Err(invalid(&ctx, "disc number out of range"));
			}
			if ! numbers.insert(disc.number) {
				return Err(invalid(&ctx, "duplicate disc number"));
			}
			disc.validate(&ctx)?;
		}

		Ok(())
	}

	/// # Build Cover Source.
	///
	/// Check the cover fields make sense for the cover type, and turn them
	/// into something more useful.
	fn cover_source(&self, ctx: &str) -> Result<Option<CoverSource>, BdFlacError> {
		// Empty strings are as good as nothing.
		let rel = self.cover_relative_path.as_deref().filter(|v| ! v.is_empty());
		let container = self.cover_container_relative_path.as_deref().filter(|v| ! v.is_empty());
		let url = self.cover_url.as_deref().filter(|v| ! v.is_empty());

		// URLs are checked whether or not they're used.
		if let Some(url) = url {
			let good = url::Url::parse(url)
				.map_or(false, |u| matches!(u.scheme(), "http" | "https"));
			if ! good {
				return Err(invalid(ctx, "invalid cover URL (must be HTTP or HTTPS)"));
			}
		}

		let Some(kind) = self.cover_type else { return Ok(None); };
		let missing_rel = || invalid(ctx, "missing cover relative path");
		let missing_container = || invalid(ctx, "missing cover container relative path");

		let out = match kind {
			CoverKind::Plain => CoverSource::Plain(native_path(rel.ok_or_else(missing_rel)?)),
			CoverKind::Mp3 => CoverSource::Mp3(native_path(rel.ok_or_else(missing_rel)?)),
			CoverKind::Zip => CoverSource::Zip {
				archive: native_path(container.ok_or_else(missing_container)?),
				entry: rel.ok_or_else(missing_rel)?.to_owned(),
			},
			CoverKind::ZipMp3 => CoverSource::ZipMp3 {
				archive: native_path(container.ok_or_else(missing_container)?),
				entry: rel.ok_or_else(missing_rel)?.to_owned(),
			},
			CoverKind::Url => CoverSource::Url(
				url.ok_or_else(|| invalid(ctx, "missing cover URL"))?.to_owned()
			),
		};

		Ok(Some(out))
	}
}



#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
/// # Album Disc.
///
/// One disc of an album. (A Blu-ray can hold several.)
pub struct AlbumDisc {
	#[serde(rename = "disc_number")]
	number: u16,

	total_tracks: u16,
	tracks: Vec<Track>,
}

impl AlbumDisc {
	#[must_use]
	/// # Disc Number.
	pub const fn number(&self) -> u16 { self.number }

	#[must_use]
	/// # Total Tracks.
	pub const fn total_tracks(&self) -> u16 { self.total_tracks }

	#[must_use]
	/// # Tracks.
	pub fn tracks(&self) -> &[Track] { &self.tracks }

	/// # Validate.
	fn validate(&self, ctx: &str) -> Result<(), BdFlacError> {
		if self.tracks.is_empty() { return Err(invalid(ctx, "no tracks")); }
		if usize::from(self.total_tracks) != self.tracks.len() {
			return Err(invalid(ctx, "number of tracks does not match total tracks"));
		}

		let mut numbers = HashSet::with_hasher(AHASHER);
		for track in &self.tracks {
			let ctx = format!("{ctx}, track #{}", track.number);
			if track.number == 0 || self.total_tracks < track.number {
				return Err(invalid(&ctx, "track number out of range"));
			}
			if ! numbers.insert(track.number) {
				return Err(invalid(&ctx, "duplicate track number"));
			}
			track.validate(&ctx)?;
		}

		Ok(())
	}
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
/// # Channel Layout.
pub enum ChannelType {
	/// # 7.1.
	Surround71,

	/// # 5.1.
	Surround51,

	/// # 2.1.
	Stereo21,

	/// # 2.0.
	Stereo20,
}

impl ChannelType {
	/// # Best to Worst.
	pub const BEST: [Self; 4] = [Self::Surround71, Self::Surround51, Self::Stereo21, Self::Stereo20];

	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Surround71 => "surround71",
			Self::Surround51 => "surround51",
			Self::Stereo21 => "stereo21",
			Self::Stereo20 => "stereo20",
		}
	}
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
/// # Audio Stream.
///
/// A title can carry several audio streams; this maps a channel layout to
/// the stream index holding it.
pub struct AudioStream {
	/// # Channel Layout.
	pub channel_type: ChannelType,

	/// # Stream Index.
	pub channel_number: u32,
}



#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
/// # Track.
pub struct Track {
	#[serde(rename = "track_number")]
	number: u16,

	title_number: String,

	#[serde(rename = "chapter_numbers")]
	chapters: Vec<u32>,

	#[serde(default)]
	audio_streams: Vec<AudioStream>,

	#[serde(default, rename = "trim_end_s")]
	trim_end: f64,

	#[serde(rename = "track_title")]
	title: String,

	#[serde(default)]
	artists: Vec<String>,
}

impl Track {
	#[must_use]
	/// # Track Number.
	pub const fn number(&self) -> u16 { self.number }

	#[must_use]
	/// # Title Number.
	///
	/// This identifies the title file the track's audio lives in.
	pub fn title_number(&self) -> &str { &self.title_number }

	#[must_use]
	/// # Chapter Numbers.
	///
	/// These are kept in the order given, which need not be ascending.
	pub fn chapters(&self) -> &[u32] { &self.chapters }

	#[must_use]
	/// # Audio Streams.
	pub fn audio_streams(&self) -> &[AudioStream] { &self.audio_streams }

	#[must_use]
	/// # Trim From End (Seconds).
	pub const fn trim_end(&self) -> f64 { self.trim_end }

	#[must_use]
	/// # Track Title.
	pub fn title(&self) -> &str { &self.title }

	#[must_use]
	/// # Artists.
	pub fn artists(&self) -> &[String] { &self.artists }

	#[must_use]
	/// # Audio Stream For Preference.
	///
	/// Return the stream index matching the preference, if any. `Best` takes
	/// the richest layout available.
	///
	/// When this returns `None`, the transcoder is left to pick for itself.
	pub fn audio_stream(&self, pref: Option<AudioPreference>) -> Option<u32> {
		let find = |kind: ChannelType| self.audio_streams.iter()
			.find(|s| s.channel_type == kind)
			.map(|s| s.channel_number);

		match pref?.channel_type() {
			Some(kind) => find(kind),
			None => ChannelType::BEST.into_iter().find_map(find),
		}
	}

	/// # Validate.
	fn validate(&self, ctx: &str) -> Result<(), BdFlacError> {
		if self.title_number.is_empty() { return Err(invalid(ctx, "missing title number")); }
		if self.chapters.is_empty() { return Err(invalid(ctx, "missing chapters")); }
		if ! self.trim_end.is_finite() || self.trim_end < 0.0 {
			return Err(invalid(ctx, "invalid trim (must be zero or more seconds)"));
		}
		if self.title.is_empty() { return Err(invalid(ctx, "missing track title")); }
		if self.artists.iter().any(String::is_empty) {
			return Err(invalid(ctx, "empty artist"));
		}
		Ok(())
	}
}



#[derive(Debug, Clone, Copy)]
/// # Track Reference.
///
/// A track along with everything it belongs to.
pub struct TrackRef<'a> {
	/// # Blu-ray.
	pub entry: &'a DiscEntry,

	/// # Album.
	pub album: &'a Album,

	/// # Album Disc.
	pub disc: &'a AlbumDisc,

	/// # Track.
	pub track: &'a Track,
}

impl TrackRef<'_> {
	#[must_use]
	/// # Identifier.
	pub const fn id(&self) -> TrackId {
		TrackId {
			album: self.album.number,
			disc: self.disc.number,
			track: self.track.number,
		}
	}
}



/// # Validation Error.
fn invalid<C: fmt::Display + ?Sized>(ctx: &C, what: &str) -> BdFlacError {
	BdFlacError::Catalog(format!("{ctx}: {what}"))
}

/// # Native Path.
///
/// Relative paths in the catalog use `/`; swap in whatever the platform
/// prefers.
fn native_path(src: &str) -> PathBuf {
	src.split('/').filter(|v| ! v.is_empty()).collect()
}
