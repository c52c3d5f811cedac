/*!
# bdflac: Cover Art
*/

use crate::BdFlacError;
use id3::TagLike;
use std::{
	fs::File,
	io::{
		Cursor,
		Read,
	},
	path::{
		Path,
		PathBuf,
	},
	sync::OnceLock,
	time::Duration,
};
use ureq::{
	Agent,
	AgentBuilder,
};
use zip::ZipArchive;



/// # Connection Agent.
static AGENT: OnceLock<Agent> = OnceLock::new();



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Cover Source.
///
/// Where an album's cover art lives. Paths are relative to the disc root (or
/// whatever base the user provides).
pub enum CoverSource {
	/// # Image File.
	Plain(PathBuf),

	/// # Image Inside a Zip.
	Zip {
		/// # Archive Path.
		archive: PathBuf,

		/// # Entry Name.
		entry: String,
	},

	/// # Picture Embedded in an MP3.
	Mp3(PathBuf),

	/// # Picture Embedded in an MP3 Inside a Zip.
	ZipMp3 {
		/// # Archive Path.
		archive: PathBuf,

		/// # Entry Name.
		entry: String,
	},

	/// # Remote Image.
	Url(String),
}

impl CoverSource {
	#[must_use]
	/// # Is Remote?
	pub const fn is_remote(&self) -> bool { matches!(self, Self::Url(_)) }
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Image Kind.
pub enum ImageKind {
	/// # PNG.
	Png,

	/// # JPEG.
	Jpg,

	/// # GIF.
	Gif,

	/// # Bitmap.
	Bmp,
}

impl ImageKind {
	#[must_use]
	/// # Sniff.
	///
	/// Figure out the format from the content itself. Extensions lie.
	pub fn sniff(data: &[u8]) -> Option<Self> {
		match infer::get(data)?.extension() {
			"png" => Some(Self::Png),
			"jpg" => Some(Self::Jpg),
			"gif" => Some(Self::Gif),
			"bmp" => Some(Self::Bmp),
			_ => None,
		}
	}

	#[must_use]
	/// # File Extension.
	pub const fn extension(self) -> &'static str {
		match self {
			Self::Png => "png",
			Self::Jpg => "jpg",
			Self::Gif => "gif",
			Self::Bmp => "bmp",
		}
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Cover Image.
///
/// Image data of a known format.
pub struct CoverImage {
	kind: ImageKind,
	data: Vec<u8>,
}

impl CoverImage {
	/// # From Bytes.
	///
	/// ## Errors
	///
	/// This will return an error if the data is not a supported image.
	pub fn from_bytes(data: Vec<u8>) -> Result<Self, BdFlacError> {
		let kind = ImageKind::sniff(&data).ok_or(BdFlacError::CoverFormat)?;
		Ok(Self { kind, data })
	}

	/// # From File.
	///
	/// ## Errors
	///
	/// This will return an error if the file cannot be read or is not a
	/// supported image.
	pub fn from_file(src: &Path) -> Result<Self, BdFlacError> {
		Self::from_bytes(read_file(src)?)
	}

	#[must_use]
	/// # Kind.
	pub const fn kind(&self) -> ImageKind { self.kind }

	#[must_use]
	/// # Data.
	pub fn data(&self) -> &[u8] { &self.data }

	/// # Save.
	///
	/// Write the image to `<dir>/cover.<ext>`, creating the directory if
	/// needed, and return the path.
	///
	/// ## Errors
	///
	/// This will return an error if the file cannot be written.
	pub fn save(&self, dir: &Path) -> Result<PathBuf, BdFlacError> {
		let dst = dir.join(format!("cover.{}", self.kind.extension()));
		std::fs::create_dir_all(dir)
			.and_then(|()| std::fs::write(&dst, &self.data))
			.map_err(|_| BdFlacError::Write(dst.to_string_lossy().into_owned()))?;
		Ok(dst)
	}
}



/// # Resolve Cover.
///
/// Fetch the cover art described by `src`. Local sources are resolved
/// relative to `base`.
///
/// ## Errors
///
/// This will return an error if a local source has no base, the source
/// cannot be read, or it does not yield a supported image.
pub fn resolve_cover(src: &CoverSource, base: Option<&Path>) -> Result<CoverImage, BdFlacError> {
	let local = |p: &Path| base.map(|b| b.join(p)).ok_or(BdFlacError::CoverBase);

	let data = match src {
		CoverSource::Url(url) => download(url)?,
		CoverSource::Plain(p) => read_file(&local(p.as_path())?)?,
		CoverSource::Mp3(p) => {
			let p = local(p.as_path())?;
			mp3_picture(&read_file(&p)?, &p.to_string_lossy())?
		},
		CoverSource::Zip { archive, entry } => zip_entry(&local(archive.as_path())?, entry)?,
		CoverSource::ZipMp3 { archive, entry } => {
			let mp3 = zip_entry(&local(archive.as_path())?, entry)?;
			mp3_picture(&mp3, entry)?
		},
	};

	CoverImage::from_bytes(data)
}



/// # Agent.
fn agent() -> &'static Agent {
	AGENT.get_or_init(||
		AgentBuilder::new()
			.timeout(Duration::from_secs(15))
			.user_agent(concat!("bdflac/", env!("CARGO_PKG_VERSION")))
			.max_idle_connections(0)
			.build()
	)
}

/// # Download.
fn download(url: &str) -> Result<Vec<u8>, BdFlacError> {
	let err = || BdFlacError::CoverHttp(url.to_owned());

	let res = agent().get(url).call().map_err(|_| err())?;
	if res.status() != 200 { return Err(err()); }

	let mut out = Vec::new();
	res.into_reader().read_to_end(&mut out).map_err(|_| err())?;
	if out.is_empty() { Err(err()) }
	else { Ok(out) }
}

/// # Read File.
fn read_file(src: &Path) -> Result<Vec<u8>, BdFlacError> {
	std::fs::read(src)
		.map_err(|_| BdFlacError::CoverRead(src.to_string_lossy().into_owned()))
}

/// # MP3 Picture.
///
/// Pull the embedded picture out of an MP3, preferring the front cover if
/// there are several.
fn mp3_picture(data: &[u8], label: &str) -> Result<Vec<u8>, BdFlacError> {
	let tag = id3::Tag::read_from2(Cursor::new(data))
		.map_err(|_| BdFlacError::CoverMp3(label.to_owned()))?;

	let out = tag.pictures()
		.find(|p| p.picture_type == id3::frame::PictureType::CoverFront)
		.or_else(|| tag.pictures().next())
		.map(|p| p.data.clone());
	out.ok_or_else(|| BdFlacError::CoverMp3(label.to_owned()))
}

/// # Zip Entry.
///
/// Read an entry, by exact name, from a zip archive.
fn zip_entry(archive: &Path, entry: &str) -> Result<Vec<u8>, BdFlacError> {
	let label = archive.to_string_lossy();
	let file = File::open(archive)
		.map_err(|_| BdFlacError::CoverRead(label.clone().into_owned()))?;
	let mut zip = ZipArchive::new(file)
		.map_err(|_| BdFlacError::CoverZip(label.clone().into_owned()))?;

	let mut file = zip.by_name(entry)
		.map_err(|_| BdFlacError::CoverEntry(entry.to_owned()))?;
	let mut out = Vec::new();
	file.read_to_end(&mut out)
		.map_err(|_| BdFlacError::CoverZip(label.into_owned()))?;
	Ok(out)
}
