/*!
# bdflac: Errors
*/

use crate::Tool;
use fyi_msg::Msg;
use std::{
	error::Error,
	fmt,
};



#[cfg(feature = "bin")]
/// # Help Text.
const HELP: &str = concat!(r"
    ___
   / _ \    bdflac v", env!("CARGO_PKG_VERSION"), r"
  | (_) |   Dump the audio from known Blu-ray
   \___/    discs to tagged FLAC.

USAGE:
    bdflac [OPTIONS] -o <DIR>

SOURCE (PICK ONE):
    -d, --drive <NUM> The makemkvcon drive index of the disc to identify and
                      rip. The mount point is looked up automatically so the
                      disc's key file can be fingerprinted.
    -b, --backup <DIR>
                      A decrypted disc backup folder (the one holding BDMV/)
                      to identify and rip.
    -s, --source <DIR>
                      A folder of MKV files already ripped from the disc. Use
                      with -k/--disc-root or --key so the disc can be matched.

IDENTIFICATION:
    -k, --disc-root <DIR>
                      The root of the mounted disc (or backup) holding
                      AACS/Unit_Key_RO.inf. [default: auto]
        --key <SHA1>  Skip the key file entirely and use this fingerprint.

OUTPUT:
    -o, --output <DIR>
                      The output directory. Albums are written to
                      <DIR>/<disc>/<album>/[Disc N/]<track>-<title>.flac.
    -a, --audio <TYPE>
                      Preferred audio stream: best, surround71, surround51,
                      stereo21, or stereo20. [default: whatever ffmpeg picks]
        --underscores Replace spaces with underscores in file and folder
                      names.
        --no-compress Skip the flac -8 recompression pass.
        --no-tag      Leave the extracted files untagged.

COVER ART:
        --cover <FILE>
                      An explicit cover image to use for every album.
        --cover-base <DIR>
                      The base folder catalog cover descriptors are relative
                      to. [default: the disc root, if known]

MISCELLANEOUS:
    -c, --config <FILE>
                      The disc catalog.
                      [default: ~/.config/bdflac/catalog.json]
    -h, --help        Print help information to STDOUT and exit.
    -V, --version     Print version information to STDOUT and exit.

REQUIREMENTS:
    ffmpeg, ffprobe, flac, metaflac, and (for -d/-b) makemkvcon must all be
    somewhere in your PATH.
");



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Error Kind.
///
/// The broad stage an error belongs to.
pub enum ErrorKind {
	/// # Catalog Loading/Validation.
	Config,

	/// # Disc Identification.
	Identity,

	/// # Chapter Probing.
	Probe,

	/// # Track Extraction.
	Extract,

	/// # Cover Art.
	Cover,

	/// # Tagging.
	Tag,

	/// # General I/O.
	Io,

	/// # CLI.
	Cli,
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Track Identifier.
///
/// Album, disc, and track numbers, for error context.
pub struct TrackId {
	/// # Album Number.
	pub album: u16,

	/// # Disc Number.
	pub disc: u16,

	/// # Track Number.
	pub track: u16,
}

impl fmt::Display for TrackId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "album #{}, disc #{}, track #{}", self.album, self.disc, self.track)
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Errors.
pub enum BdFlacError {
	/// # Invalid Audio Preference.
	AudioPreference(String),

	/// # Invalid Catalog.
	Catalog(String),

	/// # Catalog JSON Parse Error.
	CatalogParse(String),

	/// # Unreadable Catalog.
	CatalogRead(String),

	/// # Missing Chapter.
	ChapterMissing(String, u32),

	/// # Relative Cover Without Base.
	CoverBase,

	/// # Missing Zip Entry.
	CoverEntry(String),

	/// # Unrecognized Image Format.
	CoverFormat,

	/// # Cover Download Failed.
	CoverHttp(String),

	/// # MP3 Without Picture.
	CoverMp3(String),

	/// # Unreadable Cover Source.
	CoverRead(String),

	/// # Unreadable Zip.
	CoverZip(String),

	/// # No Device For Drive.
	Device(u8),

	/// # Unreadable Key File.
	KeyFile(String),

	/// # No Mount Point.
	MountPoint(String),

	/// # Mount Lookup Unsupported.
	MountUnsupported,

	/// # Nothing To Do.
	Noop,

	/// # Probe Failed.
	Probe(String),

	/// # Unparseable Probe Output.
	ProbeParse(String),

	/// # Tool Failure.
	Tool(Tool),

	/// # Tool Not Found.
	ToolMissing(Tool),

	/// # Per-Track Failure.
	Track(TrackId, Box<Self>),

	/// # Trim Too Long.
	Trim(u16),

	/// # Unknown Disc.
	UnknownDisc(String),

	/// # Writing to disk.
	Write(String),

	#[cfg(feature = "bin")]
	/// # Invalid CLI arg.
	CliArg(String),

	#[cfg(feature = "bin")]
	/// # CLI Parsing failure.
	CliParse(&'static str),

	#[cfg(feature = "bin")]
	/// # Print Help (Not an Error).
	PrintHelp,

	#[cfg(feature = "bin")]
	/// # Print Version (Not an Error).
	PrintVersion,
}

impl Error for BdFlacError {}

impl From<BdFlacError> for Msg {
	#[inline]
	fn from(src: BdFlacError) -> Self { Self::error(src.to_string()) }
}

impl fmt::Display for BdFlacError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::AudioPreference(s) => write!(f, "Invalid audio preference: {s:?}."),
			Self::Catalog(s) => write!(f, "Invalid catalog: {s}."),
			Self::CatalogParse(s) => write!(f, "Unable to parse the catalog: {s}."),
			Self::CatalogRead(s) => write!(f, "Unable to read the catalog at {s}."),
			Self::ChapterMissing(t, c) => write!(f, "Title {t} has no chapter #{c}."),
			Self::CoverBase => f.write_str("Catalog cover art needs a base path (-k/--disc-root or --cover-base)."),
			Self::CoverEntry(s) => write!(f, "The cover archive has no entry {s}."),
			Self::CoverFormat => f.write_str("Unable to detect the cover image format."),
			Self::CoverHttp(s) => write!(f, "Unable to download cover art from {s}."),
			Self::CoverMp3(s) => write!(f, "Unable to find a picture in {s}."),
			Self::CoverRead(s) => write!(f, "Unable to read cover art from {s}."),
			Self::CoverZip(s) => write!(f, "Unable to open cover archive {s}."),
			Self::Device(n) => write!(f, "No device found for drive #{n}; is there a disc in it?"),
			Self::KeyFile(s) => write!(f, "Unable to read the volume key file {s}."),
			Self::MountPoint(s) => write!(f, "Unable to find the mount point for {s}."),
			Self::MountUnsupported => f.write_str("Mount point lookup is not supported on this platform."),
			Self::Noop => f.write_str("There's nothing to do!"),
			Self::Probe(s) => write!(f, "Unable to probe {s}."),
			Self::ProbeParse(s) => write!(f, "Unable to parse probe output: {s}"),
			Self::Tool(t) => write!(f, "{t} returned an error."),
			Self::ToolMissing(t) => write!(f, "Unable to find {t} in the PATH."),
			Self::Track(id, e) => write!(f, "{id}: {e}"),
			Self::Trim(n) => write!(f, "The trim for track #{n} is at least as long as the track itself."),
			Self::UnknownDisc(s) => write!(f, "Unknown disc key hash: {s}."),
			Self::Write(s) => write!(f, "Unable to write to {s}."),

			#[cfg(feature = "bin")]
			Self::CliArg(s) => write!(f, "Invalid CLI option: {s}"),

			#[cfg(feature = "bin")]
			Self::CliParse(s) => write!(f, "Unable to parse {s}."),

			#[cfg(feature = "bin")]
			Self::PrintHelp => f.write_str(HELP),

			#[cfg(feature = "bin")]
			Self::PrintVersion => f.write_str(concat!("bdflac v", env!("CARGO_PKG_VERSION"))),
		}
	}
}

impl BdFlacError {
	#[must_use]
	/// # Kind.
	///
	/// Return the stage the error belongs to. Per-track wrappers report the
	/// kind of the error they wrap.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::AudioPreference(_) | Self::Catalog(_) | Self::CatalogParse(_) |
			Self::CatalogRead(_) => ErrorKind::Config,
			Self::Device(_) | Self::KeyFile(_) | Self::MountPoint(_) |
			Self::MountUnsupported | Self::UnknownDisc(_) => ErrorKind::Identity,
			Self::Probe(_) | Self::ProbeParse(_) => ErrorKind::Probe,
			Self::ChapterMissing(_, _) | Self::Trim(_) => ErrorKind::Extract,
			Self::CoverBase | Self::CoverEntry(_) | Self::CoverFormat |
			Self::CoverHttp(_) | Self::CoverMp3(_) | Self::CoverRead(_) |
			Self::CoverZip(_) => ErrorKind::Cover,
			Self::Tool(Tool::Metaflac) => ErrorKind::Tag,
			Self::Tool(Tool::Ffprobe) => ErrorKind::Probe,
			Self::Tool(_) | Self::ToolMissing(_) => ErrorKind::Extract,
			Self::Track(_, e) => e.kind(),
			Self::Noop | Self::Write(_) => ErrorKind::Io,

			#[cfg(feature = "bin")]
			Self::CliArg(_) | Self::CliParse(_) | Self::PrintHelp | Self::PrintVersion => ErrorKind::Cli,
		}
	}

	#[must_use]
	/// # Wrap With Track Context.
	pub fn for_track(self, id: TrackId) -> Self {
		// Don't double-wrap.
		if matches!(self, Self::Track(_, _)) { self }
		else { Self::Track(id, Box::new(self)) }
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_kind() {
		let id = TrackId { album: 1, disc: 2, track: 3 };
		let err = BdFlacError::Trim(3).for_track(id);
		assert_eq!(err.kind(), ErrorKind::Extract, "Wrapped errors should keep their kind.");
		assert_eq!(
			err.to_string(),
			"album #1, disc #2, track #3: The trim for track #3 is at least as long as the track itself.",
		);

		// Wrapping twice changes nothing.
		assert_eq!(err.clone().for_track(id), err);

		assert_eq!(BdFlacError::Tool(Tool::Metaflac).kind(), ErrorKind::Tag);
		assert_eq!(BdFlacError::Tool(Tool::Ffmpeg).kind(), ErrorKind::Extract);
		assert_eq!(BdFlacError::UnknownDisc(String::new()).kind(), ErrorKind::Identity);
	}
}
