/*!
# bdflac: CLI
*/

use argyle::Argument;
use bdflac_core::{
	AudioPreference,
	BdFlacError,
	DumpOptions,
};
use dactyl::traits::BytesToUnsigned;
use std::path::PathBuf;



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Title Source.
///
/// Where the MKV titles come from.
pub(super) enum Source {
	/// # Rip From a Drive.
	Drive(u8),

	/// # Rip From a Decrypted Backup.
	Backup(PathBuf),

	/// # Already Ripped.
	Mkv(PathBuf),
}

impl Source {
	/// # Disc Root.
	///
	/// Return the disc root implied by the source, if any. (Drives need to
	/// be looked up.)
	pub(super) fn disc_root(&self) -> Option<PathBuf> {
		if let Self::Backup(p) = self { Some(p.clone()) }
		else { None }
	}
}



#[derive(Debug, Clone)]
/// # Parsed Settings.
pub(super) struct Settings {
	/// # Title Source.
	pub(super) source: Source,

	/// # Explicit Disc Root.
	pub(super) disc_root: Option<PathBuf>,

	/// # Explicit Fingerprint.
	pub(super) key: Option<String>,

	/// # Output Directory.
	pub(super) output: PathBuf,

	/// # Catalog Path.
	pub(super) config: Option<PathBuf>,

	/// # Explicit Cover Image.
	pub(super) cover: Option<PathBuf>,

	/// # Cover Base Directory.
	pub(super) cover_base: Option<PathBuf>,

	/// # Dump Options.
	pub(super) opts: DumpOptions,
}



/// # Parse Options.
pub(super) fn parse() -> Result<Settings, BdFlacError> {
	let args = argyle::args()
		.with_keywords(include!(concat!(env!("OUT_DIR"), "/argyle.rs")));

	let mut opts = DumpOptions::default();
	let mut drive = None;
	let mut backup = None;
	let mut mkv = None;
	let mut disc_root = None;
	let mut key = None;
	let mut output = None;
	let mut config = None;
	let mut cover = None;
	let mut cover_base = None;
	for arg in args {
		match arg {
			Argument::Key("-h" | "--help") => return Err(BdFlacError::PrintHelp),
			Argument::Key("--no-compress") => { opts = opts.with_compress(false); },
			Argument::Key("--no-tag") => { opts = opts.with_tag(false); },
			Argument::Key("--underscores") => { opts = opts.with_underscores(true); },
			Argument::Key("-V" | "--version") => return Err(BdFlacError::PrintVersion),

			Argument::KeyWithValue("-a" | "--audio", s) => {
				let s = AudioPreference::try_from(s.trim().as_bytes())?;
				opts = opts.with_audio(Some(s));
			},
			Argument::KeyWithValue("-b" | "--backup", s) => { backup.replace(PathBuf::from(s)); },
			Argument::KeyWithValue("-c" | "--config", s) => { config.replace(PathBuf::from(s)); },
			Argument::KeyWithValue("--cover", s) => { cover.replace(PathBuf::from(s)); },
			Argument::KeyWithValue("--cover-base", s) => { cover_base.replace(PathBuf::from(s)); },
			Argument::KeyWithValue("-d" | "--drive", s) => {
				let s = u8::btou(s.trim().as_bytes())
					.ok_or(BdFlacError::CliParse("-d/--drive"))?;
				drive.replace(s);
			},
			Argument::KeyWithValue("-k" | "--disc-root", s) => { disc_root.replace(PathBuf::from(s)); },
			Argument::KeyWithValue("--key", s) => {
				let s = parse_key(&s).ok_or(BdFlacError::CliParse("--key"))?;
				key.replace(s);
			},
			Argument::KeyWithValue("-o" | "--output", s) => { output.replace(PathBuf::from(s)); },
			Argument::KeyWithValue("-s" | "--source", s) => { mkv.replace(PathBuf::from(s)); },

			_ => {},
		}
	}

	let source = match (drive, backup, mkv) {
		(Some(d), None, None) => Source::Drive(d),
		(None, Some(b), None) => Source::Backup(b),
		(None, None, Some(s)) => Source::Mkv(s),
		(None, None, None) => return Err(BdFlacError::Noop),
		_ => return Err(BdFlacError::CliArg(
			"-d/--drive, -b/--backup, and -s/--source are mutually exclusive.".to_owned()
		)),
	};

	// A pre-ripped folder says nothing about which disc it came from.
	if matches!(source, Source::Mkv(_)) && disc_root.is_none() && key.is_none() {
		return Err(BdFlacError::CliArg(
			"-s/--source requires -k/--disc-root or --key to identify the disc.".to_owned()
		));
	}

	if cover.is_some() && cover_base.is_some() {
		return Err(BdFlacError::CliArg(
			"--cover and --cover-base are mutually exclusive.".to_owned()
		));
	}

	let output = output.ok_or_else(|| BdFlacError::CliArg(
		"-o/--output is required.".to_owned()
	))?;

	Ok(Settings {
		source,
		disc_root,
		key,
		output,
		config,
		cover,
		cover_base,
		opts,
	})
}



/// # Parse Key.
///
/// Fingerprints are hex-encoded hashes, matched against the catalog as-is.
fn parse_key(src: &str) -> Option<String> {
	let src = src.trim();
	if ! src.is_empty() && src.bytes().all(|b| b.is_ascii_hexdigit()) {
		Some(src.to_owned())
	}
	else { None }
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_parse_key() {
		assert_eq!(
			parse_key(" aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d\n").as_deref(),
			Some("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"),
		);
		assert_eq!(parse_key("ABC123").as_deref(), Some("ABC123"), "Case should be left alone.");
		for bad in ["", "  ", "abc 123", "zaf4c61d", "abc123!"] {
			assert!(parse_key(bad).is_none(), "{bad:?} should not parse.");
		}
	}

	#[test]
	fn t_audio() {
		// The same conversion the --audio handler uses.
		for (raw, expected) in [
			(" best\n", AudioPreference::Best),
			("surround71", AudioPreference::Surround71),
			("Surround51", AudioPreference::Surround51),
			("stereo21", AudioPreference::Stereo21),
			("STEREO20", AudioPreference::Stereo20),
		] {
			assert_eq!(
				AudioPreference::try_from(raw.trim().as_bytes()),
				Ok(expected),
				"Wrong preference for {raw:?}.",
			);
		}

		assert!(
			AudioPreference::try_from(b"surround61".as_slice()).is_err(),
			"Unsupported layouts should fail.",
		);
	}

	#[test]
	fn t_source_root() {
		assert_eq!(Source::Drive(0).disc_root(), None);
		assert_eq!(Source::Mkv(PathBuf::from("mkv")).disc_root(), None);
		assert_eq!(Source::Backup(PathBuf::from("bak")).disc_root(), Some(PathBuf::from("bak")));
	}
}
