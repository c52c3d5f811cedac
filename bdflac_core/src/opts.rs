/*!
# bdflac: Dump Options
*/

use crate::{
	BdFlacError,
	ChannelType,
};
use std::{
	fmt,
	str::FromStr,
};



/// # FLAG: Replace Spaces With Underscores.
const FLAG_UNDERSCORES: u8 = 0b0000_0001;

/// # FLAG: Recompress With flac -8.
const FLAG_COMPRESS: u8 =    0b0000_0010;

/// # FLAG: Tag Output.
const FLAG_TAG: u8 =         0b0000_0100;

/// # FLAG: Default.
const FLAG_DEFAULT: u8 = FLAG_COMPRESS | FLAG_TAG;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Dump Options.
///
/// This struct holds the output-related options, like whether or not to
/// recompress and tag the FLAC files.
///
/// Options are set using builder-style methods, like:
///
/// ```
/// use bdflac_core::{
///     AudioPreference,
///     DumpOptions,
/// };
///
/// let opts = DumpOptions::default()
///     .with_underscores(true)
///     .with_audio(Some(AudioPreference::Best));
///
/// assert!(opts.underscores());
/// assert!(opts.compress());
/// assert_eq!(opts.audio(), Some(AudioPreference::Best));
/// ```
pub struct DumpOptions {
	audio: Option<AudioPreference>,
	flags: u8,
}

impl Default for DumpOptions {
	fn default() -> Self {
		Self {
			audio: None,
			flags: FLAG_DEFAULT,
		}
	}
}

macro_rules! with_flag {
	($fn:ident, $flag:ident, $($doc:literal),+ $(,)?) => (
		#[must_use]
		$(
			#[doc = $doc]
		)+
		pub const fn $fn(self, v: bool) -> Self {
			let flags =
				if v { self.flags | $flag }
				else { self.flags & ! $flag };

			Self {
				flags,
				..self
			}
		}
	)
}

/// ## Setters.
impl DumpOptions {
	#[must_use]
	/// # Audio Stream Preference.
	///
	/// When set, tracks listing a stream matching the preference will have
	/// that stream mapped explicitly. Otherwise the transcoder picks.
	///
	/// The default is `None`.
	pub const fn with_audio(self, audio: Option<AudioPreference>) -> Self {
		Self {
			audio,
			..self
		}
	}

	with_flag!(
		with_compress,
		FLAG_COMPRESS,
		"# Recompress.",
		"",
		"When `true`, each extracted file is run back through `flac -8` to",
		"squeeze it down a little further before tagging.",
		"",
		"The default is `true`.",
	);

	with_flag!(
		with_tag,
		FLAG_TAG,
		"# Tag.",
		"",
		"When `true`, the catalog metadata (and cover, if any) is written to",
		"each file.",
		"",
		"The default is `true`.",
	);

	with_flag!(
		with_underscores,
		FLAG_UNDERSCORES,
		"# Underscores.",
		"",
		"When `true`, spaces in generated file and folder names are replaced",
		"with underscores.",
		"",
		"The default is `false`.",
	);
}



macro_rules! get_flag {
	($fn:ident, $flag:ident, $title:literal) => (
		#[must_use]
		#[doc = concat!("# ", $title, "?")]
		pub const fn $fn(&self) -> bool { $flag == self.flags & $flag }
	);
}

/// # Getters.
impl DumpOptions {
	get_flag!(compress, FLAG_COMPRESS, "Recompress");
	get_flag!(tag, FLAG_TAG, "Tag");
	get_flag!(underscores, FLAG_UNDERSCORES, "Underscores");

	#[must_use]
	/// # Audio Stream Preference.
	pub const fn audio(&self) -> Option<AudioPreference> { self.audio }
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Audio Preference.
pub enum AudioPreference {
	/// # The Richest Available.
	Best,

	/// # 7.1.
	Surround71,

	/// # 5.1.
	Surround51,

	/// # 2.1.
	Stereo21,

	/// # 2.0.
	Stereo20,
}

impl fmt::Display for AudioPreference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.channel_type() {
			Some(c) => f.write_str(c.as_str()),
			None => f.write_str("best"),
		}
	}
}

impl FromStr for AudioPreference {
	type Err = BdFlacError;

	fn from_str(src: &str) -> Result<Self, Self::Err> {
		match src.trim().to_ascii_lowercase().as_str() {
			"best" => Ok(Self::Best),
			"surround71" => Ok(Self::Surround71),
			"surround51" => Ok(Self::Surround51),
			"stereo21" => Ok(Self::Stereo21),
			"stereo20" => Ok(Self::Stereo20),
			_ => Err(BdFlacError::AudioPreference(src.to_owned())),
		}
	}
}

impl TryFrom<&[u8]> for AudioPreference {
	type Error = BdFlacError;

	fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
		std::str::from_utf8(src)
			.map_err(|_| BdFlacError::AudioPreference(String::from_utf8_lossy(src).into_owned()))
			.and_then(Self::from_str)
	}
}

impl AudioPreference {
	#[must_use]
	/// # Channel Type.
	///
	/// Return the exact layout wanted, or `None` for [`AudioPreference::Best`].
	pub const fn channel_type(self) -> Option<ChannelType> {
		match self {
			Self::Best => None,
			Self::Surround71 => Some(ChannelType::Surround71),
			Self::Surround51 => Some(ChannelType::Surround51),
			Self::Stereo21 => Some(ChannelType::Stereo21),
			Self::Stereo20 => Some(ChannelType::Stereo20),
		}
	}
}
