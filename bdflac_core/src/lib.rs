/*!
# bdflac: Library

This library holds the guts of `bdflac`: catalog loading and validation,
Blu-ray identification, chapter probing, track extraction, cover art, and
tagging. All of the actual media work is farmed out to external programs via
the [`ToolRunner`] trait.
*/

#![deny(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::doc_markdown,
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]

mod catalog;
mod cover;
mod disc;
mod dump;
mod error;
mod extract;
mod mkv;
mod opts;
mod paths;
mod probe;
mod tag;
mod tool;

pub use catalog::{
	Album,
	AlbumDisc,
	AudioStream,
	Catalog,
	ChannelType,
	DiscEntry,
	Track,
	TrackRef,
};
pub use cover::{
	CoverImage,
	CoverSource,
	ImageKind,
	resolve_cover,
};
pub use disc::{
	drive_device,
	fingerprint,
	mount_point,
	MountFlavor,
	parse_drv_line,
	parse_mount_table,
};
pub use dump::{
	CoverPolicy,
	Dumper,
};
pub use error::{
	BdFlacError,
	ErrorKind,
	TrackId,
};
pub use extract::extract_track;
pub use mkv::{
	rip_backup,
	rip_disc,
};
pub use opts::{
	AudioPreference,
	DumpOptions,
};
pub use paths::{
	album_dir,
	flac_path,
	mkv_path,
	sanitize,
};
pub use probe::{
	Chapter,
	Chapters,
	parse_chapter_stream,
	parse_duration,
	probe_all_titles,
	probe_title,
	TitleChapters,
};
pub use tag::{
	compress,
	tag_track,
};
pub use tool::{
	SystemRunner,
	Tool,
	ToolOutput,
	ToolRunner,
};



/// # Static Hasher.
pub(crate) const AHASHER: ahash::RandomState = ahash::RandomState::with_seeds(13, 19, 23, 71);

/// # Cache Base.
///
/// Ripped MKVs are parked in `OUTPUT/CACHE_BASE/<prefix>`.
pub const CACHE_BASE: &str = "_bdflac";

/// # Key File Directory.
pub const KEY_FILE_DIR: &str = "AACS";

/// # Key File Name.
///
/// The disc fingerprint is the SHA-1 of `<root>/KEY_FILE_DIR/KEY_FILE`.
pub const KEY_FILE: &str = "Unit_Key_RO.inf";



#[cfg(feature = "bin")]
#[must_use]
/// # Default Catalog Path.
///
/// This returns `<config>/bdflac/catalog.json`, where `<config>` is the
/// platform's user configuration directory, if it can be determined.
pub fn default_catalog_path() -> Option<std::path::PathBuf> {
	let mut out = dirs::config_dir()?;
	out.push("bdflac");
	out.push("catalog.json");
	Some(out)
}

#[must_use]
/// # Scratch Directory.
///
/// Return the folder ripped MKVs for a given disc should be written to, i.e.
/// `<out>/_bdflac/<prefix>`.
pub fn scratch_dir(out: &std::path::Path, prefix: &str) -> std::path::PathBuf {
	out.join(CACHE_BASE).join(sanitize(prefix, true))
}
