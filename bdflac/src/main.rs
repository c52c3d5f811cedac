/*!
# bdflac
*/

#![forbid(unsafe_code)]

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
)]

#![warn(
	clippy::complexity,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::style,

	clippy::allow_attributes,
	clippy::clone_on_ref_ptr,
	clippy::create_dir,
	clippy::filetype_is_file,
	clippy::format_push_string,
	clippy::get_unwrap,
	clippy::impl_trait_in_params,
	clippy::lossy_float_literal,
	clippy::missing_assert_message,
	clippy::missing_docs_in_private_items,
	clippy::needless_raw_strings,
	clippy::panic_in_result_fn,
	clippy::pub_without_shorthand,
	clippy::rest_pat_in_fully_bound_structs,
	clippy::semicolon_inside_block,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::todo,
	clippy::undocumented_unsafe_blocks,
	clippy::unneeded_field_pattern,
	clippy::unseparated_literal_suffix,
	clippy::unwrap_in_result,

	macro_use_extern_crate,
	missing_copy_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![expect(clippy::redundant_pub_crate, reason = "Unresolvable.")]



mod cli;

use bdflac_core::{
	BdFlacError,
	Catalog,
	CoverImage,
	CoverPolicy,
	default_catalog_path,
	DiscEntry,
	Dumper,
	ErrorKind,
	fingerprint,
	mount_point,
	rip_backup,
	rip_disc,
	scratch_dir,
	SystemRunner,
};
use cli::{
	Settings,
	Source,
};
use fyi_ansi::ansi;
use fyi_msg::{
	Msg,
	Progless,
};
use oxford_join::JoinFmt;
use std::{
	path::{
		Path,
		PathBuf,
	},
	process::ExitCode,
};



/// # A Divider Line.
///
/// This is used to encase the disc title during summary. We'll slice it to
/// match the length rather than `"-".repeat()` or whatever.
const DIVIDER: &str = "----------------------------------------------------------------";



/// # Main.
///
/// This lets us bubble up startup errors so they can be pretty-printed.
fn main() -> ExitCode {
	match main__() {
		Ok(()) => ExitCode::SUCCESS,
		Err(e @ (BdFlacError::PrintHelp | BdFlacError::PrintVersion)) => {
			println!("{e}");
			ExitCode::SUCCESS
		},
		Err(e) => {
			Msg::from(e).print();
			ExitCode::FAILURE
		},
	}
}

#[inline]
/// # Actual Main.
///
/// This does all the stuff.
fn main__() -> Result<(), BdFlacError> {
	let settings = cli::parse()?;
	let runner = SystemRunner;

	// Load the catalog.
	let catalog = match settings.config.clone().or_else(default_catalog_path) {
		Some(p) => Catalog::load(p)?,
		None => return Err(BdFlacError::CatalogRead("<config>/bdflac/catalog.json".to_owned())),
	};

	// Figure out which disc this is.
	let disc_root = disc_root(&runner, &settings)?;
	let key = match (&settings.key, &disc_root) {
		(Some(k), _) => k.clone(),
		(None, Some(root)) => fingerprint(root)?,
		(None, None) => return Err(BdFlacError::CliArg(
			"-k/--disc-root or --key is required to identify the disc.".to_owned()
		)),
	};
	let entry = catalog.find(&key)?;
	print_header(entry);

	// Rip it, unless that's already been done.
	let mkv_dir = match &settings.source {
		Source::Mkv(p) => p.clone(),
		Source::Drive(idx) => {
			let dst = scratch_dir(&settings.output, entry.prefix());
			print_ripping(&dst);
			rip_disc(&runner, *idx, &dst)?;
			dst
		},
		Source::Backup(root) => {
			let dst = scratch_dir(&settings.output, entry.prefix());
			print_ripping(&dst);
			rip_backup(&runner, root, &dst)?;
			dst
		},
	};

	// Explicit covers are all-or-nothing; discovered ones are best-effort.
	let covers =
		if let Some(src) = &settings.cover {
			CoverPolicy::Fixed(CoverImage::from_file(src)?)
		}
		else if let Some(base) = &settings.cover_base {
			CoverPolicy::Catalog { base: Some(base.clone()), strict: true }
		}
		else {
			CoverPolicy::Catalog { base: disc_root, strict: false }
		};

	let progress = Progless::default();
	let mut dumper = Dumper::new(entry, &mkv_dir, &settings.output, settings.opts);
	if let Err(e) = dumper.dump(&runner, &covers, &progress) {
		if ! matches!(settings.source, Source::Mkv(_)) && keeps_rip(e.kind()) {
			print_resume(&mkv_dir, &key);
		}
		return Err(e);
	}
	dumper.summarize();

	Ok(())
}

/// # Disc Root.
///
/// Return the explicit disc root, or the one implied by the source. For
/// drives this requires a mount table lookup, which is only fatal if there
/// is no other way to identify the disc.
fn disc_root(runner: &SystemRunner, settings: &Settings)
-> Result<Option<PathBuf>, BdFlacError> {
	if let Some(root) = settings.disc_root.clone().or_else(|| settings.source.disc_root()) {
		return Ok(Some(root));
	}

	if let Source::Drive(idx) = settings.source {
		return match mount_point(runner, idx) {
			Ok(root) => Ok(Some(root)),
			Err(_) if settings.key.is_some() => Ok(None),
			Err(e) => Err(e),
		};
	}

	Ok(None)
}

/// # Rip Worth Keeping?
///
/// Failures after the rip leave usable titles behind in the scratch folder.
const fn keeps_rip(kind: ErrorKind) -> bool {
	matches!(
		kind,
		ErrorKind::Probe | ErrorKind::Extract | ErrorKind::Cover | ErrorKind::Tag | ErrorKind::Io,
	)
}

/// # Print Header.
///
/// Print the disc title and its albums.
fn print_header(entry: &DiscEntry) {
	let title = entry.title();
	let len = title.chars().count();
	let divider = DIVIDER.get(..len).unwrap_or(DIVIDER);

	eprintln!(
		concat!(
			ansi!((dim, cyan) "{divider}\n"),
			ansi!((bold, cyan) "{title}\n"),
			ansi!((dim, cyan) "{divider}"),
		),
		divider=divider,
		title=title,
	);

	Msg::custom("Albums", 199, &format!(
		"{}",
		JoinFmt::new(entry.albums().iter().map(|a| a.title()), ", "),
	))
		.with_newline(true)
		.eprint();
}

/// # Print Resume Hint.
fn print_resume(dir: &Path, key: &str) {
	Msg::info(format!(
		"The ripped titles were kept; rerun with -s {} --key {key} to skip ripping.",
		dir.to_string_lossy(),
	))
		.with_newline(true)
		.eprint();
}

/// # Print Ripping.
fn print_ripping(dst: &Path) {
	Msg::custom("Ripping", 199, &format!(
		"Extracting titles to {}; this will take a while…",
		dst.to_string_lossy(),
	))
		.with_newline(true)
		.eprint();
}
