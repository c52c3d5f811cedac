/*!
# bdflac: Dumping
*/

use crate::{
	album_dir,
	BdFlacError,
	compress,
	CoverImage,
	DiscEntry,
	DumpOptions,
	extract_track,
	flac_path,
	mkv_path,
	probe_all_titles,
	resolve_cover,
	tag_track,
	TitleChapters,
	ToolRunner,
	TrackRef,
};
use dactyl::{
	NiceElapsed,
	traits::NiceInflection,
};
use fyi_msg::{
	Msg,
	Progless,
};
use std::{
	path::{
		Path,
		PathBuf,
	},
	time::Instant,
};



#[derive(Debug, Clone, Default)]
/// # Cover Policy.
///
/// How (and how strictly) album cover art should be sourced.
pub enum CoverPolicy {
	#[default]
	/// # No Covers.
	None,

	/// # The Same Image For Every Album.
	Fixed(CoverImage),

	/// # Use the Catalog Descriptors.
	///
	/// Local descriptors are resolved against `base`. When `strict`, a local
	/// cover that cannot be resolved is fatal; otherwise (and always for
	/// URLs) it is just a warning.
	Catalog {
		/// # Base Directory.
		base: Option<PathBuf>,

		/// # Fail on Error?
		strict: bool,
	},
}



#[derive(Debug)]
/// # Dump Manager.
///
/// This holds the disc entry, paths, and options needed to turn a folder of
/// ripped titles into a tree of tagged FLAC files.
pub struct Dumper<'a> {
	now: Instant,
	entry: &'a DiscEntry,
	mkv_dir: PathBuf,
	out_dir: PathBuf,
	opts: DumpOptions,
	done: Vec<PathBuf>,
}

impl<'a> Dumper<'a> {
	#[must_use]
	/// # New!
	pub fn new(entry: &'a DiscEntry, mkv_dir: &Path, out_dir: &Path, opts: DumpOptions)
	-> Self {
		Self {
			now: Instant::now(),
			entry,
			mkv_dir: mkv_dir.to_path_buf(),
			out_dir: out_dir.to_path_buf(),
			opts,
			done: Vec::new(),
		}
	}

	/// # Dump!
	///
	/// Probe every title the disc entry needs, then extract, compress, and
	/// tag each track in catalog order, saving album covers along the way.
	///
	/// Processing stops at the first error. Files written before then are
	/// left in place and remain available via [`Dumper::written`].
	///
	/// ## Errors
	///
	/// This will return an error if a title cannot be probed, a required
	/// cover cannot be resolved or saved, or any track fails. Track failures
	/// are wrapped with the album, disc, and track numbers.
	pub fn dump<R>(&mut self, runner: &R, covers: &CoverPolicy, progress: &Progless)
	-> Result<&[PathBuf], BdFlacError>
	where R: ToolRunner + ?Sized {
		let entry = self.entry;
		let total = u32::try_from(entry.tracks().count()).unwrap_or(u32::MAX);
		let _res = progress.reset(total);
		progress.set_title(Some(Msg::custom("Probing", 199, &format!(
			"Reading chapters from {}…",
			entry.title_numbers().len().nice_inflect("title", "titles"),
		))));

		let res = self.dump_tracks(runner, covers, progress);
		progress.finish();
		res?;

		Ok(&self.done)
	}

	/// # Dump Tracks.
	fn dump_tracks<R>(&mut self, runner: &R, covers: &CoverPolicy, progress: &Progless)
	-> Result<(), BdFlacError>
	where R: ToolRunner + ?Sized {
		let entry = self.entry;
		let titles = probe_all_titles(runner, &self.mkv_dir, entry)?;

		// Covers are resolved once per album, on its first track.
		let mut last: Option<(u16, Option<PathBuf>)> = None;
		for track in entry.tracks() {
			let album = track.album.number();
			if last.as_ref().map_or(true, |(n, _)| *n != album) {
				last.replace((album, self.album_cover(&track, covers)?));
			}
			let cover = last.as_ref().and_then(|(_, c)| c.as_deref());

			let dst = self.dump_track(runner, &track, &titles, cover, progress)
				.map_err(|e| e.for_track(track.id()))?;
			self.done.push(dst);
			progress.increment();
		}

		Ok(())
	}

	/// # Dump Track.
	fn dump_track<R>(
		&self,
		runner: &R,
		track: &TrackRef<'_>,
		titles: &TitleChapters,
		cover: Option<&Path>,
		progress: &Progless,
	) -> Result<PathBuf, BdFlacError>
	where R: ToolRunner + ?Sized {
		let idx = track.track.number();
		let title = track.track.title_number();
		let src = mkv_path(&self.mkv_dir, self.entry.prefix(), title);
		let chapters = titles.get(title)
			.ok_or_else(|| BdFlacError::Probe(src.to_string_lossy().into_owned()))?;
		let dst = flac_path(&self.out_dir, track, self.opts.underscores());

		set_progress_title(progress, idx, "Extracting…");
		extract_track(
			runner,
			&src,
			chapters,
			track.track,
			track.track.audio_stream(self.opts.audio()),
			&dst,
		)?;

		if self.opts.compress() {
			set_progress_title(progress, idx, "Compressing…");
			compress(runner, &dst)?;
		}

		if self.opts.tag() {
			set_progress_title(progress, idx, "Tagging…");
			tag_track(runner, &dst, track, cover)?;
		}

		Ok(dst)
	}

	/// # Album Cover.
	///
	/// Resolve and save the cover for the track's album, returning the saved
	/// path, if any.
	fn album_cover(&self, track: &TrackRef<'_>, covers: &CoverPolicy)
	-> Result<Option<PathBuf>, BdFlacError> {
		let dir = album_dir(&self.out_dir, track, self.opts.underscores());
		match covers {
			CoverPolicy::None => Ok(None),
			CoverPolicy::Fixed(img) => img.save(&dir).map(Some),
			CoverPolicy::Catalog { base, strict } => {
				let Some(src) = track.album.cover() else { return Ok(None); };
				match resolve_cover(src, base.as_deref()) {
					Ok(img) => img.save(&dir).map(Some),
					Err(e) =>
						if *strict && ! src.is_remote() { Err(e) }
						else {
							Msg::warning(format!(
								"Skipping the cover for {}: {e}",
								track.album.title(),
							)).eprint();
							Ok(None)
						},
				}
			},
		}
	}
}

impl Dumper<'_> {
	#[must_use]
	/// # Written Files.
	pub fn written(&self) -> &[PathBuf] { &self.done }

	/// # Summarize.
	///
	/// Print the number of tracks dumped and how long it took.
	pub fn summarize(&self) {
		let elapsed = NiceElapsed::from(self.now.elapsed());
		Msg::custom("Dumped", 199, &format!(
			"{}, in {elapsed}.",
			self.done.len().nice_inflect("track", "tracks"),
		))
			.with_newline(true)
			.eprint();
	}
}



/// # Set Progress Title.
fn set_progress_title(progress: &Progless, idx: u16, msg: &str) {
	progress.set_title(Some(Msg::custom(
		format!("Track {idx:02}").as_str(),
		199,
		msg
	)));
}
