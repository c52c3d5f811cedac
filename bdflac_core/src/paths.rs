/*!
# bdflac: Paths
*/

use crate::TrackRef;
use std::path::{
	Path,
	PathBuf,
};



/// # Sanitize Path Segment.
///
/// Replace control characters and path-unsafe punctuation with underscores
/// (and optionally spaces too), collapsing any runs of underscores the
/// substitution produces.
///
/// Sanitizing twice gives the same result as sanitizing once.
///
/// ```
/// use bdflac_core::sanitize;
///
/// assert_eq!(sanitize("AC/DC: Live?", false), "AC_DC_ Live_");
/// assert_eq!(sanitize("AC/DC: Live?", true), "AC_DC_Live_");
/// ```
pub fn sanitize(src: &str, underscores: bool) -> String {
	let mut out = String::with_capacity(src.len());
	// Whether the last character pushed was a substitution.
	let mut last_sub = false;

	for c in src.chars() {
		let bad = c.is_control() ||
			matches!(c, '/' | '\\' | '<' | '>' | ':' | '"' | '\'' | '|' | '?' | '*' | ';') ||
			(underscores && c == ' ') ||
			std::path::is_separator(c);

		if bad {
			// Collapse into an adjacent underscore.
			if ! out.ends_with('_') { out.push('_'); }
			last_sub = true;
		}
		else if c == '_' && last_sub { continue; }
		else {
			out.push(c);
			last_sub = false;
		}
	}

	out
}

/// # Album Directory.
///
/// `<out>/<disc title>/<album title>`, the home of the album's tracks (or
/// disc folders) and cover.
pub fn album_dir(out: &Path, track: &TrackRef<'_>, underscores: bool) -> PathBuf {
	out.join(sanitize(track.entry.title(), underscores))
		.join(sanitize(track.album.title(), underscores))
}

/// # FLAC Path.
///
/// `<album dir>/[Disc N/]<track>-<title>.flac`. The disc folder is only
/// added when the album has more than one disc on this Blu-ray.
pub fn flac_path(out: &Path, track: &TrackRef<'_>, underscores: bool) -> PathBuf {
	let mut dst = album_dir(out, track, underscores);
	if 1 < track.album.discs().len() {
		dst.push(sanitize(&format!("Disc {}", track.disc.number()), underscores));
	}
	dst.push(format!(
		"{}-{}.flac",
		track.track.number(),
		sanitize(track.track.title(), underscores),
	));
	dst
}

/// # MKV Path.
///
/// The ripper names title files `<prefix>_t<title>.mkv`.
pub fn mkv_path(dir: &Path, prefix: &str, title: &str) -> PathBuf {
	dir.join(format!("{prefix}_t{title}.mkv"))
}
