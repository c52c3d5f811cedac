/*!
# bdflac: Track Extraction

A catalog track is made up of one or more chapters of a single title. One
chapter is a single cut; several are cut separately, then stitched together
in the order given. Either way the result may then be trimmed.
*/

use crate::{
	BdFlacError,
	Chapter,
	Chapters,
	Tool,
	ToolRunner,
	Track,
};
use std::{
	ffi::OsString,
	path::Path,
};
use tempfile::TempDir;



/// # Extract Track.
///
/// Extract `track` from the title file `src` to `dst` as FLAC, using the
/// title's probed `chapters` for the boundaries.
///
/// Chapters are resolved, and any trim checked, before anything is run. A
/// failed tool run aborts immediately; the scratch pieces are always
/// cleaned up, but a partial `dst` is left for inspection.
///
/// If `stream` is provided, that stream is mapped explicitly; otherwise the
/// transcoder picks.
///
/// ## Errors
///
/// This will return an error if a chapter is missing, the trim is at least
/// as long as the track, a tool fails, or the scratch files cannot be
/// written.
pub fn extract_track<R>(
	runner: &R,
	src: &Path,
	chapters: &Chapters,
	track: &Track,
	stream: Option<u32>,
	dst: &Path,
) -> Result<(), BdFlacError>
where R: ToolRunner + ?Sized {
	// Match up the chapters.
	let parts = track.chapters().iter()
		.map(|&n| chapters.get(n).ok_or_else(||
			BdFlacError::ChapterMissing(track.title_number().to_owned(), n)
		))
		.collect::<Result<Vec<&Chapter>, BdFlacError>>()?;

	// Check the trim.
	let duration: f64 = parts.iter().map(|c| c.duration()).sum();
	let trim = track.trim_end();
	if 0.0 < trim && duration <= trim {
		return Err(BdFlacError::Trim(track.number()));
	}

	let dir = dst.parent().unwrap_or_else(|| Path::new("."));
	std::fs::create_dir_all(dir).map_err(|_| write_err(dir))?;

	// Cut straight to the destination.
	if let [part] = parts.as_slice() { encode(runner, src, part, stream, dst)?; }
	// Cut and stitch.
	else {
		let tmp = scratch(dir)?;
		let mut manifest = String::new();
		for (i, part) in parts.iter().enumerate() {
			let piece = tmp.path().join(format!("{}_piece_{i}.flac", track.number()));
			encode(runner, src, part, stream, &piece)?;
			manifest.push_str(&manifest_line(&piece));
		}

		let list = tmp.path().join("concat.txt");
		std::fs::write(&list, manifest).map_err(|_| write_err(&list))?;

		runner.run_ok(Tool::Ffmpeg, &[
			OsString::from("-y"),
			OsString::from("-f"),
			OsString::from("concat"),
			OsString::from("-safe"),
			OsString::from("0"),
			OsString::from("-i"),
			list.into_os_string(),
			OsString::from("-c"),
			OsString::from("copy"),
			dst.as_os_str().to_owned(),
		])?;
	}

	if 0.0 < trim { trim_end(runner, dst, duration - trim)?; }

	Ok(())
}



/// # Encode.
///
/// Cut a single chapter to FLAC. Whole-file records have no bounds.
fn encode<R>(runner: &R, src: &Path, part: &Chapter, stream: Option<u32>, dst: &Path)
-> Result<(), BdFlacError>
where R: ToolRunner + ?Sized {
	let mut args = vec![OsString::from("-y")];
	if part.is_chapter {
		args.push(OsString::from("-ss"));
		args.push(OsString::from(secs(part.start)));
		args.push(OsString::from("-t"));
		args.push(OsString::from(secs(part.duration())));
	}
	args.push(OsString::from("-i"));
	args.push(src.as_os_str().to_owned());
	if let Some(stream) = stream {
		args.push(OsString::from("-map"));
		args.push(OsString::from(format!("0:{stream}")));
	}
	args.push(OsString::from("-c:a"));
	args.push(OsString::from("flac"));
	args.push(dst.as_os_str().to_owned());

	runner.run_ok(Tool::Ffmpeg, &args).map(|_| ())
}

/// # Trim End.
///
/// Copy the first `keep` seconds of `dst` to a scratch file, then move it
/// back over the original.
fn trim_end<R>(runner: &R, dst: &Path, keep: f64) -> Result<(), BdFlacError>
where R: ToolRunner + ?Sized {
	let dir = dst.parent().unwrap_or_else(|| Path::new("."));
	let tmp = scratch(dir)?;
	let trimmed = tmp.path().join(dst.file_name().unwrap_or_else(|| "trimmed.flac".as_ref()));

	runner.run_ok(Tool::Ffmpeg, &[
		OsString::from("-y"),
		OsString::from("-ss"),
		OsString::from("0"),
		OsString::from("-to"),
		OsString::from(secs(keep)),
		OsString::from("-i"),
		dst.as_os_str().to_owned(),
		OsString::from("-c:a"),
		OsString::from("copy"),
		trimmed.as_os_str().to_owned(),
	])?;

	std::fs::rename(&trimmed, dst).map_err(|_| write_err(dst))
}

/// # Manifest Line.
///
/// Format a path for the concat demuxer. Single quotes have to be closed,
/// escaped, and reopened.
fn manifest_line(src: &Path) -> String {
	format!("file '{}'\n", src.to_string_lossy().replace('\'', r"'\''"))
}

/// # Scratch Directory.
///
/// Scratch files live beside the destination so the final moves don't
/// cross filesystems.
fn scratch(dir: &Path) -> Result<TempDir, BdFlacError> {
	tempfile::Builder::new()
		.prefix(".bdflac-")
		.tempdir_in(dir)
		.map_err(|_| write_err(dir))
}

/// # Seconds.
fn secs(v: f64) -> String { format!("{v:.6}") }

/// # Write Error.
fn write_err(src: &Path) -> BdFlacError {
	BdFlacError::Write(src.to_string_lossy().into_owned())
}
