/*!
# bdflac: Tagging
*/

use crate::{
	BdFlacError,
	Tool,
	ToolRunner,
	TrackRef,
};
use std::{
	ffi::OsString,
	path::Path,
};



/// # Compress.
///
/// Re-encode a FLAC file in place at the highest compression level.
///
/// ## Errors
///
/// This will return an error if `flac` fails.
pub fn compress<R>(runner: &R, flac: &Path) -> Result<(), BdFlacError>
where R: ToolRunner + ?Sized {
	runner.run_ok(Tool::Flac, &[
		OsString::from("-8f"),
		flac.as_os_str().to_owned(),
	]).map(|_| ())
}

/// # Tag Track.
///
/// Strip any existing tags from `flac`, then write the catalog metadata for
/// `track`, one field at a time. If a `cover` is provided, it is embedded as
/// well.
///
/// Tags applied before a failure are left as they are.
///
/// ## Errors
///
/// This will return an error if any `metaflac` call fails.
pub fn tag_track<R>(runner: &R, flac: &Path, track: &TrackRef<'_>, cover: Option<&Path>)
-> Result<(), BdFlacError>
where R: ToolRunner + ?Sized {
	let run = |arg: OsString| runner.run_ok(Tool::Metaflac, &[arg, flac.as_os_str().to_owned()]);

	run(OsString::from("--remove-all-tags"))?;

	for (k, v) in [
		("ALBUM", track.album.title().to_owned()),
		("ALBUMARTIST", track.album.artist().to_owned()),
		("GENRE", track.album.genre().to_owned()),
		("DATE", track.album.release_date().to_owned()),
		("TRACKNUMBER", track.track.number().to_string()),
		("DISCNUMBER", track.disc.number().to_string()),
		("TOTALDISCS", track.album.total_discs().to_string()),
		("TOTALTRACKS", track.disc.total_tracks().to_string()),
		("TITLE", track.track.title().to_owned()),
	] {
		run(OsString::from(format!("--set-tag={k}={v}")))?;
	}

	// Artists are multi-value.
	for artist in track.track.artists() {
		run(OsString::from(format!("--set-tag=ARTIST={artist}")))?;
	}

	if let Some(cover) = cover {
		let mut arg = OsString::from("--import-picture-from=");
		arg.push(cover.as_os_str());
		run(arg)?;
	}

	Ok(())
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		Catalog,
		tool::fake::FakeRunner,
	};

	/// # Test Catalog.
	fn catalog() -> Catalog {
		Catalog::from_json(r#"[{
			"disc_volume_key_sha1": "abc123",
			"bluray_title": "Beethoven Complete",
			"makemkv_prefix": "BEETHOVEN",
			"albums": [{
				"album_number": 1,
				"album_title": "Symphony No.5",
				"album_artist": "Orchestra",
				"genre": "Classical",
				"release_date": "2020-01-31",
				"total_discs": 3,
				"discs": [{
					"disc_number": 2,
					"total_tracks": 4,
					"tracks": [
						{ "track_number": 1, "title_number": "00", "chapter_numbers": [0], "track_title": "I" },
						{ "track_number": 2, "title_number": "00", "chapter_numbers": [1], "track_title": "II" },
						{
							"track_number": 3,
							"title_number": "00",
							"chapter_numbers": [2],
							"track_title": "Allegro = Fast",
							"artists": ["Orchestra", "Conductor"]
						},
						{ "track_number": 4, "title_number": "00", "chapter_numbers": [3], "track_title": "IV" }
					]
				}]
			}]
		}]"#).expect("Catalog failed.")
	}

	#[test]
	fn t_tag_track() {
		let catalog = catalog();
		let entry = catalog.find("abc123").expect("Missing disc.");
		let track = entry.tracks().nth(2).expect("Missing track.");
		let runner = FakeRunner::default();

		tag_track(&runner, Path::new("a.flac"), &track, Some(Path::new("/x/cover.png")))
			.expect("Tagging failed.");

		let calls = runner.calls_for(Tool::Metaflac);
		let args: Vec<&str> = calls.iter()
			.map(|c| {
				assert_eq!(c.len(), 2, "Each call should handle one thing.");
				assert_eq!(c[1], "a.flac", "Each call should target the file.");
				c[0].as_str()
			})
			.collect();
		assert_eq!(args, vec![
			"--remove-all-tags",
			"--set-tag=ALBUM=Symphony No.5",
			"--set-tag=ALBUMARTIST=Orchestra",
			"--set-tag=GENRE=Classical",
			"--set-tag=DATE=2020-01-31",
			"--set-tag=TRACKNUMBER=3",
			"--set-tag=DISCNUMBER=2",
			"--set-tag=TOTALDISCS=3",
			"--set-tag=TOTALTRACKS=4",
			"--set-tag=TITLE=Allegro = Fast",
			"--set-tag=ARTIST=Orchestra",
			"--set-tag=ARTIST=Conductor",
			"--import-picture-from=/x/cover.png",
		]);
	}

	#[test]
	fn t_tag_track_no_extras() {
		let catalog = catalog();
		let entry = catalog.find("abc123").expect("Missing disc.");
		let track = entry.tracks().next().expect("Missing track.");
		let runner = FakeRunner::default();

		tag_track(&runner, Path::new("a.flac"), &track, None).expect("Tagging failed.");
		let calls = runner.calls_for(Tool::Metaflac);
		assert_eq!(calls.len(), 10, "No artists or cover means no extra calls.");
		assert!(calls.iter().all(|c| ! c[0].starts_with("--set-tag=ARTIST=")));
		assert!(calls.iter().all(|c| ! c[0].starts_with("--import-picture-from=")));
	}

	#[test]
	fn t_tag_track_failure() {
		let catalog = catalog();
		let entry = catalog.find("abc123").expect("Missing disc.");
		let track = entry.tracks().nth(2).expect("Missing track.");

		// Fail partway; the earlier calls are not undone.
		let runner = FakeRunner {
			fail: Some((Tool::Metaflac, 4)),
			..FakeRunner::default()
		};
		assert_eq!(
			tag_track(&runner, Path::new("a.flac"), &track, None),
			Err(BdFlacError::Tool(Tool::Metaflac)),
		);
		let calls = runner.calls_for(Tool::Metaflac);
		assert_eq!(calls.len(), 5, "Tagging should stop at the first failure.");
		assert_eq!(calls[0][0], "--remove-all-tags");
	}

	#[test]
	fn t_compress() {
		let runner = FakeRunner::default();
		compress(&runner, Path::new("a.flac")).expect("Compression failed.");
		assert_eq!(runner.calls_for(Tool::Flac), vec![vec!["-8f".to_owned(), "a.flac".to_owned()]]);

		let runner = FakeRunner {
			fail: Some((Tool::Flac, 0)),
			..FakeRunner::default()
		};
		assert_eq!(compress(&runner, Path::new("a.flac")), Err(BdFlacError::Tool(Tool::Flac)));
	}
}
