/*!
# bdflac: Chapter Probing

Chapter boundaries come from `ffprobe`'s "flat" output, which looks like:

```text
chapters.chapter.0.id=0
chapters.chapter.0.time_base="1/1000000000"
chapters.chapter.0.start=0
chapters.chapter.0.start_time="0.000000"
chapters.chapter.0.end=302135000000
chapters.chapter.0.end_time="302.135000"
chapters.chapter.0.tags.title="Chapter 01"
```
*/

use crate::{
	AHASHER,
	BdFlacError,
	DiscEntry,
	mkv_path,
	Tool,
	ToolRunner,
};
use std::{
	collections::HashMap,
	ffi::OsString,
	path::Path,
};



/// # Title Chapters.
///
/// Probed chapters keyed by title number.
pub type TitleChapters = HashMap<String, Chapters, ahash::RandomState>;



#[derive(Debug, Clone, Copy, PartialEq)]
/// # Chapter.
///
/// A time range within a title.
pub struct Chapter {
	/// # Index.
	pub index: u32,

	/// # Start (Seconds).
	pub start: f64,

	/// # End (Seconds).
	pub end: f64,

	/// # Real Chapter?
	///
	/// This is `false` for the whole-file stand-in used when a title has no
	/// chapter markers at all.
	pub is_chapter: bool,
}

impl Chapter {
	#[must_use]
	/// # Duration (Seconds).
	pub fn duration(&self) -> f64 { self.end - self.start }
}



#[derive(Debug, Clone, Default, PartialEq)]
/// # Chapters.
///
/// The chapters of a single title, in the order reported.
pub struct Chapters(Vec<Chapter>);

impl From<Vec<Chapter>> for Chapters {
	#[inline]
	fn from(src: Vec<Chapter>) -> Self { Self(src) }
}

impl Chapters {
	#[must_use]
	/// # Get By Index.
	pub fn get(&self, index: u32) -> Option<&Chapter> {
		self.0.iter().find(|c| c.index == index)
	}

	#[must_use]
	/// # As Slice.
	pub fn as_slice(&self) -> &[Chapter] { &self.0 }
}



#[derive(Debug, Default)]
/// # Chapter Being Parsed.
struct PartialChapter {
	index: u32,
	start: Option<f64>,
	end: Option<f64>,
}

impl PartialChapter {
	/// # Finish.
	fn finish(self) -> Result<Chapter, BdFlacError> {
		let start = self.start.ok_or_else(|| BdFlacError::ProbeParse(
			format!("chapter {} has no start_time.", self.index)
		))?;
		let end = self.end.ok_or_else(|| BdFlacError::ProbeParse(
			format!("chapter {} has no end_time.", self.index)
		))?;
		if end < start {
			return Err(BdFlacError::ProbeParse(
				format!("chapter {} ends before it starts.", self.index)
			));
		}

		Ok(Chapter {
			index: self.index,
			start,
			end,
			is_chapter: true,
		})
	}
}



/// # Parse Chapter Stream.
///
/// Parse the output of `ffprobe -print_format flat -show_chapters`. Lines are
/// grouped by the chapter index embedded in the key; each time the index
/// changes, the previous chapter is closed out.
///
/// Only `start_time` and `end_time` are used, and both are required. Empty
/// output means there are no chapters.
///
/// ## Errors
///
/// This will return an error if any line is malformed, a chapter is missing
/// its bounds, or an index turns up twice.
pub fn parse_chapter_stream(text: &str) -> Result<Vec<Chapter>, BdFlacError> {
	let mut out: Vec<Chapter> = Vec::new();
	let mut current: Option<PartialChapter> = None;

	for line in text.lines().map(str::trim).filter(|l| ! l.is_empty()) {
		let (index, key, value) = split_line(line)?;

		// Close out the last chapter if we've moved on.
		if current.as_ref().map_or(true, |c| c.index != index) {
			if let Some(last) = current.take() { out.push(last.finish()?); }
			if out.iter().any(|c| c.index == index) {
				return Err(BdFlacError::ProbeParse(format!("chapter {index} is repeated.")));
			}
			current.replace(PartialChapter { index, ..PartialChapter::default() });
		}

		let Some(chapter) = current.as_mut() else { continue; };
		match key {
			"start_time" => { chapter.start.replace(parse_time(line, value)?); },
			"end_time" => { chapter.end.replace(parse_time(line, value)?); },
			_ => {},
		}
	}

	if let Some(last) = current { out.push(last.finish()?); }
	Ok(out)
}

/// # Parse Duration.
///
/// Pull the `duration=<secs>` value out of the output of
/// `ffprobe -show_entries format=duration`.
///
/// ## Errors
///
/// This will return an error if there is no (usable) duration.
pub fn parse_duration(text: &str) -> Result<f64, BdFlacError> {
	let line = text.lines()
		.map(str::trim)
		.find(|l| l.starts_with("duration="))
		.ok_or_else(|| BdFlacError::ProbeParse("no duration found.".to_owned()))?;

	let value = parse_time(line, &line[9..])?;
	if 0.0 < value { Ok(value) }
	else { Err(BdFlacError::ProbeParse(format!("{line:?} is not a usable duration."))) }
}

/// # Probe Title.
///
/// Run `ffprobe` against a title file to find its chapters. If it has none,
/// the file's duration is probed instead and returned as a single
/// whole-file record with `is_chapter` set to `false`.
///
/// ## Errors
///
/// This will return an error if the file is missing, `ffprobe` fails, or its
/// output cannot be parsed.
pub fn probe_title<R>(runner: &R, src: &Path) -> Result<Chapters, BdFlacError>
where R: ToolRunner + ?Sized {
	let err = |e: BdFlacError|
		if matches!(e, BdFlacError::ToolMissing(_)) { e }
		else { BdFlacError::Probe(src.to_string_lossy().into_owned()) };

	if ! src.is_file() { return Err(err(BdFlacError::Noop)); }

	let raw = runner.run_ok(Tool::Ffprobe, &[
		OsString::from("-v"),
		OsString::from("quiet"),
		OsString::from("-print_format"),
		OsString::from("flat"),
		OsString::from("-show_chapters"),
		src.as_os_str().to_owned(),
	]).map_err(err)?;

	let chapters = parse_chapter_stream(&raw)?;
	if ! chapters.is_empty() { return Ok(Chapters(chapters)); }

	// Fall back to the duration.
	let raw = runner.run_ok(Tool::Ffprobe, &[
		OsString::from("-v"),
		OsString::from("quiet"),
		OsString::from("-show_entries"),
		OsString::from("format=duration"),
		src.as_os_str().to_owned(),
	]).map_err(err)?;

	let end = parse_duration(&raw)?;
	Ok(Chapters(vec![Chapter {
		index: 0,
		start: 0.0,
		end,
		is_chapter: false,
	}]))
}

/// # Probe All Titles.
///
/// Probe each distinct title referenced by the disc's tracks, exactly once.
///
/// ## Errors
///
/// This will return an error if any title fails to probe.
pub fn probe_all_titles<R>(runner: &R, mkv_dir: &Path, entry: &DiscEntry)
-> Result<TitleChapters, BdFlacError>
where R: ToolRunner + ?Sized {
	let mut out = TitleChapters::with_hasher(AHASHER);
	for title in entry.title_numbers() {
		let src = mkv_path(mkv_dir, entry.prefix(), title);
		let chapters = probe_title(runner, &src)?;
		out.insert(title.to_owned(), chapters);
	}
	Ok(out)
}



/// # Split Line.
///
/// Break `chapters.chapter.<N>.<key>=<value>` into its parts, unquoting the
/// value.
fn split_line(line: &str) -> Result<(u32, &str, &str), BdFlacError> {
	let bad = || BdFlacError::ProbeParse(format!("{line:?} is not a chapter line."));

	let (key, value) = line.split_once('=').ok_or_else(bad)?;
	let rest = key.strip_prefix("chapters.chapter.").ok_or_else(bad)?;
	let (index, key) = rest.split_once('.').ok_or_else(bad)?;
	if index.is_empty() || key.is_empty() || ! index.bytes().all(|b| b.is_ascii_digit()) {
		return Err(bad());
	}
	let index: u32 = index.parse().map_err(|_| bad())?;

	let value = value.strip_prefix('"')
		.and_then(|v| v.strip_suffix('"'))
		.unwrap_or(value);

	Ok((index, key, value))
}

/// # Parse Time.
fn parse_time(line: &str, value: &str) -> Result<f64, BdFlacError> {
	let value = value.trim().trim_matches('"');
	value.parse::<f64>()
		.ok()
		.filter(|v| v.is_finite() && 0.0 <= *v)
		.ok_or_else(|| BdFlacError::ProbeParse(format!("{line:?} has an invalid time.")))
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		Catalog,
		tool::fake::FakeRunner,
	};

	/// # Four Chapters.
	const FOUR: &str = r#"chapters.chapter.0.id=0
chapters.chapter.0.time_base="1/1000000000"
chapters.chapter.0.start=0
chapters.chapter.0.start_time="0.000000"
chapters.chapter.0.end=100000000000
chapters.chapter.0.end_time="100.000000"
chapters.chapter.0.tags.title="Chapter 01"
chapters.chapter.1.id=1
chapters.chapter.1.start_time="100.000000"
chapters.chapter.1.end_time="250.500000"
chapters.chapter.2.id=2
chapters.chapter.2.start_time="250.500000"
chapters.chapter.2.end_time="400.250000"
chapters.chapter.3.id=3
chapters.chapter.3.start_time="400.250000"
chapters.chapter.3.end_time="512.000000"
chapters.chapter.4.id=4
chapters.chapter.4.start_time="512.000000"
chapters.chapter.4.end_time="600.000000"
"#;

	#[test]
	fn t_parse_empty() {
		assert_eq!(parse_chapter_stream(""), Ok(Vec::new()));
		assert_eq!(parse_chapter_stream("\n\n  \n"), Ok(Vec::new()));
	}

	#[test]
	fn t_parse_single() {
		let raw = "chapters.chapter.0.start_time=\"1.5\"\r\nchapters.chapter.0.end_time=3.25\r\n";
		let chapters = parse_chapter_stream(raw).expect("Parse failed.");
		assert_eq!(chapters, vec![Chapter { index: 0, start: 1.5, end: 3.25, is_chapter: true }]);
		assert_eq!(chapters[0].duration(), 1.75);
	}

	#[test]
	fn t_parse_multi() {
		let chapters = parse_chapter_stream(FOUR).expect("Parse failed.");
		assert_eq!(chapters.len(), 5);
		for (i, c) in chapters.iter().enumerate() {
			assert_eq!(c.index as usize, i, "Chapters should stay in order.");
			assert!(c.is_chapter, "Probed chapters are real chapters.");
		}
		assert_eq!(chapters[2].start, 250.5);
		assert_eq!(chapters[2].end, 400.25);
		assert_eq!(chapters[2].duration(), 149.75);

		// Non-zero starting index.
		let raw = "chapters.chapter.7.start_time=\"0\"\nchapters.chapter.7.end_time=\"9\"\n";
		let chapters = parse_chapter_stream(raw).expect("Parse failed.");
		assert_eq!(chapters[0].index, 7);
	}

	#[test]
	fn t_parse_malformed() {
		for raw in [
			// No equals.
			"chapters.chapter.0.start_time\n",
			// Wrong prefix.
			"format.duration=\"1.0\"\n",
			"chapters.chapter=1\n",
			// Bad index.
			"chapters.chapter.x.start_time=0\n",
			"chapters.chapter.-1.start_time=0\n",
			"chapters.chapter..start_time=0\n",
			// Missing key.
			"chapters.chapter.0=1\n",
			// Missing bounds.
			"chapters.chapter.0.start_time=\"0\"\n",
			"chapters.chapter.0.end_time=\"1\"\n",
			"chapters.chapter.0.id=0\n",
			// Bad numbers.
			"chapters.chapter.0.start_time=\"abc\"\nchapters.chapter.0.end_time=\"1\"\n",
			"chapters.chapter.0.start_time=\"-1\"\nchapters.chapter.0.end_time=\"1\"\n",
			"chapters.chapter.0.start_time=\"inf\"\nchapters.chapter.0.end_time=\"1\"\n",
			// Backwards.
			"chapters.chapter.0.start_time=\"5\"\nchapters.chapter.0.end_time=\"1\"\n",
			// Repeated index.
			"chapters.chapter.0.start_time=0\nchapters.chapter.0.end_time=1\nchapters.chapter.1.start_time=1\nchapters.chapter.1.end_time=2\nchapters.chapter.0.id=0\n",
		] {
			assert!(
				matches!(parse_chapter_stream(raw), Err(BdFlacError::ProbeParse(_))),
				"Expected parse failure for {raw:?}.",
			);
		}
	}

	#[test]
	fn t_parse_duration() {
		assert_eq!(parse_duration("[FORMAT]\nduration=123.456000\n[/FORMAT]\n"), Ok(123.456));
		assert_eq!(parse_duration("duration=\"60\""), Ok(60.0));
		assert!(parse_duration("").is_err());
		assert!(parse_duration("duration=N/A\n").is_err());
		assert!(parse_duration("duration=0.000\n").is_err());
	}

	#[test]
	fn t_probe_title() {
		let dir = tempfile::tempdir().expect("Tempdir failed.");
		let chaptered = dir.path().join("chaptered.mkv");
		let plain = dir.path().join("plain.mkv");
		std::fs::write(&chaptered, b"").expect("Write failed.");
		std::fs::write(&plain, b"").expect("Write failed.");

		let runner = FakeRunner {
			chapters: [("chaptered.mkv".to_owned(), FOUR.to_owned())].into_iter().collect(),
			durations: [("plain.mkv".to_owned(), "[FORMAT]\nduration=42.5\n[/FORMAT]\n".to_owned())]
				.into_iter()
				.collect(),
			..FakeRunner::default()
		};

		let chapters = probe_title(&runner, &chaptered).expect("Probe failed.");
		assert_eq!(chapters.as_slice().len(), 5);
		assert_eq!(chapters.get(3).map(|c| c.start), Some(400.25));
		assert!(chapters.get(5).is_none());
		assert_eq!(runner.calls_for(Tool::Ffprobe).len(), 1, "Chaptered titles need one probe.");

		let chapters = probe_title(&runner, &plain).expect("Probe failed.");
		assert_eq!(
			chapters.as_slice(),
			&[Chapter { index: 0, start: 0.0, end: 42.5, is_chapter: false }],
			"Chapterless titles should fall back to the duration.",
		);

		let calls = runner.calls_for(Tool::Ffprobe);
		assert_eq!(calls.len(), 3);
		assert_eq!(calls[1][4], "-show_chapters");
		assert_eq!(calls[2][3], "format=duration");

		// Missing file.
		assert!(matches!(
			probe_title(&runner, &dir.path().join("missing.mkv")),
			Err(BdFlacError::Probe(_)),
		));
		assert_eq!(runner.calls_for(Tool::Ffprobe).len(), 3, "Missing files should not be probed.");

		// Tool failure.
		let runner = FakeRunner {
			fail: Some((Tool::Ffprobe, 0)),
			..FakeRunner::default()
		};
		assert!(matches!(probe_title(&runner, &plain), Err(BdFlacError::Probe(_))));
	}

	#[test]
	fn t_probe_all_titles() {
		let catalog = Catalog::from_json(r#"[{
			"disc_volume_key_sha1": "abc123",
			"bluray_title": "Test",
			"makemkv_prefix": "TEST",
			"albums": [{
				"album_number": 1,
				"album_title": "One",
				"album_artist": "Artist",
				"genre": "Rock",
				"release_date": "2001-02-03",
				"total_discs": 1,
				"discs": [{
					"disc_number": 1,
					"total_tracks": 3,
					"tracks": [
						{ "track_number": 1, "title_number": "00", "chapter_numbers": [0], "track_title": "A" },
						{ "track_number": 2, "title_number": "01", "chapter_numbers": [0], "track_title": "B" },
						{ "track_number": 3, "title_number": "00", "chapter_numbers": [1], "track_title": "C" }
					]
				}]
			}]
		}]"#).expect("Catalog failed.");
		let entry = catalog.find("abc123").expect("Missing disc.");

		let dir = tempfile::tempdir().expect("Tempdir failed.");
		std::fs::write(dir.path().join("TEST_t00.mkv"), b"").expect("Write failed.");

		let runner = FakeRunner {
			chapters: [("TEST_t00.mkv".to_owned(), FOUR.to_owned())].into_iter().collect(),
			durations: [("TEST_t01.mkv".to_owned(), "duration=10\n".to_owned())].into_iter().collect(),
			..FakeRunner::default()
		};

		// Title 01 is missing.
		assert!(matches!(
			probe_all_titles(&runner, dir.path(), entry),
			Err(BdFlacError::Probe(_)),
		));

		std::fs::write(dir.path().join("TEST_t01.mkv"), b"").expect("Write failed.");
		runner.calls.borrow_mut().clear();
		let all = probe_all_titles(&runner, dir.path(), entry).expect("Probe failed.");
		assert_eq!(all.len(), 2);
		assert_eq!(all.get("00").map(|c| c.as_slice().len()), Some(5));
		assert_eq!(all.get("01").map(|c| c.as_slice().len()), Some(1));

		// Title 00 is shared by two tracks but only probed once; title 01
		// needed a second (duration) probe.
		let calls = runner.calls_for(Tool::Ffprobe);
		assert_eq!(calls.len(), 3);
		assert_eq!(calls.iter().filter(|c| c.last().is_some_and(|v| v.ends_with("TEST_t00.mkv"))).count(), 1);
	}
}
