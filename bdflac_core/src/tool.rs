/*!
# bdflac: External Tools
*/

use crate::BdFlacError;
use std::{
	ffi::OsString,
	fmt,
	process::{
		Command,
		Stdio,
	},
};



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # External Tool.
///
/// All the heavy lifting is done by other programs; these are the ones we
/// talk to.
pub enum Tool {
	/// # Transcoder.
	Ffmpeg,

	/// # Prober.
	Ffprobe,

	/// # FLAC Encoder.
	Flac,

	/// # Disc Ripper.
	Makemkvcon,

	/// # FLAC Tag Editor.
	Metaflac,

	/// # Mount Table.
	Mount,
}

impl AsRef<str> for Tool {
	#[inline]
	fn as_ref(&self) -> &str { self.as_str() }
}

impl fmt::Display for Tool {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Tool {
	#[must_use]
	/// # Executable Name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Ffmpeg => "ffmpeg",
			Self::Ffprobe => "ffprobe",
			Self::Flac => "flac",
			Self::Makemkvcon => "makemkvcon",
			Self::Metaflac => "metaflac",
			Self::Mount => "mount",
		}
	}
}



#[derive(Debug, Clone, Default)]
/// # Tool Output.
pub struct ToolOutput {
	/// # Exited Successfully?
	pub success: bool,

	/// # STDOUT (Lossy).
	pub stdout: String,
}



/// # Tool Runner.
///
/// Everything that spawns an external program does so through this trait,
/// so tests can swap in a fake.
pub trait ToolRunner {
	/// # Run.
	///
	/// Run `tool` with `args`, blocking until it exits.
	///
	/// An unsuccessful exit is _not_ an error here; see [`ToolRunner::run_ok`]
	/// for that.
	///
	/// ## Errors
	///
	/// This will return an error if the program cannot be found or spawned.
	fn run(&self, tool: Tool, args: &[OsString]) -> Result<ToolOutput, BdFlacError>;

	/// # Run (Strict).
	///
	/// Same as [`ToolRunner::run`], but treat a non-zero exit as an error,
	/// returning STDOUT otherwise.
	///
	/// ## Errors
	///
	/// This will return an error if the program cannot be run or fails.
	fn run_ok(&self, tool: Tool, args: &[OsString]) -> Result<String, BdFlacError> {
		let out = self.run(tool, args)?;
		if out.success { Ok(out.stdout) }
		else { Err(BdFlacError::Tool(tool)) }
	}
}



#[derive(Debug, Clone, Copy, Default)]
/// # System Runner.
///
/// Look up programs in the `PATH` and run them for real.
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
	fn run(&self, tool: Tool, args: &[OsString]) -> Result<ToolOutput, BdFlacError> {
		let exe = which::which(tool.as_str())
			.map_err(|_| BdFlacError::ToolMissing(tool))?;

		let out = Command::new(exe)
			.args(args)
			.stdin(Stdio::null())
			.stderr(Stdio::null())
			.output()
			.map_err(|_| BdFlacError::ToolMissing(tool))?;

		Ok(ToolOutput {
			success: out.status.success(),
			stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
		})
	}
}






#[cfg(test)]
mod test {
	use super::*;
	use fake::FakeRunner;

	#[test]
	fn t_run_ok() {
		let runner = FakeRunner {
			fail: Some((Tool::Flac, 1)),
			..FakeRunner::default()
		};
		let args = [OsString::from("foo.flac")];
		assert!(runner.run_ok(Tool::Flac, &args).is_ok(), "The first call should pass.");
		assert_eq!(
			runner.run_ok(Tool::Flac, &args),
			Err(BdFlacError::Tool(Tool::Flac)),
			"The second call should fail.",
		);
		assert!(runner.run_ok(Tool::Flac, &args).is_ok(), "The third call should pass.");
		assert_eq!(runner.calls_for(Tool::Flac).len(), 3);
	}

	#[test]
	fn t_tool_names() {
		for (t, s) in [
			(Tool::Ffmpeg, "ffmpeg"),
			(Tool::Ffprobe, "ffprobe"),
			(Tool::Flac, "flac"),
			(Tool::Makemkvcon, "makemkvcon"),
			(Tool::Metaflac, "metaflac"),
			(Tool::Mount, "mount"),
		] {
			assert_eq!(t.as_str(), s);
			assert_eq!(t.to_string(), s);
		}
	}
}
