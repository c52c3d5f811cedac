/*!
# bdflac: Ripping

The titles are ripped to MKV by `makemkvcon`, either straight from a drive
or from a decrypted backup folder.
*/

use crate::{
	BdFlacError,
	Tool,
	ToolRunner,
};
use std::{
	ffi::OsString,
	path::Path,
};



/// # Rip Disc.
///
/// Rip every title from drive number `idx` into `dst`, creating the folder
/// if needed.
///
/// ## Errors
///
/// This will return an error if the folder cannot be created or
/// `makemkvcon` fails.
pub fn rip_disc<R>(runner: &R, idx: u8, dst: &Path) -> Result<(), BdFlacError>
where R: ToolRunner + ?Sized {
	rip(runner, OsString::from(format!("disc:{idx}")), dst)
}

/// # Rip Backup.
///
/// Rip every title from the decrypted backup at `root` (the folder holding
/// `BDMV/`) into `dst`, creating the folder if needed.
///
/// ## Errors
///
/// This will return an error if the folder cannot be created or
/// `makemkvcon` fails.
pub fn rip_backup<R>(runner: &R, root: &Path, dst: &Path) -> Result<(), BdFlacError>
where R: ToolRunner + ?Sized {
	let mut src = OsString::from("file:");
	src.push(root.join("BDMV").join("index.bdmv"));
	rip(runner, src, dst)
}

/// # Rip.
fn rip<R>(runner: &R, src: OsString, dst: &Path) -> Result<(), BdFlacError>
where R: ToolRunner + ?Sized {
	std::fs::create_dir_all(dst)
		.map_err(|_| BdFlacError::Write(dst.to_string_lossy().into_owned()))?;

	runner.run_ok(Tool::Makemkvcon, &[
		OsString::from("mkv"),
		OsString::from("--minlength=0"),
		src,
		OsString::from("all"),
		dst.as_os_str().to_owned(),
	]).map(|_| ())
}
