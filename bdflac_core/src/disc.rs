/*!
# bdflac: Disc Identity

Blu-rays are identified by the SHA-1 of their AACS volume key file. When
working straight from a drive, we first need to figure out where the disc is
mounted, which takes a little help from the ripper and the OS.
*/

use crate::{
	BdFlacError,
	KEY_FILE,
	KEY_FILE_DIR,
	Tool,
	ToolRunner,
};
use regex::Regex;
use sha1::{
	Digest,
	Sha1,
};
use std::{
	ffi::OsString,
	fs::File,
	path::{
		Path,
		PathBuf,
	},
};



/// # Fingerprint.
///
/// Return the lowercase hex SHA-1 of `<root>/AACS/Unit_Key_RO.inf`.
///
/// ## Errors
///
/// If the key file is missing or unreadable (i.e. this isn't a protected
/// Blu-ray), an error is returned.
pub fn fingerprint(root: &Path) -> Result<String, BdFlacError> {
	let src = root.join(KEY_FILE_DIR).join(KEY_FILE);
	let err = || BdFlacError::KeyFile(src.to_string_lossy().into_owned());

	let mut file = File::open(&src).map_err(|_| err())?;
	let mut hasher = Sha1::new();
	std::io::copy(&mut file, &mut hasher).map_err(|_| err())?;

	Ok(hex::encode(hasher.finalize()))
}

/// # Drive Device.
///
/// Ask `makemkvcon` for the device path of drive number `idx`.
///
/// The info command exits non-zero more often than not, so its status is
/// ignored; all that matters is whether or not the relevant line turned up.
///
/// ## Errors
///
/// This will return an error if `makemkvcon` cannot be run or has nothing to
/// say about the drive, or if the drive is empty.
pub fn drive_device<R>(runner: &R, idx: u8) -> Result<String, BdFlacError>
where R: ToolRunner + ?Sized {
	let args = [OsString::from("-r"), OsString::from("info")];
	let out = runner.run(Tool::Makemkvcon, &args)?;

	let prefix = format!("DRV:{idx},");
	out.stdout.lines()
		.find(|line| line.starts_with(&prefix))
		.and_then(parse_drv_line)
		.ok_or(BdFlacError::Device(idx))
}

#[must_use]
/// # Parse Drive Line.
///
/// `makemkvcon -r info` drive lines are comma-separated, with quoted text
/// fields. The seventh field holds the device path, which is empty when
/// there's no disc in the drive.
///
/// ```
/// use bdflac_core::parse_drv_line;
///
/// assert_eq!(
///     parse_drv_line(r#"DRV:0,2,999,1,"BD-RE ASUS","MY_DISC","/dev/sr0""#),
///     Some("/dev/sr0".to_owned()),
/// );
/// assert_eq!(parse_drv_line(r#"DRV:1,256,999,0,"","","""#), None);
/// ```
pub fn parse_drv_line(line: &str) -> Option<String> {
	let mut fields = Vec::new();
	let mut field = String::new();
	let mut quoted = false;
	let mut chars = line.trim_end().chars().peekable();
	while let Some(c) = chars.next() {
		match c {
			'"' if quoted && chars.peek() == Some(&'"') => {
				field.push('"');
				chars.next();
			},
			'"' => { quoted = ! quoted; },
			',' if ! quoted => { fields.push(std::mem::take(&mut field)); },
			c => { field.push(c); },
		}
	}
	fields.push(field);

	fields.into_iter().nth(6).filter(|v| ! v.is_empty())
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Mount Table Flavor.
///
/// The `mount` output differs a little from platform to platform.
pub enum MountFlavor {
	/// # Linux/Android.
	///
	/// `/dev/sr0 on /media/disc type udf (ro,nosuid,nodev)`
	Linux,

	/// # BSD.
	///
	/// `/dev/cd0 on /mnt/disc (udf, local, read-only)`
	Bsd,

	/// # macOS.
	///
	/// Same as BSD, except `makemkvcon` reports raw `/dev/rdisk` devices.
	MacOs,
}

impl MountFlavor {
	#[must_use]
	/// # Native Flavor.
	///
	/// Return the flavor for the current platform, if mount lookups are
	/// supported.
	pub const fn native() -> Option<Self> {
		if cfg!(any(target_os = "linux", target_os = "android")) { Some(Self::Linux) }
		else if cfg!(target_os = "macos") { Some(Self::MacOs) }
		else if cfg!(any(
			target_os = "dragonfly",
			target_os = "freebsd",
			target_os = "netbsd",
			target_os = "openbsd",
		)) { Some(Self::Bsd) }
		else { None }
	}

	/// # Trailing Noise.
	///
	/// The pattern matching everything after the mount point.
	const fn suffix(self) -> &'static str {
		match self {
			Self::Linux => r"\stype\s\S+\s\([^()]*\)$",
			Self::Bsd | Self::MacOs => r"\s\([^()]*\)$",
		}
	}
}

/// # Mount Point.
///
/// Find the mount point for drive number `idx`.
///
/// On Windows the device is a drive letter, which is good enough as-is.
/// Everywhere else the `mount` table is consulted.
///
/// ## Errors
///
/// This will return an error if the device cannot be determined, the mount
/// table cannot be read, the device isn't mounted, or the platform is
/// unsupported.
pub fn mount_point<R>(runner: &R, idx: u8) -> Result<PathBuf, BdFlacError>
where R: ToolRunner + ?Sized {
	let device = drive_device(runner, idx)?;

	if cfg!(windows) {
		return Ok(PathBuf::from(format!("{device}{}", std::path::MAIN_SEPARATOR)));
	}

	let flavor = MountFlavor::native().ok_or(BdFlacError::MountUnsupported)?;
	let table = runner.run_ok(Tool::Mount, &[])?;
	parse_mount_table(&table, &device, flavor)
}

/// # Parse Mount Table.
///
/// Find the line for `device` in the output of `mount` and return the mount
/// point from it.
///
/// ## Errors
///
/// This will return an error if the device has no entry.
pub fn parse_mount_table(table: &str, device: &str, flavor: MountFlavor)
-> Result<PathBuf, BdFlacError> {
	let err = || BdFlacError::MountPoint(device.to_owned());
	if device.is_empty() { return Err(err()); }

	let device =
		if matches!(flavor, MountFlavor::MacOs) { device.replacen("/dev/rdisk", "/dev/disk", 1) }
		else { device.to_owned() };
	let prefix = format!("{device} on ");

	let line = table.lines()
		.find_map(|line| line.strip_prefix(&prefix))
		.ok_or_else(err)?;

	let re = Regex::new(flavor.suffix()).map_err(|_| err())?;
	let point = re.replace(line.trim_end(), "");
	if point.is_empty() { Err(err()) }
	else { Ok(PathBuf::from(point.as_ref())) }
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::tool::fake::FakeRunner;

	const DRV: &str = r#"MSG:1005,0,1,"MakeMKV v1.17.5 linux(x64-release) started","%1 started","MakeMKV v1.17.5 linux(x64-release)"
DRV:0,2,999,12,"BD-RE HL-DT-ST BD-RE  WH16NS60 1.02 KLAM6E83216","BEETHOVEN","/dev/sr0"
DRV:1,256,999,0,"","",""
DRV:10,2,999,12,"BD-RE Other","OTHER, DISC","/dev/sr10"
MSG:5010,0,0,"Failed to open disc","Failed to open disc"
"#;

	#[test]
	fn t_fingerprint() {
		let dir = tempfile::tempdir().expect("Tempdir failed.");
		assert!(matches!(
			fingerprint(dir.path()),
			Err(BdFlacError::KeyFile(_)),
		), "A missing key file should fail.");

		std::fs::create_dir(dir.path().join("AACS")).expect("Mkdir failed.");
		std::fs::write(dir.path().join("AACS/Unit_Key_RO.inf"), b"hello")
			.expect("Write failed.");
		assert_eq!(
			fingerprint(dir.path()).as_deref(),
			Ok("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"),
		);
	}

	#[test]
	fn t_parse_drv_line() {
		let lines: Vec<&str> = DRV.lines().collect();
		assert_eq!(parse_drv_line(lines[1]), Some("/dev/sr0".to_owned()));
		assert_eq!(parse_drv_line(lines[2]), None, "Empty drives have no device.");
		assert_eq!(
			parse_drv_line(lines[3]),
			Some("/dev/sr10".to_owned()),
			"Quoted commas should not split fields.",
		);
		assert_eq!(parse_drv_line("DRV:0,2"), None, "Short lines have no device.");
		assert_eq!(
			parse_drv_line(r#"DRV:0,2,999,12,"A ""B"" C","T","/dev/sr0""#),
			Some("/dev/sr0".to_owned()),
			"Escaped quotes should be handled.",
		);
	}

	#[test]
	fn t_drive_device() {
		let runner = FakeRunner {
			stdout: [(Tool::Makemkvcon, DRV.to_owned())].into_iter().collect(),
			sloppy: vec![Tool::Makemkvcon],
			..FakeRunner::default()
		};

		assert_eq!(drive_device(&runner, 0), Ok("/dev/sr0".to_owned()), "Exit status should be ignored.");
		assert_eq!(drive_device(&runner, 1), Err(BdFlacError::Device(1)));
		assert_eq!(drive_device(&runner, 10), Ok("/dev/sr10".to_owned()), "DRV:1 should not match DRV:10.");
		assert_eq!(drive_device(&runner, 5), Err(BdFlacError::Device(5)));

		assert_eq!(
			runner.calls_for(Tool::Makemkvcon)[0],
			vec!["-r".to_owned(), "info".to_owned()],
		);
	}

	#[test]
	fn t_parse_mount_table() {
		let linux = "sysfs on /sys type sysfs (rw,nosuid,nodev,noexec,relatime)
/dev/sr01 on /wrong type udf (ro)
/dev/sr0 on /run/media/josh/BEETHOVEN COMPLETE type udf (ro,nosuid,nodev,relatime,uid=1000,gid=1000,iocharset=utf8,uhelper=udisks2)
";
		assert_eq!(
			parse_mount_table(linux, "/dev/sr0", MountFlavor::Linux),
			Ok(PathBuf::from("/run/media/josh/BEETHOVEN COMPLETE")),
		);
		assert_eq!(
			parse_mount_table(linux, "/dev/sr1", MountFlavor::Linux),
			Err(BdFlacError::MountPoint("/dev/sr1".to_owned())),
		);
		assert!(parse_mount_table(linux, "", MountFlavor::Linux).is_err());

		let bsd = "/dev/ada0p2 on / (ufs, local, soft-updates)
/dev/cd0 on /mnt/blu ray (udf, local, read-only)
";
		assert_eq!(
			parse_mount_table(bsd, "/dev/cd0", MountFlavor::Bsd),
			Ok(PathBuf::from("/mnt/blu ray")),
		);

		let mac = "/dev/disk1s1 on / (apfs, local, journaled)
/dev/disk4 on /Volumes/BEETHOVEN (udf, local, nodev, nosuid, read-only, noowners)
";
		assert_eq!(
			parse_mount_table(mac, "/dev/rdisk4", MountFlavor::MacOs),
			Ok(PathBuf::from("/Volumes/BEETHOVEN")),
			"Raw disk paths should be swapped.",
		);
		assert!(
			parse_mount_table(mac, "/dev/rdisk4", MountFlavor::Bsd).is_err(),
			"Only macOS gets the raw disk fix.",
		);
	}

	#[cfg(any(target_os = "linux", target_os = "android"))]
	#[test]
	fn t_mount_point() {
		let runner = FakeRunner {
			stdout: [
				(Tool::Makemkvcon, DRV.to_owned()),
				(Tool::Mount, "/dev/sr0 on /media/disc type udf (ro,relatime)\n".to_owned()),
			].into_iter().collect(),
			sloppy: vec![Tool::Makemkvcon],
			..FakeRunner::default()
		};

		assert_eq!(mount_point(&runner, 0), Ok(PathBuf::from("/media/disc")));
		assert_eq!(
			mount_point(&runner, 10),
			Err(BdFlacError::MountPoint("/dev/sr10".to_owned())),
		);
		assert_eq!(mount_point(&runner, 1), Err(BdFlacError::Device(1)));
	}
}
