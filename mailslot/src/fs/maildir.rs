use std::{
	fs, io,
	path::{Path, PathBuf},
	time::SystemTime,
};

use gethostname::gethostname;
use rand::Rng;
use thiserror::Error;

/// Messages are written here first...
pub const TMP: &str = "tmp";
/// ...and renamed into here once they're complete.
pub const NEW: &str = "new";
/// Where readers move messages they've seen. We only make sure it exists.
pub const CUR: &str = "cur";

/// A maildir we deliver into. Writing and renaming is left to the caller; see
/// `net::receive_message`.
#[derive(Clone, Debug)]
pub struct Maildir {
	tmp: PathBuf,
	new: PathBuf,
}

impl Maildir {
	/// Opens the maildir at `base`, creating `tmp`, `new`, and `cur` if they
	/// don't exist. `base` itself has to exist already.
	pub fn open<B: Into<PathBuf>>(base: B) -> Result<Self, MaildirError> {
		let base = base.into();
		Self::check_directory(&base)?;

		for name in [TMP, NEW, CUR] {
			let sub = base.join(name);

			match fs::metadata(&sub) {
				Ok(_) => Self::check_directory(&sub)?,
				Err(err) if err.kind() == io::ErrorKind::NotFound => {
					fs::create_dir(&sub).map_err(|source| MaildirError::Create {
						path: sub.clone(),
						source,
					})?
				}
				Err(source) => return Err(MaildirError::Unreadable { path: sub, source }),
			}
		}

		Ok(Self {
			tmp: base.join(TMP),
			new: base.join(NEW),
		})
	}

	fn check_directory(path: &Path) -> Result<(), MaildirError> {
		let meta = fs::metadata(path).map_err(|source| MaildirError::Unreadable {
			path: path.to_owned(),
			source,
		})?;

		if meta.is_dir() {
			Ok(())
		} else {
			Err(MaildirError::NotADirectory(path.to_owned()))
		}
	}

	pub fn tmp_dir(&self) -> &Path {
		&self.tmp
	}

	pub fn new_dir(&self) -> &Path {
		&self.new
	}
}

/// A file name that won't collide with any other we hand out, here or in
/// another session. Seconds, then microseconds and 64 random bits, then the host.
pub fn unique_name() -> String {
	// A clock before the epoch only costs us the time part of the name
	let time = SystemTime::now()
		.duration_since(SystemTime::UNIX_EPOCH)
		.unwrap_or_default();
	let random: u64 = rand::thread_rng().gen();
	let hostname = gethostname()
		.to_string_lossy()
		.replace('/', "\\057")
		.replace(':', "\\072");

	format!(
		"{}.M{}R{:016x}.{}",
		time.as_secs(),
		time.subsec_micros(),
		random,
		hostname
	)
}

#[derive(Debug, Error)]
pub enum MaildirError {
	#[error("could not read {path}: {source}")]
	Unreadable { path: PathBuf, source: io::Error },
	#[error("not a directory: {0}")]
	NotADirectory(PathBuf),
	#[error("could not create {path}: {source}")]
	Create { path: PathBuf, source: io::Error },
}
