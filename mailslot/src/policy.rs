use std::{
	fs,
	io::{self, ErrorKind},
	path::{Path, PathBuf},
	sync::{PoisonError, RwLock, RwLockReadGuard},
};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

/// Domains we accept mail for, one per line.
pub const RCPTHOSTS: &str = "rcpthosts";
/// The name we greet with. Only the first non-blank line is read.
pub const DEFAULTHOST: &str = "defaulthost";

/// The relay-authorization store. Loaded from a config directory holding
/// `rcpthosts` and, optionally, `defaulthost`.
pub struct RelayPolicy {
	directory: PathBuf,
	hosts: RwLock<Hosts>,
}

#[derive(Clone, Debug, PartialEq)]
struct Hosts {
	default_host: Option<String>,
	// Never empty. When a default host is set it sits at index 0.
	accepted: Vec<String>,
}

impl RelayPolicy {
	pub fn load<P: Into<PathBuf>>(directory: P) -> Result<Self, ConfigError> {
		let directory = directory.into();
		let hosts = Hosts::read(&directory)?;

		Ok(Self {
			directory,
			hosts: RwLock::new(hosts),
		})
	}

	/// A snapshot of the accepted domains, default host first if there is one.
	pub fn accepted_domains(&self) -> Vec<String> {
		self.read().accepted.clone()
	}

	fn read(&self) -> RwLockReadGuard<'_, Hosts> {
		self.hosts.read().unwrap_or_else(PoisonError::into_inner)
	}
}

impl Config for RelayPolicy {
	fn accepts_domain(&self, domain: &str) -> bool {
		self.read().accepted.iter().any(|host| host == domain)
	}

	fn default_host(&self) -> String {
		let hosts = self.read();

		match &hosts.default_host {
			Some(host) => host.clone(),
			None => hosts.accepted.first().cloned().unwrap_or_default(),
		}
	}

	/// The old policy stays in place if anything goes wrong.
	fn reload(&self) -> Result<(), ConfigError> {
		let mut hosts = self.hosts.write().unwrap_or_else(PoisonError::into_inner);
		let fresh = Hosts::read(&self.directory)?;

		info!(
			directory = %self.directory.display(),
			domains = fresh.accepted.len(),
			"relay policy reloaded"
		);
		*hosts = fresh;

		Ok(())
	}
}

impl Hosts {
	fn read(directory: &Path) -> Result<Self, ConfigError> {
		match fs::metadata(directory) {
			Ok(meta) if meta.is_dir() => (),
			Ok(_) => return Err(ConfigError::NotADirectory(directory.to_owned())),
			Err(source) => {
				return Err(ConfigError::Unreadable {
					path: directory.to_owned(),
					source,
				})
			}
		}

		let default_host = Self::read_default_host(directory);

		let path = directory.join(RCPTHOSTS);
		let contents = match fs::read_to_string(&path) {
			Ok(contents) => contents,
			Err(err) if err.kind() == ErrorKind::NotFound => {
				return Err(ConfigError::MissingRcpthosts(path))
			}
			Err(source) => return Err(ConfigError::Unreadable { path, source }),
		};

		let mut accepted: Vec<String> = non_blank_lines(&contents).map(String::from).collect();
		if accepted.is_empty() {
			return Err(ConfigError::NoRcpthosts(path));
		}

		// The default host goes to the front and whatever was there moves to the back
		if let Some(host) = &default_host {
			accepted.push(host.clone());
			let last = accepted.len() - 1;
			accepted.swap(0, last);
		}

		Ok(Self {
			default_host,
			accepted,
		})
	}

	fn read_default_host(directory: &Path) -> Option<String> {
		let path = directory.join(DEFAULTHOST);

		match fs::read_to_string(&path) {
			Ok(contents) => non_blank_lines(&contents).next().map(String::from),
			Err(err) if err.kind() == ErrorKind::NotFound => {
				info!("defaulthost not found, the first rcpthost will be used in the greeting");
				None
			}
			Err(err) => {
				warn!(path = %path.display(), error = %err, "could not read defaulthost, ignoring it");
				None
			}
		}
	}
}

fn non_blank_lines(contents: &str) -> impl Iterator<Item = &str> {
	contents.lines().map(str::trim).filter(|line| !line.is_empty())
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("could not read {path}: {source}")]
	Unreadable { path: PathBuf, source: io::Error },
	#[error("not a directory: {0}")]
	NotADirectory(PathBuf),
	#[error("rcpthosts not found at {0}")]
	MissingRcpthosts(PathBuf),
	#[error("no rcpthosts listed in {0}")]
	NoRcpthosts(PathBuf),
}
