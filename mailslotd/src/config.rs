use std::{
	env,
	net::SocketAddr,
	path::{Path, PathBuf},
};

use confindent::Confindent;
use getopts::Options;
use thiserror::Error;

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:2525";
/// Relative to `$HOME`
pub const DEFAULT_CONFIG_DIR: &str = ".mailslot";

/// Where the daemon listens and which directories it works from.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
	pub listen_address: SocketAddr,
	pub config_dir: PathBuf,
	pub maildir: PathBuf,
}

#[allow(clippy::or_fun_call)]
impl Settings {
	fn options() -> Options {
		let mut opts = Options::new();
		opts.optflag("h", "help", "Print this help message");
		opts.optopt(
			"a",
			"listen-address",
			"The address to accept connections on. ':PORT' listens on every interface\nDefault: 0.0.0.0:2525",
			"ADDR",
		);
		opts.optopt(
			"c",
			"config-dir",
			"The directory holding rcpthosts and defaulthost\nDefault: $HOME/.mailslot",
			"DIR",
		);
		opts.optopt(
			"m",
			"maildir",
			"The maildir messages are delivered into\nDefault: the working directory",
			"DIR",
		);
		opts.optopt(
			"f",
			"conf-file",
			"A file to read any of the above from. Options given here win",
			"PATH",
		);
		opts
	}

	fn print_usage<S: AsRef<str>>(prgm: S, opts: &Options) {
		let brief = format!("Usage: {} [options]", prgm.as_ref());
		println!("{}", opts.usage(&brief));
	}

	/// Reads the settings from the process arguments. `None` means the help
	/// text was asked for and printed.
	pub fn get() -> Result<Option<Self>, SettingsError> {
		let args: Vec<String> = env::args().collect();
		let home = env::var_os("HOME").map(PathBuf::from);

		Self::from_args(&args, home.as_deref())
	}

	pub fn from_args(args: &[String], home: Option<&Path>) -> Result<Option<Self>, SettingsError> {
		let opts = Self::options();
		let matches = opts.parse(args.iter().skip(1))?;

		if matches.opt_present("help") {
			Self::print_usage(args.first().map(String::as_str).unwrap_or("mailslotd"), &opts);
			return Ok(None);
		}

		let file = match matches.opt_str("conf-file") {
			None => None,
			Some(path) => Some(Confindent::from_file(&path).map_err(|err| {
				SettingsError::ConfFile {
					path: PathBuf::from(&path),
					reason: err.to_string(),
				}
			})?),
		};

		// Options specified on the command line take priority. We only take the
		// cli_key and convert to the config key internally so that we can remain
		// consistent.
		let find_value = |cli_key: &str| -> Option<String> {
			let conf_key: String = cli_key
				.split('-')
				.map(|word| {
					let mut c = word.chars();
					match c.next() {
						None => String::new(),
						Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
					}
				})
				.collect();

			matches.opt_str(cli_key).or(file
				.as_ref()
				.and_then(|conf| conf.child_value(conf_key))
				.map(|s| s.into()))
		};

		let address_string =
			find_value("listen-address").unwrap_or(DEFAULT_LISTEN_ADDRESS.into());
		let listen_address = parse_listen_address(&address_string)?;

		let config_dir = match find_value("config-dir") {
			Some(dir) => PathBuf::from(dir),
			None => home
				.ok_or(SettingsError::NoHome)?
				.join(DEFAULT_CONFIG_DIR),
		};

		let maildir = find_value("maildir")
			.map(PathBuf::from)
			.unwrap_or(PathBuf::from("."));

		Ok(Some(Self {
			listen_address,
			config_dir,
			maildir,
		}))
	}
}

/// A full socket address, or `:PORT` for every IPv4 interface.
fn parse_listen_address(raw: &str) -> Result<SocketAddr, SettingsError> {
	let full = match raw.strip_prefix(':') {
		Some(port) => format!("0.0.0.0:{}", port),
		None => raw.to_owned(),
	};

	full.parse()
		.map_err(|_| SettingsError::ListenAddress(raw.to_owned()))
}

#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("{0}")]
	Options(#[from] getopts::Fail),
	#[error("failed to parse conf file {path}: {reason}")]
	ConfFile { path: PathBuf, reason: String },
	#[error("failed to parse '{0}' as a listen address")]
	ListenAddress(String),
	#[error("$HOME is not set and no config directory was given")]
	NoHome,
}
