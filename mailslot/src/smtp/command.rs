use super::ProtocolError;

/// A command line split on single spaces. Everything after the verb is kept
/// as-is for the handler to validate, because a command that arrives out of
/// sequence is reported as such even when its arguments are malformed.
#[derive(Debug, PartialEq)]
pub enum Command<'a> {
	Helo(Vec<&'a str>),
	Ehlo(Vec<&'a str>),
	Mail(Vec<&'a str>),
	Rcpt(Vec<&'a str>),
	Data(Vec<&'a str>),
	Rset(Vec<&'a str>),
	Vrfy,
	Help,
	Noop,
	Quit,
}

impl<'a> Command<'a> {
	/// Only the verb is case-insensitive; arguments keep the case they came in.
	pub fn parse(line: &'a str) -> Result<Self, ProtocolError> {
		let mut parts = line.split(' ');
		let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
		let args: Vec<&str> = parts.collect();

		match verb.as_str() {
			"helo" => Ok(Command::Helo(args)),
			"ehlo" => Ok(Command::Ehlo(args)),
			"mail" => Ok(Command::Mail(args)),
			"rcpt" => Ok(Command::Rcpt(args)),
			"data" => Ok(Command::Data(args)),
			"rset" => Ok(Command::Rset(args)),
			"vrfy" => Ok(Command::Vrfy),
			"help" => Ok(Command::Help),
			"noop" => Ok(Command::Noop),
			"quit" => Ok(Command::Quit),
			_ => Err(ProtocolError::Unrecognized),
		}
	}

	pub fn verb(&self) -> &'static str {
		match self {
			Command::Helo(_) => "HELO",
			Command::Ehlo(_) => "EHLO",
			Command::Mail(_) => "MAIL",
			Command::Rcpt(_) => "RCPT",
			Command::Data(_) => "DATA",
			Command::Rset(_) => "RSET",
			Command::Vrfy => "VRFY",
			Command::Help => "HELP",
			Command::Noop => "NOOP",
			Command::Quit => "QUIT",
		}
	}
}

/// Pulls the bracketed path out of `FROM:<path>` or `TO:<path>`. Spaces
/// around the colon are tolerated.
pub fn path_argument(args: &[&str], keyword: &str) -> Result<String, ProtocolError> {
	if args.is_empty() {
		return Err(ProtocolError::Syntax);
	}

	let joined = args.join(" ");
	let (found, path) = joined.split_once(':').ok_or(ProtocolError::Syntax)?;
	let path = path.trim();

	if !found.trim().eq_ignore_ascii_case(keyword) || !is_bracketed(path) {
		return Err(ProtocolError::Syntax);
	}

	Ok(path.to_owned())
}

/// Opens with `<` and the first `>` is the last character.
fn is_bracketed(path: &str) -> bool {
	path.starts_with('<') && path.find('>') == Some(path.len() - 1)
}
