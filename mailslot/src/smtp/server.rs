use std::sync::Arc;

use tracing::debug;

use crate::config::Config;

use super::{
	args::Path,
	command::{path_argument, Command},
	ProtocolError, Response, ResponseCode,
};

/// The command state machine for one connection. It does no I/O: every line
/// goes in through [`Server::push`] and comes back out as a [`Step`] for the
/// connection to act on.
pub struct Server {
	config: Arc<dyn Config>,
	greeting: Option<String>,
	reverse_path: Option<String>,
	forward_paths: Vec<String>,
}

/// What the connection should do after a command.
#[derive(Debug)]
pub enum Step {
	/// Write the reply and read the next command.
	Reply(Response),
	/// Stage and publish the message body, then report back through
	/// [`Server::delivered`].
	ReceiveData,
	/// Write the reply and hang up.
	Quit(Response),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
	Initiated,
	Greeted,
	GotReversePath,
	GotForwardPath,
}

impl Server {
	pub fn initiate(config: Arc<dyn Config>) -> (Self, Response) {
		let banner = Response::with_message(
			ResponseCode::ServiceReady,
			format!("{} (mailslot) ready", config.default_host()),
		);

		(
			Self {
				config,
				greeting: None,
				reverse_path: None,
				forward_paths: vec![],
			},
			banner,
		)
	}

	pub fn push(&mut self, line: &str) -> Step {
		let command = match Command::parse(line) {
			Ok(command) => command,
			Err(err) => {
				let verb = line.split(' ').next().unwrap_or_default();
				return Self::reject(verb, err);
			}
		};
		let verb = command.verb();

		let result = match command {
			Command::Helo(args) | Command::Ehlo(args) => self.helo(&args),
			Command::Mail(args) => self.mail(&args),
			Command::Rcpt(args) => self.rcpt(&args),
			Command::Data(args) => match self.data(&args) {
				Ok(()) => return Step::ReceiveData,
				Err(err) => Err(err),
			},
			Command::Rset(args) => self.rset(&args),
			Command::Vrfy => Ok(Response::with_message(
				ResponseCode::CannotVrfyUser,
				"send some mail, see what happens",
			)),
			Command::Help => Ok(Response::with_message(
				ResponseCode::HelpMessage,
				"see https://tools.ietf.org/html/rfc5321",
			)),
			Command::Noop => Ok(Response::with_message(ResponseCode::Okay, "Okay")),
			Command::Quit => return Step::Quit(self.quit()),
		};

		match result {
			Ok(response) => Step::Reply(response),
			Err(err) => Self::reject(verb, err),
		}
	}

	fn reject(verb: &str, err: ProtocolError) -> Step {
		debug!(command = verb, error = %err, "rejected command");
		Step::Reply(err.response())
	}

	/// The message was published under `name`; the transaction is over.
	pub fn delivered(&mut self, name: &str) -> Response {
		self.clear_transaction();

		Response::with_message(ResponseCode::Okay, format!("delivered ({})", name))
	}

	pub fn state(&self) -> State {
		if !self.forward_paths.is_empty() {
			State::GotForwardPath
		} else if self.reverse_path.is_some() {
			State::GotReversePath
		} else if self.greeting.is_some() {
			State::Greeted
		} else {
			State::Initiated
		}
	}

	pub fn greeting(&self) -> Option<&str> {
		self.greeting.as_deref()
	}

	pub fn reverse_path(&self) -> Option<&str> {
		self.reverse_path.as_deref()
	}

	pub fn forward_paths(&self) -> &[String] {
		&self.forward_paths
	}

	// HELO and EHLO are both accepted exactly once.
	fn helo(&mut self, args: &[&str]) -> Result<Response, ProtocolError> {
		if self.greeting.is_some() {
			return Err(ProtocolError::BadSequence);
		}

		let client_domain = match args {
			[client_domain] if !client_domain.is_empty() => *client_domain,
			_ => return Err(ProtocolError::Syntax),
		};

		self.greeting = Some(client_domain.to_owned());

		Ok(Response::with_message(
			ResponseCode::Okay,
			format!("Hello {}", client_domain),
		))
	}

	fn mail(&mut self, args: &[&str]) -> Result<Response, ProtocolError> {
		if self.greeting.is_none() || self.reverse_path.is_some() {
			return Err(ProtocolError::BadSequence);
		}

		let reverse_path = path_argument(args, "from")?;
		let response = Response::with_message(ResponseCode::Okay, format!("{} OK", reverse_path));
		self.reverse_path = Some(reverse_path);

		Ok(response)
	}

	fn rcpt(&mut self, args: &[&str]) -> Result<Response, ProtocolError> {
		if self.reverse_path.is_none() {
			return Err(ProtocolError::BadSequence);
		}

		if self.forward_paths.len() >= self.config.max_recipients() {
			return Err(ProtocolError::TooManyRecipients);
		}

		let forward_path = path_argument(args, "to")?;
		let path: Path = forward_path.parse().map_err(|_| ProtocolError::Syntax)?;

		if !self.config.accepts_domain(&path.domain.normalized()) {
			return Err(ProtocolError::RelayDenied);
		}

		self.forward_paths.push(path.mailbox());

		Ok(Response::with_message(
			ResponseCode::Okay,
			format!("{} OK", forward_path),
		))
	}

	fn data(&mut self, args: &[&str]) -> Result<(), ProtocolError> {
		if self.forward_paths.is_empty() {
			return Err(ProtocolError::BadSequence);
		}

		if !args.is_empty() {
			return Err(ProtocolError::Syntax);
		}

		Ok(())
	}

	fn rset(&mut self, args: &[&str]) -> Result<Response, ProtocolError> {
		if !args.is_empty() {
			return Err(ProtocolError::Syntax);
		}

		self.clear_transaction();

		Ok(Response::with_message(ResponseCode::Okay, "OK"))
	}

	fn quit(&mut self) -> Response {
		Response::with_message(
			ResponseCode::ServiceClosing,
			format!(
				"{} {}",
				self.config.default_host(),
				ResponseCode::ServiceClosing.description()
			),
		)
	}

	fn clear_transaction(&mut self) {
		self.reverse_path = None;
		self.forward_paths.clear();
	}
}
