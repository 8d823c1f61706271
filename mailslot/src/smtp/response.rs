/// A single-line reply, `<code> <text>`.
#[derive(Clone, Debug)]
pub struct Response {
	code: ResponseCode,
	message: String,
}

impl Response {
	pub fn with_message<S: Into<String>>(code: ResponseCode, message: S) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}

	/// The reply for `code` with the wording from RFC 5321 section 4.2.
	pub fn standard(code: ResponseCode) -> Self {
		Self::with_message(code, code.description())
	}

	pub fn code(&self) -> ResponseCode {
		self.code
	}

	pub fn as_string(&self) -> String {
		format!("{} {}\r\n", self.code.as_code(), self.message)
	}
}

/// The reply codes this server sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseCode {
	UnrecognizedCommand, // 500
	InvalidParameters,   // 501
	BadCommandSequence,  // 503

	HelpMessage,    // 214
	ServiceReady,   // 220
	ServiceClosing, // 221

	ServiceNotAvailable, // 421 (Service not available, closing transmission channel)

	Okay,           // 250
	CannotVrfyUser, // 252 (but will attempt delivery)

	ProcessingError,           // 451
	InsufficientStorage,       // 452
	ExceededStorageAllocation, // 552
	MailboxNameNotAllowed,     // 553

	StartMailInput, // 354
}

impl ResponseCode {
	pub fn as_code(self) -> u16 {
		match self {
			ResponseCode::UnrecognizedCommand => 500,
			ResponseCode::InvalidParameters => 501,
			ResponseCode::BadCommandSequence => 503,

			ResponseCode::HelpMessage => 214,
			ResponseCode::ServiceReady => 220,
			ResponseCode::ServiceClosing => 221,

			ResponseCode::ServiceNotAvailable => 421,

			ResponseCode::Okay => 250,
			ResponseCode::CannotVrfyUser => 252,

			ResponseCode::ProcessingError => 451,
			ResponseCode::InsufficientStorage => 452,
			ResponseCode::ExceededStorageAllocation => 552,
			ResponseCode::MailboxNameNotAllowed => 553,

			ResponseCode::StartMailInput => 354,
		}
	}

	pub fn description(self) -> &'static str {
		match self {
			ResponseCode::UnrecognizedCommand => "Syntax error, command unrecognized",
			ResponseCode::InvalidParameters => "Syntax error in parameters or arguments",
			ResponseCode::BadCommandSequence => "Bad sequence of commands",
			ResponseCode::HelpMessage => "Help message",
			ResponseCode::ServiceReady => "Service ready",
			ResponseCode::ServiceClosing => "Service closing transmission channel",
			ResponseCode::ServiceNotAvailable => {
				"Service not available, closing transmission channel"
			}
			ResponseCode::Okay => "Requested mail action okay, completed",
			ResponseCode::CannotVrfyUser => {
				"Cannot VRFY user, but will accept message and attempt delivery"
			}
			ResponseCode::ProcessingError => "Requested action aborted: error in processing",
			ResponseCode::InsufficientStorage => {
				"Requested action not taken: insufficient system storage"
			}
			ResponseCode::ExceededStorageAllocation => {
				"Requested mail action aborted: exceeded storage allocation"
			}
			ResponseCode::MailboxNameNotAllowed => {
				"Requested action not taken: mailbox name not allowed"
			}
			ResponseCode::StartMailInput => "Start mail input; end with <CRLF>.<CRLF>",
		}
	}
}
