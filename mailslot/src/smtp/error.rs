use thiserror::Error;

use super::{Response, ResponseCode};

/// Errors that are reported to the client before carrying on with the session.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
	#[error("command unrecognized")]
	Unrecognized,
	#[error("syntax error in parameters or arguments")]
	Syntax,
	#[error("bad sequence of commands")]
	BadSequence,
	#[error("too many recipients")]
	TooManyRecipients,
	#[error("no relay")]
	RelayDenied,
}

impl ProtocolError {
	pub fn response(self) -> Response {
		match self {
			Self::Unrecognized => Response::standard(ResponseCode::UnrecognizedCommand),
			Self::Syntax => Response::standard(ResponseCode::InvalidParameters),
			Self::BadSequence => Response::standard(ResponseCode::BadCommandSequence),
			Self::TooManyRecipients => {
				Response::with_message(ResponseCode::InsufficientStorage, "too many recipients")
			}
			Self::RelayDenied => {
				Response::with_message(ResponseCode::MailboxNameNotAllowed, "no relay")
			}
		}
	}
}
