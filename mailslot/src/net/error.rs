use thiserror::Error;
use tokio::{io, time::error::Elapsed};

use crate::smtp::{Response, ResponseCode};

/// Errors that end a session. They travel back up to [`super::serve`], which
/// says goodbye and closes the connection.
#[derive(Debug, Error)]
pub enum SessionError {
	#[error("connection error: {0}")]
	Transport(#[from] io::Error),
	#[error("timed out")]
	Timeout(#[from] Elapsed),
	#[error("connection closed by client")]
	Closed,
	#[error("command line too long")]
	LineTooLong,
	#[error("message exceeded {0} bytes")]
	Oversize(u64),
	#[error("could not stage message: {0}")]
	Staging(io::Error),
	#[error("could not write staged message: {0}")]
	Spool(io::Error),
	#[error("could not publish message: {0}")]
	Publish(io::Error),
}

impl SessionError {
	/// The reply explaining why we're hanging up, for the errors that have one.
	pub fn response(&self) -> Option<Response> {
		match self {
			Self::LineTooLong => Some(Response::with_message(
				ResponseCode::UnrecognizedCommand,
				"Line too long",
			)),
			Self::Oversize(_) => Some(Response::standard(ResponseCode::ExceededStorageAllocation)),
			Self::Staging(_) | Self::Publish(_) => {
				Some(Response::standard(ResponseCode::InsufficientStorage))
			}
			Self::Spool(_) => Some(Response::standard(ResponseCode::ProcessingError)),
			Self::Transport(_) | Self::Timeout(_) | Self::Closed => None,
		}
	}

	/// Everything we still try to write before closing the connection.
	pub fn farewell(&self) -> Vec<Response> {
		let closing = Response::standard(ResponseCode::ServiceNotAvailable);

		match (self, self.response()) {
			(_, Some(response)) if response.code() == ResponseCode::ServiceNotAvailable => {
				vec![response]
			}
			(_, Some(response)) => vec![response, closing],
			(Self::Closed, None) => vec![],
			// Timeouts and bare I/O errors alike
			(_, None) => vec![Response::with_message(
				ResponseCode::ServiceNotAvailable,
				"timeout, closing transmission channel",
			)],
		}
	}

	/// Trouble on our side rather than the client's.
	pub fn is_local(&self) -> bool {
		matches!(self, Self::Staging(_) | Self::Spool(_) | Self::Publish(_))
	}
}
