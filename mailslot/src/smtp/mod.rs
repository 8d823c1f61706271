pub mod args;
mod command;
mod error;
mod response;
mod server;

pub use command::Command;
pub use error::ProtocolError;
pub use response::{Response, ResponseCode};
pub use server::{Server, State, Step};
