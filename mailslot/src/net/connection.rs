use tokio::{
	io::{
		self, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
	},
	net::{
		tcp::{OwnedReadHalf, OwnedWriteHalf},
		TcpStream,
	},
	time::{timeout_at, Instant},
};

use crate::smtp::Response;

use super::SessionError;

/// The longest command line we'll read, CRLF included. RFC 5321 4.5.3.1.6
pub const LINE_LIMIT: u64 = 1000;

/// A line-oriented view of a connection. Every read has to finish before the
/// deadline the connection was created with; writes aren't bounded.
pub struct Connection<R, W> {
	reader: BufReader<R>,
	writer: W,
	deadline: Instant,
}

impl Connection<OwnedReadHalf, OwnedWriteHalf> {
	pub fn from_stream(stream: TcpStream, deadline: Instant) -> Self {
		let (reader, writer) = stream.into_split();
		Self::new(reader, writer, deadline)
	}
}

impl<R, W> Connection<R, W>
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	pub fn new(reader: R, writer: W, deadline: Instant) -> Self {
		Self {
			reader: BufReader::new(reader),
			writer,
			deadline,
		}
	}

	/// Reads a command line, without its line ending. Bytes that aren't UTF-8
	/// are replaced.
	pub async fn read_line(&mut self) -> Result<String, SessionError> {
		let mut line = Vec::new();
		let read = self.read_until_newline(&mut line, LINE_LIMIT).await?;

		if !line.ends_with(b"\n") {
			return if read as u64 >= LINE_LIMIT {
				Err(SessionError::LineTooLong)
			} else {
				Err(SessionError::Closed)
			};
		}
		trim_line_ending(&mut line);

		Ok(String::from_utf8_lossy(&line).into_owned())
	}

	/// Copies a message body into `dst` until the line holding a single `.`.
	/// Dot-stuffing is undone and every line is written with a bare LF. At most
	/// `limit` bytes are written; the byte after that is an
	/// [`SessionError::Oversize`].
	pub async fn copy_message<D>(&mut self, dst: &mut D, limit: u64) -> Result<u64, SessionError>
	where
		D: AsyncWrite + Unpin,
	{
		let mut written = 0;
		let mut line = Vec::new();

		loop {
			line.clear();

			// Whatever room is left, plus a stuffed dot and the CRLF
			let room = (limit - written).saturating_add(3);
			let read = self.read_until_newline(&mut line, room).await?;

			if !line.ends_with(b"\n") {
				return if read as u64 == room {
					Err(SessionError::Oversize(limit))
				} else {
					Err(SessionError::Closed)
				};
			}
			trim_line_ending(&mut line);

			if line == b"." {
				return Ok(written);
			}

			let content = line.strip_prefix(b".").unwrap_or(&line[..]);
			let size = content.len() as u64 + 1;
			if written + size > limit {
				return Err(SessionError::Oversize(limit));
			}

			dst.write_all(content).await.map_err(SessionError::Spool)?;
			dst.write_all(b"\n").await.map_err(SessionError::Spool)?;
			written += size;
		}
	}

	pub async fn send(&mut self, response: &Response) -> io::Result<()> {
		self.writer.write_all(response.as_string().as_bytes()).await?;
		self.writer.flush().await
	}

	pub async fn shutdown(&mut self) -> io::Result<()> {
		self.writer.shutdown().await
	}

	async fn read_until_newline(
		&mut self,
		buf: &mut Vec<u8>,
		limit: u64,
	) -> Result<usize, SessionError> {
		let mut limited = (&mut self.reader).take(limit);
		let read = limited.read_until(b'\n', buf);

		Ok(timeout_at(self.deadline, read).await??)
	}
}

fn trim_line_ending(line: &mut Vec<u8>) {
	if line.ends_with(b"\n") {
		line.pop();
	}
	if line.ends_with(b"\r") {
		line.pop();
	}
}
