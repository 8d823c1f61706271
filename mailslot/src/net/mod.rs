mod connection;
mod error;

pub use connection::{Connection, LINE_LIMIT};
pub use error::SessionError;

use std::{any::Any, sync::Arc};

use tokio::{
	fs::{self, File, OpenOptions},
	io::{self, AsyncRead, AsyncWrite, AsyncWriteExt},
	net::{TcpListener, TcpStream},
	sync::watch,
	time::Instant,
};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
	config::Config,
	fs::{unique_name, Maildir},
	smtp::{Response, ResponseCode, Server, Step},
};

/// Waits for connections and hands each to its own task until `shutdown`
/// changes. Sessions already running are left to finish on their own.
pub async fn listen(
	listener: TcpListener,
	config: Arc<dyn Config>,
	maildir: Arc<Maildir>,
	mut shutdown: watch::Receiver<bool>,
) -> io::Result<()> {
	loop {
		let (stream, peer) = tokio::select! {
			_ = shutdown.changed() => break,
			accepted = listener.accept() => accepted?,
		};

		info!(%peer, "accepted connection");

		let session = tokio::spawn(
			serve(stream, config.clone(), maildir.clone()).instrument(info_span!("session", %peer)),
		);

		// A panicking session takes down its own task and nothing else
		tokio::spawn(async move {
			if let Err(err) = session.await {
				if err.is_panic() {
					let payload = err.into_panic();
					error!(%peer, reason = panic_reason(payload.as_ref()), "session panicked");
				}
			}
		});
	}

	info!("no longer accepting connections");
	Ok(())
}

/// Runs one session to its end. Every fatal error comes back here, where the
/// client gets a last reply and the connection is closed.
pub async fn serve(stream: TcpStream, config: Arc<dyn Config>, maildir: Arc<Maildir>) {
	let deadline = Instant::now() + config.timeout();
	let mut connection = Connection::from_stream(stream, deadline);

	let result = converse(&mut connection, config.clone(), &maildir).await;

	if let Err(err) = result {
		match &err {
			SessionError::Closed => debug!("client went away"),
			SessionError::Transport(err) => debug!(error = %err, "connection failed"),
			err if err.is_local() => error!(error = %err, "ending session"),
			err => warn!(error = %err, "ending session"),
		}

		for response in err.farewell() {
			if connection.send(&response).await.is_err() {
				break;
			}
		}
	}

	// The client may already be gone
	let _ = connection.shutdown().await;
	info!("connection closed");
}

async fn converse<R, W>(
	connection: &mut Connection<R, W>,
	config: Arc<dyn Config>,
	maildir: &Maildir,
) -> Result<(), SessionError>
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let (mut server, banner) = Server::initiate(config.clone());
	connection.send(&banner).await?;

	loop {
		let line = connection.read_line().await?;

		match server.push(&line) {
			Step::Reply(response) => connection.send(&response).await?,
			Step::ReceiveData => {
				let name = receive_message(connection, config.as_ref(), maildir).await?;
				info!(
					name = %name,
					from = server.reverse_path().unwrap_or_default(),
					recipients = server.forward_paths().len(),
					"delivered message"
				);

				let response = server.delivered(&name);
				connection.send(&response).await?;
			}
			Step::Quit(response) => {
				connection.send(&response).await?;
				return Ok(());
			}
		}
	}
}

/// Reads the message body into a fresh file under `tmp/` and, once it is
/// complete and synced, moves it into `new/`. Returns the name it was
/// published under. The staged file never outlives a failure.
pub async fn receive_message<R, W>(
	connection: &mut Connection<R, W>,
	config: &dyn Config,
	maildir: &Maildir,
) -> Result<String, SessionError>
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let name = unique_name();
	let staged = maildir.tmp_dir().join(&name);

	let mut file = OpenOptions::new()
		.write(true)
		.create_new(true)
		.open(&staged)
		.await
		.map_err(SessionError::Staging)?;

	let result = async {
		connection
			.send(&Response::standard(ResponseCode::StartMailInput))
			.await?;
		let size = connection
			.copy_message(&mut file, config.max_message_bytes())
			.await?;
		finish(&mut file).await.map_err(SessionError::Spool)?;

		fs::rename(&staged, maildir.new_dir().join(&name))
			.await
			.map_err(SessionError::Publish)?;

		debug!(name = %name, size, "published message");
		Ok::<_, SessionError>(())
	}
	.await;

	if let Err(err) = result {
		drop(file);
		if let Err(remove) = fs::remove_file(&staged).await {
			warn!(path = %staged.display(), error = %remove, "could not remove staged message");
		}
		return Err(err);
	}

	Ok(name)
}

async fn finish(file: &mut File) -> io::Result<()> {
	file.flush().await?;
	file.sync_all().await
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
	if let Some(reason) = payload.downcast_ref::<&str>() {
		reason
	} else if let Some(reason) = payload.downcast_ref::<String>() {
		reason
	} else {
		"unknown"
	}
}

#[cfg(test)]
mod test {
	use std::{fs as std_fs, path::Path, time::Duration};

	use super::*;
	use crate::policy::ConfigError;

	struct TestConfig;

	impl Config for TestConfig {
		fn accepts_domain(&self, domain: &str) -> bool {
			domain == "example.com"
		}

		fn default_host(&self) -> String {
			String::from("example.com")
		}

		fn reload(&self) -> Result<(), ConfigError> {
			Ok(())
		}
	}

	fn entries(dir: &Path) -> usize {
		std_fs::read_dir(dir).unwrap().count()
	}

	fn connection(input: &[u8]) -> Connection<&[u8], Vec<u8>> {
		Connection::new(input, vec![], Instant::now() + Duration::from_secs(5))
	}

	#[tokio::test]
	async fn publishes_into_new() {
		let base = tempfile::tempdir().unwrap();
		let maildir = Maildir::open(base.path()).unwrap();
		let mut conn = connection(b"hai\r\n.\r\n");

		let name = receive_message(&mut conn, &TestConfig, &maildir).await.unwrap();

		assert_eq!(
			std_fs::read_to_string(maildir.new_dir().join(name)).unwrap(),
			"hai\n"
		);
		assert_eq!(entries(maildir.tmp_dir()), 0);
	}

	#[tokio::test]
	async fn failed_publish_removes_staged_file() {
		let base = tempfile::tempdir().unwrap();
		let maildir = Maildir::open(base.path()).unwrap();
		std_fs::remove_dir(maildir.new_dir()).unwrap();
		let mut conn = connection(b"hai\r\n.\r\n");

		assert!(matches!(
			receive_message(&mut conn, &TestConfig, &maildir).await,
			Err(SessionError::Publish(_))
		));
		assert_eq!(entries(maildir.tmp_dir()), 0);
		assert!(!maildir.new_dir().exists());
	}

	#[tokio::test]
	async fn failed_staging_publishes_nothing() {
		let base = tempfile::tempdir().unwrap();
		let maildir = Maildir::open(base.path()).unwrap();
		std_fs::remove_dir(maildir.tmp_dir()).unwrap();
		let mut conn = connection(b"hai\r\n.\r\n");

		assert!(matches!(
			receive_message(&mut conn, &TestConfig, &maildir).await,
			Err(SessionError::Staging(_))
		));
		assert_eq!(entries(maildir.new_dir()), 0);
		assert!(!maildir.tmp_dir().exists());
	}

	#[tokio::test]
	async fn oversize_removes_staged_file() {
		let base = tempfile::tempdir().unwrap();
		let maildir = Maildir::open(base.path()).unwrap();
		let body = format!("{}\r\n.\r\n", "x".repeat(2 * 1024 * 1024));
		let mut conn = connection(body.as_bytes());

		assert!(matches!(
			receive_message(&mut conn, &TestConfig, &maildir).await,
			Err(SessionError::Oversize(_))
		));
		assert_eq!(entries(maildir.tmp_dir()), 0);
		assert_eq!(entries(maildir.new_dir()), 0);
	}

	#[tokio::test]
	async fn timeout_mid_body_removes_staged_file() {
		let base = tempfile::tempdir().unwrap();
		let maildir = Maildir::open(base.path()).unwrap();

		let (mut client, server) = tokio::io::duplex(1024);
		client.write_all(b"Subject: hai\r\n\r\nstill typing").await.unwrap();
		let (reader, writer) = tokio::io::split(server);
		let mut conn = Connection::new(
			reader,
			writer,
			Instant::now() + Duration::from_millis(50),
		);

		assert!(matches!(
			receive_message(&mut conn, &TestConfig, &maildir).await,
			Err(SessionError::Timeout(_))
		));
		assert_eq!(entries(maildir.tmp_dir()), 0);
		assert_eq!(entries(maildir.new_dir()), 0);
		drop(client);
	}
}
