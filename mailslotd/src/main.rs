mod config;
mod logging;

use std::{process::ExitCode, sync::Arc};

use config::Settings;
use mailslot::{config::Config, fs::Maildir, policy::RelayPolicy};
use tokio::{
	io,
	net::TcpListener,
	signal::unix::{signal, SignalKind},
	sync::watch,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
	logging::init();

	let settings = match Settings::get() {
		Ok(Some(settings)) => settings,
		Ok(None) => return ExitCode::SUCCESS,
		Err(err) => {
			error!(error = %err, "bad options");
			return ExitCode::FAILURE;
		}
	};

	let policy = match RelayPolicy::load(&settings.config_dir) {
		Ok(policy) => Arc::new(policy),
		Err(err) => {
			error!(error = %err, "could not load relay policy");
			return ExitCode::FAILURE;
		}
	};

	let maildir = match Maildir::open(&settings.maildir) {
		Ok(maildir) => Arc::new(maildir),
		Err(err) => {
			error!(error = %err, "could not open maildir");
			return ExitCode::FAILURE;
		}
	};

	let listener = match TcpListener::bind(settings.listen_address).await {
		Ok(listener) => listener,
		Err(err) => {
			error!(address = %settings.listen_address, error = %err, "could not listen");
			return ExitCode::FAILURE;
		}
	};

	info!(
		address = %settings.listen_address,
		config_dir = %settings.config_dir.display(),
		maildir = %settings.maildir.display(),
		default_host = %policy.default_host(),
		"listening"
	);

	let (tx, rx) = watch::channel(false);
	let listen_task = tokio::spawn(mailslot::net::listen(
		listener,
		policy.clone(),
		maildir,
		rx,
	));

	if let Err(err) = wait_for_shutdown(&policy).await {
		error!(error = %err, "could not install signal handlers");
		return ExitCode::FAILURE;
	}

	info!("received shutdown signal, no longer accepting connections");
	// The listener may already have stopped on its own
	let _ = tx.send(true);

	match listen_task.await {
		Ok(Ok(())) => ExitCode::SUCCESS,
		Ok(Err(err)) => {
			error!(error = %err, "accept loop failed");
			ExitCode::FAILURE
		}
		Err(err) => {
			error!(error = %err, "accept loop panicked");
			ExitCode::FAILURE
		}
	}
}

/// Reloads the relay policy on every SIGHUP until we're told to stop.
async fn wait_for_shutdown(policy: &RelayPolicy) -> io::Result<()> {
	let mut hangup = signal(SignalKind::hangup())?;
	let mut interrupt = signal(SignalKind::interrupt())?;
	let mut terminate = signal(SignalKind::terminate())?;
	let mut quit = signal(SignalKind::quit())?;

	loop {
		tokio::select! {
			_ = hangup.recv() => match policy.reload() {
				Ok(()) => (),
				Err(err) => warn!(error = %err, "reload failed, keeping the previous relay policy"),
			},
			_ = interrupt.recv() => return Ok(()),
			_ = terminate.recv() => return Ok(()),
			_ = quit.recv() => return Ok(()),
		}
	}
}
