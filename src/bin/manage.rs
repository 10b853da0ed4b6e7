//! Management commands for the recipe box.
//!
//! ```text
//! manage runserver [ADDRESS]
//! manage check
//! ```

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use recipe_box::app::{AppState, build_handler};
use recipe_box::conf::Settings;
use recipe_box::logging::init_logging;
use recipe_box::server::HttpServer;

/// Extra room on top of the attachment limit for the rest of a multipart body
const FORM_OVERHEAD: usize = 1024 * 1024;

#[derive(Debug, Parser)]
#[command(name = "manage")]
#[command(about = "Recipe box management interface", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Directory holding base.toml and the profile files
	#[arg(long, value_name = "DIR", default_value = "settings", global = true)]
	settings_dir: PathBuf,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
	/// Start the web server
	Runserver {
		/// Address to bind (default: host and port from settings)
		#[arg(value_name = "ADDRESS")]
		address: Option<String>,
	},

	/// Validate the settings and exit
	Check,
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();

	let settings = match Settings::load(&cli.settings_dir) {
		Ok(settings) => settings,
		Err(e) => {
			eprintln!("Error: {}", e);
			return ExitCode::FAILURE;
		}
	};
	init_logging(&settings);

	let result = match cli.command {
		Commands::Check => {
			println!(
				"Settings OK (database: {}, media root: {})",
				settings.database_url,
				settings.media_root.display()
			);
			Ok(())
		}
		Commands::Runserver { address } => runserver(settings, address).await,
	};

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			tracing::error!(error = %e, "command failed");
			eprintln!("Error: {}", e);
			ExitCode::FAILURE
		}
	}
}

async fn runserver(settings: Settings, address: Option<String>) -> recipe_box::Result<()> {
	let address = address.unwrap_or_else(|| settings.bind_addr());
	let addr: SocketAddr = address.parse().map_err(|e| {
		recipe_box::Error::Configuration(format!("invalid address {}: {}", address, e))
	})?;

	let max_body_size = settings.max_upload_size.saturating_add(FORM_OVERHEAD);
	let state = Arc::new(AppState::from_settings(settings).await?);
	HttpServer::new(build_handler(state))
		.with_max_body_size(max_body_size)
		.listen(addr)
		.await
}
