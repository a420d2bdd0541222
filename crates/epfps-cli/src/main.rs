//! EPFPS command-line client.
//!
//! Drives the client state layer outside a browser: synchronizes reference
//! data, manages the local session and uploads documents.

use std::io;
use std::path::Path;

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use epfps_core::api::{ApiClient, Credentials};
use epfps_core::cache::YearChangeHandler;
use epfps_core::config::Settings;
use epfps_core::upload::{self, Uploader};
use epfps_core::{init_configs, refresh_configs, AppContext, InitOutcome};

const USAGE: &str = "\
Usage: epfps <command>

Commands:
  status                      Show cached configuration and session state
  sync-config [--force]       Fetch reference data if missing or stale
  verify-session              Check the stored session with the server
  sign-in <email>             Sign in and store the session
  sign-out                    Clear the session and cached reference data
  switch-year                 Flag an academic-year change before reload
  year-handler                Run the post-reload year-change reset
  upload <file> <destination> Upload a file to object storage";

/// Environment variable holding the password for non-interactive sign-in
const ENV_PASSWORD: &str = "EPFPS_PASSWORD";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and, when a state directory exists, to a daily file.
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug).
fn init_tracing(settings: &Settings) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match settings.state_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), "epfps.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load settings ({}), using defaults", e);
        Settings::default().effective(|name| std::env::var(name).ok())
    });

    let _guard = init_tracing(&settings);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let context = AppContext::from_settings(&settings);
    info!(command = %command, persistent = context.is_persistent(), "epfps starting");

    match command.as_str() {
        "status" => status(&context).await,
        "sync-config" => {
            let force = args.iter().any(|a| a == "--force");
            sync_config(&context, &settings, force).await
        }
        "verify-session" => verify_session(&context, &settings).await,
        "sign-in" => {
            let Some(email) = args.get(1) else {
                bail!("sign-in needs an email address\n\n{}", USAGE);
            };
            sign_in(&context, &settings, email).await
        }
        "sign-out" => {
            context.sign_out().await;
            println!("Signed out.");
            Ok(())
        }
        "switch-year" => {
            context.academic_year.begin_change().await;
            println!("Academic year change flagged; reload to apply.");
            Ok(())
        }
        "year-handler" => {
            let handler = YearChangeHandler::mount(context.academic_year.clone()).await;
            if handler.is_pending() {
                println!("Finishing academic year change...");
            }
            handler.settled().await;
            println!("Academic year state: {:?}", context.academic_year.phase().await);
            Ok(())
        }
        "upload" => match (args.get(1), args.get(2)) {
            (Some(file), Some(destination)) => upload_file(&context, &settings, file, destination).await,
            _ => bail!("upload needs a file and a destination\n\n{}", USAGE),
        },
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}

async fn status(context: &AppContext) -> Result<()> {
    let now = Utc::now();
    let metadata = context.config.metadata().await;
    let (records, regions, education_levels) = context
        .config
        .read(|s| (s.record_count(), s.regions.len(), s.education_levels.len()))
        .await;

    println!("Storage:        {}", if context.is_persistent() { "persistent" } else { "memory only" });
    println!(
        "Configuration:  {} ({} records, {} regions, {} education levels)",
        if metadata.is_fresh(now) { "fresh" } else { "stale" },
        records,
        regions,
        education_levels,
    );
    println!("Last updated:   {}", metadata.age_display(now));

    let session = context.session.state().await;
    match session.user {
        Some(ref user) => {
            let expired = if user.is_expired(now) { " (expired)" } else { "" };
            println!(
                "User:           {} <{}> [{}]{}",
                user.display_name(),
                user.email,
                user.role.display_name(),
                expired
            );
        }
        None => println!("User:           not signed in"),
    }
    if let Some(ref detailed) = session.user_detailed {
        println!("Profile:        {}", detailed.full_name());
        if let Some(ref year) = detailed.academic_year {
            println!("Academic year:  {}", year);
        }
    }
    println!("Year change:    {:?}", context.academic_year.phase().await);
    Ok(())
}

async fn sync_config(context: &AppContext, settings: &Settings, force: bool) -> Result<()> {
    let mut api = ApiClient::new(&settings.api_url)?;
    if let Some(token) = context.session.access_token().await {
        api = api.with_token(token);
    }

    let fetch = || api.fetch_configuration();
    let outcome = if force {
        refresh_configs(&context.config, fetch).await
    } else {
        init_configs(&context.config, fetch).await
    };

    match outcome {
        InitOutcome::Fresh => println!("Configuration is up to date."),
        InitOutcome::Refreshed => println!(
            "Configuration refreshed ({} records).",
            context.config.read(|s| s.record_count()).await
        ),
        InitOutcome::Failed => println!("Configuration fetch failed; keeping cached data (see logs)."),
    }
    Ok(())
}

async fn verify_session(context: &AppContext, settings: &Settings) -> Result<()> {
    let api = ApiClient::new(&settings.api_url)?;
    match context.verify_session(&api).await {
        Ok(_) => {
            println!("Session is valid.");
            Ok(())
        }
        Err(e) if e.is_auth_failure() => {
            context.session.clear_user().await;
            bail!("Not authenticated: {}. Please sign in again.", e)
        }
        Err(e) => Err(e.into()),
    }
}

async fn sign_in(context: &AppContext, settings: &Settings, email: &str) -> Result<()> {
    let password = match std::env::var(ENV_PASSWORD) {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("Password: ")?,
    };

    let api = ApiClient::new(&settings.api_url)?;
    let credentials = Credentials {
        email: email.to_string(),
        password,
    };
    let payload = context.sign_in(&api, &credentials).await?;
    println!("Signed in as {} ({}).", payload.display_name(), payload.role.display_name());

    if let Err(e) = Settings::remember_email(email) {
        tracing::warn!(error = %e, "Failed to save settings");
    }
    Ok(())
}

async fn upload_file(
    context: &AppContext,
    settings: &Settings,
    file: &str,
    destination: &str,
) -> Result<()> {
    let outcome = match settings.upload_target() {
        Some((endpoint, bucket)) => {
            let mut uploader = Uploader::new(endpoint, bucket)?;
            if let Some(token) = context.session.access_token().await {
                uploader = uploader.with_token(token);
            }
            uploader.upload(Path::new(file), destination).await
        }
        None => upload::not_configured(),
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if let Some(error) = outcome.error {
        bail!("Upload failed: {}", error);
    }
    Ok(())
}
