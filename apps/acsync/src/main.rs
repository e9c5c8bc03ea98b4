//! Access-control synchronization service entry point.
//!
//! Loads configuration, wires the directory, staff, and remote clients into
//! the engine, executes one run, and mails the rendered report. A failed run
//! mails a plain-text error notification instead and exits non-zero.

mod config;
mod ldap;
mod notify;
mod report_html;
mod sofd;

use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use acsync_core::{CoreError, Notifier, RunSettings, SyncRun};
use acsync_remote::{RemoteConfig, RemoteError, RestRemote};

use crate::config::RunConfig;
use crate::ldap::LdapDirectory;
use crate::notify::SmtpNotifier;
use crate::sofd::SofdStaff;

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("staff database: {0}")]
    Staff(acsync_core::SourceError),

    #[error(transparent)]
    Engine(#[from] CoreError),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,acsync=debug")),
        )
        .init();

    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let notifier = match SmtpNotifier::new(&config.smtp) {
        Ok(notifier) => notifier,
        Err(e) => {
            eprintln!("notifier setup error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config).await {
        Ok(body) => {
            if config.mail_enabled {
                if let Err(e) = notifier
                    .send(&config.mail_to, &config.mail_subject, &body, true)
                    .await
                {
                    warn!(error = %e, "failed to send run report");
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "synchronization run failed");
            if config.mail_enabled {
                let subject = format!("Error {}", config.mail_subject);
                let body = format!("The synchronization run failed:\n\n{e}\n");
                if let Err(send_err) = notifier
                    .send(&config.mail_to, &subject, &body, false)
                    .await
                {
                    warn!(error = %send_err, "failed to send failure notification");
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &RunConfig) -> Result<String, RunError> {
    let remote_config = RemoteConfig::new(
        &config.sync_url,
        &config.query_url,
        &config.username,
        &config.password,
    )?;
    let host = remote_config.host();
    let remote = RestRemote::new(remote_config)?;

    let directory = LdapDirectory::new(config.ldap.clone());
    let staff = SofdStaff::connect(&config.staff_database_url)
        .await
        .map_err(RunError::Staff)?;

    let settings = RunSettings {
        plan: config.source_plan(),
        policy: acsync_core::SyncPolicy::from_raw(&config.raw_policy()),
        backprop: config.backprop(),
        host,
        username: config.username.clone(),
    };

    let report = SyncRun::new(&directory, &staff, &remote)
        .execute(&settings)
        .await?;

    info!(
        roster_size = report.roster_size,
        no_change = report.is_no_change(),
        card_writes = report.card_writes.len(),
        "synchronization run finished"
    );

    Ok(report_html::render(&report))
}
