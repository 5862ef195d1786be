//! One-shot commands for scripting against the backend without the TUI.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use casino_core::api::finance::download_report;
use casino_core::api::incident::{export_report, ExportFormat};
use casino_core::{probe_login, ApiClient, Config, LoginError, Section, SessionStore};
use clap::{Subcommand, ValueEnum};
use colored::*;

use crate::call::{self, CallContext, CallOutcome};
use crate::form::FormValues;
use crate::pages::{self, Call};

#[derive(Subcommand)]
pub enum Command {
    /// Check credentials against the backend and store the session
    Login {
        #[arg(short, long, default_value = "admin")]
        username: String,
        #[arg(short, long, default_value = "admin")]
        password: String,
        /// Backend base URL; empty uses the proxy origin
        #[arg(short, long)]
        base_url: Option<String>,
    },
    /// Forget the stored credentials
    Logout,
    /// Show the stored session
    Status,
    /// Point the stored session at another backend; empty uses the proxy origin
    BaseUrl { url: String },
    /// Send an arbitrary request with the stored credentials
    Request {
        /// HTTP method
        method: String,
        /// Path, e.g. /api/incident/incidents
        path: String,
        /// Query parameter as key=value
        #[arg(short, long)]
        query: Vec<String>,
        /// JSON body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Download a generated report
    Export {
        report_id: String,
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: ExportKind,
        /// Directory to write into; defaults to the configured download directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List sections and their pages
    Pages,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportKind {
    Pdf,
    Excel,
    /// Financial report download
    Finance,
}

pub async fn run(command: Command, config: &Config, mut store: SessionStore, client: ApiClient) -> Result<()> {
    match command {
        Command::Login {
            username,
            password,
            base_url,
        } => login(&mut store, &client, &username, &password, base_url.as_deref()).await,
        Command::Logout => {
            store.logout()?;
            println!("{}", "Logged out".green());
            Ok(())
        }
        Command::Status => {
            print_status(&store, &client);
            Ok(())
        }
        Command::BaseUrl { url } => {
            store.set_base_url(url.trim())?;
            print_status(&store, &client);
            Ok(())
        }
        Command::Request {
            method,
            path,
            query,
            body,
        } => {
            let method = method.to_uppercase();
            let query = query.join("&");
            let body = body.unwrap_or_default();
            let values = FormValues::from_pairs(&[
                ("method", method.as_str()),
                ("path", path.as_str()),
                ("query", query.as_str()),
                ("body", body.as_str()),
            ]);
            let call = pages::build_raw_request(&values)?;
            send(context(config, &store, &client, None)?, call).await
        }
        Command::Export {
            report_id,
            format,
            output,
        } => {
            let call = match format {
                ExportKind::Pdf => report_export(&report_id, ExportFormat::Pdf),
                ExportKind::Excel => report_export(&report_id, ExportFormat::Excel),
                ExportKind::Finance => Call::Download {
                    request: download_report(&report_id),
                    file_name: format!("financial-report-{}", report_id),
                },
            };
            send(context(config, &store, &client, output)?, call).await
        }
        Command::Pages => {
            list_pages();
            Ok(())
        }
    }
}

async fn login(
    store: &mut SessionStore,
    client: &ApiClient,
    username: &str,
    password: &str,
    base_url: Option<&str>,
) -> Result<()> {
    let base_url = base_url.unwrap_or(&store.session().base_url).trim().to_string();
    let target = if base_url.is_empty() { client.proxy_origin() } else { base_url.as_str() };
    println!("🔐 Logging in as {} at {}", username.bold().cyan(), target.dimmed());

    match probe_login(client, &base_url, username, password).await {
        Ok(token) => {
            store.login(username, &token, &base_url)?;
            println!("{}", "Login accepted".bold().green());
            Ok(())
        }
        Err(LoginError::Rejected { status }) => Err(anyhow!("Credentials rejected (HTTP {})", status)),
        Err(LoginError::Network(e)) => Err(anyhow!("Backend unreachable: {}", e)),
    }
}

fn report_export(report_id: &str, format: ExportFormat) -> Call {
    Call::Download {
        request: export_report(report_id, format),
        file_name: format!("report-{}.{}", report_id, format.extension()),
    }
}

fn context(config: &Config, store: &SessionStore, client: &ApiClient, output: Option<PathBuf>) -> Result<CallContext> {
    let session = store.session();
    if !session.is_authenticated() {
        return Err(anyhow!("Not logged in. Run `casino-mis login` first"));
    }
    Ok(CallContext {
        client: client.clone(),
        base_url: session.base_url.clone(),
        token: session.token.clone(),
        download_dir: output.unwrap_or_else(|| config.download_dir()),
    })
}

async fn send(ctx: CallContext, call: Call) -> Result<()> {
    let outcome = call::run(ctx, call).await;

    let status = if outcome.is_ok() {
        outcome.status_label().bold().green()
    } else {
        outcome.status_label().bold().red()
    };
    match &outcome {
        CallOutcome::Response(response) => {
            println!("{} {} {}", status, response.request_line.dimmed(), response.duration_label().dimmed())
        }
        other => println!("{} {}", status, other.request_line().dimmed()),
    }
    println!("{}", "=".repeat(50).dimmed());
    println!("{}", outcome.body());

    if outcome.is_ok() {
        Ok(())
    } else {
        Err(anyhow!("Request failed: {}", outcome.status_label()))
    }
}

fn print_status(store: &SessionStore, client: &ApiClient) {
    let session = store.session();
    match &session.username {
        Some(user) if session.is_authenticated() => println!("User: {}", user.bold().green()),
        _ => println!("{}", "Not logged in".yellow()),
    }
    if session.base_url.is_empty() {
        println!("Base URL: {} {}", client.proxy_origin().bold(), "(proxy)".dimmed());
    } else {
        println!("Base URL: {}", session.base_url.bold());
    }
}

fn list_pages() {
    println!("{}", "🎰 Casino MIS".bold().blue());
    for section in Section::all() {
        println!("\n{}", section.display_name().bold().green());
        for page in section.links() {
            println!("  {:<28} {}", page.path().yellow(), page.label());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casino_core::testing::RecordingTransport;
    use casino_core::MemoryStorage;
    use std::sync::Arc;

    #[test]
    fn test_report_export_names_file_by_format() {
        match report_export("r7", ExportFormat::Excel) {
            Call::Download { request, file_name } => {
                assert_eq!(file_name, "report-r7.xlsx");
                assert_eq!(request.path, "/api/incident/reports/r7/export/excel");
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_commands_need_a_session() {
        let store = SessionStore::load(Box::new(MemoryStorage::new()));
        let client = ApiClient::with_transport(Arc::new(RecordingTransport::new()), "http://proxy");
        assert!(context(&Config::new(), &store, &client, None).is_err());
    }
}
