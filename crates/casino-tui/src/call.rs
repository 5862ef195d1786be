//! Runs one page action against the backend, off the UI thread.

use std::path::{Path, PathBuf};

use casino_core::api::reference::{load_reference_data, ReferenceData};
use casino_core::api::staff::{list_employees, Employee};
use casino_core::{ApiClient, ApiError, ConsoleResponse};
use tracing::{info, warn};

use crate::pages::Call;

/// Everything a request task needs, cloned out of the app before spawning.
#[derive(Clone)]
pub struct CallContext {
    pub client: ApiClient,
    pub base_url: String,
    pub token: Option<String>,
    pub download_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Response(ConsoleResponse),
    Saved {
        request_line: String,
        path: PathBuf,
        content_type: String,
        size: usize,
    },
    Reference(ReferenceData),
    /// No usable response: network failure, or an error status on a download.
    Failed {
        request_line: String,
        status: Option<u16>,
        error: String,
    },
    /// The export arrived but could not be written.
    SaveFailed {
        request_line: String,
        path: PathBuf,
        error: String,
    },
}

impl CallOutcome {
    /// Status text for the result pane header.
    pub fn status_label(&self) -> String {
        match self {
            CallOutcome::Response(response) => response.status_label(),
            CallOutcome::Saved { .. } => "SAVED".to_string(),
            CallOutcome::Reference(data) if data.error.is_some() => "PARTIAL".to_string(),
            CallOutcome::Reference(_) => "OK".to_string(),
            CallOutcome::Failed { status: Some(status), .. } => format!("{} ERROR", status),
            CallOutcome::Failed { status: None, .. } => "NETWORK ERROR".to_string(),
            CallOutcome::SaveFailed { .. } => "SAVE ERROR".to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            CallOutcome::Response(response) => response.ok,
            CallOutcome::Saved { .. } => true,
            CallOutcome::Reference(data) => data.error.is_none(),
            CallOutcome::Failed { .. } | CallOutcome::SaveFailed { .. } => false,
        }
    }

    pub fn request_line(&self) -> String {
        match self {
            CallOutcome::Response(response) => response.request_line.clone(),
            CallOutcome::Saved { request_line, .. }
            | CallOutcome::Failed { request_line, .. }
            | CallOutcome::SaveFailed { request_line, .. } => request_line.clone(),
            CallOutcome::Reference(_) => "GET /api/reference/*".to_string(),
        }
    }

    /// Body shown in the result pane.
    pub fn body(&self) -> String {
        match self {
            CallOutcome::Response(response) => response.formatted_body(),
            CallOutcome::Saved {
                path,
                content_type,
                size,
                ..
            } => format!("Файл сохранён: {}\nТип: {}\nРазмер: {} байт", path.display(), content_type, size),
            CallOutcome::Reference(data) => {
                let mut lines = vec![
                    format!("Кассы: {}", data.cash_desks.len()),
                    format!("Игровые столы: {}", data.game_tables.len()),
                ];
                lines.extend(data.cash_desks.iter().map(|d| format!("  касса {} - {}", d.id, d.label())));
                lines.extend(data.game_tables.iter().map(|t| format!("  стол {} - {}", t.id, t.label())));
                if let Some(error) = &data.error {
                    lines.insert(0, error.clone());
                }
                lines.join("\n")
            }
            CallOutcome::Failed { error, .. } => error.clone(),
            CallOutcome::SaveFailed { path, error, .. } => {
                format!("Не удалось сохранить файл {}: {}", path.display(), error)
            }
        }
    }
}

pub async fn run(ctx: CallContext, call: Call) -> CallOutcome {
    let token = ctx.token.as_deref();
    match call {
        Call::Execute(request) => {
            let request_line = format!("{} {}", request.method, ctx.client.resolve_url(&ctx.base_url, &request.target()));
            match ctx.client.execute(&ctx.base_url, token, &request).await {
                Ok(response) => CallOutcome::Response(response),
                Err(e) => failed(request_line, e),
            }
        }
        Call::Download { request, file_name } => {
            let request_line = format!("{} {}", request.method, ctx.client.resolve_url(&ctx.base_url, &request.target()));
            let download = match ctx.client.download(&ctx.base_url, token, &request).await {
                Ok(download) => download,
                Err(e) => return failed(request_line, e),
            };
            let path = ctx.download_dir.join(disk_name(&file_name));
            match save(&ctx.download_dir, &path, &download.bytes).await {
                Ok(()) => {
                    info!(path = %path.display(), size = download.bytes.len(), "export saved");
                    CallOutcome::Saved {
                        request_line,
                        path,
                        content_type: download.content_type,
                        size: download.bytes.len(),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "could not save export");
                    CallOutcome::SaveFailed {
                        request_line,
                        path,
                        error: e.to_string(),
                    }
                }
            }
        }
        Call::LoadReference => CallOutcome::Reference(load_reference_data(&ctx.client, &ctx.base_url, token).await),
    }
}

fn failed(request_line: String, error: ApiError) -> CallOutcome {
    CallOutcome::Failed {
        request_line,
        status: error.status(),
        error: error.to_string(),
    }
}

/// File name as written to disk: only `[A-Za-z0-9._-]` survive, and a name of dots alone is prefixed.
fn disk_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        format!("download{}", cleaned.replace('.', "_"))
    } else {
        cleaned
    }
}

async fn save(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, bytes).await
}

/// Employee directory for lookup fields. Errors are logged and yield an empty list.
pub async fn load_employees(ctx: CallContext) -> Vec<Employee> {
    match ctx
        .client
        .request_as::<Vec<Employee>>(&ctx.base_url, ctx.token.as_deref(), &list_employees())
        .await
    {
        Ok(list) => list.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "employee directory unavailable");
            Vec::new()
        }
    }
}
