//! Cash desk and game table directories used to fill choice fields.

use serde::Deserialize;
use tracing::warn;

use crate::client::{ApiClient, RequestDescriptor};

const CASH_DESKS: &str = "/api/reference/cashdesks";
const GAME_TABLES: &str = "/api/reference/gametables";

pub const REFERENCE_LOAD_FAILED: &str = "Не удалось загрузить справочники касс и столов.";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CashDesk {
    pub id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct GameTable {
    pub id: String,
    pub name: Option<String>,
    pub game_type: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

impl CashDesk {
    pub fn label(&self) -> String {
        label(&self.id, self.name.as_deref(), self.location.as_deref())
    }
}

impl GameTable {
    pub fn label(&self) -> String {
        label(&self.id, self.name.as_deref(), self.game_type.as_deref())
    }
}

fn label(id: &str, name: Option<&str>, detail: Option<&str>) -> String {
    match (name.filter(|n| !n.is_empty()), detail.filter(|d| !d.is_empty())) {
        (Some(name), Some(detail)) => format!("{} ({})", name, detail),
        (Some(name), None) => name.to_string(),
        _ => id.to_string(),
    }
}

pub fn cash_desks() -> RequestDescriptor {
    RequestDescriptor::get(CASH_DESKS)
}

pub fn game_tables() -> RequestDescriptor {
    RequestDescriptor::get(GAME_TABLES)
}

/// Both directories. A list that failed to load is empty and `error` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
    pub cash_desks: Vec<CashDesk>,
    pub game_tables: Vec<GameTable>,
    pub error: Option<String>,
}

/// Fetch both directories concurrently. One failing does not discard the other.
pub async fn load_reference_data(client: &ApiClient, base_url: &str, token: Option<&str>) -> ReferenceData {
    let desks_request = cash_desks();
    let tables_request = game_tables();
    let (desks, tables) = tokio::join!(
        client.request_as::<Vec<CashDesk>>(base_url, token, &desks_request),
        client.request_as::<Vec<GameTable>>(base_url, token, &tables_request),
    );

    let mut data = ReferenceData::default();
    match desks {
        Ok(list) => data.cash_desks = list.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "cash desk directory unavailable");
            data.error = Some(REFERENCE_LOAD_FAILED.to_string());
        }
    }
    match tables {
        Ok(list) => data.game_tables = list.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "game table directory unavailable");
            data.error = Some(REFERENCE_LOAD_FAILED.to_string());
        }
    }
    data
}
