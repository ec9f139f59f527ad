//! Notifications routed to the host's display queue.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;

// Displayed verbatim by the host, which is French-language.
pub const MSG_FETCH_APP_DEF_FAILED: &str = "Erreur pendant la récupération des informations de l'application";
pub const MSG_FETCH_APP_CONFIG_FAILED: &str = "Erreur pendant la récupération de la configuration de l'application";
pub const MSG_SAVE_APP_CONFIG_FAILED: &str = "Erreur pendant l'enregistrement de la configuration de l'application";
pub const MSG_APP_CONFIG_SAVED: &str = "La configuration de l'application est enregistrée";
pub const MSG_FETCH_DATASET_FAILED: &str = "Erreur pendant la récupération des informations du jeu de données";
pub const MSG_FETCH_REMOTE_SERVICE_FAILED: &str = "Erreur pendant la récupération des informations du service distant";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    /// Raw underlying error for diagnostic display; absent on success messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "msg")]
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Notification {
            error: None,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>, error: impl Display) -> Self {
        Notification {
            error: Some(error.to_string()),
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
