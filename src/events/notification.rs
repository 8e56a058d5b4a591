use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// User-visible outcomes the manager reports.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    /// a node update could not be applied
    ClientUpdateError,
    /// a node update completed
    ClientUpdated,
}

impl NotificationKind {
    pub fn severity(&self) -> Severity {
        match self {
            NotificationKind::ClientUpdateError => Severity::Warning,
            NotificationKind::ClientUpdated => Severity::Info,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub severity: Severity,
    pub display_name: String,
    pub timestamp: i64,
}

/// Sink for user-visible notifications. Delivery must not block the caller.
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        kind: NotificationKind,
        display_name: &str,
    );
}
