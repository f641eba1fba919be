//! One serializable record per processed item, for JSON-lines audit logs.

use crate::batch::{ItemReport, Outcome};
use hardbound_link::{LinkAction, Method};
use serde::Serialize;
use std::path::PathBuf;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditStatus {
    Planned,
    Linked,
    Copied,
    Replaced,
    AlreadyLinked,
    Failed,
}
impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Linked => "linked",
            Self::Copied => "copied",
            Self::Replaced => "replaced",
            Self::AlreadyLinked => "already-linked",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub source: PathBuf,
    pub folder: Option<String>,
    pub file: Option<String>,
    pub length: Option<usize>,
    pub cap: usize,
    pub steps: Vec<String>,
    pub extension: Option<String>,
    pub status: AuditStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub companion_errors: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub processed_at: OffsetDateTime,
}
impl AuditRecord {
    pub fn new(report: &ItemReport, cap: usize, processed_at: OffsetDateTime) -> Self {
        let outcome = match &report.result {
            Ok(outcome) => outcome,
            Err(failure) => {
                return Self {
                    source: report.item.source.clone(),
                    folder: None,
                    file: None,
                    length: None,
                    cap,
                    steps: Vec::new(),
                    extension: None,
                    status: AuditStatus::Failed,
                    error: Some(format!("{}: {}", failure.kind, failure.message)),
                    companion_errors: Vec::new(),
                    processed_at,
                };
            },
        };
        let resolution = &outcome.resolution;
        let status = match &outcome.outcome {
            Outcome::Planned => AuditStatus::Planned,
            Outcome::Linked(LinkAction::AlreadyLinked(_)) => AuditStatus::AlreadyLinked,
            Outcome::Linked(LinkAction::Replaced { .. }) => AuditStatus::Replaced,
            Outcome::Linked(LinkAction::Created { method: Method::Copy, .. }) => AuditStatus::Copied,
            Outcome::Linked(LinkAction::Created { method: Method::Hardlink, .. }) => AuditStatus::Linked,
        };
        Self {
            source: report.item.source.clone(),
            folder: Some(resolution.destination.folder.clone()),
            file: Some(resolution.destination.file.clone()),
            length: Some(resolution.length),
            cap,
            steps: resolution.steps.iter().map(ToString::to_string).collect(),
            extension: Some(resolution.extension.clone()),
            status,
            error: None,
            companion_errors: outcome.companion_errors.clone(),
            processed_at,
        }
    }

    /// A record stamped with the current UTC time.
    pub fn now(report: &ItemReport, cap: usize) -> Self {
        Self::new(report, cap, OffsetDateTime::now_utc())
    }
}
