//! Brings one address record in line with the current public IP.

use crate::config::{Config, ConfigSource, ReconciliationTarget, RecordType};
use crate::detector::IpDetector;
use crate::error::Result;
use crate::http::HttpCaller;
use crate::providers::GandiClient;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::Instrument;

/// What a successful reconciliation did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The record already held the current IP.
    Unchanged,
    /// No record existed; one was created.
    Created,
    /// The old record was deleted and a new one created.
    Replaced,
}

/// Result of reconciling one record type.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub record_type: RecordType,
    pub success: bool,
    pub ip: Option<String>,
    pub previous_ip: Option<String>,
    pub outcome: Option<Outcome>,
    pub error: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ReconcileReport {
    fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            success: false,
            ip: None,
            previous_ip: None,
            outcome: None,
            error: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

pub struct Reconciler {
    detector: IpDetector,
    gandi: GandiClient,
}

impl Reconciler {
    pub fn new(caller: Arc<dyn HttpCaller>) -> Self {
        Self::with_detector(IpDetector::new(caller.clone()), caller)
    }

    /// Use a specific detector, e.g. one pointed at a test endpoint.
    pub fn with_detector(detector: IpDetector, caller: Arc<dyn HttpCaller>) -> Self {
        Self {
            detector,
            gandi: GandiClient::new(caller),
        }
    }

    /// Reconcile `target` against the live record.
    ///
    /// The public IP and the existing value are each read exactly once; a
    /// record that changes underneath us between those reads is not handled.
    /// Replacement is delete followed by create, so a failed create leaves the
    /// record absent until the next run.
    pub async fn reconcile(&self, target: &ReconciliationTarget) -> Result<Outcome> {
        let mut observed = None;
        self.converge(target, &mut observed)
            .await
            .map(|(outcome, _)| outcome)
    }

    /// Resolve, read and write for one target. The resolved address is stored
    /// in `observed` as soon as it is known, so callers keep it on failure.
    async fn converge(
        &self,
        target: &ReconciliationTarget,
        observed: &mut Option<String>,
    ) -> Result<(Outcome, Option<String>)> {
        let current = self.detector.detect(target.ip_version).await?;
        let current = observed.insert(current).as_str();

        let url = target.api_url.as_str();
        let token = target.api_token.as_str();

        let existing = self.gandi.fetch_record(url, token).await?;

        let outcome = match existing.as_deref() {
            None => {
                self.gandi.create_record(url, current, target.ttl, token).await?;
                Outcome::Created
            }
            Some(old) if same_address(old, current) => {
                tracing::debug!("Record already points at {}", current);
                Outcome::Unchanged
            }
            Some(old) => {
                tracing::info!("Replacing {} with {}", old, current);
                self.gandi.delete_record(url, token).await?;
                self.gandi.create_record(url, current, target.ttl, token).await?;
                Outcome::Replaced
            }
        };

        Ok((outcome, existing))
    }

    /// Load configuration and reconcile one record type, absorbing any failure
    /// into the returned report.
    pub async fn run(&self, record_type: RecordType, source: &dyn ConfigSource) -> ReconcileReport {
        let span = tracing::info_span!("reconcile", record = %record_type);
        let mut report = ReconcileReport::new(record_type);

        let target = match Config::from_source(source) {
            Ok(config) => ReconciliationTarget::new(&config, record_type),
            Err(e) => {
                span.in_scope(|| tracing::error!("{}", e));
                report.error = Some(e.to_string());
                return report;
            }
        };

        let result = self
            .converge(&target, &mut report.ip)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        match result {
            Ok((outcome, previous)) => {
                tracing::info!(
                    "Successfully updated record {} with IP {}",
                    record_type,
                    report.ip.as_deref().unwrap_or_default()
                );
                report.success = true;
                report.outcome = Some(outcome);
                report.previous_ip = previous;
            }
            Err(e) => {
                tracing::error!("Could not update record {}. {}", record_type, e);
                report.error = Some(e.to_string());
            }
        }

        report.timestamp = chrono::Utc::now();
        report
    }

    /// Reconcile `A` then `AAAA`, one after the other.
    pub async fn run_all(&self, source: &dyn ConfigSource) -> Vec<ReconcileReport> {
        let mut reports = Vec::with_capacity(RecordType::ALL.len());
        for record_type in RecordType::ALL {
            reports.push(self.run(record_type, source).await);
        }
        reports
    }
}

/// Compare two textual addresses, ignoring formatting differences such as
/// IPv6 zero compression.
fn same_address(a: &str, b: &str) -> bool {
    match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
