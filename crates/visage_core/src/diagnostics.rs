//! Diagnostic sink.
//!
//! The engine publishes a [`DiagnosticReport`] whenever it binds a new asset
//! and clears it when the asset is discarded. Observability tooling holds
//! [`DiagnosticsReader`] handles, which can only read.
//!
//! The report carries no behavioural contract; it exists so that a host can
//! show which tier is active and which nodes were bound to which roles.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Snapshot of what the engine resolved for the current asset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticReport {
    /// Active fallback tier label (`morph`, `bone`, `mesh-transform`).
    pub tier: String,
    /// `(role label, node name)` for every bound singleton role.
    pub roles: Vec<(String, String)>,
    /// Number of resolved hair meshes.
    pub hair_count: usize,
    /// Labels of the semantic channels found on the head mesh.
    pub channels: Vec<String>,
    /// Total morph targets on the bound head mesh (0 when unbound).
    pub morph_count: usize,
}

impl DiagnosticReport {
    /// Name bound to `role`, if any.
    #[must_use]
    pub fn role(&self, role: &str) -> Option<&str> {
        self.roles
            .iter()
            .find(|(label, _)| label == role)
            .map(|(_, name)| name.as_str())
    }
}

/// Roles printed even when unbound.
const ALWAYS_SHOWN: [&str; 2] = ["head", "jaw"];

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier={}", self.tier)?;
        for role in ALWAYS_SHOWN {
            write!(f, " {role}={}", self.role(role).unwrap_or("-"))?;
        }
        for (role, name) in &self.roles {
            if !ALWAYS_SHOWN.contains(&role.as_str()) {
                write!(f, " {role}={name}")?;
            }
        }
        write!(
            f,
            " hair={} channels={}/{}",
            self.hair_count,
            self.channels.len(),
            self.morph_count
        )?;
        if !self.channels.is_empty() {
            write!(f, " [{}]", self.channels.join(", "))?;
        }
        Ok(())
    }
}

type Slot = Arc<RwLock<Option<DiagnosticReport>>>;

/// Writer side of the diagnostics channel, owned by the engine.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    slot: Slot,
}

impl DiagnosticSink {
    /// Creates an empty sink. Readers created from it see `None` until the
    /// first [`publish`](Self::publish).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current report.
    pub fn publish(&self, report: DiagnosticReport) {
        log::debug!("diagnostics: {report}");
        *self.slot.write() = Some(report);
    }

    /// Drops the current report (asset discarded).
    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    /// Creates a read-only handle onto this sink.
    #[must_use]
    pub fn reader(&self) -> DiagnosticsReader {
        DiagnosticsReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Read-only view of a [`DiagnosticSink`]. Cheap to clone and `Send + Sync`.
#[derive(Debug, Clone)]
pub struct DiagnosticsReader {
    slot: Slot,
}

impl DiagnosticsReader {
    /// Returns a copy of the current report.
    #[must_use]
    pub fn snapshot(&self) -> Option<DiagnosticReport> {
        self.slot.read().clone()
    }

    /// One-line rendering of the current report, or `"unbound"`.
    #[must_use]
    pub fn text(&self) -> String {
        self.slot
            .read()
            .as_ref()
            .map_or_else(|| "unbound".to_string(), ToString::to_string)
    }
}
