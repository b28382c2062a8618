use std::fmt;

/// Data-integrity violation observed during an aggregation pass.
///
/// Anomalies are carried as values and logged by callers; they never abort
/// the pass that found them. Which datum is kept follows the documented
/// first-observed / earliest-match rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityAnomaly {
    /// One session id observed under two machine ids. The first machine is
    /// kept; the groups are not merged.
    SessionSpansMachines {
        session_id: String,
        kept: String,
        observed: String,
    },

    /// A machine carried more than one license key matching the table. The
    /// earliest match is kept.
    ConflictingLicenseKeys {
        machine_id: String,
        kept: String,
        ignored: String,
    },
}

impl fmt::Display for IntegrityAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityAnomaly::SessionSpansMachines {
                session_id,
                kept,
                observed,
            } => write!(
                f,
                "session {} spans machines: kept {}, also observed {}",
                session_id, kept, observed
            ),
            IntegrityAnomaly::ConflictingLicenseKeys {
                machine_id,
                kept,
                ignored,
            } => write!(
                f,
                "machine {} used conflicting license keys: kept {}, ignored {}",
                machine_id, kept, ignored
            ),
        }
    }
}
