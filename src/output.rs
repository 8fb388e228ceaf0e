//! JSON output for `typecorr analyze --json`.
//!
//! The output is deterministic: the same pass produces identical bytes.

use std::io::{self, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use typecorr_python::PassOutcome;

/// Output schema version.
pub const SCHEMA_VERSION: &str = "1";

/// Occurrence totals of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryInfo {
    pub trivial: usize,
    pub mapped: usize,
    pub missed: usize,
}

/// A file that failed to parse or walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub file: String,
    /// Exit code category of the failure.
    pub code: u8,
    pub message: String,
}

/// Response for a completed analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    pub package: String,
    pub files_analyzed: usize,
    pub summary: SummaryInfo,
    /// Suppressed trivial entries, `raw -> canonical`.
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub trivials: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<FailureInfo>,
}

impl AnalyzeResponse {
    pub fn from_outcome(outcome: &PassOutcome) -> Self {
        AnalyzeResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            package: outcome.package.clone(),
            files_analyzed: outcome.files_analyzed,
            summary: SummaryInfo {
                trivial: outcome.summary.trivial,
                mapped: outcome.summary.mapped,
                missed: outcome.summary.missed,
            },
            trivials: outcome.trivials.clone(),
            failures: outcome
                .failures
                .iter()
                .map(|f| FailureInfo {
                    file: f.file.clone(),
                    code: f.error.error_code().code(),
                    message: f.error.to_string(),
                })
                .collect(),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use typecorr_core::aggregate::Summary;
    use typecorr_core::error::TypecorrError;
    use typecorr_core::sections::Sections;
    use typecorr_python::FileFailure;

    fn outcome(failures: Vec<FileFailure>) -> PassOutcome {
        PassOutcome {
            package: "pkg".to_string(),
            summary: Summary {
                trivial: 0,
                mapped: 2,
                missed: 5,
            },
            trivials: IndexMap::new(),
            reports: Sections::default(),
            failures,
            files_analyzed: 3,
        }
    }

    #[test]
    fn clean_pass_omits_empty_lists() {
        let response = AnalyzeResponse::from_outcome(&outcome(Vec::new()));
        let mut buf = Vec::new();
        emit_response(&response, &mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["summary"]["missed"], 5);
        assert!(json.get("failures").is_none());
        assert!(json.get("trivials").is_none());
    }

    #[test]
    fn failures_carry_their_exit_code() {
        let response = AnalyzeResponse::from_outcome(&outcome(vec![FileFailure {
            file: "pkg/bad.py".to_string(),
            error: TypecorrError::Parse {
                file: "pkg/bad.py".to_string(),
                message: "syntax error".to_string(),
            },
        }]));
        assert_eq!(response.failures[0].code, 3);
        assert!(response.failures[0].message.contains("pkg/bad.py"));
    }
}
