//! Integration tests for the CLI front door.

use std::fs;

use tempfile::TempDir;

use typecorr::cli::{format_outcome, run_analyze};
use typecorr::config::CliOverrides;
use typecorr::output::{emit_response, AnalyzeResponse};
use typecorr::sections::Section;
use typecorr::store;

const SOURCE: &str = r#"
def area(width, height=None):
    """Area of a rectangle.

    Parameters
    ----------
    width : float
    height : float, optional

    Returns
    -------
    float
    """
"#;

fn package() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("geom");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("__init__.py"), SOURCE).unwrap();
    dir
}

#[test]
fn analyze_uses_project_config_file() {
    let dir = package();
    fs::write(
        dir.path().join("typecorr.toml"),
        "dump_all = false\noutput_dir = \"reports\"\n",
    )
    .unwrap();

    let outcome = run_analyze(&dir.path().join("geom"), &CliOverrides::default()).unwrap();
    assert_eq!(outcome.summary.trivial, 3);
    assert_eq!(outcome.summary.missed, 0);
    assert!(dir.path().join("reports/geom.fullmap.json").exists());

    let text = format_outcome(&outcome);
    assert!(text.starts_with("Trivial: 3, Mapped: 0, Missed: 0\n"));
    assert!(text.lines().any(|l| l == "float#float"));
}

#[test]
fn cli_flags_override_the_config_file() {
    let dir = package();
    fs::write(dir.path().join("typecorr.toml"), "dump_all = false\n").unwrap();

    let cli = CliOverrides {
        dump_all: Some(true),
        include_counts: Some(false),
        output_dir: Some(dir.path().join("out")),
        ..CliOverrides::default()
    };
    let outcome = run_analyze(&dir.path().join("geom"), &cli).unwrap();
    assert_eq!(outcome.summary.missed, 3);

    let report =
        fs::read_to_string(store::report_path(&dir.path().join("out"), "geom", Section::Params))
            .unwrap();
    assert_eq!(report, "@#float#float\n");
}

#[test]
fn json_response_reports_the_pass() {
    let dir = package();
    let outcome = run_analyze(&dir.path().join("geom"), &CliOverrides::default()).unwrap();

    let mut buf = Vec::new();
    emit_response(&AnalyzeResponse::from_outcome(&outcome), &mut buf).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(json["package"], "geom");
    assert_eq!(json["files_analyzed"], 1);
    assert_eq!(json["summary"]["missed"], 3);
}

#[test]
fn bad_config_file_is_an_invalid_argument() {
    let dir = package();
    fs::write(dir.path().join("typecorr.toml"), "unknown_key = 1\n").unwrap();
    let err = run_analyze(&dir.path().join("geom"), &CliOverrides::default()).unwrap_err();
    assert_eq!(err.error_code().code(), 2);
}
