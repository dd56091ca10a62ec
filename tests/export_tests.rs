// CSV and JSON exports written by the binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn presenca(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("presenca").unwrap();
    cmd.current_dir(workdir.path())
        .env_remove("RUST_LOG")
        .env("PRESENCA_SNAPSHOT", fixture("attendance.json"));
    cmd
}

/// The single file in `dir` whose name starts with `prefix`
fn exported(dir: &Path, prefix: &str) -> PathBuf {
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(prefix)
        })
        .collect();
    assert_eq!(matches.len(), 1, "expected one {} file", prefix);
    matches.remove(0)
}

// ============================================================================
// CSV
// ============================================================================

#[test]
fn test_export_csv_rows_and_header() {
    let dir = TempDir::new().unwrap();
    presenca(&dir)
        .arg("export-csv")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dados exportados para:"))
        .stdout(predicate::str::contains("Total de registros exportados: 9"));

    let path = exported(dir.path(), "firebase-export-");
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with(".csv"));
    assert_eq!(name.len(), "firebase-export-2025-08-17_14-03-09.csv".len());

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(
        lines[0],
        "Nome,CPF,Status,Região,Cargo,Pastor,Data,Justificativa"
    );
    // Newest first, untimed last
    assert!(lines[1].starts_with("Pedro Alves,555.555.555-55,Ausente,Leste,,,18/08/2025 00:00:00,"));
    assert!(lines[9].starts_with("Rafael Nunes,N/A,Presente,Sul,,,,"));
}

#[test]
fn test_export_csv_always_carries_reason() {
    let dir = TempDir::new().unwrap();
    presenca(&dir).arg("exportar").assert().success();

    let text = fs::read_to_string(exported(dir.path(), "firebase-export-")).unwrap();
    // Presente record keeps its reason in the export
    assert!(text.contains("Motivo esquecido"));
    assert!(text.contains("\"Consulta médica, retorno\""));

    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 9);
    let beatriz = rows.iter().find(|r| &r[0] == "Beatriz Costa").unwrap();
    assert_eq!(&beatriz[1], "222.222.222-22");
    assert_eq!(&beatriz[2], "Justificado");
    assert_eq!(&beatriz[6], "10/08/2025 10:00:00");
    assert_eq!(&beatriz[7], "Consulta médica, retorno");
}

#[test]
fn test_export_csv_to_output_dir() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    presenca(&dir)
        .arg("export-csv")
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success();
    exported(out.path(), "firebase-export-");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_export_csv_into_missing_dir_fails() {
    let dir = TempDir::new().unwrap();
    presenca(&dir)
        .args(["export-csv", "--output-dir", "no/such/dir"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("❌ Erro ao exportar CSV"));
}

// ============================================================================
// JSON backup
// ============================================================================

#[test]
fn test_export_json_backup_can_be_reread() {
    let dir = TempDir::new().unwrap();
    presenca(&dir)
        .arg("export-json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total de registros exportados: 9"));

    let backup = exported(dir.path(), "firebase-backup-");
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&backup).unwrap()).unwrap();
    assert_eq!(value["collections"]["attendance"].as_array().unwrap().len(), 9);

    let other = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("presenca").unwrap();
    cmd.current_dir(other.path())
        .env("PRESENCA_SNAPSHOT", &backup)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total de registros: 9"))
        .stdout(predicate::str::contains("Presente: 5 (55.6%)"));
}
