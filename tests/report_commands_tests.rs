// Console report verbs, driven end to end against the JSON snapshot fixture

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Binary pointed at a snapshot, isolated from the caller's environment
/// and from any presenca.toml in the working directory
fn presenca(snapshot: &str, workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("presenca").unwrap();
    cmd.current_dir(workdir.path())
        .env_remove("FIRESTORE_PROJECT_ID")
        .env_remove("FIRESTORE_ACCESS_TOKEN")
        .env_remove("FIRESTORE_ENDPOINT")
        .env_remove("RUST_LOG")
        .env("PRESENCA_SNAPSHOT", fixture(snapshot));
    cmd
}

// ============================================================================
// list-collections
// ============================================================================

#[test]
fn test_list_collections() {
    let dir = TempDir::new().unwrap();
    presenca("attendance.json", &dir)
        .arg("list-collections")
        .assert()
        .success()
        .stdout(predicate::str::contains("COLEÇÕES DISPONÍVEIS"))
        .stdout(predicate::str::contains("  - attendance"))
        .stdout(predicate::str::contains("  - users"));
}

// ============================================================================
// list-latest
// ============================================================================

#[test]
fn test_list_latest_newest_first() {
    let dir = TempDir::new().unwrap();
    let output = presenca("attendance.json", &dir)
        .args(["list-latest", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("ÚLTIMOS 3 REGISTROS DE PRESENÇA"));
    let a6 = stdout.find("ID: a6").unwrap();
    let a5 = stdout.find("ID: a5").unwrap();
    let a4 = stdout.find("ID: a4").unwrap();
    assert!(a6 < a5 && a5 < a4);
    assert!(!stdout.contains("ID: a3"));
    assert!(stdout.contains("Data: 18/08/2025 00:00:00"));
    assert!(stdout.contains("Justificativa: Doença"));
    assert!(stdout.contains("Total exibido: 3 registros"));
}

#[test]
fn test_list_latest_untimed_last_and_defaults() {
    let dir = TempDir::new().unwrap();
    let output = presenca("attendance.json", &dir)
        .arg("list-latest")
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("ÚLTIMOS 10 REGISTROS"));
    assert!(stdout.contains("Total exibido: 9 registros"));
    let a8 = stdout.find("ID: a8").unwrap();
    let a9 = stdout.find("ID: a9").unwrap();
    assert!(a8 < a9);
    assert!(stdout.contains("Data: N/A"));
    assert!(stdout.contains("CPF: N/A"));
    // Reason on a Presente record stays hidden
    assert!(!stdout.contains("Motivo esquecido"));
}

#[test]
fn test_list_latest_empty_collection() {
    let dir = TempDir::new().unwrap();
    presenca("empty.json", &dir)
        .args(["listar", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nenhum registro encontrado"))
        .stdout(predicate::str::contains("📋 ID:").not())
        .stdout(predicate::str::contains("Total exibido: 0 registros"));
}

#[test]
fn test_list_latest_negative_limit() {
    let dir = TempDir::new().unwrap();
    presenca("attendance.json", &dir)
        .args(["list-latest", "-3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ÚLTIMOS 0 REGISTROS"))
        .stdout(predicate::str::contains("-3").not())
        .stdout(predicate::str::contains("Total exibido: 0 registros"));
}

#[test]
fn test_list_latest_zero_limit() {
    let dir = TempDir::new().unwrap();
    presenca("attendance.json", &dir)
        .args(["list-latest", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nenhum registro encontrado"));
}

// ============================================================================
// stats
// ============================================================================

#[test]
fn test_stats_counts_and_percentages() {
    let dir = TempDir::new().unwrap();
    presenca("attendance.json", &dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total de registros: 9"))
        .stdout(predicate::str::contains("Ausente: 1 (11.1%)"))
        .stdout(predicate::str::contains("Justificado: 3 (33.3%)"))
        .stdout(predicate::str::contains("Presente: 5 (55.6%)"))
        .stdout(predicate::str::contains("Norte: 3 (33.3%)"))
        .stdout(predicate::str::contains("Sem região: 1 (11.1%)"))
        .stdout(predicate::str::contains("🏆 Mais frequente: Presente (5)"))
        .stdout(predicate::str::contains("🏆 Mais frequente: Norte (3)"));
}

#[test]
fn test_stats_on_empty_collection() {
    let dir = TempDir::new().unwrap();
    presenca("empty.json", &dir)
        .arg("estatisticas")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total de registros: 0"))
        .stdout(predicate::str::contains("Por Status").not());
}

// ============================================================================
// filter-by-status
// ============================================================================

#[test]
fn test_filter_by_status_justificado() {
    let dir = TempDir::new().unwrap();
    let output = presenca("attendance.json", &dir)
        .args(["filter-by-status", "Justificado"])
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("REGISTROS COM STATUS: Justificado"));
    assert_eq!(stdout.matches("  • ").count(), 3);
    assert!(stdout.contains("• Carlos Dias (N/A) - 17/08/2025"));
    assert!(stdout.contains("Motivo: Consulta médica, retorno"));
    let carlos = stdout.find("Carlos Dias").unwrap();
    let joao = stdout.find("João Souza").unwrap();
    let beatriz = stdout.find("Beatriz Costa").unwrap();
    assert!(carlos < joao && joao < beatriz);
    assert!(stdout.contains("Total encontrado: 3 registros"));
}

#[test]
fn test_filter_by_unknown_status() {
    let dir = TempDir::new().unwrap();
    presenca("attendance.json", &dir)
        .args(["status", "Atrasado"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Nenhum registro encontrado com status 'Atrasado'",
        ));
}

// ============================================================================
// day-report
// ============================================================================

#[test]
fn test_day_report_default_day() {
    let dir = TempDir::new().unwrap();
    let output = presenca("attendance.json", &dir)
        .arg("day-report")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("RELATÓRIO DO DIA 17 DE AGOSTO DE 2025"));
    assert!(stdout.contains("TOTAL DE REGISTROS: 5"));
    // Day edges in -04:00
    assert!(stdout.contains("Maria Silva"));
    assert!(stdout.contains("maria silva"));
    assert!(!stdout.contains("Pedro Alves"));
    assert!(!stdout.contains("Lucas Rocha"));

    assert!(stdout.contains("✅ Presente: 3 pessoa(s)"));
    assert!(stdout.contains("📝 Justificado: 2 pessoa(s)"));
    assert!(stdout.contains("📍 N/A: 1 pessoa(s)"));
    assert!(stdout.contains(" 1. ✅ Maria Silva"));
    assert!(stdout.contains("Justificativa: Viagem a trabalho"));
    assert!(stdout.contains("Primeiro Registro: 00:00:00"));
    assert!(stdout.contains("Último Registro: 23:59:59"));
    assert!(stdout.contains("Presente: 3 (60.0%)"));
    assert!(stdout.contains("Justificado: 2 (40.0%)"));
    assert!(stdout.contains("RELATÓRIO CONCLUÍDO COM SUCESSO"));
}

#[test]
fn test_day_report_other_offset_moves_edges() {
    // In UTC the 17th covers a7 (03:59:59Z) but not a5 (18th 03:59:59Z)
    let dir = TempDir::new().unwrap();
    let output = presenca("attendance.json", &dir)
        .args(["day-report", "--date", "2025-08-17", "--utc-offset", "+00:00"])
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("TOTAL DE REGISTROS: 5"));
    assert!(stdout.contains("Lucas Rocha"));
    assert!(!stdout.contains("maria silva"));
}

#[test]
fn test_day_report_empty_day() {
    let dir = TempDir::new().unwrap();
    presenca("attendance.json", &dir)
        .args(["day-report", "--date", "2025-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "NENHUM REGISTRO ENCONTRADO PARA O DIA 01/01/2025",
        ));
}

// ============================================================================
// duplicates / daily-summary
// ============================================================================

#[test]
fn test_duplicates() {
    let dir = TempDir::new().unwrap();
    presenca("attendance.json", &dir)
        .arg("duplicates")
        .assert()
        .success()
        .stdout(predicate::str::contains("CPFs únicos: 6"))
        .stdout(predicate::str::contains("CPFs com duplicatas: 2"))
        .stdout(predicate::str::contains("PROVÁVEL DUPLICATA REAL"))
        .stdout(predicate::str::contains("POSSÍVEL CPF COMPARTILHADO"));
}

#[test]
fn test_daily_summary_week() {
    let dir = TempDir::new().unwrap();
    presenca("attendance.json", &dir)
        .arg("daily-summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("ÚLTIMOS 7 DIAS"))
        .stdout(predicate::str::contains(
            "sáb. 16/08: 1 total, 1 presentes, 0 justificados (100.0%)",
        ))
        .stdout(predicate::str::contains(
            "dom. 17/08: 5 total, 3 presentes, 2 justificados (60.0%)",
        ))
        .stdout(predicate::str::contains("seg. 11/08: 0 total"));
}

// ============================================================================
// run-all and failure handling
// ============================================================================

#[test]
fn test_run_all_sections_in_order() {
    let dir = TempDir::new().unwrap();
    let output = presenca("attendance.json", &dir)
        .arg("tudo")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    let collections = stdout.find("COLEÇÕES DISPONÍVEIS").unwrap();
    let stats = stdout.find("ESTATÍSTICAS DOS REGISTROS").unwrap();
    let latest = stdout.find("ÚLTIMOS 5 REGISTROS").unwrap();
    assert!(collections < stats && stats < latest);
    assert_eq!(stdout.matches(&"=".repeat(50)).count(), 2);
    assert!(stdout.contains("Total exibido: 5 registros"));
}

#[test]
fn test_missing_snapshot_is_fatal() {
    let dir = TempDir::new().unwrap();
    presenca("does-not-exist.json", &dir)
        .arg("stats")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Snapshot file not found"));
}

#[test]
fn test_firestore_without_project_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("presenca").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("PRESENCA_SNAPSHOT")
        .env_remove("FIRESTORE_PROJECT_ID")
        .arg("stats")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("project_id"));
}

#[test]
fn test_unreachable_store_fails_each_section() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("presenca").unwrap();
    let output = cmd
        .current_dir(dir.path())
        .env_remove("PRESENCA_SNAPSHOT")
        .env_remove("FIRESTORE_ACCESS_TOKEN")
        .args([
            "run-all",
            "--project",
            "demo",
            "--endpoint",
            "http://127.0.0.1:9",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("❌ Erro ao listar coleções"));
    assert!(stderr.contains("❌ Erro ao gerar estatísticas"));
    assert!(stderr.contains("❌ Erro ao listar registros"));
}

#[test]
fn test_unknown_verb() {
    let dir = TempDir::new().unwrap();
    presenca("attendance.json", &dir)
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_config_file_sets_collection() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("presenca.toml"),
        "[meeting]\ncollection = \"users\"\n",
    )
    .unwrap();
    presenca("attendance.json", &dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total de registros: 1"));
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.toml");
    std::fs::write(&config, "[meeting\n").unwrap();
    presenca("attendance.json", &dir)
        .arg("--config")
        .arg(&config)
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_zero_timeout_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("presenca.toml");
    std::fs::write(&config, "[store]\ntimeout_secs = 0\n").unwrap();
    presenca("attendance.json", &dir)
        .arg("--config")
        .arg(&config)
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_secs must be at least 1"));
}
