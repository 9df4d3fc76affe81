use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;

const HEADER: &str = "DTMNFR;ORGAO;TIPO;SIGLA;SIMBOLO;NOME_LISTA;NUM_ORDEM;NOME_CANDIDATO;PARTIDO_PROPONENTE;INDEPENDENTE";

fn cmd() -> Command {
    Command::cargo_bin("cne-extract").expect("binary built")
}

fn write_csv(path: &Path, rows: &[&str]) {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    fs::write(path, text).expect("write csv fixture");
}

fn read_lines(path: &Path) -> Vec<String> {
    let text = fs::read_to_string(path).expect("read output");
    text.trim_start_matches('\u{feff}')
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn extract_writes_csv_qa_file_and_summary() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let input = dir.path().join("listas_2025_lisboa.txt");
    fs::write(
        &input,
        "Câmara Municipal\nLista A - PS\n1 João Silva\n2 Maria Sousa\nCandidatos suplentes:\n1 Rui Lopes\n",
    )
    .expect("write input");
    let out = dir.path().join("out").join("a.csv");

    cmd()
        .arg("extract")
        .arg("--input")
        .arg(&input)
        .args(["--operator", "A", "--qa", "--strict"])
        .arg("--out")
        .arg(&out)
        .arg("--cache-root")
        .arg(dir.path().join("cache"))
        .assert()
        .success()
        .stdout(contains("\"rows\": 3"))
        .stdout(contains("\"needs_review\": false"));

    let bytes = fs::read(&out).expect("read csv");
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));

    let lines = read_lines(&out);
    assert_eq!(lines[0], HEADER);
    assert_eq!(lines[1], "2025000000;CM;2;PS;;Lista A;1;João Silva;PS;N");
    assert_eq!(lines[3], "2025000000;CM;3;PS;;Lista A;1;Rui Lopes;PS;N");

    let qa = dir.path().join("out").join("a_qa.csv");
    assert_eq!(read_lines(&qa).len(), 1);
    assert!(dir.path().join("cache").join("cne_runs.sqlite").exists());
}

#[test]
fn extract_output_passes_validation() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let input = dir.path().join("listas_2025_porto.txt");
    fs::write(&input, "Assembleia Municipal\nLista D - ICA\n1 Rita Reis\n").expect("write input");
    let out = dir.path().join("d.csv");

    cmd()
        .arg("extract")
        .arg("--input")
        .arg(&input)
        .args(["--operator", "B"])
        .arg("--out")
        .arg(&out)
        .arg("--cache-root")
        .arg(dir.path())
        .assert()
        .success();

    cmd()
        .arg("validate")
        .arg("--csv")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("\"ok\": true"));
}

#[test]
fn strict_extract_rejects_coalition_fallback() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let input = dir.path().join("listas.txt");
    fs::write(&input, "Lista B - PPD/PSD.CDS-PP\n1 Ana Costa\n").expect("write input");
    let out = dir.path().join("b.csv");

    cmd()
        .arg("extract")
        .arg("--input")
        .arg(&input)
        .args(["--operator", "B", "--strict"])
        .arg("--out")
        .arg(&out)
        .arg("--cache-root")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(contains("strict mode"));

    assert!(!out.exists());
}

#[test]
fn extract_fails_fast_on_missing_input() {
    let dir = tempfile::tempdir().expect("create temp dir");

    cmd()
        .arg("extract")
        .arg("--input")
        .arg(dir.path().join("missing.txt"))
        .args(["--operator", "A"])
        .arg("--cache-root")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(contains("input file not found"));
}

#[test]
fn extract_rejects_unknown_operator() {
    cmd()
        .args(["extract", "--input", "x.txt", "--operator", "C"])
        .assert()
        .failure();
}

#[test]
fn merge_creates_file_and_reports_rows() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let csv_a = dir.path().join("csv_a.csv");
    let csv_b = dir.path().join("csv_b.csv");
    let out = dir.path().join("merged").join("final.csv");

    write_csv(&csv_a, &["2024;CM;2;AAA;SYM;Lista A;1;João Silva;Partido A;N"]);
    write_csv(
        &csv_b,
        &[
            "2024;CM;2;AAA;SYM;Lista A;1;João Silva;Partido A;N",
            "2024;AM;3;BBB;SYM;Lista B;2;Maria Souza;Partido B;S",
        ],
    );

    cmd()
        .arg("merge")
        .arg("--csv-a")
        .arg(&csv_a)
        .arg("--csv-b")
        .arg(&csv_b)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("\"rows\": 2"))
        .stdout(contains("\"only_in_B\""));

    let lines = read_lines(&out);
    assert_eq!(lines[0], HEADER);
    assert_eq!(lines.len(), 3);
    assert!(dir.path().join("merged").join("final_diff.json").exists());
}

#[test]
fn merge_defaults_to_latest_ledger_runs() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let cache = dir.path().join("cache");

    for (operator, body) in [
        ("A", "Lista A - PS\n1 João Silva\n2 Maria Sousa\n"),
        ("B", "Lista A - PS\n1 João Silva\n"),
    ] {
        let input = dir.path().join(format!("listas_{operator}.txt"));
        fs::write(&input, body).expect("write input");
        cmd()
            .arg("extract")
            .arg("--input")
            .arg(&input)
            .args(["--operator", operator])
            .arg("--cache-root")
            .arg(&cache)
            .assert()
            .success();
    }

    let out = dir.path().join("final.csv");
    cmd()
        .arg("merge")
        .arg("--cache-root")
        .arg(&cache)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("\"rows\": 2"))
        .stdout(contains("\"equal\": false"));

    cmd()
        .arg("status")
        .arg("--cache-root")
        .arg(&cache)
        .assert()
        .success()
        .stdout(contains("\"operator\": \"A\""))
        .stdout(contains("\"operator\": \"B\""));
}

#[test]
fn merge_without_ledger_fails() {
    let dir = tempfile::tempdir().expect("create temp dir");

    cmd()
        .arg("merge")
        .arg("--cache-root")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(contains("no run ledger"));
}

#[test]
fn validate_reports_missing_columns() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let csv = dir.path().join("partial.csv");
    fs::write(&csv, "DTMNFR;ORGAO;SIGLA\n2024;CM;PS\n").expect("write csv");

    cmd()
        .arg("validate")
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(contains("\"ok\": false"))
        .stdout(contains("missing_columns"))
        .stdout(contains("TIPO"));
}

#[test]
fn repair_fixes_mojibake_in_exported_csv() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let input = dir.path().join("broken.csv");
    let output = dir.path().join("fixed.csv");
    write_csv(&input, &["2024;CM;2;PS;;Lista A;1;JoÃ£o Silva;PS;N"]);

    cmd()
        .arg("repair")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(contains("\"changed_cells\": 1"));

    let lines = read_lines(&output);
    assert_eq!(lines[1], "2024;CM;2;PS;;Lista A;1;João Silva;PS;N");
}

#[test]
fn status_without_ledger_succeeds() {
    let dir = tempfile::tempdir().expect("create temp dir");

    cmd()
        .arg("status")
        .arg("--cache-root")
        .arg(dir.path())
        .assert()
        .success();
}

#[test]
fn status_fails_on_unreadable_ledger() {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(dir.path().join("cne_runs.sqlite"), "not a sqlite database").expect("write ledger");

    cmd()
        .arg("status")
        .arg("--cache-root")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(contains("ledger"));
}
