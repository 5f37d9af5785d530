use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn vp_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("vp");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    // Library with one book per testament
    let ot = root.join("baiboly/Testameta taloha");
    let nt = root.join("baiboly/Testameta vaovao");
    fs::create_dir_all(&ot).unwrap();
    fs::create_dir_all(&nt).unwrap();
    fs::write(
        ot.join("genesisy.json"),
        r#"{"meta": {"name": "Genesisy", "order": 1, "chapter_number": 50},
            "1": {"1": "Tamin'ny voalohany Andriamanitra nahary ny lanitra sy ny tany.",
                  "2": "Ary ny tany dia tsy nisy endrika sady foana."}}"#,
    )
    .unwrap();
    fs::write(
        nt.join("jaona.json"),
        r#"{"meta": {"name": "Jaona", "order": 43},
            "3": {"16": "Fa toy izao no nitiavan'Andriamanitra izao tontolo izao.",
                  "17": "Fa Andriamanitra tsy naniraka ny Zanaka ho amin'izao tontolo izao."},
            "11": {"35": "Nitomany Jesosy."}}"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/vp.sqlite"

[library]
root = "{root}/baiboly"

[projection]
cols = 48
rows = 8

[control]
version = "MG 1865"
versions = ["MG 1865", "KJV"]
"#,
        root = root.display()
    );

    let config_path = config_dir.join("vp.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_vp(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = vp_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run vp binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_vp_with_stdin(config_path: &Path, args: &[&str], input: &str) -> (String, String, bool) {
    let binary = vp_binary();
    let mut child = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to run vp binary at {:?}: {}", binary, e));

    // The child may exit before reading its input
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(input.as_bytes());
    }
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_vp(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));

    let (_, _, success) = run_vp(&config_path, &["init"]);
    assert!(success, "Second init failed (not idempotent)");
}

#[test]
fn test_import_library() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_vp(&config_path, &["import"]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("books inserted: 2"), "got: {}", stdout);
    assert!(stdout.contains("verses inserted: 5"), "got: {}", stdout);
    assert!(stdout.contains("ok"));
}

#[test]
fn test_import_skipped_when_initialized() {
    let (_tmp, config_path) = setup_test_env();

    run_vp(&config_path, &["import"]);
    let (stdout, _, success) = run_vp(&config_path, &["import"]);
    assert!(success);
    assert!(stdout.contains("already initialized"), "got: {}", stdout);

    // Forced reimport inserts nothing new
    let (stdout, _, success) = run_vp(&config_path, &["import", "--force"]);
    assert!(success);
    assert!(stdout.contains("verses inserted: 0"), "got: {}", stdout);

    // Reset starts over
    let (stdout, _, success) = run_vp(&config_path, &["import", "--reset"]);
    assert!(success);
    assert!(stdout.contains("verses inserted: 5"), "got: {}", stdout);
}

#[test]
fn test_import_missing_testament_fails() {
    let (tmp, config_path) = setup_test_env();
    fs::remove_dir_all(tmp.path().join("baiboly/Testameta vaovao")).unwrap();

    let (_, stderr, success) = run_vp(&config_path, &["import"]);
    assert!(!success, "import should fail without the new testament");
    assert!(stderr.contains("Testameta vaovao"), "got: {}", stderr);
}

#[test]
fn test_search_finds_verse() {
    let (_tmp, config_path) = setup_test_env();

    run_vp(&config_path, &["import"]);
    let (stdout, stderr, success) = run_vp(&config_path, &["search", "Nitomany"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("Jaona 11:35"), "got: {}", stdout);

    let (stdout, _, success) = run_vp(&config_path, &["search", "Mosesy"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_books_lists_both_testaments() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_vp(&config_path, &["books"]);
    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "got: {}", stdout);
    assert!(lines[0].starts_with("taloha"));
    assert!(lines[0].contains("Genesisy"));
    assert!(lines[1].starts_with("vaovao"));
    assert!(lines[1].contains("Testameta vaovao/jaona.json"));
}

#[test]
fn test_paginate_prints_slides() {
    let (_tmp, config_path) = setup_test_env();

    let text = "Fa toy izao no nitiavan'Andriamanitra izao tontolo izao. \
        Nomeny ny Zanani-lahy Tokana. Mba tsy ho very izay rehetra mino Azy.";
    let (stdout, _, success) = run_vp(
        &config_path,
        &["paginate", text, "--cols", "30", "--rows", "2"],
    );
    assert!(success);
    let slides: Vec<&str> = stdout.lines().collect();
    assert!(slides.len() > 1, "got: {}", stdout);
    assert!(slides[0].starts_with(&format!("[1/{}]", slides.len())));
}

#[test]
fn test_project_next_moves_to_next_verse() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_vp_with_stdin(
        &config_path,
        &["project", "Jaona", "--chapter", "3", "--verses", "16,17"],
        "n\nq\n",
    );
    assert!(success, "project failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Jaona 3:16,17:16"), "got: {}", stdout);
    assert!(stdout.contains("Jaona 3:16,17:17"), "got: {}", stdout);
    assert!(stdout.contains("MG 1865"));
    assert!(stdout.contains("17. Fa Andriamanitra"));
}

#[test]
fn test_project_unknown_book_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_vp_with_stdin(&config_path, &["project", "Matio"], "q\n");
    assert!(!success);
    assert!(stderr.contains("Unknown book"), "got: {}", stderr);
}

#[test]
fn test_project_rejects_unlisted_version() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_vp_with_stdin(
        &config_path,
        &["project", "Jaona", "--version", "NIV"],
        "q\n",
    );
    assert!(!success);
    assert!(stderr.contains("Unknown version 'NIV'"), "got: {}", stderr);
}
