use std::path::Path;
use std::process::{Command, Output};

fn microqr(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_microqr"))
        .args(args)
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("MICROQR_OUTPUT_DIR")
        .env_remove("MICROQR_LOG_LEVEL")
        .env_remove("MICROQR_LOG_FILE")
        .output()
        .expect("run microqr")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn text_output_goes_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let output = microqr(dir.path(), &["HELLO", "--format", "text", "--border", "1"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 8);
    assert!(stdout.contains('█'));
}

#[test]
fn svg_is_the_default_format() {
    let dir = tempfile::tempdir().unwrap();
    let output = microqr(dir.path(), &["Tiny", "-v", "3"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("<?xml"));
    // M3 is 15 modules + 2 * 4 border, 8 px per module
    assert!(stdout.contains("width=\"184\""));
}

#[test]
fn png_is_written_under_the_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output = microqr(
        dir.path(),
        &["HELLO", "--format", "png", "--size", "240", "-o", "code.png"],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("M2-L"), "stdout: {stdout}");

    let image = image::open(dir.path().join("qrcodes").join("code.png")).unwrap();
    // floor(240 / 21) = 11 px per module
    assert_eq!((image.width(), image.height()), (231, 231));
}

#[test]
fn png_without_output_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = microqr(dir.path(), &["HELLO", "--format", "png"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("requires an output filename"));
    assert!(!dir.path().join("qrcodes").exists());
}

#[test]
fn data_too_long_for_any_micro_version_fails() {
    let dir = tempfile::tempdir().unwrap();
    let digits = "7".repeat(201);
    let output = microqr(dir.path(), &[digits.as_str()]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Data too long"), "{}", stderr(&output));
}

#[test]
fn m1_with_error_correction_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = microqr(dir.path(), &["A", "-v", "1", "-e", "M"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unsupported Micro QR parameters"));
}

#[test]
fn config_file_supplies_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("microqr.json"),
        r#"{"defaults": {"format": "text", "border": 0}}"#,
    )
    .unwrap();

    let output = microqr(dir.path(), &["12345"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8(output.stdout).unwrap();
    // M1 is 11 modules wide, no border
    assert_eq!(stdout.lines().count(), 6);
    assert!(stdout.lines().all(|line| line.chars().count() == 11));
}

#[test]
fn broken_config_file_falls_back_with_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("microqr.json"), "{ broken").unwrap();

    let output = microqr(dir.path(), &["HELLO"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("microqr.json"), "stderr: {err}");
    assert!(err.contains("falling back"), "stderr: {err}");
    // built-in defaults: SVG on stdout
    assert!(String::from_utf8(output.stdout).unwrap().starts_with("<?xml"));
}

#[test]
fn init_config_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let output = microqr(dir.path(), &["--init-config", "microqr.toml"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let written = std::fs::read_to_string(dir.path().join("microqr.toml")).unwrap();
    assert!(written.contains("max_preview_size = 320"));
}
