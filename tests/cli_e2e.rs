use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use walkdir::WalkDir;

const DARK_BLOCK: &str = "[data-color-mode='dark'] {\n  \
    --color-background: var(--palette-gray-900);\n  \
    --color-text: var(--palette-gray-100);\n}\n";

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tokensmith"))
}

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test_fixtures/project")
}

/// Copy the fixture project into a fresh temp dir
fn project() -> TempDir {
    let temp_dir = TempDir::new().expect("temp dir");
    let src = fixture_dir();
    for entry in WalkDir::new(&src).into_iter().filter_map(|e| e.ok()) {
        let relative = entry.path().strip_prefix(&src).expect("relative");
        let dest = temp_dir.path().join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).expect("mkdir");
        } else {
            fs::copy(entry.path(), &dest).expect("copy");
        }
    }
    temp_dir
}

fn run(root: &Path, args: &[&str]) -> Output {
    bin()
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("run tokensmith")
}

fn tokens_file(root: &Path, name: &str) -> PathBuf {
    root.join("src/tokens").join(name)
}

fn read_css(root: &Path) -> String {
    fs::read_to_string(root.join("dist/css/tokens.css")).expect("read css")
}

#[test]
fn e2e_build_writes_root_and_mode_blocks() {
    let dir = project();
    let output = run(dir.path(), &["build"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let css = read_css(dir.path());
    assert!(
        css.starts_with("/**\n * Do not edit directly, this file was auto-generated.\n */\n\n:root {\n"),
        "Got:\n{}",
        css
    );
    assert!(css.ends_with(DARK_BLOCK), "Got:\n{}", css);
    assert!(css.contains("  --spacing-sm: 0.5rem;\n"), "Got:\n{}", css);
    assert!(css.contains("  --spacing-md: 1rem;\n"), "Got:\n{}", css);

    // Exactly one header and two blocks separated by a blank line
    assert_eq!(css.matches("/**").count(), 1);
    assert!(css.contains("}\n\n[data-color-mode='dark'] {\n"), "Got:\n{}", css);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Targets: 2"), "Got:\n{}", stdout);
}

#[test]
fn e2e_root_block_uses_default_mode_only() {
    let dir = project();
    assert!(run(dir.path(), &["build"]).status.success());

    let css = read_css(dir.path());
    let (root_block, dark_block) = css
        .split_once("\n\n[data-color-mode='dark']")
        .expect("root and dark blocks");

    assert!(root_block.contains("  --color-background: var(--palette-gray-100);\n"));
    assert!(root_block.contains("  --color-text: var(--palette-gray-900);\n"));
    assert!(!root_block.contains("--color-background: var(--palette-gray-900)"));

    // Mode blocks only carry the mode's own tokens
    assert!(!dark_block.contains("  --spacing"), "Got:\n{}", dark_block);
    assert!(!dark_block.contains("  --palette"), "Got:\n{}", dark_block);
    assert!(!dark_block.contains("  --typography"), "Got:\n{}", dark_block);
    assert_eq!(dark_block.matches("  --").count(), 2, "Got:\n{}", dark_block);
}

#[test]
fn e2e_mixins_written_from_base_files() {
    let dir = project();
    assert!(run(dir.path(), &["build"]).status.success());

    let scss = fs::read_to_string(dir.path().join("dist/scss/typography-mixins.scss"))
        .expect("read mixins");
    assert_eq!(
        scss,
        "// Do not edit directly, this file was auto-generated.\n\n\
         @mixin typography-body {\n  \
         font-family: Inter;\n  \
         font-size: var(--font-size-body);\n  \
         font-weight: 400;\n  \
         line-height: 1.5;\n}\n"
    );
}

#[test]
fn e2e_output_is_deterministic() {
    let dir = project();
    assert!(run(dir.path(), &["build"]).status.success());
    let first = read_css(dir.path());

    assert!(run(dir.path(), &["build"]).status.success());
    assert_eq!(first, read_css(dir.path()));
}

#[test]
fn e2e_configured_axis_attribute_and_output_path() {
    let dir = project();
    fs::write(
        dir.path().join("tokensmith.toml"),
        r#"
header = "Generated"

[output]
css = "out/theme.css"

[[axis]]
collection = "color"
default = "dark"
attribute = "data-theme"
"#,
    )
    .expect("write config");

    let output = run(dir.path(), &["build"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let css = fs::read_to_string(dir.path().join("out/theme.css")).expect("read css");
    assert!(css.starts_with("/**\n * Generated\n */\n\n"));
    assert!(css.contains("[data-theme='light'] {\n  --color-background: var(--palette-gray-100);\n"));
    assert!(!css.contains("data-color-mode"));
}

#[test]
fn e2e_empty_mode_fails_without_writing() {
    let dir = project();
    fs::write(
        tokens_file(dir.path(), "manifest.json"),
        r#"{"collections": {
            "primitives": {"modes": {"value": ["primitives.tokens.json"]}},
            "color": {"modes": {"light": ["color.light.tokens.json"], "dark": []}}
        }}"#,
    )
    .expect("write manifest");

    let output = run(dir.path(), &["build"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: "), "Got:\n{}", stderr);
    assert!(stderr.contains("\"dark\""), "Got:\n{}", stderr);
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn e2e_identical_output_paths_fail_without_writing() {
    let dir = project();
    let output = run(
        dir.path(),
        &["build", "--css-out", "out.txt", "--mixins-out", "out.txt"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("must be different files"), "Got:\n{}", stderr);
    assert!(!dir.path().join("out.txt").exists());
}

#[test]
fn e2e_empty_style_fails_without_writing() {
    let dir = project();
    fs::write(
        tokens_file(dir.path(), "manifest.json"),
        r#"{
            "collections": {"primitives": {"modes": {"value": ["primitives.tokens.json"]}}},
            "styles": {"typography": []}
        }"#,
    )
    .expect("write manifest");

    let output = run(dir.path(), &["build"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\"typography\""), "Got:\n{}", stderr);
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn e2e_malformed_manifest_fails() {
    let dir = project();
    fs::write(tokens_file(dir.path(), "manifest.json"), "{ not json").expect("write manifest");

    let output = run(dir.path(), &["build"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn e2e_missing_token_file_fails() {
    let dir = project();
    fs::remove_file(tokens_file(dir.path(), "color.dark.tokens.json")).expect("remove");

    let output = run(dir.path(), &["build"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("color.dark.tokens.json"), "Got:\n{}", stderr);
}

#[test]
fn e2e_broken_reference_in_mode_names_the_target() {
    let dir = project();
    fs::write(
        tokens_file(dir.path(), "color.dark.tokens.json"),
        r#"{"color": {"$type": "color", "background": {"$value": "{palette.gray.950}"}}}"#,
    )
    .expect("write tokens");

    let output = run(dir.path(), &["build"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[data-color-mode='dark']"), "Got:\n{}", stderr);
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn e2e_dry_run_writes_nothing() {
    let dir = project();
    let output = run(dir.path(), &["build", "--dry-run"]);
    assert!(output.status.success());
    assert!(!dir.path().join("dist").exists());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Would write"), "Got:\n{}", stdout);
}

#[test]
fn e2e_check_reports_plan_and_unlisted_files() {
    let dir = project();
    let output = run(dir.path(), &["check"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Target root -> :root"), "Got:\n{}", stdout);
    assert!(
        stdout.contains("Target color:dark -> [data-color-mode='dark']"),
        "Got:\n{}",
        stdout
    );
    assert!(!dir.path().join("dist").exists());

    fs::write(tokens_file(dir.path(), "legacy.tokens.json"), "{}").expect("write");
    let output = run(dir.path(), &["check", "--strict"]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("legacy.tokens.json"), "Got:\n{}", stdout);
}
