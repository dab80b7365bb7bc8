use std::net::TcpListener;
use std::path::Path;
use std::time::{Duration, Instant};

use assert_cmd::Command; // Bring Command into scope
use predicates::prelude::*; // Bring predicate traits into scope
use sha2::{Digest, Sha512};
use tempfile::tempdir;

const PACKAGE: &[u8] = b"not really a zip, but bytes are bytes";

/// `trellis` run from `dir` with no ambient config
fn trellis(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("trellis").unwrap();
    cmd.current_dir(dir).env_remove("TRELLIS_CONFIG").env_remove("RUST_LOG");
    cmd
}

/// Class file for `demo.Hello` annotated with `@org.pf4j.Extension(ordinal = 3)`
fn extension_class() -> Vec<u8> {
    fn utf8(out: &mut Vec<u8>, s: &str) {
        out.push(1);
        out.extend_from_slice(&(s.len() as u16).to_be_bytes());
        out.extend_from_slice(s.as_bytes());
    }
    let mut out = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
    out.extend_from_slice(&9u16.to_be_bytes());
    utf8(&mut out, "demo/Hello"); // 1
    out.extend_from_slice(&[7, 0, 1]); // 2
    utf8(&mut out, "java/lang/Object"); // 3
    out.extend_from_slice(&[7, 0, 3]); // 4
    utf8(&mut out, "RuntimeVisibleAnnotations"); // 5
    utf8(&mut out, "Lorg/pf4j/Extension;"); // 6
    utf8(&mut out, "ordinal"); // 7
    out.extend_from_slice(&[3, 0, 0, 0, 3]); // 8
    out.extend_from_slice(&[0x00, 0x21, 0, 2, 0, 4]); // flags, this, super
    out.extend_from_slice(&[0, 0, 0, 0, 0, 0]); // interfaces, fields, methods
    out.extend_from_slice(&[0, 1, 0, 5, 0, 0, 0, 11]);
    out.extend_from_slice(&[0, 1, 0, 6, 0, 1, 0, 7, b'I', 0, 8]);
    out
}

#[test]
fn test_ping_command() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    trellis(dir.path())
        .arg("--ping")
        .assert()
        .success()
        .stdout(predicate::str::contains("pong"));
    Ok(())
}

#[test]
fn test_no_command_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    trellis(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No command given"));
    Ok(())
}

#[test]
fn test_verify_literal_checksum() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let package = dir.path().join("plugin-1.0.zip");
    std::fs::write(&package, PACKAGE)?;
    let digest = format!("{:x}", Sha512::digest(PACKAGE)).to_uppercase();

    trellis(dir.path())
        .args(["verify", "plugin-1.0.zip", "--checksum", digest.as_str(), "--plugin-id", "greeter"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Verified plugin-1.0.zip"));
    Ok(())
}

#[test]
fn test_verify_sibling_checksum_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("plugin-1.0.zip"), PACKAGE)?;
    std::fs::write(
        dir.path().join("plugin-1.0.sha512"),
        format!("{:x}  plugin-1.0.zip\n", Sha512::digest(PACKAGE)),
    )?;

    trellis(dir.path())
        .args(["verify", "plugin-1.0.zip", "--checksum", ".sha512"])
        .assert()
        .success();
    Ok(())
}

#[test]
fn test_verify_mismatch_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("plugin.zip"), PACKAGE)?;

    trellis(dir.path())
        .args(["verify", "plugin.zip", "--checksum", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Checksum mismatch").and(predicate::str::contains("deadbeef")));
    Ok(())
}

#[test]
fn test_verify_empty_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("empty.zip"), b"")?;

    trellis(dir.path())
        .args(["verify", "empty.zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a regular file or is empty"));
    Ok(())
}

#[test]
fn test_verify_deadline_bounds_unresponsive_checksum_server() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("p.zip"), PACKAGE)?;
    // Accepts connections into the backlog but never answers
    let silent = TcpListener::bind("127.0.0.1:0")?;
    let hint = format!("http://{}/p.sha512", silent.local_addr()?);

    let started = Instant::now();
    trellis(dir.path())
        .args(["verify", "p.zip", "--checksum", hint.as_str(), "--timeout-secs", "1"])
        .timeout(Duration::from_secs(20))
        .assert()
        .failure();
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "verify took {:?}",
        started.elapsed()
    );
    drop(silent);
    Ok(())
}

#[test]
fn test_verify_uses_sha256_from_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("abc.bin"), b"abc")?;
    std::fs::write(
        dir.path().join("trellis.toml"),
        "[verification]\nalgorithm = \"sha256\"\nchecksum_suffix = \".sha256\"\n",
    )?;

    trellis(dir.path())
        .args([
            "verify",
            "abc.bin",
            "--checksum",
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        ])
        .assert()
        .success();
    Ok(())
}

#[test]
fn test_bad_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("custom.json"), "{ broken")?;
    std::fs::write(dir.path().join("a.bin"), b"a")?;

    trellis(dir.path())
        .args(["--config", "custom.json", "verify", "a.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
    Ok(())
}

#[test]
fn test_scan_classes_directory() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let classes = dir.path().join("classes").join("demo");
    std::fs::create_dir_all(&classes)?;
    std::fs::write(classes.join("Hello.class"), extension_class())?;
    std::fs::write(classes.join("Broken.class"), b"\xCA\xFE")?;

    trellis(dir.path())
        .args(["scan", "classes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo.Hello ordinal=3 plugins=[] points=[]"))
        .stdout(predicate::str::contains("Broken").not());

    trellis(dir.path())
        .args(["scan", "classes", "--parallel", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"class_name\": \"demo.Hello\""));
    Ok(())
}

#[test]
fn test_scan_missing_archive_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    trellis(dir.path())
        .args(["scan", "missing.jar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.jar"));
    Ok(())
}

#[test]
fn test_order_startup_and_shutdown() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    std::fs::write(
        dir.path().join("modules.toml"),
        r#"
[[modules]]
name = "web"
version = "2.0.0"
dependencies = ["db", "core@^1.0"]

[[modules]]
name = "db"
version = "1.1.0"
dependencies = ["core", "cache?"]

[[modules]]
name = "core"
version = "1.4.2"

[[modules]]
name = "audit"
enabled = false
dependencies = ["core"]
"#,
    )?;

    trellis(dir.path())
        .args(["order", "modules.toml"])
        .assert()
        .success()
        .stdout("core@1.4.2\ndb@1.1.0\nweb@2.0.0\naudit@0.0.0 (disabled)\n");

    trellis(dir.path())
        .args(["order", "modules.toml", "--shutdown"])
        .assert()
        .success()
        .stdout("audit@0.0.0 (disabled)\nweb@2.0.0\ndb@1.1.0\ncore@1.4.2\n");
    Ok(())
}

#[test]
fn test_order_reports_dependency_problems() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    std::fs::write(
        dir.path().join("cycle.json"),
        r#"{ "modules": [ { "name": "a", "dependencies": ["b"] }, { "name": "b", "dependencies": ["a"] } ] }"#,
    )?;
    std::fs::write(
        dir.path().join("missing.yaml"),
        "modules:\n  - name: a\n    dependencies: [ghost]\n",
    )?;
    std::fs::write(
        dir.path().join("too-old.toml"),
        "[[modules]]\nname = \"a\"\ndependencies = [\"b@>=2\"]\n\n[[modules]]\nname = \"b\"\nversion = \"1.0.0\"\n",
    )?;

    trellis(dir.path())
        .args(["order", "cycle.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular dependency"));

    trellis(dir.path())
        .args(["order", "missing.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'ghost', which is not registered"));

    trellis(dir.path())
        .args(["order", "too-old.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("version mismatch"));
    Ok(())
}
