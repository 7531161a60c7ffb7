//! End-to-end tests of the watcher binary.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Command, Stdio};

const BIN: &str = env!("CARGO_BIN_EXE_k8s-endpoint-watcher");

// Points at a port nothing listens on, so every poll fails.
const UNREACHABLE_KUBECONFIG: &str = r"
apiVersion: v1
kind: Config
clusters:
- name: test
  cluster:
    server: http://127.0.0.1:9
contexts:
- name: test
  context:
    cluster: test
    user: test
current-context: test
users:
- name: test
  user: {}
";

fn watcher() -> Command {
    let mut cmd = Command::new(BIN);
    cmd.env_remove("WATCHER_SERVICE")
        .env_remove("WATCHER_KUBECONFIG")
        .env_remove("WATCHER_NAMESPACE")
        .env_remove("WATCHER_INTERVAL")
        .env("RUST_LOG", "info")
        .env("RUST_LOG_FORMAT", "json");
    cmd
}

#[test]
fn missing_service_exits_with_failure() {
    let output = watcher().output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout.matches("No service name specified").count(), 1, "stdout: {stdout}");
    assert!(!stdout.contains("Watcher started"), "stdout: {stdout}");
    assert!(!stdout.contains("Watcher stopped"), "stdout: {stdout}");
}

#[test]
fn unreadable_kubeconfig_exits_with_failure() {
    let output = watcher()
        .args(["--service", "web", "--kubeconfig", "/nonexistent/kubeconfig"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout.matches("Cannot create cluster config").count(), 1, "stdout: {stdout}");
    assert!(!stdout.contains("Cannot create client"), "stdout: {stdout}");
    assert!(!stdout.contains("Watcher stopped"), "stdout: {stdout}");
}

#[cfg(unix)]
#[test]
fn sigterm_exits_cleanly_after_failed_polls() {
    let mut kubeconfig = tempfile::NamedTempFile::new().unwrap();
    kubeconfig
        .write_all(UNREACHABLE_KUBECONFIG.as_bytes())
        .unwrap();

    let mut child = watcher()
        .arg("--service")
        .arg("web")
        .arg("--kubeconfig")
        .arg(kubeconfig.path())
        .args(["--interval", "1"])
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let mut started = false;
    let mut line = String::new();

    // Wait for a failed poll; the loop must keep running past it.
    while stdout.read_line(&mut line).unwrap() > 0 {
        if line.contains("Watcher started") {
            started = true;
        }
        if line.contains("Cannot find endpoints of service") {
            break;
        }
        line.clear();
    }
    assert!(started, "watcher never started");
    assert!(child.try_wait().unwrap().is_none(), "watcher exited on lookup error");

    let status = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let mut rest = String::new();
    stdout.read_to_string(&mut rest).unwrap();
    let status = child.wait().unwrap();

    assert_eq!(status.code(), Some(0));
    assert!(rest.contains("Watcher stopped"), "stdout: {rest}");
}
