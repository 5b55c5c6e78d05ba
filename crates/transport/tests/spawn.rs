#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use systray_transport::spawn;

fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-tray.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[tokio::test]
async fn echoes_lines_through_real_process() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(
        tmp.path(),
        "echo '{\"type\":\"ready\"}'\nread line\necho \"got $line\"\necho oops >&2\n",
    );

    let mut io = spawn(&script).unwrap();
    assert!(io.control.pid().is_some());

    let ready = io.stdout.next_line().await.unwrap();
    assert_eq!(ready.as_deref(), Some(r#"{"type":"ready"}"#));

    io.stdin.write_line("hello  ").await.unwrap();
    let echoed = io.stdout.next_line().await.unwrap();
    assert_eq!(echoed.as_deref(), Some("got hello"));
    assert!(io.stdout.next_line().await.unwrap().is_none());

    let err = io.stderr.next_line().await.unwrap();
    assert_eq!(err.as_deref(), Some("oops"));

    let info = io.control.wait().await.unwrap();
    assert!(info.success());
}

#[tokio::test]
async fn terminate_sends_graceful_signal() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(
        tmp.path(),
        "trap 'echo Quit; exit 0' TERM INT\necho '{\"type\":\"ready\"}'\nwhile true; do sleep 1; done\n",
    );

    let mut io = spawn(&script).unwrap();
    assert!(io.stdout.next_line().await.unwrap().is_some());

    let info = tokio::time::timeout(Duration::from_secs(10), io.control.terminate())
        .await
        .expect("process should exit after SIGTERM")
        .unwrap();
    assert_eq!(info.code, Some(0));
    assert_eq!(info.signal, None);
}
