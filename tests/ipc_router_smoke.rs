use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_attendd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn attendd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("attendd-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health.get("ok").and_then(|v| v.as_bool()), Some(true));

    let early = request(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(error_code(&early), Some("no_workspace"));

    let missing_path = request(&mut stdin, &mut reader, "3", "workspace.select", json!({}));
    assert_eq!(error_code(&missing_path), Some("bad_params"));

    let selected = request(
        &mut stdin,
        &mut reader,
        "4",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected.get("ok").and_then(|v| v.as_bool()), Some(true));

    let calls: Vec<(&str, serde_json::Value)> = vec![
        ("changes.revision", json!({})),
        ("session.start", json!({})),
        ("session.status", json!({})),
        ("students.list", json!({ "branch": "CSE(DS)" })),
        ("students.find", json!({ "rollNumber": "23M67A0602" })),
        ("students.summary", json!({})),
        ("students.locationAnomalies", json!({ "branch": "B.Tech CSE" })),
        ("attendance.markPresent", json!({ "rollNumber": "23M67A0602" })),
        (
            "attendance.markAbsent",
            json!({ "rollNumber": "23M67A0602", "cancelled": true }),
        ),
        ("attendance.checkIn", json!({ "rollNumber": "23M67A0602" })),
        ("attendance.cancel", json!({ "rollNumber": "23M67A0602" })),
        (
            "attendance.reportAbsence",
            json!({ "rollNumber": "23M67A0602", "reason": "Train was delayed badly" }),
        ),
        ("notifications.add", json!({ "rollNumber": "23M67A0602", "message": "hello" })),
        ("notifications.list", json!({ "rollNumber": "23M67A0602" })),
        ("notifications.clear", json!({ "rollNumber": "23M67A0602" })),
        ("settings.geofence.get", json!({})),
        ("settings.geofence.update", json!({ "proximityMeters": 750 })),
    ];
    for (i, (method, params)) in calls.into_iter().enumerate() {
        let id = format!("call-{}", i);
        let resp = request(&mut stdin, &mut reader, &id, method, params);
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            resp
        );
    }

    let revision = request(&mut stdin, &mut reader, "rev", "changes.revision", json!({}));
    assert!(
        revision
            .get("result")
            .and_then(|r| r.get("revision"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
            > 5
    );

    let list = request(
        &mut stdin,
        &mut reader,
        "list-ds",
        "students.list",
        json!({ "branch": "CSE(DS)" }),
    );
    let count = list
        .get("result")
        .and_then(|r| r.get("students"))
        .and_then(|v| v.as_array())
        .map(|a| a.len());
    assert_eq!(count, Some(5));

    let unknown = request(&mut stdin, &mut reader, "x", "attendance.teleport", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush garbage");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json reply");
    let value: serde_json::Value =
        serde_json::from_str(line.trim()).expect("bad_json reply is json");
    assert_eq!(error_code(&value), Some("bad_json"));

    let _ = request(&mut stdin, &mut reader, "after", "health", json!({}));

    drop(stdin);
    let status = child.wait().expect("wait for attendd");
    assert!(status.success());
    let _ = std::fs::remove_dir_all(&workspace);
}
