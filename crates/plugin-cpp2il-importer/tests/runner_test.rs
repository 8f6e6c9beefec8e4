//! Process runner tests against a stand-in converter script.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use plugin_cpp2il_importer::models::WaitOutcome;
use plugin_cpp2il_importer::{
    ConversionRequest, ConversionRunner, Cpp2IlRunner, ImportError, ImporterConfig, TimeoutPolicy,
};

/// Writing a script while another test forks can fail the exec with ETXTBSY.
static SPAWN: Mutex<()> = Mutex::new(());

const WRITES_TWO: &str = r#"#!/bin/sh
printf '%s\n' "$@" > args.txt
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--output-root" ]; then out="$2"; shift; fi
  shift
done
printf a > "$out/A.dll"
printf b > "$out/B.dll"
printf log > "$out/notes.txt"
"#;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

fn request(root: &Path, converter: PathBuf) -> ConversionRequest {
    ConversionRequest {
        converter,
        working_dir: root.to_path_buf(),
        output_root: root.join("out dir"),
        exe_name: "My Game".to_string(),
        game_path: root.join("games/My Game"),
        skip_analysis: true,
        attempt_il_to_dll: false,
        parallel: false,
        throw_safety_out_window: false,
        suppress_attributes: true,
    }
}

fn runner(timeout_ms: u64, policy: TimeoutPolicy, capture_output: bool) -> Cpp2IlRunner {
    Cpp2IlRunner::new(&ImporterConfig {
        timeout_ms,
        timeout_policy: policy,
        capture_output,
        ..Default::default()
    })
}

#[tokio::test]
async fn test_discovers_artifacts_in_output_root() {
    let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
    let temp = tempfile::tempdir().expect("tempdir");
    let converter = script(temp.path(), "cpp2il.sh", WRITES_TWO);

    let output = runner(10_000, TimeoutPolicy::Continue, true)
        .run_conversion(&request(temp.path(), converter), CancellationToken::new())
        .await
        .expect("conversion");

    assert_eq!(output.file_names(), vec!["A.dll", "B.dll"]);
    assert_eq!(output.outcome, WaitOutcome::Exited { code: Some(0) });
    assert_eq!(output.output_root, temp.path().join("out dir"));
}

#[tokio::test]
async fn test_values_with_spaces_arrive_intact() {
    let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
    let temp = tempfile::tempdir().expect("tempdir");
    let converter = script(temp.path(), "cpp2il.sh", WRITES_TWO);
    let req = request(temp.path(), converter);

    runner(10_000, TimeoutPolicy::Continue, false)
        .run_conversion(&req, CancellationToken::new())
        .await
        .expect("conversion");

    let received: Vec<String> = std::fs::read_to_string(temp.path().join("args.txt"))
        .expect("args")
        .lines()
        .map(String::from)
        .collect();
    assert_eq!(received, req.arguments());
    assert!(received.contains(&"My Game".to_string()));
}

#[tokio::test]
async fn test_failure_exit_code_is_not_trusted() {
    let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
    let temp = tempfile::tempdir().expect("tempdir");
    let body = format!("{WRITES_TWO}exit 3\n");
    let converter = script(temp.path(), "cpp2il.sh", &body);

    let output = runner(10_000, TimeoutPolicy::Continue, true)
        .run_conversion(&request(temp.path(), converter), CancellationToken::new())
        .await
        .expect("output still scanned");

    assert_eq!(output.outcome, WaitOutcome::Exited { code: Some(3) });
    assert_eq!(output.files.len(), 2);
}

#[tokio::test]
async fn test_no_artifacts_is_empty_conversion() {
    let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
    let temp = tempfile::tempdir().expect("tempdir");
    let converter = script(temp.path(), "cpp2il.sh", "#!/bin/sh\nexit 0\n");

    let err = runner(10_000, TimeoutPolicy::Continue, true)
        .run_conversion(&request(temp.path(), converter), CancellationToken::new())
        .await
        .expect_err("empty");

    assert!(matches!(err, ImportError::ConversionEmpty { .. }));
}

#[tokio::test]
async fn test_timeout_continue_inspects_partial_output() {
    let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
    let temp = tempfile::tempdir().expect("tempdir");
    let body = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  if [ "$1" = "--output-root" ]; then out="$2"; shift; fi
  shift
done
printf a > "$out/Early.dll"
exec sleep 5
"#;
    let converter = script(temp.path(), "cpp2il.sh", body);

    let output = runner(300, TimeoutPolicy::Continue, false)
        .run_conversion(&request(temp.path(), converter), CancellationToken::new())
        .await
        .expect("partial output");

    assert_eq!(output.outcome, WaitOutcome::StillRunning);
    assert_eq!(output.file_names(), vec!["Early.dll"]);
}

#[test]
fn test_converter_left_running_survives_runtime_shutdown() {
    let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
    let temp = tempfile::tempdir().expect("tempdir");
    let body = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  if [ "$1" = "--output-root" ]; then out="$2"; shift; fi
  shift
done
printf a > "$out/Early.dll"
sleep 1
echo "late stdout"
echo "late stderr" >&2
printf l > "$out/Late.dll"
"#;
    let converter = script(temp.path(), "cpp2il.sh", body);
    let req = request(temp.path(), converter);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let output = runtime
        .block_on(
            runner(300, TimeoutPolicy::Continue, true)
                .run_conversion(&req, CancellationToken::new()),
        )
        .expect("partial output");
    drop(runtime);
    assert_eq!(output.outcome, WaitOutcome::StillRunning);
    assert_eq!(output.file_names(), vec!["Early.dll"]);

    let late = req.output_root.join("Late.dll");
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while !late.exists() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    assert!(late.exists(), "converter died before finishing");

    let log = std::fs::read_to_string(req.log_path()).expect("log");
    assert!(log.contains("late stdout"));
    assert!(log.contains("late stderr"));
}

#[tokio::test]
async fn test_captured_output_lands_in_log_file() {
    let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
    let temp = tempfile::tempdir().expect("tempdir");
    let body = format!("{WRITES_TWO}echo converted\n");
    let converter = script(temp.path(), "cpp2il.sh", &body);
    let req = request(temp.path(), converter);

    let output = runner(10_000, TimeoutPolicy::Continue, true)
        .run_conversion(&req, CancellationToken::new())
        .await
        .expect("conversion");

    assert_eq!(output.file_names(), vec!["A.dll", "B.dll"]);
    let log = std::fs::read_to_string(req.log_path()).expect("log");
    assert_eq!(log.trim(), "converted");
}

#[tokio::test]
async fn test_terminate_policy_leaves_no_log_file() {
    let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
    let temp = tempfile::tempdir().expect("tempdir");
    let body = format!("{WRITES_TWO}echo converted\n");
    let converter = script(temp.path(), "cpp2il.sh", &body);
    let req = request(temp.path(), converter);

    runner(10_000, TimeoutPolicy::Terminate, true)
        .run_conversion(&req, CancellationToken::new())
        .await
        .expect("conversion");

    assert!(!req.log_path().exists());
}

#[tokio::test]
async fn test_timeout_terminate_is_error() {
    let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
    let temp = tempfile::tempdir().expect("tempdir");
    let converter = script(temp.path(), "cpp2il.sh", "#!/bin/sh\nexec sleep 5\n");

    let err = runner(200, TimeoutPolicy::Terminate, true)
        .run_conversion(&request(temp.path(), converter), CancellationToken::new())
        .await
        .expect_err("timed out");

    assert!(matches!(err, ImportError::ConversionTimedOut { timeout_ms: 200 }));
}

#[tokio::test]
async fn test_cancel_during_wait_kills_converter() {
    let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
    let temp = tempfile::tempdir().expect("tempdir");
    let converter = script(temp.path(), "cpp2il.sh", "#!/bin/sh\nexec sleep 10\n");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = runner(30_000, TimeoutPolicy::Continue, true)
        .run_conversion(&request(temp.path(), converter), cancel)
        .await
        .expect_err("cancelled");

    assert!(matches!(err, ImportError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
}
