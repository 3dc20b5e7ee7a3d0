//! End-to-end spawn tests.
//!
//! This binary is its own child: `main` hands control to the child
//! registry first, so `--client=<function>` runs one of the functions below
//! instead of the test list.

use std::panic;
use std::time::Duration;

use hsu_multiprocess_test::{
    child_main, debug_on_start_requested, init_test_logging, ChildProcessSpawner, ChildRegistry,
    CommandLine, Error, ProcessError, SpawnerConfig, CHILD_PANIC_EXIT_CODE,
    CHILD_UNKNOWN_FUNCTION_EXIT_CODE,
};

const CHILD_TIMEOUT: Duration = Duration::from_secs(30);
const MARKER_ENV: &str = "SPAWN_CHILD_MARKER_FILE";
const DEBUG_FLAG_EXIT_CODE: i32 = 7;

// ==============================================================================
// Child functions
// ==============================================================================

fn echo_function() -> i32 {
    0
}

fn exit_with_42() -> i32 {
    42
}

fn panicking_child() -> i32 {
    panic!("child panicked on purpose")
}

fn reports_debug_flag() -> i32 {
    if debug_on_start_requested() {
        DEBUG_FLAG_EXIT_CODE
    } else {
        0
    }
}

fn writes_pid_marker() -> i32 {
    let Ok(path) = std::env::var(MARKER_ENV) else {
        return 3;
    };
    match std::fs::write(path, std::process::id().to_string()) {
        Ok(()) => 0,
        Err(_) => 4,
    }
}

fn sleeps_forever() -> i32 {
    std::thread::sleep(Duration::from_secs(120));
    0
}

fn spawns_grandchild() -> i32 {
    let mut grandchild = match ChildProcessSpawner::new().spawn_child("ExitWith42") {
        Ok(handle) => handle,
        Err(_) => return 5,
    };
    match grandchild.wait_timeout(CHILD_TIMEOUT) {
        Ok(status) => status.code().unwrap_or(6),
        Err(_) => 6,
    }
}

fn registry() -> ChildRegistry {
    let entries: [(&str, fn() -> i32); 7] = [
        ("EchoFunction", echo_function),
        ("ExitWith42", exit_with_42),
        ("PanickingChild", panicking_child),
        ("ReportsDebugFlag", reports_debug_flag),
        ("WritesPidMarker", writes_pid_marker),
        ("SleepsForever", sleeps_forever),
        ("SpawnsGrandchild", spawns_grandchild),
    ];

    let mut registry = ChildRegistry::new();
    for (name, function) in entries {
        registry.register(name, function).expect("valid child registration");
    }
    registry
}

// ==============================================================================
// Tests
// ==============================================================================

type TestResult = Result<(), String>;

fn spawn_and_wait(
    spawner: &ChildProcessSpawner,
    function: &str,
    debug_on_start: bool,
) -> Result<i32, String> {
    let mut child = spawner
        .spawn_child_with_options(function, debug_on_start)
        .map_err(|e| format!("spawn {function}: {e}"))?;

    if child.pid() == std::process::id() {
        return Err("child reported the parent's pid".to_string());
    }

    let status = child
        .wait_timeout(CHILD_TIMEOUT)
        .map_err(|e| format!("wait {function}: {e}"))?;
    status
        .code()
        .ok_or_else(|| format!("{function} exited without a code: {status}"))
}

fn expect_code(actual: i32, expected: i32) -> TestResult {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected exit code {expected}, got {actual}"))
    }
}

fn test_echo_function_exits_cleanly() -> TestResult {
    let code = spawn_and_wait(&ChildProcessSpawner::new(), "EchoFunction", false)?;
    expect_code(code, 0)
}

fn test_exit_code_propagates() -> TestResult {
    let code = spawn_and_wait(&ChildProcessSpawner::new(), "ExitWith42", false)?;
    expect_code(code, 42)
}

fn test_unknown_function_fails_in_child() -> TestResult {
    // Valid name, absent from the registry: the launch succeeds and the
    // child reports the failure.
    let code = spawn_and_wait(&ChildProcessSpawner::new(), "NoSuchFunction", false)?;
    expect_code(code, CHILD_UNKNOWN_FUNCTION_EXIT_CODE)
}

fn test_panicking_child_exit_code() -> TestResult {
    let code = spawn_and_wait(&ChildProcessSpawner::new(), "PanickingChild", false)?;
    expect_code(code, CHILD_PANIC_EXIT_CODE)
}

fn test_debug_on_start_reaches_child() -> TestResult {
    let spawner = ChildProcessSpawner::new().with_config(SpawnerConfig {
        debugger_wait_timeout: Duration::from_millis(200),
        ..SpawnerConfig::default()
    });

    expect_code(spawn_and_wait(&spawner, "ReportsDebugFlag", true)?, DEBUG_FLAG_EXIT_CODE)?;
    expect_code(spawn_and_wait(&spawner, "ReportsDebugFlag", false)?, 0)
}

fn test_child_sees_configured_environment() -> TestResult {
    let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
    let marker = dir.path().join("child.pid");

    let mut config = SpawnerConfig::default();
    config
        .environment
        .insert(MARKER_ENV.to_string(), marker.display().to_string());
    let spawner = ChildProcessSpawner::new().with_config(config);

    let mut child = spawner.spawn_child("WritesPidMarker").map_err(|e| e.to_string())?;
    let status = child.wait_timeout(CHILD_TIMEOUT).map_err(|e| e.to_string())?;
    expect_code(status.code().unwrap_or(-1), 0)?;

    let written = std::fs::read_to_string(&marker).map_err(|e| e.to_string())?;
    if written != child.pid().to_string() {
        return Err(format!("marker holds {written}, child pid is {}", child.pid()));
    }
    Ok(())
}

fn test_long_running_child_can_be_killed() -> TestResult {
    let mut child = ChildProcessSpawner::new()
        .spawn_child("SleepsForever")
        .map_err(|e| e.to_string())?;

    if !child.is_running() {
        return Err("child exited before it was killed".to_string());
    }
    child.kill().map_err(|e| e.to_string())?;

    let status = child
        .wait_timeout(Duration::from_secs(10))
        .map_err(|e| e.to_string())?;
    if status.success() {
        return Err("killed child reported success".to_string());
    }
    Ok(())
}

fn test_async_wait() -> TestResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| e.to_string())?;

    runtime.block_on(async {
        let mut child = ChildProcessSpawner::new()
            .spawn_child("ExitWith42")
            .map_err(|e| e.to_string())?;
        let status = child
            .wait_timeout_async(CHILD_TIMEOUT)
            .await
            .map_err(|e| e.to_string())?;
        expect_code(status.code().unwrap_or(-1), 42)
    })
}

fn test_child_can_spawn_grandchild() -> TestResult {
    let code = spawn_and_wait(&ChildProcessSpawner::new(), "SpawnsGrandchild", false)?;
    expect_code(code, 42)
}

fn test_child_found_when_parent_args_have_terminator() -> TestResult {
    let exe = std::env::current_exe().map_err(|e| e.to_string())?;
    let spawner = ChildProcessSpawner::new()
        .with_base_command_line(CommandLine::from_parts(exe, ["--", "filter"]));

    expect_code(spawn_and_wait(&spawner, "ExitWith42", false)?, 42)?;

    let spawner = spawner.with_config(SpawnerConfig {
        debugger_wait_timeout: Duration::from_millis(200),
        ..SpawnerConfig::default()
    });
    expect_code(spawn_and_wait(&spawner, "ReportsDebugFlag", true)?, DEBUG_FLAG_EXIT_CODE)
}

fn test_empty_function_name_rejected() -> TestResult {
    match ChildProcessSpawner::new().spawn_child("") {
        Err(Error::Validation { .. }) => Ok(()),
        Err(other) => Err(format!("unexpected error: {other}")),
        Ok(mut child) => {
            child.kill_and_reap();
            Err("empty function name was launched".to_string())
        }
    }
}

fn test_missing_binary_reports_not_found() -> TestResult {
    let missing = std::env::temp_dir().join("hsu-no-such-test-binary");
    let spawner = ChildProcessSpawner::new().with_base_command_line(CommandLine::new(missing));

    match spawner.spawn_child("EchoFunction") {
        Err(Error::Process(ProcessError::SpawnFailed { kind, .. }))
            if kind == std::io::ErrorKind::NotFound =>
        {
            Ok(())
        }
        Err(other) => Err(format!("unexpected error: {other}")),
        Ok(mut child) => {
            child.kill_and_reap();
            Err("missing binary was launched".to_string())
        }
    }
}

fn main() {
    child_main(&registry());
    init_test_logging();

    let tests: [(&str, fn() -> TestResult); 12] = [
        ("echo_function_exits_cleanly", test_echo_function_exits_cleanly),
        ("exit_code_propagates", test_exit_code_propagates),
        ("unknown_function_fails_in_child", test_unknown_function_fails_in_child),
        ("panicking_child_exit_code", test_panicking_child_exit_code),
        ("debug_on_start_reaches_child", test_debug_on_start_reaches_child),
        ("child_sees_configured_environment", test_child_sees_configured_environment),
        ("long_running_child_can_be_killed", test_long_running_child_can_be_killed),
        ("async_wait", test_async_wait),
        ("child_can_spawn_grandchild", test_child_can_spawn_grandchild),
        (
            "child_found_when_parent_args_have_terminator",
            test_child_found_when_parent_args_have_terminator,
        ),
        ("empty_function_name_rejected", test_empty_function_name_rejected),
        ("missing_binary_reports_not_found", test_missing_binary_reports_not_found),
    ];

    println!("\nrunning {} tests", tests.len());
    let mut failed = Vec::new();
    for (name, test) in tests {
        let outcome = panic::catch_unwind(test)
            .unwrap_or_else(|_| Err("test panicked".to_string()));
        match outcome {
            Ok(()) => println!("test {name} ... ok"),
            Err(reason) => {
                println!("test {name} ... FAILED: {reason}");
                failed.push(name);
            }
        }
    }

    if failed.is_empty() {
        println!("\ntest result: ok. {} passed", tests.len());
    } else {
        println!("\nfailures: {:?}", failed);
        std::process::exit(1);
    }
}
