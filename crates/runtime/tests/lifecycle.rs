// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end runtime tests against a simulated wrapper.
//!
//! The wrapper process is a plain `sleep` so signals and exits are real;
//! a tokio task speaks the socket protocol on its behalf.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use nrpc_core::test_support::{batch_events, http_event};
use nrpc_core::{ControlMessage, ResultError, RuntimeStatus};
use nrpc_runtime::{
    FatalEvent, FunctionConfig, FunctionEnv, FunctionLogger, Runtime, RuntimeConfig,
    RuntimeError, Wrapper, WrapperAddresses, WrapperConfig, WrapperKind,
};
use nrpc_wire::{read_message, write_control_message, EncodingKind, LogLevel};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedReadHalf;
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

const SLEEP: &str = "exec sleep 999999";

#[derive(Clone, Copy, PartialEq)]
enum Behavior {
    Echo,
    /// Close the event connection on the first event.
    Hangup,
    /// Swallow events on the first launch, echo afterwards.
    SilentOnce,
}

struct SimWrapper {
    behavior: Behavior,
    encoding: EncodingKind,
    control: bool,
    wait_for_start: bool,
    script: &'static str,
    launches: Arc<AtomicUsize>,
}

impl SimWrapper {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            encoding: EncodingKind::Json,
            control: false,
            wait_for_start: false,
            script: SLEEP,
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Wrapper for SimWrapper {
    fn kind(&self) -> WrapperKind {
        WrapperKind::Command
    }

    fn command(&self, _addresses: &WrapperAddresses) -> Result<Command, RuntimeError> {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(self.script);
        Ok(cmd)
    }

    fn run_wrapper(
        &self,
        addresses: &WrapperAddresses,
        _env: &FunctionEnv,
    ) -> Result<Child, RuntimeError> {
        let launch = self.launches.fetch_add(1, Ordering::SeqCst);
        let silent = self.behavior == Behavior::SilentOnce && launch == 0;
        tokio::spawn(simulate(addresses.clone(), self.behavior, silent, self.encoding, self.wait_for_start));
        self.command(addresses)?
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(RuntimeError::Spawn)
    }

    fn encoding(&self) -> EncodingKind {
        self.encoding
    }

    fn supports_control_communication(&self) -> bool {
        self.control
    }

    fn wait_for_start(&self) -> bool {
        self.wait_for_start
    }

    fn supports_restart(&self) -> bool {
        true
    }
}

async fn simulate(
    addresses: WrapperAddresses,
    behavior: Behavior,
    silent: bool,
    encoding: EncodingKind,
    send_start: bool,
) {
    let stream = UnixStream::connect(&addresses.event).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    if let Some(control) = &addresses.control {
        let stream = UnixStream::connect(control).await.unwrap();
        tokio::spawn(report_drain_done(stream));
    }
    if send_start {
        writer.write_all(b"s\n").await.unwrap();
    }

    while let Some(event) = read_event(&mut reader, encoding).await {
        if behavior == Behavior::Hangup {
            return;
        }
        if silent {
            continue;
        }
        let results = match &event {
            Value::Array(items) => Value::Array(items.iter().map(echo).collect()),
            single => echo(single),
        };
        let frames = format!(
            "m{{\"duration\":0.25}}\nl{{\"level\":\"info\",\"message\":\"handled\",\"with\":{{\"id\":{}}}}}\nr{}\n",
            event_ids(&event),
            results
        );
        if writer.write_all(frames.as_bytes()).await.is_err() {
            return;
        }
    }
}

async fn read_event(reader: &mut BufReader<OwnedReadHalf>, encoding: EncodingKind) -> Option<Value> {
    match encoding {
        EncodingKind::Json => {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => None,
                Ok(_) => serde_json::from_str(&line).ok(),
            }
        }
        EncodingKind::Msgpack => {
            let payload = read_message(reader).await.ok()?;
            rmp_serde::from_slice(&payload).ok()
        }
    }
}

fn echo(event: &Value) -> Value {
    json!({
        "status_code": 200,
        "content_type": "text/plain",
        "body": event["body"],
        "body_encoding": "base64",
        "event_id": event["id"],
    })
}

fn event_ids(event: &Value) -> Value {
    match event {
        Value::Array(items) => Value::Array(items.iter().map(|e| e["id"].clone()).collect()),
        single => single["id"].clone(),
    }
}

async fn report_drain_done(mut stream: UnixStream) {
    loop {
        if write_control_message(&mut stream, &ControlMessage::drain_done()).await.is_err() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[derive(Default)]
struct CaptureLogger {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl FunctionLogger for CaptureLogger {
    fn log(&self, level: LogLevel, message: &str, _with: &Map<String, Value>) {
        self.records.lock().push((level, message.to_string()));
    }
}

fn config() -> RuntimeConfig {
    let mut config = RuntimeConfig::new(
        FunctionConfig { name: "sim".into(), ..FunctionConfig::default() },
        WrapperConfig { kind: WrapperKind::Command, ..WrapperConfig::default() },
    );
    config.timeouts.connection_ms = Some(5_000);
    config.timeouts.process_termination_ms = Some(2_000);
    config.timeouts.worker_termination_ms = Some(30_000);
    config
}

fn runtime(wrapper: SimWrapper) -> (Arc<Runtime>, mpsc::Receiver<FatalEvent>) {
    runtime_with(wrapper, config())
}

fn runtime_with(wrapper: SimWrapper, config: RuntimeConfig) -> (Arc<Runtime>, mpsc::Receiver<FatalEvent>) {
    let (tx, rx) = mpsc::channel(4);
    (Arc::new(Runtime::new(config, Arc::new(wrapper), tx)), rx)
}

fn body(response: &nrpc_core::Response) -> &str {
    response.body_str().unwrap()
}

#[tokio::test]
async fn echo_round_trip_with_logs_and_metrics() {
    let (runtime, _fatal) = runtime(SimWrapper::new(Behavior::Echo));
    runtime.start().await.unwrap();
    assert_eq!(runtime.status(), RuntimeStatus::Ready);
    assert!(runtime.pid().is_some());

    let logger = Arc::new(CaptureLogger::default());
    let response = runtime
        .process_event(&http_event("e1", "hello"), Some(logger.clone()))
        .await
        .unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.content_type, "text/plain");
    assert_eq!(body(&response), "hello");

    assert_eq!(*logger.records.lock(), vec![(LogLevel::Info, "handled".to_string())]);
    let stats = runtime.statistics().snapshot();
    assert_eq!(stats.duration_ms_count, 1);
    assert_eq!(stats.duration_ms_sum, 250);

    runtime.stop().await.unwrap();
    assert_eq!(runtime.status(), RuntimeStatus::Stopped);
    assert!(runtime.pid().is_none());
}

#[tokio::test]
async fn msgpack_wrapper_with_control_and_start_signal() {
    let mut wrapper = SimWrapper::new(Behavior::Echo);
    wrapper.encoding = EncodingKind::Msgpack;
    wrapper.control = true;
    wrapper.wait_for_start = true;
    let (runtime, _fatal) = runtime(wrapper);
    runtime.start().await.unwrap();

    let response = runtime.process_event(&http_event("m1", "packed"), None).await.unwrap();
    assert_eq!(body(&response), "packed");
    runtime.stop().await.unwrap();
}

#[tokio::test]
async fn batch_results_follow_input_order() {
    let (runtime, _fatal) = runtime(SimWrapper::new(Behavior::Echo));
    runtime.start().await.unwrap();

    let events = batch_events(&["a", "b", "c"]);
    let outcomes = runtime.process_batch(&events, None).await.unwrap();
    let ids: Vec<_> = outcomes.iter().map(|o| o.event_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    for outcome in &outcomes {
        assert_eq!(body(outcome.outcome.as_ref().unwrap()), outcome.event_id.as_str());
    }
    runtime.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_each_get_their_own_response() {
    let (runtime, _fatal) = runtime(SimWrapper::new(Behavior::Echo));
    runtime.start().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let runtime = Arc::clone(&runtime);
        handles.push(tokio::spawn(async move {
            let id = format!("ev-{i}");
            let response = runtime.process_event(&http_event(&id, &id), None).await.unwrap();
            (id, body(&response).to_string())
        }));
    }
    for handle in handles {
        let (id, body) = handle.await.unwrap();
        assert_eq!(id, body);
    }
    runtime.stop().await.unwrap();
}

#[tokio::test]
async fn wrapper_hangup_marks_runtime_error() {
    let (runtime, _fatal) = runtime(SimWrapper::new(Behavior::Hangup));
    runtime.start().await.unwrap();

    let err = runtime.process_event(&http_event("e1", "x"), None).await.unwrap_err();
    assert!(matches!(err, RuntimeError::ClientDisconnected), "got {err:?}");
    assert_eq!(runtime.status(), RuntimeStatus::Error);

    let err = runtime.process_event(&http_event("e2", "x"), None).await.unwrap_err();
    assert!(matches!(err, RuntimeError::NotReady(RuntimeStatus::Error)));
    runtime.stop().await.unwrap();
}

#[tokio::test]
async fn restart_releases_in_flight_call() {
    let wrapper = SimWrapper::new(Behavior::SilentOnce);
    let launches = Arc::clone(&wrapper.launches);
    let (runtime, mut fatal) = runtime(wrapper);
    runtime.start().await.unwrap();
    let first_pid = runtime.pid();

    let in_flight = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.process_event(&http_event("stuck", "x"), None).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    runtime.restart().await.unwrap();

    let err = in_flight.await.unwrap().unwrap_err();
    assert!(matches!(err, RuntimeError::Result(ResultError::RuntimeRestarted)), "got {err:?}");
    assert_eq!(err.status_code(), 408);
    assert!(err.is_retryable());

    assert_eq!(runtime.status(), RuntimeStatus::Ready);
    assert_eq!(launches.load(Ordering::SeqCst), 2);
    assert_ne!(runtime.pid(), first_pid);
    let response = runtime.process_event(&http_event("after", "again"), None).await.unwrap();
    assert_eq!(body(&response), "again");

    runtime.stop().await.unwrap();
    assert!(fatal.try_recv().is_err());
}

#[tokio::test]
async fn restart_releases_in_flight_batch() {
    let (runtime, mut fatal) = runtime(SimWrapper::new(Behavior::SilentOnce));
    runtime.start().await.unwrap();

    let in_flight = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.process_batch(&batch_events(&["a", "b", "c"]), None).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    runtime.restart().await.unwrap();

    let outcomes = in_flight.await.unwrap().unwrap();
    let ids: Vec<_> = outcomes.iter().map(|o| o.event_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    for outcome in outcomes {
        let err = RuntimeError::from(outcome.outcome.unwrap_err());
        assert!(matches!(err, RuntimeError::Result(ResultError::RuntimeRestarted)), "got {err:?}");
        assert_eq!(err.status_code(), 408);
        assert!(err.is_retryable());
    }

    let outcomes = runtime.process_batch(&batch_events(&["d", "e"]), None).await.unwrap();
    assert!(outcomes.iter().all(|o| o.outcome.is_ok()));
    runtime.stop().await.unwrap();
    assert!(fatal.try_recv().is_err());
}

#[tokio::test]
async fn drain_returns_on_drain_done() {
    let mut wrapper = SimWrapper::new(Behavior::Echo);
    wrapper.control = true;
    wrapper.script = "trap '' USR2; exec sleep 999999";
    let (runtime, mut fatal) = runtime(wrapper);
    runtime.start().await.unwrap();

    let started = Instant::now();
    runtime.drain().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(runtime.status(), RuntimeStatus::Ready);
    assert_eq!(runtime.broker().subscriber_count(&nrpc_core::ControlMessageKind::DrainDone), 0);

    runtime.continue_().await.unwrap();
    runtime.stop().await.unwrap();
    assert!(fatal.try_recv().is_err());
}

#[tokio::test]
async fn drain_times_out_without_drain_done() {
    let mut wrapper = SimWrapper::new(Behavior::Echo);
    wrapper.script = "trap '' USR2; exec sleep 999999";
    let mut config = config();
    config.timeouts.worker_termination_ms = Some(300);
    let (runtime, mut fatal) = runtime_with(wrapper, config);
    runtime.start().await.unwrap();

    let started = Instant::now();
    runtime.drain().await.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
    assert_eq!(runtime.status(), RuntimeStatus::Ready);
    assert_eq!(runtime.broker().subscriber_count(&nrpc_core::ControlMessageKind::DrainDone), 0);

    let response = runtime.process_event(&http_event("after", "drained"), None).await.unwrap();
    assert_eq!(body(&response), "drained");
    runtime.stop().await.unwrap();
    assert!(fatal.try_recv().is_err());
}

#[tokio::test]
async fn terminate_exit_is_not_fatal() {
    let (runtime, mut fatal) = runtime(SimWrapper::new(Behavior::Echo));
    runtime.start().await.unwrap();

    // Default SIGUSR1 action kills sleep
    runtime.terminate().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(fatal.try_recv().is_err());
    runtime.stop().await.unwrap();
}

#[tokio::test]
async fn unexpected_exit_is_fatal() {
    let mut wrapper = SimWrapper::new(Behavior::Echo);
    wrapper.script = "sleep 0.3; exit 7";
    let (runtime, mut fatal) = runtime(wrapper);
    runtime.start().await.unwrap();
    let pid = runtime.pid().unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), fatal.recv()).await.unwrap().unwrap();
    let FatalEvent::WrapperExited { pid: exited, status } = event;
    assert_eq!(exited, pid);
    assert!(status.contains('7'), "{status}");
    assert_eq!(runtime.status(), RuntimeStatus::Error);
    runtime.stop().await.unwrap();
}
