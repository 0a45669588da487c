// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::{FunctionConfig, WrapperConfig};
use std::ffi::OsStr;

fn config(kind: WrapperKind) -> RuntimeConfig {
    RuntimeConfig::new(
        FunctionConfig {
            name: "echo".into(),
            handler: "main:handler".into(),
            namespace: "default".into(),
            worker_id: 2,
            trigger_kind: "http".into(),
            trigger_name: "web".into(),
            ..Default::default()
        },
        WrapperConfig { kind, ..Default::default() },
    )
}

fn addresses() -> WrapperAddresses {
    WrapperAddresses {
        event: "/tmp/nuclio-rpc-a.sock".into(),
        control: Some("/tmp/nuclio-rpc-b.sock".into()),
    }
}

fn argv(wrapper: &dyn Wrapper, addresses: &WrapperAddresses) -> Vec<String> {
    let cmd = wrapper.command(addresses).unwrap();
    let std_cmd = cmd.as_std();
    std::iter::once(std_cmd.get_program())
        .chain(std_cmd.get_args())
        .map(|s: &OsStr| s.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn python_command_and_capabilities() {
    let wrapper = from_config(&config(WrapperKind::Python)).unwrap();
    assert_eq!(
        argv(wrapper.as_ref(), &addresses()),
        vec![
            "python3",
            "-u",
            "/opt/nuclio/_nuclio_wrapper.py",
            "--handler",
            "main:handler",
            "--socket-path",
            "/tmp/nuclio-rpc-a.sock",
            "--platform-kind",
            "local",
            "--namespace",
            "default",
            "--worker-id",
            "2",
            "--trigger-kind",
            "http",
            "--trigger-name",
            "web",
        ]
    );
    assert_eq!(wrapper.encoding(), EncodingKind::Msgpack);
    assert_eq!(wrapper.socket_type(), SocketType::Unix);
    assert!(!wrapper.supports_control_communication());
    assert!(wrapper.wait_for_start());
    assert!(wrapper.supports_restart());
}

#[test]
fn python_passes_only_flags_the_wrapper_script_accepts() {
    const ACCEPTED: &[&str] = &[
        "--handler",
        "--socket-path",
        "--log-level",
        "--platform-kind",
        "--namespace",
        "--trigger-kind",
        "--trigger-name",
        "--worker-id",
        "--decode-event-strings",
    ];
    let wrapper = from_config(&config(WrapperKind::Python)).unwrap();
    let addresses = WrapperAddresses { event: "/tmp/e.sock".into(), control: None };
    let args = argv(wrapper.as_ref(), &addresses);
    for flag in args.iter().filter(|a| a.starts_with("--")) {
        assert!(ACCEPTED.contains(&flag.as_str()), "unexpected flag {flag}");
    }
    let socket = args.iter().position(|a| a == "--socket-path").unwrap();
    assert_eq!(args[socket + 1], "/tmp/e.sock");
}

#[yare::parameterized(
    java   = { WrapperKind::Java },
    kotlin = { WrapperKind::Kotlin },
)]
fn jvm_uses_tcp_port(kind: WrapperKind) {
    let wrapper = from_config(&config(kind)).unwrap();
    let addresses = WrapperAddresses { event: "40123".into(), control: None };
    let args = argv(wrapper.as_ref(), &addresses);
    assert_eq!(args[0], "java");
    let port = args.iter().position(|a| a == "-port").unwrap();
    assert_eq!(args[port + 1], "40123");
    assert_eq!(wrapper.kind(), kind);
    assert_eq!(wrapper.socket_type(), SocketType::Tcp);
    assert_eq!(wrapper.encoding(), EncodingKind::Json);
    assert!(!wrapper.supports_restart());
}

#[test]
fn nodejs_splits_handler() {
    let wrapper = from_config(&config(WrapperKind::Nodejs)).unwrap();
    assert_eq!(
        argv(wrapper.as_ref(), &addresses()),
        vec!["node", "/opt/nuclio/wrapper.js", "/tmp/nuclio-rpc-a.sock", "main.js", "handler"]
    );
}

#[test]
fn nodejs_rejects_handler_without_function() {
    let mut cfg = config(WrapperKind::Nodejs);
    cfg.function.handler = "main".into();
    let wrapper = from_config(&cfg).unwrap();
    assert!(matches!(wrapper.command(&addresses()), Err(RuntimeError::Config(_))));
}

#[test]
fn ruby_and_dotnet_commands() {
    let ruby = from_config(&config(WrapperKind::Ruby)).unwrap();
    assert_eq!(
        argv(ruby.as_ref(), &addresses()),
        vec![
            "ruby",
            "/opt/nuclio/wrapper.rb",
            "--handler",
            "main:handler",
            "--socket-path",
            "/tmp/nuclio-rpc-a.sock"
        ]
    );

    let dotnet = from_config(&config(WrapperKind::Dotnetcore)).unwrap();
    assert_eq!(
        argv(dotnet.as_ref(), &addresses()),
        vec!["dotnet", "/opt/nuclio/wrapper/wrapper.dll", "/tmp/nuclio-rpc-a.sock", "main:handler"]
    );
    assert!(!dotnet.supports_control_communication());
}

#[test]
fn command_substitutes_placeholders_and_honors_overrides() {
    let mut cfg = config(WrapperKind::Command);
    cfg.wrapper.executable = Some("/bin/my-wrapper".into());
    cfg.wrapper.args = vec!["--in={event_socket}".into(), "--ctl".into(), "{control_socket}".into()];
    cfg.wrapper.socket_type = Some(SocketType::Tcp);
    cfg.wrapper.encoding = Some(EncodingKind::Msgpack);
    cfg.wrapper.control = Some(true);
    let wrapper = from_config(&cfg).unwrap();

    assert_eq!(
        argv(wrapper.as_ref(), &addresses()),
        vec!["/bin/my-wrapper", "--in=/tmp/nuclio-rpc-a.sock", "--ctl", "/tmp/nuclio-rpc-b.sock"]
    );
    assert_eq!(wrapper.socket_type(), SocketType::Tcp);
    assert_eq!(wrapper.encoding(), EncodingKind::Msgpack);
    assert!(wrapper.supports_control_communication());
    assert!(!wrapper.wait_for_start());
    assert!(wrapper.supports_restart());
}

#[test]
fn executable_and_script_overrides() {
    let mut cfg = config(WrapperKind::Python);
    cfg.wrapper.executable = Some("/usr/bin/python3.11".into());
    cfg.wrapper.script = Some("/srv/wrapper.py".into());
    let wrapper = from_config(&cfg).unwrap();
    let args = argv(wrapper.as_ref(), &addresses());
    assert_eq!(args[0], "/usr/bin/python3.11");
    assert_eq!(args[2], "/srv/wrapper.py");
}

#[test]
fn function_env_vars() {
    let mut extra = BTreeMap::new();
    extra.insert("EXTRA".to_string(), "1".to_string());
    let env = FunctionEnv {
        name: "echo".into(),
        description: "d".into(),
        version: "3".into(),
        handler: "main:handler".into(),
        extra,
    };
    let vars = env.vars();
    assert!(vars.contains(&("NUCLIO_FUNCTION_NAME".into(), "echo".into())));
    assert!(vars.contains(&("NUCLIO_FUNCTION_DESCRIPTION".into(), "d".into())));
    assert!(vars.contains(&("NUCLIO_FUNCTION_VERSION".into(), "3".into())));
    assert!(vars.contains(&("NUCLIO_FUNCTION_HANDLER".into(), "main:handler".into())));
    assert!(vars.contains(&("EXTRA".into(), "1".into())));
}

#[tokio::test]
async fn run_wrapper_passes_env_to_child() {
    let mut cfg = config(WrapperKind::Command);
    cfg.wrapper.executable = Some("/bin/sh".into());
    cfg.wrapper.args = vec!["-c".into(), "test \"$NUCLIO_FUNCTION_NAME\" = echo".into()];
    let wrapper = from_config(&cfg).unwrap();
    let mut child = wrapper.run_wrapper(&addresses(), &cfg.function_env()).unwrap();
    assert!(child.wait().await.unwrap().success());
}

#[tokio::test]
async fn run_wrapper_reports_spawn_failure() {
    let mut cfg = config(WrapperKind::Command);
    cfg.wrapper.executable = Some("/nonexistent/wrapper".into());
    let wrapper = from_config(&cfg).unwrap();
    let err = wrapper.run_wrapper(&addresses(), &cfg.function_env()).unwrap_err();
    assert!(matches!(err, RuntimeError::Spawn(_)));
}
