use super::*;
use std::fs;
use tempfile::TempDir;
use serde_json::json;
use webos_remote::error::SessionError;

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["wtv"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

fn config_arg(dir: &TempDir) -> String {
    dir.path().join("wtv.toml").to_str().unwrap().to_string()
}

#[test]
fn test_defaults_without_flags() {
    let cli = parse(&["--cmd", "info"]);
    assert_eq!(cli.cmd.as_deref(), Some("info"));
    assert_eq!(cli.arg, "");
    assert_eq!(cli.config_path(), ".webos-remote.toml");
    assert_eq!(cli.verbose, 0);
    assert!(!cli.init);
}

#[test]
fn test_all_flags_parse() {
    let cli = parse(&[
        "--addr",
        "10.0.0.2:3000",
        "--key-file",
        "/tmp/tv-key",
        "--cmd",
        "launch",
        "--arg",
        "netflix",
        "--payload",
        r#"{"contentId":"42"}"#,
        "--use-socks5-proxy",
        "127.0.0.1:1080",
        "-vv",
    ]);
    assert_eq!(cli.addr.as_deref(), Some("10.0.0.2:3000"));
    assert_eq!(cli.key_file, Some(PathBuf::from("/tmp/tv-key")));
    assert_eq!(cli.arg, "netflix");
    assert_eq!(cli.payload.as_deref(), Some(r#"{"contentId":"42"}"#));
    assert_eq!(cli.socks5_proxy.as_deref(), Some("127.0.0.1:1080"));
    assert_eq!(cli.verbose, 2);
}

#[test]
fn test_help_lists_commands() {
    let help = after_help();
    assert!(help.contains("initialize-key"));
    assert!(help.contains("--cmd vol-set --arg 20"));
    assert!(help.contains("fast-forward"));
}

#[test]
fn test_init_config_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = config_arg(&temp_dir);

    let result = init_config(&path);
    assert!(result.is_ok(), "init_config should succeed: {:?}", result.err());

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("addr = \"192.168.1.237:3000\""));
    assert!(content.contains("key_file = \"key\""));
    assert!(content.contains("# socks5_proxy"));

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.close_timeout_ms, Some(1000));
    assert_eq!(config.socks5_proxy(), None);
}

#[test]
fn test_init_config_skips_if_file_exists() {
    let temp_dir = TempDir::new().unwrap();
    let path = config_arg(&temp_dir);
    fs::write(&path, "addr = \"tv.local:3000\"\n").unwrap();

    init_config(&path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "addr = \"tv.local:3000\"\n");
}

#[test]
fn test_flags_override_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = config_arg(&temp_dir);
    fs::write(
        &path,
        "addr = \"tv.local:3000\"\nkey_file = \"file-key\"\nsocks5_proxy = \"10.0.0.9:1080\"\n",
    )
    .unwrap();

    let cli = parse(&["--config", &path, "--addr", "10.0.0.2:3000", "--cmd", "info"]);
    let config = resolve_config(&cli).unwrap();

    assert_eq!(config.addr(), "10.0.0.2:3000");
    assert_eq!(config.key_file(), PathBuf::from("file-key"));
    assert_eq!(config.socks5_proxy(), Some("10.0.0.9:1080"));
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = config_arg(&temp_dir);

    let cli = parse(&["--config", &path, "--cmd", "info"]);
    assert!(resolve_config(&cli).is_err());
}

#[test]
fn test_invalid_addr_flag_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = config_arg(&temp_dir);
    fs::write(&path, "").unwrap();

    let cli = parse(&["--config", &path, "--addr", "tv-without-port", "--cmd", "info"]);
    assert!(resolve_config(&cli).is_err());
}

#[test]
fn test_no_cmd_is_a_failure() {
    let cli = parse(&[]);
    let result = build_invocation(&cli).map(|_| RunResult::Interrupted);
    assert!(result.is_err());
    assert_eq!(exit_status(&result), 1);
    assert_eq!(stdout_text(&result), None);
}

#[test]
fn test_unknown_command_is_rejected() {
    let cli = parse(&["--cmd", "self-destruct"]);
    let err = build_invocation(&cli).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::UnknownCommand(name)) if name == "self-destruct"
    ));
}

#[test]
fn test_toast_without_message_is_rejected() {
    let cli = parse(&["--cmd", "toast"]);
    let err = build_invocation(&cli).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::MissingArgument { command: "toast", .. })
    ));
}

#[test]
fn test_invalid_launch_payload_is_rejected() {
    let cli = parse(&["--cmd", "launch", "--arg", "youtube", "--payload", "{not json"]);
    let err = build_invocation(&cli).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::InvalidPayload(_))
    ));
}

#[test]
fn test_valid_invocation_keeps_argument() {
    let cli = parse(&["--cmd", "vol-set", "--arg", "20"]);
    let invocation = build_invocation(&cli).unwrap();
    assert_eq!(invocation.command, Command::VolSet);
    assert_eq!(invocation.argument, "20");
    assert_eq!(invocation.launch_params, None);
}

#[test]
fn test_query_exits_zero_and_prints_indented_json() {
    let result = Ok(RunResult::Completed(Outcome::Query {
        command: Command::Info,
        payload: json!({"product_name": "webOSTV 5.0", "major_ver": "05"}),
    }));
    assert_eq!(exit_status(&result), 0);
    assert_eq!(
        stdout_text(&result).as_deref(),
        Some("{\n  \"major_ver\": \"05\",\n  \"product_name\": \"webOSTV 5.0\"\n}")
    );
}

#[test]
fn test_acknowledged_action_exits_zero_without_stdout() {
    let result = Ok(RunResult::Completed(Outcome::Acknowledged {
        command: Command::Toast,
    }));
    assert_eq!(exit_status(&result), 0);
    assert_eq!(stdout_text(&result), None);
}

#[test]
fn test_key_initialized_exits_zero_without_stdout() {
    let result = Ok(RunResult::Completed(Outcome::KeyInitialized));
    assert_eq!(exit_status(&result), 0);
    assert_eq!(stdout_text(&result), None);
}

#[test]
fn test_interrupted_exits_130() {
    let result = Ok(RunResult::Interrupted);
    assert_eq!(exit_status(&result), 130);
    assert_eq!(stdout_text(&result), None);
}

#[test]
fn test_session_failure_exits_one() {
    let result: anyhow::Result<RunResult> =
        Err(SessionError::AppNotFound("hulu".to_string()).into());
    assert_eq!(exit_status(&result), 1);
    assert_eq!(stdout_text(&result), None);
}
