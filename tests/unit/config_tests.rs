use stream_stitch::config::GlobalConfig;
use stream_stitch::AppError;

#[test]
fn defaults_match_reference_deployment() {
    let config = GlobalConfig::default();

    assert_eq!(config.http_port, 5000);
    assert_eq!(config.output_dir, std::path::PathBuf::from("recordings"));
    assert_eq!(config.transcoder.binary, "ffmpeg");
    assert_eq!(config.transcoder.input_format, "webm");
    assert!(config.transcoder.extra_args.is_empty());
    assert_eq!(config.retry.max_immediate_retries, 1);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = GlobalConfig::from_toml_str("").expect("empty config parses");
    assert_eq!(config, GlobalConfig::default());
}

#[test]
fn parses_full_config() {
    let toml = r#"
http_port = 8080
output_dir = "/var/recordings"

[transcoder]
binary = "/usr/local/bin/ffmpeg"
input_format = "matroska"
extra_args = ["-max_muxing_queue_size", "1024"]

[retry]
max_immediate_retries = 2
"#;

    let config = GlobalConfig::from_toml_str(toml).expect("config parses");

    assert_eq!(config.http_port, 8080);
    assert_eq!(config.output_dir, std::path::PathBuf::from("/var/recordings"));
    assert_eq!(config.transcoder.binary, "/usr/local/bin/ffmpeg");
    assert_eq!(config.transcoder.input_format, "matroska");
    assert_eq!(config.transcoder.extra_args.len(), 2);
    assert_eq!(config.retry.max_immediate_retries, 2);
}

#[test]
fn partial_config_fills_defaults() {
    let config = GlobalConfig::from_toml_str("http_port = 9000\n").expect("config parses");

    assert_eq!(config.http_port, 9000);
    assert_eq!(config.transcoder.binary, "ffmpeg");
    assert_eq!(config.retry.max_immediate_retries, 1);
}

#[test]
fn rejects_empty_transcoder_binary() {
    let err = GlobalConfig::from_toml_str("[transcoder]\nbinary = \"\"\n")
        .expect_err("empty binary rejected");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn rejects_empty_input_format() {
    let err = GlobalConfig::from_toml_str("[transcoder]\ninput_format = \" \"\n")
        .expect_err("blank format rejected");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn rejects_excessive_retry_count() {
    let err = GlobalConfig::from_toml_str("[retry]\nmax_immediate_retries = 9\n")
        .expect_err("retry bound enforced");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn rejects_invalid_toml() {
    let err = GlobalConfig::from_toml_str("http_port = <").expect_err("syntax error rejected");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn loads_from_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "http_port = 7001\n").expect("write config");

    let config = GlobalConfig::load_from_path(&path).expect("config loads");
    assert_eq!(config.http_port, 7001);
}

#[test]
fn missing_file_is_config_error() {
    let err = GlobalConfig::load_from_path("/nonexistent/config.toml")
        .expect_err("missing file rejected");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn ensure_output_dir_creates_nested_path() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = GlobalConfig {
        output_dir: temp.path().join("a").join("b"),
        ..GlobalConfig::default()
    };

    config.ensure_output_dir().expect("dir created");
    assert!(config.output_dir.is_dir());
}
