use stream_stitch::AppError;

#[test]
fn display_includes_category_prefix() {
    assert_eq!(
        AppError::Config("bad port".into()).to_string(),
        "config: bad port"
    );
    assert_eq!(
        AppError::Spawn("no ffmpeg".into()).to_string(),
        "spawn: no ffmpeg"
    );
    assert_eq!(
        AppError::Pipe("broken pipe".into()).to_string(),
        "pipe: broken pipe"
    );
    assert_eq!(
        AppError::NotFound("session x".into()).to_string(),
        "not found: session x"
    );
    assert_eq!(AppError::Io("disk full".into()).to_string(), "io: disk full");
}

#[test]
fn toml_errors_convert_to_config() {
    let parse_err = toml::from_str::<toml::Value>("= nonsense").expect_err("invalid toml");
    let err: AppError = parse_err.into();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn implements_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(AppError::Pipe("x".into()));
    assert!(err.to_string().starts_with("pipe:"));
}
