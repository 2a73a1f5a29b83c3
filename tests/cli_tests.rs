use clap::Parser;
use ctwrap::cli::{Command, CtwrapCli};

#[test]
fn generator_overrides_are_collected() {
    let cli = CtwrapCli::parse_from([
        "ctwrap",
        "generate",
        "tixi.yaml",
        "--prefix",
        "tixi",
        "--library",
        "TIXI",
        "--alias",
        "tixiOpenDocument=open",
        "--alias",
        "tixiCloseDocument=close",
        "--close",
        "tixiCloseDocument",
    ]);
    let Command::Generate { generator, output, .. } = cli.command() else {
        panic!("expected generate command");
    };
    assert!(output.is_none());

    let overrides = generator.overrides();
    assert_eq!(overrides.name_prefix.as_deref(), Some("tixi"));
    assert_eq!(overrides.library_name.as_deref(), Some("TIXI"));
    assert_eq!(
        overrides.aliases,
        vec![
            ("tixiOpenDocument".to_string(), "open".to_string()),
            ("tixiCloseDocument".to_string(), "close".to_string()),
        ]
    );
    assert_eq!(
        overrides.close_function_name.as_deref(),
        Some("tixiCloseDocument")
    );
}

#[test]
fn malformed_alias_is_a_usage_error() {
    let result = CtwrapCli::try_parse_from(["ctwrap", "generate", "tixi.yaml", "--alias", "open"]);
    assert!(result.is_err());
}

#[test]
fn check_requires_output() {
    assert!(CtwrapCli::try_parse_from(["ctwrap", "check", "tixi.yaml"]).is_err());

    let cli = CtwrapCli::parse_from([
        "ctwrap",
        "--time",
        "check",
        "tixi.yaml",
        "-o",
        "tixiwrapper.py",
        "--config",
        "ctwrap.yaml",
    ]);
    match cli.command() {
        Command::Check {
            output, generator, ..
        } => {
            assert_eq!(output.to_string_lossy(), "tixiwrapper.py");
            assert_eq!(
                generator.config.as_ref().map(|p| p.to_string_lossy().into_owned()),
                Some("ctwrap.yaml".into())
            );
        }
        other => panic!("expected check command, got {other:?}"),
    }
}

#[test]
fn global_flags_follow_the_subcommand() {
    assert!(CtwrapCli::try_parse_from(["ctwrap", "inspect", "tixi.yaml", "--dump-model", "-v"]).is_ok());
}
