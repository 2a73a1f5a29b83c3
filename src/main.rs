use ctwrap::cli;

fn main() -> anyhow::Result<()> {
    if let Err(e) = cli::run() {
        let msg = e.to_string();
        // Diagnostics or a status line were already printed for these.
        if msg.contains("model loading failed") || msg.contains("wrapper is stale") {
            std::process::exit(1);
        }
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use ctwrap::cli::{Command, CtwrapCli};

    #[test]
    fn generate_command_honors_output_flag() {
        let cli = CtwrapCli::parse_from([
            "ctwrap",
            "generate",
            "bindings/tixi.yaml",
            "--output",
            "python/tixiwrapper.py",
        ]);
        match cli.command() {
            Command::Generate { model, output, .. } => {
                assert_eq!(model.to_string_lossy(), "bindings/tixi.yaml");
                assert_eq!(
                    output.as_ref().map(|p| p.to_string_lossy().into_owned()),
                    Some("python/tixiwrapper.py".into())
                );
            }
            other => panic!("expected generate command, got {other:?}"),
        }
    }
}
