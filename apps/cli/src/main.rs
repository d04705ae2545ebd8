use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::{
    domain::{ImageFile, PredefinedStyle},
    protocol::RESULT_FILENAME,
};
use tracing_subscriber::EnvFilter;
use transfer_client::{
    load_settings, HttpStyleTransferClient, SettingsOverrides, StyleTransferService,
};

#[derive(Parser, Debug)]
#[command(name = "imaginet", about = "Headless client for the ImagiNet style-transfer service")]
struct Cli {
    /// Base url of the style-transfer service.
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Path to an imaginet.toml config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stylize one content image and write the result.
    Transfer {
        #[arg(long)]
        content: PathBuf,
        #[arg(long, conflicts_with = "preset", required_unless_present = "preset")]
        style: Option<PathBuf>,
        /// Name of a predefined style, matched case-insensitively.
        #[arg(long)]
        preset: Option<String>,
        #[arg(long, default_value = RESULT_FILENAME)]
        output: PathBuf,
    },
    /// List the predefined styles.
    Styles {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let settings = load_settings(&SettingsOverrides {
        config_path: cli.config,
        endpoint: cli.endpoint,
    })
    .context("failed to load settings")?;

    match cli.command {
        Command::Styles { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&settings.styles)?);
            } else {
                for style in &settings.styles {
                    println!("{}\t{}", style.name, style.url);
                }
            }
        }
        Command::Transfer {
            content,
            style,
            preset,
            output,
        } => {
            let client = HttpStyleTransferClient::from_settings(&settings)
                .context("failed to prepare the style-transfer client")?;
            let content = read_image(&content).await?;
            let style = match (style, preset) {
                (Some(path), _) => read_image(&path).await?,
                (None, Some(name)) => {
                    let preset = find_preset(&settings.styles, &name)?;
                    client.fetch_predefined_style(preset).await.with_context(|| {
                        format!("could not load the predefined style '{}'", preset.name)
                    })?
                }
                (None, None) => bail!("either --style or --preset is required"),
            };

            let result = client
                .transfer(&content, &style)
                .await
                .context("style transfer failed")?;
            tokio::fs::write(&output, &result.bytes[..])
                .await
                .with_context(|| format!("failed to write '{}'", output.display()))?;
            tracing::info!(
                output = %output.display(),
                bytes = result.len(),
                "stylized image written"
            );
            println!("{}", output.display());
        }
    }

    Ok(())
}

async fn read_image(path: &Path) -> Result<ImageFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let media_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());
    Ok(ImageFile::new(filename, media_type, bytes))
}

fn find_preset<'a>(styles: &'a [PredefinedStyle], name: &str) -> Result<&'a PredefinedStyle> {
    let wanted = name.trim();
    if let Some(style) = styles.iter().find(|s| s.name.eq_ignore_ascii_case(wanted)) {
        return Ok(style);
    }
    let known: Vec<&str> = styles.iter().map(|s| s.name.as_str()).collect();
    bail!("unknown style '{wanted}'; known styles: {}", known.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    use shared::domain::default_predefined_styles;

    #[test]
    fn preset_lookup_ignores_case_and_padding() {
        let styles = default_predefined_styles();
        let found = find_preset(&styles, "  the scream ").expect("preset");
        assert_eq!(found.name, "The Scream");
    }

    #[test]
    fn unknown_preset_lists_the_known_names() {
        let styles = default_predefined_styles();
        let err = find_preset(&styles, "Mona Lisa").unwrap_err().to_string();
        assert!(err.contains("Mona Lisa"));
        assert!(err.contains("Starry Night"));
    }

    #[test]
    fn transfer_defaults_output_to_result_filename() {
        let cli = Cli::try_parse_from([
            "imaginet",
            "transfer",
            "--content",
            "c.png",
            "--preset",
            "Starry Night",
        ])
        .expect("parse");
        match cli.command {
            Command::Transfer { output, style, .. } => {
                assert_eq!(output, PathBuf::from("stylized_result.jpg"));
                assert!(style.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn transfer_needs_a_style_or_a_preset() {
        let err = Cli::try_parse_from(["imaginet", "transfer", "--content", "c.png"]);
        assert!(err.is_err());
    }

    #[test]
    fn style_and_preset_are_exclusive() {
        let err = Cli::try_parse_from([
            "imaginet",
            "transfer",
            "--content",
            "c.png",
            "--style",
            "s.png",
            "--preset",
            "The Scream",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn endpoint_flag_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "imaginet",
            "styles",
            "--json",
            "--endpoint",
            "http://svc:9000",
        ])
        .expect("parse");
        assert_eq!(cli.endpoint.as_deref(), Some("http://svc:9000"));
        assert!(matches!(cli.command, Command::Styles { json: true }));
    }
}
