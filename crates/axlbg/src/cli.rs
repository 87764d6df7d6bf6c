use std::path::PathBuf;

use backdrop::{EffectKind, SurfaceSize};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "axlbg",
    author,
    version,
    about = "Animated backdrop for the Axl assistant"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Effect to show (`prism` or `blinds`); overrides the config file.
    #[arg(long, value_name = "EFFECT", value_parser = parse_effect)]
    pub effect: Option<EffectKind>,

    /// TOML configuration file.
    #[arg(long, value_name = "FILE", env = "AXLBG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(
        long,
        value_name = "WIDTHxHEIGHT",
        value_parser = parse_size,
        default_value = "1280x720"
    )]
    pub size: SurfaceSize,

    /// Run without a window or GPU, recording frames in memory.
    #[arg(long)]
    pub headless: bool,

    /// Number of ticks to run in headless mode.
    #[arg(long, value_name = "N", default_value_t = 120)]
    pub frames: u64,

    /// Seed for the panel noise (headless mode only).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved configuration as TOML.
    PrintConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_effect(value: &str) -> Result<EffectKind, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("effect must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "prism" => Ok(EffectKind::Prism),
        "blinds" | "gradient-blinds" => Ok(EffectKind::Blinds),
        other => Err(format!(
            "unknown effect '{other}'; expected prism or blinds"
        )),
    }
}

pub fn parse_size(value: &str) -> Result<SurfaceSize, String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("size must be greater than zero".into());
    }
    Ok(SurfaceSize::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_effect_names() {
        assert_eq!(parse_effect("Prism").unwrap(), EffectKind::Prism);
        assert_eq!(parse_effect(" blinds ").unwrap(), EffectKind::Blinds);
        assert!(parse_effect("").is_err());
        assert!(parse_effect("aurora").is_err());
    }

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1920x1080").unwrap(), SurfaceSize::new(1920, 1080));
        assert_eq!(parse_size("640X480").unwrap(), SurfaceSize::new(640, 480));
        assert!(parse_size("0x480").is_err());
        assert!(parse_size("640").is_err());
        assert!(parse_size("wide x tall").is_err());
    }

    #[test]
    fn subcommand_accepts_leading_run_flags() {
        let cli = Cli::try_parse_from(["axlbg", "--effect", "prism", "print-config"]).unwrap();
        assert_eq!(cli.run.effect, Some(EffectKind::Prism));
        assert!(matches!(cli.command, Some(Command::PrintConfig)));
        assert_eq!(cli.run.size, SurfaceSize::new(1280, 720));
    }
}
