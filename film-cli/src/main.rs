//! Command-line front end for the short-film generation pipeline.

use std::path::PathBuf;
use std::process;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use film_core::config::{load_api_keys, ConfigManager, Settings};
use film_core::logging::LogCallback;
use film_core::models::{FilmSpec, FilmStyle, MusicVibe, ProviderKind};
use film_core::orchestrator::{Capabilities, FilmGenerator, GeneratorError, RunOutcome};

/// Unresolved permanent failure (or bad arguments).
const EXIT_FAILURE: i32 = 1;
/// Resume was requested but there is no saved job.
const EXIT_NOTHING_TO_RESUME: i32 = 2;

#[derive(Parser)]
#[command(
    name = "short-film",
    version,
    about = "Generate short films using AI video generation"
)]
struct Cli {
    /// Path to a settings file (created with defaults if absent).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a short film from a premise.
    Generate(GenerateArgs),
    /// List available film styles.
    Styles,
    /// List available music vibes.
    Vibes,
}

#[derive(Args)]
struct GenerateArgs {
    /// Film premise/description.
    #[arg(short, long)]
    premise: String,

    /// Film style.
    #[arg(short, long, default_value = "cinematic")]
    style: String,

    /// Music vibe (carried as metadata; no audio is generated).
    #[arg(short = 'm', long, default_value = "epic")]
    music_vibe: String,

    /// Video generation provider (openai or gemini).
    #[arg(long, default_value = "openai")]
    provider: String,

    /// Target film duration in seconds.
    #[arg(short, long, default_value_t = 60)]
    duration: u32,

    /// Output directory for all generated files.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Resume a previously interrupted job in the output directory.
    #[arg(long)]
    resume: bool,
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:#}");
            EXIT_FAILURE
        }
    };
    process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Generate(args) => generate(cli.config, args),
        Command::Styles => {
            print_styles();
            Ok(0)
        }
        Command::Vibes => {
            print_vibes();
            Ok(0)
        }
    }
}

fn generate(config: Option<PathBuf>, args: GenerateArgs) -> anyhow::Result<i32> {
    let settings = load_settings(config)?;

    let style = FilmStyle::from_name(&args.style)
        .with_context(|| format!("unknown style '{}'; run `short-film styles`", args.style))?;
    let music_vibe = MusicVibe::from_name(&args.music_vibe).with_context(|| {
        format!("unknown music vibe '{}'; run `short-film vibes`", args.music_vibe)
    })?;
    let provider = ProviderKind::from_name(&args.provider)
        .with_context(|| format!("unknown provider '{}' (openai or gemini)", args.provider))?;

    let film = FilmSpec::new(
        args.premise,
        style,
        music_vibe,
        provider,
        args.duration,
        settings.generation.clip_duration_secs,
    )?;

    let output_dir = args
        .output
        .unwrap_or_else(|| PathBuf::from(&settings.paths.output_folder));

    let keys = load_api_keys();
    let capabilities = Capabilities::from_providers(&film, &keys, &settings.generation)
        .context("cannot set up generation providers")?;

    let echo: LogCallback = Box::new(|line| println!("{line}"));
    let generator = FilmGenerator::new(output_dir, settings, capabilities, Some(echo))?;

    let run = if args.resume {
        match generator.resume() {
            Err(GeneratorError::NothingToResume { dir }) => {
                eprintln!("Nothing to resume under {}", dir.display());
                return Ok(EXIT_NOTHING_TO_RESUME);
            }
            other => other?,
        }
    } else {
        generator.start(film)?
    };

    match run.outcome {
        RunOutcome::Completed { film } => {
            println!("Success! Your film is ready: {}", film.display());
            Ok(0)
        }
        RunOutcome::Halted { error } => {
            eprintln!("Generation halted: {error}");
            eprintln!("Progress is saved; re-run with --resume to continue.");
            Ok(EXIT_FAILURE)
        }
    }
}

fn load_settings(config: Option<PathBuf>) -> anyhow::Result<Settings> {
    match config {
        Some(path) => {
            let mut manager = ConfigManager::new(&path);
            manager
                .load_or_create()
                .with_context(|| format!("cannot load settings from {}", path.display()))?;
            Ok(manager.settings().clone())
        }
        None => Ok(Settings::default()),
    }
}

fn print_styles() {
    println!("Available film styles:");
    for style in FilmStyle::all() {
        println!("  {:<12} {}", style.name(), style.description());
    }
}

fn print_vibes() {
    println!("Available music vibes:");
    for vibe in MusicVibe::all() {
        println!("  {:<12} {}", vibe.name(), vibe.description());
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_arguments() {
        let cli = Cli::try_parse_from([
            "short-film",
            "generate",
            "-p",
            "A lone astronaut discovers an alien artifact on Mars",
            "--style",
            "scifi",
            "-m",
            "suspenseful",
            "--provider",
            "gemini",
            "-d",
            "30",
            "--resume",
        ])
        .unwrap();

        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.style, "scifi");
                assert_eq!(args.music_vibe, "suspenseful");
                assert_eq!(args.provider, "gemini");
                assert_eq!(args.duration, 30);
                assert!(args.resume);
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn generate_defaults_match_the_original_tool() {
        let cli = Cli::try_parse_from(["short-film", "generate", "-p", "premise"]).unwrap();
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.style, "cinematic");
                assert_eq!(args.music_vibe, "epic");
                assert_eq!(args.provider, "openai");
                assert_eq!(args.duration, 60);
                assert!(!args.resume);
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn styles_and_vibes_subcommands_parse() {
        assert!(Cli::try_parse_from(["short-film", "styles"]).is_ok());
        assert!(Cli::try_parse_from(["short-film", "vibes"]).is_ok());
    }
}
