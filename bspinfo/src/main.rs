use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use map_survey::config::{OutputFormat, SurveyConfig};
use map_survey::ingest::{collect_inputs, fingerprint_file, survey_paths};
use map_survey::logging::{init_tracing, TracingSink};
use map_survey::render::{render_entities_json, render_json, render_text};
use map_survey::{build_report, Report, Survey, SurveyError};

const EXIT_SUCCESS: i32 = 0;
const EXIT_USAGE: i32 = 2;
const EXIT_CONFIG: i32 = 10;
const EXIT_FAILED: i32 = 11;

#[derive(Parser)]
#[command(
    name = "bspinfo",
    version,
    about = "Item, weapon and game mode listing for id Tech 3 maps"
)]
struct Cli {
    /// Config file; defaults to ./bspinfo.toml when present.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Tracing filter, e.g. `debug` or `map_survey=debug`.
    #[arg(long, value_name = "FILTER", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify maps and print their inventory.
    Report(ReportArgs),
    /// Print engine checksums without parsing entities.
    Hash(PathArgs),
    /// Dump raw entity records as JSON, keyed by map name.
    Entities(PathArgs),
}

#[derive(Parser)]
struct ReportArgs {
    #[arg(short, long)]
    json: bool,

    /// .bsp or .pk3 files, or directories to search for pk3 archives.
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

#[derive(Parser)]
struct PathArgs {
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                EXIT_USAGE
            } else {
                EXIT_SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            return EXIT_CONFIG;
        }
    };
    if let Err(err) = init_tracing(&config.logging) {
        eprintln!("{}", err);
        return EXIT_CONFIG;
    }

    match cli.command {
        Commands::Report(args) => run_report(&args.paths, &config),
        Commands::Hash(args) => run_hash(&args.paths, &config),
        Commands::Entities(args) => run_entities(&args.paths, &config),
    }
}

fn load_config(cli: &Cli) -> Result<SurveyConfig, String> {
    let mut config =
        SurveyConfig::load_or_default(cli.config.as_deref()).map_err(|err| err.to_string())?;
    apply_overrides(&mut config, cli);
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn apply_overrides(config: &mut SurveyConfig, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Commands::Report(args) = &cli.command {
        if args.json {
            config.output.format = OutputFormat::Json;
        }
    }
}

fn run_report(paths: &[PathBuf], config: &SurveyConfig) -> i32 {
    let mut failed = false;
    let mut reports = Vec::new();
    for survey in survey_paths(paths, &config.scan, TracingSink) {
        match survey.and_then(|survey| build_report(&survey, TracingSink)) {
            Ok(report) => {
                if let Report::Archive(archive) = &report {
                    failed |= !archive.is_complete();
                }
                reports.push(report);
            }
            Err(err) => {
                log_failure(&err);
                failed = true;
            }
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = match config.output.format {
        OutputFormat::Text => render_text(&reports, &mut out, TracingSink),
        OutputFormat::Json => render_json(&reports, &mut out),
    };
    finish(written.and_then(|_| out.flush()), failed)
}

fn run_hash(paths: &[PathBuf], config: &SurveyConfig) -> i32 {
    let mut failed = false;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for input in collect_inputs(paths, &config.scan) {
        let hashed = input.and_then(|path| {
            fingerprint_file(&path, &config.scan).map(|fingerprint| (path, fingerprint))
        });
        match hashed {
            Ok((path, fingerprint)) => {
                if let Err(err) = writeln!(out, "{}  {}", fingerprint, path.display()) {
                    return finish(Err(err), failed);
                }
            }
            Err(err) => {
                log_failure(&err);
                failed = true;
            }
        }
    }
    finish(out.flush(), failed)
}

fn run_entities(paths: &[PathBuf], config: &SurveyConfig) -> i32 {
    let mut failed = false;
    let mut surveys = Vec::new();
    for survey in survey_paths(paths, &config.scan, TracingSink) {
        match survey {
            Ok(survey) => {
                if let Survey::Archive(archive) = &survey {
                    failed |= !archive.failures.is_empty();
                }
                surveys.push(survey);
            }
            Err(err) => {
                log_failure(&err);
                failed = true;
            }
        }
    }
    let stdout = io::stdout();
    let mut out = stdout.lock();
    finish(
        render_entities_json(&surveys, &mut out).and_then(|_| out.flush()),
        failed,
    )
}

fn log_failure(err: &SurveyError) {
    tracing::error!(kind = err.kind().as_str(), "{}", err);
}

fn finish(written: io::Result<()>, failed: bool) -> i32 {
    if let Err(err) = written {
        eprintln!("write failed: {}", err);
        return EXIT_FAILED;
    }
    if failed {
        EXIT_FAILED
    } else {
        EXIT_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_takes_json_flag_and_paths() {
        let cli = Cli::try_parse_from(["bspinfo", "report", "-j", "a.pk3", "maps/b.bsp"])
            .expect("parse ok");
        let Commands::Report(args) = &cli.command else {
            panic!("expected report command");
        };
        assert!(args.json);
        assert_eq!(
            args.paths,
            vec![PathBuf::from("a.pk3"), PathBuf::from("maps/b.bsp")]
        );
    }

    #[test]
    fn paths_are_required() {
        assert!(Cli::try_parse_from(["bspinfo", "hash"]).is_err());
        assert!(Cli::try_parse_from(["bspinfo", "entities"]).is_err());
        assert!(Cli::try_parse_from(["bspinfo"]).is_err());
    }

    #[test]
    fn global_flags_override_config() {
        let cli = Cli::try_parse_from([
            "bspinfo",
            "report",
            "--json",
            "--log-level",
            "debug",
            "baseq3",
        ])
        .expect("parse ok");
        let mut config = SurveyConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn hash_leaves_output_format_alone() {
        let cli = Cli::try_parse_from(["bspinfo", "--config", "x.toml", "hash", "pak0.pk3"])
            .expect("parse ok");
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        let mut config = SurveyConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = std::env::temp_dir().join("bspinfo-missing-config-test.toml");
        let cli = Cli::try_parse_from([
            "bspinfo".into(),
            "--config".into(),
            dir.into_os_string(),
            "hash".into(),
            "pak0.pk3".into(),
        ])
        .expect("parse ok");
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn finish_maps_outcomes_to_exit_codes() {
        assert_eq!(finish(Ok(()), false), EXIT_SUCCESS);
        assert_eq!(finish(Ok(()), true), EXIT_FAILED);
    }
}
