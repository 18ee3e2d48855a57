//! Decac CLI - Command line interface
//!
//! Compiles syntax-tree files (`*.deca.json`) to IMA or ARM assembly.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process;

mod config;
mod logging;
mod platform;

use crate::config::LogConfig;
use crate::logging::{LogFormat, TracingSink};
use crate::platform::{print_error, print_warning};
use decac_api::{
    compile_files, get_config, init_config, CompilerOptions, FileReport, RunConfig, TargetBackend,
};
use decac_core::CompileOutcome;
use decac_log::Logger;

const BANNER: &str = "decac - Deca compiler (Decac Team)";

#[derive(Parser, Debug)]
#[command(name = "decac", about = "Deca compiler", version)]
struct Cli {
    /// Print the banner and exit
    #[arg(short = 'b')]
    banner: bool,

    /// Stop after reading the tree and print it as JSON
    #[arg(short = 'p', conflicts_with = "verify")]
    parse: bool,

    /// Stop after contextual verification
    #[arg(short = 'v')]
    verify: bool,

    /// Omit runtime checks
    #[arg(short = 'n')]
    no_check: bool,

    /// Limit the allocator to registers R0..R{X-1}
    #[arg(
        short = 'r',
        value_name = "X",
        value_parser = clap::value_parser!(u8).range(4..=16),
        conflicts_with = "arm"
    )]
    registers: Option<u8>,

    /// Debug output, repeat for more
    #[arg(short = 'd', action = ArgAction::Count)]
    debug: u8,

    /// Compile files in parallel
    #[arg(short = 'P')]
    parallel: bool,

    /// Report warnings
    #[arg(short = 'w')]
    warnings: bool,

    /// Generate ARM assembly
    #[arg(short = 'a')]
    arm: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "compact")]
    log_format: LogFormat,

    /// Syntax-tree files to compile
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

impl Cli {
    fn options(&self) -> CompilerOptions {
        CompilerOptions {
            print_banner: self.banner,
            parse_only: self.parse,
            verification_only: self.verify,
            no_check: self.no_check,
            registers: self.registers,
            warnings: self.warnings,
            target: if self.arm {
                TargetBackend::Arm
            } else {
                TargetBackend::Ima
            },
            debug: self.debug,
            parallel: self.parallel,
            source_files: self.files.clone(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let options = cli.options();

    if let Err(e) = options.validate() {
        eprintln!("decac: {}", e);
        process::exit(1);
    }
    if options.print_banner {
        println!("{}", BANNER);
        return;
    }

    let log_config = LogConfig::from_debug_count(options.debug_level());
    if let Err(e) = logging::init(&log_config, cli.log_format) {
        eprintln!("decac: cannot initialize logging: {}", e);
    }
    let logger = Logger::new(decac_log::Level::from_debug_count(options.debug_level()))
        .with_sink(TracingSink);

    // Global config singleton for the rest of the run
    if let Err(e) = init_config(RunConfig::new(options, logger)) {
        eprintln!("decac: {}", e);
        process::exit(1);
    }
    let Some(config) = get_config() else {
        eprintln!("decac: configuration unavailable");
        process::exit(1);
    };

    tracing::debug!(target: "decac::cli", files = config.options.source_files.len(), "starting");
    let reports = compile_files(&config.options.source_files, config);
    let failed = reports
        .iter()
        .filter(|report| !handle_report(report, cli.log_format == LogFormat::Json))
        .count();

    if failed > 0 {
        tracing::info!(target: "decac::cli", failed, "compilation failed");
        process::exit(1);
    }
}

/// Print one file's diagnostics or output; false if the file failed
fn handle_report(report: &FileReport, json: bool) -> bool {
    let output = match &report.result {
        Ok(output) => output,
        Err(e) => {
            print_error(&report.path, e, json);
            return false;
        }
    };

    match &output.outcome {
        CompileOutcome::Parsed(program) => match program.to_json_pretty() {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("{}: cannot print tree: {}", report.path.display(), e);
                return false;
            }
        },
        CompileOutcome::Verified { warnings, .. } => {
            for warning in warnings {
                print_warning(&report.path, warning);
            }
        }
        CompileOutcome::Assembled(assembly) => {
            for warning in &assembly.warnings {
                print_warning(&report.path, warning);
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("decac").chain(args.iter().copied()))
    }

    #[test]
    fn test_flags_map_to_options() {
        let cli = parse(&["-n", "-w", "-P", "-r", "8", "a.deca.json", "b.deca.json"]).unwrap();
        let options = cli.options();
        assert!(options.no_check && options.warnings && options.parallel);
        assert_eq!(options.registers, Some(8));
        assert_eq!(options.target, TargetBackend::Ima);
        assert_eq!(options.source_files.len(), 2);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_parse_conflicts_with_verify() {
        assert!(parse(&["-p", "-v", "a.deca.json"]).is_err());
    }

    #[test]
    fn test_register_range() {
        assert!(parse(&["-r", "3", "a.deca.json"]).is_err());
        assert!(parse(&["-r", "17", "a.deca.json"]).is_err());
        assert!(parse(&["-r", "4", "a.deca.json"]).is_ok());
    }

    #[test]
    fn test_registers_conflict_with_arm() {
        assert!(parse(&["-a", "-r", "8", "a.deca.json"]).is_err());
        let cli = parse(&["-a", "a.deca.json"]).unwrap();
        assert_eq!(cli.options().target, TargetBackend::Arm);
    }

    #[test]
    fn test_debug_is_repeatable() {
        let cli = parse(&["-ddd", "a.deca.json"]).unwrap();
        assert_eq!(cli.options().debug_level(), 3);
    }

    #[test]
    fn test_banner_without_files() {
        let cli = parse(&["-b"]).unwrap();
        assert!(cli.options().validate().is_ok());
    }

    #[test]
    fn test_log_format_option() {
        let cli = parse(&["--log-format", "json", "a.deca.json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
