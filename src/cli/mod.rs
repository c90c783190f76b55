use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

pub mod handlers;
pub mod logging;

/// The overview printed for `aviary`, `aviary -h` and `aviary --help`.
const BANNER: &str = "

                    ......:::::: AVIARY ::::::......

           A comprehensive metagenomics bioinformatics pipeline

Metagenome assembly, binning, and annotation:
        assemble  - Perform hybrid assembly using short and long reads,
                    or assembly using only short reads
        recover   - Recover MAGs from provided assembly using a variety
                    of binning algorithms
        annotate  - Annotate MAGs
        genotype  - Perform strain level analysis of MAGs
        viral     - Recover and annotate viral genomes
        cluster   - Combines and dereplicates the MAGs from multiple Aviary runs
                    using Galah
        complete  - Runs each stage of the pipeline: assemble, recover,
                    annotate, genotype in that order.

Isolate assembly, binning, and annotation:
        isolate   - Perform isolate assembly

Utility modules:
        configure - Set or overwrite the environment variables for future runs.

";

const BANNER_TITLE: &str = "......:::::: AVIARY ::::::......";

/// Builds the top-level overview with a bold yellow title.
pub fn render_banner() -> String {
    BANNER.replace(BANNER_TITLE, &BANNER_TITLE.yellow().bold().to_string())
}

/// True when the arguments ask for the overview instead of a subcommand.
pub fn wants_banner(args: &[String]) -> bool {
    match args.first().map(String::as_str) {
        None => true,
        Some(first) => first == "-h" || first == "--help",
    }
}

/// aviary: configuration and dispatch front end for the metagenomics pipeline.
#[derive(Parser, Debug)]
#[command(
    name = "aviary",
    version,
    about,
    no_binary_name = true,
    disable_help_flag = true,
    disable_help_subcommand = true,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
pub struct Cli {
    /// 1 = critical, 2 = error, 3 = warning, 4 = info, 5 = debug.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub verbosity: u8,

    /// Output logging information to file.
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// The subcommand followed by its own arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn test_banner_requests() {
        assert!(wants_banner(&[]));
        assert!(wants_banner(&words(&["-h"])));
        assert!(wants_banner(&words(&["--help"])));
        assert!(!wants_banner(&words(&["assemble", "--help"])));
    }

    #[test]
    fn test_banner_plain_without_colors() {
        colored::control::set_override(false);
        let banner = render_banner();
        colored::control::unset_override();
        assert_eq!(banner, BANNER);
        assert!(!banner.contains('\x1b'));
    }

    #[test]
    fn test_banner_lists_every_subcommand() {
        for def in crate::core::registry::subcommands() {
            assert!(BANNER.contains(&format!("        {}", def.name)), "{}", def.name);
        }
    }

    #[test]
    fn test_global_flags_before_subcommand() {
        let cli = Cli::try_parse_from(words(&[
            "--verbosity",
            "5",
            "--log",
            "run.log",
            "assemble",
            "-1",
            "a.fq",
        ]))
        .unwrap();
        assert_eq!(cli.verbosity, 5);
        assert_eq!(cli.log, Some(PathBuf::from("run.log")));
        assert_eq!(cli.args, words(&["assemble", "-1", "a.fq"]));
    }

    #[test]
    fn test_subcommand_flags_are_not_taken_as_global() {
        let cli = Cli::try_parse_from(words(&["recover", "--log", "x", "-t", "4"])).unwrap();
        assert_eq!(cli.log, None);
        assert_eq!(cli.args, words(&["recover", "--log", "x", "-t", "4"]));
    }

    #[test]
    fn test_verbosity_out_of_range_is_a_usage_error() {
        let err = Cli::try_parse_from(words(&["--verbosity", "9", "assemble"])).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
