use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format for releases: "v0.3.2"
/// Format for dev builds: "v0.3.2\ndev: abc1234 2024-01-15 14:30"
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            format!("v{}", VERSION)
        } else {
            format!("v{}\ndev: {} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "padbackup",
    bin_name = "padbackup",
    version = get_version(),
    disable_help_subcommand = true
)]
#[command(about = "Incremental git backups of Hackpad sites", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (default: padbackup.toml in the working directory)
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Rescan every pad and commit after each one
    #[arg(long, global = true, help_heading = "Options")]
    pub out_of_order: bool,

    /// Seconds to pause after each content fetch
    #[arg(long, global = true, value_name = "SECS", help_heading = "Options")]
    pub delay: Option<f64>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Back up every site in the backup list (default)
    #[command(display_order = 1)]
    Run {
        /// Backup list to read instead of the configured one
        #[arg(long, value_name = "FILE")]
        list: Option<PathBuf>,
    },

    /// Back up a single site
    #[command(display_order = 2)]
    Site {
        /// Site name; omit for the main site
        #[arg(default_value = "")]
        name: String,
    },

    /// Show how far a site has been backed up
    #[command(display_order = 3)]
    Status {
        /// Site name; omit for the main site
        #[arg(default_value = "")]
        name: String,

        /// Also show the last backed-up version of this pad
        #[arg(long, value_name = "ID")]
        pad: Option<String>,
    },

    /// Print the effective configuration
    #[command(display_order = 4)]
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_has_no_command() {
        let cli = Cli::try_parse_from(["padbackup"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn run_with_list_and_globals() {
        let cli = Cli::try_parse_from([
            "padbackup",
            "run",
            "--list",
            "sites.txt",
            "--out-of-order",
            "--delay",
            "0.5",
            "-v",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Run {
                list: Some(PathBuf::from("sites.txt"))
            })
        );
        assert!(cli.out_of_order);
        assert!(cli.verbose);
        assert_eq!(cli.delay, Some(0.5));
    }

    #[test]
    fn site_defaults_to_main() {
        let cli = Cli::try_parse_from(["padbackup", "site"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Site {
                name: String::new()
            })
        );
    }

    #[test]
    fn status_with_pad() {
        let cli = Cli::try_parse_from(["padbackup", "status", "team", "--pad", "abc"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Status {
                name: "team".to_string(),
                pad: Some("abc".to_string())
            })
        );
    }
}
