use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CNC Simulator - Drive simulated machine variables for SCADA testing
#[derive(Parser)]
#[command(name = "cncsim")]
#[command(about = "Simulated CNC machine variables with timed overrides and sweeps")]
#[command(version)]
pub struct Cli {
    /// Variable catalogue to load instead of the built-in one
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Where the TUI writes its log (line mode logs to stderr)
    #[arg(long, global = true, default_value = "cncsim.log")]
    pub log_file: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the interactive operator console (default)
    Tui,
    /// Read commands line by line from stdin or a script
    Line {
        /// Script of commands to run instead of reading stdin
        #[arg(short, long)]
        script: Option<PathBuf>,
    },
    /// Print the variable catalogue and exit
    List,
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
    /// Write the built-in catalogue to a file as a starting point
    InitConfig {
        /// Path of the configuration file to create
        path: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Selected mode, defaulting to the TUI
    pub fn mode(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Tui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_no_args() {
        // Running with no args should succeed (defaults to TUI mode)
        let result = Cli::try_parse_from(["cncsim"]);
        assert!(result.is_ok());
        let cli = result.unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.mode(), &Commands::Tui);
        assert_eq!(cli.log_file.to_str().unwrap(), "cncsim.log");
    }

    #[test]
    fn test_cli_global_config_after_subcommand() {
        let result = Cli::try_parse_from(["cncsim", "line", "--config", "/path/to/vars.json"]);
        assert!(result.is_ok());
        let cli = result.unwrap();
        assert_eq!(cli.config.unwrap().to_str().unwrap(), "/path/to/vars.json");
        assert_eq!(cli.command, Some(Commands::Line { script: None }));
    }

    #[test]
    fn test_cli_line_with_script() {
        let cli = Cli::try_parse_from(["cncsim", "line", "--script", "demo.txt"]).unwrap();
        match cli.command {
            Some(Commands::Line { script }) => {
                assert_eq!(script.unwrap().to_str().unwrap(), "demo.txt");
            }
            _ => panic!("Expected Line command"),
        }
    }

    #[test]
    fn test_cli_validate_command() {
        let result = Cli::try_parse_from(["cncsim", "validate", "/path/to/vars.json"]);
        assert!(result.is_ok());
        let cli = result.unwrap();
        match cli.command {
            Some(Commands::Validate { config }) => {
                assert_eq!(config.to_str().unwrap(), "/path/to/vars.json");
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_cli_init_config_requires_path() {
        assert!(Cli::try_parse_from(["cncsim", "init-config"]).is_err());
        assert!(Cli::try_parse_from(["cncsim", "init-config", "vars.json"]).is_ok());
    }

    #[test]
    fn test_cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["cncsim", "install"]).is_err());
    }
}
