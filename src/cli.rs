use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::menu::MenuAction;

#[derive(Parser)]
#[command(name = "xpopd", about = "Text-selection acquisition daemon")]
pub struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/xpop/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the selection daemon
    Daemon {
        /// Enable the menu-driven copy strategy
        #[arg(long)]
        force_copy: bool,

        /// Drag events required for a drag-select
        #[arg(long)]
        drag_threshold: Option<usize>,
    },

    /// Acquire the current selection once and print it
    Probe {
        /// Enable the menu-driven copy strategy
        #[arg(long)]
        force_copy: bool,
    },

    /// Print Copy/Cut/Paste availability for the frontmost application
    MenuState,

    /// Send a request to a running daemon
    Client {
        #[command(subcommand)]
        action: ClientAction,
    },
}

#[derive(Subcommand)]
pub enum ClientAction {
    /// Print the last published selection
    Selection,

    /// Acquire the selection now
    Acquire,

    /// Subscribe and print selection/dismiss pushes until interrupted
    Watch,

    /// Turn the menu-driven copy strategy on or off
    ForceCopy {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Print daemon status
    Status,

    /// Press a built-in menu item in the frontmost application
    Perform {
        #[arg(value_enum)]
        action: MenuAction,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Toggle::On
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_daemon_overrides() {
        let cli = Cli::parse_from([
            "xpopd",
            "--config",
            "/tmp/x.toml",
            "daemon",
            "--force-copy",
            "--drag-threshold",
            "5",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
        match cli.command {
            Command::Daemon {
                force_copy,
                drag_threshold,
            } => {
                assert!(force_copy);
                assert_eq!(drag_threshold, Some(5));
            }
            _ => panic!("expected daemon"),
        }
    }

    #[test]
    fn parses_client_actions() {
        let cli = Cli::parse_from(["xpopd", "client", "perform", "cut"]);
        assert!(matches!(
            cli.command,
            Command::Client {
                action: ClientAction::Perform {
                    action: MenuAction::Cut
                }
            }
        ));

        let cli = Cli::parse_from(["xpopd", "client", "force-copy", "off"]);
        match cli.command {
            Command::Client {
                action: ClientAction::ForceCopy { state },
            } => assert!(!state.enabled()),
            _ => panic!("expected force-copy"),
        }
    }

    #[test]
    fn rejects_unknown_action() {
        assert!(Cli::try_parse_from(["xpopd", "client", "perform", "undo"]).is_err());
    }
}
