//! Command-line definitions for the `pasvlink` and `pasvty` binaries

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(name = "pasvlink", version, about = "Passive-mode FTP client")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Args)]
pub struct GlobalOpts {
    /// Login name (defaults to the configured user, normally "anonymous")
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Password, sent only if the server asks for one
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Config file (default: <config dir>/pasvlink.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Append a protocol transcript to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// List a remote directory (ftp://host[:port][/dir])
    Ls {
        url: String,
        /// Use LIST instead of NLST
        #[arg(short, long)]
        long: bool,
    },
    /// Download a remote file (ftp://host[:port]/dir/file)
    Get {
        url: String,
        /// Directory to save into (default: configured download dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the working directory after login (and after changing into
    /// the URL path, if any)
    Pwd { url: String },
}

/// Options for the interactive browser
#[derive(Clone, Debug, Parser)]
#[command(name = "pasvty", version, about = "Interactive passive-mode FTP browser")]
pub struct TuiOpts {
    /// Connect straight away (ftp://host[:port][/path])
    #[arg(long)]
    pub remote: Option<String>,

    /// Config file (default: <config dir>/pasvlink.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append a protocol transcript to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_get_with_globals_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pasvlink",
            "get",
            "ftp://h/f.bin",
            "-o",
            "/tmp/dl",
            "--user",
            "bob",
        ])
        .unwrap();
        assert_eq!(cli.global.user.as_deref(), Some("bob"));
        match cli.command {
            Command::Get { url, out } => {
                assert_eq!(url, "ftp://h/f.bin");
                assert_eq!(out, Some(PathBuf::from("/tmp/dl")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn ls_long_flag() {
        let cli = Cli::try_parse_from(["pasvlink", "ls", "--long", "ftp://h/"]).unwrap();
        assert!(matches!(cli.command, Command::Ls { long: true, .. }));
    }

    #[test]
    fn tui_opts_are_optional() {
        let o = TuiOpts::try_parse_from(["pasvty"]).unwrap();
        assert!(o.remote.is_none() && o.config.is_none());
    }
}
