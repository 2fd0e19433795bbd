//! Pasvlink library
//!
//! Minimal passive-mode FTP client: a blocking control-connection session,
//! PASV data channels, NLST listings and RETR downloads, plus the browser
//! state that drives them from an interactive front end.

pub mod browser;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod journal;
pub mod listing;
pub mod logger;
pub mod progress;
pub mod protocol;
pub mod session;
pub mod transfer;
pub mod transport;
pub mod url;

pub use error::{FtpError, Result};
pub use session::{Session, SessionState};
