//! Error taxonomy shared by every layer of the client

use std::io;
use std::path::PathBuf;

use crate::session::SessionState;

pub type Result<T> = std::result::Result<T, FtpError>;

#[derive(thiserror::Error, Debug)]
pub enum FtpError {
    /// Every resolved address for `target` refused or failed to connect.
    #[error("could not connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },
    /// Read or write on the control connection failed. The session is closed.
    #[error("control connection lost: {0}")]
    ControlLost(#[source] io::Error),
    /// The server closed the control connection. The session is closed.
    #[error("control connection closed by server")]
    ControlClosed,
    #[error("no control connection")]
    NotConnected,
    #[error("session is {actual:?}, operation requires {expected:?}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },
    /// The data connection failed. Only the in-flight transfer is affected.
    #[error("data connection failed: {0}")]
    DataChannel(#[source] io::Error),
    /// The data connection broke after `bytes` had been received.
    #[error("data connection failed after {bytes} bytes: {source}")]
    Interrupted {
        bytes: u64,
        #[source]
        source: io::Error,
    },
    #[error("{command} rejected with {code}: {text}")]
    Rejected {
        command: String,
        code: u16,
        text: String,
    },
    #[error("reply has no status code: {0:?}")]
    UnparseableReply(String),
    #[error("malformed PASV reply: {0:?}")]
    MalformedPasv(String),
    #[error("malformed PWD reply: {0:?}")]
    MalformedPwd(String),
    #[error("command line exceeds {limit} bytes")]
    CommandTooLong { limit: usize },
    #[error("local file error for {}: {source}", path.display())]
    Local {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write received data: {0}")]
    Sink(#[source] io::Error),
    #[error("transfer aborted after {bytes} bytes")]
    Aborted { bytes: u64 },
}

impl FtpError {
    /// True when the control connection is gone and the session cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FtpError::ControlLost(_) | FtpError::ControlClosed | FtpError::NotConnected
        )
    }

    /// Bytes received before an abort or a broken data connection.
    pub fn partial_bytes(&self) -> u64 {
        match self {
            FtpError::Aborted { bytes } | FtpError::Interrupted { bytes, .. } => *bytes,
            _ => 0,
        }
    }

    /// The server's reply code, for rejections.
    pub fn reply_code(&self) -> Option<u16> {
        match self {
            FtpError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_control_failures_are_fatal() {
        assert!(FtpError::ControlClosed.is_fatal());
        assert!(FtpError::ControlLost(io::Error::from(io::ErrorKind::BrokenPipe)).is_fatal());
        assert!(!FtpError::DataChannel(io::Error::from(io::ErrorKind::ConnectionReset)).is_fatal());
        assert!(!FtpError::MalformedPasv("227 nope".into()).is_fatal());
        assert!(!FtpError::Aborted { bytes: 10 }.is_fatal());
        assert!(!FtpError::Interrupted {
            bytes: 10,
            source: io::Error::from(io::ErrorKind::ConnectionReset),
        }
        .is_fatal());
    }

    #[test]
    fn partial_bytes_only_for_cut_transfers() {
        assert_eq!(FtpError::Aborted { bytes: 8192 }.partial_bytes(), 8192);
        let cut = FtpError::Interrupted {
            bytes: 4000,
            source: io::Error::from(io::ErrorKind::ConnectionReset),
        };
        assert_eq!(cut.partial_bytes(), 4000);
        assert_eq!(FtpError::ControlClosed.partial_bytes(), 0);
    }

    #[test]
    fn rejection_carries_code() {
        let e = FtpError::Rejected {
            command: "RETR".into(),
            code: 550,
            text: "550 No such file".into(),
        };
        assert_eq!(e.reply_code(), Some(550));
        assert!(e.to_string().contains("550"));
        assert_eq!(FtpError::ControlClosed.reply_code(), None);
    }
}
