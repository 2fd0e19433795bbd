//! Shared protocol constants for the FTP control and data channels

// Control-channel line bounds. Reply lines longer than this are truncated,
// command lines longer than this are rejected before anything is sent.
pub const MAX_REPLY_LINE: usize = 1024;
pub const MAX_COMMAND_LEN: usize = 256;

// The peer server listens here rather than on the traditional port 21
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "192.168.1.50";
pub const DEFAULT_USER: &str = "anonymous";

// Data-channel receive chunk
pub const DATA_CHUNK_SIZE: usize = 8 * 1024;

// Downloads report progress every time this many more bytes have arrived
pub const PROGRESS_CADENCE: u64 = 64 * 1024;

pub const ROOT_PATH: &str = "/";
pub const PARENT_ENTRY: &str = "..";
pub const CURRENT_ENTRY: &str = ".";

// Command verbs used by the session
pub mod verb {
    pub const USER: &str = "USER";
    pub const PASS: &str = "PASS";
    pub const TYPE: &str = "TYPE";
    pub const PASV: &str = "PASV";
    pub const PWD: &str = "PWD";
    pub const CWD: &str = "CWD";
    pub const CDUP: &str = "CDUP";
    pub const NLST: &str = "NLST";
    pub const LIST: &str = "LIST";
    pub const RETR: &str = "RETR";
    pub const QUIT: &str = "QUIT";
}

// Reply codes the session acts on (RFC 959 §4.2)
pub mod reply {
    pub const LOGGED_IN: u16 = 230;
    pub const NEED_PASSWORD: u16 = 331;

    /// Replies at or above this code make a transfer command fail fast
    pub const FIRST_NEGATIVE: u16 = 400;
}
