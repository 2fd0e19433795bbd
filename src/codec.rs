//! FTP control-channel codec: reply framing, reply codes, PASV tuples and
//! command lines.
//!
//! Every physical reply line is handled on its own. Multi-line
//! continuation replies (`220-...`) are not joined.

use std::fmt;
use std::io::{self, Read};

use crate::error::{FtpError, Result};
use crate::protocol::{reply, MAX_COMMAND_LEN};

/// Read one CRLF-terminated line into `buf`, one byte at a time.
///
/// Stops at CRLF, when `buf` holds `max` bytes, or when the peer closes.
/// Never consumes a byte beyond the bound, so an overlong line is
/// truncated and its remainder is left on the stream. Returns the number
/// of bytes read; 0 means the peer closed before sending anything.
pub fn read_reply_line<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max: usize,
) -> io::Result<usize> {
    buf.clear();
    let mut byte = [0u8; 1];
    while buf.len() < max {
        match reader.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                buf.push(byte[0]);
                if buf.ends_with(b"\r\n") {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(buf.len())
}

/// Numeric status of a reply line, or `None` when the first three bytes
/// are not all ASCII digits.
pub fn reply_code(line: &[u8]) -> Option<u16> {
    match line {
        [a, b, c, ..] if a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit() => {
            Some(u16::from(a - b'0') * 100 + u16::from(b - b'0') * 10 + u16::from(c - b'0'))
        }
        _ => None,
    }
}

/// One reply line from the control connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub code: Option<u16>,
    /// Line text without the trailing CRLF
    pub text: String,
}

impl Reply {
    pub fn parse(line: &[u8]) -> Self {
        let text = String::from_utf8_lossy(line)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        Reply {
            code: reply_code(line),
            text,
        }
    }

    pub fn is_preliminary(&self) -> bool {
        matches!(self.code, Some(c) if (100..200).contains(&c))
    }

    /// 2xx or 3xx
    pub fn is_positive(&self) -> bool {
        matches!(self.code, Some(c) if (200..400).contains(&c))
    }

    pub fn is_negative(&self) -> bool {
        matches!(self.code, Some(c) if c >= reply::FIRST_NEGATIVE)
    }

    /// Require a 2xx/3xx reply to `command`.
    pub fn expect_positive(self, command: &str) -> Result<Reply> {
        match self.code {
            None => Err(FtpError::UnparseableReply(self.text)),
            Some(_) if self.is_positive() => Ok(self),
            Some(code) => Err(FtpError::Rejected {
                command: command.to_string(),
                code,
                text: self.text,
            }),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Data-channel endpoint announced by a `227` reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassiveAddr {
    /// Dotted quad `h1.h2.h3.h4`
    pub ip: String,
    pub port: u16,
}

impl fmt::Display for PassiveAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Parse `... (h1,h2,h3,h4,p1,p2) ...` into an address and `p1 * 256 + p2`.
///
/// Scanning starts after the first `(`. Whitespace before each number is
/// skipped and anything after the sixth number is ignored. Each number
/// must fit in a byte.
pub fn parse_pasv(line: &str) -> Result<PassiveAddr> {
    let malformed = || FtpError::MalformedPasv(line.trim_end().to_string());
    let open = line.find('(').ok_or_else(malformed)?;
    let mut rest = &line[open + 1..];
    let mut fields = [0u8; 6];
    for (i, field) in fields.iter_mut().enumerate() {
        rest = rest.trim_start();
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(malformed());
        }
        *field = rest[..digits].parse().map_err(|_| malformed())?;
        rest = &rest[digits..];
        if i < 5 {
            rest = rest.strip_prefix(',').ok_or_else(malformed)?;
        }
    }
    let [h1, h2, h3, h4, p1, p2] = fields;
    Ok(PassiveAddr {
        ip: format!("{h1}.{h2}.{h3}.{h4}"),
        port: (u16::from(p1) << 8) | u16::from(p2),
    })
}

/// Build `VERB[ arg]\r\n`.
///
/// Lines longer than [`MAX_COMMAND_LEN`] are refused rather than cut,
/// since a truncated argument would name a different remote file.
pub fn format_command(verb: &str, arg: Option<&str>) -> Result<Vec<u8>> {
    let mut line = Vec::with_capacity(verb.len() + arg.map_or(0, |a| a.len() + 1) + 2);
    line.extend_from_slice(verb.as_bytes());
    if let Some(arg) = arg {
        line.push(b' ');
        line.extend_from_slice(arg.as_bytes());
    }
    line.extend_from_slice(b"\r\n");
    if line.len() > MAX_COMMAND_LEN {
        return Err(FtpError::CommandTooLong {
            limit: MAX_COMMAND_LEN,
        });
    }
    Ok(line)
}

/// Text between the first and second double quote, as in a `257` reply.
pub fn extract_quoted(text: &str) -> Option<&str> {
    let start = text.find('"')? + 1;
    let len = text[start..].find('"')?;
    Some(&text[start..start + len])
}
