//! FTP control-connection state machine.
//!
//! Every command is one request and one reply line. Transfers follow a
//! fixed order: TYPE, PASV, open the data connection, send the transfer
//! command, check its first reply, drain the data connection, close it,
//! then read the final reply. The data connection is opened before the
//! transfer command is sent and is closed on every path once opened.

use std::io::{BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tempfile::NamedTempFile;

use crate::codec::{self, extract_quoted, parse_pasv, read_reply_line, PassiveAddr, Reply};
use crate::error::{FtpError, Result};
use crate::logger::Logger;
use crate::protocol::{reply, verb, MAX_REPLY_LINE};
use crate::transfer::{self, TransferObserver};
use crate::transport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    AuthFailed,
    Authenticated,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferType {
    /// `TYPE A`, used for listings
    Ascii,
    /// `TYPE I`, used for downloads
    Binary,
}

impl TransferType {
    fn code(self) -> &'static str {
        match self {
            TransferType::Ascii => "A",
            TransferType::Binary => "I",
        }
    }
}

pub struct Session {
    control: Option<BufReader<TcpStream>>,
    state: SessionState,
    greeting: Option<Reply>,
    peer: String,
    logger: Arc<dyn Logger>,
}

impl Session {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            control: None,
            state: SessionState::Disconnected,
            greeting: None,
            peer: String::new(),
            logger,
        }
    }

    /// Connect and read the greeting. The greeting is kept but not judged.
    pub fn open(host: &str, port: u16, logger: Arc<dyn Logger>) -> Result<Self> {
        let mut session = Self::new(logger);
        session.connect(host, port)?;
        Ok(session)
    }

    pub fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        if self.control.is_some() {
            return Err(FtpError::InvalidState {
                expected: SessionState::Disconnected,
                actual: self.state,
            });
        }
        let stream = transport::connect(host, port)?;
        self.peer = format!("{host}:{port}");
        self.control = Some(BufReader::new(stream));
        self.state = SessionState::Connected;
        self.logger.connected(&self.peer);
        let greeting = self.read_reply()?;
        self.greeting = Some(greeting);
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn greeting(&self) -> Option<&Reply> {
        self.greeting.as_ref()
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// `USER`, then `PASS` only if the server answers 331. `None` sends a
    /// bare `PASS` (empty password). Anything but a final 230 leaves the
    /// session in [`SessionState::AuthFailed`].
    pub fn login(&mut self, user: &str, password: Option<&str>) -> Result<()> {
        self.require(SessionState::Connected)?;
        let mut command = verb::USER;
        let mut answer = self.command(verb::USER, Some(user))?;
        if answer.code == Some(reply::NEED_PASSWORD) {
            command = verb::PASS;
            answer = self.command(verb::PASS, password)?;
        }
        if answer.code == Some(reply::LOGGED_IN) {
            self.state = SessionState::Authenticated;
            return Ok(());
        }
        self.state = SessionState::AuthFailed;
        Err(match answer.code {
            Some(code) => FtpError::Rejected {
                command: command.to_string(),
                code,
                text: answer.text,
            },
            None => FtpError::UnparseableReply(answer.text),
        })
    }

    /// Send one command and read one reply line, without judging it.
    pub fn command(&mut self, cmd: &str, arg: Option<&str>) -> Result<Reply> {
        self.send(cmd, arg)?;
        self.read_reply()
    }

    pub fn set_type(&mut self, ty: TransferType) -> Result<()> {
        self.require(SessionState::Authenticated)?;
        self.command(verb::TYPE, Some(ty.code()))?
            .expect_positive(verb::TYPE)?;
        Ok(())
    }

    /// Current remote directory, taken from the quoted part of the reply.
    pub fn pwd(&mut self) -> Result<String> {
        self.require(SessionState::Authenticated)?;
        let answer = self.command(verb::PWD, None)?.expect_positive(verb::PWD)?;
        match extract_quoted(&answer.text) {
            Some(path) => Ok(path.to_string()),
            None => Err(FtpError::MalformedPwd(answer.text)),
        }
    }

    pub fn cwd(&mut self, dir: &str) -> Result<()> {
        self.require(SessionState::Authenticated)?;
        self.command(verb::CWD, Some(dir))?.expect_positive(verb::CWD)?;
        Ok(())
    }

    pub fn cdup(&mut self) -> Result<()> {
        self.require(SessionState::Authenticated)?;
        self.command(verb::CDUP, None)?.expect_positive(verb::CDUP)?;
        Ok(())
    }

    pub fn pasv(&mut self) -> Result<PassiveAddr> {
        self.require(SessionState::Authenticated)?;
        let answer = self.command(verb::PASV, None)?.expect_positive(verb::PASV)?;
        parse_pasv(&answer.text)
    }

    /// Bare names of the current directory, exactly as the server sent them.
    pub fn nlst(&mut self, observer: &mut dyn TransferObserver) -> Result<Vec<u8>> {
        self.run_transfer(TransferType::Ascii, verb::NLST, None, observer, |data, obs| {
            let payload = transfer::drain_buffered(data, obs)?;
            let n = payload.len() as u64;
            Ok((payload, n))
        })
    }

    /// Long listing of the current directory, in the server's own format.
    pub fn list(&mut self, observer: &mut dyn TransferObserver) -> Result<Vec<u8>> {
        self.run_transfer(TransferType::Ascii, verb::LIST, None, observer, |data, obs| {
            let payload = transfer::drain_buffered(data, obs)?;
            let n = payload.len() as u64;
            Ok((payload, n))
        })
    }

    /// Stream `name` into `sink`, returning the byte count.
    pub fn retr(
        &mut self,
        name: &str,
        sink: &mut dyn Write,
        observer: &mut dyn TransferObserver,
    ) -> Result<u64> {
        self.run_transfer(TransferType::Binary, verb::RETR, Some(name), observer, |data, obs| {
            let n = transfer::stream_to_sink(data, sink, obs)?;
            Ok((n, n))
        })
    }

    /// Download `name` to `local`. Data goes to a temporary file next to
    /// `local`, created before any command is sent, and only replaces
    /// `local` once the transfer has completed.
    pub fn download(
        &mut self,
        name: &str,
        local: &Path,
        observer: &mut dyn TransferObserver,
    ) -> Result<u64> {
        self.require(SessionState::Authenticated)?;
        let local_error = |source| FtpError::Local {
            path: local.to_path_buf(),
            source,
        };
        let dir = match local.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(local_error)?;
        let result = {
            let mut sink = BufWriter::new(tmp.as_file_mut());
            self.retr(name, &mut sink, observer)
        };
        let result = result.and_then(|bytes| {
            tmp.persist(local).map_err(|e| local_error(e.error))?;
            Ok(bytes)
        });
        match result {
            Ok(bytes) => {
                self.logger.download(name, local, bytes);
                Ok(bytes)
            }
            Err(e) => {
                self.logger.error(verb::RETR, &e.to_string());
                Err(match e {
                    FtpError::Sink(source) => local_error(source),
                    other => other,
                })
            }
        }
    }

    /// Send QUIT, read whatever comes back, and close the control
    /// connection regardless.
    pub fn quit(&mut self) -> Option<Reply> {
        if self.control.is_none() {
            self.state = SessionState::Closed;
            return None;
        }
        let answer = self.command(verb::QUIT, None).ok();
        if self.control.take().is_some() {
            self.logger.closed();
        }
        self.state = SessionState::Closed;
        answer
    }

    fn require(&self, expected: SessionState) -> Result<()> {
        if self.control.is_none() {
            return Err(FtpError::NotConnected);
        }
        if self.state != expected {
            return Err(FtpError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn run_transfer<T, F>(
        &mut self,
        ty: TransferType,
        cmd: &str,
        arg: Option<&str>,
        observer: &mut dyn TransferObserver,
        consume: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut TcpStream, &mut dyn TransferObserver) -> Result<(T, u64)>,
    {
        self.require(SessionState::Authenticated)?;
        let started = Instant::now();
        let mut data = self.open_data_channel(ty)?;

        let first = self.command(cmd, arg)?;
        let code = match first.code {
            Some(code) => code,
            None => return Err(FtpError::UnparseableReply(first.text)),
        };
        if code >= reply::FIRST_NEGATIVE {
            drop(data);
            self.logger.error(cmd, &first.text);
            return Err(FtpError::Rejected {
                command: cmd.to_string(),
                code,
                text: first.text,
            });
        }

        let outcome = consume(&mut data, observer);
        drop(data);

        // A 2xx first reply already is the final one
        let last = if first.is_preliminary() {
            Some(self.read_reply()?)
        } else {
            None
        };
        let (value, bytes) = outcome?;
        if let Some(last) = last {
            last.expect_positive(cmd)?;
        }
        self.logger
            .transfer_done(cmd, bytes, started.elapsed().as_secs_f64());
        Ok(value)
    }

    fn open_data_channel(&mut self, ty: TransferType) -> Result<TcpStream> {
        self.set_type(ty)?;
        let addr = self.pasv()?;
        transport::connect(&addr.ip, addr.port).map_err(|e| match e {
            FtpError::Connect { source, .. } => FtpError::DataChannel(source),
            other => other,
        })
    }

    fn send(&mut self, cmd: &str, arg: Option<&str>) -> Result<()> {
        let line = codec::format_command(cmd, arg)?;
        let control = self.control.as_mut().ok_or(FtpError::NotConnected)?;
        let written = control.get_mut().write_all(&line);
        match (cmd, arg) {
            (verb::PASS, Some(_)) => self.logger.command("PASS ****"),
            (_, Some(arg)) => self.logger.command(&format!("{cmd} {arg}")),
            (_, None) => self.logger.command(cmd),
        }
        written.map_err(|e| self.fail(FtpError::ControlLost(e)))
    }

    fn read_reply(&mut self) -> Result<Reply> {
        let control = self.control.as_mut().ok_or(FtpError::NotConnected)?;
        let mut buf = Vec::with_capacity(MAX_REPLY_LINE);
        match read_reply_line(control, &mut buf, MAX_REPLY_LINE) {
            Ok(0) => Err(self.fail(FtpError::ControlClosed)),
            Ok(_) => {
                let reply = Reply::parse(&buf);
                self.logger.reply(&reply.text);
                Ok(reply)
            }
            Err(e) => Err(self.fail(FtpError::ControlLost(e))),
        }
    }

    /// Control-channel failure: drop the connection without QUIT.
    fn fail(&mut self, err: FtpError) -> FtpError {
        self.logger.error("control", &err.to_string());
        if self.control.take().is_some() {
            self.logger.closed();
        }
        self.state = SessionState::Closed;
        err
    }
}
