//! Scripted single-connection FTP server on 127.0.0.1 for end-to-end tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Deterministic file contents: 0, 1, 2, ... wrapping at 256.
pub fn pattern(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

#[derive(Clone)]
pub struct Script {
    pub greeting: String,
    pub user_reply: String,
    pub pass_reply: String,
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    /// Listed by NLST but RETR answers 550.
    pub denied: BTreeSet<String>,
    /// NLST also emits `.` and `..`, like some servers do.
    pub dot_entries: bool,
    pub pasv_reply: Option<String>,
    pub pwd_reply: Option<String>,
    /// NLST answers with a single 226 after the data, no 150 first.
    pub nlst_without_preliminary: bool,
    /// Close the control connection instead of answering this verb.
    pub drop_on: Option<&'static str>,
}

impl Default for Script {
    fn default() -> Self {
        let dirs = ["/", "/pub", "/pub/docs"].iter().map(|s| s.to_string()).collect();
        let mut files = BTreeMap::new();
        files.insert("/report.txt".to_string(), pattern(3500));
        files.insert("/pub/readme.txt".to_string(), b"hello from pub\r\n".to_vec());
        files.insert("/pub/docs/a:b.txt".to_string(), b"colon".to_vec());
        files.insert("/big.bin".to_string(), pattern(300 * 1024));
        let mut denied = BTreeSet::new();
        denied.insert("/locked.dat".to_string());
        Self {
            greeting: "220 Test FTP ready".into(),
            user_reply: "331 Password required".into(),
            pass_reply: "230 Logged in".into(),
            dirs,
            files,
            denied,
            dot_entries: true,
            pasv_reply: None,
            pwd_reply: None,
            nlst_without_preliminary: false,
            drop_on: None,
        }
    }
}

pub struct FakeServer {
    pub addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
    events: Arc<Mutex<Vec<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl FakeServer {
    pub fn start(script: Script) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let commands = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let (c, e) = (commands.clone(), events.clone());
        let handle = thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                let _ = serve(stream, script, c, e);
            }
        });
        Ok(Self {
            addr,
            commands,
            events,
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Command lines received so far, CRLF stripped.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Wait up to five seconds for `event` to be recorded.
    pub fn wait_for_event(&self, event: &str) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if self.events().iter().any(|e| e == event) {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    /// Wait for the server thread to finish (after QUIT or a drop).
    pub fn join(mut self) {
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

fn resolve(cwd: &str, arg: &str) -> String {
    let mut parts: Vec<&str> = if arg.starts_with('/') {
        Vec::new()
    } else {
        cwd.split('/').filter(|s| !s.is_empty()).collect()
    };
    for seg in arg.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((p, _)) => p,
    }
}

fn children(script: &Script, cwd: &str) -> Vec<String> {
    let mut names = BTreeSet::new();
    let all = script
        .dirs
        .iter()
        .chain(script.files.keys())
        .chain(script.denied.iter());
    for path in all {
        if path != "/" && parent_of(path) == cwd {
            if let Some((_, name)) = path.rsplit_once('/') {
                names.insert(name.to_string());
            }
        }
    }
    names.into_iter().collect()
}

fn reply(out: &mut TcpStream, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes())?;
    out.write_all(b"\r\n")
}

fn serve(
    stream: TcpStream,
    script: Script,
    commands: Arc<Mutex<Vec<String>>>,
    events: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let mut out = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let mut cwd = "/".to_string();
    let mut pending: Option<TcpListener> = None;

    reply(&mut out, &script.greeting)?;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            events.lock().unwrap().push("CONTROL-EOF".into());
            return Ok(());
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        commands.lock().unwrap().push(line.clone());
        let (verb, arg) = match line.split_once(' ') {
            Some((v, a)) => (v.to_string(), a.to_string()),
            None => (line.clone(), String::new()),
        };
        if script.drop_on == Some(verb.as_str()) {
            return Ok(());
        }

        match verb.as_str() {
            "USER" => reply(&mut out, &script.user_reply)?,
            "PASS" => reply(&mut out, &script.pass_reply)?,
            "TYPE" => reply(&mut out, &format!("200 Type set to {arg}"))?,
            "PWD" => match &script.pwd_reply {
                Some(r) => reply(&mut out, r)?,
                None => reply(&mut out, &format!("257 \"{cwd}\" is the current directory"))?,
            },
            "CWD" => {
                let target = resolve(&cwd, &arg);
                if script.dirs.contains(&target) {
                    cwd = target;
                    reply(&mut out, "250 Directory changed")?;
                } else {
                    reply(&mut out, "550 Not a directory")?;
                }
            }
            "CDUP" => {
                cwd = parent_of(&cwd).to_string();
                reply(&mut out, "250 Directory changed")?;
            }
            "PASV" => match &script.pasv_reply {
                Some(r) => reply(&mut out, r)?,
                None => {
                    let data = TcpListener::bind("127.0.0.1:0")?;
                    let port = data.local_addr()?.port();
                    pending = Some(data);
                    reply(
                        &mut out,
                        &format!(
                            "227 Entering Passive Mode (127,0,0,1,{},{})",
                            port / 256,
                            port % 256
                        ),
                    )?;
                }
            },
            "NLST" | "LIST" => {
                let Some(listener) = pending.take() else {
                    reply(&mut out, "425 Use PASV first")?;
                    continue;
                };
                let (mut data, _) = listener.accept()?;
                let mut payload = String::new();
                if script.dot_entries && verb == "NLST" {
                    payload.push_str(".\r\n..\r\n");
                }
                for name in children(&script, &cwd) {
                    if verb == "LIST" {
                        payload.push_str(&format!("-rw-r--r-- 1 ftp ftp 0 Jan 01 00:00 {name}\r\n"));
                    } else {
                        payload.push_str(&format!("{name}\r\n"));
                    }
                }
                if script.nlst_without_preliminary {
                    data.write_all(payload.as_bytes())?;
                    drop(data);
                    reply(&mut out, "226 Transfer complete")?;
                } else {
                    reply(&mut out, "150 Opening ASCII mode data connection")?;
                    data.write_all(payload.as_bytes())?;
                    drop(data);
                    reply(&mut out, "226 Transfer complete")?;
                }
            }
            "RETR" => {
                let Some(listener) = pending.take() else {
                    reply(&mut out, "425 Use PASV first")?;
                    continue;
                };
                let (mut data, _) = listener.accept()?;
                match script.files.get(&resolve(&cwd, &arg)) {
                    Some(content) => {
                        reply(&mut out, "150 Opening BINARY mode data connection")?;
                        // The client may hang up early when it aborts
                        let _ = data.write_all(content);
                        drop(data);
                        reply(&mut out, "226 Transfer complete")?;
                    }
                    None => {
                        reply(&mut out, "550 No such file")?;
                        data.set_read_timeout(Some(Duration::from_secs(5)))?;
                        let mut sink = [0u8; 64];
                        if let Ok(0) = data.read(&mut sink) {
                            events.lock().unwrap().push("DATA-EOF".into());
                        }
                    }
                }
            }
            "QUIT" => {
                reply(&mut out, "221 Goodbye")?;
                return Ok(());
            }
            _ => reply(&mut out, "502 Command not implemented")?,
        }
    }
}
