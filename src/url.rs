//! URL parsing for ftp:// targets

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub port: u16,
    /// Always absolute. `/` when the URL has no path.
    pub path: String,
    /// From `ftp://user@host`, if given.
    pub user: Option<String>,
}

impl RemoteTarget {
    /// Split the path into its directory and final component. The file
    /// part is `None` when the path ends in `/`.
    pub fn split_file(&self) -> (&str, Option<&str>) {
        match self.path.rsplit_once('/') {
            Some((_, "")) | None => (self.path.as_str(), None),
            Some(("", file)) => ("/", Some(file)),
            Some((dir, file)) => (dir, Some(file)),
        }
    }
}

pub fn parse_remote_url(input: &str, default_port: u16) -> Option<RemoteTarget> {
    let s_trim = input.trim();
    let lower = s_trim.to_ascii_lowercase();
    let scheme_end = lower.find(':')?;
    if &lower[..=scheme_end] != "ftp:" {
        return None;
    }
    let mut rest = &s_trim[scheme_end + 1..];
    if let Some(r) = rest.strip_prefix("//") {
        rest = r;
    }
    let (authority, p) = rest.split_once('/').unwrap_or((rest, ""));
    let (user, hp) = match authority.rsplit_once('@') {
        Some((u, hp)) if !u.is_empty() => (Some(u.to_string()), hp),
        Some((_, hp)) => (None, hp),
        None => (None, authority),
    };
    if hp.is_empty() {
        return None;
    }
    let (host, port) = match hp.rsplit_once(':') {
        Some((h, pr)) => (h.to_string(), pr.parse().ok().filter(|p| *p > 0)?),
        None => (hp.to_string(), default_port),
    };
    if host.is_empty() {
        return None;
    }
    Some(RemoteTarget {
        host,
        port,
        path: format!("/{}", p),
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_only() {
        let t = parse_remote_url("ftp://192.168.1.50", 5000).unwrap();
        assert_eq!(t.host, "192.168.1.50");
        assert_eq!(t.port, 5000);
        assert_eq!(t.path, "/");
        assert_eq!(t.user, None);
    }

    #[test]
    fn full_form() {
        let t = parse_remote_url("FTP://bob@files.local:2121/pub/readme.txt", 5000).unwrap();
        assert_eq!(t.host, "files.local");
        assert_eq!(t.port, 2121);
        assert_eq!(t.user.as_deref(), Some("bob"));
        assert_eq!(t.split_file(), ("/pub", Some("readme.txt")));
    }

    #[test]
    fn split_file_edges() {
        let t = parse_remote_url("ftp://h/top.bin", 21).unwrap();
        assert_eq!(t.split_file(), ("/", Some("top.bin")));
        let t = parse_remote_url("ftp://h/pub/", 21).unwrap();
        assert_eq!(t.split_file(), ("/pub/", None));
        let t = parse_remote_url("ftp://h", 21).unwrap();
        assert_eq!(t.split_file(), ("/", None));
    }

    #[test]
    fn rejects_other_schemes_and_bad_ports() {
        assert!(parse_remote_url("http://h/x", 21).is_none());
        assert!(parse_remote_url("ftp://", 21).is_none());
        assert!(parse_remote_url("ftp://h:0/", 21).is_none());
        assert!(parse_remote_url("ftp://h:port/", 21).is_none());
        assert!(parse_remote_url("/just/a/path", 21).is_none());
    }
}
