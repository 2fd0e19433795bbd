//! Remote directory browser: current path, listing and selection cursor on
//! top of an authenticated [`Session`]. Every navigation ends in a full
//! refresh; the listing is never patched in place.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FtpError, Result};
use crate::journal::DownloadJournal;
use crate::listing::{build_listing, DirectoryListing};
use crate::session::Session;
use crate::transfer::TransferObserver;

/// What activating an entry ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Changed into a directory; carries the new working directory.
    Entered(String),
    Downloaded {
        remote: String,
        local: PathBuf,
        bytes: u64,
    },
    /// Empty listing, nothing selected.
    Nothing,
}

pub struct Browser {
    session: Session,
    listing: DirectoryListing,
    download_dir: PathBuf,
    journal: Option<DownloadJournal>,
}

impl Browser {
    /// Wrap an authenticated session. Call [`Browser::refresh`] to load the
    /// first listing.
    pub fn new(session: Session, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            listing: DirectoryListing::default(),
            download_dir: download_dir.into(),
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: DownloadJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn listing(&self) -> &DirectoryListing {
        &self.listing
    }

    pub fn current_path(&self) -> &str {
        &self.listing.path
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Re-anchor with PWD and rebuild the listing from a fresh NLST.
    ///
    /// The PWD result is kept even when the NLST fails, leaving an empty
    /// listing (plus `..` outside the root) for the new directory.
    pub fn refresh(&mut self, observer: &mut dyn TransferObserver) -> Result<()> {
        let path = self.session.pwd()?;
        self.listing = build_listing(b"", &path);
        let raw = self.session.nlst(observer)?;
        self.listing = build_listing(&raw, &path);
        Ok(())
    }

    pub fn select_previous(&mut self) {
        self.listing.select_previous();
    }

    pub fn select_next(&mut self) {
        self.listing.select_next();
    }

    /// `..` goes up. Anything else is tried as a directory first; if the
    /// server refuses CWD the entry is downloaded as a file instead.
    pub fn activate(&mut self, observer: &mut dyn TransferObserver) -> Result<Activation> {
        let entry = match self.listing.selected_entry() {
            Some(entry) => entry.clone(),
            None => return Ok(Activation::Nothing),
        };
        if entry.is_parent() {
            self.session.cdup()?;
            self.refresh(observer)?;
            return Ok(Activation::Entered(self.listing.path.clone()));
        }
        match self.session.cwd(&entry.name) {
            Ok(()) => {
                self.refresh(observer)?;
                Ok(Activation::Entered(self.listing.path.clone()))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(_) => self.download(&entry.name, observer),
        }
    }

    /// Same as activating `..`; a no-op at the root.
    pub fn go_up(&mut self, observer: &mut dyn TransferObserver) -> Result<Option<String>> {
        if self.listing.is_root() {
            return Ok(None);
        }
        self.session.cdup()?;
        self.refresh(observer)?;
        Ok(Some(self.listing.path.clone()))
    }

    /// Fetch `name` from the current directory into the download root.
    /// Same-named local files are overwritten.
    pub fn download(
        &mut self,
        name: &str,
        observer: &mut dyn TransferObserver,
    ) -> Result<Activation> {
        fs::create_dir_all(&self.download_dir).map_err(|source| FtpError::Local {
            path: self.download_dir.clone(),
            source,
        })?;
        let local = self.download_dir.join(sanitize_local_name(name));
        let outcome = self.session.download(name, &local, observer);
        if let Some(journal) = &self.journal {
            // journal trouble never fails the download itself
            if let Err(e) = journal.record(name, &local, &outcome) {
                self.session
                    .logger()
                    .error("journal", &format!("could not record {name}: {e:#}"));
            }
        }
        let bytes = outcome?;
        Ok(Activation::Downloaded {
            remote: name.to_string(),
            local,
            bytes,
        })
    }

    pub fn quit(mut self) -> Session {
        self.session.quit();
        self.session
    }
}

/// Local file name for a remote entry: path separators, drive colons and
/// control characters become `_`, and names that would resolve to a
/// directory are replaced outright.
pub fn sanitize_local_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
