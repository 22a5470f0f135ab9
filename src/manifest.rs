//! # Externals Manifest
//!
//! Reads and rewrites `Externals.cfg`-style manifests: one INI section per
//! external dependency, plus an `externals_description` metadata section.
//!
//! ```text
//! [externals_description]
//! schema_version = 1.0.0
//!
//! [cam]
//! local_path = components/cam
//! protocol = git
//! repo_url = https://github.com/EarthWorksOrg/CAM.git
//! tag = cam6_3_109.004
//! required = True
//! ```
//!
//! Parsing and rendering go through `rust-ini` with quoting and escaping
//! disabled, so values survive a load/save cycle byte for byte. Only the pin
//! (`tag`) of a section is ever changed by this crate.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use ini::{EscapePolicy, Ini, ParseOption, WriteOption};
use serde::Serialize;

use crate::error::{Error, Result};

/// Section holding manifest metadata rather than a dependency.
pub const DESCRIPTION_SECTION: &str = "externals_description";

/// One dependency as declared in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalEntry {
    pub name: String,
    pub local_path: String,
    pub repo_url: Option<String>,
    pub tag: Option<String>,
    pub branch: Option<String>,
}

/// A loaded manifest file.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    ini: Ini,
}

impl Manifest {
    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Manifest {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Parse manifest text; `path` is where [`Manifest::save`] will write.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(content, opt).map_err(|e| Error::Manifest {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            ini,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dependency entries in file order.
    ///
    /// With an allow-list only the named dependencies are returned. A section
    /// without `local_path` is a malformed manifest.
    pub fn externals(&self, allow: Option<&[String]>) -> Result<Vec<ExternalEntry>> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for name in self.ini.sections().flatten() {
            if name == DESCRIPTION_SECTION || !seen.insert(name.to_string()) {
                continue;
            }
            if let Some(allow) = allow {
                if !allow.iter().any(|a| a == name) {
                    continue;
                }
            }
            entries.push(self.entry(name)?);
        }

        Ok(entries)
    }

    /// Look up a single dependency.
    pub fn get(&self, name: &str) -> Result<Option<ExternalEntry>> {
        if name == DESCRIPTION_SECTION || self.ini.section(Some(name)).is_none() {
            return Ok(None);
        }
        self.entry(name).map(Some)
    }

    fn entry(&self, name: &str) -> Result<ExternalEntry> {
        let props = self.ini.section(Some(name)).ok_or_else(|| Error::Manifest {
            path: self.path.display().to_string(),
            message: format!("no section [{}]", name),
        })?;
        let field = |key: &str| props.get(key).map(|v| v.trim().to_string());

        let local_path = field("local_path").ok_or_else(|| Error::Manifest {
            path: self.path.display().to_string(),
            message: format!("section [{}] has no local_path", name),
        })?;

        Ok(ExternalEntry {
            name: name.to_string(),
            local_path,
            repo_url: field("repo_url"),
            tag: field("tag"),
            branch: field("branch"),
        })
    }

    /// Replace the pin of `name`.
    pub fn set_tag(&mut self, name: &str, tag: &str) -> Result<()> {
        let path = self.path.display().to_string();
        let props = self
            .ini
            .section_mut(Some(name))
            .ok_or_else(|| Error::Manifest {
                path,
                message: format!("cannot pin unknown external [{}]", name),
            })?;
        props.insert("tag", tag);
        Ok(())
    }

    /// Render the manifest as text.
    ///
    /// Leading and trailing blank lines are dropped and the text ends with
    /// exactly one newline, so rewriting an unchanged manifest produces no
    /// diff noise.
    pub fn render(&self) -> Result<String> {
        let opt = WriteOption {
            escape_policy: EscapePolicy::Nothing,
            kv_separator: " = ",
            ..WriteOption::default()
        };
        let mut buf = Vec::new();
        self.ini.write_to_opt(&mut buf, opt)?;

        let text = String::from_utf8_lossy(&buf).replace("\r\n", "\n");
        let mut text = text.trim_start_matches('\n').trim_end().to_string();
        text.push('\n');
        Ok(text)
    }

    /// Write the manifest back to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.render()?)?;
        Ok(())
    }
}

/// Short `<org>/<repo>` name for a repository URL.
///
/// `https://github.com/ESCOMP/CAM.git` gives `ESCOMP/CAM`. Scp-style URLs
/// (`git@github.com:ESCOMP/CAM.git`) are handled too; anything else is
/// returned with a trailing `.git` removed.
pub fn repo_short_name(repo_url: &str) -> String {
    let repo_url = repo_url.trim();
    let path = match url::Url::parse(repo_url) {
        Ok(parsed) if parsed.has_host() || parsed.scheme() == "file" => parsed.path().to_string(),
        _ => match repo_url.split_once(':') {
            Some((host, path)) if host.contains('@') => path.to_string(),
            _ => repo_url.to_string(),
        },
    };
    let path = path.trim_matches('/');
    path.strip_suffix(".git").unwrap_or(path).to_string()
}
