use crate::error::GlueError;
use std::fmt;

/// Where a ROM image lives, plus the name it gets inside the module filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomRef {
    url: String,
    filename: String,
}

impl RomRef {
    /// The filename is the last path segment, ignoring any query or fragment.
    pub fn parse(reference: &str) -> Result<RomRef, GlueError> {
        let url = reference.trim();
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let filename = path.rsplit('/').next().unwrap_or_default();

        if filename.is_empty() {
            return Err(GlueError::InvalidResource(reference.to_owned()));
        }

        Ok(RomRef {
            url: url.to_owned(),
            filename: filename.to_owned(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl fmt::Display for RomRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Absolute path of `filename` inside `dir`
pub fn mount_path(dir: &str, filename: &str) -> String {
    let dir = dir.trim_end_matches('/');
    format!("{dir}/{filename}")
}
