// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Where report data comes from: a live daemon or generated files.

use crate::decode::{self, Decoded};
use crate::error::SourceError;
use crate::ia::IsdAs;
use crate::model::{AnnouncedPath, AsTopology, PathSegment, SegmentKind};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Query surface shared by the daemon client and the file reader.
pub trait PathSource {
    fn topology(&self) -> Result<Decoded<AsTopology>, SourceError>;

    fn paths(&self, dst: IsdAs, max_paths: usize) -> Result<Decoded<Vec<AnnouncedPath>>, SourceError>;

    fn segments(&self, kind: SegmentKind) -> Result<Decoded<Vec<PathSegment>>, SourceError>;
}

/// Reads `topology.json` from an AS endhost directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    conf_dir: PathBuf,
}

impl FileSource {
    pub fn new(conf_dir: impl Into<PathBuf>) -> Self {
        Self {
            conf_dir: conf_dir.into(),
        }
    }

    /// Endhost directory of `ia` under a generated-topology root.
    pub fn for_ia(gen_dir: &Path, ia: IsdAs) -> Self {
        Self::new(ia.conf_dir(gen_dir))
    }

    pub fn conf_dir(&self) -> &Path {
        &self.conf_dir
    }

    pub fn topology_path(&self) -> PathBuf {
        self.conf_dir.join("topology.json")
    }
}

impl PathSource for FileSource {
    fn topology(&self) -> Result<Decoded<AsTopology>, SourceError> {
        let path = self.topology_path();
        debug!("Reading topology file {:?}", path);
        let text = fs::read_to_string(&path).map_err(|e| SourceError::file(&path, e))?;
        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            SourceError::file(
                &path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        Ok(decode::decode_topology_file(&value)?)
    }

    fn paths(&self, _dst: IsdAs, _max_paths: usize) -> Result<Decoded<Vec<AnnouncedPath>>, SourceError> {
        Err(SourceError::Unsupported("Paths"))
    }

    fn segments(&self, _kind: SegmentKind) -> Result<Decoded<Vec<PathSegment>>, SourceError> {
        Err(SourceError::Unsupported("Segments"))
    }
}

/// Which trust files to dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustKind {
    Trc,
    Certificate,
}

impl TrustKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Trc => "trc",
            Self::Certificate => "crt",
        }
    }
}

/// One trust file, read verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustFile {
    pub name: String,
    pub contents: String,
}

/// Read every `*.trc` or `*.crt` file under `<conf_dir>/certs`, sorted by
/// file name. Nothing is parsed or modified.
pub fn read_trust_files(conf_dir: &Path, kind: TrustKind) -> Result<Vec<TrustFile>, SourceError> {
    let dir = conf_dir.join("certs");
    let entries = fs::read_dir(&dir).map_err(|e| SourceError::file(&dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SourceError::file(&dir, e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(kind.extension()) {
            continue;
        }
        let contents = fs::read_to_string(&path).map_err(|e| SourceError::file(&path, e))?;
        files.push(TrustFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            contents,
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_files_are_filtered_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let certs = dir.path().join("certs");
        fs::create_dir(&certs).unwrap();
        fs::write(certs.join("ISD1-V1.trc"), "{\"isd\": 1}").unwrap();
        fs::write(certs.join("ISD1-AS18-V0.crt"), "chain").unwrap();
        fs::write(certs.join("ISD1-V0.trc"), "{\"isd\": 1, \"v\": 0}").unwrap();

        let trcs = read_trust_files(dir.path(), TrustKind::Trc).unwrap();
        let names: Vec<&str> = trcs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ISD1-V0.trc", "ISD1-V1.trc"]);
        assert_eq!(trcs[1].contents, "{\"isd\": 1}");

        let crts = read_trust_files(dir.path(), TrustKind::Certificate).unwrap();
        assert_eq!(crts.len(), 1);
        assert_eq!(crts[0].contents, "chain");
    }

    #[test]
    fn missing_files_are_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_trust_files(dir.path(), TrustKind::Trc),
            Err(SourceError::File { .. })
        ));

        let source = FileSource::new(dir.path());
        match source.topology() {
            Err(SourceError::File { path, .. }) => assert_eq!(path, dir.path().join("topology.json")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert!(matches!(
            source.segments(SegmentKind::Core),
            Err(SourceError::Unsupported(_))
        ));
    }
}
