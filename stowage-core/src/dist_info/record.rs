//! The RECORD file: one CSV row per installed path.
//!
//! Row format is `path,sha256=<hex>,<size>`. Paths are relative to the
//! prefix root with `/` separators. A path containing a comma or double
//! quote is double-quoted, with embedded quotes doubled. Hash and size are
//! empty for directories.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Could not read RECORD file")]
    Io(#[from] io::Error),

    #[error("Malformed RECORD row at line {line}")]
    Malformed { line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub path: String,
    pub hash: Option<String>,
    pub size: Option<u64>,
}

impl RecordEntry {
    pub fn directory<S: Into<String>>(path: S) -> RecordEntry {
        RecordEntry {
            path: path.into(),
            hash: None,
            size: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub entries: Vec<RecordEntry>,
}

impl Record {
    pub fn parse(input: &str) -> Result<Record, RecordError> {
        let mut entries = vec![];

        for (idx, line) in input.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            entries.push(parse_row(line).ok_or(RecordError::Malformed { line: idx + 1 })?);
        }

        Ok(Record { entries })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Record, RecordError> {
        let mut input = String::new();
        BufReader::new(File::open(path)?).read_to_string(&mut input)?;
        Record::parse(&input)
    }

    /// Writes atomically via a temporary file in the same directory.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RecordError> {
        let path = path.as_ref();
        let dir = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "RECORD path has no parent"))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(self.to_string().as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            write_field(f, &entry.path)?;
            write!(f, ",")?;
            if let Some(hash) = &entry.hash {
                write!(f, "{}", hash)?;
            }
            write!(f, ",")?;
            if let Some(size) = entry.size {
                write!(f, "{}", size)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn write_field(f: &mut std::fmt::Formatter<'_>, value: &str) -> std::fmt::Result {
    if value.contains(',') || value.contains('"') {
        write!(f, "\"{}\"", value.replace('"', "\"\""))
    } else {
        write!(f, "{}", value)
    }
}

fn parse_row(line: &str) -> Option<RecordEntry> {
    let (path, rest) = parse_path_field(line)?;

    let mut cols = rest.splitn(2, ',');
    let hash = cols.next()?;
    let size = cols.next()?;

    let hash = if hash.is_empty() {
        None
    } else {
        Some(hash.to_string())
    };
    let size = if size.is_empty() {
        None
    } else {
        Some(size.parse().ok()?)
    };

    Some(RecordEntry { path, hash, size })
}

/// Returns the path column and everything after its trailing comma.
fn parse_path_field(line: &str) -> Option<(String, &str)> {
    if !line.starts_with('"') {
        let idx = line.find(',')?;
        return Some((line[..idx].to_string(), &line[idx + 1..]));
    }

    let mut out = String::new();
    let mut chars = line[1..].char_indices();

    while let Some((idx, c)) = chars.next() {
        if c != '"' {
            out.push(c);
            continue;
        }
        match chars.next() {
            // Doubled quote is an escaped quote.
            Some((_, '"')) => out.push('"'),
            // Closing quote must be followed by the column separator.
            Some((_, ',')) => {
                let rest = &line[1 + idx + 2..];
                return Some((out, rest));
            }
            _ => return None,
        }
    }

    None
}

/// Hashes a file's contents in the RECORD hash column format.
pub fn file_digest<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();

    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        hasher.update(buf);
        let len = buf.len();
        reader.consume(len);
    }

    let digest = hasher.finalize();
    let mut out = String::with_capacity(7 + digest.len() * 2);
    out.push_str("sha256=");
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_rows() {
        let record = Record::parse(
            "bin/tool,sha256=abc123,512\nshare/doc/README,,\nlib/,,\n",
        )
        .unwrap();

        assert_eq!(record.entries.len(), 3);
        assert_eq!(record.entries[0].path, "bin/tool");
        assert_eq!(record.entries[0].hash.as_deref(), Some("sha256=abc123"));
        assert_eq!(record.entries[0].size, Some(512));
        assert_eq!(record.entries[1].hash, None);
        assert_eq!(record.entries[2], RecordEntry::directory("lib/"));
    }

    #[test]
    fn quoted_path_round_trips() {
        let record = Record {
            entries: vec![RecordEntry {
                path: r#"share/odd,"name".txt"#.to_string(),
                hash: Some("sha256=ff".to_string()),
                size: Some(1),
            }],
        };

        let text = record.to_string();
        assert!(text.starts_with('"'));
        let parsed = Record::parse(&text).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn malformed_row_is_an_error() {
        let err = Record::parse("no-columns-here\n").unwrap_err();
        assert!(matches!(err, RecordError::Malformed { line: 1 }));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RECORD");

        let record = Record {
            entries: vec![
                RecordEntry {
                    path: "bin/x".into(),
                    hash: Some("sha256=00".into()),
                    size: Some(3),
                },
                RecordEntry::directory("bin"),
            ],
        };
        record.save(&path).unwrap();
        assert_eq!(Record::load(&path).unwrap(), record);
    }

    #[test]
    fn digest_has_expected_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"hello").unwrap();

        let digest = file_digest(&path).unwrap();
        assert!(digest.starts_with("sha256="));
        assert_eq!(digest.len(), 7 + 64);
    }
}
