//! On-disk store snapshots.
//!
//! A snapshot is a file of consecutive MessagePack encoded articles (see https://msgpack.org/).
//! It lets a cleaned dataset be reloaded without parsing CSV again. The format is not versioned.

use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;

use log;

use crate::record::Article;

/// Snapshot error.
#[derive(Debug)]
pub enum SnapshotError {
    /// Common I/O error.
    IO(io::Error),
    /// Record serialization error.
    SerializationError(rmp_serde::encode::Error),
    /// Record deserialization error.
    DeserializationError(rmp_serde::decode::Error),
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(match &self {
            SnapshotError::IO(err) => err,
            SnapshotError::SerializationError(err) => err,
            SnapshotError::DeserializationError(err) => err,
        })
    }
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self {
            SnapshotError::IO(err) => write!(f, "I/O operation failed: {}", err),
            SnapshotError::SerializationError(err) => write!(f, "record serialization error: {}", err),
            SnapshotError::DeserializationError(err) => write!(f, "record deserialization error: {}", err),
        }
    }
}

/// Writes articles to a snapshot file, replacing it if it exists. Returns the number of written articles.
pub fn write_snapshot<'a, P, I>(path: P, articles: I) -> Result<usize, SnapshotError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a Article>,
{
    let file = fs::File::create(path.as_ref()).map_err(SnapshotError::IO)?;
    let mut writer = io::BufWriter::new(file);

    let mut written = 0;
    for article in articles {
        rmp_serde::encode::write(&mut writer, article).map_err(SnapshotError::SerializationError)?;
        written += 1;
    }
    writer.flush().map_err(SnapshotError::IO)?;

    log::info!("snapshot {} written ({} records)", path.as_ref().display(), written);

    return Ok(written);
}

/// Snapshot reader. Yields the stored articles in the order they were written.
pub struct SnapshotReader {
    reader: io::Take<io::BufReader<fs::File>>,
    failed: bool,
}

impl SnapshotReader {
    /// Opens a snapshot file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let file = fs::File::open(path.as_ref()).map_err(SnapshotError::IO)?;
        let file_len = file.metadata().map_err(SnapshotError::IO)?.len();

        log::debug!("snapshot {} opened ({} bytes)", path.as_ref().display(), file_len);

        return Ok(SnapshotReader {
            reader: io::BufReader::new(file).take(file_len),
            failed: false,
        });
    }
}

impl Iterator for SnapshotReader {
    type Item = Result<Article, SnapshotError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.limit() == 0 {
            None
        } else {
            match rmp_serde::decode::from_read(&mut self.reader) {
                Ok(article) => Some(Ok(article)),
                Err(err) => {
                    // the stream position is unknown after a decoding failure
                    self.failed = true;
                    Some(Err(SnapshotError::DeserializationError(err)))
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io::Write;

    use rstest::*;

    use super::{write_snapshot, SnapshotError, SnapshotReader};
    use crate::record::{Article, Label};
    use crate::sort::test::random_articles;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[rstest]
    fn test_snapshot_restores_store(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("store.snapshot");
        let saved = random_articles(250, 3);

        let written = write_snapshot(&path, &saved).unwrap();
        let restored: Result<Vec<Article>, SnapshotError> = SnapshotReader::open(&path).unwrap().collect();

        assert_eq!(written, 250);
        assert_eq!(restored.unwrap(), saved);
    }

    #[rstest]
    fn test_snapshot_keeps_derived_fields(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("store.snapshot");
        let saved = vec![
            Article::new("Title, with comma", "", "politics", "05-12-2020", Label::Fake),
            Article::new("No date", "body", "News", "NA", Label::True),
        ];

        write_snapshot(&path, &saved).unwrap();
        let restored: Vec<Article> = SnapshotReader::open(&path).unwrap().map(|r| r.unwrap()).collect();

        assert_eq!(restored[0].year(), 2020);
        assert_eq!(restored[0].month(), 12);
        assert_eq!(restored[0].text(), "NA");
        assert_eq!(restored[1].parsed_date(), None);
    }

    #[rstest]
    fn test_empty_snapshot(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("empty.snapshot");

        assert_eq!(write_snapshot(&path, &Vec::new()).unwrap(), 0);
        assert_eq!(SnapshotReader::open(&path).unwrap().count(), 0);
    }

    #[rstest]
    fn test_corrupted_snapshot(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("corrupted.snapshot");
        fs::File::create(&path).unwrap().write_all(&[0xc1, 0xc1, 0xc1]).unwrap();

        let mut reader = SnapshotReader::open(&path).unwrap();

        assert!(matches!(reader.next(), Some(Err(SnapshotError::DeserializationError(_)))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_missing_snapshot() {
        let result = SnapshotReader::open("/nonexistent/dir/store.snapshot");

        assert!(matches!(result, Err(SnapshotError::IO(_))));
    }
}
