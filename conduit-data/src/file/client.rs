use camino::{Utf8Path, Utf8PathBuf};
use conduit_core::{DataError, ObjectDataRemover};

use super::FileDataSource;
use crate::stream::{StreamListReader, StreamObjectReader, StreamObjectWriter};

/// Builds providers over one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileClient {
    path: Utf8PathBuf,
}

impl FileClient {
    /// Client for the file at `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// A data source for the file.
    #[must_use]
    pub fn data_source(&self) -> FileDataSource {
        FileDataSource::new(self.path.clone())
    }

    /// Reads one object from the file through an input converter.
    #[must_use]
    pub fn object_reader<C>(&self, converter: C) -> StreamObjectReader<FileDataSource, C> {
        StreamObjectReader::new(self.data_source(), converter)
    }

    /// Writes one object to the file through an output converter.
    #[must_use]
    pub fn object_writer<C>(&self, converter: C) -> StreamObjectWriter<FileDataSource, C> {
        StreamObjectWriter::new(self.data_source(), converter)
    }

    /// Deletes the file. The observable's value is ignored.
    #[must_use]
    pub fn object_remover(&self) -> FileRemover {
        FileRemover {
            path: self.path.clone(),
        }
    }

    /// Reads a list from the file through an iterable converter.
    #[must_use]
    pub fn list_reader<C>(&self, converter: C) -> StreamListReader<FileDataSource, C> {
        StreamListReader::new(self.data_source(), converter)
    }
}

/// Remover deleting a file if it exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRemover {
    path: Utf8PathBuf,
}

impl<T> ObjectDataRemover<T> for FileRemover {
    fn remove_object(&mut self, _current: Option<&T>) -> Result<Option<T>, DataError> {
        let removed = conduit_fs::remove_file_if_present(&self.path)
            .map_err(|source| DataError::io(format!("deleting {}", self.path), source))?;
        let outcome = if removed {
            "deleted"
        } else {
            "nothing to delete"
        };
        log::debug!("remove {}: {outcome}", self.path);
        Ok(None)
    }
}
