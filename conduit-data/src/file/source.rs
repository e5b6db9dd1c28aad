use std::io::{BufReader, BufWriter, Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use conduit_core::{DataError, InputDataSource, OutputDataSource};

/// Byte streams over a UTF-8 file path.
///
/// Reading opens the existing file; writing creates or truncates it,
/// creating missing parent directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDataSource {
    path: Utf8PathBuf,
}

impl FileDataSource {
    /// Data source for `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl InputDataSource for FileDataSource {
    fn input_stream(&mut self) -> Result<Box<dyn Read + '_>, DataError> {
        let file = conduit_fs::open_for_read(&self.path)
            .map_err(|source| DataError::io(format!("opening {} for reading", self.path), source))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

impl OutputDataSource for FileDataSource {
    fn output_stream(&mut self) -> Result<Box<dyn Write + '_>, DataError> {
        let file = conduit_fs::create_for_write(&self.path)
            .map_err(|source| DataError::io(format!("opening {} for writing", self.path), source))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}
