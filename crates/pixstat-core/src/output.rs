//! CSV output sink.
//!
//! The sink owns a fixed header declared at creation. Each record is a set of
//! named fields; fields are placed by header position, columns the record does
//! not provide are left empty, and a record naming a column outside the header
//! is rejected without touching the file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::SinkError;

/// A value that can be written as one CSV row.
pub trait CsvRow {
    /// `(column, value)` pairs. Order does not matter; the header decides it.
    fn fields(&self) -> Vec<(&'static str, String)>;
}

/// Rows written and refused by [`CsvSink::write_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkSummary {
    pub written: usize,
    pub rejected: usize,
}

/// Streaming CSV writer with a fixed header.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    headers: Vec<String>,
    path: PathBuf,
    header_written: bool,
}

impl CsvSink<File> {
    /// Open `path` for writing, truncating any existing file.
    ///
    /// Missing parent directories are created.
    pub fn create<S: AsRef<str>>(path: &Path, headers: &[S]) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SinkError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let writer = csv::Writer::from_path(path).map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("Opened CSV sink at {:?}", path);
        Ok(Self::with_writer(writer, headers, path.to_path_buf()))
    }
}

impl<W: Write> CsvSink<W> {
    /// Wrap an arbitrary writer. `path` in errors is reported as `<stream>`.
    pub fn from_writer<S: AsRef<str>>(writer: W, headers: &[S]) -> Self {
        Self::with_writer(
            csv::Writer::from_writer(writer),
            headers,
            PathBuf::from("<stream>"),
        )
    }

    fn with_writer<S: AsRef<str>>(writer: csv::Writer<W>, headers: &[S], path: PathBuf) -> Self {
        Self {
            writer,
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            path,
            header_written: false,
        }
    }

    /// Write the header line. Does nothing the second time.
    pub fn write_header(&mut self) -> Result<(), SinkError> {
        if self.header_written {
            return Ok(());
        }
        self.writer
            .write_record(&self.headers)
            .map_err(|source| self.write_error(source))?;
        self.header_written = true;
        Ok(())
    }

    /// Write one row.
    ///
    /// Returns `Ok(false)` if the row names a column outside the header; the
    /// row is dropped and the sink stays usable.
    pub fn write_row<R: CsvRow>(&mut self, row: &R) -> Result<bool, SinkError> {
        self.write_header()?;

        let mut cells = vec![String::new(); self.headers.len()];
        for (key, value) in row.fields() {
            match self.headers.iter().position(|h| h == key) {
                Some(idx) => cells[idx] = value,
                None => {
                    tracing::warn!(
                        "Row has column {:?} not in header {:?}. Dropping row.",
                        key,
                        self.headers
                    );
                    return Ok(false);
                }
            }
        }

        self.writer
            .write_record(&cells)
            .map_err(|source| self.write_error(source))?;
        Ok(true)
    }

    /// Write the header and then every row, flushing at the end.
    ///
    /// The header is written even when `rows` is empty.
    pub fn write_all<R, I>(&mut self, rows: I) -> Result<SinkSummary, SinkError>
    where
        R: CsvRow,
        I: IntoIterator<Item = R>,
    {
        self.write_header()?;
        let mut summary = SinkSummary::default();
        for row in rows {
            if self.write_row(&row)? {
                summary.written += 1;
            } else {
                summary.rejected += 1;
            }
        }
        self.flush()?;
        Ok(summary)
    }

    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.writer
            .flush()
            .map_err(|e| self.write_error(csv::Error::from(e)))
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        let path = self.path;
        self.writer.into_inner().map_err(|e| SinkError::Write {
            path,
            source: csv::Error::from(e.into_error()),
        })
    }

    fn write_error(&self, source: csv::Error) -> SinkError {
        SinkError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(Vec<(&'static str, String)>);

    impl CsvRow for Row {
        fn fields(&self) -> Vec<(&'static str, String)> {
            self.0.clone()
        }
    }

    fn row(pairs: &[(&'static str, &str)]) -> Row {
        Row(pairs.iter().map(|(k, v)| (*k, v.to_string())).collect())
    }

    fn output(sink: CsvSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_four_column_schema() {
        let headers = ["filename", "width", "height", "average_color"];
        let mut sink = CsvSink::from_writer(Vec::new(), &headers);

        let ok = sink
            .write_row(&row(&[
                ("average_color", "#ff0000"),
                ("filename", "a.jpg"),
                ("height", "50"),
                ("width", "100"),
            ]))
            .unwrap();

        assert!(ok);
        assert_eq!(
            output(sink),
            "filename,width,height,average_color\na.jpg,100,50,#ff0000\n"
        );
    }

    #[test]
    fn test_missing_columns_are_empty() {
        let mut sink = CsvSink::from_writer(Vec::new(), &["a", "b", "c"]);
        sink.write_row(&row(&[("c", "3"), ("a", "1")])).unwrap();
        assert_eq!(output(sink), "a,b,c\n1,,3\n");
    }

    #[test]
    fn test_unknown_column_rejects_row() {
        let mut sink = CsvSink::from_writer(Vec::new(), &["filename"]);
        let ok = sink
            .write_row(&row(&[("filename", "a.jpg"), ("num_of_faces", "2")]))
            .unwrap();
        assert!(!ok);

        sink.write_row(&row(&[("filename", "b.jpg")])).unwrap();
        assert_eq!(output(sink), "filename\nb.jpg\n");
    }

    #[test]
    fn test_values_are_quoted() {
        let mut sink = CsvSink::from_writer(Vec::new(), &["filename"]);
        sink.write_row(&row(&[("filename", "a, \"b\".png")])).unwrap();
        assert_eq!(output(sink), "filename\n\"a, \"\"b\"\".png\"\n");
    }

    #[test]
    fn test_write_all_empty_still_writes_header() {
        let mut sink = CsvSink::from_writer(Vec::new(), &["x", "y"]);
        let summary = sink.write_all(Vec::<Row>::new()).unwrap();
        assert_eq!(summary, SinkSummary::default());
        assert_eq!(output(sink), "x,y\n");
    }

    #[test]
    fn test_write_all_counts() {
        let mut sink = CsvSink::from_writer(Vec::new(), &["x"]);
        let summary = sink
            .write_all(vec![row(&[("x", "1")]), row(&[("z", "2")]), row(&[("x", "3")])])
            .unwrap();
        assert_eq!(summary, SinkSummary { written: 2, rejected: 1 });
        assert_eq!(output(sink), "x\n1\n3\n");
    }

    #[test]
    fn test_header_written_once() {
        let mut sink = CsvSink::from_writer(Vec::new(), &["x"]);
        sink.write_header().unwrap();
        sink.write_header().unwrap();
        sink.write_row(&row(&[("x", "1")])).unwrap();
        assert_eq!(output(sink), "x\n1\n");
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.csv");

        let mut sink = CsvSink::create(&path, &["x"]).unwrap();
        sink.write_all(vec![row(&[("x", "1")])]).unwrap();
        drop(sink);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\n1\n");
    }

    #[test]
    fn test_create_blocked_by_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let result = CsvSink::create(&blocker.join("out.csv"), &["x"]);
        assert!(matches!(result, Err(SinkError::CreateDir { .. })));
    }

    #[test]
    fn test_create_on_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = CsvSink::create(dir.path(), &["x"]);
        assert!(matches!(result, Err(SinkError::Open { .. })));
    }

    #[test]
    fn test_image_record_against_schemas() {
        use crate::types::{ImageRecord, BASIC_HEADERS, DATA_HEADERS};

        let mut record = ImageRecord {
            filename: "a.jpg".into(),
            filesize: 10,
            width: 100,
            height: 50,
            aspect_ratio: "2:1".into(),
            average_color: "#ff0000".into(),
            num_of_faces: None,
        };

        let mut basic = CsvSink::from_writer(Vec::new(), &BASIC_HEADERS);
        assert!(basic.write_row(&record).unwrap());

        let mut full = CsvSink::from_writer(Vec::new(), &DATA_HEADERS);
        record.num_of_faces = Some(3);
        assert!(full.write_row(&record).unwrap());
        assert!(!basic.write_row(&record).unwrap());

        assert!(output(full).ends_with("a.jpg,10,100,50,2:1,#ff0000,3\n"));
    }
}
