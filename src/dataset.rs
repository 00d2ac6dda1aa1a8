//! Tab-separated dataset I/O.
//!
//! Input rows carry `id`, `label`, `sentence`, `pos` columns, located by
//! header name in any order. The `sentence` text is passed through untouched
//! for human reference; only the POS field feeds the recognizer.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::warn;

const REQUIRED_COLUMNS: [&str; 4] = ["id", "label", "sentence", "pos"];

/// One labeled dataset row, tokenized and ready for classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputRow {
    pub id: String,
    pub ground_truth: u8,
    pub sentence: String,
    pub tokens: Vec<String>,
}

/// One classified row, written back out in input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRow {
    pub id: String,
    pub ground_truth: u8,
    pub prediction: u8,
}

#[derive(Debug)]
pub enum DatasetError {
    /// The input file lacks one or more required header columns.
    MissingColumns(Vec<String>),
    Csv(csv::Error),
    Io(io::Error),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::MissingColumns(cols) => {
                write!(f, "input dataset is missing required columns: {}", cols.join(", "))
            }
            DatasetError::Csv(e) => write!(f, "dataset read/write failed: {}", e),
            DatasetError::Io(e) => write!(f, "dataset I/O failed: {}", e),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::MissingColumns(_) => None,
            DatasetError::Csv(e) => Some(e),
            DatasetError::Io(e) => Some(e),
        }
    }
}

impl From<csv::Error> for DatasetError {
    fn from(e: csv::Error) -> DatasetError {
        DatasetError::Csv(e)
    }
}

impl From<io::Error> for DatasetError {
    fn from(e: io::Error) -> DatasetError {
        DatasetError::Io(e)
    }
}

/// Read the labeled input TSV from disk.
pub fn read_input(path: &Path) -> Result<Vec<InputRow>, DatasetError> {
    let file = fs::File::open(path)?;
    read_input_from(file)
}

/// Read labeled rows from any TSV source.
pub fn read_input_from<R: io::Read>(reader: R) -> Result<Vec<InputRow>, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = locate_columns(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let id = field(columns[0]).to_string();
        let label_text = field(columns[1]);
        let ground_truth = match label_text.parse::<u8>() {
            Ok(v) => v,
            Err(_) => {
                // Malformed labels default to 0 rather than aborting the row.
                warn!("row '{}': malformed label '{}', defaulting to 0", id, label_text);
                0
            }
        };
        let sentence = field(columns[2]).to_string();
        let tokens = field(columns[3])
            .split_whitespace()
            .map(str::to_string)
            .collect();

        rows.push(InputRow { id, ground_truth, sentence, tokens });
    }
    Ok(rows)
}

fn locate_columns(headers: &StringRecord) -> Result<[usize; 4], DatasetError> {
    let mut indices = [0usize; 4];
    let mut missing = Vec::new();
    for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
        match headers.iter().position(|h| h.trim() == *name) {
            Some(idx) => indices[slot] = idx,
            None => missing.push(name.to_string()),
        }
    }
    if missing.is_empty() {
        Ok(indices)
    } else {
        Err(DatasetError::MissingColumns(missing))
    }
}

/// Write the prediction TSV, creating parent directories as needed.
pub fn write_output(path: &Path, rows: &[OutputRow]) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(path)?;
    write_output_to(file, rows)
}

/// Write prediction rows to any sink, header first, in the given order.
pub fn write_output_to<W: io::Write>(writer: W, rows: &[OutputRow]) -> Result<(), DatasetError> {
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    writer.write_record(["id", "ground_truth", "prediction"])?;
    for row in rows {
        let ground_truth = row.ground_truth.to_string();
        let prediction = row.prediction.to_string();
        writer.write_record([row.id.as_str(), ground_truth.as_str(), prediction.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a previously written prediction TSV back in.
pub fn read_output(path: &Path) -> Result<Vec<OutputRow>, DatasetError> {
    let file = fs::File::open(path)?;
    read_output_from(file)
}

pub fn read_output_from<R: io::Read>(reader: R) -> Result<Vec<OutputRow>, DatasetError> {
    let mut reader = ReaderBuilder::new().delimiter(b'\t').from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        rows.push(OutputRow {
            id: field(0).to_string(),
            ground_truth: field(1).parse().unwrap_or(0),
            prediction: field(2).parse().unwrap_or(0),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = "id\tlabel\tsentence\tpos\n\
                         1\t0\tthe dog runs\tDT NN VBZ\n\
                         2\t1\tthe runs\tDT VBZ\n";

    #[test]
    fn reads_rows_with_tokens() {
        let rows = read_input_from(INPUT.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "1");
        assert_eq!(rows[0].ground_truth, 0);
        assert_eq!(rows[0].sentence, "the dog runs");
        assert_eq!(rows[0].tokens, vec!["DT", "NN", "VBZ"]);
        assert_eq!(rows[1].ground_truth, 1);
    }

    #[test]
    fn column_order_does_not_matter() {
        let shuffled = "pos\tid\tlabel\tsentence\n\
                        DT NN\t7\t1\tthe dog\n";
        let rows = read_input_from(shuffled.as_bytes()).unwrap();
        assert_eq!(rows[0].id, "7");
        assert_eq!(rows[0].ground_truth, 1);
        assert_eq!(rows[0].tokens, vec!["DT", "NN"]);
    }

    #[test]
    fn missing_columns_are_named() {
        let bad = "id\tsentence\n1\thello\n";
        match read_input_from(bad.as_bytes()) {
            Err(DatasetError::MissingColumns(cols)) => {
                assert_eq!(cols, vec!["label".to_string(), "pos".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn malformed_label_defaults_to_zero() {
        let input = "id\tlabel\tsentence\tpos\n1\tnot-a-number\tx\tNN\n";
        let rows = read_input_from(input.as_bytes()).unwrap();
        assert_eq!(rows[0].ground_truth, 0);
    }

    #[test]
    fn empty_pos_field_yields_empty_tokens() {
        let input = "id\tlabel\tsentence\tpos\n1\t0\tx\t\n";
        let rows = read_input_from(input.as_bytes()).unwrap();
        assert!(rows[0].tokens.is_empty());
    }

    #[test]
    fn output_round_trips_in_order() {
        let rows = vec![
            OutputRow { id: "1".into(), ground_truth: 0, prediction: 0 },
            OutputRow { id: "2".into(), ground_truth: 1, prediction: 1 },
            OutputRow { id: "3".into(), ground_truth: 0, prediction: 1 },
        ];
        let mut buf = Vec::new();
        write_output_to(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("id\tground_truth\tprediction\n"));
        let reread = read_output_from(buf.as_slice()).unwrap();
        assert_eq!(reread, rows);
    }
}
