use crate::core::io::poscar::{PoscarError, PoscarMetadata, parse_positional};
use crate::core::models::field::{GridSizeMismatch, ScalarField};
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumetricError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed positional header: {0}")]
    Header(#[from] PoscarError),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: VolumetricParseErrorKind,
    },
    #[error("Grid size mismatch: {0}")]
    GridMismatch(#[from] GridSizeMismatch),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum VolumetricParseErrorKind {
    #[error("Invalid integer format (value: '{value}')")]
    InvalidInt { value: String },
    #[error("Invalid float format (value: '{value}')")]
    InvalidFloat { value: String },
    #[error("Grid dimension line requires three integers")]
    InvalidDimensions,
}

/// Reader for plain-text volumetric scalar-field files.
///
/// The format is a positional structure header (shared with the positional
/// file parser), a blank separator line, a line with the three grid
/// dimensions, and the flattened scalar values in reading order with the
/// first grid axis fastest. Trailing records after the grid block (e.g.
/// augmentation data) are ignored.
pub struct VolumetricFile;

impl VolumetricFile {
    /// Reads a scalar field and its header metadata from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns [`VolumetricError`] for malformed headers, malformed grid
    /// records, or a value stream shorter than the declared dimensions.
    pub fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(ScalarField, PoscarMetadata), VolumetricError> {
        let (structure, metadata, header_lines) = parse_positional(reader)?;
        let mut line_number = header_lines;

        let mut dims_text = None;
        for line in reader.by_ref().lines() {
            let line = line?;
            line_number += 1;
            if !line.trim().is_empty() {
                dims_text = Some((line_number, line));
                break;
            }
        }
        let (dims_line, dims_text) = dims_text
            .ok_or_else(|| VolumetricError::MissingRecord("grid dimensions".to_string()))?;

        let fields: Vec<&str> = dims_text.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(VolumetricError::Parse {
                line: dims_line,
                kind: VolumetricParseErrorKind::InvalidDimensions,
            });
        }
        let mut dims = [0usize; 3];
        for (slot, token) in dims.iter_mut().zip(&fields) {
            *slot = token.parse().map_err(|_| VolumetricError::Parse {
                line: dims_line,
                kind: VolumetricParseErrorKind::InvalidInt {
                    value: token.to_string(),
                },
            })?;
        }

        let expected = dims[0] * dims[1] * dims[2];
        let mut values = Vec::with_capacity(expected);
        'grid: for line in reader.lines() {
            let line = line?;
            line_number += 1;
            for token in line.split_whitespace() {
                if values.len() == expected {
                    break 'grid;
                }
                let value: f64 = token.parse().map_err(|_| VolumetricError::Parse {
                    line: line_number,
                    kind: VolumetricParseErrorKind::InvalidFloat {
                        value: token.to_string(),
                    },
                })?;
                values.push(value);
            }
            if values.len() == expected {
                break;
            }
        }

        let field = ScalarField::new(structure, dims, values)?;
        Ok((field, metadata))
    }

    /// Reads a scalar field from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    pub fn read_from_path<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<(ScalarField, PoscarMetadata), VolumetricError> {
        let file = std::fs::File::open(path)?;
        let mut reader = io::BufReader::new(file);
        Self::read_from(&mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn read(text: &str) -> Result<(ScalarField, PoscarMetadata), VolumetricError> {
        let mut reader = BufReader::new(text.as_bytes());
        VolumetricFile::read_from(&mut reader)
    }

    fn sample(grid_block: &str) -> String {
        format!(
            "\
Mock field
1.0
3.0 0.0 0.0
0.0 3.0 0.0
0.0 0.0 20.0
Fe O
1 2
Selective dynamics
Direct
0.10 0.10 0.10 T T T
0.20 0.20 0.20 T T T
0.30 0.30 0.30 T T T

{grid_block}"
        )
    }

    #[test]
    fn reads_grid_after_a_multi_species_header() {
        let text = sample("2 2 2\n0.0 0.1 0.2 0.3 0.4\n0.5 0.6 0.7\n");
        let (field, _) = read(&text).unwrap();
        assert_eq!(field.dims(), [2, 2, 2]);
        assert_eq!(field.structure().len(), 3);
        assert_eq!(field.value(1, 0, 0), 0.1);
        assert_eq!(field.value(1, 1, 1), 0.7);
    }

    #[test]
    fn ignores_trailing_records_after_the_grid() {
        let text = sample("1 1 2\n0.25 0.75\naugmentation occupancies\n1 2 3\n");
        let (field, _) = read(&text).unwrap();
        assert_eq!(field.values(), &[0.25, 0.75]);
    }

    #[test]
    fn rejects_a_short_value_stream() {
        let text = sample("2 2 2\n0.0 0.1 0.2\n");
        match read(&text).unwrap_err() {
            VolumetricError::GridMismatch(err) => {
                assert_eq!(err.expected, 8);
                assert_eq!(err.actual, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_dimension_lines() {
        let text = sample("2 2\n0.0 0.1 0.2 0.3\n");
        assert!(matches!(
            read(&text).unwrap_err(),
            VolumetricError::Parse {
                kind: VolumetricParseErrorKind::InvalidDimensions,
                ..
            }
        ));
    }

    #[test]
    fn rejects_non_numeric_grid_values() {
        let text = sample("1 1 2\n0.25 nope\n");
        assert!(matches!(
            read(&text).unwrap_err(),
            VolumetricError::Parse {
                kind: VolumetricParseErrorKind::InvalidFloat { .. },
                ..
            }
        ));
    }

    #[test]
    fn rejects_files_without_a_grid_block() {
        let text = sample("");
        assert!(matches!(
            read(&text).unwrap_err(),
            VolumetricError::MissingRecord(_)
        ));
    }

    #[test]
    fn propagates_header_errors() {
        let text = "Comment only\n";
        assert!(matches!(
            read(text).unwrap_err(),
            VolumetricError::Header(_)
        ));
    }
}
