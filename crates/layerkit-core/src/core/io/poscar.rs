use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::lattice::Lattice;
use crate::core::models::structure::Structure;
use crate::core::utils::elements::is_element_symbol;
use nalgebra::{Matrix3, Point3, RowVector3, Vector3};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct PoscarMetadata {
    pub comment: String,
    pub scale: f64,
    pub cartesian: bool,
    pub selective_dynamics: bool,
}

impl Default for PoscarMetadata {
    fn default() -> Self {
        Self {
            comment: "Generated by layerkit".to_string(),
            scale: 1.0,
            cartesian: false,
            selective_dynamics: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum PoscarError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PoscarParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PoscarParseErrorKind {
    #[error("Invalid float format (value: '{value}')")]
    InvalidFloat { value: String },
    #[error("Invalid integer format (value: '{value}')")]
    InvalidInt { value: String },
    #[error("Scale factor must be positive (value: '{value}')")]
    InvalidScale { value: String },
    #[error("Expected at least {expected} whitespace-separated fields")]
    TooFewFields { expected: usize },
    #[error("Unknown element symbol '{value}'")]
    UnknownSpecies { value: String },
    #[error("Coordinate mode must start with 'D' (Direct) or 'C'/'K' (Cartesian), got '{value}'")]
    InvalidCoordinateMode { value: String },
    #[error("Unexpected end of file while reading {expected}")]
    UnexpectedEof { expected: &'static str },
}

struct LineReader<'a, R: BufRead> {
    lines: io::Lines<&'a mut R>,
    line: usize,
}

impl<'a, R: BufRead> LineReader<'a, R> {
    fn new(reader: &'a mut R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    fn next(&mut self, expected: &'static str) -> Result<(usize, String), PoscarError> {
        match self.lines.next() {
            Some(line) => {
                self.line += 1;
                Ok((self.line, line?))
            }
            None => Err(PoscarError::Parse {
                line: self.line + 1,
                kind: PoscarParseErrorKind::UnexpectedEof { expected },
            }),
        }
    }
}

fn parse_float(token: &str, line: usize) -> Result<f64, PoscarError> {
    token.parse().map_err(|_| PoscarError::Parse {
        line,
        kind: PoscarParseErrorKind::InvalidFloat {
            value: token.to_string(),
        },
    })
}

fn parse_vec3(text: &str, line: usize) -> Result<Vector3<f64>, PoscarError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(PoscarError::Parse {
            line,
            kind: PoscarParseErrorKind::TooFewFields { expected: 3 },
        });
    }
    Ok(Vector3::new(
        parse_float(fields[0], line)?,
        parse_float(fields[1], line)?,
        parse_float(fields[2], line)?,
    ))
}

/// Parses the positional header (comment through atom coordinates) and
/// returns the structure, its metadata, and the number of lines consumed.
/// Shared with the volumetric reader, which continues on the same stream.
pub(crate) fn parse_positional(
    reader: &mut impl BufRead,
) -> Result<(Structure, PoscarMetadata, usize), PoscarError> {
    let mut lines = LineReader::new(reader);

    let (_, comment) = lines.next("comment line")?;

    let (scale_line, scale_text) = lines.next("scale factor")?;
    let scale = parse_float(scale_text.trim(), scale_line)?;
    if scale <= 0.0 {
        return Err(PoscarError::Parse {
            line: scale_line,
            kind: PoscarParseErrorKind::InvalidScale {
                value: scale_text.trim().to_string(),
            },
        });
    }

    let mut rows = [RowVector3::zeros(); 3];
    for row in &mut rows {
        let (line, text) = lines.next("lattice vector")?;
        *row = (parse_vec3(&text, line)? * scale).transpose();
    }
    let lattice = Lattice::new(Matrix3::from_rows(&rows));

    let (species_line, species_text) = lines.next("species symbols")?;
    let symbols: Vec<String> = species_text
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if symbols.is_empty() {
        return Err(PoscarError::MissingRecord("species symbols".to_string()));
    }
    if symbols[0].parse::<usize>().is_ok() {
        return Err(PoscarError::MissingRecord(
            "species symbol line (counts-only headers are not supported)".to_string(),
        ));
    }
    for symbol in &symbols {
        if !is_element_symbol(symbol) {
            return Err(PoscarError::Parse {
                line: species_line,
                kind: PoscarParseErrorKind::UnknownSpecies {
                    value: symbol.clone(),
                },
            });
        }
    }

    let (counts_line, counts_text) = lines.next("species counts")?;
    let counts: Vec<usize> = counts_text
        .split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| PoscarError::Parse {
                line: counts_line,
                kind: PoscarParseErrorKind::InvalidInt {
                    value: token.to_string(),
                },
            })
        })
        .collect::<Result<_, _>>()?;
    if counts.len() != symbols.len() {
        return Err(PoscarError::Inconsistency(format!(
            "{} species symbols but {} counts",
            symbols.len(),
            counts.len()
        )));
    }

    let (mode_line, mode_text) = lines.next("coordinate mode")?;
    let (selective_dynamics, mode_line, mode_text) =
        if mode_text.trim_start().starts_with(['S', 's']) {
            let (line, text) = lines.next("coordinate mode")?;
            (true, line, text)
        } else {
            (false, mode_line, mode_text)
        };
    let cartesian = match mode_text.trim_start().chars().next() {
        Some('D') | Some('d') => false,
        Some('C') | Some('c') | Some('K') | Some('k') => true,
        _ => {
            return Err(PoscarError::Parse {
                line: mode_line,
                kind: PoscarParseErrorKind::InvalidCoordinateMode {
                    value: mode_text.trim().to_string(),
                },
            });
        }
    };

    let mut atoms = Vec::new();
    for (symbol, &count) in symbols.iter().zip(&counts) {
        for _ in 0..count {
            let (line, text) = lines.next("atom coordinates")?;
            let coords = parse_vec3(&text, line)?;
            let frac = if cartesian {
                lattice
                    .cartesian_to_fractional(&Point3::from(coords * scale))
                    .ok_or_else(|| {
                        PoscarError::Inconsistency(
                            "cannot convert Cartesian coordinates in a degenerate lattice"
                                .to_string(),
                        )
                    })?
            } else {
                coords
            };
            atoms.push(Atom::new(symbol, frac));
        }
    }
    if atoms.is_empty() {
        return Err(PoscarError::MissingRecord("atom coordinates".to_string()));
    }

    let metadata = PoscarMetadata {
        comment: comment.trim_end().to_string(),
        scale,
        cartesian,
        selective_dynamics,
    };
    Ok((Structure::new(lattice, atoms), metadata, lines.line))
}

fn species_runs(structure: &Structure) -> Vec<(String, usize)> {
    let mut runs: Vec<(String, usize)> = Vec::new();
    for atom in &structure.atoms {
        match runs.last_mut() {
            Some((species, count)) if *species == atom.species => *count += 1,
            _ => runs.push((atom.species.clone(), 1)),
        }
    }
    runs
}

pub struct PoscarFile;

impl StructureFile for PoscarFile {
    type Metadata = PoscarMetadata;
    type Error = PoscarError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let (structure, metadata, _) = parse_positional(reader)?;
        Ok((structure, metadata))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writeln!(writer, "{}", metadata.comment)?;
        writeln!(writer, "   1.0")?;
        for axis in 0..3 {
            let v = structure.lattice.basis_vector(axis);
            writeln!(writer, "  {:>21.16} {:>21.16} {:>21.16}", v.x, v.y, v.z)?;
        }

        let runs = species_runs(structure);
        let symbols: Vec<&str> = runs.iter().map(|(s, _)| s.as_str()).collect();
        let counts: Vec<String> = runs.iter().map(|(_, c)| c.to_string()).collect();
        writeln!(writer, "  {}", symbols.join("  "))?;
        writeln!(writer, "  {}", counts.join("  "))?;

        writeln!(writer, "Direct")?;
        for atom in &structure.atoms {
            writeln!(
                writer,
                "  {:>19.16} {:>19.16} {:>19.16}",
                atom.frac.x, atom.frac.y, atom.frac.z
            )?;
        }
        Ok(())
    }

    fn write_structure_to(
        structure: &Structure,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        Self::write_to(structure, &PoscarMetadata::default(), writer)
    }
}
