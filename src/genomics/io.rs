//! Tab-separated record files consumed by the command-line front end.
//!
//! Every format ignores blank lines and lines starting with `#`.
//!
//! | File | Columns |
//! |------|---------|
//! | differences | position, base, strand, base quality, mapping quality, count, class |
//! | gaps | position, base, order, strand, base quality, mapping quality, count, class |
//! | coverage | position, class, forward, reverse |
//! | features | id, parent id, start, stop, strand, type, locus |
//!
//! Unknown qualities are written as `-1`, missing parents as `-`.

use std::io::BufRead;
use std::str::FromStr;

use thiserror::Error;

use crate::genomics::{
    Difference, FeatureRecord, FeatureType, ReadClass, ReferenceGap, Strand,
};

/// Errors raised while reading record files.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Underlying reader failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line.
    #[error("line {line}: {message}")]
    Invalid {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
}

/// Coverage of one read class at one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageRecord {
    /// 1-based position.
    pub position: u32,
    /// Read class.
    pub class: ReadClass,
    /// Forward-strand depth.
    pub forward: u32,
    /// Reverse-strand depth.
    pub reverse: u32,
}

struct Fields<'a> {
    line: usize,
    inner: std::str::Split<'a, char>,
}

impl<'a> Fields<'a> {
    fn new(line: usize, text: &'a str) -> Self {
        Self {
            line,
            inner: text.split('\t'),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Invalid {
            line: self.line,
            message: message.into(),
        }
    }

    fn next_str(&mut self, name: &str) -> Result<&'a str, ParseError> {
        self.inner
            .next()
            .map(str::trim)
            .ok_or_else(|| self.error(format!("missing {name}")))
    }

    fn next<T: FromStr>(&mut self, name: &str) -> Result<T, ParseError> {
        let raw = self.next_str(name)?;
        raw.parse()
            .map_err(|_| self.error(format!("invalid {name} '{raw}'")))
    }

    fn next_base(&mut self) -> Result<u8, ParseError> {
        let raw = self.next_str("base")?;
        match raw.as_bytes() {
            [base] => Ok(*base),
            _ => Err(self.error(format!("invalid base '{raw}'"))),
        }
    }

    fn next_strand(&mut self) -> Result<Strand, ParseError> {
        match self.next_str("strand")? {
            "+" | "1" => Ok(Strand::Forward),
            "-" | "-1" => Ok(Strand::Reverse),
            other => Err(self.error(format!("invalid strand '{other}'"))),
        }
    }

    fn next_quality(&mut self, name: &str) -> Result<Option<u8>, ParseError> {
        let value: i32 = self.next(name)?;
        match value {
            -1 => Ok(None),
            0..=255 => Ok(Some(value as u8)),
            _ => Err(self.error(format!("{name} {value} out of range"))),
        }
    }

    fn next_class(&mut self) -> Result<ReadClass, ParseError> {
        let raw = self.next_str("class")?;
        ReadClass::from_tag(raw).ok_or_else(|| self.error(format!("unknown read class '{raw}'")))
    }
}

fn for_each_record<R, T, F>(reader: R, mut parse: F) -> Result<Vec<T>, ParseError>
where
    R: BufRead,
    F: FnMut(&mut Fields<'_>) -> Result<T, ParseError>,
{
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim_end();
        if text.trim().is_empty() || text.starts_with('#') {
            continue;
        }
        let mut fields = Fields::new(idx + 1, text);
        records.push(parse(&mut fields)?);
    }
    Ok(records)
}

/// Read a difference file.
pub fn read_differences<R: BufRead>(reader: R) -> Result<Vec<Difference>, ParseError> {
    for_each_record(reader, |fields| {
        Ok(Difference {
            position: fields.next("position")?,
            base: fields.next_base()?,
            strand: fields.next_strand()?,
            base_quality: fields.next_quality("base quality")?,
            mapping_quality: fields.next_quality("mapping quality")?,
            count: fields.next("count")?,
            class: fields.next_class()?,
        })
    })
}

/// Read a gap (insertion) file.
pub fn read_gaps<R: BufRead>(reader: R) -> Result<Vec<ReferenceGap>, ParseError> {
    for_each_record(reader, |fields| {
        Ok(ReferenceGap {
            position: fields.next("position")?,
            base: fields.next_base()?,
            order: fields.next("order")?,
            strand: fields.next_strand()?,
            base_quality: fields.next_quality("base quality")?,
            mapping_quality: fields.next_quality("mapping quality")?,
            count: fields.next("count")?,
            class: fields.next_class()?,
        })
    })
}

/// Read a coverage file.
pub fn read_coverage<R: BufRead>(reader: R) -> Result<Vec<CoverageRecord>, ParseError> {
    for_each_record(reader, |fields| {
        Ok(CoverageRecord {
            position: fields.next("position")?,
            class: fields.next_class()?,
            forward: fields.next("forward coverage")?,
            reverse: fields.next("reverse coverage")?,
        })
    })
}

/// Read a feature table for chromosome `chrom_id`.
pub fn read_features<R: BufRead>(reader: R, chrom_id: u32) -> Result<Vec<FeatureRecord>, ParseError> {
    for_each_record(reader, |fields| {
        let id = fields.next("id")?;
        let parent_id = match fields.next_str("parent id")? {
            "-" | "" => None,
            raw => Some(
                raw.parse()
                    .map_err(|_| fields.error(format!("invalid parent id '{raw}'")))?,
            ),
        };
        let start: u32 = fields.next("start")?;
        let stop: u32 = fields.next("stop")?;
        if start == 0 || stop < start {
            return Err(fields.error(format!("invalid feature span {start}..{stop}")));
        }
        Ok(FeatureRecord {
            id,
            parent_id,
            chrom_id,
            start,
            stop,
            strand: fields.next_strand()?,
            feature_type: FeatureType::from_tag(fields.next_str("type")?),
            locus: fields.next_str("locus")?.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_differences_and_skips_comments() {
        let input = "# position\tbase\n12\tC\t+\t30\t60\t4\tPM\n\n13\t-\t-\t-1\t-1\t1\tCM\n";
        let diffs = read_differences(input.as_bytes()).unwrap();
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].base_quality, Some(30));
        assert_eq!(diffs[0].class, ReadClass::PerfectMatch);
        assert!(diffs[1].is_deletion());
        assert_eq!(diffs[1].strand, Strand::Reverse);
        assert_eq!(diffs[1].mapping_quality, None);
    }

    #[test]
    fn reports_line_numbers() {
        let input = "12\tC\t+\t30\t60\t4\tPM\n12\tC\tx\t30\t60\t4\tPM\n";
        match read_differences(input.as_bytes()) {
            Err(ParseError::Invalid { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn parses_features_with_parents() {
        let input = "1\t-\t10\t90\t+\tgene\tgeneA\n2\t1\t10\t40\t+\tCDS\tgeneA.1\n";
        let features = read_features(input.as_bytes(), 3).unwrap();
        assert_eq!(features[1].parent_id, Some(1));
        assert_eq!(features[1].feature_type, FeatureType::Cds);
        assert_eq!(features[0].chrom_id, 3);
    }

    #[test]
    fn parses_gaps_and_coverage() {
        let gaps = read_gaps("7\tA\t1\t+\t20\t40\t3\tSPM\n".as_bytes()).unwrap();
        assert_eq!(gaps[0].order, 1);
        let coverage = read_coverage("7\tBM\t5\t2\n".as_bytes()).unwrap();
        assert_eq!(coverage[0].class, ReadClass::BestMatch);
        assert_eq!(coverage[0].reverse, 2);
    }
}
