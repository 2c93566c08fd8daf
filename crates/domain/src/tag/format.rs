use std::fmt;

use thiserror::Error;

/// Byte-layout permutation of a tag, e.g. `"1_0_3_2"`.
///
/// Field devices disagree on byte and word order per vendor; the format
/// makes each tag's wire layout an explicit configuration datum. Once
/// validated the permutation is held as a fixed-size index array so the
/// decoder is a straight gather loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteFormat {
    order: [u8; 8],
    len: u8,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("format `{format}` has {got} tokens, data type requires {want}")]
    WrongLength {
        format: String,
        want: usize,
        got: usize,
    },

    #[error("format `{format}` contains invalid token `{token}`")]
    BadToken { format: String, token: String },

    #[error("format `{format}` is not a permutation of 0..{width}")]
    NotAPermutation { format: String, width: usize },
}

impl ByteFormat {
    /// Parses and validates a `_`-separated permutation string against the
    /// byte width of the target data type. Every index in `0..width` must
    /// appear exactly once.
    pub fn parse(format: &str, width: usize) -> Result<Self, FormatError> {
        let tokens: Vec<&str> = format.split('_').collect();
        if tokens.len() != width {
            return Err(FormatError::WrongLength {
                format: format.to_string(),
                want: width,
                got: tokens.len(),
            });
        }

        let mut order = [0u8; 8];
        let mut seen = [false; 8];

        for (i, token) in tokens.iter().enumerate() {
            let index: usize = token.parse().map_err(|_| FormatError::BadToken {
                format: format.to_string(),
                token: (*token).to_string(),
            })?;
            if index >= width || seen[index] {
                return Err(FormatError::NotAPermutation {
                    format: format.to_string(),
                    width,
                });
            }
            seen[index] = true;
            order[i] = index as u8;
        }

        Ok(Self {
            order,
            len: width as u8,
        })
    }

    /// Identity layout of the given width.
    pub fn identity(width: usize) -> Self {
        let mut order = [0u8; 8];
        for (i, slot) in order.iter_mut().enumerate().take(width) {
            *slot = i as u8;
        }
        Self {
            order,
            len: width as u8,
        }
    }

    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.order[..self.len()]
    }
}

impl fmt::Display for ByteFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.as_slice().iter().enumerate() {
            if i > 0 {
                f.write_str("_")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_permutations() {
        let fmt = ByteFormat::parse("1_0_3_2", 4).unwrap();
        assert_eq!(fmt.as_slice(), &[1, 0, 3, 2]);
        assert_eq!(fmt.to_string(), "1_0_3_2");

        let fmt = ByteFormat::parse("0", 1).unwrap();
        assert_eq!(fmt.as_slice(), &[0]);

        let fmt = ByteFormat::parse("7_6_5_4_3_2_1_0", 8).unwrap();
        assert_eq!(fmt.len(), 8);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = ByteFormat::parse("1_0", 4).unwrap_err();
        assert!(matches!(err, FormatError::WrongLength { want: 4, got: 2, .. }));
    }

    #[test]
    fn rejects_repeated_indices() {
        let err = ByteFormat::parse("0_0_1_2", 4).unwrap_err();
        assert!(matches!(err, FormatError::NotAPermutation { .. }));
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let err = ByteFormat::parse("0_1_2_4", 4).unwrap_err();
        assert!(matches!(err, FormatError::NotAPermutation { .. }));
    }

    #[test]
    fn rejects_non_numeric_tokens() {
        let err = ByteFormat::parse("0_x", 2).unwrap_err();
        assert!(matches!(err, FormatError::BadToken { .. }));
    }

    #[test]
    fn every_index_appears_exactly_once() {
        for fmt in ["1_0_3_2", "3_2_1_0", "0_1_2_3"] {
            let parsed = ByteFormat::parse(fmt, 4).unwrap();
            let mut counts = [0usize; 4];
            for &i in parsed.as_slice() {
                counts[usize::from(i)] += 1;
            }
            assert_eq!(counts, [1, 1, 1, 1]);
        }
    }
}
