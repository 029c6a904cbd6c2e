use std::{fmt, io};

#[derive(Debug)]
pub enum SplatError {
    ParseHeader(String),
    UnsupportedFormat(String),
    MissingEndHeader,
    ZstdDecompress(String),
    Backend(String),
    RenderOutputShape { expected: usize, found: usize },
    IoError(io::Error),
}

impl fmt::Display for SplatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplatError::ParseHeader(e) => {
                write!(f, "Failed to parse the scene header: {}", e)
            }
            SplatError::UnsupportedFormat(e) => {
                write!(f, "Unsupported scene format: {}", e)
            }
            SplatError::MissingEndHeader => {
                write!(f, "No 'end_header' line found before EOF.")
            }
            SplatError::ZstdDecompress(e) => {
                write!(f, "Zstandard decompression failed: {}", e)
            }
            SplatError::Backend(e) => {
                write!(f, "Compute backend error: {}", e)
            }
            SplatError::RenderOutputShape { expected, found } => {
                write!(
                    f,
                    "Render output has {} values per channel, expected {}",
                    found, expected
                )
            }
            SplatError::IoError(e) => {
                write!(f, "An I/O error occurred: {}", e)
            }
        }
    }
}

impl std::error::Error for SplatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SplatError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SplatError {
    fn from(e: io::Error) -> Self {
        SplatError::IoError(e)
    }
}
