use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum Error {
    /// Caller passed an unusable value (bad flag combination, node size
    /// below 2, empty tree, unaligned index buffer).
    InvalidArgument(&'static str),
    /// Underlying read/write/mmap/temp-file failure.
    IO(std::io::Error),
    /// Missing or mismatched magic bytes.
    NotAFlatGeoBuf,
    /// Zero-length input file or buffer.
    Empty,
    /// File size exceeds the platform addressable range.
    TooLarge(u64),
    /// `search` called on a file written without an index.
    NoIndex,
    /// Structurally invalid data (truncated header, index or feature).
    Corrupt(&'static str),
    /// Arithmetic overflow in level or size computation.
    Overflow(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            Error::IO(io) => io.fmt(f),
            Error::NotAFlatGeoBuf => f.write_str("not a flatgeobuf file: invalid magic bytes"),
            Error::Empty => f.write_str("file is empty"),
            Error::TooLarge(size) => write!(f, "file of {size} bytes is too large to address"),
            Error::NoIndex => f.write_str("no index present in flatgeobuf file"),
            Error::Corrupt(what) => write!(f, "corrupt flatgeobuf: {what}"),
            Error::Overflow(what) => write!(f, "arithmetic overflow: {what}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::IO(value)
    }
}
