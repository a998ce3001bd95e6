//! [FlatGeobuf](https://flatgeobuf.org/) is a performant binary encoding
//! for geographic data based on [flatbuffers](http://google.github.io/flatbuffers/)
//! holding a schema header, an optional packed Hilbert R-tree index and a
//! stream of size-prefixed feature records.
//!
//! The index is built in memory while writing and serialized as a flat
//! node array; reading memory-maps the file and searches the node array
//! in place, so a bounding-box query touches only the pages it needs.
//!
//! ## Writing a FlatGeobuf file
//!
//! ```no_run
//! use fgb::{FeatureBuilder, FgbWriter, GeometryBuilder, GeometryType, HeaderBuilder};
//! # fn main() -> fgb::Result<()> {
//! let mut header = HeaderBuilder::new();
//! header.set_name("squares").set_geometry_type(GeometryType::Polygon);
//! let features = (0..4).map(|i| {
//!     let i = i as f64;
//!     let mut geometry = GeometryBuilder::new();
//!     geometry.set_xy(vec![i, 0.0, i, 1.0, i + 1.0, 1.0, i + 1.0, 0.0]);
//!     let mut feature = FeatureBuilder::new();
//!     feature.set_geometry(geometry);
//!     feature
//! });
//! let mut fout = std::io::BufWriter::new(std::fs::File::create("squares.fgb")?);
//! FgbWriter::new(header, true, features).write(&mut fout)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Reading a FlatGeobuf file
//!
//! ```no_run
//! use fgb::FgbReader;
//! # fn main() -> fgb::Result<()> {
//! let fgb = FgbReader::open("squares.fgb")?;
//! for feature in fgb.search(0.5, 0.5, 1.5, 1.5)? {
//!     let geometry = feature.fbs_feature().geometry().unwrap();
//!     let xy: Vec<f64> = geometry.xy().unwrap().iter().collect();
//!     println!("{xy:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
mod file_reader;
mod file_writer;
pub mod packed_r_tree;
mod schema;

pub use builder::*;
pub use error::*;
pub use file_reader::*;
pub use file_writer::*;
pub use schema::*;

pub const VERSION: u8 = 3;

/// Byte sequence every FlatGeobuf file starts with.
pub const MAGIC_BYTES: [u8; 8] = [b'f', b'g', b'b', VERSION, b'f', b'g', b'b', 0];

pub(crate) const HEADER_MAX_BUFFER_SIZE: usize = 1048576 * 10;
