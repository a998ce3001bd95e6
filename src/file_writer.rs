use crate::builder::{FeatureBuilder, HeaderBuilder};
use crate::error::{Error, Result};
use crate::packed_r_tree::{hilbert_bbox, NodeItem, PackedRTree, HILBERT_MAX};
use crate::MAGIC_BYTES;
use log::debug;
use std::cmp::Reverse;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// Transient store for encoded features while the index is being built.
///
/// The temp-file variant is backed by an unnamed `tempfile`, which the OS
/// removes once the handle drops, error paths included.
enum Spill {
    TempFile(File),
    InMemory(Cursor<Vec<u8>>),
}

impl Spill {
    fn temp_file() -> Result<Spill> {
        Ok(Spill::TempFile(tempfile::tempfile()?))
    }

    fn in_memory() -> Spill {
        Spill::InMemory(Cursor::new(Vec::new()))
    }

    fn sync(&mut self) -> io::Result<()> {
        match self {
            Spill::TempFile(file) => file.sync_all(),
            Spill::InMemory(_) => Ok(()),
        }
    }
}

impl Write for Spill {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Spill::TempFile(file) => file.write(buf),
            Spill::InMemory(cursor) => cursor.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Spill::TempFile(file) => file.flush(),
            Spill::InMemory(cursor) => cursor.flush(),
        }
    }
}

impl Read for Spill {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Spill::TempFile(file) => file.read(buf),
            Spill::InMemory(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for Spill {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Spill::TempFile(file) => file.seek(pos),
            Spill::InMemory(cursor) => cursor.seek(pos),
        }
    }
}

/// Index bookkeeping for one spilled feature.
struct FeatureItem {
    bbox: NodeItem,
    size: u64,
    spill_offset: u64,
}

/// FlatGeobuf dataset writer.
///
/// Assembles magic bytes, header, the optional packed R-tree index and
/// the feature records into one output stream. Features are pulled
/// lazily from the generator; with an index (or a header updater) they
/// are buffered in a spill store first, because envelope, count and leaf
/// offsets are only known after the generator is exhausted.
pub struct FgbWriter<I> {
    header: HeaderBuilder,
    features: I,
    include_index: bool,
    header_updater: Option<Box<dyn FnMut(&mut HeaderBuilder)>>,
    use_memory: bool,
}

impl<I: Iterator<Item = FeatureBuilder>> FgbWriter<I> {
    pub fn new(header: HeaderBuilder, include_index: bool, features: I) -> FgbWriter<I> {
        FgbWriter {
            header,
            features,
            include_index,
            header_updater: None,
            use_memory: false,
        }
    }

    /// Run `updater` against the header after all features have been
    /// generated, e.g. to set metadata that depends on what was added.
    pub fn with_header_updater(
        mut self,
        updater: impl FnMut(&mut HeaderBuilder) + 'static,
    ) -> Self {
        self.header_updater = Some(Box::new(updater));
        self
    }

    /// Buffer features in memory instead of a temporary file.
    ///
    /// Warning: the feature stream is unbounded, so this can use
    /// arbitrarily large amounts of memory.
    pub fn with_memory(mut self) -> Self {
        self.use_memory = true;
        self
    }

    /// Write the complete file and return the number of bytes emitted.
    pub fn write<W: Write>(mut self, out: &mut W) -> Result<u64> {
        let mut total = 0u64;
        out.write_all(&MAGIC_BYTES)?;
        total += MAGIC_BYTES.len() as u64;

        let mut fbb = flatbuffers::FlatBufferBuilder::new();

        if !self.include_index && self.header_updater.is_none() {
            // Neither an index nor a header rewrite: emit the header
            // as-is and stream features straight through.
            let data = self.header.encode(&mut fbb);
            out.write_all(data)?;
            total += data.len() as u64;
            let mut count = 0u64;
            for feature in self.features.by_ref() {
                let data = feature.encode(&mut fbb);
                out.write_all(data)?;
                total += data.len() as u64;
                count += 1;
            }
            debug!("wrote {count} features without index");
            return Ok(total);
        }

        let mut spill = if self.use_memory {
            Spill::in_memory()
        } else {
            Spill::temp_file()?
        };
        let mut items: Vec<FeatureItem> = Vec::new();
        let mut extent = NodeItem::create(0);
        let mut offset = 0u64;
        for feature in self.features.by_ref() {
            let data = feature.encode(&mut fbb);
            spill.write_all(data)?;
            let size = data.len() as u64;
            let bbox = feature.bounding_box();
            extent.expand(&bbox);
            items.push(FeatureItem {
                bbox,
                size,
                spill_offset: offset,
            });
            offset += size;
        }
        spill.sync()?;

        if self.include_index && items.is_empty() {
            return Err(Error::InvalidArgument(
                "cannot build an index over zero features",
            ));
        }

        self.header.set_envelope(extent.to_slice().to_vec());
        self.header.set_features_count(items.len() as u64);
        if self.include_index {
            self.header.set_index_node_size(PackedRTree::DEFAULT_NODE_SIZE);
        }
        if let Some(updater) = self.header_updater.as_mut() {
            updater(&mut self.header);
        }
        let data = self.header.encode(&mut fbb);
        out.write_all(data)?;
        total += data.len() as u64;

        if self.include_index {
            // Order along the Hilbert curve, then give each leaf the
            // offset its feature will have in the emitted sequence.
            items.sort_by_cached_key(|item| {
                Reverse(hilbert_bbox(&item.bbox, HILBERT_MAX, &extent))
            });
            let mut nodes = Vec::with_capacity(items.len());
            let mut feature_offset = 0u64;
            for item in &items {
                let mut node = NodeItem::create(feature_offset);
                node.expand(&item.bbox);
                nodes.push(node);
                feature_offset += item.size;
            }
            let tree = PackedRTree::build(&nodes, &extent, PackedRTree::DEFAULT_NODE_SIZE)?;
            tree.stream_write(out)?;
            total += tree.size() as u64;
            debug!("wrote {} index bytes over {} features", tree.size(), items.len());
        }

        // Emit features from the spill in item order: Hilbert order when
        // indexed, generation order otherwise.
        for item in &items {
            spill.seek(SeekFrom::Start(item.spill_offset))?;
            let mut record = (&mut spill).take(item.size);
            let copied = io::copy(&mut record, out)?;
            if copied != item.size {
                return Err(Error::IO(io::ErrorKind::UnexpectedEof.into()));
            }
            total += copied;
        }
        debug!("wrote {} features, {total} bytes total", items.len());
        Ok(total)
    }
}
