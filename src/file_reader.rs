use crate::error::{Error, Result};
use crate::packed_r_tree::{is_node_aligned, PackedRTree};
use crate::schema::{
    size_prefixed_root_as_feature_unchecked, size_prefixed_root_as_header_unchecked, Feature,
    Header,
};
use crate::{HEADER_MAX_BUFFER_SIZE, MAGIC_BYTES};
use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use memmap2::Mmap;
use std::fs::{self, File};
use std::ops::{BitOr, Deref, Range};
use std::path::Path;

/// How an opened file is handled. Exactly one of [`Behavior::MMAP_ALL`]
/// and [`Behavior::LOAD_ALL`] must be set; the remaining flags refine
/// `MMAP_ALL`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Behavior(u32);

impl Behavior {
    /// Use all data directly from the memory-mapped file.
    pub const MMAP_ALL: Behavior = Behavior(1);
    /// Load the whole file into memory.
    pub const LOAD_ALL: Behavior = Behavior(1 << 1);
    /// Copy the index node array from the mapped file into RAM so it
    /// stays resident. Increases overall memory use.
    pub const LOAD_INDEX: Behavior = Behavior(1 << 2);
    /// Advise the OS to prefault the mapped data into the page cache.
    pub const PREFAULT: Behavior = Behavior(1 << 3);

    pub fn contains(self, other: Behavior) -> bool {
        self.0 & other.0 == other.0
    }

    fn validate(self) -> Result<()> {
        let mmap = self.contains(Behavior::MMAP_ALL);
        let load = self.contains(Behavior::LOAD_ALL);
        if mmap && load {
            return Err(Error::InvalidArgument(
                "behaviors MMAP_ALL and LOAD_ALL are incompatible",
            ));
        }
        if !mmap && !load {
            return Err(Error::InvalidArgument(
                "either MMAP_ALL or LOAD_ALL must be set",
            ));
        }
        if self.contains(Behavior::LOAD_INDEX) && !mmap {
            return Err(Error::InvalidArgument("LOAD_INDEX requires MMAP_ALL"));
        }
        if self.contains(Behavior::PREFAULT) && !mmap {
            return Err(Error::InvalidArgument("PREFAULT requires MMAP_ALL"));
        }
        Ok(())
    }
}

impl BitOr for Behavior {
    type Output = Behavior;

    fn bitor(self, rhs: Behavior) -> Behavior {
        Behavior(self.0 | rhs.0)
    }
}

/// Region of bytes backing a reader: a read-only private mapping or an
/// owned buffer. Dropping it unmaps or frees exactly once.
enum Storage {
    Mapped(Mmap),
    Loaded(Vec<u8>),
}

impl Deref for Storage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Storage::Mapped(mmap) => mmap,
            Storage::Loaded(buf) => buf,
        }
    }
}

enum IndexState {
    None,
    /// Node array searched in place within the storage region.
    InPlace {
        num_items: usize,
        node_size: u16,
        range: Range<usize>,
    },
    /// Node array copied out of the storage region.
    Owned(PackedRTree<'static>),
}

/// Zero-copy view of one size-prefixed feature record.
pub struct FgbFeature<'a> {
    buf: &'a [u8],
}

impl<'a> FgbFeature<'a> {
    /// Flatbuffers feature access
    pub fn fbs_feature(&self) -> Feature<'a> {
        // SAFETY: the size prefix was checked against the file bounds
        // when this view was created.
        unsafe { size_prefixed_root_as_feature_unchecked(self.buf) }
    }

    /// Column-encoded property bytes, if any.
    pub fn properties_raw(&self) -> Option<&'a [u8]> {
        self.fbs_feature().properties().map(|vec| vec.bytes())
    }

    /// The raw size-prefixed record.
    pub fn raw(&self) -> &'a [u8] {
        self.buf
    }
}

/// Read-only access to a FlatGeobuf file.
///
/// Concurrent [`FgbReader::search`] calls from multiple threads are safe:
/// the underlying bytes are immutable and searching performs no mutation.
pub struct FgbReader {
    storage: Storage,
    header_range: Range<usize>,
    index: IndexState,
    features_offset: usize,
}

impl FgbReader {
    /// Open by memory-mapping the file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FgbReader> {
        Self::open_with(path, Behavior::MMAP_ALL)
    }

    /// Open with explicit [`Behavior`] flags.
    pub fn open_with<P: AsRef<Path>>(path: P, behavior: Behavior) -> Result<FgbReader> {
        behavior.validate()?;
        let path = path.as_ref();
        let metadata = fs::metadata(path)?;
        if metadata.is_dir() {
            return Err(Error::InvalidArgument("path is a directory"));
        }
        let size = metadata.len();
        if size == 0 {
            return Err(Error::Empty);
        }
        if size > usize::MAX as u64 {
            return Err(Error::TooLarge(size));
        }

        let storage = if behavior.contains(Behavior::MMAP_ALL) {
            let file = File::open(path)?;
            // SAFETY: read-only private mapping; the file is treated as
            // immutable for the lifetime of the reader.
            let mmap = unsafe { Mmap::map(&file)? };
            // advice is best-effort
            #[cfg(unix)]
            {
                let _ = mmap.advise(memmap2::Advice::Random);
                if behavior.contains(Behavior::PREFAULT) {
                    let _ = mmap.advise(memmap2::Advice::WillNeed);
                }
            }
            Storage::Mapped(mmap)
        } else {
            Storage::Loaded(fs::read(path)?)
        };
        debug!(
            "opened {} ({size} bytes, mmapped: {})",
            path.display(),
            behavior.contains(Behavior::MMAP_ALL)
        );
        Self::setup(storage, behavior)
    }

    /// Adopt an in-memory buffer holding the contents of a FlatGeobuf
    /// file.
    pub fn from_buf(data: Vec<u8>) -> Result<FgbReader> {
        if data.is_empty() {
            return Err(Error::Empty);
        }
        Self::setup(Storage::Loaded(data), Behavior::LOAD_ALL)
    }

    /// Locate header, index and feature sections.
    fn setup(storage: Storage, behavior: Behavior) -> Result<FgbReader> {
        let data: &[u8] = &storage;
        if data.len() < MAGIC_BYTES.len() || data[..MAGIC_BYTES.len()] != MAGIC_BYTES {
            return Err(Error::NotAFlatGeoBuf);
        }
        let mut offset = MAGIC_BYTES.len();

        if data.len() < offset + 4 {
            return Err(Error::Corrupt("missing header size prefix"));
        }
        let header_size = LittleEndian::read_u32(&data[offset..]) as usize;
        if header_size > HEADER_MAX_BUFFER_SIZE || offset + 4 + header_size > data.len() {
            return Err(Error::Corrupt("header size out of bounds"));
        }
        let header_range = offset..offset + 4 + header_size;
        // SAFETY: the size prefix was checked against the buffer bounds.
        let header = unsafe { size_prefixed_root_as_header_unchecked(&data[header_range.clone()]) };
        let features_count = header.features_count() as usize;
        let index_node_size = header.index_node_size();
        offset += 4 + header_size;

        let index = if index_node_size > 0 && features_count > 0 {
            let index_size = PackedRTree::index_size(features_count, index_node_size)?;
            if index_size > data.len() - offset {
                return Err(Error::Corrupt("truncated index"));
            }
            let range = offset..offset + index_size;
            offset += index_size;
            // A flatbuffers header is only 4-byte aligned, so the node
            // array may start off the 8-byte grid; copy it out then.
            if behavior.contains(Behavior::LOAD_INDEX) || !is_node_aligned(&data[range.clone()]) {
                IndexState::Owned(PackedRTree::from_slice_copied(
                    &data[range],
                    features_count,
                    index_node_size,
                )?)
            } else {
                IndexState::InPlace {
                    num_items: features_count,
                    node_size: index_node_size,
                    range,
                }
            }
        } else {
            IndexState::None
        };

        Ok(FgbReader {
            storage,
            header_range,
            index,
            features_offset: offset,
        })
    }

    /// The file header.
    pub fn header(&self) -> Header<'_> {
        // SAFETY: bounds were validated in setup.
        unsafe { size_prefixed_root_as_header_unchecked(&self.storage[self.header_range.clone()]) }
    }

    /// All features whose bounding box intersects the query box, as
    /// zero-copy views, in ascending file order.
    pub fn search(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Result<Vec<FgbFeature<'_>>> {
        let data: &[u8] = &self.storage;
        let hits = match &self.index {
            IndexState::None => return Err(Error::NoIndex),
            IndexState::Owned(tree) => tree.search(min_x, min_y, max_x, max_y)?,
            IndexState::InPlace {
                num_items,
                node_size,
                range,
            } => PackedRTree::from_slice(&data[range.clone()], *num_items, *node_size)?
                .search(min_x, min_y, max_x, max_y)?,
        };
        debug!("search matched {} features", hits.len());

        let mut features = Vec::with_capacity(hits.len());
        for hit in hits {
            let at = self
                .features_offset
                .checked_add(hit.offset)
                .ok_or(Error::Corrupt("feature offset out of bounds"))?;
            if at >= data.len() || data.len() - at < 4 {
                return Err(Error::Corrupt("feature offset out of bounds"));
            }
            let feature_size = LittleEndian::read_u32(&data[at..]) as usize;
            if data.len() - at - 4 < feature_size {
                return Err(Error::Corrupt("truncated feature"));
            }
            features.push(FgbFeature {
                buf: &data[at..at + 4 + feature_size],
            });
        }
        Ok(features)
    }
}
