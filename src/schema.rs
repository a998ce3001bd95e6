//! Hand-maintained FlatBuffers accessors for the FlatGeobuf schema.
//!
//! Covers the Header, Crs, Column, Feature and Geometry tables with the
//! vtable slot numbering of the upstream `.fbs` files. Only the fields
//! this crate reads or writes are exposed; property values stay opaque
//! bytes. Roots are unchecked: callers validate the size prefix against
//! the surrounding buffer before following it.

use flatbuffers::{Follow, ForwardsUOffset, Table, Vector};

/// Geometry type of all features in a file, or of a single geometry when
/// the file-level type is `Unknown`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(transparent)]
pub struct GeometryType(pub u8);

#[allow(non_upper_case_globals)]
impl GeometryType {
    pub const Unknown: GeometryType = GeometryType(0);
    pub const Point: GeometryType = GeometryType(1);
    pub const LineString: GeometryType = GeometryType(2);
    pub const Polygon: GeometryType = GeometryType(3);
    pub const MultiPoint: GeometryType = GeometryType(4);
    pub const MultiLineString: GeometryType = GeometryType(5);
    pub const MultiPolygon: GeometryType = GeometryType(6);
    pub const GeometryCollection: GeometryType = GeometryType(7);
}

/// Column value type. Values themselves are encoded by the application
/// into the feature `properties` byte vector.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(transparent)]
pub struct ColumnType(pub u8);

#[allow(non_upper_case_globals)]
impl ColumnType {
    pub const Byte: ColumnType = ColumnType(0);
    pub const UByte: ColumnType = ColumnType(1);
    pub const Bool: ColumnType = ColumnType(2);
    pub const Short: ColumnType = ColumnType(3);
    pub const UShort: ColumnType = ColumnType(4);
    pub const Int: ColumnType = ColumnType(5);
    pub const UInt: ColumnType = ColumnType(6);
    pub const Long: ColumnType = ColumnType(7);
    pub const ULong: ColumnType = ColumnType(8);
    pub const Float: ColumnType = ColumnType(9);
    pub const Double: ColumnType = ColumnType(10);
    pub const String: ColumnType = ColumnType(11);
    pub const Json: ColumnType = ColumnType(12);
    pub const DateTime: ColumnType = ColumnType(13);
    pub const Binary: ColumnType = ColumnType(14);
}

#[derive(Clone, Copy)]
pub struct Header<'a> {
    pub(crate) _tab: Table<'a>,
}

impl<'a> Follow<'a> for Header<'a> {
    type Inner = Header<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Header {
            _tab: Table::new(buf, loc),
        }
    }
}

impl<'a> Header<'a> {
    pub const VT_NAME: flatbuffers::VOffsetT = 4;
    pub const VT_ENVELOPE: flatbuffers::VOffsetT = 6;
    pub const VT_GEOMETRY_TYPE: flatbuffers::VOffsetT = 8;
    pub const VT_HAS_Z: flatbuffers::VOffsetT = 10;
    pub const VT_HAS_M: flatbuffers::VOffsetT = 12;
    pub const VT_HAS_T: flatbuffers::VOffsetT = 14;
    pub const VT_HAS_TM: flatbuffers::VOffsetT = 16;
    pub const VT_COLUMNS: flatbuffers::VOffsetT = 18;
    pub const VT_FEATURES_COUNT: flatbuffers::VOffsetT = 20;
    pub const VT_INDEX_NODE_SIZE: flatbuffers::VOffsetT = 22;
    pub const VT_CRS: flatbuffers::VOffsetT = 24;
    pub const VT_TITLE: flatbuffers::VOffsetT = 26;
    pub const VT_DESCRIPTION: flatbuffers::VOffsetT = 28;
    pub const VT_METADATA: flatbuffers::VOffsetT = 30;

    pub fn name(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_NAME, None) }
    }
    pub fn envelope(&self) -> Option<Vector<'a, f64>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, f64>>>(Self::VT_ENVELOPE, None)
        }
    }
    pub fn geometry_type(&self) -> GeometryType {
        GeometryType(unsafe { self._tab.get::<u8>(Self::VT_GEOMETRY_TYPE, Some(0)).unwrap() })
    }
    pub fn has_z(&self) -> bool {
        unsafe { self._tab.get::<bool>(Self::VT_HAS_Z, Some(false)).unwrap() }
    }
    pub fn has_m(&self) -> bool {
        unsafe { self._tab.get::<bool>(Self::VT_HAS_M, Some(false)).unwrap() }
    }
    pub fn has_t(&self) -> bool {
        unsafe { self._tab.get::<bool>(Self::VT_HAS_T, Some(false)).unwrap() }
    }
    pub fn has_tm(&self) -> bool {
        unsafe { self._tab.get::<bool>(Self::VT_HAS_TM, Some(false)).unwrap() }
    }
    pub fn columns(&self) -> Option<Vector<'a, ForwardsUOffset<Column<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Column<'a>>>>>(
                    Self::VT_COLUMNS,
                    None,
                )
        }
    }
    pub fn features_count(&self) -> u64 {
        unsafe { self._tab.get::<u64>(Self::VT_FEATURES_COUNT, Some(0)).unwrap() }
    }
    pub fn index_node_size(&self) -> u16 {
        unsafe { self._tab.get::<u16>(Self::VT_INDEX_NODE_SIZE, Some(16)).unwrap() }
    }
    pub fn crs(&self) -> Option<Crs<'a>> {
        unsafe { self._tab.get::<ForwardsUOffset<Crs<'a>>>(Self::VT_CRS, None) }
    }
    pub fn title(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_TITLE, None) }
    }
    pub fn description(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_DESCRIPTION, None) }
    }
    pub fn metadata(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_METADATA, None) }
    }
}

#[derive(Clone, Copy)]
pub struct Crs<'a> {
    pub(crate) _tab: Table<'a>,
}

impl<'a> Follow<'a> for Crs<'a> {
    type Inner = Crs<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Crs {
            _tab: Table::new(buf, loc),
        }
    }
}

impl<'a> Crs<'a> {
    pub const VT_ORG: flatbuffers::VOffsetT = 4;
    pub const VT_CODE: flatbuffers::VOffsetT = 6;
    pub const VT_NAME: flatbuffers::VOffsetT = 8;
    pub const VT_DESCRIPTION: flatbuffers::VOffsetT = 10;
    pub const VT_WKT: flatbuffers::VOffsetT = 12;
    pub const VT_CODE_STRING: flatbuffers::VOffsetT = 14;

    pub fn org(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_ORG, None) }
    }
    pub fn code(&self) -> i32 {
        unsafe { self._tab.get::<i32>(Self::VT_CODE, Some(0)).unwrap() }
    }
    pub fn name(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_NAME, None) }
    }
    pub fn description(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_DESCRIPTION, None) }
    }
    pub fn wkt(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_WKT, None) }
    }
    pub fn code_string(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_CODE_STRING, None) }
    }
}

#[derive(Clone, Copy)]
pub struct Column<'a> {
    pub(crate) _tab: Table<'a>,
}

impl<'a> Follow<'a> for Column<'a> {
    type Inner = Column<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Column {
            _tab: Table::new(buf, loc),
        }
    }
}

impl<'a> Column<'a> {
    pub const VT_NAME: flatbuffers::VOffsetT = 4;
    pub const VT_TYPE: flatbuffers::VOffsetT = 6;
    pub const VT_TITLE: flatbuffers::VOffsetT = 8;
    pub const VT_DESCRIPTION: flatbuffers::VOffsetT = 10;
    pub const VT_WIDTH: flatbuffers::VOffsetT = 12;
    pub const VT_PRECISION: flatbuffers::VOffsetT = 14;
    pub const VT_SCALE: flatbuffers::VOffsetT = 16;
    pub const VT_NULLABLE: flatbuffers::VOffsetT = 18;
    pub const VT_UNIQUE: flatbuffers::VOffsetT = 20;
    pub const VT_PRIMARY_KEY: flatbuffers::VOffsetT = 22;
    pub const VT_METADATA: flatbuffers::VOffsetT = 24;

    pub fn name(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_NAME, None) }
    }
    pub fn type_(&self) -> ColumnType {
        ColumnType(unsafe { self._tab.get::<u8>(Self::VT_TYPE, Some(0)).unwrap() })
    }
    pub fn title(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_TITLE, None) }
    }
    pub fn description(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_DESCRIPTION, None) }
    }
    pub fn width(&self) -> i32 {
        unsafe { self._tab.get::<i32>(Self::VT_WIDTH, Some(-1)).unwrap() }
    }
    pub fn precision(&self) -> i32 {
        unsafe { self._tab.get::<i32>(Self::VT_PRECISION, Some(-1)).unwrap() }
    }
    pub fn scale(&self) -> i32 {
        unsafe { self._tab.get::<i32>(Self::VT_SCALE, Some(-1)).unwrap() }
    }
    pub fn nullable(&self) -> bool {
        unsafe { self._tab.get::<bool>(Self::VT_NULLABLE, Some(true)).unwrap() }
    }
    pub fn unique(&self) -> bool {
        unsafe { self._tab.get::<bool>(Self::VT_UNIQUE, Some(false)).unwrap() }
    }
    pub fn primary_key(&self) -> bool {
        unsafe { self._tab.get::<bool>(Self::VT_PRIMARY_KEY, Some(false)).unwrap() }
    }
    pub fn metadata(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_METADATA, None) }
    }
}

#[derive(Clone, Copy)]
pub struct Feature<'a> {
    pub(crate) _tab: Table<'a>,
}

impl<'a> Follow<'a> for Feature<'a> {
    type Inner = Feature<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Feature {
            _tab: Table::new(buf, loc),
        }
    }
}

impl<'a> Feature<'a> {
    pub const VT_GEOMETRY: flatbuffers::VOffsetT = 4;
    pub const VT_PROPERTIES: flatbuffers::VOffsetT = 6;
    pub const VT_COLUMNS: flatbuffers::VOffsetT = 8;

    pub fn geometry(&self) -> Option<Geometry<'a>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Geometry<'a>>>(Self::VT_GEOMETRY, None)
        }
    }
    pub fn properties(&self) -> Option<Vector<'a, u8>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, u8>>>(Self::VT_PROPERTIES, None)
        }
    }
    pub fn columns(&self) -> Option<Vector<'a, ForwardsUOffset<Column<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Column<'a>>>>>(
                    Self::VT_COLUMNS,
                    None,
                )
        }
    }
}

#[derive(Clone, Copy)]
pub struct Geometry<'a> {
    pub(crate) _tab: Table<'a>,
}

impl<'a> Follow<'a> for Geometry<'a> {
    type Inner = Geometry<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Geometry {
            _tab: Table::new(buf, loc),
        }
    }
}

impl<'a> Geometry<'a> {
    pub const VT_ENDS: flatbuffers::VOffsetT = 4;
    pub const VT_XY: flatbuffers::VOffsetT = 6;
    pub const VT_Z: flatbuffers::VOffsetT = 8;
    pub const VT_M: flatbuffers::VOffsetT = 10;
    pub const VT_T: flatbuffers::VOffsetT = 12;
    pub const VT_TM: flatbuffers::VOffsetT = 14;
    pub const VT_TYPE: flatbuffers::VOffsetT = 16;
    pub const VT_PARTS: flatbuffers::VOffsetT = 18;

    pub fn ends(&self) -> Option<Vector<'a, u32>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, u32>>>(Self::VT_ENDS, None)
        }
    }
    pub fn xy(&self) -> Option<Vector<'a, f64>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, f64>>>(Self::VT_XY, None)
        }
    }
    pub fn z(&self) -> Option<Vector<'a, f64>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, f64>>>(Self::VT_Z, None)
        }
    }
    pub fn m(&self) -> Option<Vector<'a, f64>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, f64>>>(Self::VT_M, None)
        }
    }
    pub fn t(&self) -> Option<Vector<'a, f64>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, f64>>>(Self::VT_T, None)
        }
    }
    pub fn tm(&self) -> Option<Vector<'a, u64>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, u64>>>(Self::VT_TM, None)
        }
    }
    pub fn type_(&self) -> GeometryType {
        GeometryType(unsafe { self._tab.get::<u8>(Self::VT_TYPE, Some(0)).unwrap() })
    }
    pub fn parts(&self) -> Option<Vector<'a, ForwardsUOffset<Geometry<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Geometry<'a>>>>>(
                    Self::VT_PARTS,
                    None,
                )
        }
    }
}

/// Follow a size-prefixed Header root.
///
/// # Safety
/// `buf` must hold a valid size-prefixed Header flatbuffer; callers check
/// the size prefix against the buffer bounds before calling.
pub unsafe fn size_prefixed_root_as_header_unchecked(buf: &[u8]) -> Header {
    flatbuffers::size_prefixed_root_unchecked::<Header>(buf)
}

/// Follow a size-prefixed Feature root.
///
/// # Safety
/// `buf` must hold a valid size-prefixed Feature flatbuffer; callers check
/// the size prefix against the buffer bounds before calling.
pub unsafe fn size_prefixed_root_as_feature_unchecked(buf: &[u8]) -> Feature {
    flatbuffers::size_prefixed_root_unchecked::<Feature>(buf)
}
