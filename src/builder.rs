//! Builders for the flatbuffer records of a FlatGeobuf file.
//!
//! Each builder collects plain values through in-place fluent setters and
//! encodes them in one pass: child tables and vectors first, then the
//! table itself, so nothing is created while a table is under
//! construction. Empty strings and vectors are left out of the buffer.

use crate::packed_r_tree::NodeItem;
use crate::schema::{ColumnType, Crs, Column, Feature, Geometry, GeometryType, Header};
use flatbuffers::{FlatBufferBuilder, WIPOffset};

fn maybe_create_string<'fbb>(
    fbb: &mut FlatBufferBuilder<'fbb>,
    s: &str,
) -> Option<WIPOffset<&'fbb str>> {
    if s.is_empty() {
        None
    } else {
        Some(fbb.create_string(s))
    }
}

/// Builder for the file header.
#[derive(Default, Clone)]
pub struct HeaderBuilder {
    name: String,
    envelope: Vec<f64>,
    geometry_type: GeometryType,
    has_z: bool,
    has_m: bool,
    has_t: bool,
    has_tm: bool,
    columns: Vec<ColumnBuilder>,
    features_count: u64,
    index_node_size: u16,
    crs: Option<CrsBuilder>,
    title: String,
    description: String,
    metadata: String,
}

impl HeaderBuilder {
    pub fn new() -> HeaderBuilder {
        HeaderBuilder::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn set_envelope(&mut self, envelope: Vec<f64>) -> &mut Self {
        self.envelope = envelope;
        self
    }

    pub fn set_geometry_type(&mut self, geometry_type: GeometryType) -> &mut Self {
        self.geometry_type = geometry_type;
        self
    }

    pub fn set_has_z(&mut self, has_z: bool) -> &mut Self {
        self.has_z = has_z;
        self
    }

    pub fn set_has_m(&mut self, has_m: bool) -> &mut Self {
        self.has_m = has_m;
        self
    }

    pub fn set_has_t(&mut self, has_t: bool) -> &mut Self {
        self.has_t = has_t;
        self
    }

    pub fn set_has_tm(&mut self, has_tm: bool) -> &mut Self {
        self.has_tm = has_tm;
        self
    }

    pub fn set_columns(&mut self, columns: Vec<ColumnBuilder>) -> &mut Self {
        self.columns = columns;
        self
    }

    pub fn set_features_count(&mut self, features_count: u64) -> &mut Self {
        self.features_count = features_count;
        self
    }

    pub fn set_index_node_size(&mut self, index_node_size: u16) -> &mut Self {
        self.index_node_size = index_node_size;
        self
    }

    pub fn set_crs(&mut self, crs: CrsBuilder) -> &mut Self {
        self.crs = Some(crs);
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    pub fn set_metadata(&mut self, metadata: impl Into<String>) -> &mut Self {
        self.metadata = metadata.into();
        self
    }

    /// Encode as a size-prefixed flatbuffer record.
    pub(crate) fn encode<'a>(&self, fbb: &'a mut FlatBufferBuilder) -> &'a [u8] {
        fbb.reset();
        let name = maybe_create_string(fbb, &self.name);
        let crs = self.crs.as_ref().map(|crs| crs.build(fbb));
        let column_offsets: Vec<_> = self.columns.iter().map(|col| col.build(fbb)).collect();
        let envelope = if self.envelope.is_empty() {
            None
        } else {
            Some(fbb.create_vector(&self.envelope))
        };
        let columns = if column_offsets.is_empty() {
            None
        } else {
            Some(fbb.create_vector(&column_offsets))
        };
        let title = maybe_create_string(fbb, &self.title);
        let description = maybe_create_string(fbb, &self.description);
        let metadata = maybe_create_string(fbb, &self.metadata);

        let start = fbb.start_table();
        if let Some(name) = name {
            fbb.push_slot_always(Header::VT_NAME, name);
        }
        if let Some(envelope) = envelope {
            fbb.push_slot_always(Header::VT_ENVELOPE, envelope);
        }
        fbb.push_slot::<u8>(Header::VT_GEOMETRY_TYPE, self.geometry_type.0, 0);
        fbb.push_slot::<bool>(Header::VT_HAS_Z, self.has_z, false);
        fbb.push_slot::<bool>(Header::VT_HAS_M, self.has_m, false);
        fbb.push_slot::<bool>(Header::VT_HAS_T, self.has_t, false);
        fbb.push_slot::<bool>(Header::VT_HAS_TM, self.has_tm, false);
        if let Some(columns) = columns {
            fbb.push_slot_always(Header::VT_COLUMNS, columns);
        }
        fbb.push_slot::<u64>(Header::VT_FEATURES_COUNT, self.features_count, 0);
        fbb.push_slot::<u16>(Header::VT_INDEX_NODE_SIZE, self.index_node_size, 16);
        if let Some(crs) = crs {
            fbb.push_slot_always(Header::VT_CRS, crs);
        }
        if let Some(title) = title {
            fbb.push_slot_always(Header::VT_TITLE, title);
        }
        if let Some(description) = description {
            fbb.push_slot_always(Header::VT_DESCRIPTION, description);
        }
        if let Some(metadata) = metadata {
            fbb.push_slot_always(Header::VT_METADATA, metadata);
        }
        let header = fbb.end_table(start);
        fbb.finish_size_prefixed(WIPOffset::<Header>::new(header.value()), None);
        fbb.finished_data()
    }
}

/// Builder for the coordinate reference system record. Optional on the
/// header.
#[derive(Default, Clone)]
pub struct CrsBuilder {
    org: String,
    code: i32,
    name: String,
    description: String,
    wkt: String,
    code_string: String,
}

impl CrsBuilder {
    pub fn new() -> CrsBuilder {
        CrsBuilder::default()
    }

    pub fn set_org(&mut self, org: impl Into<String>) -> &mut Self {
        self.org = org.into();
        self
    }

    pub fn set_code(&mut self, code: i32) -> &mut Self {
        self.code = code;
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    pub fn set_wkt(&mut self, wkt: impl Into<String>) -> &mut Self {
        self.wkt = wkt.into();
        self
    }

    pub fn set_code_string(&mut self, code_string: impl Into<String>) -> &mut Self {
        self.code_string = code_string.into();
        self
    }

    fn build<'fbb>(&self, fbb: &mut FlatBufferBuilder<'fbb>) -> WIPOffset<Crs<'fbb>> {
        let org = maybe_create_string(fbb, &self.org);
        let name = maybe_create_string(fbb, &self.name);
        let description = maybe_create_string(fbb, &self.description);
        let wkt = maybe_create_string(fbb, &self.wkt);
        let code_string = maybe_create_string(fbb, &self.code_string);

        let start = fbb.start_table();
        if let Some(org) = org {
            fbb.push_slot_always(Crs::VT_ORG, org);
        }
        fbb.push_slot::<i32>(Crs::VT_CODE, self.code, 0);
        if let Some(name) = name {
            fbb.push_slot_always(Crs::VT_NAME, name);
        }
        if let Some(description) = description {
            fbb.push_slot_always(Crs::VT_DESCRIPTION, description);
        }
        if let Some(wkt) = wkt {
            fbb.push_slot_always(Crs::VT_WKT, wkt);
        }
        if let Some(code_string) = code_string {
            fbb.push_slot_always(Crs::VT_CODE_STRING, code_string);
        }
        let crs = fbb.end_table(start);
        WIPOffset::new(crs.value())
    }
}

/// Builder for a column description, used in the header schema and for
/// per-feature column overrides.
#[derive(Clone)]
pub struct ColumnBuilder {
    name: String,
    type_: ColumnType,
    title: String,
    description: String,
    width: i32,
    precision: i32,
    scale: i32,
    nullable: bool,
    unique: bool,
    primary_key: bool,
    metadata: String,
}

impl Default for ColumnBuilder {
    fn default() -> Self {
        // schema defaults
        ColumnBuilder {
            name: String::new(),
            type_: ColumnType::default(),
            title: String::new(),
            description: String::new(),
            width: -1,
            precision: -1,
            scale: -1,
            nullable: true,
            unique: false,
            primary_key: false,
            metadata: String::new(),
        }
    }
}

impl ColumnBuilder {
    pub fn new() -> ColumnBuilder {
        ColumnBuilder::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn set_type(&mut self, type_: ColumnType) -> &mut Self {
        self.type_ = type_;
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    pub fn set_width(&mut self, width: i32) -> &mut Self {
        self.width = width;
        self
    }

    pub fn set_precision(&mut self, precision: i32) -> &mut Self {
        self.precision = precision;
        self
    }

    pub fn set_scale(&mut self, scale: i32) -> &mut Self {
        self.scale = scale;
        self
    }

    pub fn set_nullable(&mut self, nullable: bool) -> &mut Self {
        self.nullable = nullable;
        self
    }

    pub fn set_unique(&mut self, unique: bool) -> &mut Self {
        self.unique = unique;
        self
    }

    pub fn set_primary_key(&mut self, primary_key: bool) -> &mut Self {
        self.primary_key = primary_key;
        self
    }

    pub fn set_metadata(&mut self, metadata: impl Into<String>) -> &mut Self {
        self.metadata = metadata.into();
        self
    }

    fn build<'fbb>(&self, fbb: &mut FlatBufferBuilder<'fbb>) -> WIPOffset<Column<'fbb>> {
        let name = maybe_create_string(fbb, &self.name);
        let title = maybe_create_string(fbb, &self.title);
        let description = maybe_create_string(fbb, &self.description);
        let metadata = maybe_create_string(fbb, &self.metadata);

        let start = fbb.start_table();
        if let Some(name) = name {
            fbb.push_slot_always(Column::VT_NAME, name);
        }
        fbb.push_slot::<u8>(Column::VT_TYPE, self.type_.0, 0);
        if let Some(title) = title {
            fbb.push_slot_always(Column::VT_TITLE, title);
        }
        if let Some(description) = description {
            fbb.push_slot_always(Column::VT_DESCRIPTION, description);
        }
        fbb.push_slot::<i32>(Column::VT_WIDTH, self.width, -1);
        fbb.push_slot::<i32>(Column::VT_PRECISION, self.precision, -1);
        fbb.push_slot::<i32>(Column::VT_SCALE, self.scale, -1);
        fbb.push_slot::<bool>(Column::VT_NULLABLE, self.nullable, true);
        fbb.push_slot::<bool>(Column::VT_UNIQUE, self.unique, false);
        fbb.push_slot::<bool>(Column::VT_PRIMARY_KEY, self.primary_key, false);
        if let Some(metadata) = metadata {
            fbb.push_slot_always(Column::VT_METADATA, metadata);
        }
        let column = fbb.end_table(start);
        WIPOffset::new(column.value())
    }
}

/// Builder for a geometry: flat coordinate arrays plus optional sub-part
/// geometries for multi-part types.
#[derive(Default, Clone)]
pub struct GeometryBuilder {
    ends: Vec<u32>,
    xy: Vec<f64>,
    z: Vec<f64>,
    m: Vec<f64>,
    t: Vec<f64>,
    tm: Vec<u64>,
    type_: GeometryType,
    parts: Vec<GeometryBuilder>,
}

impl GeometryBuilder {
    pub fn new() -> GeometryBuilder {
        GeometryBuilder::default()
    }

    /// Part lengths in points; `xy` holds two values per point.
    pub fn set_ends(&mut self, ends: Vec<u32>) -> &mut Self {
        self.ends = ends;
        self
    }

    pub fn set_xy(&mut self, xy: Vec<f64>) -> &mut Self {
        self.xy = xy;
        self
    }

    pub fn set_z(&mut self, z: Vec<f64>) -> &mut Self {
        self.z = z;
        self
    }

    pub fn set_m(&mut self, m: Vec<f64>) -> &mut Self {
        self.m = m;
        self
    }

    pub fn set_t(&mut self, t: Vec<f64>) -> &mut Self {
        self.t = t;
        self
    }

    pub fn set_tm(&mut self, tm: Vec<u64>) -> &mut Self {
        self.tm = tm;
        self
    }

    pub fn set_type(&mut self, type_: GeometryType) -> &mut Self {
        self.type_ = type_;
        self
    }

    pub fn set_parts(&mut self, parts: Vec<GeometryBuilder>) -> &mut Self {
        self.parts = parts;
        self
    }

    fn build<'fbb>(&self, fbb: &mut FlatBufferBuilder<'fbb>) -> WIPOffset<Geometry<'fbb>> {
        let part_offsets: Vec<_> = self.parts.iter().map(|part| part.build(fbb)).collect();
        let ends = if self.ends.is_empty() {
            None
        } else {
            Some(fbb.create_vector(&self.ends))
        };
        let xy = if self.xy.is_empty() {
            None
        } else {
            Some(fbb.create_vector(&self.xy))
        };
        let z = if self.z.is_empty() {
            None
        } else {
            Some(fbb.create_vector(&self.z))
        };
        let m = if self.m.is_empty() {
            None
        } else {
            Some(fbb.create_vector(&self.m))
        };
        let t = if self.t.is_empty() {
            None
        } else {
            Some(fbb.create_vector(&self.t))
        };
        let tm = if self.tm.is_empty() {
            None
        } else {
            Some(fbb.create_vector(&self.tm))
        };
        let parts = if part_offsets.is_empty() {
            None
        } else {
            Some(fbb.create_vector(&part_offsets))
        };

        let start = fbb.start_table();
        if let Some(ends) = ends {
            fbb.push_slot_always(Geometry::VT_ENDS, ends);
        }
        if let Some(xy) = xy {
            fbb.push_slot_always(Geometry::VT_XY, xy);
        }
        if let Some(z) = z {
            fbb.push_slot_always(Geometry::VT_Z, z);
        }
        if let Some(m) = m {
            fbb.push_slot_always(Geometry::VT_M, m);
        }
        if let Some(t) = t {
            fbb.push_slot_always(Geometry::VT_T, t);
        }
        if let Some(tm) = tm {
            fbb.push_slot_always(Geometry::VT_TM, tm);
        }
        fbb.push_slot::<u8>(Geometry::VT_TYPE, self.type_.0, 0);
        if let Some(parts) = parts {
            fbb.push_slot_always(Geometry::VT_PARTS, parts);
        }
        let geometry = fbb.end_table(start);
        WIPOffset::new(geometry.value())
    }

    /// Bounding box used for the spatial index leaf.
    ///
    /// Single-part geometries scan the first part only (`ends[0]` points,
    /// two xy values per point); multi-part geometries take the union of
    /// their sub-part boxes. A geometry without points yields the sentinel
    /// box, which expands nothing.
    pub(crate) fn bounding_box(&self) -> NodeItem {
        if !self.parts.is_empty() {
            let mut bbox = NodeItem::create(0);
            for part in &self.parts {
                bbox.expand(&part.bounding_box());
            }
            return bbox;
        }
        let first_part_end = if self.ends.is_empty() {
            self.xy.len()
        } else {
            (self.ends[0] as usize * 2).min(self.xy.len())
        };
        let mut bbox = NodeItem::create(0);
        for point in self.xy[..first_part_end].chunks_exact(2) {
            bbox.expand(&NodeItem::new(point[0], point[1], point[0], point[1]));
        }
        bbox
    }
}

/// Builder for one feature: a geometry plus opaque column-encoded
/// property bytes.
#[derive(Default, Clone)]
pub struct FeatureBuilder {
    geometry: Option<GeometryBuilder>,
    properties: Vec<u8>,
    columns: Vec<ColumnBuilder>,
}

impl FeatureBuilder {
    pub fn new() -> FeatureBuilder {
        FeatureBuilder::default()
    }

    pub fn set_geometry(&mut self, geometry: GeometryBuilder) -> &mut Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn set_properties(&mut self, properties: Vec<u8>) -> &mut Self {
        self.properties = properties;
        self
    }

    pub fn set_columns(&mut self, columns: Vec<ColumnBuilder>) -> &mut Self {
        self.columns = columns;
        self
    }

    /// Encode as a size-prefixed flatbuffer record.
    pub(crate) fn encode<'a>(&self, fbb: &'a mut FlatBufferBuilder) -> &'a [u8] {
        fbb.reset();
        let geometry = self.geometry.as_ref().map(|geometry| geometry.build(fbb));
        let column_offsets: Vec<_> = self.columns.iter().map(|col| col.build(fbb)).collect();
        let properties = if self.properties.is_empty() {
            None
        } else {
            Some(fbb.create_vector(&self.properties))
        };
        let columns = if column_offsets.is_empty() {
            None
        } else {
            Some(fbb.create_vector(&column_offsets))
        };

        let start = fbb.start_table();
        if let Some(geometry) = geometry {
            fbb.push_slot_always(Feature::VT_GEOMETRY, geometry);
        }
        if let Some(properties) = properties {
            fbb.push_slot_always(Feature::VT_PROPERTIES, properties);
        }
        if let Some(columns) = columns {
            fbb.push_slot_always(Feature::VT_COLUMNS, columns);
        }
        let feature = fbb.end_table(start);
        fbb.finish_size_prefixed(WIPOffset::<Feature>::new(feature.value()), None);
        fbb.finished_data()
    }

    pub(crate) fn bounding_box(&self) -> NodeItem {
        match &self.geometry {
            Some(geometry) => geometry.bounding_box(),
            None => NodeItem::create(0),
        }
    }
}
