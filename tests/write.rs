use fgb::packed_r_tree::PackedRTree;
use fgb::{
    ColumnBuilder, ColumnType, Error, FeatureBuilder, FgbReader, FgbWriter, GeometryBuilder,
    GeometryType, HeaderBuilder, MAGIC_BYTES,
};

fn square_feature(xmin: f64, ymin: f64, xmax: f64, ymax: f64, tag: u16) -> FeatureBuilder {
    let mut properties = vec![0u8; 5];
    properties[1..3].copy_from_slice(&tag.to_le_bytes());
    let mut geometry = GeometryBuilder::new();
    geometry.set_xy(vec![xmin, ymin, xmin, ymax, xmax, ymax, xmax, ymin]);
    let mut feature = FeatureBuilder::new();
    feature.set_geometry(geometry).set_properties(properties);
    feature
}

fn quadrant_features() -> Vec<FeatureBuilder> {
    vec![
        square_feature(0.0, 0.0, 1.0, 1.0, 1),
        square_feature(-1.0, 0.0, 0.0, 1.0, 2),
        square_feature(-1.0, -1.0, 0.0, 0.0, 3),
        square_feature(0.0, -1.0, 1.0, 0.0, 4),
    ]
}

fn test_header() -> HeaderBuilder {
    let mut households = ColumnBuilder::new();
    households.set_name("Households").set_type(ColumnType::UInt);
    let mut header = HeaderBuilder::new();
    header
        .set_name("Households ShapeFile Data")
        .set_geometry_type(GeometryType::Polygon)
        .set_columns(vec![households]);
    header
}

fn header_end(bytes: &[u8]) -> usize {
    let header_size = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    12 + header_size
}

/// Walk the size-prefixed feature records from `at` to the end of the
/// buffer and return the property tag of each.
fn feature_tags_in_file_order(bytes: &[u8], mut at: usize) -> Vec<u16> {
    let mut tags = Vec::new();
    while at < bytes.len() {
        let size =
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize;
        let record = &bytes[at..at + 4 + size];
        // SAFETY: record bytes were produced by FgbWriter
        let feature = unsafe { fgb::size_prefixed_root_as_feature_unchecked(record) };
        let props = feature.properties().unwrap();
        tags.push(u16::from_le_bytes([props.get(1), props.get(2)]));
        at += 4 + size;
    }
    tags
}

#[test]
fn fast_path_layout() {
    let mut buf = Vec::new();
    let written = FgbWriter::new(test_header(), false, quadrant_features().into_iter())
        .write(&mut buf)
        .unwrap();
    assert_eq!(written, buf.len() as u64);
    assert_eq!(&buf[..8], &MAGIC_BYTES);

    let fgb = FgbReader::from_buf(buf.clone()).unwrap();
    assert_eq!(fgb.header().index_node_size(), 0);
    assert_eq!(fgb.header().features_count(), 0);
    assert!(fgb.header().envelope().is_none());

    // no index bytes: features start right after the header,
    // in generation order
    assert_eq!(
        feature_tags_in_file_order(&buf, header_end(&buf)),
        vec![1, 2, 3, 4]
    );
}

#[test]
fn updater_only_buffers_without_index() {
    let mut buf = Vec::new();
    FgbWriter::new(test_header(), false, quadrant_features().into_iter())
        .with_header_updater(|header| {
            header.set_description("updated after the fact");
        })
        .write(&mut buf)
        .unwrap();

    let fgb = FgbReader::from_buf(buf.clone()).unwrap();
    let header = fgb.header();
    assert_eq!(header.description(), Some("updated after the fact"));
    assert_eq!(header.features_count(), 4);
    assert_eq!(header.index_node_size(), 0);
    let envelope: Vec<f64> = header.envelope().unwrap().iter().collect();
    assert_eq!(envelope, vec![-1.0, -1.0, 1.0, 1.0]);
    assert!(matches!(fgb.search(0.0, 0.0, 1.0, 1.0), Err(Error::NoIndex)));

    assert_eq!(
        feature_tags_in_file_order(&buf, header_end(&buf)),
        vec![1, 2, 3, 4]
    );
}

#[test]
fn indexed_features_are_emitted_in_index_order() {
    let mut buf = Vec::new();
    let written = FgbWriter::new(test_header(), true, quadrant_features().into_iter())
        .write(&mut buf)
        .unwrap();
    assert_eq!(written, buf.len() as u64);

    let index_size = PackedRTree::index_size(4, PackedRTree::DEFAULT_NODE_SIZE).unwrap();
    let features_offset = header_end(&buf) + index_size;
    let file_order = feature_tags_in_file_order(&buf, features_offset);
    let mut sorted = file_order.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![1, 2, 3, 4]);

    // leaf offsets must point at the re-ordered feature bytes: a full
    // extent search yields every tag exactly once
    let fgb = FgbReader::from_buf(buf).unwrap();
    let features = fgb.search(-1.0, -1.0, 1.0, 1.0).unwrap();
    let mut tags: Vec<u16> = features
        .iter()
        .map(|feature| {
            let props = feature.properties_raw().unwrap();
            u16::from_le_bytes([props[1], props[2]])
        })
        .collect();
    tags.sort_unstable();
    assert_eq!(tags, vec![1, 2, 3, 4]);
}

#[test]
fn memory_spill_matches_temp_file_spill() {
    let write = |use_memory: bool| {
        let mut buf = Vec::new();
        let writer = FgbWriter::new(test_header(), true, quadrant_features().into_iter())
            .with_header_updater(|header| {
                header.set_metadata(r#"{"TotalHouseholds": 10}"#);
            });
        let writer = if use_memory { writer.with_memory() } else { writer };
        writer.write(&mut buf).unwrap();
        buf
    };
    assert_eq!(write(false), write(true));
}

#[test]
fn indexing_zero_features_fails() {
    let mut buf = Vec::new();
    let result =
        FgbWriter::new(test_header(), true, std::iter::empty::<FeatureBuilder>()).write(&mut buf);
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn empty_geometry_gets_sentinel_leaf() {
    // a feature with no points must not poison the other leaves
    let mut empty = FeatureBuilder::new();
    empty.set_geometry(GeometryBuilder::new());
    let features = vec![square_feature(0.0, 0.0, 1.0, 1.0, 1), empty];
    let mut buf = Vec::new();
    FgbWriter::new(test_header(), true, features.into_iter())
        .write(&mut buf)
        .unwrap();
    let fgb = FgbReader::from_buf(buf).unwrap();
    let found = fgb.search(0.0, 0.0, 1.0, 1.0).unwrap();
    assert_eq!(found.len(), 1);
}
