use fgb::{
    Behavior, ColumnBuilder, ColumnType, Error, FeatureBuilder, FgbFeature, FgbReader, FgbWriter,
    GeometryBuilder, GeometryType, HeaderBuilder,
};
use std::io::Write as _;

/// Unit square feature tagged through the 5-byte property blob
/// `{0x00, u16 LE tag, 0x00, 0x00}`.
fn square_feature(xmin: f64, ymin: f64, xmax: f64, ymax: f64, tag: u16) -> FeatureBuilder {
    let mut properties = vec![0u8; 5];
    properties[1..3].copy_from_slice(&tag.to_le_bytes());
    let mut geometry = GeometryBuilder::new();
    geometry.set_xy(vec![xmin, ymin, xmin, ymax, xmax, ymax, xmax, ymin]);
    let mut feature = FeatureBuilder::new();
    feature.set_geometry(geometry).set_properties(properties);
    feature
}

fn multi_square_feature(squares: &[[f64; 4]], tag: u16) -> FeatureBuilder {
    let mut properties = vec![0u8; 5];
    properties[1..3].copy_from_slice(&tag.to_le_bytes());
    let parts = squares
        .iter()
        .map(|&[xmin, ymin, xmax, ymax]| {
            let mut part = GeometryBuilder::new();
            part.set_xy(vec![xmin, ymin, xmin, ymax, xmax, ymax, xmax, ymin]);
            part
        })
        .collect();
    let mut geometry = GeometryBuilder::new();
    geometry.set_parts(parts);
    let mut feature = FeatureBuilder::new();
    feature.set_geometry(geometry).set_properties(properties);
    feature
}

fn households_header(geometry_type: GeometryType) -> HeaderBuilder {
    let mut households = ColumnBuilder::new();
    households.set_name("Households").set_type(ColumnType::UInt);
    let mut header = HeaderBuilder::new();
    header
        .set_name("Households ShapeFile Data")
        .set_title("Households ShapeFile Data")
        .set_geometry_type(geometry_type)
        .set_columns(vec![households]);
    header
}

/// Four unit squares covering the four quadrants of the Cartesian plane,
/// tagged 1..4 with the quadrant number.
fn quadrant_features() -> Vec<FeatureBuilder> {
    vec![
        square_feature(0.0, 0.0, 1.0, 1.0, 1),
        square_feature(-1.0, 0.0, 0.0, 1.0, 2),
        square_feature(-1.0, -1.0, 0.0, 0.0, 3),
        square_feature(0.0, -1.0, 1.0, 0.0, 4),
    ]
}

const METADATA: &str = r#"{"TotalHouseholds": 10}"#;

fn quadrant_file() -> Vec<u8> {
    let mut buf = Vec::new();
    FgbWriter::new(
        households_header(GeometryType::Polygon),
        true,
        quadrant_features().into_iter(),
    )
    .with_header_updater(|header| {
        header.set_metadata(METADATA);
    })
    .write(&mut buf)
    .unwrap();
    buf
}

fn tags(features: &[FgbFeature]) -> Vec<u16> {
    let mut tags: Vec<u16> = features
        .iter()
        .map(|feature| {
            let props = feature.properties_raw().unwrap();
            u16::from_le_bytes([props[1], props[2]])
        })
        .collect();
    tags.sort_unstable();
    tags
}

fn check_searches(reader: &FgbReader, cases: &[(f64, f64, f64, f64, &[u16])]) {
    for &(min_x, min_y, max_x, max_y, expected) in cases {
        let features = reader.search(min_x, min_y, max_x, max_y).unwrap();
        assert_eq!(
            tags(&features),
            expected,
            "search({min_x}, {min_y}, {max_x}, {max_y})"
        );
    }
}

const QUADRANT_CASES: &[(f64, f64, f64, f64, &[u16])] = &[
    (0.5, 0.5, 0.6, 0.6, &[1]),
    (-0.6, -0.1, -0.5, 0.1, &[2, 3]),
    (-0.1, -0.1, 0.1, 0.1, &[1, 2, 3, 4]),
    (2.0, 2.0, 3.0, 3.0, &[]),
];

fn temp_fgb(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn quadrants_mmap_search() {
    let file = temp_fgb(&quadrant_file());
    let fgb = FgbReader::open(file.path()).unwrap();

    let header = fgb.header();
    assert_eq!(header.name(), Some("Households ShapeFile Data"));
    assert_eq!(header.metadata(), Some(METADATA));
    assert_eq!(header.features_count(), 4);
    assert_eq!(header.index_node_size(), 16);
    assert_eq!(header.geometry_type(), GeometryType::Polygon);
    let columns = header.columns().unwrap();
    assert_eq!(columns.len(), 1);
    assert_eq!(columns.get(0).name(), Some("Households"));
    assert_eq!(columns.get(0).type_(), ColumnType::UInt);
    let envelope: Vec<f64> = header.envelope().unwrap().iter().collect();
    assert_eq!(envelope, vec![-1.0, -1.0, 1.0, 1.0]);

    check_searches(&fgb, QUADRANT_CASES);
}

#[test]
fn quadrants_search_behavior_matrix() {
    let file = temp_fgb(&quadrant_file());
    let behaviors = [
        Behavior::MMAP_ALL,
        Behavior::LOAD_ALL,
        Behavior::MMAP_ALL | Behavior::PREFAULT,
        Behavior::MMAP_ALL | Behavior::LOAD_INDEX,
        Behavior::MMAP_ALL | Behavior::LOAD_INDEX | Behavior::PREFAULT,
    ];
    for behavior in behaviors {
        let fgb = FgbReader::open_with(file.path(), behavior).unwrap();
        check_searches(&fgb, QUADRANT_CASES);
    }
}

#[test]
fn reopen_is_idempotent() {
    let file = temp_fgb(&quadrant_file());
    let first = {
        let fgb = FgbReader::open(file.path()).unwrap();
        tags(&fgb.search(-0.1, -0.1, 0.1, 0.1).unwrap())
    };
    let second = {
        let fgb = FgbReader::open(file.path()).unwrap();
        tags(&fgb.search(-0.1, -0.1, 0.1, 0.1).unwrap())
    };
    assert_eq!(first, second);
}

#[test]
fn multi_polygon_search() {
    // two squares per feature, one feature per quadrant
    let features = vec![
        multi_square_feature(&[[1.0, 1.0, 2.0, 2.0], [2.0, 2.0, 3.0, 3.0]], 1),
        multi_square_feature(&[[-2.0, 1.0, -1.0, 2.0], [-3.0, 2.0, -2.0, 3.0]], 2),
        multi_square_feature(&[[-2.0, -2.0, -1.0, -1.0], [-2.0, -2.0, -3.0, -3.0]], 3),
        multi_square_feature(&[[1.0, -2.0, 2.0, -1.0], [2.0, -3.0, 3.0, -2.0]], 4),
    ];
    let mut buf = Vec::new();
    FgbWriter::new(
        households_header(GeometryType::MultiPolygon),
        true,
        features.into_iter(),
    )
    .write(&mut buf)
    .unwrap();

    let fgb = FgbReader::from_buf(buf).unwrap();
    check_searches(
        &fgb,
        &[
            (1.5, 1.5, 1.6, 1.6, &[1]),
            (-1.6, -1.1, -1.5, 1.1, &[2, 3]),
            (-1.1, -1.1, 1.1, 1.1, &[1, 2, 3, 4]),
            (3.5, 3.5, 4.5, 4.5, &[]),
        ],
    );
}

#[test]
fn from_buf_matches_file_search() {
    let bytes = quadrant_file();
    let fgb = FgbReader::from_buf(bytes).unwrap();
    assert_eq!(fgb.header().metadata(), Some(METADATA));
    check_searches(&fgb, QUADRANT_CASES);
}

#[test]
fn invalid_behavior_combinations() {
    let file = temp_fgb(&quadrant_file());
    let invalid = [
        Behavior::MMAP_ALL | Behavior::LOAD_ALL,
        Behavior::LOAD_ALL | Behavior::LOAD_INDEX,
        Behavior::LOAD_ALL | Behavior::PREFAULT,
    ];
    for behavior in invalid {
        assert!(matches!(
            FgbReader::open_with(file.path(), behavior),
            Err(Error::InvalidArgument(_))
        ));
    }
    // neither policy set
    assert!(matches!(
        FgbReader::open_with(file.path(), Behavior::LOAD_INDEX),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn rejects_bad_magic() {
    let mut bytes = quadrant_file();
    bytes[0] = b'x';
    assert!(matches!(
        FgbReader::from_buf(bytes),
        Err(Error::NotAFlatGeoBuf)
    ));
    assert!(matches!(
        FgbReader::from_buf(b"not a flatgeobuf at all".to_vec()),
        Err(Error::NotAFlatGeoBuf)
    ));
}

#[test]
fn rejects_empty_and_directory_inputs() {
    let file = temp_fgb(&[]);
    assert!(matches!(FgbReader::open(file.path()), Err(Error::Empty)));
    assert!(matches!(FgbReader::from_buf(Vec::new()), Err(Error::Empty)));

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        FgbReader::open(dir.path()),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn rejects_truncated_index() {
    let bytes = quadrant_file();
    // cut into the node array right after the header record
    let header_size = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let truncated = bytes[..12 + header_size + 100].to_vec();
    assert!(matches!(
        FgbReader::from_buf(truncated),
        Err(Error::Corrupt(_))
    ));
}

#[test]
fn search_without_index_fails() {
    let mut buf = Vec::new();
    FgbWriter::new(
        households_header(GeometryType::Polygon),
        false,
        quadrant_features().into_iter(),
    )
    .write(&mut buf)
    .unwrap();
    let fgb = FgbReader::from_buf(buf).unwrap();
    assert!(matches!(
        fgb.search(0.0, 0.0, 1.0, 1.0),
        Err(Error::NoIndex)
    ));
}
