use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use shapefile_common::utils::{read_int, ByteOrderWriter, Endianness};
use shapefile_vector::*;
use std::fs;
use std::path::Path;

const ALL_TYPES: [ShapeType; 13] = [
    ShapeType::Null,
    ShapeType::Point,
    ShapeType::PolyLine,
    ShapeType::Polygon,
    ShapeType::MultiPoint,
    ShapeType::PointZ,
    ShapeType::PolyLineZ,
    ShapeType::PolygonZ,
    ShapeType::MultiPointZ,
    ShapeType::PointM,
    ShapeType::PolyLineM,
    ShapeType::PolygonM,
    ShapeType::MultiPointM,
];

fn random_point(rng: &mut SmallRng, shape_type: ShapeType) -> PointZM {
    let mut p = PointZM::new(rng.gen_range(1.0..1000.0), rng.gen_range(1.0..1000.0));
    if shape_type.has_z() {
        p.z = Some(rng.gen_range(1.0..100.0));
    }
    if shape_type.has_m() {
        p.m = Some(rng.gen_range(1.0..100.0));
    }
    p
}

fn random_record(rng: &mut SmallRng, shape_type: ShapeType) -> ShapeRecord {
    let mut rec = ShapeRecord::new(shape_type);
    let num_parts = match shape_type.base_shape_type() {
        ShapeType::PolyLine | ShapeType::Polygon => rng.gen_range(1..4),
        _ => 1,
    };
    for part in 0..num_parts {
        for _ in 0..rng.gen_range(1..6) {
            rec.add_point(random_point(rng, shape_type), part).unwrap();
        }
    }
    rec
}

fn no_dbf_configs() -> Configs {
    Configs {
        allow_no_dbf: true,
        ..Default::default()
    }
}

fn reload(path: &Path) -> Shapefile {
    let mut sf = Shapefile::with_configs(ShapeType::Null, no_dbf_configs());
    sf.load(path.to_str().unwrap()).unwrap();
    sf
}

#[test]
fn test_round_trip_every_shape_type() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = SmallRng::seed_from_u64(17);
    for shape_type in ALL_TYPES.iter() {
        let path = dir.path().join(format!("{}.shp", shape_type.name().replace(' ', "_")));
        let mut sf = Shapefile::new(*shape_type, None, Some(path.to_str().unwrap()));
        for _ in 0..4 {
            sf.add_record(random_record(&mut rng, *shape_type)).unwrap();
        }
        sf.save(None).unwrap();

        let back = reload(&path);
        assert_eq!(back.shape_type, *shape_type);
        assert_eq!(back.num_records(), 4);
        for (a, b) in sf.records().iter().zip(back.records().iter()) {
            assert_eq!(a.shape_type(), b.shape_type());
            assert_eq!(a.num_points(), b.num_points(), "{}", shape_type);
            assert_eq!(a.num_parts(), b.num_parts(), "{}", shape_type);
            assert_eq!(a.points(), b.points(), "{}", shape_type);
            assert_eq!(a.geometry(), b.geometry(), "{}", shape_type);
        }
    }
}

#[test]
fn test_save_load_save_is_byte_exact() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = SmallRng::seed_from_u64(29);
    for shape_type in ALL_TYPES.iter() {
        let stem = shape_type.name().replace(' ', "_");
        let first = dir.path().join(format!("{}_a.shp", stem));
        let second = dir.path().join(format!("{}_b.shp", stem));
        let mut sf = Shapefile::new(*shape_type, None, Some(first.to_str().unwrap()));
        for _ in 0..5 {
            sf.add_record(random_record(&mut rng, *shape_type)).unwrap();
        }
        sf.save(None).unwrap();

        let mut back = reload(&first);
        back.save(Some(second.to_str().unwrap())).unwrap();

        for ext in ["shp", "shx"] {
            let a = fs::read(first.with_extension(ext)).unwrap();
            let b = fs::read(second.with_extension(ext)).unwrap();
            assert_eq!(a.len(), b.len(), "{} .{}", shape_type, ext);
            assert!(a == b, "{} .{} differs after reload", shape_type, ext);
        }
    }
}

#[test]
fn test_point_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("point.shp");
    let mut sf = Shapefile::new(ShapeType::Point, None, None);
    let mut rec = ShapeRecord::new(ShapeType::Point);
    rec.add_point(PointZM::new(482131.764567, 2143634.39608), 0)
        .unwrap();
    sf.add_record(rec).unwrap();
    sf.save(Some(path.to_str().unwrap())).unwrap();

    let back = reload(&path);
    assert_eq!(back.num_records(), 1);
    assert_eq!(
        back.get_record(0).unwrap().geometry(),
        &Geometry::Point(PointZM::new(482131.764567, 2143634.39608))
    );
    assert_eq!(back.get_record(0).unwrap().record_number, 1);
}

#[test]
fn test_header_and_index_integrity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lines.shp");
    let mut rng = SmallRng::seed_from_u64(3);
    let mut sf = Shapefile::new(ShapeType::PolyLineZ, None, Some(path.to_str().unwrap()));
    for _ in 0..6 {
        sf.add_record(random_record(&mut rng, ShapeType::PolyLineZ))
            .unwrap();
    }
    sf.save(None).unwrap();

    let content_lengths: Vec<u32> = sf
        .records()
        .iter()
        .map(|r| r.content_length().unwrap())
        .collect();
    let expected_length = 50 + content_lengths.iter().map(|cl| cl + 4).sum::<u32>();
    assert_eq!(sf.file_length(), expected_length);

    let shp = fs::read(&path).unwrap();
    assert_eq!(read_int(&shp[24..28], Endianness::BigEndian).unwrap() as u32, expected_length);
    assert_eq!(shp.len(), expected_length as usize * 2);

    let (index_header, entries) = read_index_file(dir.path().join("lines.shx")).unwrap();
    assert_eq!(index_header.file_length, 50 + 4 * 6);
    assert_eq!(index_header.shape_type, ShapeType::PolyLineZ.to_int());
    assert_eq!(entries.len(), 6);
    for (i, entry) in entries.iter().enumerate() {
        let at = entry.offset as usize * 2;
        let record_number = read_int(&shp[at..at + 4], Endianness::BigEndian).unwrap();
        let content_length = read_int(&shp[at + 4..at + 8], Endianness::BigEndian).unwrap();
        assert_eq!(record_number as usize, i + 1);
        assert_eq!(content_length as u32, entry.content_length);
        assert_eq!(entry.content_length, content_lengths[i]);
    }
}

#[test]
fn test_bounding_box_covers_all_points() {
    let mut rng = SmallRng::seed_from_u64(99);
    let mut sf = Shapefile::new(ShapeType::MultiPointZ, None, None);
    let mut all_points = vec![];
    for _ in 0..10 {
        let rec = random_record(&mut rng, ShapeType::MultiPointZ);
        all_points.extend(rec.points());
        sf.add_record(rec).unwrap();
    }
    for axis in Axis::ALL.iter() {
        let values: Vec<f64> = all_points.iter().filter_map(|p| p.get(*axis)).collect();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(sf.bounding_box.get(*axis), (Some(min), Some(max)), "{:?}", axis);
    }
}

#[test]
fn test_measure_block_is_skipped_for_zero_measures() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unmeasured.shp");
    let mut sf = Shapefile::new(ShapeType::PolyLineM, None, Some(path.to_str().unwrap()));
    let mut rec = ShapeRecord::new(ShapeType::PolyLineM);
    rec.add_point(PointZM::new(10.0, 20.0), 0).unwrap();
    rec.add_point(PointZM::new(20.0, 20.0), 0).unwrap();
    rec.add_point(PointZM::new(20.0, 10.0), 1).unwrap();
    sf.add_record(rec).unwrap();
    assert!(!sf.has_measure());
    sf.save(None).unwrap();

    let back = reload(&path);
    let rec = back.get_record(0).unwrap();
    assert_eq!(rec.num_parts(), 2);
    assert_eq!(rec.points()[2], PointZM::new(20.0, 10.0));
    assert_eq!(rec.points()[2].m, None);
}

#[test]
fn test_empty_schema_creates_no_dbf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bare.shp");
    let mut sf = Shapefile::new(ShapeType::Point, None, Some(path.to_str().unwrap()));
    sf.set_dbf_header(vec![]);
    let mut rec = ShapeRecord::new(ShapeType::Point);
    rec.add_point(PointZM::new(1.0, 2.0), 0).unwrap();
    sf.add_record(rec).unwrap();
    sf.save(None).unwrap();
    assert!(!dir.path().join("bare.dbf").exists());
    assert!(dir.path().join("bare.shx").exists());

    let back = reload(&path);
    assert_eq!(back.num_records(), 1);
    assert!(back.get_record(0).unwrap().attributes.is_empty());

    let mut strict = Shapefile::new(ShapeType::Null, None, None);
    let result = strict.load(path.to_str().unwrap());
    if Shapefile::supports_dbase() {
        assert!(matches!(result, Err(ShapefileError::DbaseNotFound(_))));
        assert!(strict
            .last_error
            .starts_with("It wasn't possible to find the DBase file"));
    } else {
        assert!(result.is_ok());
    }
}

#[cfg(feature = "dbase")]
#[test]
fn test_attributes_round_trip_and_search() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("towns.*");
    let mut sf = Shapefile::new(ShapeType::Point, None, Some(path.to_str().unwrap()));
    sf.set_dbf_header(vec![
        AttributeField::new("NAME", 'C', 20, 0),
        AttributeField::new("POP", 'N', 10, 0),
    ]);
    for (i, name) in ["Alpha", "Beta", "Gamma"].iter().enumerate() {
        let mut rec = ShapeRecord::new(ShapeType::Point);
        rec.add_point(PointZM::new(i as f64 + 1.0, 5.0), 0).unwrap();
        rec.attributes
            .insert("NAME".to_string(), FieldData::Text(name.to_string()));
        rec.attributes
            .insert("POP".to_string(), FieldData::Int(1000 * (i as i32 + 1)));
        sf.add_record(rec).unwrap();
    }
    sf.save(None).unwrap();
    assert!(dir.path().join("towns.dbf").exists());

    let back = Shapefile::read(path.to_str().unwrap()).unwrap();
    let names: Vec<&str> = back.get_dbf_header().unwrap().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["NAME", "POP"]);
    let rec = back.get_record(1).unwrap();
    assert_eq!(rec.attributes["NAME"], FieldData::Text("Beta".to_string()));
    assert_eq!(rec.attributes["POP"], FieldData::Int(2000));
    assert!(!rec.attributes.contains_key("deleted"));

    assert_eq!(back.get_index_from_dbf_data("NAME", "gamma"), Some(2));
    assert_eq!(back.get_index_from_dbf_data("POP", "1000"), Some(0));
    assert_eq!(back.get_index_from_dbf_data("NAME", "Delta"), None);
}

#[cfg(feature = "dbase")]
#[test]
fn test_attribute_failure_does_not_abort_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.shp");
    let mut sf = Shapefile::new(ShapeType::Point, None, Some(path.to_str().unwrap()));
    sf.set_dbf_header(vec![AttributeField::new("NAME", 'C', 10, 0)]);
    for i in 0..2 {
        let mut rec = ShapeRecord::new(ShapeType::Point);
        rec.add_point(PointZM::new(i as f64 + 1.0, 1.0), 0).unwrap();
        sf.add_record(rec).unwrap();
    }
    // an attribute outside the schema makes the row unwritable
    sf.get_record_mut(0)
        .unwrap()
        .attributes
        .insert("EXTRA".to_string(), FieldData::Int(1));
    sf.save(None).unwrap();
    assert!(sf.last_error.is_empty());
    assert!(!sf.get_record(0).unwrap().last_error.is_empty());
    assert!(sf.get_record(1).unwrap().last_error.is_empty());

    let back = Shapefile::read(path.to_str().unwrap()).unwrap();
    assert_eq!(back.num_records(), 2);
    assert_eq!(back.get_record(0).unwrap().points(), vec![PointZM::new(1.0, 1.0)]);
}

#[test]
fn test_delete_then_save_renumbers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pruned.shp");
    let mut rng = SmallRng::seed_from_u64(5);
    let mut sf = Shapefile::new(ShapeType::Polygon, None, Some(path.to_str().unwrap()));
    for _ in 0..3 {
        sf.add_record(random_record(&mut rng, ShapeType::Polygon)).unwrap();
    }
    let kept = sf.get_record(2).unwrap().points();
    sf.delete_record(1);
    let length_before_save = sf.file_length();
    sf.save(None).unwrap();
    assert_eq!(sf.file_length(), length_before_save);

    let back = reload(&path);
    assert_eq!(back.num_records(), 2);
    assert_eq!(back.get_record(1).unwrap().record_number, 2);
    assert_eq!(back.get_record(1).unwrap().points(), kept);
    assert_eq!(back.file_length(), length_before_save);
}

#[test]
fn test_unsupported_record_type_fails_load() {
    let mut bow = ByteOrderWriter::new(Vec::new(), Endianness::BigEndian);
    ShapefileHeader::new(50 + 4 + 2, ShapeType::Point.to_int(), BoundingBox::new())
        .write_to(&mut bow)
        .unwrap();
    bow.write_u32(1).unwrap();
    bow.write_u32(2).unwrap();
    bow.set_byte_order(Endianness::LittleEndian);
    bow.write_i32(2).unwrap();

    let mut sf = Shapefile::new(ShapeType::Null, None, None);
    sf.set_buffer(bow.into_inner());
    let err = sf.load("").unwrap_err();
    assert!(matches!(err, ShapefileError::UnsupportedShapeType(2)));
    assert_eq!(err.category(), ErrorCategory::Format);
    assert!(!sf.last_error.is_empty());
}

#[test]
fn test_not_a_shapefile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.shp");
    fs::write(&path, vec![0u8; 120]).unwrap();
    let mut sf = Shapefile::with_configs(ShapeType::Null, no_dbf_configs());
    assert!(matches!(
        sf.load(path.to_str().unwrap()),
        Err(ShapefileError::NotShapefile)
    ));
    assert_eq!(sf.last_error, "Not a SHP file (file code mismatch)");

    let missing = sf.load(dir.path().join("nothing.shp").to_str().unwrap());
    assert!(sf
        .last_error
        .starts_with("It wasn't possible to open the Shape file"));
    assert_eq!(missing.unwrap_err().category(), ErrorCategory::Io);
}

#[test]
fn test_read_from_bytes_and_projection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("projected.shp");
    let mut sf = Shapefile::new(ShapeType::MultiPointM, None, Some(path.to_str().unwrap()));
    sf.projection = "GEOGCS[\"GCS_WGS_1984\"]".to_string();
    let mut rng = SmallRng::seed_from_u64(11);
    sf.add_record(random_record(&mut rng, ShapeType::MultiPointM)).unwrap();
    sf.save(None).unwrap();

    let back = reload(&path);
    assert_eq!(back.projection, "GEOGCS[\"GCS_WGS_1984\"]");

    let from_bytes = Shapefile::read_from_bytes(fs::read(&path).unwrap()).unwrap();
    assert_eq!(from_bytes.num_records(), 1);
    assert_eq!(from_bytes.get_total_num_points(), sf.get_total_num_points());
    assert!(from_bytes.projection.is_empty());

    let configs = Configs {
        allow_no_dbf: true,
        read_projection: false,
    };
    let settings = dir.path().join("settings.json");
    configs.save_json_file(&settings).unwrap();
    let mut quiet = Shapefile::with_configs(ShapeType::Null, Configs::from_json_file(&settings).unwrap());
    quiet.load(path.to_str().unwrap()).unwrap();
    assert!(quiet.projection.is_empty());
}
