use approx::assert_relative_eq;
use reciprocal_space::config::CodecConfig;
use reciprocal_space::dataset::MISYM_LABEL;
use reciprocal_space::miller::{is_absent, to_asu};
use reciprocal_space::{ColumnType, ColumnValues, MillerIndex, ReflectionTable, SpaceGroup, UnitCell};

fn anomalous_table() -> ReflectionTable {
    let hkls = vec![
        MillerIndex::new(1, 2, 3),
        MillerIndex::new(2, 3, 1),
        MillerIndex::new(4, 1, 2),
        MillerIndex::new(2, 2, 0),
    ];
    let mut table = ReflectionTable::from_hkls(&hkls)
        .unwrap()
        .with_cell(UnitCell::new(34.0, 45.0, 98.0, 90.0, 90.0, 90.0))
        .with_spacegroup(SpaceGroup::from_hm("P 21 21 21").unwrap());
    let columns = [
        ("F(+)", ColumnType::FriedelAmplitude, vec![10.0, 20.0, 30.0, 40.0]),
        ("SIGF(+)", ColumnType::FriedelAmplitudeStdDev, vec![1.0, 2.0, 3.0, 4.0]),
        ("F(-)", ColumnType::FriedelAmplitude, vec![11.0, 21.0, 31.0, 41.0]),
        ("SIGF(-)", ColumnType::FriedelAmplitudeStdDev, vec![1.1, 2.1, 3.1, 4.1]),
    ];
    for (label, dtype, values) in columns {
        table
            .insert_column(label, dtype, ColumnValues::floats(values))
            .unwrap();
    }
    table
}

#[test]
fn unmerge_map_write_read_and_restore() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unmerged.mtz");

    let mut table = anomalous_table();
    table
        .unmerge_anomalous(&["F(+)", "SIGF(+)"], &["F(-)", "SIGF(-)"])
        .unwrap();
    assert_eq!(table.len(), 8);
    assert_eq!(table.column_type("F"), Some(ColumnType::Amplitude));
    let observed = table.miller_indices().unwrap();

    table.hkl_to_asu(false).unwrap();
    let sg = table.spacegroup().unwrap().clone();
    for (stored, obs) in table.miller_indices().unwrap().iter().zip(&observed) {
        assert_eq!(*stored, to_asu(obs, &sg).hkl);
    }

    table.write_mtz(&path).unwrap();
    let mut back = ReflectionTable::read_mtz(&path).unwrap();
    assert_eq!(back.len(), 8);
    assert_eq!(back.column_type(MISYM_LABEL), Some(ColumnType::MIsym));

    back.hkl_to_observed(MISYM_LABEL).unwrap();
    assert_eq!(back.miller_indices().unwrap(), observed);
    let f = back.values("F").unwrap().to_f64();
    assert_relative_eq!(f[4], 11.0, max_relative = 1e-6);
}

#[test]
fn series_carry_the_crystal_of_their_table() {
    let table = anomalous_table();
    let series = table.column("F(+)").unwrap();
    assert_eq!(series.spacegroup().unwrap().number, 19);
    assert_relative_eq!(series.cell().unwrap().c, 98.0);
}

#[test]
fn reflection_conditions_of_common_groups() {
    let cases: &[(&str, (i32, i32, i32), bool)] = &[
        ("P 41", (0, 0, 4), false),
        ("P 41", (0, 0, 2), true),
        ("P 41", (1, 0, 2), false),
        ("P 61 2 2", (0, 0, 6), false),
        ("P 61 2 2", (0, 0, 3), true),
        ("C 1 2 1", (1, 0, 0), true),
        ("C 1 2 1", (1, 1, 0), false),
        ("I 41", (1, 1, 1), true),
        ("I 41", (1, 1, 2), false),
        ("P 21 3", (3, 0, 0), true),
        ("P 21 3", (0, 0, 2), false),
    ];
    for (symbol, (h, k, l), expected) in cases {
        let sg = SpaceGroup::from_hm(symbol).unwrap();
        assert_eq!(
            is_absent(&MillerIndex::new(*h, *k, *l), &sg),
            *expected,
            "{} ({}, {}, {})",
            symbol,
            h,
            k,
            l
        );
    }
}

#[test]
fn skip_problem_types_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags.mtz");
    let mut table = anomalous_table();
    table.label_centrics().unwrap();
    assert!(table.write_mtz(&path).is_err());
    assert!(!path.exists());

    let config = CodecConfig::default().with_skip_problem_types(true);
    table.write_mtz_with(&path, &config).unwrap();
    let back = ReflectionTable::read_mtz(&path).unwrap();
    assert!(!back.contains("CENTRIC"));
    assert_eq!(back.labels().len(), 4);
}
