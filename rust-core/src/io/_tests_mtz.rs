#[cfg(test)]
mod _tests_mtz {
    use super::super::mtz::{decode_mtz, encode_mtz, read_mtz, write_mtz};
    use super::super::mtz_header::Endian;
    use crate::config::CodecConfig;
    use crate::dataset::{ColumnType, ColumnValues, ReflectionTable};
    use crate::error::Error;
    use crate::lattice::UnitCell;
    use crate::miller::MillerIndex;
    use crate::symmetries::SpaceGroup;
    use approx::assert_relative_eq;
    use std::path::Path;

    fn sample_table() -> ReflectionTable {
        let hkls = vec![
            MillerIndex::new(1, 2, 3),
            MillerIndex::new(2, 0, 4),
            MillerIndex::new(5, 1, 1),
        ];
        let mut table = ReflectionTable::from_hkls(&hkls)
            .unwrap()
            .with_cell(UnitCell::new(79.3, 79.3, 37.8, 90.0, 90.0, 90.0))
            .with_spacegroup(SpaceGroup::from_hm("P 43 21 2").unwrap());
        table
            .insert_column(
                "IMEAN",
                ColumnType::Intensity,
                ColumnValues::floats(vec![100.5, 2000.25, -3.75]),
            )
            .unwrap();
        table
            .insert_column(
                "SIGIMEAN",
                ColumnType::StandardDeviation,
                ColumnValues::floats(vec![1.5, 20.0, 0.5]),
            )
            .unwrap();
        table
            .insert_column("FREE", ColumnType::Integer, ColumnValues::ints(vec![0, 1, 2]))
            .unwrap();
        table
    }

    fn find(bytes: &[u8], needle: &[u8]) -> usize {
        bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap()
    }

    fn assert_same_values(a: &ReflectionTable, b: &ReflectionTable, label: &str) {
        let (x, y) = (a.values(label).unwrap().to_f64(), b.values(label).unwrap().to_f64());
        assert_eq!(x.len(), y.len());
        for (u, v) in x.iter().zip(&y) {
            assert_relative_eq!(u, v, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.mtz");
        let table = sample_table();
        write_mtz(&table, &path, &CodecConfig::default()).unwrap();
        let back = read_mtz(&path, &CodecConfig::default()).unwrap();

        assert_eq!(back.len(), 3);
        assert!(back.merged());
        assert_eq!(back.index_labels(), vec!["H", "K", "L"]);
        assert_eq!(back.labels(), vec!["IMEAN", "SIGIMEAN", "FREE"]);
        assert_eq!(back.column_type("H"), Some(ColumnType::HklIndex));
        assert_eq!(back.column_type("IMEAN"), Some(ColumnType::Intensity));
        assert_eq!(back.column_type("SIGIMEAN"), Some(ColumnType::StandardDeviation));
        assert_eq!(back.column_type("FREE"), Some(ColumnType::Integer));
        assert_eq!(back.values("FREE").unwrap().as_ints().unwrap(), &[0, 1, 2]);
        assert_eq!(back.miller_indices().unwrap(), table.miller_indices().unwrap());
        assert_same_values(&table, &back, "IMEAN");
        assert_same_values(&table, &back, "SIGIMEAN");

        let cell = back.cell().unwrap();
        for (x, y) in cell.parameters().iter().zip(table.cell().unwrap().parameters()) {
            assert_relative_eq!(*x, y, epsilon = 1e-4);
        }
        let sg = back.spacegroup().unwrap();
        assert_eq!(sg.number, 96);
        assert_eq!(sg.hm, "P 43 21 2");
        assert_eq!(sg.order(), 8);
    }

    #[test]
    fn test_header_layout() {
        let table = sample_table();
        let bytes = encode_mtz(&table, &CodecConfig::default(), Endian::Little).unwrap();
        assert_eq!(&bytes[0..4], b"MTZ ");
        assert_eq!(&bytes[8..12], &[0x44, 0x41, 0x00, 0x00]);
        let word = i32::from_le_bytes(bytes[4..8].try_into().unwrap());
        // 3 reflections x 6 columns after the 20-word preamble
        assert_eq!(word, 21 + 18);
        let start = (word as usize - 1) * 4;
        assert_eq!(&bytes[start..start + 4], b"VERS");
        assert_eq!((bytes.len() - start) % 80, 0);
        let tail = &bytes[bytes.len() - 80..];
        assert!(tail.starts_with(b"MTZENDOFHEADERS"));
    }

    #[test]
    fn test_big_endian_image() {
        let table = sample_table();
        let bytes = encode_mtz(&table, &CodecConfig::default(), Endian::Big).unwrap();
        assert_eq!(&bytes[8..12], &[0x11, 0x11, 0x00, 0x00]);
        let back = decode_mtz(&bytes, Path::new("big.mtz"), &CodecConfig::default()).unwrap();
        assert_eq!(back.miller_indices().unwrap(), table.miller_indices().unwrap());
        assert_same_values(&table, &back, "IMEAN");
    }

    #[test]
    fn test_corrupt_miller_index() {
        let mut bytes = encode_mtz(&sample_table(), &CodecConfig::default(), Endian::Little).unwrap();
        bytes[80..84].copy_from_slice(&1.5f32.to_le_bytes());
        let err = decode_mtz(&bytes, Path::new("bad.mtz"), &CodecConfig::default()).unwrap_err();
        match err {
            Error::CorruptIndex { column, row, value } => {
                assert_eq!(column, "H");
                assert_eq!(row, 0);
                assert_relative_eq!(value, 1.5);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_column_type() {
        let mut bytes = encode_mtz(&sample_table(), &CodecConfig::default(), Endian::Little).unwrap();
        let pos = find(&bytes, b"COLUMN IMEAN");
        assert_eq!(bytes[pos + 38], b'J');
        bytes[pos + 38] = b'Z';

        let err = decode_mtz(&bytes, Path::new("odd.mtz"), &CodecConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedColumnType { ref column, code: 'Z' } if column == "IMEAN"
        ));

        let config = CodecConfig::default().with_skip_problem_types(true);
        let back = decode_mtz(&bytes, Path::new("odd.mtz"), &config).unwrap();
        assert_eq!(back.column_type("IMEAN"), Some(ColumnType::Real));
    }

    #[test]
    fn test_untagged_columns_on_write() {
        let mut table = sample_table();
        table.label_centrics().unwrap();
        let err = encode_mtz(&table, &CodecConfig::default(), Endian::Little).unwrap_err();
        assert!(matches!(err, Error::AmbiguousColumnType { ref column, .. } if column == "CENTRIC"));

        let config = CodecConfig::default().with_skip_problem_types(true);
        let bytes = encode_mtz(&table, &config, Endian::Little).unwrap();
        let back = decode_mtz(&bytes, Path::new("skip.mtz"), &config).unwrap();
        assert!(!back.contains("CENTRIC"));
        assert!(back.contains("IMEAN"));
    }

    #[test]
    fn test_non_integer_index_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fractional.mtz");
        let mut table = ReflectionTable::new()
            .with_cell(UnitCell::new(50.0, 50.0, 50.0, 90.0, 90.0, 90.0))
            .with_spacegroup(SpaceGroup::from_hm("P 1").unwrap());
        table
            .insert_column("H", ColumnType::HklIndex, ColumnValues::floats(vec![1.0, 1.5]))
            .unwrap();
        table
            .insert_column("K", ColumnType::HklIndex, ColumnValues::ints(vec![0, 2]))
            .unwrap();
        table
            .insert_column("L", ColumnType::HklIndex, ColumnValues::ints(vec![3, 4]))
            .unwrap();

        match write_mtz(&table, &path, &CodecConfig::default()).unwrap_err() {
            Error::NonIntegerIndex { column, row, value } => {
                assert_eq!(column, "H");
                assert_eq!(row, 1);
                assert_relative_eq!(value, 1.5);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_overflowing_symmetry_record() {
        let mut bytes = encode_mtz(&sample_table(), &CodecConfig::default(), Endian::Little).unwrap();
        let pos = find(&bytes, b"SYMM ");
        let mut record = format!("{:<80}", "SYMM X+999999999,  Y,  Z").into_bytes();
        record.truncate(80);
        bytes[pos..pos + 80].copy_from_slice(&record);
        assert!(matches!(
            decode_mtz(&bytes, Path::new("symm.mtz"), &CodecConfig::default()),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_missing_crystal_context() {
        let table = ReflectionTable::from_hkls(&[MillerIndex::new(1, 0, 0)]).unwrap();
        assert!(matches!(
            encode_mtz(&table, &CodecConfig::default(), Endian::Little),
            Err(Error::MissingCrystalContext(_))
        ));
    }

    #[test]
    fn test_not_an_mtz_file() {
        let bytes = vec![b'x'; 200];
        assert!(matches!(
            decode_mtz(&bytes, Path::new("junk"), &CodecConfig::default()),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = encode_mtz(&sample_table(), &CodecConfig::default(), Endian::Little).unwrap();
        let word = i32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let cut = &bytes[..(word - 1) * 4 + 100];
        assert!(matches!(
            decode_mtz(cut, Path::new("cut.mtz"), &CodecConfig::default()),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_batches_round_trip() {
        let mut table = sample_table();
        table
            .insert_column("BATCH", ColumnType::Batch, ColumnValues::ints(vec![1, 1, 2]))
            .unwrap();
        table.set_merged(false);
        let bytes = encode_mtz(&table, &CodecConfig::default(), Endian::Little).unwrap();
        let back = decode_mtz(&bytes, Path::new("unmerged.mtz"), &CodecConfig::default()).unwrap();

        assert!(!back.merged());
        let numbers: Vec<i32> = back.attrs.batches.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(back.attrs.batches[0].ints.len(), 29);
        assert_eq!(back.attrs.batches[0].floats.len(), 156);
        assert_eq!(back.values("BATCH").unwrap().as_ints().unwrap(), &[1, 1, 2]);
    }

    #[test]
    fn test_dataset_and_history_records() {
        let mut table = sample_table();
        table.attrs.history = vec!["From test run".to_string()];
        let config = CodecConfig::default()
            .with_title("lysozyme")
            .with_dataset("proj", "xtal", "native")
            .with_wavelength(0.9792);
        let bytes = encode_mtz(&table, &config, Endian::Little).unwrap();
        let back = decode_mtz(&bytes, Path::new("meta.mtz"), &config).unwrap();

        assert_eq!(back.attrs.title, "lysozyme");
        assert_eq!(back.attrs.history, vec!["From test run".to_string()]);
        assert_eq!(back.attrs.datasets.len(), 2);
        let native = back.attrs.dataset(1).unwrap();
        assert_eq!(native.project, "proj");
        assert_eq!(native.dataset, "native");
        assert_relative_eq!(native.wavelength, 0.9792, epsilon = 1e-5);
        assert_eq!(back.attrs.column_datasets.get("H"), Some(&0));
        assert_eq!(back.attrs.column_datasets.get("IMEAN"), Some(&1));

        // A second write keeps the dataset records of the table
        let again = encode_mtz(&back, &CodecConfig::default(), Endian::Little).unwrap();
        let back2 = decode_mtz(&again, Path::new("meta2.mtz"), &CodecConfig::default()).unwrap();
        assert_eq!(back2.attrs.dataset(1).unwrap().crystal, "xtal");
    }

    #[test]
    fn test_missing_values_survive() {
        let mut table = sample_table();
        table
            .insert_column(
                "F",
                ColumnType::Amplitude,
                ColumnValues::floats(vec![1.0, f64::NAN, 3.0]),
            )
            .unwrap();
        let bytes = encode_mtz(&table, &CodecConfig::default(), Endian::Little).unwrap();
        let back = decode_mtz(&bytes, Path::new("nan.mtz"), &CodecConfig::default()).unwrap();
        let f = back.values("F").unwrap().to_f64();
        assert!(f[1].is_nan());
        assert_relative_eq!(f[2], 3.0);
    }
}
