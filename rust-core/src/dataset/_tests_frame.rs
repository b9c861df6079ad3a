#[cfg(test)]
mod _tests_frame {
    use super::super::column_types::ColumnValues;
    use super::super::frame::Frame;
    use crate::error::Error;

    fn sample() -> Frame {
        Frame::from_columns(vec![
            ("H".to_string(), ColumnValues::ints(vec![1, 0, 2])),
            ("K".to_string(), ColumnValues::ints(vec![0, 1, 0])),
            ("L".to_string(), ColumnValues::ints(vec![0, 0, 1])),
            ("I".to_string(), ColumnValues::floats(vec![10.0, 20.0, 30.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_columns() {
        let frame = sample();
        assert_eq!(frame.nrows(), 3);
        assert_eq!(frame.ncols(), 4);
        assert_eq!(frame.labels(), vec!["H", "K", "L", "I"]);
        assert!(frame.index_labels().is_empty());
    }

    #[test]
    fn test_insert_rejects_wrong_length() {
        let mut frame = sample();
        let err = frame
            .insert("SIGI", ColumnValues::floats(vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 3, actual: 1 }));
    }

    #[test]
    fn test_insert_replaces_existing_column() {
        let mut frame = sample();
        frame
            .insert("I", ColumnValues::floats(vec![1.0, 2.0, 3.0]))
            .unwrap();
        assert_eq!(frame.ncols(), 4);
        assert_eq!(frame.get("I").unwrap().as_floats().unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_set_and_reset_index() {
        let mut frame = sample();
        frame.set_index(&["H", "K", "L"]).unwrap();
        assert_eq!(frame.index_labels(), vec!["H", "K", "L"]);
        assert_eq!(frame.labels(), vec!["I"]);
        assert!(frame.is_index("K"));
        // Index columns are still reachable by label
        assert_eq!(frame.get("H").unwrap().as_ints().unwrap(), &[1, 0, 2]);

        frame.reset_index();
        assert!(frame.index_labels().is_empty());
        assert_eq!(frame.labels(), vec!["H", "K", "L", "I"]);
    }

    #[test]
    fn test_set_index_missing_label() {
        let mut frame = sample();
        assert!(matches!(
            frame.set_index(&["H", "X"]),
            Err(Error::MissingColumn(label)) if label == "X"
        ));
        assert!(frame.index_labels().is_empty());
    }

    #[test]
    fn test_set_index_repeated_label_leaves_frame_untouched() {
        let mut frame = sample();
        frame.set_index(&["H", "K", "L"]).unwrap();
        let before = frame.clone();
        assert!(matches!(
            frame.set_index(&["H", "H"]),
            Err(Error::DuplicateColumn(label)) if label == "H"
        ));
        assert_eq!(frame, before);
        assert_eq!(frame.index_labels(), vec!["H", "K", "L"]);
    }

    #[test]
    fn test_set_index_follows_requested_order() {
        let mut frame = sample();
        frame.set_index(&["L", "H"]).unwrap();
        assert_eq!(frame.index_labels(), vec!["L", "H"]);
        assert_eq!(frame.labels(), vec!["K", "I"]);
        let schema = frame.batch().schema();
        assert_eq!(schema.field(0).name(), "L");
    }

    #[test]
    fn test_concat_rejects_bool_with_numbers() {
        let a = Frame::from_columns(vec![("X".to_string(), ColumnValues::bools(vec![true]))]).unwrap();
        let b = Frame::from_columns(vec![("X".to_string(), ColumnValues::ints(vec![1]))]).unwrap();
        assert!(matches!(
            a.concat(&b),
            Err(Error::IncompatibleValues { column, .. }) if column == "X"
        ));
    }

    #[test]
    fn test_insert_over_index_is_rejected() {
        let mut frame = sample();
        frame.set_index(&["H", "K", "L"]).unwrap();
        let err = frame
            .insert("H", ColumnValues::ints(vec![0, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn(_)));
        frame.replace("H", ColumnValues::ints(vec![5, 5, 5])).unwrap();
        assert_eq!(frame.get("H").unwrap().as_ints().unwrap(), &[5, 5, 5]);
    }

    #[test]
    fn test_take_and_filter() {
        let mut frame = sample();
        frame.set_index(&["H", "K", "L"]).unwrap();
        let taken = frame.take(&[2, 0]).unwrap();
        assert_eq!(taken.nrows(), 2);
        assert_eq!(taken.get("H").unwrap().as_ints().unwrap(), &[2, 1]);
        assert_eq!(taken.index_labels(), vec!["H", "K", "L"]);

        let filtered = frame.filter(&[false, true, true]).unwrap();
        assert_eq!(filtered.get("I").unwrap().as_floats().unwrap(), &[20.0, 30.0]);

        assert!(frame.take(&[3]).is_err());
        assert!(frame.filter(&[true]).is_err());
    }

    #[test]
    fn test_concat_keeps_index() {
        let mut a = sample();
        a.set_index(&["H", "K", "L"]).unwrap();
        let b = a.clone();
        let joined = a.concat(&b).unwrap();
        assert_eq!(joined.nrows(), 6);
        assert_eq!(joined.index_labels(), vec!["H", "K", "L"]);
        assert!(!joined.has_unique_index().unwrap());
        assert!(a.has_unique_index().unwrap());
    }

    #[test]
    fn test_concat_promotes_ints_to_floats() {
        let a = Frame::from_columns(vec![("X".to_string(), ColumnValues::ints(vec![1, 2]))]).unwrap();
        let b = Frame::from_columns(vec![("X".to_string(), ColumnValues::floats(vec![0.5]))]).unwrap();
        let joined = a.concat(&b).unwrap();
        assert_eq!(joined.get("X").unwrap().as_floats().unwrap(), &[1.0, 2.0, 0.5]);
    }

    #[test]
    fn test_concat_label_mismatch() {
        let a = sample();
        let mut b = sample();
        b.rename("I", "F").unwrap();
        assert!(matches!(a.concat(&b), Err(Error::MissingColumn(_))));
    }

    #[test]
    fn test_rename_and_remove() {
        let mut frame = sample();
        frame.rename("I", "IMEAN").unwrap();
        assert!(frame.contains("IMEAN"));
        assert!(!frame.contains("I"));
        assert!(matches!(frame.rename("H", "K"), Err(Error::DuplicateColumn(_))));

        let removed = frame.remove("IMEAN").unwrap();
        assert_eq!(removed.len(), 3);
        assert!(matches!(frame.remove("IMEAN"), Err(Error::MissingColumn(_))));
    }

    #[test]
    fn test_sort_by_index() {
        let mut frame = sample();
        frame.set_index(&["H", "K", "L"]).unwrap();
        frame.sort_by_index().unwrap();
        assert_eq!(frame.get("H").unwrap().as_ints().unwrap(), &[0, 1, 2]);
        assert_eq!(frame.get("I").unwrap().as_floats().unwrap(), &[20.0, 10.0, 30.0]);
    }
}
