#[cfg(test)]
mod _tests_symmetry_operations {
    use super::super::symmetry_operations::SymOp;
    use crate::error::Error;
    use crate::miller::MillerIndex;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3};

    #[test]
    fn test_identity_operation() {
        let op = SymOp::identity();
        assert!(op.is_identity());
        assert_eq!(op.det(), 1);
        assert_eq!(op.order(), 1);
        assert_eq!(op.triplet(), "x,y,z");

        let hkl = MillerIndex::new(3, -2, 7);
        assert_eq!(op.rotate_hkl(&hkl), hkl);
        assert_relative_eq!(op.phase_shift(&hkl), 0.0);
    }

    #[test]
    fn test_parse_triplets() {
        let op = SymOp::parse("-y+1/2, x-y, z+1/3").unwrap();
        assert_eq!(
            op.rotation,
            Matrix3::new(0, -1, 0, 1, -1, 0, 0, 0, 1)
        );
        assert_eq!(op.translation, Vector3::new(12, 0, 8));
        assert_eq!(op.triplet(), "-y+1/2,x-y,z+1/3");

        // Upper case, decimals and leading translations all parse
        let upper = SymOp::parse("X,Y,0.5+Z").unwrap();
        assert_eq!(upper.translation, Vector3::new(0, 0, 12));

        let scaled = SymOp::parse("2*x-y,x,z").unwrap();
        assert_eq!(scaled.rotation[(0, 0)], 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(SymOp::parse("x,y"), Err(Error::InvalidTriplet(_))));
        assert!(matches!(SymOp::parse("x,y,w"), Err(Error::InvalidTriplet(_))));
        assert!(matches!(SymOp::parse("x,,z"), Err(Error::InvalidTriplet(_))));
        assert!(matches!(SymOp::parse("x,y,z+1/0"), Err(Error::InvalidTriplet(_))));
    }

    #[test]
    fn test_parse_rejects_overflowing_numbers() {
        for text in [
            "x+999999999,y,z",
            "x,y+999999999/2,z",
            "x,y,z+99999999999.5",
            "999999999x,y,z",
            "x,y,z+2147483647/24+2147483647/24",
        ] {
            assert!(
                matches!(SymOp::parse(text), Err(Error::InvalidTriplet(_))),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_translation_wrapping() {
        let op = SymOp::parse("x-1/2,y+3/2,z-1").unwrap();
        assert_eq!(op.translation, Vector3::new(12, 12, 0));
        assert_eq!(op.triplet(), "x+1/2,y+1/2,z");
    }

    #[test]
    fn test_reciprocal_action_uses_transpose() {
        // Three-fold about c: h' = h·R
        let op = SymOp::parse("-y,x-y,z").unwrap();
        let hkl = MillerIndex::new(1, 0, 2);
        assert_eq!(op.apply_to_hkl(&hkl).unwrap(), MillerIndex::new(0, -1, 2));

        // Four-fold about c
        let op = SymOp::parse("-y,x,z").unwrap();
        assert_eq!(
            op.apply_to_hkl(&MillerIndex::new(1, 2, 3)).unwrap(),
            MillerIndex::new(2, -1, 3)
        );
    }

    #[test]
    fn test_non_unimodular_operator_fails() {
        let op = SymOp::parse("2x,y,z").unwrap();
        assert_eq!(op.det(), 2);
        assert!(!op.is_unimodular());
        match op.apply_to_hkl(&MillerIndex::new(1, 0, 0)) {
            Err(Error::InvalidOperator { det, .. }) => assert_eq!(det, 2),
            other => panic!("expected InvalidOperator, got {:?}", other),
        }
        assert!(op.inverse().is_err());
    }

    #[test]
    fn test_phase_shift() {
        let op = SymOp::parse("-x+1/2,-y,z+1/2").unwrap();
        let hkl = MillerIndex::new(1, 2, 3);
        // -360 * (1/2 + 3/2) = -720
        assert_relative_eq!(op.phase_shift(&hkl), -720.0);

        let quarter = SymOp::parse("-y,x,z+1/4").unwrap();
        assert_relative_eq!(quarter.phase_shift(&MillerIndex::new(0, 0, 1)), -90.0);
    }

    #[test]
    fn test_compose_and_inverse() {
        let a = SymOp::parse("-y+1/2,x+1/2,z+3/4").unwrap();
        let b = SymOp::parse("-x+1/2,y+1/2,-z+3/4").unwrap();

        let inv = a.inverse().unwrap();
        assert!(a.compose(&inv).is_identity());
        assert!(inv.compose(&a).is_identity());

        // (a∘b)⁻¹ = b⁻¹∘a⁻¹
        let ab = a.compose(&b);
        let expected = b.inverse().unwrap().compose(&inv);
        assert_eq!(ab.inverse().unwrap(), expected);
    }

    #[test]
    fn test_operation_orders() {
        assert_eq!(SymOp::parse("-x,-y,-z").unwrap().order(), 2);
        assert_eq!(SymOp::parse("-y,x-y,z").unwrap().order(), 3);
        assert_eq!(SymOp::parse("-y,x,z+1/4").unwrap().order(), 4);
        assert_eq!(SymOp::parse("x-y,x,z+1/6").unwrap().order(), 6);
    }

    #[test]
    fn test_proper_rotation() {
        let mirror = SymOp::parse("x,-y,z").unwrap();
        assert_eq!(mirror.det(), -1);
        assert_eq!(mirror.proper_rotation(), Matrix3::from_diagonal(&Vector3::new(-1, 1, -1)));
    }

    #[test]
    fn test_display_matches_triplet() {
        let op = SymOp::parse("y,x,-z+2/3").unwrap();
        assert_eq!(format!("{}", op), "y,x,-z+2/3");
        assert_eq!(SymOp::default(), SymOp::identity());
    }
}
