#[cfg(test)]
mod _tests_asu_mapping {
    use super::super::asu_mapping::{from_asu, to_asu, AsuMapper};
    use super::super::miller_index::MillerIndex;
    use crate::error::Error;
    use crate::symmetries::{LaueClass, SpaceGroup, SymOp};
    use approx::assert_relative_eq;

    const GROUPS: &[&str] = &[
        "P 1", "P -1", "P 21", "C 2", "P 21 21 21", "C 2 2 21", "P 41", "I 41", "P 43 21 2",
        "P 31", "R 3", "P 31 2 1", "P 32 1 2", "P 65", "P 61 2 2", "P 21 3", "I 41 3 2",
    ];

    fn box_indices(range: i32) -> Vec<MillerIndex> {
        let mut out = Vec::new();
        for h in -range..=range {
            for k in -range..=range {
                for l in -range..=range {
                    out.push(MillerIndex::new(h, k, l));
                }
            }
        }
        out
    }

    #[test]
    fn test_tetragonal_reflection_maps_into_asu() {
        let sg = SpaceGroup::from_hm("P 43 21 2").unwrap();
        let mapping = to_asu(&MillerIndex::new(1, 2, 3), &sg);
        assert_eq!(mapping.hkl, MillerIndex::new(2, 1, 3));
        assert!(mapping.isym >= 1 && mapping.isym as usize <= 2 * sg.order());
    }

    #[test]
    fn test_mapping_is_idempotent() {
        for symbol in GROUPS {
            let sg = SpaceGroup::from_hm(symbol).unwrap();
            let mapper = AsuMapper::new(&sg);
            for hkl in box_indices(3) {
                let once = mapper.map(&hkl);
                assert!(mapper.asu().is_in(&once.hkl), "{}: {:?}", symbol, hkl);
                let twice = mapper.map(&once.hkl);
                assert_eq!(twice.hkl, once.hkl, "{}: {:?}", symbol, hkl);
                assert_eq!(twice.isym, 1);
                assert_relative_eq!(twice.phase_shift, 0.0);
            }
        }
    }

    #[test]
    fn test_unmap_inverts_map() {
        for symbol in GROUPS {
            let sg = SpaceGroup::from_hm(symbol).unwrap();
            let mapper = AsuMapper::new(&sg);
            for hkl in box_indices(3) {
                let forward = mapper.map(&hkl);
                let back = mapper.unmap(&forward.hkl, forward.isym).unwrap();
                assert_eq!(back.hkl, hkl, "{}", symbol);
                assert_eq!(back.friedel, forward.friedel);

                let phase = 37.0;
                let asu_phase = forward.apply_phase(phase);
                assert_relative_eq!(back.revert_phase(asu_phase), phase, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_friedel_mates_share_asu_index() {
        for symbol in GROUPS {
            let sg = SpaceGroup::from_hm(symbol).unwrap();
            let mapper = AsuMapper::new(&sg);
            for hkl in box_indices(2) {
                let plus = mapper.map(&hkl);
                let minus = mapper.map(&-hkl);
                assert_eq!(plus.hkl, minus.hkl, "{}: {:?}", symbol, hkl);
                if !sg.is_centric(&hkl) {
                    assert_ne!(plus.friedel, minus.friedel, "{}: {:?}", symbol, hkl);
                }
            }
        }
    }

    #[test]
    fn test_identity_mapping_for_p1_upper_half() {
        let sg = SpaceGroup::p1();
        let mapping = to_asu(&MillerIndex::new(-2, 5, 1), &sg);
        assert_eq!(mapping.hkl, MillerIndex::new(-2, 5, 1));
        assert_eq!(mapping.isym, 1);
        assert!(!mapping.friedel);

        let mapping = to_asu(&MillerIndex::new(2, -5, -1), &sg);
        assert_eq!(mapping.hkl, MillerIndex::new(-2, 5, 1));
        assert_eq!(mapping.isym, 2);
        assert!(mapping.friedel);
    }

    #[test]
    fn test_phase_follows_screw_translation() {
        let sg = SpaceGroup::from_hm("P 21").unwrap();
        // The screw axis carries (-1,1,-1) onto (1,1,1) with a half-turn shift
        let hkl = MillerIndex::new(-1, 1, -1);
        let mapping = to_asu(&hkl, &sg);
        assert_eq!(mapping.hkl, MillerIndex::new(1, 1, 1));
        assert_eq!(mapping.isym, 3);
        assert_relative_eq!(mapping.phase_shift, -180.0);
        assert_relative_eq!(mapping.apply_phase(30.0), -150.0);
    }

    #[test]
    fn test_invalid_isym() {
        let sg = SpaceGroup::from_hm("P 21 21 21").unwrap();
        let hkl = MillerIndex::new(1, 2, 3);
        assert!(matches!(
            from_asu(&hkl, 0, &sg),
            Err(Error::InvalidIsym { isym: 0, n_ops: 4 })
        ));
        assert!(matches!(
            from_asu(&hkl, 9, &sg),
            Err(Error::InvalidIsym { isym: 9, .. })
        ));
        assert!(from_asu(&hkl, 8, &sg).is_ok());
    }

    #[test]
    fn test_non_standard_setting_falls_back_to_largest_index() {
        let ops = vec![SymOp::parse("y,x,-z").unwrap()];
        let sg = SpaceGroup::from_ops(0, "P 1 1 2 (skewed)", "2", ops).unwrap();
        assert_eq!(sg.laue_class(), LaueClass::Unclassified);

        let mapping = to_asu(&MillerIndex::new(1, 2, 3), &sg);
        assert_eq!(mapping.hkl, MillerIndex::new(2, 1, -3));
        assert_eq!(mapping.isym, 3);

        let again = to_asu(&mapping.hkl, &sg);
        assert_eq!(again.hkl, mapping.hkl);
        assert_eq!(again.isym, 1);
    }
}
