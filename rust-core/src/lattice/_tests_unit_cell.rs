#[cfg(test)]
mod _tests_unit_cell {
    use super::super::unit_cell::UnitCell;
    use crate::error::Error;
    use crate::miller::MillerIndex;
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    const TOL: f64 = 1e-10;

    #[test]
    fn test_cubic_volume_and_metric() {
        let cell = UnitCell::new(10.0, 10.0, 10.0, 90.0, 90.0, 90.0);
        assert!(cell.is_crystal());
        assert_relative_eq!(cell.volume(), 1000.0, epsilon = 1e-9);

        let g = cell.metric_tensor().unwrap();
        assert_relative_eq!(g, Matrix3::from_diagonal_element(100.0), epsilon = 1e-9);

        let d = cell.d_spacing(&MillerIndex::new(1, 0, 0)).unwrap();
        assert_relative_eq!(d, 10.0, epsilon = TOL);
        let d = cell.d_spacing(&MillerIndex::new(1, 1, 1)).unwrap();
        assert_relative_eq!(d, 10.0 / 3.0_f64.sqrt(), epsilon = TOL);
    }

    #[test]
    fn test_tetragonal_d_spacing() {
        let cell = UnitCell::new(79.3, 79.3, 37.8, 90.0, 90.0, 90.0);
        let hkl = MillerIndex::new(1, 2, 3);
        let expected = 1.0 / ((1.0_f64 + 4.0) / (79.3 * 79.3) + 9.0 / (37.8 * 37.8)).sqrt();
        let d = cell.d_spacing(&hkl).unwrap();
        assert_relative_eq!(d, expected, max_relative = 1e-6);
    }

    #[test]
    fn test_hexagonal_d_spacing() {
        let (a, c) = (50.0, 120.0);
        let cell = UnitCell::new(a, a, c, 90.0, 90.0, 120.0);
        let hkl = MillerIndex::new(2, 1, 4);
        let inv_d2 = 4.0 / 3.0 * (4.0 + 2.0 + 1.0) / (a * a) + 16.0 / (c * c);
        assert_relative_eq!(cell.one_over_d2(&hkl).unwrap(), inv_d2, max_relative = 1e-9);
    }

    #[test]
    fn test_monoclinic_d_spacing() {
        let (a, b, c, beta) = (40.0_f64, 55.0_f64, 70.0_f64, 105.0_f64);
        let cell = UnitCell::new(a, b, c, 90.0, beta, 90.0);
        let (h, k, l) = (2.0, -3.0, 1.0);
        let (sb, cb) = (beta.to_radians().sin(), beta.to_radians().cos());
        let inv_d2 = (h * h / (a * a) + k * k * sb * sb / (b * b) + l * l / (c * c)
            - 2.0 * h * l * cb / (a * c))
            / (sb * sb);
        let got = cell.one_over_d2(&MillerIndex::new(2, -3, 1)).unwrap();
        assert_relative_eq!(got, inv_d2, max_relative = 1e-9);
    }

    #[test]
    fn test_triclinic_metric_consistency() {
        let cell = UnitCell::new(30.0, 40.0, 50.0, 80.0, 95.0, 110.0);
        let g = cell.metric_tensor().unwrap();
        assert_relative_eq!(g[(0, 0)], 900.0, epsilon = 1e-8);
        assert_relative_eq!(g[(1, 1)], 1600.0, epsilon = 1e-8);
        assert_relative_eq!(g[(2, 2)], 2500.0, epsilon = 1e-8);
        assert_relative_eq!(g[(0, 1)], 1200.0 * 110.0_f64.to_radians().cos(), epsilon = 1e-8);
        assert_relative_eq!(g[(1, 2)], 2000.0 * 80.0_f64.to_radians().cos(), epsilon = 1e-8);

        let product = g * cell.reciprocal_metric_tensor().unwrap();
        assert_relative_eq!(product, Matrix3::identity(), epsilon = 1e-9);

        // det G = V²
        assert_relative_eq!(g.determinant(), cell.volume().powi(2), max_relative = 1e-9);

        let ortho = cell.orthogonalization_matrix().unwrap();
        let frac = cell.fractionalization_matrix().unwrap();
        assert_relative_eq!(ortho * frac, Matrix3::identity(), epsilon = 1e-9);
    }

    #[test]
    fn test_reciprocal_cell() {
        let cell = UnitCell::new(20.0, 25.0, 40.0, 90.0, 90.0, 90.0);
        let recip = cell.reciprocal().unwrap();
        assert_relative_eq!(recip.a, 0.05, epsilon = TOL);
        assert_relative_eq!(recip.b, 0.04, epsilon = TOL);
        assert_relative_eq!(recip.c, 0.025, epsilon = TOL);
        assert_relative_eq!(recip.gamma, 90.0, epsilon = 1e-8);
    }

    #[test]
    fn test_batched_d_spacings_match_single() {
        let cell = UnitCell::new(30.0, 40.0, 50.0, 80.0, 95.0, 110.0);
        let hkls = vec![
            MillerIndex::new(1, 0, 0),
            MillerIndex::new(-2, 3, 1),
            MillerIndex::new(4, 4, -4),
        ];
        let batch = cell.d_spacings(&hkls).unwrap();
        for (hkl, d) in hkls.iter().zip(batch) {
            assert_relative_eq!(d, cell.d_spacing(hkl).unwrap(), epsilon = TOL);
        }
    }

    #[test]
    fn test_degenerate_cells() {
        let flat = UnitCell::new(10.0, 10.0, 0.0, 90.0, 90.0, 90.0);
        assert!(!flat.is_crystal());
        assert!(matches!(
            flat.d_spacing(&MillerIndex::new(1, 0, 0)),
            Err(Error::DegenerateCell { .. })
        ));

        // Angles that cannot close a parallelepiped
        let impossible = UnitCell::new(10.0, 10.0, 10.0, 170.0, 170.0, 170.0);
        assert_eq!(impossible.volume(), 0.0);
        assert!(impossible.validate().is_err());

        let nan = UnitCell::new(f64::NAN, 10.0, 10.0, 90.0, 90.0, 90.0);
        assert!(!nan.is_crystal());
    }

    #[test]
    fn test_parameters_and_display() {
        let cell = UnitCell::from_parameters([79.3, 79.3, 37.8, 90.0, 90.0, 90.0]);
        assert_eq!(cell.parameters(), [79.3, 79.3, 37.8, 90.0, 90.0, 90.0]);
        assert_eq!(
            format!("{}", cell),
            "(79.3000, 79.3000, 37.8000, 90.000, 90.000, 90.000)"
        );
        assert!(UnitCell::default().is_crystal());
    }
}
