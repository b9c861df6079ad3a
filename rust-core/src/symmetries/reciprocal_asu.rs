use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::miller::MillerIndex;
use crate::symmetries::space_groups::SpaceGroup;

/// Unique axis of a monoclinic group
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UniqueAxis {
    A,
    B,
    C,
}

/// The eleven Laue classes (with the two -3m orientations kept apart).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LaueClass {
    Bar1,
    TwoOverM(UniqueAxis),
    Mmm,
    FourOverM,
    FourOverMmm,
    Bar3,
    Bar3M1,
    Bar31M,
    SixOverM,
    SixOverMmm,
    MBar3,
    MBar3M,
    /// Operators in a non-standard setting; no tabulated ASU applies
    Unclassified,
}

impl LaueClass {
    /// Identify the Laue class from the distinct rotation matrices of a group.
    pub fn classify(rotations: &[Matrix3<i32>]) -> LaueClass {
        // Proper parts of the rotations; inversion does not change the Laue class
        let mut proper: Vec<Matrix3<i32>> = Vec::new();
        for r in rotations {
            let p = if determinant(r) < 0 { -r } else { *r };
            if !proper.contains(&p) {
                proper.push(p);
            }
        }

        // c is the unique axis when no rotation mixes it with a or b
        let c_unique = proper.iter().all(|r| {
            r[(0, 2)] == 0 && r[(1, 2)] == 0 && r[(2, 0)] == 0 && r[(2, 1)] == 0
        });
        let has_trace = |t: i32| proper.iter().any(|r| r.trace() == t);
        let all_diagonal = proper
            .iter()
            .all(|r| r == &Matrix3::from_diagonal(&r.diagonal()));

        match proper.len() {
            1 => LaueClass::Bar1,
            2 => {
                let two_fold = proper.iter().find(|r| **r != Matrix3::identity());
                match two_fold.map(|r| (r[(0, 0)], r[(1, 1)], r[(2, 2)], all_diagonal)) {
                    Some((1, -1, -1, true)) => LaueClass::TwoOverM(UniqueAxis::A),
                    Some((-1, 1, -1, true)) => LaueClass::TwoOverM(UniqueAxis::B),
                    Some((-1, -1, 1, true)) => LaueClass::TwoOverM(UniqueAxis::C),
                    _ => LaueClass::Unclassified,
                }
            }
            3 if c_unique => LaueClass::Bar3,
            4 if c_unique && has_trace(1) => LaueClass::FourOverM,
            4 if all_diagonal => LaueClass::Mmm,
            6 if c_unique && has_trace(2) => LaueClass::SixOverM,
            6 if c_unique => {
                // -31m has a two-fold relating (h,0,l) and (h,0,-l); -3m1 does not
                let sample = MillerIndex::new(1, 0, 1);
                let flipped = MillerIndex::new(1, 0, -1);
                if proper
                    .iter()
                    .any(|r| r.transpose() * sample == flipped || r.transpose() * sample == -flipped)
                {
                    LaueClass::Bar31M
                } else {
                    LaueClass::Bar3M1
                }
            }
            8 if c_unique => LaueClass::FourOverMmm,
            12 if c_unique && has_trace(2) => LaueClass::SixOverMmm,
            12 if !has_trace(2) => LaueClass::MBar3,
            24 => LaueClass::MBar3M,
            _ => LaueClass::Unclassified,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            LaueClass::Bar1 => "-1",
            LaueClass::TwoOverM(_) => "2/m",
            LaueClass::Mmm => "mmm",
            LaueClass::FourOverM => "4/m",
            LaueClass::FourOverMmm => "4/mmm",
            LaueClass::Bar3 => "-3",
            LaueClass::Bar3M1 => "-3m1",
            LaueClass::Bar31M => "-31m",
            LaueClass::SixOverM => "6/m",
            LaueClass::SixOverMmm => "6/mmm",
            LaueClass::MBar3 => "m-3",
            LaueClass::MBar3M => "m-3m",
            LaueClass::Unclassified => "?",
        }
    }
}

/// Reciprocal-space asymmetric unit in the CCP4 convention.
///
/// Exactly one member of every orbit under the Laue group lies inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReciprocalAsu {
    laue: LaueClass,
}

impl ReciprocalAsu {
    pub fn new(spacegroup: &SpaceGroup) -> Self {
        Self {
            laue: spacegroup.laue_class(),
        }
    }

    pub fn from_laue_class(laue: LaueClass) -> Self {
        Self { laue }
    }

    pub fn laue_class(&self) -> LaueClass {
        self.laue
    }

    /// Whether a tabulated ASU exists for this group's setting
    pub fn is_tabulated(&self) -> bool {
        self.laue != LaueClass::Unclassified
    }

    /// Test ASU membership. Always false for unclassified settings.
    pub fn is_in(&self, hkl: &MillerIndex) -> bool {
        let (h, k, l) = (hkl.x, hkl.y, hkl.z);
        match self.laue {
            LaueClass::Bar1 => l > 0 || (l == 0 && (h > 0 || (h == 0 && k >= 0))),
            LaueClass::TwoOverM(UniqueAxis::A) => h >= 0 && (k > 0 || (k == 0 && l >= 0)),
            LaueClass::TwoOverM(UniqueAxis::B) => k >= 0 && (l > 0 || (l == 0 && h >= 0)),
            LaueClass::TwoOverM(UniqueAxis::C) => l >= 0 && (h > 0 || (h == 0 && k >= 0)),
            LaueClass::Mmm => h >= 0 && k >= 0 && l >= 0,
            LaueClass::FourOverM | LaueClass::SixOverM => {
                l >= 0 && ((h >= 0 && k > 0) || (h == 0 && k == 0))
            }
            LaueClass::FourOverMmm | LaueClass::SixOverMmm => h >= k && k >= 0 && l >= 0,
            LaueClass::Bar3 => (h >= 0 && k > 0) || (h == 0 && k == 0 && l >= 0),
            LaueClass::Bar3M1 => h >= k && k >= 0 && (h > k || l >= 0),
            LaueClass::Bar31M => h >= k && k >= 0 && (k > 0 || l >= 0),
            LaueClass::MBar3 => h >= 0 && ((l >= h && k > h) || (l == h && k == h)),
            LaueClass::MBar3M => k >= l && l >= h && h >= 0,
            LaueClass::Unclassified => false,
        }
    }
}

fn determinant(r: &Matrix3<i32>) -> i32 {
    r[(0, 0)] * (r[(1, 1)] * r[(2, 2)] - r[(1, 2)] * r[(2, 1)])
        - r[(0, 1)] * (r[(1, 0)] * r[(2, 2)] - r[(1, 2)] * r[(2, 0)])
        + r[(0, 2)] * (r[(1, 0)] * r[(2, 1)] - r[(1, 1)] * r[(2, 0)])
}
