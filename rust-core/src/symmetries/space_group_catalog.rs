// Built-in space group table: standard settings (International Tables) given by generators.
// Covers the Sohncke groups common in macromolecular crystallography plus a few
// centrosymmetric groups. Rhombohedral groups use hexagonal axes.

/// One catalog row
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub number: u16,
    pub hm: &'static str,
    pub aliases: &'static [&'static str],
    pub point_group: &'static str,
    pub generators: &'static [&'static str],
}

impl CatalogEntry {
    /// Lattice letter, the first character of the symbol
    pub fn centering(&self) -> char {
        self.hm.chars().next().unwrap_or('P')
    }
}

const fn entry(
    number: u16,
    hm: &'static str,
    aliases: &'static [&'static str],
    point_group: &'static str,
    generators: &'static [&'static str],
) -> CatalogEntry {
    CatalogEntry {
        number,
        hm,
        aliases,
        point_group,
        generators,
    }
}

// Shared generator sets
const G_222: &[&str] = &["-x,-y,z", "-x,y,-z"];
const G_212121: &[&str] = &["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2"];
const G_422: &[&str] = &["-y,x,z", "-x,y,-z"];
const G_23: &[&str] = &["-x,-y,z", "-x,y,-z", "z,x,y"];
const G_213: &[&str] = &["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2", "z,x,y"];
const G_432: &[&str] = &["-x,-y,z", "-x,y,-z", "z,x,y", "y,x,-z"];

pub static CATALOG: &[CatalogEntry] = &[
    // ======================== TRICLINIC ========================
    entry(1, "P 1", &[], "1", &[]),
    entry(2, "P -1", &[], "-1", &["-x,-y,-z"]),
    // ======================== MONOCLINIC (b unique) ========================
    entry(3, "P 1 2 1", &["P 2"], "2", &["-x,y,-z"]),
    entry(4, "P 1 21 1", &["P 21"], "2", &["-x,y+1/2,-z"]),
    entry(5, "C 1 2 1", &["C 2"], "2", &["-x,y,-z"]),
    entry(14, "P 1 21/c 1", &["P 21/c"], "2/m", &["-x,y+1/2,-z+1/2", "-x,-y,-z"]),
    entry(15, "C 1 2/c 1", &["C 2/c"], "2/m", &["-x,y,-z+1/2", "-x,-y,-z"]),
    // ======================== ORTHORHOMBIC ========================
    entry(16, "P 2 2 2", &[], "222", G_222),
    entry(17, "P 2 2 21", &[], "222", &["-x,-y,z+1/2", "-x,y,-z+1/2"]),
    entry(18, "P 21 21 2", &[], "222", &["-x,-y,z", "-x+1/2,y+1/2,-z"]),
    entry(19, "P 21 21 21", &[], "222", G_212121),
    entry(20, "C 2 2 21", &[], "222", &["-x,-y,z+1/2", "-x,y,-z+1/2"]),
    entry(21, "C 2 2 2", &[], "222", G_222),
    entry(22, "F 2 2 2", &[], "222", G_222),
    entry(23, "I 2 2 2", &[], "222", G_222),
    entry(24, "I 21 21 21", &[], "222", G_212121),
    entry(47, "P m m m", &["P 2/m 2/m 2/m"], "mmm", &["-x,-y,z", "-x,y,-z", "-x,-y,-z"]),
    // ======================== TETRAGONAL ========================
    entry(75, "P 4", &[], "4", &["-y,x,z"]),
    entry(76, "P 41", &[], "4", &["-y,x,z+1/4"]),
    entry(77, "P 42", &[], "4", &["-y,x,z+1/2"]),
    entry(78, "P 43", &[], "4", &["-y,x,z+3/4"]),
    entry(79, "I 4", &[], "4", &["-y,x,z"]),
    entry(80, "I 41", &[], "4", &["-y,x+1/2,z+1/4"]),
    entry(89, "P 4 2 2", &[], "422", G_422),
    entry(90, "P 4 21 2", &[], "422", &["-y+1/2,x+1/2,z", "-x+1/2,y+1/2,-z"]),
    entry(91, "P 41 2 2", &[], "422", &["-y,x,z+1/4", "-x,y,-z"]),
    entry(92, "P 41 21 2", &[], "422", &["-y+1/2,x+1/2,z+1/4", "-x+1/2,y+1/2,-z+1/4"]),
    entry(93, "P 42 2 2", &[], "422", &["-y,x,z+1/2", "-x,y,-z"]),
    entry(94, "P 42 21 2", &[], "422", &["-y+1/2,x+1/2,z+1/2", "-x+1/2,y+1/2,-z+1/2"]),
    entry(95, "P 43 2 2", &[], "422", &["-y,x,z+3/4", "-x,y,-z"]),
    entry(96, "P 43 21 2", &[], "422", &["-y+1/2,x+1/2,z+3/4", "-x+1/2,y+1/2,-z+3/4"]),
    entry(97, "I 4 2 2", &[], "422", G_422),
    entry(98, "I 41 2 2", &[], "422", &["-y,x+1/2,z+1/4", "-x+1/2,y,-z+3/4"]),
    // ======================== TRIGONAL ========================
    entry(143, "P 3", &[], "3", &["-y,x-y,z"]),
    entry(144, "P 31", &[], "3", &["-y,x-y,z+1/3"]),
    entry(145, "P 32", &[], "3", &["-y,x-y,z+2/3"]),
    entry(146, "R 3", &["H 3", "R 3:H"], "3", &["-y,x-y,z"]),
    entry(149, "P 3 1 2", &[], "312", &["-y,x-y,z", "-y,-x,-z"]),
    entry(150, "P 3 2 1", &[], "321", &["-y,x-y,z", "y,x,-z"]),
    entry(151, "P 31 1 2", &[], "312", &["-y,x-y,z+1/3", "-y,-x,-z+2/3"]),
    entry(152, "P 31 2 1", &[], "321", &["-y,x-y,z+1/3", "y,x,-z"]),
    entry(153, "P 32 1 2", &[], "312", &["-y,x-y,z+2/3", "-y,-x,-z+1/3"]),
    entry(154, "P 32 2 1", &[], "321", &["-y,x-y,z+2/3", "y,x,-z"]),
    entry(155, "R 3 2", &["H 3 2", "R 3 2:H"], "32", &["-y,x-y,z", "y,x,-z"]),
    // ======================== HEXAGONAL ========================
    entry(168, "P 6", &[], "6", &["x-y,x,z"]),
    entry(169, "P 61", &[], "6", &["x-y,x,z+1/6"]),
    entry(170, "P 65", &[], "6", &["x-y,x,z+5/6"]),
    entry(171, "P 62", &[], "6", &["x-y,x,z+1/3"]),
    entry(172, "P 64", &[], "6", &["x-y,x,z+2/3"]),
    entry(173, "P 63", &[], "6", &["x-y,x,z+1/2"]),
    entry(177, "P 6 2 2", &[], "622", &["x-y,x,z", "y,x,-z"]),
    entry(178, "P 61 2 2", &[], "622", &["x-y,x,z+1/6", "y,x,-z+1/3"]),
    entry(179, "P 65 2 2", &[], "622", &["x-y,x,z+5/6", "y,x,-z+2/3"]),
    entry(180, "P 62 2 2", &[], "622", &["x-y,x,z+1/3", "y,x,-z+2/3"]),
    entry(181, "P 64 2 2", &[], "622", &["x-y,x,z+2/3", "y,x,-z+1/3"]),
    entry(182, "P 63 2 2", &[], "622", &["x-y,x,z+1/2", "y,x,-z"]),
    // ======================== CUBIC ========================
    entry(195, "P 2 3", &[], "23", G_23),
    entry(196, "F 2 3", &[], "23", G_23),
    entry(197, "I 2 3", &[], "23", G_23),
    entry(198, "P 21 3", &[], "23", G_213),
    entry(199, "I 21 3", &[], "23", G_213),
    entry(207, "P 4 3 2", &[], "432", G_432),
    entry(208, "P 42 3 2", &[], "432", &["-x,-y,z", "-x,y,-z", "z,x,y", "y+1/2,x+1/2,-z+1/2"]),
    entry(209, "F 4 3 2", &[], "432", G_432),
    entry(211, "I 4 3 2", &[], "432", G_432),
    entry(
        212,
        "P 43 3 2",
        &[],
        "432",
        &["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2", "z,x,y", "y+1/4,x+3/4,-z+3/4"],
    ),
    entry(
        213,
        "P 41 3 2",
        &[],
        "432",
        &["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2", "z,x,y", "y+3/4,x+1/4,-z+1/4"],
    ),
    entry(
        214,
        "I 41 3 2",
        &[],
        "432",
        &["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2", "z,x,y", "y+3/4,x+1/4,-z+1/4"],
    ),
];

fn normalize(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Find a catalog entry by full symbol or alias, ignoring spacing and case
pub fn find_entry(symbol: &str) -> Option<&'static CatalogEntry> {
    let wanted = normalize(symbol);
    CATALOG.iter().find(|e| {
        normalize(e.hm) == wanted || e.aliases.iter().any(|a| normalize(a) == wanted)
    })
}
