use phf::{Map, phf_map};
use thiserror::Error;

/// Display color used for elements without an assigned color.
pub const DEFAULT_COLOR: u32 = 0x888888;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ElementError {
    #[error("Unknown element symbol: '{0}'")]
    Unknown(String),
}

/// Static physical and chemical constants for a chemical element.
///
/// Distances are in Angstroms, masses in atomic mass units, and energies in kcal/mol.
/// The Lennard-Jones and Morse values are per-atom parameters that are combined pairwise
/// by the force field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    pub symbol: &'static str,
    pub atomic_number: u8,
    pub mass: f64,
    pub covalent_radius: f64,
    pub vdw_radius: f64,
    /// Pauling electronegativity; zero for the noble gases.
    pub electronegativity: f64,
    pub max_bonds: u8,
    pub lj_epsilon: f64,
    pub lj_sigma: f64,
    pub morse_well_depth: f64,
    pub morse_width: f64,
    pub color: u32,
}

impl ElementData {
    /// Per-atom Morse equilibrium distance. Averaging two of these gives the sum of the
    /// covalent radii.
    pub fn morse_equilibrium(&self) -> f64 {
        2.0 * self.covalent_radius
    }

    pub fn is_noble_gas(&self) -> bool {
        self.max_bonds == 0
    }
}

macro_rules! element {
    ($sym:literal, $z:literal, $mass:literal, $cov:literal, $vdw:literal, $en:literal, $bonds:literal,
     $eps:literal, $sigma:literal, $de:literal, $alpha:literal, $color:expr) => {
        ElementData {
            symbol: $sym,
            atomic_number: $z,
            mass: $mass,
            covalent_radius: $cov,
            vdw_radius: $vdw,
            electronegativity: $en,
            max_bonds: $bonds,
            lj_epsilon: $eps,
            lj_sigma: $sigma,
            morse_well_depth: $de,
            morse_width: $alpha,
            color: $color,
        }
    };
}

#[rustfmt::skip]
static ELEMENTS: Map<&'static str, ElementData> = phf_map! {
    //           sym   Z   mass     cov   vdw   EN    bonds eps    sigma  De     alpha color
    "H"  => element!("H",  1,  1.008,  0.31, 1.20, 2.20, 1, 0.044, 2.571, 104.2, 1.94, 0xffffff),
    "He" => element!("He", 2,  4.0026, 0.28, 1.40, 0.00, 0, 0.056, 2.104, 0.0,   1.00, DEFAULT_COLOR),
    "C"  => element!("C",  6,  12.011, 0.76, 1.70, 2.55, 4, 0.105, 3.431, 83.1,  1.87, 0x404040),
    "N"  => element!("N",  7,  14.007, 0.71, 1.55, 3.04, 3, 0.069, 3.261, 73.0,  2.05, 0x0000ff),
    "O"  => element!("O",  8,  15.999, 0.66, 1.52, 3.44, 2, 0.060, 3.118, 88.0,  2.22, 0xff0000),
    "F"  => element!("F",  9,  18.998, 0.57, 1.47, 3.98, 1, 0.050, 2.997, 37.0,  2.40, DEFAULT_COLOR),
    "Ne" => element!("Ne", 10, 20.180, 0.58, 1.54, 0.00, 0, 0.042, 2.889, 0.0,   1.00, DEFAULT_COLOR),
    "Na" => element!("Na", 11, 22.990, 1.66, 2.27, 0.93, 1, 0.030, 2.658, 17.3,  0.84, DEFAULT_COLOR),
    "Mg" => element!("Mg", 12, 24.305, 1.41, 1.73, 1.31, 2, 0.111, 2.691, 11.0,  1.00, 0x90ee90),
    "P"  => element!("P",  15, 30.974, 1.07, 1.80, 2.19, 5, 0.305, 3.695, 51.0,  1.60, 0xff8000),
    "S"  => element!("S",  16, 32.06,  1.05, 1.80, 2.58, 6, 0.274, 3.595, 63.0,  1.65, 0xffff00),
    "Cl" => element!("Cl", 17, 35.45,  1.02, 1.75, 3.16, 1, 0.227, 3.516, 58.0,  1.87, 0x00ff00),
    "Ar" => element!("Ar", 18, 39.948, 1.06, 1.88, 0.00, 0, 0.185, 3.446, 0.0,   1.00, DEFAULT_COLOR),
    "K"  => element!("K",  19, 39.098, 2.03, 2.75, 0.82, 1, 0.035, 3.396, 13.0,  0.70, DEFAULT_COLOR),
    "Ca" => element!("Ca", 20, 40.078, 1.76, 2.31, 1.00, 2, 0.238, 3.028, 10.0,  0.90, 0x808080),
    "Fe" => element!("Fe", 26, 55.845, 1.32, 2.04, 1.83, 6, 0.013, 2.594, 24.0,  1.30, 0x8b4513),
};

/// Looks up the constants for an element symbol (case-sensitive, e.g. `"Cl"`).
///
/// # Errors
///
/// Returns [`ElementError::Unknown`] if the symbol is not in the table.
pub fn lookup(symbol: &str) -> Result<&'static ElementData, ElementError> {
    ELEMENTS
        .get(symbol)
        .ok_or_else(|| ElementError::Unknown(symbol.to_string()))
}

pub fn is_known(symbol: &str) -> bool {
    ELEMENTS.contains_key(symbol)
}

/// Returns all known element symbols in ascending atomic-number order.
pub fn symbols() -> Vec<&'static str> {
    let mut data: Vec<&ElementData> = ELEMENTS.values().collect();
    data.sort_by_key(|d| d.atomic_number);
    data.into_iter().map(|d| d.symbol).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_constants_for_known_symbol() {
        let oxygen = lookup("O").unwrap();
        assert_eq!(oxygen.symbol, "O");
        assert_eq!(oxygen.atomic_number, 8);
        assert_eq!(oxygen.max_bonds, 2);
        assert_eq!(oxygen.color, 0xff0000);
    }

    #[test]
    fn lookup_is_case_sensitive_and_rejects_unknown_symbols() {
        assert_eq!(lookup("Xx"), Err(ElementError::Unknown("Xx".to_string())));
        assert!(lookup("cl").is_err());
        assert!(lookup("Cl").is_ok());
    }

    #[test]
    fn table_keys_match_symbols() {
        for symbol in symbols() {
            assert_eq!(lookup(symbol).unwrap().symbol, symbol);
        }
    }

    #[test]
    fn symbols_are_sorted_by_atomic_number() {
        let all = symbols();
        assert_eq!(all.first(), Some(&"H"));
        assert_eq!(all.last(), Some(&"Fe"));
        assert_eq!(all.len(), 16);
    }

    #[test]
    fn noble_gases_cannot_bond() {
        for symbol in ["He", "Ne", "Ar"] {
            assert!(lookup(symbol).unwrap().is_noble_gas());
        }
        assert!(!lookup("C").unwrap().is_noble_gas());
    }

    #[test]
    fn morse_equilibrium_is_twice_the_covalent_radius() {
        let carbon = lookup("C").unwrap();
        assert!((carbon.morse_equilibrium() - 1.52).abs() < 1e-12);
    }
}
