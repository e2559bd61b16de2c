use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Potential energy broken down by interaction type, in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnergyTerm {
    pub lennard_jones: f64,
    pub morse: f64,
    pub coulomb: f64,
    pub van_der_waals: f64,
    pub hydrogen_bond: f64,
}

impl EnergyTerm {
    #[inline]
    pub fn total(&self) -> f64 {
        self.lennard_jones + self.morse + self.coulomb + self.van_der_waals + self.hydrogen_bond
    }
}

impl Add for EnergyTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            lennard_jones: self.lennard_jones + rhs.lennard_jones,
            morse: self.morse + rhs.morse,
            coulomb: self.coulomb + rhs.coulomb,
            van_der_waals: self.van_der_waals + rhs.van_der_waals,
            hydrogen_bond: self.hydrogen_bond + rhs.hydrogen_bond,
        }
    }
}

impl AddAssign for EnergyTerm {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(values: [f64; 5]) -> EnergyTerm {
        EnergyTerm {
            lennard_jones: values[0],
            morse: values[1],
            coulomb: values[2],
            van_der_waals: values[3],
            hydrogen_bond: values[4],
        }
    }

    #[test]
    fn total_returns_sum_of_all_terms() {
        assert_eq!(term([1.5, -2.0, 0.5, 1.0, -1.0]).total(), 0.0);
    }

    #[test]
    fn add_sums_each_field_correctly() {
        let result = term([1.0, 2.0, 3.0, 4.0, 5.0]) + term([5.0, 4.0, 3.0, 2.0, 1.0]);
        assert_eq!(result, term([6.0; 5]));
    }

    #[test]
    fn add_assign_accumulates_each_field_correctly() {
        let mut a = term([1.0, 2.0, 3.0, 4.0, 5.0]);
        a += term([1.0; 5]);
        assert_eq!(a, term([2.0, 3.0, 4.0, 5.0, 6.0]));
    }

    #[test]
    fn default_initializes_all_fields_to_zero() {
        assert_eq!(EnergyTerm::default(), term([0.0; 5]));
    }
}
