use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LennardJonesSettings {
    pub enabled: bool,
    pub strength: f64,
    /// Distance beyond which the potential is zero, in Angstroms.
    pub cutoff: f64,
}

impl Default for LennardJonesSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 1.0,
            cutoff: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MorseSettings {
    pub enabled: bool,
    pub strength: f64,
}

impl Default for MorseSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CoulombSettings {
    pub enabled: bool,
    pub strength: f64,
    pub dielectric: f64,
    pub cutoff: f64,
}

impl Default for CoulombSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 1.0,
            dielectric: 1.0,
            cutoff: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct VanDerWaalsSettings {
    pub enabled: bool,
    pub strength: f64,
    /// Active range as a multiple of the pair's covalent contact distance.
    pub range_factor: f64,
}

impl Default for VanDerWaalsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 0.5,
            range_factor: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct HydrogenBondSettings {
    pub enabled: bool,
    pub strength: f64,
    pub max_distance: f64,
    /// Exponential decay rate in inverse Angstroms.
    pub decay: f64,
}

impl Default for HydrogenBondSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 0.3,
            max_distance: 3.5,
            decay: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ThermalSettings {
    pub enabled: bool,
    /// Amplitude of the per-axis random force at the reference temperature.
    pub strength: f64,
    /// Global temperature in Kelvin; newly added atoms start at this temperature.
    pub temperature: f64,
    pub reference_temperature: f64,
}

impl Default for ThermalSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 0.01,
            temperature: 300.0,
            reference_temperature: 300.0,
        }
    }
}

/// Enable flags, strength multipliers, and ranges of every interaction term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ForceSettings {
    pub lennard_jones: LennardJonesSettings,
    pub morse: MorseSettings,
    pub coulomb: CoulombSettings,
    pub van_der_waals: VanDerWaalsSettings,
    pub hydrogen_bond: HydrogenBondSettings,
    pub thermal: ThermalSettings,
    /// Upper bound on the magnitude of the total force within one pair.
    pub max_pair_force: f64,
}

impl Default for ForceSettings {
    fn default() -> Self {
        Self {
            lennard_jones: LennardJonesSettings::default(),
            morse: MorseSettings::default(),
            coulomb: CoulombSettings::default(),
            van_der_waals: VanDerWaalsSettings::default(),
            hydrogen_bond: HydrogenBondSettings::default(),
            thermal: ThermalSettings::default(),
            max_pair_force: 500.0,
        }
    }
}

impl ForceSettings {
    /// Settings with every term switched off.
    pub fn disabled() -> Self {
        let mut settings = Self::default();
        settings.lennard_jones.enabled = false;
        settings.morse.enabled = false;
        settings.coulomb.enabled = false;
        settings.van_der_waals.enabled = false;
        settings.hydrogen_bond.enabled = false;
        settings.thermal.enabled = false;
        settings
    }

    pub fn any_pairwise_enabled(&self) -> bool {
        self.lennard_jones.enabled
            || self.morse.enabled
            || self.coulomb.enabled
            || self.van_der_waals.enabled
            || self.hydrogen_bond.enabled
    }

    /// Largest distance at which any enabled pairwise term can be non-zero.
    ///
    /// # Arguments
    ///
    /// * `max_covalent_radius` - Largest covalent radius present, which bounds the van der
    ///   Waals range and the Morse equilibrium of bonded pairs.
    pub fn interaction_range(&self, max_covalent_radius: f64) -> f64 {
        let mut range: f64 = 0.0;
        if self.lennard_jones.enabled {
            range = range.max(self.lennard_jones.cutoff);
        }
        if self.coulomb.enabled {
            range = range.max(self.coulomb.cutoff);
        }
        if self.van_der_waals.enabled {
            range = range.max(self.van_der_waals.range_factor * 2.0 * max_covalent_radius);
        }
        if self.hydrogen_bond.enabled {
            range = range.max(self.hydrogen_bond.max_distance);
        }
        range
    }
}
