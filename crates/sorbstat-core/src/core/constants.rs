//! Physical constants and unit conversions shared by the averaging code.
//!
//! Energies inside the simulation are carried in Kelvin (E/kB), lengths in
//! Angstrom and masses in g/mol; the factors below convert the averaged
//! fluctuations into laboratory units.

/// Boltzmann constant in J/K.
pub const KB: f64 = 1.3806503e-23;
/// Avogadro's number in 1/mol.
pub const AVOGADRO: f64 = 6.0221415e23;
/// Pascals per atmosphere.
pub const ATM_TO_PASCALS: f64 = 101325.0;
/// Angstroms per meter.
pub const METER_TO_ANGSTROM: f64 = 1.0e10;
/// Cubic centimetres per cubic Angstrom.
pub const A3_TO_CM3: f64 = 1.0e-24;
/// Pressure in atm to reduced units (K/A^3).
pub const ATM_TO_REDUCED: f64 = 0.0073389366;

/// Converts an energy expressed in Kelvin per particle to kJ/mol.
pub const KELVIN_TO_KJ_PER_MOL: f64 = KB * AVOGADRO / 1000.0;
