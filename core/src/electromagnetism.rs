//! Electromagnetic unit table.
//!
//! Units are declared in `scripts/electromagnetism.units` as symbolic
//! assignments over the SI base symbols `kg`, `m`, `s` and `A`. Loading the
//! script into a [`Session`] leaves every unit simplified to its base-unit
//! formula, together with the vacuum constants `c`, `mu0`, `epsilon0` and `Z0`.
//!
//! `Ohm` is declared twice. The second definition reaches the same formula
//! through `W/A^2`; lookups after loading see the second one.

use crate::session::{ScriptError, Session};

pub const SCRIPT: &str = include_str!("../scripts/electromagnetism.units");

/// Speed of light in vacuum in m/s, as written in the script
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Vacuum permeability 4π×10⁻⁷ in H/m, as written in the script
pub const VACUUM_PERMEABILITY: f64 = 4.0 * std::f64::consts::PI * 1e-7;

/// Fresh session with the unit table loaded
pub fn load() -> Result<Session, ScriptError> {
    let mut session = Session::new();
    load_into(&mut session)?;
    Ok(session)
}

/// Run the unit table into an existing session
pub fn load_into(session: &mut Session) -> Result<usize, ScriptError> {
    session.run_script(SCRIPT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::monomial::DEFAULT_TOLERANCE;
    use crate::units::Dimension;

    #[test]
    fn test_script_loads() {
        let session = load().unwrap();
        for name in ["kg", "V", "F", "u_E", "u_B", "c", "mu0", "epsilon0", "Z0"] {
            assert!(session.value(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_field_units() {
        let session = load().unwrap();
        // V/m = kg m s^-3 A^-1
        assert_eq!(
            session.dimension_of("u_E").unwrap(),
            Dimension::new(1, 1, -3, -1)
        );
        // F = s^4 A^2 kg^-1 m^-2
        assert_eq!(
            session.dimension_of("F").unwrap(),
            Dimension::new(-1, -2, 4, 2)
        );
        assert_eq!(
            session.dimension_of("u_B").unwrap(),
            Dimension::new(1, 0, -2, -1)
        );
        assert_eq!(session.dimension_of("u_H").unwrap(), Dimension::new(0, -1, 0, 1));
    }

    #[test]
    fn test_speed_of_light_in_m_per_s() {
        let session = load().unwrap();
        let c = session.express_in("c", "m/s").unwrap();
        assert_eq!(c, SPEED_OF_LIGHT);
    }

    #[test]
    fn test_permeability_in_h_per_m() {
        let session = load().unwrap();
        let mu0 = session.express_in("mu0", "H/m").unwrap();
        assert!((mu0 - VACUUM_PERMEABILITY).abs() < 1e-20);
    }

    #[test]
    fn test_permittivity_value() {
        let session = load().unwrap();
        let eps0 = session.express_in("epsilon0", "F/m").unwrap();
        assert!((eps0 - 8.8541878e-12).abs() < 1e-18);
        let expected = 1.0 / (VACUUM_PERMEABILITY * SPEED_OF_LIGHT * SPEED_OF_LIGHT);
        assert!((eps0 - expected).abs() / expected < DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_free_space_impedance() {
        let session = load().unwrap();
        let z0 = session.express_in("Z0", "Ohm").unwrap();
        assert!((z0 - 376.730313).abs() < 1e-5);
    }
}
