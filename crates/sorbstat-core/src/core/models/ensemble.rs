use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Statistical ensemble the simulation samples.
///
/// Only [`Ensemble::Npt`] changes how the averaging engine behaves (volume
/// fluctuations instead of particle-number fluctuations for the
/// compressibility); the remaining variants are carried so the parameter set
/// describes the run faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ensemble {
    Nvt,
    Uvt,
    Nve,
    Npt,
    NvtGibbs,
    PathIntegralNvt,
    Replay,
    TotalEnergy,
    Surface,
    SurfaceFit,
}

impl Ensemble {
    /// Whether the cell volume is a sampled degree of freedom.
    pub fn is_isobaric(self) -> bool {
        matches!(self, Ensemble::Npt)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown ensemble '{0}'")]
pub struct ParseEnsembleError(pub String);

impl FromStr for Ensemble {
    type Err = ParseEnsembleError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nvt" => Ok(Ensemble::Nvt),
            "uvt" => Ok(Ensemble::Uvt),
            "nve" => Ok(Ensemble::Nve),
            "npt" => Ok(Ensemble::Npt),
            "nvt_gibbs" => Ok(Ensemble::NvtGibbs),
            "pi_nvt" => Ok(Ensemble::PathIntegralNvt),
            "replay" => Ok(Ensemble::Replay),
            "te" => Ok(Ensemble::TotalEnergy),
            "surf" => Ok(Ensemble::Surface),
            "surf_fit" => Ok(Ensemble::SurfaceFit),
            other => Err(ParseEnsembleError(other.to_string())),
        }
    }
}

impl fmt::Display for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Ensemble::Nvt => "nvt",
                Ensemble::Uvt => "uvt",
                Ensemble::Nve => "nve",
                Ensemble::Npt => "npt",
                Ensemble::NvtGibbs => "nvt_gibbs",
                Ensemble::PathIntegralNvt => "pi_nvt",
                Ensemble::Replay => "replay",
                Ensemble::TotalEnergy => "te",
                Ensemble::Surface => "surf",
                Ensemble::SurfaceFit => "surf_fit",
            }
        )
    }
}

impl TryFrom<String> for Ensemble {
    type Error = ParseEnsembleError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ensemble> for String {
    fn from(value: Ensemble) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_parses_all_known_names_case_insensitively() {
        assert_eq!("NVT".parse::<Ensemble>(), Ok(Ensemble::Nvt));
        assert_eq!("uvt".parse::<Ensemble>(), Ok(Ensemble::Uvt));
        assert_eq!(" npt ".parse::<Ensemble>(), Ok(Ensemble::Npt));
        assert_eq!("nvt_gibbs".parse::<Ensemble>(), Ok(Ensemble::NvtGibbs));
        assert_eq!("pi_nvt".parse::<Ensemble>(), Ok(Ensemble::PathIntegralNvt));
        assert_eq!("surf_fit".parse::<Ensemble>(), Ok(Ensemble::SurfaceFit));
    }

    #[test]
    fn from_str_rejects_unknown_names() {
        assert_eq!(
            "grand".parse::<Ensemble>(),
            Err(ParseEnsembleError("grand".to_string()))
        );
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for ensemble in [
            Ensemble::Nvt,
            Ensemble::Uvt,
            Ensemble::Nve,
            Ensemble::Npt,
            Ensemble::NvtGibbs,
            Ensemble::PathIntegralNvt,
            Ensemble::Replay,
            Ensemble::TotalEnergy,
            Ensemble::Surface,
            Ensemble::SurfaceFit,
        ] {
            assert_eq!(ensemble.to_string().parse::<Ensemble>(), Ok(ensemble));
        }
    }

    #[test]
    fn only_npt_is_isobaric() {
        assert!(Ensemble::Npt.is_isobaric());
        assert!(!Ensemble::Nvt.is_isobaric());
        assert!(!Ensemble::Uvt.is_isobaric());
    }
}
