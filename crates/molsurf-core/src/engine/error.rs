use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::ids::{GroupId, MoleculeId};
use crate::core::models::molecule::MoleculeError;
use crate::core::surface::SurfaceError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Ring perception has not been run for molecule '{molecule}'")]
    TopologyNotPerceived { molecule: String },

    #[error("Molecule not found in scene: {0:?}")]
    MoleculeNotFound(MoleculeId),

    #[error("Group not found in scene: {0:?}")]
    GroupNotFound(GroupId),

    #[error("The root group cannot be {0}")]
    RootGroup(&'static str),

    #[error("Surface generation failed: {source}")]
    Surface {
        #[from]
        source: SurfaceError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid molecule edit: {source}")]
    Molecule {
        #[from]
        source: MoleculeError,
    },
}
