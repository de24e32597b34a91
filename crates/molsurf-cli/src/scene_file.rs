//! TOML description of a scene: a group tree plus molecules with explicit
//! atoms and bonds.
//!
//! ```toml
//! [[groups]]
//! name = "site"
//!
//! [[molecules]]
//! name = "ligand"
//! role = "ligand"
//! group = "site"
//! translation = [0.0, 0.0, 5.0]
//! atoms = [
//!     { element = "C", position = [0.0, 0.0, 0.0] },
//!     { element = "O", charge = -1, position = [1.25, 0.0, 0.0] },
//! ]
//! bonds = [{ atoms = [0, 1], order = "double" }]
//! ```

use crate::error::{CliError, Result};
use molsurf::core::elements;
use molsurf::core::models::atom::Atom;
use molsurf::core::models::ids::GroupId;
use molsurf::core::models::molecule::Molecule;
use molsurf::core::models::topology::BondOrder;
use molsurf::engine::config::InteractionCriteria;
use molsurf::engine::eligibility::MoleculeRole;
use molsurf::workflows::scene::Scene;
use nalgebra::{Isometry3, Point3, Unit, Vector3};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct SceneFile {
    #[serde(default)]
    groups: Vec<GroupEntry>,
    #[serde(default)]
    molecules: Vec<MoleculeEntry>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct GroupEntry {
    name: String,
    /// Name of an earlier group; the root group when omitted.
    parent: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct MoleculeEntry {
    name: String,
    #[serde(default)]
    role: MoleculeRole,
    #[serde(default)]
    tag: i32,
    group: Option<String>,
    #[serde(default = "visible_by_default")]
    visible: bool,
    translation: Option<[f64; 3]>,
    rotation: Option<RotationEntry>,
    #[serde(default)]
    atoms: Vec<AtomEntry>,
    #[serde(default)]
    bonds: Vec<BondEntry>,
}

fn visible_by_default() -> bool {
    true
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RotationEntry {
    axis: [f64; 3],
    /// Degrees.
    angle: f64,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct AtomEntry {
    element: String,
    #[serde(default)]
    charge: i8,
    position: [f64; 3],
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct BondEntry {
    atoms: [usize; 2],
    #[serde(default)]
    order: BondOrder,
}

impl SceneFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading scene description from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn into_scene(self, criteria: InteractionCriteria) -> Result<Scene> {
        let mut scene = Scene::new(criteria);
        let mut groups: HashMap<String, GroupId> = HashMap::new();

        for entry in self.groups {
            if groups.contains_key(&entry.name) {
                return Err(CliError::Scene(format!("group '{}' is defined twice", entry.name)));
            }
            let parent = match &entry.parent {
                Some(name) => lookup_group(&groups, name)?,
                None => scene.root(),
            };
            let id = scene.add_group(&entry.name, parent)?;
            groups.insert(entry.name, id);
        }

        for entry in self.molecules {
            if scene.find_molecule(&entry.name).is_some() {
                return Err(CliError::Scene(format!("molecule '{}' is defined twice", entry.name)));
            }
            let group = match &entry.group {
                Some(name) => lookup_group(&groups, name)?,
                None => scene.root(),
            };
            let transform = placement(&entry)?;
            let (role, tag, visible) = (entry.role, entry.tag, entry.visible);
            let molecule = build_molecule(entry)?;

            let id = scene.add_molecule(molecule, role, group)?;
            scene.set_tag(id, tag)?;
            scene.set_visible(id, visible)?;
            scene.set_transform(id, transform)?;
        }

        info!(
            groups = groups.len(),
            molecules = scene.molecule_ids().count(),
            "Scene loaded"
        );
        Ok(scene)
    }
}

fn lookup_group(groups: &HashMap<String, GroupId>, name: &str) -> Result<GroupId> {
    groups
        .get(name)
        .copied()
        .ok_or_else(|| CliError::Scene(format!("unknown group '{name}'")))
}

fn placement(entry: &MoleculeEntry) -> Result<Isometry3<f64>> {
    let translation = Vector3::from(entry.translation.unwrap_or([0.0; 3]));
    let rotation = match &entry.rotation {
        Some(RotationEntry { axis, angle }) => {
            let axis = Unit::try_new(Vector3::from(*axis), 1e-9).ok_or_else(|| {
                CliError::Scene(format!("molecule '{}' has a zero rotation axis", entry.name))
            })?;
            axis.into_inner() * angle.to_radians()
        }
        None => Vector3::zeros(),
    };
    Ok(Isometry3::new(translation, rotation))
}

fn build_molecule(entry: MoleculeEntry) -> Result<Molecule> {
    let mut molecule = Molecule::new(&entry.name);
    for atom in &entry.atoms {
        let atomic_number = elements::atomic_number(&atom.element).ok_or_else(|| {
            CliError::Scene(format!(
                "unknown element '{}' in molecule '{}'",
                atom.element, entry.name
            ))
        })?;
        molecule.add_atom(Atom::new(atomic_number, Point3::from(atom.position)).with_charge(atom.charge));
    }
    for bond in &entry.bonds {
        let [a, b] = bond.atoms;
        molecule
            .add_bond(a, b, bond.order)
            .map_err(|e| CliError::Scene(format!("molecule '{}': {e}", entry.name)))?;
    }
    molecule.perceive_rings();
    Ok(molecule)
}
