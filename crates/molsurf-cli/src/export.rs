use crate::error::Result;
use itertools::Itertools;
use molsurf::core::mesh::Mesh;
use molsurf::core::models::ids::MoleculeId;
use molsurf::engine::classify::{Interaction, InteractionSet, SiteRef};
use molsurf::workflows::scene::Scene;
use serde::Serialize;
use std::io::Write;
use tracing::debug;

/// Flat vertex buffers, ready for upload by a renderer.
#[derive(Serialize, Debug)]
pub struct MeshDocument {
    pub positions: Vec<f32>,
    pub indices: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<f32>>,
}

impl From<&Mesh> for MeshDocument {
    fn from(mesh: &Mesh) -> Self {
        Self {
            positions: mesh.positions_flat(),
            indices: mesh.indices_flat(),
            colors: mesh.colors_flat(),
            normals: mesh.normals_flat(),
        }
    }
}

pub fn write_mesh_json<W: Write>(mesh: &Mesh, writer: W) -> Result<()> {
    serde_json::to_writer(writer, &MeshDocument::from(mesh))?;
    Ok(())
}

#[derive(Serialize, Debug, PartialEq)]
pub struct InteractionRow<'a> {
    pub molecule_a: &'a str,
    pub molecule_b: &'a str,
    pub kind: &'static str,
    pub first_molecule: &'a str,
    pub first_atoms: String,
    pub second_molecule: &'a str,
    pub second_atoms: String,
    pub distance: f64,
    pub angle: f64,
    pub strength: f64,
}

fn molecule_name(scene: &Scene, id: MoleculeId) -> &str {
    scene.molecule(id).map(|m| m.name()).unwrap_or("?")
}

fn atom_list(site: &SiteRef) -> String {
    site.atoms.iter().join(";")
}

fn row<'a>(scene: &'a Scene, a: MoleculeId, b: MoleculeId, interaction: &Interaction) -> InteractionRow<'a> {
    InteractionRow {
        molecule_a: molecule_name(scene, a),
        molecule_b: molecule_name(scene, b),
        kind: interaction.kind.label(),
        first_molecule: molecule_name(scene, interaction.first.molecule),
        first_atoms: atom_list(&interaction.first),
        second_molecule: molecule_name(scene, interaction.second.molecule),
        second_atoms: atom_list(&interaction.second),
        distance: interaction.distance,
        angle: interaction.angle,
        strength: interaction.strength,
    }
}

/// Writes one CSV row per interaction, pairs in scene order and kinds in
/// their natural order. Returns the number of rows written.
pub fn write_interactions_csv<'a, W, I>(scene: &Scene, pairs: I, writer: W) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = (MoleculeId, MoleculeId, &'a InteractionSet)>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for (a, b, set) in pairs {
        for interaction in set.values().flatten() {
            csv_writer.serialize(row(scene, a, b, interaction))?;
            rows += 1;
        }
    }
    csv_writer.flush()?;
    debug!(rows, "Interaction table written");
    Ok(rows)
}
