//! Interaction sites: the atoms or atom groups of a molecule that can take
//! part in a non-covalent contact.
//!
//! Sites are a function of topology only (elements, charges, bonds, rings)
//! and are recomputed when the molecule's structure changes. Their geometry
//! ([`SiteGeometry`]) depends on coordinates and is refreshed separately.

use super::eligibility::MoleculeRole;
use super::error::EngineError;
use crate::core::elements::{CARBON, HYDROGEN, NITROGEN, OXYGEN, PHOSPHORUS, SULFUR};
use crate::core::models::molecule::{Molecule, RingInfo};
use crate::core::models::topology::BondOrder;
use crate::core::utils::geometry::{centroid, plane_normal};
use nalgebra::{Isometry3, Point3, Unit, Vector3};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SiteKind {
    Hydrophobic,
    Donor,
    Acceptor,
    HalogenDonor,
    HalogenAcceptor,
    PositiveCharge,
    NegativeCharge,
    AromaticRing,
    Water,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionSite {
    pub kind: SiteKind,
    /// Atoms forming the site; the first one is the representative atom.
    pub atoms: Vec<usize>,
    /// Hydrogens attached to a donor or water oxygen.
    pub hydrogens: Vec<usize>,
    /// Heavy neighbour used for angle checks (the carbon of C-X, the Z of Y-Z).
    pub anchor: Option<usize>,
}

impl InteractionSite {
    pub fn new(kind: SiteKind, atoms: Vec<usize>) -> Self {
        Self {
            kind,
            atoms,
            hydrogens: Vec::new(),
            anchor: None,
        }
    }

    pub fn with_hydrogens(mut self, hydrogens: Vec<usize>) -> Self {
        self.hydrogens = hydrogens;
        self
    }

    pub fn with_anchor(mut self, anchor: usize) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn primary_atom(&self) -> usize {
        self.atoms[0]
    }
}

/// Coordinate-dependent part of a site, in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteGeometry {
    pub center: Point3<f64>,
    /// Best-fit plane normal, aromatic rings only.
    pub normal: Option<Unit<Vector3<f64>>>,
    pub hydrogens: Vec<Point3<f64>>,
    pub anchor: Option<Point3<f64>>,
}

impl SiteGeometry {
    pub fn compute(site: &InteractionSite, molecule: &Molecule, transform: &Isometry3<f64>) -> Self {
        let world = |i: usize| transform * molecule.position(i);
        let atoms: Vec<Point3<f64>> = site.atoms.iter().map(|&i| world(i)).collect();
        let center = centroid(&atoms).unwrap_or_else(Point3::origin);
        let normal = match site.kind {
            SiteKind::AromaticRing => plane_normal(&atoms),
            _ => None,
        };
        Self {
            center,
            normal,
            hydrogens: site.hydrogens.iter().map(|&h| world(h)).collect(),
            anchor: site.anchor.map(world),
        }
    }
}

/// Enumerates the interaction sites of `molecule`.
///
/// Ring perception must have run; hydrogens are expected to be explicit.
/// Solvent molecules only yield [`SiteKind::Water`] sites.
#[instrument(skip_all, name = "extract_sites", fields(molecule = molecule.name()))]
pub fn extract_sites(molecule: &Molecule, role: MoleculeRole) -> Result<Vec<InteractionSite>, EngineError> {
    let rings = molecule.rings().ok_or_else(|| EngineError::TopologyNotPerceived {
        molecule: molecule.name().to_string(),
    })?;

    let sites = if role == MoleculeRole::Solvent {
        water_sites(molecule)
    } else {
        SiteExtractor { molecule, rings }.run()
    };
    debug!(count = sites.len(), "Extracted interaction sites");
    Ok(sites)
}

fn water_sites(molecule: &Molecule) -> Vec<InteractionSite> {
    (0..molecule.atom_count())
        .filter(|&i| molecule.atoms()[i].atomic_number == OXYGEN && molecule.heavy_neighbors(i).is_empty())
        .map(|o| InteractionSite::new(SiteKind::Water, vec![o]).with_hydrogens(molecule.hydrogens(o)))
        .collect()
}

struct SiteExtractor<'a> {
    molecule: &'a Molecule,
    rings: &'a RingInfo,
}

impl SiteExtractor<'_> {
    fn run(&self) -> Vec<InteractionSite> {
        let mut sites: Vec<InteractionSite> = self
            .rings
            .aromatic_rings()
            .map(|ring| InteractionSite::new(SiteKind::AromaticRing, ring.atoms().to_vec()))
            .collect();

        for atom in 0..self.molecule.atom_count() {
            if self.is_hydrophobic(atom) {
                sites.push(InteractionSite::new(SiteKind::Hydrophobic, vec![atom]));
            }
            sites.extend(self.hbond_site(atom));
            sites.extend(self.halogen_donor(atom));
            sites.extend(self.halogen_acceptor(atom));
            sites.extend(self.positive_charge(atom));
            sites.extend(self.negative_charge(atom));
        }
        sites
    }

    fn element(&self, atom: usize) -> u8 {
        self.molecule.atoms()[atom].atomic_number
    }

    fn charge(&self, atom: usize) -> i8 {
        self.molecule.atoms()[atom].formal_charge
    }

    fn is_hydrophobic(&self, atom: usize) -> bool {
        self.element(atom) == CARBON
            && !self.rings.is_aromatic(atom)
            && !self.molecule.has_multiple_bond(atom)
            && self
                .molecule
                .neighbors(atom)
                .all(|n| matches!(self.element(n), CARBON | HYDROGEN))
    }

    fn hbond_site(&self, atom: usize) -> Option<InteractionSite> {
        if !matches!(self.element(atom), NITROGEN | OXYGEN) {
            return None;
        }
        let hydrogens = self.molecule.hydrogens(atom);
        if !hydrogens.is_empty() {
            Some(InteractionSite::new(SiteKind::Donor, vec![atom]).with_hydrogens(hydrogens))
        } else if self.charge(atom) <= 0 {
            Some(InteractionSite::new(SiteKind::Acceptor, vec![atom]))
        } else {
            None
        }
    }

    fn halogen_donor(&self, atom: usize) -> Option<InteractionSite> {
        if !self.molecule.atoms()[atom].is_halogen() {
            return None;
        }
        match self.molecule.heavy_neighbors(atom).as_slice() {
            &[carbon] if self.element(carbon) == CARBON => {
                Some(InteractionSite::new(SiteKind::HalogenDonor, vec![atom]).with_anchor(carbon))
            }
            _ => None,
        }
    }

    fn halogen_acceptor(&self, atom: usize) -> Option<InteractionSite> {
        if !matches!(self.element(atom), NITROGEN | OXYGEN | SULFUR) {
            return None;
        }
        let partners: Vec<usize> = self
            .molecule
            .neighbors(atom)
            .filter(|&n| matches!(self.element(n), CARBON | NITROGEN | PHOSPHORUS | SULFUR))
            .collect();
        match partners.as_slice() {
            &[partner] => Some(InteractionSite::new(SiteKind::HalogenAcceptor, vec![atom]).with_anchor(partner)),
            _ => None,
        }
    }

    fn positive_charge(&self, atom: usize) -> Option<InteractionSite> {
        if self.molecule.degree(atom) == 0 {
            return (self.charge(atom) > 0).then(|| InteractionSite::new(SiteKind::PositiveCharge, vec![atom]));
        }
        match self.element(atom) {
            CARBON => self
                .guanidinium_like(atom)
                .or_else(|| self.imidazolium(atom))
                .map(|atoms| InteractionSite::new(SiteKind::PositiveCharge, atoms)),
            NITROGEN if self.is_aliphatic_amine(atom) => {
                Some(InteractionSite::new(SiteKind::PositiveCharge, vec![atom]))
            }
            SULFUR => {
                let carbons = self
                    .molecule
                    .neighbors(atom)
                    .filter(|&n| self.element(n) == CARBON)
                    .count();
                (carbons == 3).then(|| InteractionSite::new(SiteKind::PositiveCharge, vec![atom]))
            }
            _ => None,
        }
    }

    /// Guanidinium and amidinium carbons: three heavy neighbours, at least two
    /// nitrogens, one of them double bonded, and no oxygen.
    fn guanidinium_like(&self, carbon: usize) -> Option<Vec<usize>> {
        if self.rings.is_aromatic(carbon) {
            return None;
        }
        let heavy = self.molecule.heavy_neighbors(carbon);
        if heavy.len() != 3 || heavy.iter().any(|&n| self.element(n) == OXYGEN) {
            return None;
        }
        let nitrogens: Vec<usize> = heavy.iter().copied().filter(|&n| self.element(n) == NITROGEN).collect();
        let imine = nitrogens.iter().any(|&n| {
            self.molecule
                .bond_between(carbon, n)
                .is_some_and(|b| b.order == BondOrder::Double)
        });
        (nitrogens.len() >= 2 && imine).then(|| std::iter::once(carbon).chain(nitrogens).collect())
    }

    /// The carbon between both nitrogens of a protonated imidazole ring.
    fn imidazolium(&self, carbon: usize) -> Option<Vec<usize>> {
        self.rings
            .aromatic_rings()
            .filter(|ring| ring.len() == 5 && ring.contains(carbon))
            .find_map(|ring| {
                let ring_neighbors: Vec<usize> = self
                    .molecule
                    .neighbors(carbon)
                    .filter(|&n| ring.contains(n))
                    .collect();
                let both_nitrogen = ring_neighbors.len() == 2
                    && ring_neighbors.iter().all(|&n| self.element(n) == NITROGEN);
                if !both_nitrogen {
                    return None;
                }
                let protonated = ring_neighbors
                    .iter()
                    .all(|&n| !self.molecule.hydrogens(n).is_empty())
                    || ring_neighbors.iter().any(|&n| self.charge(n) > 0);
                protonated.then(|| std::iter::once(carbon).chain(ring_neighbors).collect())
            })
    }

    /// sp3 nitrogen bound only to carbon and hydrogen, with no neighbouring
    /// carbon in a double bond or an aromatic ring.
    fn is_aliphatic_amine(&self, nitrogen: usize) -> bool {
        if self.rings.is_aromatic(nitrogen) || self.molecule.has_multiple_bond(nitrogen) {
            return false;
        }
        let mut carbons = 0;
        for n in self.molecule.neighbors(nitrogen) {
            match self.element(n) {
                HYDROGEN => {}
                CARBON => {
                    if self.rings.is_aromatic(n) || self.molecule.has_multiple_bond(n) {
                        return false;
                    }
                    carbons += 1;
                }
                _ => return false,
            }
        }
        carbons > 0
    }

    fn negative_charge(&self, atom: usize) -> Option<InteractionSite> {
        if self.molecule.degree(atom) == 0 {
            return (self.charge(atom) < 0).then(|| InteractionSite::new(SiteKind::NegativeCharge, vec![atom]));
        }
        let oxygens: Vec<usize> = self
            .molecule
            .neighbors(atom)
            .filter(|&n| self.element(n) == OXYGEN)
            .collect();
        let terminal: Vec<usize> = oxygens
            .iter()
            .copied()
            .filter(|&o| self.molecule.degree(o) == 1)
            .collect();
        let matched = match self.element(atom) {
            CARBON => terminal.len() >= 2,
            PHOSPHORUS | SULFUR => oxygens.len() >= 3 && terminal.len() >= 2,
            _ => false,
        };
        matched.then(|| InteractionSite::new(SiteKind::NegativeCharge, std::iter::once(atom).chain(terminal).collect()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::elements::{CHLORINE, FLUORINE};
    use crate::core::models::atom::Atom;
    use crate::core::models::molecule::tests::benzene;
    use crate::core::models::topology::BondOrder::{Double, Single};

    /// Builds a molecule from `(element, charge, position)` triples and bonds,
    /// with rings perceived.
    pub(crate) fn build(atoms: &[(u8, i8, [f64; 3])], bonds: &[(usize, usize, BondOrder)]) -> Molecule {
        let mut mol = Molecule::new("test");
        for &(z, q, [x, y, zc]) in atoms {
            mol.add_atom(Atom::new(z, Point3::new(x, y, zc)).with_charge(q));
        }
        for &(a, b, order) in bonds {
            mol.add_bond(a, b, order).unwrap();
        }
        mol.perceive_rings();
        mol
    }

    fn kinds(sites: &[InteractionSite]) -> Vec<SiteKind> {
        sites.iter().map(|s| s.kind).collect()
    }

    fn count(sites: &[InteractionSite], kind: SiteKind) -> usize {
        sites.iter().filter(|s| s.kind == kind).count()
    }

    #[test]
    fn unperceived_topology_fails_fast() {
        let mut mol = Molecule::new("bare");
        mol.add_atom(Atom::new(CARBON, Point3::origin()));
        let err = extract_sites(&mol, MoleculeRole::Ligand).unwrap_err();
        assert!(matches!(err, EngineError::TopologyNotPerceived { .. }));
    }

    #[test]
    fn benzene_is_one_ring_and_no_hydrophobic_carbons() {
        let mut mol = benzene(Point3::origin());
        mol.perceive_rings();
        let sites = extract_sites(&mol, MoleculeRole::Ligand).unwrap();
        assert_eq!(kinds(&sites), vec![SiteKind::AromaticRing]);
        assert_eq!(sites[0].atoms.len(), 6);
    }

    #[test]
    fn ethane_carbons_are_hydrophobic() {
        let mol = build(
            &[
                (CARBON, 0, [0.0, 0.0, 0.0]),
                (CARBON, 0, [1.54, 0.0, 0.0]),
                (HYDROGEN, 0, [-0.5, 0.9, 0.0]),
            ],
            &[(0, 1, Single), (0, 2, Single)],
        );
        let sites = extract_sites(&mol, MoleculeRole::Ligand).unwrap();
        assert_eq!(count(&sites, SiteKind::Hydrophobic), 2);
    }

    #[test]
    fn hydroxyl_is_donor_carbonyl_is_acceptor() {
        // H-O-CH2-C(=O)-CH3
        let mol = build(
            &[
                (OXYGEN, 0, [0.0, 0.0, 0.0]),
                (HYDROGEN, 0, [-0.96, 0.0, 0.0]),
                (CARBON, 0, [1.4, 0.0, 0.0]),
                (CARBON, 0, [2.0, 1.3, 0.0]),
                (OXYGEN, 0, [1.4, 2.3, 0.0]),
                (CARBON, 0, [3.5, 1.3, 0.0]),
            ],
            &[(0, 1, Single), (0, 2, Single), (2, 3, Single), (3, 4, Double), (3, 5, Single)],
        );
        let sites = extract_sites(&mol, MoleculeRole::Ligand).unwrap();
        let donor = sites.iter().find(|s| s.kind == SiteKind::Donor).unwrap();
        assert_eq!(donor.atoms, vec![0]);
        assert_eq!(donor.hydrogens, vec![1]);
        let acceptor = sites.iter().find(|s| s.kind == SiteKind::Acceptor).unwrap();
        assert_eq!(acceptor.atoms, vec![4]);
        let halogen_acceptor = sites
            .iter()
            .find(|s| s.kind == SiteKind::HalogenAcceptor && s.atoms == vec![4])
            .unwrap();
        assert_eq!(halogen_acceptor.anchor, Some(3));
        // Carbon 3 has a double bond, carbon 2 an oxygen neighbour.
        assert_eq!(count(&sites, SiteKind::Hydrophobic), 1);
    }

    #[test]
    fn aryl_halide_is_halogen_donor_anchored_on_carbon() {
        let mol = build(
            &[(CARBON, 0, [0.0, 0.0, 0.0]), (CHLORINE, 0, [1.75, 0.0, 0.0])],
            &[(0, 1, Single)],
        );
        let sites = extract_sites(&mol, MoleculeRole::Ligand).unwrap();
        let donor = sites.iter().find(|s| s.kind == SiteKind::HalogenDonor).unwrap();
        assert_eq!(donor.atoms, vec![1]);
        assert_eq!(donor.anchor, Some(0));
    }

    #[test]
    fn fluoride_ion_is_negative_not_halogen_donor() {
        let mol = build(&[(FLUORINE, -1, [0.0, 0.0, 0.0])], &[]);
        let sites = extract_sites(&mol, MoleculeRole::Ligand).unwrap();
        assert_eq!(kinds(&sites), vec![SiteKind::NegativeCharge]);
    }

    #[test]
    fn carboxylate_is_negative_but_acid_is_not() {
        let carboxylate = build(
            &[
                (CARBON, 0, [0.0, 0.0, 0.0]),
                (CARBON, 0, [1.5, 0.0, 0.0]),
                (OXYGEN, 0, [2.1, 1.1, 0.0]),
                (OXYGEN, -1, [2.1, -1.1, 0.0]),
            ],
            &[(0, 1, Single), (1, 2, Double), (1, 3, Single)],
        );
        let sites = extract_sites(&carboxylate, MoleculeRole::Ligand).unwrap();
        let negative = sites.iter().find(|s| s.kind == SiteKind::NegativeCharge).unwrap();
        assert_eq!(negative.atoms, vec![1, 2, 3]);

        let acid = build(
            &[
                (CARBON, 0, [0.0, 0.0, 0.0]),
                (CARBON, 0, [1.5, 0.0, 0.0]),
                (OXYGEN, 0, [2.1, 1.1, 0.0]),
                (OXYGEN, 0, [2.1, -1.1, 0.0]),
                (HYDROGEN, 0, [3.0, -1.1, 0.0]),
            ],
            &[(0, 1, Single), (1, 2, Double), (1, 3, Single), (3, 4, Single)],
        );
        let sites = extract_sites(&acid, MoleculeRole::Ligand).unwrap();
        assert_eq!(count(&sites, SiteKind::NegativeCharge), 0);
    }

    #[test]
    fn amine_and_guanidinium_are_positive() {
        // CH3-NH2 and a guanidinium carbon C(=NH2+)(NH2)NH-CH3.
        let amine = build(
            &[
                (CARBON, 0, [0.0, 0.0, 0.0]),
                (NITROGEN, 0, [1.47, 0.0, 0.0]),
                (HYDROGEN, 0, [1.8, 0.9, 0.0]),
                (HYDROGEN, 0, [1.8, -0.9, 0.0]),
            ],
            &[(0, 1, Single), (1, 2, Single), (1, 3, Single)],
        );
        let sites = extract_sites(&amine, MoleculeRole::Ligand).unwrap();
        let positive = sites.iter().find(|s| s.kind == SiteKind::PositiveCharge).unwrap();
        assert_eq!(positive.atoms, vec![1]);

        let guanidinium = build(
            &[
                (CARBON, 0, [0.0, 0.0, 0.0]),
                (NITROGEN, 1, [0.0, 1.3, 0.0]),
                (NITROGEN, 0, [1.1, -0.7, 0.0]),
                (NITROGEN, 0, [-1.1, -0.7, 0.0]),
                (CARBON, 0, [-2.4, -0.2, 0.0]),
            ],
            &[(0, 1, Double), (0, 2, Single), (0, 3, Single), (3, 4, Single)],
        );
        let sites = extract_sites(&guanidinium, MoleculeRole::Ligand).unwrap();
        let positive = sites.iter().find(|s| s.kind == SiteKind::PositiveCharge).unwrap();
        assert_eq!(positive.atoms, vec![0, 1, 2, 3]);
    }

    #[test]
    fn amide_nitrogen_is_not_an_amine() {
        // CH3-C(=O)-NH2
        let amide = build(
            &[
                (CARBON, 0, [0.0, 0.0, 0.0]),
                (CARBON, 0, [1.5, 0.0, 0.0]),
                (OXYGEN, 0, [2.1, 1.1, 0.0]),
                (NITROGEN, 0, [2.2, -1.2, 0.0]),
                (HYDROGEN, 0, [3.2, -1.2, 0.0]),
            ],
            &[(0, 1, Single), (1, 2, Double), (1, 3, Single), (3, 4, Single)],
        );
        let sites = extract_sites(&amide, MoleculeRole::Ligand).unwrap();
        assert_eq!(count(&sites, SiteKind::PositiveCharge), 0);
    }

    #[test]
    fn solvent_yields_only_water_sites() {
        let water = build(
            &[
                (OXYGEN, 0, [0.0, 0.0, 0.0]),
                (HYDROGEN, 0, [0.96, 0.0, 0.0]),
                (HYDROGEN, 0, [-0.24, 0.93, 0.0]),
                (OXYGEN, 0, [5.0, 0.0, 0.0]),
            ],
            &[(0, 1, Single), (0, 2, Single)],
        );
        let sites = extract_sites(&water, MoleculeRole::Solvent).unwrap();
        assert_eq!(kinds(&sites), vec![SiteKind::Water, SiteKind::Water]);
        assert_eq!(sites[0].hydrogens, vec![1, 2]);
        assert!(sites[1].hydrogens.is_empty());
    }

    #[test]
    fn geometry_follows_transform() {
        let mut mol = benzene(Point3::origin());
        mol.perceive_rings();
        let sites = extract_sites(&mol, MoleculeRole::Ligand).unwrap();
        let shift = Isometry3::translation(0.0, 0.0, 5.0);
        let geometry = SiteGeometry::compute(&sites[0], &mol, &shift);
        assert!((geometry.center - Point3::new(0.0, 0.0, 5.0)).norm() < 1e-9);
        assert!((geometry.normal.unwrap().z.abs() - 1.0).abs() < 1e-9);
    }
}
