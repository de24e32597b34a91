use super::atom::Atom;
use super::topology::{Bond, BondOrder};
use crate::core::elements;
use nalgebra::Point3;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Rings larger than this are not reported by ring perception.
const MAX_RING_SIZE: usize = 12;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("Atom index {index} is out of range (molecule has {count} atoms)")]
    AtomOutOfRange { index: usize, count: usize },
    #[error("An atom cannot be bonded to itself (atom {0})")]
    SelfBond(usize),
    #[error("Atoms {0} and {1} are already bonded")]
    DuplicateBond(usize, usize),
}

/// A ring found by [`Molecule::perceive_rings`]. Atoms are stored in cycle order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    atoms: Vec<usize>,
    aromatic: bool,
}

impl Ring {
    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    pub fn is_aromatic(&self) -> bool {
        self.aromatic
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.atoms.contains(&atom)
    }
}

/// Result of ring perception, cached on the molecule until its topology changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingInfo {
    rings: Vec<Ring>,
    membership: Vec<u8>,
    aromatic_atoms: Vec<bool>,
}

impl RingInfo {
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn aromatic_rings(&self) -> impl Iterator<Item = &Ring> {
        self.rings.iter().filter(|r| r.aromatic)
    }

    pub fn is_in_ring(&self, atom: usize) -> bool {
        self.membership.get(atom).is_some_and(|&m| m > 0)
    }

    pub fn is_aromatic(&self, atom: usize) -> bool {
        self.aromatic_atoms.get(atom).copied().unwrap_or(false)
    }
}

/// Atoms, bonds and cached topology annotations of one molecule.
///
/// Any structural edit (adding atoms or bonds, mutating an atom) discards the
/// cached [`RingInfo`]; callers must run [`Molecule::perceive_rings`] again
/// before the interaction engine reads the molecule. Coordinate edits through
/// [`Molecule::set_position`] keep it.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    name: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<usize>>,
    rings: Option<RingInfo>,
}

impl Molecule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    /// Mutable access to an atom. Drops cached ring information since the
    /// caller may change the element or charge.
    pub fn atom_mut(&mut self, index: usize) -> Option<&mut Atom> {
        self.rings = None;
        self.atoms.get_mut(index)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn position(&self, index: usize) -> Point3<f64> {
        self.atoms[index].position
    }

    pub fn set_position(&mut self, index: usize, position: Point3<f64>) -> Result<(), MoleculeError> {
        let count = self.atoms.len();
        let atom = self
            .atoms
            .get_mut(index)
            .ok_or(MoleculeError::AtomOutOfRange { index, count })?;
        atom.position = position;
        Ok(())
    }

    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.rings = None;
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    pub fn add_bond(&mut self, a: usize, b: usize, order: BondOrder) -> Result<usize, MoleculeError> {
        let count = self.atoms.len();
        for index in [a, b] {
            if index >= count {
                return Err(MoleculeError::AtomOutOfRange { index, count });
            }
        }
        if a == b {
            return Err(MoleculeError::SelfBond(a));
        }
        if self.bond_between(a, b).is_some() {
            return Err(MoleculeError::DuplicateBond(a, b));
        }

        self.rings = None;
        let bond_index = self.bonds.len();
        self.bonds.push(Bond::new(a, b, order));
        self.adjacency[a].push(bond_index);
        self.adjacency[b].push(bond_index);
        Ok(bond_index)
    }

    pub fn bonds_of(&self, atom: usize) -> impl Iterator<Item = &Bond> + '_ {
        self.adjacency[atom].iter().map(|&b| &self.bonds[b])
    }

    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = usize> + '_ {
        self.bonds_of(atom).filter_map(move |b| b.other(atom))
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.adjacency
            .get(a)?
            .iter()
            .map(|&i| &self.bonds[i])
            .find(|bond| bond.connects(a, b))
    }

    pub fn heavy_neighbors(&self, atom: usize) -> Vec<usize> {
        self.neighbors(atom)
            .filter(|&n| !self.atoms[n].is_hydrogen())
            .collect()
    }

    pub fn hydrogens(&self, atom: usize) -> Vec<usize> {
        self.neighbors(atom)
            .filter(|&n| self.atoms[n].is_hydrogen())
            .collect()
    }

    pub fn has_multiple_bond(&self, atom: usize) -> bool {
        self.bonds_of(atom).any(|b| b.order != BondOrder::Single)
    }

    /// Cached ring perception result, `None` until [`Self::perceive_rings`] runs.
    pub fn rings(&self) -> Option<&RingInfo> {
        self.rings.as_ref()
    }

    /// Connected-component label for every atom, numbered in atom order.
    pub fn fragments(&self) -> Vec<usize> {
        let mut labels = vec![usize::MAX; self.atoms.len()];
        let mut next = 0;
        for start in 0..self.atoms.len() {
            if labels[start] != usize::MAX {
                continue;
            }
            labels[start] = next;
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for n in self.neighbors(current) {
                    if labels[n] == usize::MAX {
                        labels[n] = next;
                        queue.push_back(n);
                    }
                }
            }
            next += 1;
        }
        labels
    }

    /// Finds the smallest ring through every bond and flags aromatic rings
    /// with a Hückel electron count.
    pub fn perceive_rings(&mut self) -> &RingInfo {
        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        let mut cycles = Vec::new();
        for (bond_index, bond) in self.bonds.iter().enumerate() {
            if let Some(path) = self.shortest_path_avoiding(bond.atom1, bond.atom2, bond_index) {
                let mut key = path.clone();
                key.sort_unstable();
                if seen.insert(key) {
                    cycles.push(path);
                }
            }
        }

        let mut membership = vec![0u8; self.atoms.len()];
        for cycle in &cycles {
            for &atom in cycle {
                membership[atom] = membership[atom].saturating_add(1);
            }
        }

        let rings: Vec<Ring> = cycles
            .into_iter()
            .map(|atoms| {
                let aromatic = self.is_aromatic_cycle(&atoms, &membership);
                Ring { atoms, aromatic }
            })
            .collect();

        let mut aromatic_atoms = vec![false; self.atoms.len()];
        for ring in rings.iter().filter(|r| r.aromatic) {
            for &atom in &ring.atoms {
                aromatic_atoms[atom] = true;
            }
        }

        self.rings.insert(RingInfo {
            rings,
            membership,
            aromatic_atoms,
        })
    }

    fn shortest_path_avoiding(&self, start: usize, goal: usize, skipped_bond: usize) -> Option<Vec<usize>> {
        let mut predecessor: HashMap<usize, usize> = HashMap::from([(start, start)]);
        let mut queue = VecDeque::from([(start, 0usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            if current == goal {
                let mut path = vec![goal];
                let mut cursor = goal;
                while cursor != start {
                    cursor = predecessor[&cursor];
                    path.push(cursor);
                }
                path.reverse();
                return Some(path);
            }
            if depth + 1 >= MAX_RING_SIZE {
                continue;
            }
            for &bond_index in &self.adjacency[current] {
                if bond_index == skipped_bond {
                    continue;
                }
                let Some(next) = self.bonds[bond_index].other(current) else {
                    continue;
                };
                if let std::collections::hash_map::Entry::Vacant(entry) = predecessor.entry(next) {
                    entry.insert(current);
                    queue.push_back((next, depth + 1));
                }
            }
        }
        None
    }

    fn is_aromatic_cycle(&self, atoms: &[usize], membership: &[u8]) -> bool {
        let n = atoms.len();
        let ring_bonds: Vec<&Bond> = (0..n)
            .filter_map(|i| self.bond_between(atoms[i], atoms[(i + 1) % n]))
            .collect();
        if ring_bonds.len() != n {
            return false;
        }
        if ring_bonds.iter().all(|b| b.order == BondOrder::Aromatic) {
            return true;
        }

        let mut electrons = 0u32;
        for &atom in atoms {
            match self.pi_electrons(atom, membership) {
                Some(e) => electrons += e,
                None => return false,
            }
        }
        electrons % 4 == 2
    }

    fn pi_electrons(&self, atom: usize, membership: &[u8]) -> Option<u32> {
        let mut conjugated = false;
        let mut exocyclic_double = false;
        for bond in self.bonds_of(atom) {
            let partner = bond.other(atom)?;
            match bond.order {
                BondOrder::Aromatic => conjugated = true,
                BondOrder::Double if membership[partner] > 0 => conjugated = true,
                BondOrder::Double => exocyclic_double = true,
                BondOrder::Triple => return None,
                BondOrder::Single => {}
            }
        }
        if conjugated {
            return Some(1);
        }

        let a = &self.atoms[atom];
        match a.atomic_number {
            elements::CARBON if exocyclic_double => Some(0),
            elements::CARBON => match a.formal_charge {
                -1 => Some(2),
                1 => Some(0),
                _ => None,
            },
            elements::NITROGEN | elements::PHOSPHORUS if !exocyclic_double && a.formal_charge <= 0 => {
                Some(2)
            }
            elements::OXYGEN | elements::SULFUR | elements::SELENIUM
                if !exocyclic_double && a.formal_charge == 0 =>
            {
                Some(2)
            }
            _ => None,
        }
    }
}
