//! Removal of redundant contacts from a raw classification.
//!
//! Hydrophobic contacts between atoms of a stacked ring pair are already
//! described by the stacking; of the rest each atom keeps only its shortest
//! contact. Hydrogen bonds between the charged groups of a salt bridge are
//! dropped, and each donor atom keeps only its most linear hydrogen bond.

use super::classify::{Interaction, InteractionKind, InteractionSet, SiteRef};
use crate::core::models::ids::MoleculeId;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

/// Groups `raw` by kind and applies the deduplication rules.
///
/// Order within each kind follows the input order.
pub fn resolve(raw: Vec<Interaction>) -> InteractionSet {
    let mut set = InteractionSet::new();
    for interaction in raw {
        set.entry(interaction.kind).or_default().push(interaction);
    }

    if let Some(contacts) = set.remove(&InteractionKind::Hydrophobic) {
        let stacked = set.get(&InteractionKind::PiStacking).map_or(&[][..], Vec::as_slice);
        let kept = hydrophobic(contacts, stacked);
        if !kept.is_empty() {
            set.insert(InteractionKind::Hydrophobic, kept);
        }
    }
    if let Some(bonds) = set.remove(&InteractionKind::HydrogenBond) {
        let bridges = set.get(&InteractionKind::SaltBridge).map_or(&[][..], Vec::as_slice);
        let kept = hydrogen_bonds(bonds, bridges);
        if !kept.is_empty() {
            set.insert(InteractionKind::HydrogenBond, kept);
        }
    }
    set
}

fn covers(side: &SiteRef, molecule: MoleculeId, atom: usize) -> bool {
    side.molecule == molecule && side.atoms.contains(&atom)
}

/// `true` when the two primary atoms of `contact` lie on opposite sides of
/// one of `pairs`, in either orientation.
fn spans_pair(contact: &Interaction, pairs: &[Interaction]) -> bool {
    let (ma, a) = (contact.first.molecule, contact.first.primary_atom());
    let (mb, b) = (contact.second.molecule, contact.second.primary_atom());
    pairs.iter().any(|p| {
        (covers(&p.first, ma, a) && covers(&p.second, mb, b)) || (covers(&p.second, ma, a) && covers(&p.first, mb, b))
    })
}

/// Keeps, for every key, the contact `better` prefers; earlier contacts win ties.
fn keep_best<K, F, B>(contacts: Vec<Interaction>, key: F, better: B) -> Vec<Interaction>
where
    K: Ord,
    F: Fn(&Interaction) -> K,
    B: Fn(&Interaction, &Interaction) -> bool,
{
    let mut best: BTreeMap<K, usize> = BTreeMap::new();
    for (i, contact) in contacts.iter().enumerate() {
        match best.entry(key(contact)) {
            Entry::Vacant(slot) => {
                slot.insert(i);
            }
            Entry::Occupied(mut slot) => {
                if better(contact, &contacts[*slot.get()]) {
                    slot.insert(i);
                }
            }
        }
    }
    let keep: HashSet<usize> = best.into_values().collect();
    contacts
        .into_iter()
        .enumerate()
        .filter_map(|(i, c)| keep.contains(&i).then_some(c))
        .collect()
}

fn hydrophobic(contacts: Vec<Interaction>, stacked: &[Interaction]) -> Vec<Interaction> {
    let contacts: Vec<Interaction> = contacts.into_iter().filter(|c| !spans_pair(c, stacked)).collect();
    let shorter = |a: &Interaction, b: &Interaction| a.distance < b.distance;
    let contacts = keep_best(contacts, |c| (c.first.molecule, c.first.primary_atom()), shorter);
    keep_best(contacts, |c| (c.second.molecule, c.second.primary_atom()), shorter)
}

fn hydrogen_bonds(bonds: Vec<Interaction>, bridges: &[Interaction]) -> Vec<Interaction> {
    let bonds: Vec<Interaction> = bonds.into_iter().filter(|b| !spans_pair(b, bridges)).collect();
    keep_best(
        bonds,
        |b| (b.first.molecule, b.first.primary_atom()),
        |a, b| a.angle > b.angle || (a.angle == b.angle && a.distance < b.distance),
    )
}
