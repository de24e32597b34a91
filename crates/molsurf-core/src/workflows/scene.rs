//! A collection of molecules whose mutual interactions are kept up to date.
//!
//! Molecules live in groups; only molecules of the same group are compared,
//! and only when their roles allow it (see [`crate::engine::eligibility`]).
//! Each molecule owns a [`SiteCache`]. Interaction sets are stored per
//! molecule pair together with the cache versions they were computed from,
//! so [`Scene::recompute`] only reclassifies pairs whose inputs changed.

use crate::core::models::ids::{GroupId, MoleculeId};
use crate::core::models::molecule::Molecule;
use crate::engine::cache::{CacheListener, SiteCache};
use crate::engine::classify::{InteractionSet, detect};
use crate::engine::config::InteractionCriteria;
use crate::engine::eligibility::{MoleculeRole, PairMember, is_eligible};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use itertools::Itertools;
use nalgebra::Isometry3;
use slotmap::SlotMap;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// What changed in a molecule obtained through [`Scene::molecule_mut`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Atoms, elements, charges or bonds.
    Structure,
    Coordinates,
}

#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    parent: Option<GroupId>,
}

impl Group {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` for the root group.
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }
}

#[derive(Debug)]
struct SceneMolecule {
    molecule: Molecule,
    role: MoleculeRole,
    tag: i32,
    group: GroupId,
    transform: Isometry3<f64>,
    visible: bool,
    cache: SiteCache,
}

impl SceneMolecule {
    fn member(&self) -> PairMember {
        PairMember {
            role: self.role,
            tag: self.tag,
            group: self.group,
        }
    }

    fn versions(&self) -> (u64, u64) {
        (self.cache.structure_version(), self.cache.geometry_version())
    }

    fn refresh_structure(&mut self) {
        self.molecule.perceive_rings();
        self.cache.invalidate_structure();
    }
}

type PairKey = (MoleculeId, MoleculeId);

#[derive(Debug, Clone)]
struct PairRecord {
    versions: [(u64, u64); 2],
    interactions: InteractionSet,
}

/// Counts reported by [`Scene::recompute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecomputeSummary {
    pub eligible_pairs: usize,
    pub recomputed_pairs: usize,
    pub interactions: usize,
}

#[derive(Debug)]
pub struct Scene {
    groups: SlotMap<GroupId, Group>,
    root: GroupId,
    molecules: SlotMap<MoleculeId, SceneMolecule>,
    pairs: BTreeMap<PairKey, PairRecord>,
    /// Set by role, tag, membership and criteria changes; forces every pair
    /// to be rebuilt on the next recompute.
    membership_dirty: bool,
    criteria: InteractionCriteria,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(InteractionCriteria::default())
    }
}

fn pair_key(a: MoleculeId, b: MoleculeId) -> PairKey {
    if a <= b { (a, b) } else { (b, a) }
}

impl Scene {
    pub fn new(criteria: InteractionCriteria) -> Self {
        let mut groups = SlotMap::with_key();
        let root = groups.insert(Group {
            name: "root".to_string(),
            parent: None,
        });
        Self {
            groups,
            root,
            molecules: SlotMap::with_key(),
            pairs: BTreeMap::new(),
            membership_dirty: false,
            criteria,
        }
    }

    pub fn root(&self) -> GroupId {
        self.root
    }

    pub fn criteria(&self) -> &InteractionCriteria {
        &self.criteria
    }

    /// Replaces the detection thresholds, rejecting invalid ones. Every pair
    /// is reclassified on the next [`Scene::recompute`].
    pub fn set_criteria(&mut self, criteria: InteractionCriteria) -> Result<(), EngineError> {
        criteria.validate()?;
        self.criteria = criteria;
        self.membership_dirty = true;
        Ok(())
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> + '_ {
        self.groups.iter()
    }

    pub fn add_group(&mut self, name: &str, parent: GroupId) -> Result<GroupId, EngineError> {
        if !self.groups.contains_key(parent) {
            return Err(EngineError::GroupNotFound(parent));
        }
        Ok(self.groups.insert(Group {
            name: name.to_string(),
            parent: Some(parent),
        }))
    }

    /// Removes a group, handing its molecules and subgroups to its parent.
    pub fn remove_group(&mut self, id: GroupId) -> Result<(), EngineError> {
        if id == self.root {
            return Err(EngineError::RootGroup("removed"));
        }
        let parent = self
            .groups
            .remove(id)
            .ok_or(EngineError::GroupNotFound(id))?
            .parent
            .unwrap_or(self.root);
        for group in self.groups.values_mut() {
            if group.parent == Some(id) {
                group.parent = Some(parent);
            }
        }
        for entry in self.molecules.values_mut() {
            if entry.group == id {
                entry.group = parent;
                self.membership_dirty = true;
            }
        }
        Ok(())
    }

    /// Adds a molecule to `group`. Rings are perceived if they have not been.
    pub fn add_molecule(
        &mut self,
        mut molecule: Molecule,
        role: MoleculeRole,
        group: GroupId,
    ) -> Result<MoleculeId, EngineError> {
        if !self.groups.contains_key(group) {
            return Err(EngineError::GroupNotFound(group));
        }
        if molecule.rings().is_none() {
            molecule.perceive_rings();
        }
        debug!(molecule = molecule.name(), %role, "Adding molecule to scene");
        let id = self.molecules.insert(SceneMolecule {
            molecule,
            role,
            tag: 0,
            group,
            transform: Isometry3::identity(),
            visible: true,
            cache: SiteCache::new(),
        });
        self.membership_dirty = true;
        Ok(id)
    }

    pub fn remove_molecule(&mut self, id: MoleculeId) -> Result<Molecule, EngineError> {
        let entry = self.molecules.remove(id).ok_or(EngineError::MoleculeNotFound(id))?;
        self.pairs.retain(|&(a, b), _| a != id && b != id);
        Ok(entry.molecule)
    }

    fn entry(&self, id: MoleculeId) -> Result<&SceneMolecule, EngineError> {
        self.molecules.get(id).ok_or(EngineError::MoleculeNotFound(id))
    }

    fn entry_mut(&mut self, id: MoleculeId) -> Result<&mut SceneMolecule, EngineError> {
        self.molecules.get_mut(id).ok_or(EngineError::MoleculeNotFound(id))
    }

    pub fn molecule(&self, id: MoleculeId) -> Option<&Molecule> {
        self.molecules.get(id).map(|e| &e.molecule)
    }

    /// Direct access for edits. Report them with [`Scene::notify`].
    pub fn molecule_mut(&mut self, id: MoleculeId) -> Option<&mut Molecule> {
        self.molecules.get_mut(id).map(|e| &mut e.molecule)
    }

    pub fn molecule_ids(&self) -> impl Iterator<Item = MoleculeId> + '_ {
        self.molecules.keys()
    }

    pub fn find_molecule(&self, name: &str) -> Option<MoleculeId> {
        self.molecules
            .iter()
            .find(|(_, e)| e.molecule.name() == name)
            .map(|(id, _)| id)
    }

    pub fn role(&self, id: MoleculeId) -> Result<MoleculeRole, EngineError> {
        Ok(self.entry(id)?.role)
    }

    pub fn tag(&self, id: MoleculeId) -> Result<i32, EngineError> {
        Ok(self.entry(id)?.tag)
    }

    pub fn group_of(&self, id: MoleculeId) -> Result<GroupId, EngineError> {
        Ok(self.entry(id)?.group)
    }

    pub fn transform(&self, id: MoleculeId) -> Result<&Isometry3<f64>, EngineError> {
        Ok(&self.entry(id)?.transform)
    }

    pub fn is_visible(&self, id: MoleculeId) -> Result<bool, EngineError> {
        Ok(self.entry(id)?.visible)
    }

    pub fn set_role(&mut self, id: MoleculeId, role: MoleculeRole) -> Result<(), EngineError> {
        let entry = self.entry_mut(id)?;
        if entry.role != role {
            entry.role = role;
            // Solvents expose only water sites.
            entry.cache.invalidate_structure();
            self.membership_dirty = true;
        }
        Ok(())
    }

    pub fn set_tag(&mut self, id: MoleculeId, tag: i32) -> Result<(), EngineError> {
        let entry = self.entry_mut(id)?;
        if entry.tag != tag {
            entry.tag = tag;
            self.membership_dirty = true;
        }
        Ok(())
    }

    pub fn move_to_group(&mut self, id: MoleculeId, group: GroupId) -> Result<(), EngineError> {
        if !self.groups.contains_key(group) {
            return Err(EngineError::GroupNotFound(group));
        }
        let entry = self.entry_mut(id)?;
        if entry.group != group {
            entry.group = group;
            self.membership_dirty = true;
        }
        Ok(())
    }

    pub fn set_transform(&mut self, id: MoleculeId, transform: Isometry3<f64>) -> Result<(), EngineError> {
        let entry = self.entry_mut(id)?;
        entry.transform = transform;
        entry.cache.invalidate_coordinates();
        Ok(())
    }

    /// Visibility only filters [`Scene::visible_interactions`].
    pub fn set_visible(&mut self, id: MoleculeId, visible: bool) -> Result<(), EngineError> {
        self.entry_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn subscribe(&mut self, id: MoleculeId, listener: CacheListener) -> Result<(), EngineError> {
        self.entry_mut(id)?.cache.subscribe(listener);
        Ok(())
    }

    /// Records an edit made through [`Scene::molecule_mut`].
    ///
    /// Atom and bond edits clear the perceived rings, so a molecule without
    /// rings is treated as structurally changed whatever `change` says.
    pub fn notify(&mut self, id: MoleculeId, change: Change) -> Result<(), EngineError> {
        let entry = self.entry_mut(id)?;
        match change {
            Change::Coordinates if entry.molecule.rings().is_some() => entry.cache.invalidate_coordinates(),
            _ => entry.refresh_structure(),
        }
        Ok(())
    }

    /// `true` when [`Scene::recompute`] would do any work, including after
    /// structural edits that were never reported through [`Scene::notify`].
    pub fn needs_recompute(&self) -> bool {
        self.membership_dirty
            || self
                .molecules
                .values()
                .any(|e| e.molecule.rings().is_none() || !e.cache.is_ready())
            || self
                .eligible_pairs()
                .iter()
                .any(|key| self.pairs.get(key).is_none_or(|r| r.versions != self.versions(*key)))
    }

    fn versions(&self, (a, b): PairKey) -> [(u64, u64); 2] {
        [self.molecules[a].versions(), self.molecules[b].versions()]
    }

    /// Sorted keys of every molecule pair the eligibility rules admit,
    /// including solvent self pairs.
    fn eligible_pairs(&self) -> Vec<PairKey> {
        let ids: Vec<MoleculeId> = self.molecules.keys().sorted().collect();
        let selves = ids.iter().copied().filter(|&id| {
            let member = self.molecules[id].member();
            is_eligible(&member, &member, true)
        });
        let others = ids.iter().copied().tuple_combinations().filter(|&(a, b)| {
            is_eligible(&self.molecules[a].member(), &self.molecules[b].member(), false)
        });
        selves.map(|id| (id, id)).chain(others).sorted().collect()
    }

    /// Brings site caches and interaction sets up to date.
    #[instrument(skip_all, name = "scene_recompute")]
    pub fn recompute(&mut self, reporter: &ProgressReporter) -> Result<RecomputeSummary, EngineError> {
        reporter.stage_start("Site extraction");
        for entry in self.molecules.values_mut() {
            if entry.molecule.rings().is_none() {
                debug!(molecule = entry.molecule.name(), "Unreported structural edit; rebuilding sites");
                entry.refresh_structure();
            }
            entry.cache.ensure(&entry.molecule, entry.role, &entry.transform)?;
        }
        reporter.stage_finish();

        if self.membership_dirty {
            debug!("Pair membership changed; discarding all interaction sets");
            self.pairs.clear();
            self.membership_dirty = false;
        }

        let eligible = self.eligible_pairs();
        self.pairs.retain(|key, _| eligible.binary_search(key).is_ok());
        let stale: Vec<PairKey> = eligible
            .iter()
            .copied()
            .filter(|key| self.pairs.get(key).is_none_or(|r| r.versions != self.versions(*key)))
            .collect();

        reporter.stage_start("Pair classification");
        reporter.task_start(stale.len() as u64);
        let compute = |&(a, b): &PairKey| -> (PairKey, PairRecord) {
            let (first, second) = (&self.molecules[a], &self.molecules[b]);
            let interactions = detect(
                &first.cache.site_set(a),
                &second.cache.site_set(b),
                a == b,
                &self.criteria,
            );
            reporter.task_increment();
            let record = PairRecord {
                versions: [first.versions(), second.versions()],
                interactions,
            };
            ((a, b), record)
        };

        #[cfg(feature = "parallel")]
        let results: Vec<(PairKey, PairRecord)> = stale.par_iter().map(compute).collect();
        #[cfg(not(feature = "parallel"))]
        let results: Vec<(PairKey, PairRecord)> = stale.iter().map(compute).collect();

        reporter.task_finish();
        reporter.stage_finish();
        self.pairs.extend(results);

        let summary = RecomputeSummary {
            eligible_pairs: eligible.len(),
            recomputed_pairs: stale.len(),
            interactions: self
                .pairs
                .values()
                .flat_map(|r| r.interactions.values())
                .map(Vec::len)
                .sum(),
        };
        info!(
            eligible = summary.eligible_pairs,
            recomputed = summary.recomputed_pairs,
            interactions = summary.interactions,
            "Interaction sets updated."
        );
        Ok(summary)
    }

    /// Interactions between `a` and `b` as of the last recompute.
    ///
    /// The set is stored once per unordered pair; its `first`/`second`
    /// orientation does not depend on the argument order.
    pub fn interactions(&self, a: MoleculeId, b: MoleculeId) -> Option<&InteractionSet> {
        self.pairs.get(&pair_key(a, b)).map(|r| &r.interactions)
    }

    pub fn all_interactions(&self) -> impl Iterator<Item = (MoleculeId, MoleculeId, &InteractionSet)> + '_ {
        self.pairs.iter().map(|(&(a, b), r)| (a, b, &r.interactions))
    }

    /// Pairs whose molecules are both visible.
    pub fn visible_interactions(&self) -> impl Iterator<Item = (MoleculeId, MoleculeId, &InteractionSet)> + '_ {
        self.all_interactions().filter(|&(a, b, _)| {
            self.molecules.get(a).is_some_and(|e| e.visible) && self.molecules.get(b).is_some_and(|e| e.visible)
        })
    }
}
