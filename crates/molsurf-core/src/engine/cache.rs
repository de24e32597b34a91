use super::eligibility::MoleculeRole;
use super::error::EngineError;
use super::sites::{InteractionSite, SiteGeometry, extract_sites};
use crate::core::models::ids::MoleculeId;
use crate::core::models::molecule::Molecule;
use nalgebra::Isometry3;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    StructureInvalidated { structure_version: u64 },
    CoordinatesInvalidated { geometry_version: u64 },
    SitesRebuilt { structure_version: u64, sites: usize },
    GeometryRefreshed { geometry_version: u64 },
}

pub type CacheListener = Box<dyn Fn(CacheEvent) + Send + Sync>;

/// Per-molecule interaction sites and their world-space geometry.
///
/// The site list is rebuilt lazily after [`SiteCache::invalidate_structure`];
/// after [`SiteCache::invalidate_coordinates`] only the geometry is
/// recomputed. Both version counters only ever grow, so a consumer can tell
/// whether anything it derived from the cache is out of date.
#[derive(Default)]
pub struct SiteCache {
    sites: Option<Vec<InteractionSite>>,
    geometry: Vec<SiteGeometry>,
    fragments: Vec<usize>,
    geometry_stale: bool,
    structure_version: u64,
    geometry_version: u64,
    listeners: Vec<CacheListener>,
}

impl std::fmt::Debug for SiteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteCache")
            .field("sites", &self.sites.as_ref().map(Vec::len))
            .field("geometry_stale", &self.geometry_stale)
            .field("structure_version", &self.structure_version)
            .field("geometry_version", &self.geometry_version)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SiteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: CacheListener) {
        self.listeners.push(listener);
    }

    fn emit(&self, event: CacheEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn structure_version(&self) -> u64 {
        self.structure_version
    }

    pub fn geometry_version(&self) -> u64 {
        self.geometry_version
    }

    /// `true` when sites and geometry are current.
    pub fn is_ready(&self) -> bool {
        self.sites.is_some() && !self.geometry_stale
    }

    pub fn invalidate_structure(&mut self) {
        self.sites = None;
        self.geometry.clear();
        self.fragments.clear();
        self.structure_version += 1;
        self.geometry_version += 1;
        self.emit(CacheEvent::StructureInvalidated {
            structure_version: self.structure_version,
        });
    }

    pub fn invalidate_coordinates(&mut self) {
        if self.sites.is_none() {
            return;
        }
        self.geometry_stale = true;
        self.geometry_version += 1;
        self.emit(CacheEvent::CoordinatesInvalidated {
            geometry_version: self.geometry_version,
        });
    }

    /// Brings the cache up to date with `molecule` placed by `transform`.
    pub fn ensure(
        &mut self,
        molecule: &Molecule,
        role: MoleculeRole,
        transform: &Isometry3<f64>,
    ) -> Result<(), EngineError> {
        if self.sites.is_none() {
            let sites = extract_sites(molecule, role)?;
            let labels = molecule.fragments();
            self.fragments = sites.iter().map(|s| labels[s.primary_atom()]).collect();
            self.geometry = Self::compute_geometry(&sites, molecule, transform);
            self.geometry_stale = false;
            let count = sites.len();
            self.sites = Some(sites);
            trace!(molecule = molecule.name(), sites = count, "Site cache rebuilt");
            self.emit(CacheEvent::SitesRebuilt {
                structure_version: self.structure_version,
                sites: count,
            });
        } else if self.geometry_stale {
            if let Some(sites) = &self.sites {
                self.geometry = Self::compute_geometry(sites, molecule, transform);
            }
            self.geometry_stale = false;
            trace!(molecule = molecule.name(), "Site geometry refreshed");
            self.emit(CacheEvent::GeometryRefreshed {
                geometry_version: self.geometry_version,
            });
        }
        Ok(())
    }

    fn compute_geometry(
        sites: &[InteractionSite],
        molecule: &Molecule,
        transform: &Isometry3<f64>,
    ) -> Vec<SiteGeometry> {
        sites
            .iter()
            .map(|s| SiteGeometry::compute(s, molecule, transform))
            .collect()
    }

    pub fn sites(&self) -> &[InteractionSite] {
        self.sites.as_deref().unwrap_or(&[])
    }

    pub fn geometry(&self) -> &[SiteGeometry] {
        &self.geometry
    }

    /// Borrowed view consumed by the pairwise classifier.
    pub fn site_set(&self, molecule: MoleculeId) -> SiteSet<'_> {
        SiteSet {
            molecule,
            sites: self.sites(),
            geometry: &self.geometry,
            fragments: &self.fragments,
        }
    }
}

/// Sites of one molecule together with their geometry and the
/// connected-fragment label of each site's representative atom.
#[derive(Debug, Clone, Copy)]
pub struct SiteSet<'a> {
    pub molecule: MoleculeId,
    pub sites: &'a [InteractionSite],
    pub geometry: &'a [SiteGeometry],
    pub fragments: &'a [usize],
}

impl SiteSet<'_> {
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
