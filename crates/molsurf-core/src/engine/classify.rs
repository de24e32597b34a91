//! Pairwise classification of interaction sites into non-covalent contacts.

use super::cache::SiteSet;
use super::config::InteractionCriteria;
use super::dedup;
use super::sites::{InteractionSite, SiteGeometry, SiteKind};
use crate::core::models::ids::MoleculeId;
use crate::core::utils::geometry::{angle_at_deg, angle_between_deg, fold_to_acute, in_plane_offset};
use nalgebra::Point3;
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

const MIN_STRENGTH: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteractionKind {
    Hydrophobic,
    HydrogenBond,
    HalogenBond,
    SaltBridge,
    PiCation,
    PiStacking,
    WaterBridge,
    WaterWater,
}

impl InteractionKind {
    /// Distance below which a contact scores full strength.
    fn optimal_distance(self) -> f64 {
        match self {
            Self::Hydrophobic => 3.5,
            Self::HydrogenBond => 2.9,
            Self::HalogenBond => 3.2,
            Self::SaltBridge | Self::PiCation | Self::PiStacking => 4.0,
            Self::WaterBridge => 3.0,
            Self::WaterWater => 2.8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hydrophobic => "hydrophobic",
            Self::HydrogenBond => "hydrogen-bond",
            Self::HalogenBond => "halogen-bond",
            Self::SaltBridge => "salt-bridge",
            Self::PiCation => "pi-cation",
            Self::PiStacking => "pi-stacking",
            Self::WaterBridge => "water-bridge",
            Self::WaterWater => "water-water",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Non-owning handle to one side of an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRef {
    pub molecule: MoleculeId,
    /// Index into the molecule's site list.
    pub site: usize,
    pub atoms: Vec<usize>,
    /// Atom a viewer should draw the contact to, when it differs from the
    /// site centre (the hydrogen of a donor).
    pub visible_atom: Option<usize>,
}

impl SiteRef {
    pub fn primary_atom(&self) -> usize {
        self.atoms[0]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub kind: InteractionKind,
    /// Donor side for directional contacts, ring side for pi-cation.
    pub first: SiteRef,
    pub second: SiteRef,
    pub distance: f64,
    /// Characteristic angle in degrees, 0 when the contact has none.
    pub angle: f64,
    pub strength: f64,
}

pub type InteractionSet = BTreeMap<InteractionKind, Vec<Interaction>>;

/// One site of one molecule, with its geometry, as seen by the classifier.
#[derive(Debug, Clone, Copy)]
pub struct SiteView<'a> {
    pub molecule: MoleculeId,
    pub index: usize,
    pub site: &'a InteractionSite,
    pub geometry: &'a SiteGeometry,
}

impl SiteView<'_> {
    fn to_ref(self, visible_atom: Option<usize>) -> SiteRef {
        SiteRef {
            molecule: self.molecule,
            site: self.index,
            atoms: self.site.atoms.clone(),
            visible_atom,
        }
    }

    fn center(&self) -> &Point3<f64> {
        &self.geometry.center
    }

    /// The hydrogen of this site closest to `target`, with its position.
    fn closest_hydrogen(&self, target: &Point3<f64>) -> Option<(usize, Point3<f64>)> {
        self.site
            .hydrogens
            .iter()
            .zip(&self.geometry.hydrogens)
            .min_by(|(_, a), (_, b)| {
                nalgebra::distance_squared(*a, target).total_cmp(&nalgebra::distance_squared(*b, target))
            })
            .map(|(&index, &position)| (index, position))
    }
}

impl<'a> SiteSet<'a> {
    pub fn view(&self, index: usize) -> SiteView<'a> {
        SiteView {
            molecule: self.molecule,
            index,
            site: &self.sites[index],
            geometry: &self.geometry[index],
        }
    }
}

/// Full strength up to the optimal distance, then a linear fall-off that
/// reaches the floor at the cutoff.
fn distance_strength(kind: InteractionKind, distance: f64, cutoff: f64) -> f64 {
    let optimum = kind.optimal_distance();
    if distance <= optimum || cutoff <= optimum {
        return 1.0;
    }
    (1.0 - (distance - optimum) / (cutoff - optimum)).clamp(MIN_STRENGTH, 1.0)
}

/// Linear in the angle between the acceptance threshold (0.5) and 180 degrees (1.0).
fn angle_strength(angle: f64, min_angle: f64) -> f64 {
    if min_angle >= 180.0 {
        return 1.0;
    }
    0.5 + 0.5 * ((angle - min_angle) / (180.0 - min_angle)).clamp(0.0, 1.0)
}

fn record(
    kind: InteractionKind,
    first: SiteRef,
    second: SiteRef,
    distance: f64,
    angle: f64,
    strength: f64,
) -> Interaction {
    Interaction {
        kind,
        first,
        second,
        distance,
        angle,
        strength: strength.clamp(MIN_STRENGTH, 1.0),
    }
}

/// Classifies a single site pair, returning at most one interaction.
///
/// Directional contacts are normalised so that `first` is the donor (or the
/// ring of a pi-cation contact, or the cation of a salt bridge) regardless of
/// argument order.
pub fn classify_pair(a: SiteView<'_>, b: SiteView<'_>, criteria: &InteractionCriteria) -> Option<Interaction> {
    use SiteKind::*;
    let distance = nalgebra::distance(a.center(), b.center());
    match (a.site.kind, b.site.kind) {
        (Hydrophobic, Hydrophobic) => hydrophobic(a, b, distance, criteria),
        (Donor, Acceptor) => hydrogen_bond(a, b, distance, criteria),
        (Acceptor, Donor) => hydrogen_bond(b, a, distance, criteria),
        (HalogenDonor, HalogenAcceptor) => halogen_bond(a, b, distance, criteria),
        (HalogenAcceptor, HalogenDonor) => halogen_bond(b, a, distance, criteria),
        (PositiveCharge, NegativeCharge) => salt_bridge(a, b, distance, criteria),
        (NegativeCharge, PositiveCharge) => salt_bridge(b, a, distance, criteria),
        (AromaticRing, PositiveCharge) => pi_cation(a, b, distance, criteria),
        (PositiveCharge, AromaticRing) => pi_cation(b, a, distance, criteria),
        (AromaticRing, AromaticRing) => pi_stacking(a, b, distance, criteria),
        (Water, Water) => water_water(a, b, distance, criteria),
        (Donor | Acceptor, Water) => water_bridge(a, b, distance, criteria),
        (Water, Donor | Acceptor) => water_bridge(b, a, distance, criteria),
        _ => None,
    }
}

fn hydrophobic(a: SiteView, b: SiteView, distance: f64, c: &InteractionCriteria) -> Option<Interaction> {
    let kind = InteractionKind::Hydrophobic;
    (distance < c.hydrophobic_max_distance).then(|| {
        let strength = distance_strength(kind, distance, c.hydrophobic_max_distance);
        record(kind, a.to_ref(None), b.to_ref(None), distance, 0.0, strength)
    })
}

fn hydrogen_bond(donor: SiteView, acceptor: SiteView, distance: f64, c: &InteractionCriteria) -> Option<Interaction> {
    if distance >= c.hbond_max_distance {
        return None;
    }
    let (hydrogen, h_pos) = donor.closest_hydrogen(acceptor.center())?;
    let angle = angle_at_deg(donor.center(), &h_pos, acceptor.center())?;
    if angle <= c.hbond_min_angle {
        return None;
    }
    let kind = InteractionKind::HydrogenBond;
    let strength =
        distance_strength(kind, distance, c.hbond_max_distance) * angle_strength(angle, c.hbond_min_angle);
    Some(record(
        kind,
        donor.to_ref(Some(hydrogen)),
        acceptor.to_ref(None),
        distance,
        angle,
        strength,
    ))
}

fn halogen_bond(donor: SiteView, acceptor: SiteView, distance: f64, c: &InteractionCriteria) -> Option<Interaction> {
    if !c.halogen_enabled || distance >= c.halogen_max_distance {
        return None;
    }
    let carbon = donor.geometry.anchor?;
    let partner = acceptor.geometry.anchor?;
    let donor_angle = angle_at_deg(&carbon, donor.center(), acceptor.center())?;
    let acceptor_angle = angle_at_deg(donor.center(), acceptor.center(), &partner)?;
    if (donor_angle - c.halogen_donor_angle).abs() > c.halogen_angle_tolerance
        || (acceptor_angle - c.halogen_acceptor_angle).abs() > c.halogen_angle_tolerance
    {
        return None;
    }
    let kind = InteractionKind::HalogenBond;
    let strength = distance_strength(kind, distance, c.halogen_max_distance);
    Some(record(kind, donor.to_ref(None), acceptor.to_ref(None), distance, donor_angle, strength))
}

fn salt_bridge(cation: SiteView, anion: SiteView, distance: f64, c: &InteractionCriteria) -> Option<Interaction> {
    let kind = InteractionKind::SaltBridge;
    (distance < c.salt_bridge_max_distance).then(|| {
        let strength = distance_strength(kind, distance, c.salt_bridge_max_distance);
        record(kind, cation.to_ref(None), anion.to_ref(None), distance, 0.0, strength)
    })
}

/// The cutoff shrinks linearly with the angle between the ring normal and
/// the ring-to-cation vector, by `pi_cation_angle_penalty` at 90 degrees.
fn pi_cation(ring: SiteView, cation: SiteView, distance: f64, c: &InteractionCriteria) -> Option<Interaction> {
    if distance >= c.pi_cation_max_distance {
        return None;
    }
    let normal = ring.geometry.normal?;
    let angle = angle_between_deg(&normal, &(cation.center() - ring.center()))
        .map(fold_to_acute)
        .unwrap_or(0.0);
    let cutoff = c.pi_cation_max_distance - c.pi_cation_angle_penalty * angle.min(90.0) / 90.0;
    if distance >= cutoff {
        return None;
    }
    let kind = InteractionKind::PiCation;
    let strength = distance_strength(kind, distance, cutoff);
    Some(record(kind, ring.to_ref(None), cation.to_ref(None), distance, angle, strength))
}

/// Parallel or T-shaped stacking: ring normals within the tolerance of 0 or
/// 90 degrees and one centre projecting close to the other ring's centre.
fn pi_stacking(a: SiteView, b: SiteView, distance: f64, c: &InteractionCriteria) -> Option<Interaction> {
    if distance >= c.pi_stacking_max_distance {
        return None;
    }
    let (na, nb) = (a.geometry.normal?, b.geometry.normal?);
    let angle = fold_to_acute(angle_between_deg(&na, &nb)?);
    let tolerance = c.pi_stacking_angle_tolerance;
    if angle > tolerance && angle < 90.0 - tolerance {
        return None;
    }
    let offset = in_plane_offset(b.center(), a.center(), &na).min(in_plane_offset(a.center(), b.center(), &nb));
    if offset >= c.pi_stacking_max_offset {
        return None;
    }
    let kind = InteractionKind::PiStacking;
    let strength = distance_strength(kind, distance, c.pi_stacking_max_distance);
    Some(record(kind, a.to_ref(None), b.to_ref(None), distance, angle, strength))
}

/// Partner first when it donates to the water oxygen, water first otherwise.
fn water_bridge(partner: SiteView, water: SiteView, distance: f64, c: &InteractionCriteria) -> Option<Interaction> {
    if distance < c.water_bridge_min_distance || distance > c.water_bridge_max_distance {
        return None;
    }
    let kind = InteractionKind::WaterBridge;
    let strength = distance_strength(kind, distance, c.water_bridge_max_distance);
    if partner.site.kind == SiteKind::Donor {
        let (hydrogen, h_pos) = partner.closest_hydrogen(water.center())?;
        let angle = angle_at_deg(partner.center(), &h_pos, water.center())?;
        if angle <= c.water_bridge_min_angle {
            return None;
        }
        Some(record(
            kind,
            partner.to_ref(Some(hydrogen)),
            water.to_ref(None),
            distance,
            angle,
            strength,
        ))
    } else {
        let angle = water
            .closest_hydrogen(partner.center())
            .and_then(|(_, h_pos)| angle_at_deg(water.center(), &h_pos, partner.center()))
            .unwrap_or(0.0);
        Some(record(kind, water.to_ref(None), partner.to_ref(None), distance, angle, strength))
    }
}

fn water_water(a: SiteView, b: SiteView, distance: f64, c: &InteractionCriteria) -> Option<Interaction> {
    let kind = InteractionKind::WaterWater;
    (distance < c.water_water_max_distance).then(|| {
        let strength = distance_strength(kind, distance, c.water_water_max_distance);
        record(kind, a.to_ref(None), b.to_ref(None), distance, 0.0, strength)
    })
}

/// Classifies every site pair between two molecules without deduplication.
///
/// When `same_molecule` is set, `a` and `b` are the same molecule: each
/// unordered pair is visited once and only sites on different disconnected
/// fragments are paired.
pub fn classify_sets(
    a: &SiteSet<'_>,
    b: &SiteSet<'_>,
    same_molecule: bool,
    criteria: &InteractionCriteria,
) -> Vec<Interaction> {
    let reach = criteria.max_cutoff();
    let reach_sq = reach * reach;
    let mut found = Vec::new();
    for i in 0..a.len() {
        let start = if same_molecule { i + 1 } else { 0 };
        for j in start..b.len() {
            if same_molecule && a.fragments[i] == b.fragments[j] {
                continue;
            }
            if nalgebra::distance_squared(&a.geometry[i].center, &b.geometry[j].center) > reach_sq {
                continue;
            }
            if let Some(interaction) = classify_pair(a.view(i), b.view(j), criteria) {
                found.push(interaction);
            }
        }
    }
    found
}

/// Classifies and deduplicates all contacts between two molecules.
pub fn detect(
    a: &SiteSet<'_>,
    b: &SiteSet<'_>,
    same_molecule: bool,
    criteria: &InteractionCriteria,
) -> InteractionSet {
    let raw = classify_sets(a, b, same_molecule, criteria);
    let candidates = raw.len();
    let set = dedup::resolve(raw);
    trace!(
        candidates,
        kept = set.values().map(Vec::len).sum::<usize>(),
        "Classified molecule pair"
    );
    set
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use nalgebra::{Unit, Vector3};
    use slotmap::SlotMap;

    pub(crate) fn molecule_ids() -> (MoleculeId, MoleculeId) {
        let mut ids: SlotMap<MoleculeId, ()> = SlotMap::with_key();
        (ids.insert(()), ids.insert(()))
    }

    pub(crate) fn point_site(kind: SiteKind, atom: usize) -> InteractionSite {
        InteractionSite::new(kind, vec![atom])
    }

    pub(crate) fn at(x: f64, y: f64, z: f64) -> SiteGeometry {
        SiteGeometry {
            center: Point3::new(x, y, z),
            normal: None,
            hydrogens: Vec::new(),
            anchor: None,
        }
    }

    fn view<'a>(molecule: MoleculeId, site: &'a InteractionSite, geometry: &'a SiteGeometry) -> SiteView<'a> {
        SiteView {
            molecule,
            index: 0,
            site,
            geometry,
        }
    }

    fn ring(normal: Vector3<f64>, center: Point3<f64>) -> (InteractionSite, SiteGeometry) {
        (
            InteractionSite::new(SiteKind::AromaticRing, vec![0, 1, 2, 3, 4, 5]),
            SiteGeometry {
                center,
                normal: Some(Unit::new_normalize(normal)),
                hydrogens: Vec::new(),
                anchor: None,
            },
        )
    }

    #[test]
    fn hydrophobic_contact_at_three_angstrom() {
        let (ma, mb) = molecule_ids();
        let site = point_site(SiteKind::Hydrophobic, 0);
        let (ga, gb) = (at(0.0, 0.0, 0.0), at(3.0, 0.0, 0.0));
        let hit = classify_pair(view(ma, &site, &ga), view(mb, &site, &gb), &InteractionCriteria::plip()).unwrap();
        assert_eq!(hit.kind, InteractionKind::Hydrophobic);
        assert!((hit.distance - 3.0).abs() < 1e-12);
        assert_eq!(hit.angle, 0.0);
        assert_eq!(hit.strength, 1.0);
    }

    #[test]
    fn hydrogen_bond_records_angle_and_hydrogen() {
        let (ma, mb) = molecule_ids();
        let donor = point_site(SiteKind::Donor, 0).with_hydrogens(vec![7]);
        let acceptor = point_site(SiteKind::Acceptor, 3);

        // D at the origin, H one Angstrom along x, A placed so D-H...A is
        // 150 degrees and D...A is 3.5 Angstrom.
        let (cos, sin) = (30f64.to_radians().cos(), 30f64.to_radians().sin());
        let t = (-2.0 * cos + (4.0 * cos * cos + 4.0 * (3.5f64 * 3.5 - 1.0)).sqrt()) / 2.0;
        let mut gd = at(0.0, 0.0, 0.0);
        gd.hydrogens = vec![Point3::new(1.0, 0.0, 0.0)];
        let ga = at(1.0 + t * cos, t * sin, 0.0);

        let hit =
            classify_pair(view(mb, &acceptor, &ga), view(ma, &donor, &gd), &InteractionCriteria::plip()).unwrap();
        assert_eq!(hit.kind, InteractionKind::HydrogenBond);
        assert!((hit.distance - 3.5).abs() < 1e-9);
        assert!((hit.angle - 150.0).abs() < 1e-6, "angle {}", hit.angle);
        assert_eq!(hit.first.molecule, ma);
        assert_eq!(hit.first.visible_atom, Some(7));
        assert_eq!(hit.second.visible_atom, None);
        assert!(hit.strength > MIN_STRENGTH && hit.strength < 1.0);
    }

    #[test]
    fn hydrogen_bond_needs_a_hydrogen_and_a_wide_angle() {
        let (ma, mb) = molecule_ids();
        let criteria = InteractionCriteria::plip();
        let bare = point_site(SiteKind::Donor, 0);
        let acceptor = point_site(SiteKind::Acceptor, 0);
        let (gd, ga) = (at(0.0, 0.0, 0.0), at(3.0, 0.0, 0.0));
        assert!(classify_pair(view(ma, &bare, &gd), view(mb, &acceptor, &ga), &criteria).is_none());

        let donor = point_site(SiteKind::Donor, 0).with_hydrogens(vec![1]);
        let mut bent = at(0.0, 0.0, 0.0);
        bent.hydrogens = vec![Point3::new(0.0, 1.0, 0.0)];
        // H sits perpendicular to D...A: the angle at H is well below 100.
        let near = at(0.5, 0.0, 0.0);
        let bent_bond = classify_pair(view(ma, &donor, &bent), view(mb, &acceptor, &near), &criteria);
        assert!(bent_bond.is_none());
    }

    #[test]
    fn symmetric_predicates_ignore_argument_order() {
        let (ma, mb) = molecule_ids();
        let criteria = InteractionCriteria::plip();
        let cases = [
            (SiteKind::Hydrophobic, SiteKind::Hydrophobic, 3.8),
            (SiteKind::PositiveCharge, SiteKind::NegativeCharge, 4.5),
            (SiteKind::Water, SiteKind::Water, 3.0),
        ];
        for (ka, kb, d) in cases {
            let (sa, sb) = (point_site(ka, 0), point_site(kb, 1));
            let (ga, gb) = (at(0.0, 0.0, 0.0), at(0.0, d, 0.0));
            let ab = classify_pair(view(ma, &sa, &ga), view(mb, &sb, &gb), &criteria).unwrap();
            let ba = classify_pair(view(mb, &sb, &gb), view(ma, &sa, &ga), &criteria).unwrap();
            assert_eq!(ab.kind, ba.kind);
            assert_eq!(ab.distance, ba.distance);
        }

        let (ra, ga) = ring(Vector3::z(), Point3::origin());
        let (rb, gb) = ring(Vector3::z(), Point3::new(0.5, 0.0, 3.6));
        let ab = classify_pair(view(ma, &ra, &ga), view(mb, &rb, &gb), &criteria).unwrap();
        let ba = classify_pair(view(mb, &rb, &gb), view(ma, &ra, &ga), &criteria).unwrap();
        assert_eq!(ab.kind, InteractionKind::PiStacking);
        assert_eq!(ab.kind, ba.kind);
        assert_eq!(ab.distance, ba.distance);
    }

    /// Classifies `a`/`b` in both orders and checks the results agree.
    fn in_both_orders(a: SiteView, b: SiteView, criteria: &InteractionCriteria) -> Interaction {
        let ab = classify_pair(a, b, criteria).unwrap();
        let ba = classify_pair(b, a, criteria).unwrap();
        assert_eq!(ab, ba);
        ab
    }

    #[test]
    fn directional_predicates_put_the_donor_first_in_either_order() {
        let (ma, mb) = molecule_ids();
        let criteria = InteractionCriteria::plip();

        let donor = point_site(SiteKind::Donor, 0).with_hydrogens(vec![7]);
        let mut gd = at(0.0, 0.0, 0.0);
        gd.hydrogens = vec![Point3::new(1.0, 0.0, 0.0)];
        let acceptor = point_site(SiteKind::Acceptor, 3);
        let ga = at(2.9, 0.0, 0.0);
        let hbond = in_both_orders(view(ma, &donor, &gd), view(mb, &acceptor, &ga), &criteria);
        assert_eq!(hbond.kind, InteractionKind::HydrogenBond);
        assert!((hbond.distance - 2.9).abs() < 1e-12);
        assert_eq!((hbond.first.molecule, hbond.second.molecule), (ma, mb));
        assert_eq!(hbond.first.visible_atom, Some(7));

        let halogen = point_site(SiteKind::HalogenDonor, 0).with_anchor(1);
        let mut gx = at(0.0, 0.0, 0.0);
        gx.anchor = Some(Point3::new(-1.8, 0.0, 0.0));
        let halogen_acceptor = point_site(SiteKind::HalogenAcceptor, 0).with_anchor(1);
        let mut gy = at(3.2, 0.0, 0.0);
        gy.anchor = Some(Point3::new(3.2 + 1.2 * 0.5, 1.2 * 3f64.sqrt() / 2.0, 0.0));
        let xbond = in_both_orders(view(ma, &halogen, &gx), view(mb, &halogen_acceptor, &gy), &criteria);
        assert_eq!(xbond.kind, InteractionKind::HalogenBond);
        assert!((xbond.distance - 3.2).abs() < 1e-12);
        assert_eq!((xbond.first.molecule, xbond.second.molecule), (ma, mb));

        let (ring_site, ring_geom) = ring(Vector3::z(), Point3::origin());
        let cation = point_site(SiteKind::PositiveCharge, 9);
        let above = at(0.0, 0.0, 4.0);
        let pi = in_both_orders(view(ma, &ring_site, &ring_geom), view(mb, &cation, &above), &criteria);
        assert_eq!(pi.kind, InteractionKind::PiCation);
        assert!((pi.distance - 4.0).abs() < 1e-12);
        assert_eq!((pi.first.molecule, pi.second.molecule), (ma, mb));
        assert_eq!(pi.second.atoms, vec![9]);

        let water = point_site(SiteKind::Water, 0);
        let gw = at(0.0, 0.0, 0.0);
        let partner = point_site(SiteKind::Donor, 4).with_hydrogens(vec![5]);
        let mut gp = at(3.0, 0.0, 0.0);
        gp.hydrogens = vec![Point3::new(2.0, 0.0, 0.0)];
        let bridge = in_both_orders(view(ma, &water, &gw), view(mb, &partner, &gp), &criteria);
        assert_eq!(bridge.kind, InteractionKind::WaterBridge);
        assert!((bridge.distance - 3.0).abs() < 1e-12);
        assert_eq!((bridge.first.molecule, bridge.second.molecule), (mb, ma));
        assert_eq!(bridge.first.visible_atom, Some(5));
    }

    #[test]
    fn rings_eight_angstrom_apart_do_not_stack() {
        let (ma, mb) = molecule_ids();
        let (ra, ga) = ring(Vector3::z(), Point3::origin());
        let (rb, gb) = ring(Vector3::z(), Point3::new(0.0, 0.0, 8.0));
        assert!(classify_pair(view(ma, &ra, &ga), view(mb, &rb, &gb), &InteractionCriteria::plip()).is_none());
    }

    #[test]
    fn t_shaped_stacking_is_accepted_but_oblique_is_not() {
        let (ma, mb) = molecule_ids();
        let criteria = InteractionCriteria::plip();
        let (ra, ga) = ring(Vector3::z(), Point3::origin());
        let (rb, gb) = ring(Vector3::x(), Point3::new(0.0, 0.0, 5.0));
        let hit = classify_pair(view(ma, &ra, &ga), view(mb, &rb, &gb), &criteria).unwrap();
        assert!((hit.angle - 90.0).abs() < 1e-9);

        let (rc, gc) = ring(Vector3::new(1.0, 0.0, 1.0), Point3::new(0.0, 0.0, 4.0));
        assert!(classify_pair(view(ma, &ra, &ga), view(mb, &rc, &gc), &criteria).is_none());
    }

    #[test]
    fn pi_cation_cutoff_shrinks_off_axis() {
        let (ma, mb) = molecule_ids();
        let criteria = InteractionCriteria::plip();
        let (ring_site, ring_geom) = ring(Vector3::z(), Point3::origin());
        let cation = point_site(SiteKind::PositiveCharge, 9);

        let above = at(0.0, 0.0, 6.0);
        let hit = classify_pair(view(mb, &cation, &above), view(ma, &ring_site, &ring_geom), &criteria).unwrap();
        assert_eq!(hit.kind, InteractionKind::PiCation);
        assert_eq!(hit.first.molecule, ma);
        assert!(hit.angle.abs() < 1e-9);

        let beside = at(6.0, 0.0, 0.0);
        assert!(classify_pair(view(ma, &ring_site, &ring_geom), view(mb, &cation, &beside), &criteria).is_none());
    }

    #[test]
    fn halogen_bond_checks_both_angles() {
        let (ma, mb) = molecule_ids();
        let criteria = InteractionCriteria::plip();
        let donor = point_site(SiteKind::HalogenDonor, 0).with_anchor(1);
        let acceptor = point_site(SiteKind::HalogenAcceptor, 0).with_anchor(1);

        let mut gx = at(0.0, 0.0, 0.0);
        gx.anchor = Some(Point3::new(-1.8, 0.0, 0.0));
        let mut gy = at(3.2, 0.0, 0.0);
        // Y-Z at 120 degrees to the X...Y axis.
        gy.anchor = Some(Point3::new(3.2 + 1.2 * 0.5, 1.2 * 3f64.sqrt() / 2.0, 0.0));
        let hit = classify_pair(view(ma, &donor, &gx), view(mb, &acceptor, &gy), &criteria).unwrap();
        assert_eq!(hit.kind, InteractionKind::HalogenBond);
        assert!((hit.angle - 180.0).abs() < 1e-9);

        assert!(classify_pair(
            view(ma, &donor, &gx),
            view(mb, &acceptor, &gy),
            &InteractionCriteria::pharmacophore()
        )
        .is_none());
    }

    #[test]
    fn water_bridge_respects_distance_window() {
        let (ma, mb) = molecule_ids();
        let criteria = InteractionCriteria::plip();
        let water = point_site(SiteKind::Water, 0);
        let acceptor = point_site(SiteKind::Acceptor, 4);
        let gw = at(0.0, 0.0, 0.0);
        let hit = classify_pair(view(ma, &acceptor, &at(3.0, 0.0, 0.0)), view(mb, &water, &gw), &criteria).unwrap();
        assert_eq!(hit.kind, InteractionKind::WaterBridge);
        assert_eq!(hit.first.molecule, mb);
        assert!(classify_pair(view(ma, &acceptor, &at(2.0, 0.0, 0.0)), view(mb, &water, &gw), &criteria).is_none());
    }

    #[test]
    fn strength_falls_off_past_optimum() {
        let kind = InteractionKind::Hydrophobic;
        assert_eq!(distance_strength(kind, 3.0, 4.0), 1.0);
        assert!((distance_strength(kind, 3.75, 4.0) - 0.5).abs() < 1e-12);
        assert_eq!(distance_strength(kind, 4.0, 4.0), MIN_STRENGTH);
    }

    #[test]
    fn self_pairs_skip_sites_on_the_same_fragment() {
        let (ma, _) = molecule_ids();
        let sites = vec![
            point_site(SiteKind::Hydrophobic, 0),
            point_site(SiteKind::Hydrophobic, 1),
            point_site(SiteKind::Hydrophobic, 2),
        ];
        let geometry = vec![at(0.0, 0.0, 0.0), at(1.5, 0.0, 0.0), at(3.5, 0.0, 0.0)];
        let fragments = vec![0, 0, 1];
        let set = SiteSet {
            molecule: ma,
            sites: &sites,
            geometry: &geometry,
            fragments: &fragments,
        };
        let found = classify_sets(&set, &set, true, &InteractionCriteria::plip());
        let pairs: Vec<(usize, usize)> = found.iter().map(|i| (i.first.site, i.second.site)).collect();
        assert_eq!(pairs, vec![(0, 2), (1, 2)]);
    }
}
