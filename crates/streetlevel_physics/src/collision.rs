//! Collision groups and the pairwise collision policy
//!
//! Every body belongs to one or more groups and carries a mask of the groups it
//! is willing to collide with. Two bodies A and B collide iff:
//! - (A.group & B.mask) != 0, AND
//! - (B.group & A.mask) != 0
//!
//! Each logical category has exactly one fixed (group, mask) pair, so the
//! policy is uniform across the whole simulation.

use bitflags::bitflags;
use rapier3d::prelude::{Group, InteractionGroups};

bitflags! {
    /// Collision groups a body can belong to
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CollisionGroups: u32 {
        /// Terrain and static world geometry (ground plane, extracted boxes)
        const DEFAULT = 1 << 0;
        /// Player and other character bodies
        const CHARACTERS = 1 << 1;
        /// Decorative/interior triangle meshes that must not obstruct vehicles
        const TRIMESH_COLLIDERS = 1 << 2;
        /// Vehicle chassis and wheels
        const VEHICLES = 1 << 3;
        /// Every group above
        const ALL = Self::DEFAULT.bits()
            | Self::CHARACTERS.bits()
            | Self::TRIMESH_COLLIDERS.bits()
            | Self::VEHICLES.bits();
    }
}

/// Masks for each category, computed once at compile time
pub mod masks {
    use super::CollisionGroups;

    /// Terrain and static geometry is detected by everything
    pub const TERRAIN: CollisionGroups = CollisionGroups::ALL;
    /// Characters pass through decorative triangle meshes
    pub const CHARACTER: CollisionGroups =
        CollisionGroups::ALL.difference(CollisionGroups::TRIMESH_COLLIDERS);
    /// Trimesh colliders accept anything; other masks decide
    pub const TRIMESH: CollisionGroups = CollisionGroups::ALL;
    /// Vehicle bodies hit everything except decorative triangle meshes
    pub const VEHICLE_BODY: CollisionGroups =
        CollisionGroups::ALL.difference(CollisionGroups::TRIMESH_COLLIDERS);
    /// Wheels only touch the ground
    pub const VEHICLE_WHEEL: CollisionGroups = CollisionGroups::DEFAULT;
    /// Ground probes only detect terrain/static geometry
    pub const CHARACTER_GROUND_PROBE: CollisionGroups = CollisionGroups::DEFAULT;
}

/// Logical collision categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollisionCategory {
    Terrain,
    Character,
    TrimeshCollider,
    VehicleBody,
    VehicleWheel,
    CharacterGroundProbe,
}

impl CollisionCategory {
    /// The canonical filter for this category
    pub const fn filter(self) -> CollisionFilter {
        match self {
            CollisionCategory::Terrain => CollisionFilter::TERRAIN,
            CollisionCategory::Character => CollisionFilter::CHARACTER,
            CollisionCategory::TrimeshCollider => CollisionFilter::TRIMESH,
            CollisionCategory::VehicleBody => CollisionFilter::VEHICLE_BODY,
            CollisionCategory::VehicleWheel => CollisionFilter::VEHICLE_WHEEL,
            CollisionCategory::CharacterGroundProbe => CollisionFilter::CHARACTER_GROUND_PROBE,
        }
    }
}

/// Collision filter determining what an object collides with
///
/// - `group`: Which group(s) this object belongs to
/// - `mask`: Which group(s) this object can collide with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CollisionFilter {
    /// Which group(s) this object belongs to
    pub group: CollisionGroups,
    /// Which group(s) this object can collide with
    pub mask: CollisionGroups,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::TERRAIN
    }
}

impl CollisionFilter {
    pub const TERRAIN: Self = Self::new(CollisionGroups::DEFAULT, masks::TERRAIN);
    pub const CHARACTER: Self = Self::new(CollisionGroups::CHARACTERS, masks::CHARACTER);
    pub const TRIMESH: Self = Self::new(CollisionGroups::TRIMESH_COLLIDERS, masks::TRIMESH);
    pub const VEHICLE_BODY: Self = Self::new(CollisionGroups::VEHICLES, masks::VEHICLE_BODY);
    pub const VEHICLE_WHEEL: Self = Self::new(CollisionGroups::VEHICLES, masks::VEHICLE_WHEEL);
    pub const CHARACTER_GROUND_PROBE: Self =
        Self::new(CollisionGroups::CHARACTERS, masks::CHARACTER_GROUND_PROBE);

    /// Create a new collision filter with specified group and mask
    pub const fn new(group: CollisionGroups, mask: CollisionGroups) -> Self {
        Self { group, mask }
    }

    /// Check if this filter allows collision with another filter
    pub fn collides_with(&self, other: &Self) -> bool {
        should_collide(self.group, self.mask, other.group, other.mask)
    }

    /// Convert to rapier interaction groups
    ///
    /// Rapier performs the same symmetric AND-test on memberships/filters.
    pub fn interaction_groups(&self) -> InteractionGroups {
        InteractionGroups::all()
            .with_memberships(Group::from_bits_truncate(self.group.bits()))
            .with_filter(Group::from_bits_truncate(self.mask.bits()))
    }
}

/// Symmetric group/mask test: both sides must accept each other
pub fn should_collide(
    group_a: CollisionGroups,
    mask_a: CollisionGroups,
    group_b: CollisionGroups,
    mask_b: CollisionGroups,
) -> bool {
    group_a.intersects(mask_b) && group_b.intersects(mask_a)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATEGORIES: [CollisionCategory; 6] = [
        CollisionCategory::Terrain,
        CollisionCategory::Character,
        CollisionCategory::TrimeshCollider,
        CollisionCategory::VehicleBody,
        CollisionCategory::VehicleWheel,
        CollisionCategory::CharacterGroundProbe,
    ];

    #[test]
    fn test_groups_are_disjoint() {
        let groups = [
            CollisionGroups::DEFAULT,
            CollisionGroups::CHARACTERS,
            CollisionGroups::TRIMESH_COLLIDERS,
            CollisionGroups::VEHICLES,
        ];
        for (i, a) in groups.iter().enumerate() {
            assert_eq!(a.bits().count_ones(), 1);
            for b in groups.iter().skip(i + 1) {
                assert!(!a.intersects(*b));
            }
        }
    }

    #[test]
    fn test_should_collide_is_symmetric() {
        for a in CATEGORIES {
            for b in CATEGORIES {
                let fa = a.filter();
                let fb = b.filter();
                assert_eq!(fa.collides_with(&fb), fb.collides_with(&fa), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_one_sided_acceptance_is_not_enough() {
        // A accepts B, but B does not accept A
        assert!(!should_collide(
            CollisionGroups::DEFAULT,
            CollisionGroups::ALL,
            CollisionGroups::CHARACTERS,
            CollisionGroups::VEHICLES,
        ));
    }

    #[test]
    fn test_character_never_hits_trimesh_for_any_mask() {
        let character = CollisionFilter::CHARACTER;
        for bits in 0..=CollisionGroups::ALL.bits() {
            let mask = CollisionGroups::from_bits_truncate(bits);
            assert!(!should_collide(
                character.group,
                character.mask,
                CollisionGroups::TRIMESH_COLLIDERS,
                mask,
            ));
        }
    }

    #[test]
    fn test_vehicle_body_ignores_trimesh() {
        assert!(!CollisionFilter::VEHICLE_BODY.collides_with(&CollisionFilter::TRIMESH));
        assert!(CollisionFilter::VEHICLE_BODY.collides_with(&CollisionFilter::TERRAIN));
        assert!(CollisionFilter::VEHICLE_BODY.collides_with(&CollisionFilter::CHARACTER));
    }

    #[test]
    fn test_wheels_only_touch_terrain() {
        let wheel = CollisionFilter::VEHICLE_WHEEL;
        assert!(wheel.collides_with(&CollisionFilter::TERRAIN));
        assert!(!wheel.collides_with(&CollisionFilter::CHARACTER));
        assert!(!wheel.collides_with(&CollisionFilter::VEHICLE_BODY));
        assert!(!wheel.collides_with(&CollisionFilter::TRIMESH));
    }

    #[test]
    fn test_ground_probe_only_detects_terrain() {
        let probe = CollisionFilter::CHARACTER_GROUND_PROBE;
        assert!(probe.collides_with(&CollisionFilter::TERRAIN));
        assert!(!probe.collides_with(&CollisionFilter::TRIMESH));
        assert!(!probe.collides_with(&CollisionFilter::VEHICLE_BODY));
        assert!(!probe.collides_with(&CollisionFilter::CHARACTER));
    }

    #[test]
    fn test_trimesh_still_hits_terrain_category() {
        assert!(CollisionFilter::TRIMESH.collides_with(&CollisionFilter::TERRAIN));
    }

    #[test]
    fn test_interaction_groups_carry_bits() {
        let groups = CollisionFilter::VEHICLE_WHEEL.interaction_groups();
        assert_eq!(groups.memberships.bits(), CollisionGroups::VEHICLES.bits());
        assert_eq!(groups.filter.bits(), CollisionGroups::DEFAULT.bits());
    }
}
