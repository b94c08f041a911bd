//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree built by sorting primitives along the longest axis of their
//! combined bounds and splitting at the median. Children are shared trait
//! objects, so a subtree can be a primitive, a list, another BVH or an
//! instance wrapper.

use crate::{HitRecord, Hittable, HittableList};
use std::cmp::Ordering;
use std::sync::Arc;
use umbra_math::{Aabb, Interval, Ray};

/// BVH node - either a branch with two children or the empty tree.
///
/// A single primitive is stored as a branch whose children are the same
/// object; traversal then tests it twice, which is harmless because the
/// second test is bounded by the first hit.
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Arc<dyn Hittable>,
        right: Arc<dyn Hittable>,
        bbox: Aabb,
    },
    /// Empty node (for edge cases).
    Empty,
}

impl BvhNode {
    /// Create a BVH from a list of hittable objects.
    pub fn new(mut objects: Vec<Arc<dyn Hittable>>) -> Self {
        if objects.is_empty() {
            return BvhNode::Empty;
        }
        let bvh = Self::build(&mut objects);
        log::debug!("Built BVH over {} objects", objects.len());
        bvh
    }

    /// Create a BVH over every object of a list.
    pub fn from_list(list: HittableList) -> Self {
        Self::new(list.into_objects())
    }

    /// Recursive BVH construction over `objects`.
    fn build(objects: &mut [Arc<dyn Hittable>]) -> Self {
        let bbox = objects
            .iter()
            .fold(Aabb::EMPTY, |acc, o| Aabb::surrounding(&acc, &o.bounding_box()));

        let (left, right): (Arc<dyn Hittable>, Arc<dyn Hittable>) = match objects.len() {
            1 => (objects[0].clone(), objects[0].clone()),
            2 => (objects[0].clone(), objects[1].clone()),
            _ => {
                let axis = bbox.longest_axis();
                objects.sort_unstable_by(|a, b| box_compare(a.as_ref(), b.as_ref(), axis));

                // Split at midpoint
                let (lo, hi) = objects.split_at_mut(objects.len() / 2);
                (Arc::new(Self::build(lo)), Arc::new(Self::build(hi)))
            }
        };

        BvhNode::Branch { left, right, bbox }
    }
}

/// Order by bbox minimum on `axis`, then by maximum.
fn box_compare(a: &dyn Hittable, b: &dyn Hittable, axis: usize) -> Ordering {
    let a_interval = a.bounding_box().axis_interval(axis);
    let b_interval = b.bounding_box().axis_interval(axis);
    a_interval
        .min
        .partial_cmp(&b_interval.min)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            a_interval
                .max
                .partial_cmp(&b_interval.max)
                .unwrap_or(Ordering::Equal)
        })
}

impl Hittable for BvhNode {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        match self {
            BvhNode::Empty => None,

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = left.hit(ray, ray_t);

                // Only check right up to closest hit
                let right_max = hit_left.map_or(ray_t.max, |rec| rec.t);
                let hit_right = right.hit(ray, Interval::new(ray_t.min, right_max));

                hit_right.or(hit_left)
            }
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Material, Sphere};
    use umbra_math::{Color, Vec3};

    fn sphere(center: Vec3, radius: f32) -> Arc<dyn Hittable> {
        let material: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5)));
        Arc::new(Sphere::new(center, radius, material))
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = BvhNode::new(vec![]);
        assert!(matches!(bvh, BvhNode::Empty));
        assert!(bvh.hit(&Ray::default(), Interval::UNIVERSE).is_none());
        assert_eq!(bvh.bounding_box(), Aabb::EMPTY);
    }

    #[test]
    fn test_bvh_single_sphere() {
        let only = sphere(Vec3::new(0.0, 0.0, -1.0), 0.5);
        let bvh = BvhNode::new(vec![only.clone()]);

        // Both children share the one primitive
        let BvhNode::Branch { left, right, .. } = &bvh else {
            panic!("expected a branch");
        };
        assert!(Arc::ptr_eq(left, &only));
        assert!(Arc::ptr_eq(right, &only));

        // Test ray hit
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0.0);
        let rec = bvh.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.t - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_bvh_multiple_spheres() {
        let spheres: Vec<Arc<dyn Hittable>> = (0..10)
            .map(|i| sphere(Vec3::new(i as f32, 0.0, -5.0), 0.5))
            .collect();

        let bvh = BvhNode::new(spheres);

        // Test ray that hits sphere at x=5
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0), 0.0);
        let rec = bvh.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();

        // Hit point should be near z = -4.5 (sphere at z=-5, radius 0.5)
        assert!((rec.p.z - (-4.5)).abs() < 0.01);

        let bbox = bvh.bounding_box();
        assert_eq!(bbox.x.min, -0.5);
        assert_eq!(bbox.x.max, 9.5);
    }

    #[test]
    fn test_bvh_picks_closest_across_children() {
        // Same line of sight, inserted far-to-near so the near one sorts left
        let spheres = vec![
            sphere(Vec3::new(0.0, 0.0, -9.0), 0.5),
            sphere(Vec3::new(0.0, 0.0, -3.0), 0.5),
            sphere(Vec3::new(0.0, 0.0, -6.0), 0.5),
        ];
        let bvh = BvhNode::new(spheres);

        let toward = Ray::new_simple(Vec3::ZERO, -Vec3::Z);
        let rec = bvh.hit(&toward, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.t - 2.5).abs() < 1e-4);

        // Reverse direction from beyond the far sphere
        let back = Ray::new_simple(Vec3::new(0.0, 0.0, -20.0), Vec3::Z);
        let rec = bvh.hit(&back, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.t - 10.5).abs() < 1e-4);
    }

    #[test]
    fn test_box_compare_tie_breaks_on_max() {
        let small = sphere(Vec3::new(1.0, 0.0, 0.0), 1.0);
        let large = sphere(Vec3::new(2.0, 0.0, 0.0), 2.0);
        // Both start at x = 0
        assert_eq!(box_compare(small.as_ref(), large.as_ref(), 0), Ordering::Less);
        assert_eq!(box_compare(large.as_ref(), small.as_ref(), 0), Ordering::Greater);
    }
}
