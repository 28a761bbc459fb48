//! Grain neighborhoods measured in equivalent radii.

use crate::grain::GrainArena;
use microstat_math::Vec3;

/// Count, for every active grain, the other grains whose centroids lie
/// within 1, 2 and 3 of its equivalent radii.
///
/// The shells are cumulative: a grain within one radius also counts toward
/// the second and third. Requires centroids and diameters.
pub fn find_neighborhoods(grains: &mut GrainArena) {
    let snapshot: Vec<(usize, Vec3)> = grains.active().map(|(id, g)| (id, g.centroid)).collect();
    for (id, grain) in grains.active_mut() {
        let mut counts = [0u32; 3];
        let radius = grain.equivalent_diameter / 2.0;
        if radius > 0.0 {
            for &(other, centroid) in &snapshot {
                if other == id {
                    continue;
                }
                let ratio = (grain.centroid - centroid).norm() / radius;
                for (k, count) in counts.iter_mut().enumerate() {
                    if ratio < (k + 1) as f64 {
                        *count += 1;
                    }
                }
            }
        }
        grain.neighborhood = counts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(grains: &mut GrainArena, id: usize, x: f64, diameter: f64) {
        let g = grains.get_or_insert(id);
        g.active = true;
        g.centroid = Vec3::new(x, 0.0, 0.0);
        g.equivalent_diameter = diameter;
    }

    #[test]
    fn test_cumulative_shells() {
        let mut grains = GrainArena::new();
        place(&mut grains, 1, 0.0, 2.0);
        place(&mut grains, 2, 0.5, 2.0);
        place(&mut grains, 3, 1.5, 2.0);
        place(&mut grains, 4, 2.5, 2.0);
        place(&mut grains, 5, 10.0, 2.0);
        find_neighborhoods(&mut grains);
        assert_eq!(grains[1].neighborhood, [1, 2, 3]);
        assert_eq!(grains[5].neighborhood, [0, 0, 0]);
    }

    #[test]
    fn test_uses_own_radius() {
        let mut grains = GrainArena::new();
        place(&mut grains, 1, 0.0, 4.0);
        place(&mut grains, 2, 1.4, 1.0);
        find_neighborhoods(&mut grains);
        assert_eq!(grains[1].neighborhood, [1, 1, 1]);
        assert_eq!(grains[2].neighborhood, [0, 0, 1]);
    }
}
