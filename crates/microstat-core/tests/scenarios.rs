//! End-to-end characterization scenarios.

use approx::assert_relative_eq;
use microstat_core::{
    characterize, find_neighbors, find_surface_grains, CharacterizeSettings, FaceAreaConvention,
    Geometry, GrainArena, Microstructure, PhaseInfo, PhaseTable, TrendBin,
};
use microstat_math::{Euler, Vec3};
use microstat_symmetry::{ops_for, CrystalStructure};

fn cubic() -> PhaseTable {
    PhaseTable::new(vec![PhaseInfo::primary(CrystalStructure::Cubic)])
}

/// 8x8x8 grid split among Voronoi cells of fixed seeds, each cell with its
/// own orientation.
fn voronoi() -> Microstructure {
    let geometry = Geometry::new([8, 8, 8], [1.0, 1.0, 1.5]);
    let seeds = [
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(6.0, 2.0, 3.0),
        Vec3::new(3.0, 6.0, 6.0),
        Vec3::new(6.5, 6.5, 9.0),
        Vec3::new(4.0, 4.0, 5.0),
        Vec3::new(1.5, 6.0, 10.0),
    ];
    let n = geometry.voxel_count();
    let mut ids = Vec::with_capacity(n);
    let mut eulers = Vec::with_capacity(n);
    for i in 0..n {
        let p = geometry.position(i);
        let (best, _) = seeds
            .iter()
            .enumerate()
            .map(|(k, s)| (k, (p - s).norm()))
            .fold((0, f64::MAX), |acc, x| if x.1 < acc.1 { x } else { acc });
        ids.push(best as i32 + 1);
        let t = best as f32;
        eulers.push([0.3 * t, 0.2 * t + 0.1, 0.15 * t]);
    }
    Microstructure::new(geometry, ids, vec![1; n], eulers)
}

#[test]
fn test_single_grain_grid() {
    let g = Geometry::new([3, 3, 3], [1.0; 3]);
    let m = Microstructure::single_phase(g, vec![1; 27]);
    let result = characterize(&m, &cubic(), &CharacterizeSettings::default()).unwrap();

    assert_eq!(result.grains.active_count(), 1);
    let grain = &result.grains[1];
    assert_eq!(grain.neighbor_count(), 0);
    assert!(grain.gam < 1e-3);
    assert!(grain.surface_grain);
    assert_relative_eq!(result.phases[1].total_boundary_area, 0.0);
    // no boundary at all, so the MDF stays empty
    assert!(result.statistics[0].mdf.iter().all(|&v| v == 0.0));
}

#[test]
fn test_two_layer_scenario() {
    let g = Geometry::new([2, 2, 2], [1.0; 3]);
    let m = Microstructure::single_phase(g, vec![1, 1, 1, 1, 2, 2, 2, 2]);
    let result = characterize(&m, &cubic(), &CharacterizeSettings::default()).unwrap();
    let grains = &result.grains;

    // 2 x 2 faces of 1 x 1
    assert_eq!(grains[1].neighbors.len(), 1);
    assert_relative_eq!(grains[1].neighbors[&2], 4.0);
    assert_relative_eq!(grains[2].neighbors[&1], 4.0);
    assert!(grains[1].gam < 1e-3);
    assert!(grains[2].gam < 1e-3);

    let mdf = &result.statistics[0].mdf;
    assert_relative_eq!(mdf[0], 1.0, epsilon = 1e-12);
    assert_relative_eq!(mdf.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_two_phase_mdfs_sum_to_one() {
    let g = Geometry::new([4, 1, 1], [1.0; 3]);
    let m = Microstructure::new(g, vec![1, 2, 3, 4], vec![1, 1, 2, 2], vec![[0.0; 3]; 4]);
    let table = PhaseTable::new(vec![
        PhaseInfo::primary(CrystalStructure::Cubic),
        PhaseInfo::primary(CrystalStructure::Cubic),
    ]);
    let result = characterize(&m, &table, &CharacterizeSettings::default()).unwrap();

    // the 2|3 face is an interphase boundary and belongs to neither total
    assert_relative_eq!(result.phases[1].total_boundary_area, 1.0);
    assert_relative_eq!(result.phases[2].total_boundary_area, 1.0);
    for stats in &result.statistics {
        assert_relative_eq!(stats.mdf.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(stats.mdf[0], 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_deformation_trends_across_one_boundary() {
    let g = Geometry::new([4, 1, 1], [1.0; 3]);
    let turn = 15.0_f32.to_radians();
    let eulers = vec![[0.0; 3], [0.0; 3], [turn, 0.0, 0.0], [turn, 0.0, 0.0]];
    let m = Microstructure::new(g, vec![1, 1, 2, 2], vec![1; 4], eulers);
    let result = characterize(&m, &cubic(), &CharacterizeSettings::default()).unwrap();
    let d = &result.deformation;

    // uniform grains, and 15 degrees is past the kernel cutoff
    assert_eq!(d.kam_distribution[0], 4);
    assert_eq!(d.gam_distribution[0], 4);

    let counts = |t: &[TrendBin]| t.iter().map(|b| b.count).collect::<Vec<_>>();
    assert_eq!(&counts(&d.versus_boundary_distance)[..2], &[2, 2]);
    // no voxel touches two other grains
    assert!(counts(&d.versus_triple_line_distance).iter().all(|&c| c == 0));

    assert_eq!(d.versus_disorientation[1].count, 4);
    assert_eq!(counts(&d.versus_schmid_mismatch).iter().sum::<usize>(), 4);
    assert_eq!(counts(&d.versus_slip_transmission).iter().sum::<usize>(), 4);
    assert_eq!(d.disorientation_by_distance[0][1].count, 2);
    assert_eq!(d.disorientation_by_distance[1][1].count, 2);
    assert_relative_eq!(d.versus_boundary_distance[0].kam, 0.0, epsilon = 1e-3);
}

#[test]
fn test_voxel_counts_match_labels() {
    let m = voronoi();
    let result = characterize(&m, &cubic(), &CharacterizeSettings::default()).unwrap();
    for (id, grain) in result.grains.active() {
        let count = m.grain_ids.iter().filter(|&&g| g as usize == id).count();
        assert_eq!(grain.voxel_count, count);
    }
}

#[test]
fn test_neighbor_relation_is_symmetric() {
    let m = voronoi();
    let result = characterize(&m, &cubic(), &CharacterizeSettings::default()).unwrap();
    let grains = &result.grains;
    for (id, grain) in grains.active() {
        for (&other, &area) in &grain.neighbors {
            assert_eq!(grains[other].neighbors.get(&id), Some(&area));
            assert_eq!(
                grains[other].misorientations.get(&id),
                grain.misorientations.get(&other)
            );
        }
    }
}

#[test]
fn test_phase_volume_sums() {
    let m = voronoi();
    let result = characterize(&m, &cubic(), &CharacterizeSettings::default()).unwrap();
    let sum: f64 = result.grains.active().map(|(_, g)| g.volume).sum();
    assert_relative_eq!(sum, result.phases[1].total_volume, epsilon = 1e-9);
    assert_relative_eq!(sum, 8.0 * 8.0 * 8.0 * 1.5, epsilon = 1e-9);
    assert_relative_eq!(result.phases[1].fraction, 1.0, epsilon = 1e-12);
}

#[test]
fn test_shape_ranges() {
    let m = voronoi();
    let result = characterize(&m, &cubic(), &CharacterizeSettings::default()).unwrap();
    for (_, g) in result.grains.active() {
        assert!((0.0..=1.0).contains(&g.b_over_a));
        assert!((0.0..=1.0).contains(&g.c_over_a));
        assert!(g.c_over_a <= g.b_over_a + 1e-9);
        assert!((0.0..=1.0).contains(&g.omega3));
    }
}

#[test]
fn test_mdf_sums_to_one() {
    let m = voronoi();
    let result = characterize(&m, &cubic(), &CharacterizeSettings::default()).unwrap();
    let total: f64 = result.statistics[0].mdf.iter().sum();
    assert_relative_eq!(total, 1.0, epsilon = 1e-9);
}

#[test]
fn test_neighbor_pass_is_idempotent() {
    let m = voronoi();
    let mut grains = GrainArena::from_microstructure(&m);
    find_surface_grains(&m, &mut grains);
    let first = find_neighbors(&m, &mut grains, FaceAreaConvention::XyPlane, 2);
    let lists: Vec<_> = grains.active().map(|(_, g)| g.neighbors.clone()).collect();
    let second = find_neighbors(&m, &mut grains, FaceAreaConvention::XyPlane, 2);
    let again: Vec<_> = grains.active().map(|(_, g)| g.neighbors.clone()).collect();
    assert_eq!(lists, again);
    assert_eq!(first.total_boundary_area, second.total_boundary_area);
    assert_eq!(first.surface_voxel, second.surface_voxel);
}

#[test]
fn test_euler_round_trip_modulo_symmetry() {
    let ops = ops_for(CrystalStructure::Cubic).unwrap();
    for (a, b, c) in [(10.0, 20.0, 30.0), (250.0, 95.0, 310.0), (45.0, 0.0, 0.0)] {
        let e = Euler::from_degrees(a, b, c);
        let q = ops.euler_to_quat(&e);
        let back = Euler::from_quat(&ops.reduce_to_fundamental_zone(&q));
        let d = ops.disorientation(&q, &back.to_quat());
        assert!(d.degrees() < 1e-3);
    }
}

#[test]
fn test_two_dimensional_section() {
    let g = Geometry::new([6, 4, 1], [1.0; 3]);
    let ids: Vec<i32> = (0..24).map(|i| if i % 6 < 2 { 1 } else { 2 }).collect();
    let m = Microstructure::single_phase(g, ids);
    let result = characterize(&m, &cubic(), &CharacterizeSettings::default()).unwrap();
    let grains = &result.grains;

    assert_relative_eq!(grains[1].volume, 8.0);
    // one x-crossing face per row
    assert_relative_eq!(grains[1].neighbors[&2], 4.0);
    for (_, grain) in grains.active() {
        assert_eq!(grain.c_over_a, 0.0);
        assert_eq!(grain.omega3, 0.0);
        assert!(grain.b_over_a > 0.0 && grain.b_over_a <= 1.0);
    }
    // a 4 x 4 block is as round as a square gets
    assert_relative_eq!(grains[2].b_over_a, 1.0, epsilon = 1e-9);
}

#[test]
fn test_distance_channels() {
    let m = voronoi();
    let result = characterize(&m, &cubic(), &CharacterizeSettings::default()).unwrap();
    let gb = result.distances.boundary.as_ref().unwrap();
    for (i, &d) in gb.distance.iter().enumerate() {
        assert!(d >= 0.0);
        let seed = gb.nearest[i] as usize;
        assert_eq!(gb.distance[seed], 0.0);
    }
}
