//! Job runner: loads the volume, characterizes it and writes the reports.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use microstat_core::{
    characterize, write_deformation_json, write_grain_table, write_statistics_json,
    Characterization, DistanceMaps, Microstructure,
};

use crate::config::JobConfig;

/// Per-voxel output written to voxels.json.
#[derive(Serialize)]
struct VoxelReport<'a> {
    dims: [usize; 3],
    kernel_misorientation: &'a [f64],
    grain_misorientation: &'a [f64],
    misorientation_gradient: &'a [f64],
    surface_voxel: &'a [bool],
    distances: &'a DistanceMaps,
}

/// Read a JSON voxel volume.
pub fn load_volume(path: &Path) -> Result<Microstructure> {
    let file =
        File::open(path).with_context(|| format!("opening volume {}", path.display()))?;
    let volume: Microstructure = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing volume {}", path.display()))?;
    Ok(volume)
}

/// Resolve the volume path of a job relative to the job file's directory.
pub fn volume_path(job: &JobConfig, job_file: &Path) -> std::path::PathBuf {
    match job_file.parent() {
        Some(dir) if job.input.volume.is_relative() => dir.join(&job.input.volume),
        _ => job.input.volume.clone(),
    }
}

/// Run the full characterization of a job.
pub fn run_job(job: &JobConfig, job_file: &Path) -> Result<Characterization> {
    let path = volume_path(job, job_file);
    let volume = load_volume(&path)?;
    log::info!("loaded {} voxels from {}", volume.len(), path.display());
    let result = characterize(&volume, &job.phase_table(), &job.settings())
        .with_context(|| format!("characterizing {}", path.display()))?;
    Ok(result)
}

/// Write the enabled reports into `out_dir`.
pub fn write_outputs(result: &Characterization, job: &JobConfig, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    if job.output.grain_table {
        let path = out_dir.join("grains.txt");
        let mut out = BufWriter::new(File::create(&path)?);
        write_grain_table(&mut out, &result.grains, &job.report())?;
        println!("Wrote {}", path.display());
    }

    if job.output.statistics {
        let path = out_dir.join("statistics.json");
        let mut out = BufWriter::new(File::create(&path)?);
        write_statistics_json(&mut out, &result.statistics)?;
        println!("Wrote {}", path.display());
    }

    if job.output.deformation {
        let path = out_dir.join("deformation.json");
        let mut out = BufWriter::new(File::create(&path)?);
        write_deformation_json(&mut out, &result.deformation)?;
        println!("Wrote {}", path.display());
    }

    if job.output.voxel_fields {
        let path = out_dir.join("voxels.json");
        let v = &result.voxels;
        let report = VoxelReport {
            dims: result.geometry.dims,
            kernel_misorientation: &v.kernel_misorientation,
            grain_misorientation: &v.grain_misorientation,
            misorientation_gradient: &v.misorientation_gradient,
            surface_voxel: &v.surface_voxel,
            distances: &result.distances,
        };
        let out = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(out, &report)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Print a short description of a volume.
pub fn print_info(volume: &Microstructure) {
    let g = &volume.geometry;
    println!("Dimensions: {} x {} x {}", g.dims[0], g.dims[1], g.dims[2]);
    println!(
        "Spacing:    {} x {} x {}",
        g.spacing[0], g.spacing[1], g.spacing[2]
    );
    println!("Voxels:     {}", volume.len());

    let mut ids: Vec<i32> = volume.grain_ids.iter().copied().filter(|&id| id > 0).collect();
    ids.sort_unstable();
    ids.dedup();
    let unassigned = volume.grain_ids.iter().filter(|&&id| id == 0).count();
    println!("Grains:     {}", ids.len());
    println!("Unassigned: {}", unassigned);

    let mut phases: Vec<i32> = volume.phases.clone();
    phases.sort_unstable();
    phases.dedup();
    println!("Phase ids:  {:?}", phases);
}
