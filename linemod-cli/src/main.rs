use clap::Parser;
use linemod::cloud::pcd::read_pcd;
use linemod::container::{ContainerEntry, ContainerReader, EntryKind};
use linemod::geometry::compute_aabb;
use linemod::{ClusteringMethod, DepthRefinement, RecognizerConfig, ScaleRange};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "linemod template container inspector")]
struct Cli {
    /// Template containers to inspect.
    #[arg(value_name = "CONTAINER")]
    containers: Vec<PathBuf>,
    /// Write the JSON report to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Print the default recognizer configuration and exit.
    #[arg(long)]
    print_default_config: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum EntryKindRecord {
    Geometry,
    Signature,
    Other,
}

impl From<EntryKind> for EntryKindRecord {
    fn from(value: EntryKind) -> Self {
        match value {
            EntryKind::Geometry => EntryKindRecord::Geometry,
            EntryKind::Signature => EntryKindRecord::Signature,
            EntryKind::Other => EntryKindRecord::Other,
        }
    }
}

#[derive(Debug, Serialize)]
struct GeometryRecord {
    width: usize,
    height: usize,
    finite_points: usize,
    centroid: [f32; 3],
    /// Box minimum corner and extents in the geometry's own coordinates.
    min: [f32; 3],
    extent: [f32; 3],
}

#[derive(Debug, Serialize)]
struct EntryRecord {
    name: String,
    kind: EntryKindRecord,
    size: u64,
    offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    geometry: Option<GeometryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct ContainerRecord {
    path: String,
    geometries: usize,
    signatures: usize,
    skipped: usize,
    entries: Vec<EntryRecord>,
}

#[derive(Debug, Serialize)]
struct Output {
    containers: Vec<ContainerRecord>,
}

#[derive(Debug, Serialize)]
struct ConfigRecord {
    gradient_magnitude_threshold: f32,
    feature_distance_threshold: f32,
    min_distance_to_border: f32,
    translation_threshold_2d: usize,
    translation_threshold_3d: usize,
    rotation_threshold: f32,
    intersection_volume_threshold: f32,
    clustering: &'static str,
    separate_templates: bool,
    depth_refinement: &'static str,
    icp_iterations: usize,
    icp_inlier_threshold: f32,
    min_scale: f32,
    max_scale: f32,
    scale_multiplier: f32,
}

impl ConfigRecord {
    fn defaults() -> Self {
        let cfg = RecognizerConfig::default();
        let scales = ScaleRange::default();
        Self {
            gradient_magnitude_threshold: cfg.gradient_magnitude_threshold,
            feature_distance_threshold: cfg.feature_distance_threshold,
            min_distance_to_border: cfg.min_distance_to_border,
            translation_threshold_2d: cfg.translation_threshold_2d,
            translation_threshold_3d: cfg.translation_threshold_3d,
            rotation_threshold: cfg.rotation_threshold,
            intersection_volume_threshold: cfg.intersection_volume_threshold,
            clustering: match cfg.clustering {
                ClusteringMethod::GridBuckets => "grid_buckets",
                ClusteringMethod::Overlap => "overlap",
            },
            separate_templates: cfg.separate_templates,
            depth_refinement: match cfg.depth_refinement {
                DepthRefinement::Histogram => "histogram",
                DepthRefinement::ProjectiveIcp => "projective_icp",
                DepthRefinement::Disabled => "disabled",
            },
            icp_iterations: cfg.icp.iterations,
            icp_inlier_threshold: cfg.icp.inlier_threshold,
            min_scale: scales.min_scale,
            max_scale: scales.max_scale,
            scale_multiplier: scales.multiplier,
        }
    }
}

fn inspect_geometry(body: &[u8]) -> Result<GeometryRecord, linemod::LinemodError> {
    let cloud = read_pcd(body)?;
    let stats = compute_aabb(cloud.points());
    let bb = stats.bounding_box;
    Ok(GeometryRecord {
        width: cloud.width(),
        height: cloud.height(),
        finite_points: stats.finite_points,
        centroid: [stats.centroid.x, stats.centroid.y, stats.centroid.z],
        min: [
            bb.x + stats.centroid.x,
            bb.y + stats.centroid.y,
            bb.z + stats.centroid.z,
        ],
        extent: [bb.width, bb.height, bb.depth],
    })
}

fn inspect_entry(
    reader: &mut ContainerReader<BufReader<File>>,
    entry: ContainerEntry,
) -> EntryRecord {
    let mut geometry = None;
    let mut error = None;
    if entry.kind == EntryKind::Geometry {
        match reader.read_body(&entry).and_then(|body| inspect_geometry(&body)) {
            Ok(record) => geometry = Some(record),
            Err(err) => error = Some(err.to_string()),
        }
    }
    EntryRecord {
        name: entry.name,
        kind: entry.kind.into(),
        size: entry.size,
        offset: entry.offset,
        geometry,
        error,
    }
}

fn inspect_container(path: &Path) -> Result<ContainerRecord, Box<dyn std::error::Error>> {
    let _span = tracing::info_span!("inspect", path = %path.display()).entered();
    let file = File::open(path)?;
    let mut reader = ContainerReader::new(BufReader::new(file));
    let mut record = ContainerRecord {
        path: path.display().to_string(),
        ..ContainerRecord::default()
    };

    while let Some(entry) = reader.next_entry() {
        match entry.kind {
            EntryKind::Geometry => record.geometries += 1,
            EntryKind::Signature => record.signatures += 1,
            EntryKind::Other => record.skipped += 1,
        }
        let entry = inspect_entry(&mut reader, entry);
        if let Some(err) = &entry.error {
            tracing::warn!(entry = entry.name.as_str(), error = err.as_str(), "unreadable geometry");
        }
        record.entries.push(entry);
    }

    tracing::info!(
        geometries = record.geometries,
        signatures = record.signatures,
        skipped = record.skipped,
        "container inspected"
    );
    Ok(record)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("linemod=info".parse()?))
            .with_target(false)
            .init();
    }

    let json = if cli.print_default_config {
        serde_json::to_string_pretty(&ConfigRecord::defaults())?
    } else {
        if cli.containers.is_empty() {
            return Err("at least one container path is required".into());
        }
        let mut containers = Vec::with_capacity(cli.containers.len());
        for path in &cli.containers {
            containers.push(inspect_container(path)?);
        }
        serde_json::to_string_pretty(&Output { containers })?
    };

    match cli.output {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
