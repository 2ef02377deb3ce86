//! Darwin JSON → NIfTI label volume conversion.
//!
//! [`convert_item`] runs the in-memory pipeline for one item (Collect,
//! Remap, assemble, legend). [`convert_file`] wraps it with reading the JSON
//! and writing the `.nii` / `.nii.label` pair, and [`convert_batch`] runs a
//! set of files where one failing item does not stop the rest.
//! [`semantic`] renders single frames as per-class colour PNGs instead.

pub mod report;
pub mod semantic;

pub use report::{
    ConversionCounts, ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity,
};

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ConvertConfig;
use crate::darwin::io_darwin_json::read_darwin_json;
use crate::darwin::ItemRecord;
use crate::error::LabelvoxError;
use crate::volume::legend::write_legend;
use crate::volume::nifti::write_nifti;
use crate::volume::{assemble, remap_frames, Affine, IdentityTable, Legend, VolumetricLabelImage};

/// The in-memory result of converting one item.
#[derive(Clone, Debug)]
pub struct ConversionOutput {
    pub volume: VolumetricLabelImage,
    pub legend: Legend,
    pub report: ConversionReport,
}

/// Files written for one item.
#[derive(Clone, Debug)]
pub struct ConvertedItem {
    pub input: PathBuf,
    pub nifti: PathBuf,
    pub label: PathBuf,
    pub report: ConversionReport,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub converted: Vec<ConvertedItem>,
    pub failed: Vec<(PathBuf, LabelvoxError)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }
}

/// Converts one item into a label volume and legend.
///
/// # Errors
/// Returns [`LabelvoxError::NoMasks`] if no frame carries raster data and
/// [`LabelvoxError::InvalidAffine`] if reorientation is requested against
/// an affine without a well-defined orientation. Per-frame problems are
/// recorded in the report instead.
#[tracing::instrument(skip_all, fields(item = %item.name))]
pub fn convert_item(
    item: &ItemRecord,
    config: &ConvertConfig,
) -> Result<ConversionOutput, LabelvoxError> {
    if item.frame_count == 0 || !item.has_raster() {
        return Err(LabelvoxError::NoMasks {
            item: item.name.clone(),
        });
    }

    let mut report = ConversionReport::new(item.name.clone());

    let table = IdentityTable::collect(&item.objects);
    let frames = remap_frames(item, &table);
    report.issues.extend(frames.warnings.iter().map(ConversionIssue::from));

    let affine = resolve_affine(item, &mut report);
    let original_affine = if config.reorient {
        item.geometry.original_affine
    } else {
        None
    };

    let volume = assemble(&frames.masks, affine, original_affine)?;
    if let Some(ornt) = volume.reorientation() {
        report.add(ConversionIssue::info(
            ConversionIssueCode::Reoriented,
            format!("volume reoriented to match original_affine ({ornt:?})"),
        ));
    }
    check_shape_metadata(item, &volume, &mut report);

    let labels = volume.labels();
    let legend = Legend::from_identities(
        table
            .iter()
            .filter(|identity| labels.contains(&identity.id.as_u32())),
        &config.legend,
    );

    let unlabelled = table.len() - legend.entries().len();
    if unlabelled > 0 {
        report.add(ConversionIssue::info(
            ConversionIssueCode::ObjectsWithoutVoxels,
            format!("{unlabelled} object(s) occupy no voxels and are omitted from the legend"),
        ));
    }

    report.counts = ConversionCounts {
        frames: frames.masks.len(),
        frames_with_raster: frames.frames_with_raster,
        frames_filled: frames.frames_filled,
        objects: table.len(),
        labelled_objects: legend.entries().len(),
    };

    tracing::debug!(
        frames = report.counts.frames,
        objects = report.counts.objects,
        warnings = report.warning_count(),
        "assembled volume"
    );

    Ok(ConversionOutput {
        volume,
        legend,
        report,
    })
}

fn resolve_affine(item: &ItemRecord, report: &mut ConversionReport) -> Affine {
    if let Some(affine) = item.geometry.affine {
        return affine;
    }
    match item.geometry.pixdim {
        Some(pixdim) if pixdim.iter().all(|p| p.is_finite() && *p != 0.0) => {
            report.add(ConversionIssue::info(
                ConversionIssueCode::AffineDefaulted,
                format!("no affine in metadata; using voxel sizes {pixdim:?}"),
            ));
            Affine::from_voxel_sizes(pixdim)
        }
        _ => {
            report.add(ConversionIssue::info(
                ConversionIssueCode::AffineDefaulted,
                "no affine in metadata; using identity",
            ));
            Affine::identity()
        }
    }
}

fn check_shape_metadata(
    item: &ItemRecord,
    volume: &VolumetricLabelImage,
    report: &mut ConversionReport,
) {
    let Some(shape) = &item.geometry.shape else {
        return;
    };
    let mut declared = shape.clone();
    let mut assembled = volume.shape().to_vec();
    declared.sort_unstable();
    assembled.sort_unstable();
    if declared != assembled {
        report.add(ConversionIssue::info(
            ConversionIssueCode::ShapeMetadataMismatch,
            format!(
                "metadata shape {:?} differs from assembled volume {:?}",
                shape,
                volume.shape()
            ),
        ));
    }
}

/// Output file paths for an input JSON: `<prefix><stem>.nii` and
/// `<prefix><stem>.nii.label`, where `<stem>` is the file name without
/// `.json` and without any `.nii`.
pub fn output_paths(input: &Path, output_dir: &Path, config: &ConvertConfig) -> (PathBuf, PathBuf) {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().replace(".nii", ""))
        .unwrap_or_default();
    let nifti = output_dir.join(format!("{}{}.nii", config.output_prefix, stem));
    let mut label = nifti.clone().into_os_string();
    label.push(".label");
    (nifti, PathBuf::from(label))
}

/// Converts one Darwin JSON file and writes the volume and legend.
pub fn convert_file(
    input: &Path,
    output_dir: &Path,
    config: &ConvertConfig,
) -> Result<ConvertedItem, LabelvoxError> {
    let item = read_darwin_json(input)?;
    let output = convert_item(&item, config)?;

    fs::create_dir_all(output_dir).map_err(LabelvoxError::Io)?;
    let (nifti, label) = output_paths(input, output_dir, config);
    write_nifti(&nifti, &output.volume)?;
    write_legend(&label, &output.legend)?;

    tracing::info!(
        input = %input.display(),
        output = %nifti.display(),
        labels = output.legend.entries().len(),
        "wrote volume"
    );

    Ok(ConvertedItem {
        input: input.to_path_buf(),
        nifti,
        label,
        report: output.report,
    })
}

/// Lists the JSON inputs under `input`: the file itself, or every `*.json`
/// directly inside a directory, sorted by path.
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, LabelvoxError> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| LabelvoxError::Io(e.into()))?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Converts every input, continuing past failures.
pub fn convert_batch(inputs: &[PathBuf], output_dir: &Path, config: &ConvertConfig) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for input in inputs {
        match convert_file(input, output_dir, config) {
            Ok(item) => summary.converted.push(item),
            Err(err) => {
                tracing::warn!(input = %input.display(), error = %err, "item failed");
                summary.failed.push((input.clone(), err));
            }
        }
    }
    summary
}
