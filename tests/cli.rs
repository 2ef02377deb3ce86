use assert_cmd::Command;

mod common;

const VALID: &str = "tests/fixtures/sample_valid.darwin.json";
const INVALID: &str = "tests/fixtures/sample_invalid.darwin.json";
const SQUARE: &str = "tests/fixtures/square.polygon.json";

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("labelvox 0.1.0\n");
}

// Validate subcommand tests

#[test]
fn validate_valid_item_succeeds() {
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["validate", VALID, "--strict"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Validation passed"));
}

#[test]
fn validate_invalid_item_fails() {
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["validate", INVALID]);
    cmd.assert()
        .failure()
        .stdout(predicates::str::contains("error(s)"))
        .stdout(predicates::str::contains("DuplicateAnnotationId"))
        .stdout(predicates::str::contains("RlePixelCountMismatch"))
        .stdout(predicates::str::contains("UnmappedMaskValue"));
}

#[test]
fn validate_json_output_format() {
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["validate", VALID, "--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"error_count\": 0"))
        .stdout(predicates::str::contains("\"warning_count\": 0"));
}

#[test]
fn validate_nonexistent_file_fails() {
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["validate", "nonexistent_file.json"]);
    cmd.assert().failure();
}

// Convert subcommand tests

#[test]
fn convert_writes_volume_and_legend() {
    let temp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["convert", VALID, "-o"]).arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Converted"))
        .stdout(predicates::str::contains("abdomen.nii: 3 frame(s)"));

    let nifti = temp.path().join("itk_snap_sample_valid.darwin.nii");
    let label = temp.path().join("itk_snap_sample_valid.darwin.nii.label");
    assert!(nifti.exists());
    let legend = std::fs::read_to_string(label).unwrap();
    assert!(legend.contains("\"Liver\""));
    assert!(legend.contains("\"Lesion\""));
}

#[test]
fn convert_prefix_and_json_report() {
    let temp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["convert", VALID, "--prefix", "seg_", "--report", "json", "-o"])
        .arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"item\": \"abdomen.nii\""))
        .stdout(predicates::str::contains("\"frames_filled\": 1"));
    assert!(temp.path().join("seg_sample_valid.darwin.nii").exists());
}

#[test]
fn convert_directory_reports_failed_items() {
    let temp = tempfile::tempdir().unwrap();
    let in_dir = temp.path().join("exports");
    common::write_json(&in_dir.join("good.json"), &common::gap_item("good"));
    common::write_json(
        &in_dir.join("empty.json"),
        &common::darwin_item("empty", 2, 2, 1, &[("liver", "Liver")], &[]),
    );

    let out_dir = temp.path().join("out");
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.arg("convert").arg(&in_dir).arg("-o").arg(&out_dir);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Failed"))
        .stderr(predicates::str::contains("1 of 2"));
    assert!(out_dir.join("itk_snap_good.nii").exists());
}

#[test]
fn convert_rejects_unknown_config_fields() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp.path().join("labelvox.yaml");
    std::fs::write(&config, "carrier: something\n").unwrap();

    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["convert", VALID, "--config"])
        .arg(&config)
        .arg("-o")
        .arg(temp.path());
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Failed to parse config"));
}

// Trace / rasterize / iou subcommand tests

#[test]
fn trace_prints_paths() {
    let temp = tempfile::tempdir().unwrap();
    let png = temp.path().join("mask.png");
    common::write_png(
        &png,
        &[
            &[0, 0, 0, 0, 0],
            &[0, 255, 255, 255, 0],
            &[0, 255, 255, 255, 0],
            &[0, 0, 0, 0, 0],
        ],
    );

    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.arg("trace").arg(&png);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"paths\""))
        .stdout(predicates::str::contains("\"x\": 3.0"));
}

#[test]
fn rasterize_then_trace_round_trips() {
    let temp = tempfile::tempdir().unwrap();
    let png = temp.path().join("square.png");
    let traced = temp.path().join("square.json");

    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["rasterize", SQUARE, "--width", "6", "--height", "6", "-o"])
        .arg(&png);
    cmd.assert().success();

    let img = image::open(&png).unwrap().to_luma8();
    assert_eq!(img.pixels().filter(|p| p.0[0] == 255).count(), 16);

    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.arg("trace").arg(&png).arg("-o").arg(&traced);
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.arg("iou").arg(&traced).arg(&png);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("iou: 1\n"));
}

#[test]
fn iou_of_polygon_and_image() {
    let temp = tempfile::tempdir().unwrap();
    let png = temp.path().join("left.png");
    common::write_png(
        &png,
        &[
            &[255, 255, 0, 0, 0, 0],
            &[255, 255, 0, 0, 0, 0],
            &[255, 255, 0, 0, 0, 0],
            &[255, 255, 0, 0, 0, 0],
            &[255, 255, 0, 0, 0, 0],
            &[255, 255, 0, 0, 0, 0],
        ],
    );

    // Square covers x,y in 1..=4; the overlap is column 1, rows 1..=4.
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.arg("iou").arg(SQUARE).arg(&png).args(["--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"intersection\": 4"))
        .stdout(predicates::str::contains("\"union\": 24"));
}

#[test]
fn iou_of_empty_masks_is_undefined() {
    let temp = tempfile::tempdir().unwrap();
    let png = temp.path().join("empty.png");
    common::write_png(&png, &[&[0, 0], &[0, 0]]);

    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.arg("iou").arg(&png).arg(&png);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("iou: undefined"));
}

#[test]
fn iou_of_two_polygons_needs_dimensions() {
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["iou", SQUARE, SQUARE]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("--width"));

    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["iou", SQUARE, SQUARE, "--width", "8", "--height", "8"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("iou: 1\n"));
}

// Mask / clip subcommand tests

#[test]
fn mask_renders_frame_in_legend_colours() {
    let temp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["mask", VALID, "--frame", "1", "-o"]).arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("sample_valid.darwin_mask.png"));

    let img = image::open(temp.path().join("sample_valid.darwin_mask.png"))
        .unwrap()
        .to_rgb8();
    assert_eq!((img.width(), img.height()), (4, 3));
    // Frame 1: pixels 0-1 are Liver (label 1), pixels 4-6 Lesion (label 2).
    assert_eq!(img.get_pixel(0, 0).0, [55, 126, 184]);
    assert_eq!(img.get_pixel(2, 0).0, [0, 0, 0]);
    assert_eq!(img.get_pixel(0, 1).0, [77, 175, 74]);
}

#[test]
fn mask_rejects_frame_past_the_end() {
    let temp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["mask", VALID, "--frame", "3", "-o"]).arg(temp.path());
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("outside the item's 3 frame(s)"));
}

#[test]
fn clip_trims_paths_to_the_image() {
    let temp = tempfile::tempdir().unwrap();
    let clipped = temp.path().join("clipped.json");
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["clip", SQUARE, "--width", "3", "--height", "3", "-o"])
        .arg(&clipped);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Clipped 1 path(s)"));

    let paths = labelvox::darwin::io_polygon_json::read_polygon_json(&clipped).unwrap();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].points().iter().all(|p| p.x <= 2.0 && p.y <= 2.0));
    assert_eq!(paths[0].signed_area(), 1.0);
}

#[test]
fn clip_drops_paths_outside_the_image() {
    let temp = tempfile::tempdir().unwrap();
    let clipped = temp.path().join("clipped.json");
    let mut cmd = Command::cargo_bin("labelvox").unwrap();
    cmd.args(["clip", SQUARE, "--width", "1", "--height", "1", "-o"])
        .arg(&clipped);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Clipped 0 path(s)"));
}
