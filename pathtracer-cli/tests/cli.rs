//! End-to-end coverage for the demo scenes driven through the CLI binary
//! itself, exercising scenarios 1 and 2 from the testable-properties list
//! (a scene that forces refine/dice cycles, and the `--no-output` path)
//! on top of the library-level unit tests in `pathtracer`.

use std::path::PathBuf;
use std::process::Command;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pathtracer"))
}

fn tmp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pathtracer-cli-test-{name}.png"))
}

#[test]
fn spheres_demo_renders_a_png() {
    let out = tmp_path("spheres");
    let _ = std::fs::remove_file(&out);

    let status = bin()
        .args([
            "--demo",
            "spheres",
            "--width",
            "16",
            "--height",
            "16",
            "--spp",
            "1",
            "--threads",
            "2",
            "--output",
        ])
        .arg(&out)
        .status()
        .expect("failed to run pathtracer binary");

    assert!(status.success());
    assert!(out.exists());
    let img = image::open(&out).expect("written file should be a valid image");
    assert_eq!(img.width(), 16);
    assert_eq!(img.height(), 16);

    std::fs::remove_file(&out).ok();
}

#[test]
fn patch_demo_forces_refine_and_dice_before_writing_output() {
    // A single patch spanning [-4, 4] x [0, 4] traced at 16x16 resolution
    // starts well above any traceable footprint, so this only succeeds if
    // the primitive array actually refines (and the patch dices) before
    // intersection -- the grid cache must also be exercised across many
    // rays hitting the same leaf patches.
    let out = tmp_path("patch");
    let _ = std::fs::remove_file(&out);

    let status = bin()
        .args([
            "--demo",
            "patch",
            "--width",
            "24",
            "--height",
            "24",
            "--spp",
            "2",
            "--threads",
            "1",
            "--output",
        ])
        .arg(&out)
        .status()
        .expect("failed to run pathtracer binary");

    assert!(status.success());
    assert!(out.exists());

    std::fs::remove_file(&out).ok();
}

#[test]
fn no_output_flag_skips_writing_the_file() {
    let out = tmp_path("no-output");
    let _ = std::fs::remove_file(&out);

    let status = bin()
        .args([
            "--demo",
            "spheres",
            "--width",
            "8",
            "--height",
            "8",
            "--spp",
            "1",
            "--threads",
            "1",
            "--no-output",
            "--output",
        ])
        .arg(&out)
        .status()
        .expect("failed to run pathtracer binary");

    assert!(status.success());
    assert!(!out.exists());
}

#[test]
fn single_worker_thread_matches_multi_threaded_image_size() {
    // Thread count only affects scheduling, never output shape: a
    // single-worker run and a multi-worker run of the same scene both
    // produce a full-resolution image.
    let single = tmp_path("threads-1");
    let multi = tmp_path("threads-4");
    let _ = std::fs::remove_file(&single);
    let _ = std::fs::remove_file(&multi);

    for (threads, out) in [("1", &single), ("4", &multi)] {
        let status = bin()
            .args([
                "--demo",
                "spheres",
                "--width",
                "12",
                "--height",
                "12",
                "--spp",
                "1",
                "--threads",
                threads,
                "--output",
            ])
            .arg(out)
            .status()
            .expect("failed to run pathtracer binary");
        assert!(status.success());
    }

    let a = image::open(&single).unwrap();
    let b = image::open(&multi).unwrap();
    assert_eq!((a.width(), a.height()), (b.width(), b.height()));

    std::fs::remove_file(&single).ok();
    std::fs::remove_file(&multi).ok();
}
