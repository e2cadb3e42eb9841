//! End-to-end runs of each operation over a temporary tree.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use exif_reduction_core::timestamps::{apply_timestamps, read_fs_times};
use exif_reduction_core::{
    process, Capabilities, ContainerReader, NoopWriter, Operation, ProcessOptions, Progress, RunSummary,
};
use tempfile::TempDir;

fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
}

fn write_file(path: &Path, content: &[u8], mtime: NaiveDateTime) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    apply_timestamps(path, mtime).unwrap();
}

fn run(options: ProcessOptions) -> Vec<RunSummary> {
    let caps = Capabilities {
        reader: &ContainerReader,
        writer: &NoopWriter,
    };
    process(&options.confirmed(true), caps, &|_: &Progress| {}).unwrap()
}

fn modified(path: &Path) -> NaiveDateTime {
    read_fs_times(path).unwrap().modified.unwrap()
}

#[test]
fn exif_reduction_takes_the_filename_date_over_a_later_mtime() {
    let temp = TempDir::new().unwrap();
    let photo = temp.path().join("IMG_20190101-132809.jpg");
    write_file(&photo, b"not really a jpeg", dt(2023, 6, 1, 12, 0, 0));

    let summaries = run(ProcessOptions::new(temp.path(), Operation::ExifReduction));

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].retimed, 1);
    assert!(summaries[0].skipped.is_empty());
    assert_eq!(modified(&photo), dt(2019, 1, 1, 13, 28, 9));
}

#[test]
fn exif_reduction_keeps_an_older_mtime() {
    let temp = TempDir::new().unwrap();
    let photo = temp.path().join("IMG_20190101-132809.jpg");
    write_file(&photo, b"x", dt(2015, 3, 3, 3, 3, 3));

    run(ProcessOptions::new(temp.path(), Operation::ExifReduction));

    assert_eq!(modified(&photo), dt(2015, 3, 3, 3, 3, 3));
}

#[test]
fn folder_structure_files_by_month_and_sweeps_empty_dirs() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("old/sub/beach.png"), b"beach", dt(2021, 7, 15, 10, 0, 0));
    fs::create_dir_all(root.join("never/used")).unwrap();

    let summaries = run(ProcessOptions::new(root, Operation::FolderStructure));

    let moved = root.join("2021年07月").join("beach.png");
    assert_eq!(fs::read(&moved).unwrap(), b"beach");
    assert_eq!(summaries[0].moved, 1);
    assert!(!root.join("old").exists());
    assert!(!root.join("never").exists());
    assert!(summaries[0].dirs_removed >= 4);
    assert!(root.exists());
}

#[test]
fn folder_structure_is_stable_on_a_second_run() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("beach.png"), b"beach", dt(2021, 7, 15, 10, 0, 0));

    run(ProcessOptions::new(root, Operation::FolderStructure));
    let again = run(ProcessOptions::new(root, Operation::FolderStructure));

    assert_eq!(again[0].in_place, 1);
    assert_eq!(fs::read(root.join("2021年07月/beach.png")).unwrap(), b"beach");
}

#[test]
fn folder_structure_renames_colliding_names_and_drops_duplicates() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let when = dt(2020, 2, 2, 2, 2, 2);
    write_file(&root.join("a/pic.png"), b"first", when);
    write_file(&root.join("b/pic.png"), b"second", when);
    write_file(&root.join("c/pic.png"), b"first", when);

    // a single worker keeps the destination check and the move together
    let summaries = run(ProcessOptions::new(root, Operation::FolderStructure).with_workers(1));

    let month = root.join("2020年02月");
    let mut names: Vec<String> = fs::read_dir(&month)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    assert_eq!(names.len(), 2);
    assert_eq!(names[0], "pic.png");
    assert!(names[1].starts_with("pic_") && names[1].ends_with(".png"));
    assert_eq!(names[1].len(), "pic_".len() + 64 + ".png".len());
    assert_eq!(summaries[0].moved, 1);
    assert_eq!(summaries[0].renamed, 1);
    assert_eq!(summaries[0].duplicates, 1);
}

#[test]
fn all_retimes_then_files_into_month_folders() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("misc/IMG_20190101-132809.jpg"), b"x", dt(2023, 6, 1, 0, 0, 0));

    let summaries = run(ProcessOptions::new(root, Operation::All));

    assert_eq!(summaries.len(), 2);
    let filed = root.join("2019年01月").join("IMG_20190101-132809.jpg");
    assert!(filed.is_file());
    assert_eq!(modified(&filed), dt(2019, 1, 1, 13, 28, 9));
    assert!(!root.join("misc").exists());
}

#[test]
fn directory_copy_mirrors_the_tree_and_leaves_the_source() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    write_file(&src.join("2018/x.jpg"), b"x", dt(2018, 1, 1, 0, 0, 0));
    write_file(&src.join("y.mp4"), b"y", dt(2018, 1, 1, 0, 0, 0));
    fs::create_dir_all(&dst).unwrap();
    fs::write(dst.join("y.mp4"), b"other").unwrap();

    let summaries = run(ProcessOptions::new(&src, Operation::DirectoryCopy).with_target(&dst));

    assert_eq!(fs::read(dst.join("2018/x.jpg")).unwrap(), b"x");
    assert_eq!(fs::read(dst.join("y.mp4")).unwrap(), b"other");
    assert_eq!(summaries[0].copied, 1);
    assert_eq!(summaries[0].renamed, 1);
    assert!(src.join("2018/x.jpg").is_file());
    assert!(src.join("y.mp4").is_file());
}

#[test]
fn unconfirmed_options_change_nothing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let photo = root.join("deep/IMG_20190101-132809.jpg");
    write_file(&photo, b"x", dt(2023, 6, 1, 0, 0, 0));

    let caps = Capabilities::default();
    let result = process(&ProcessOptions::new(root, Operation::All), caps, &|_: &Progress| {});

    assert!(result.is_err());
    assert!(photo.is_file());
    assert_eq!(modified(&photo), dt(2023, 6, 1, 0, 0, 0));
}
