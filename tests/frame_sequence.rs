use dumpframes::{FrameLoader, FramePattern, FrameTimeline, ReferenceEntry, ReferenceStore, Vec3};
use std::error::Error;
use std::fs;
use tempfile::TempDir;

#[test]
fn discovers_and_orders_sibling_files() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    for n in [3000, 1000, 2000] {
        fs::write(
            dir.path().join(format!("dump_{n}.liggghts")),
            format!("ITEM: ATOMS id x y z radius\n1 {n} 0 0 1\n"),
        )?;
    }
    fs::write(dir.path().join("dump_final.liggghts"), "")?;
    fs::write(dir.path().join("notes.txt"), "")?;

    let pattern = FramePattern::from_path(dir.path().join("dump_2000.liggghts")).expect("pattern");
    let files = pattern.find_matching_files(dir.path());
    let numbers: Vec<u64> = files.iter().map(|(n, _)| *n).collect();
    assert_eq!(numbers, vec![1000, 2000, 3000]);

    let timeline = FrameTimeline::from_numbers(1, &numbers).expect("timeline");
    let file_number = timeline.frame_to_file_number(2);
    let path = pattern.path_for(dir.path(), file_number as u64);
    assert_eq!(path, files[1].1);

    let mut loader = FrameLoader::new();
    let frame = loader.load_frame(&path)?;
    assert_eq!(frame.positions[0], Vec3::new(2000.0, 0.0, 0.0));
    Ok(())
}

#[test]
fn unreadable_directory_yields_nothing() {
    let pattern = FramePattern::from_file_name("dump_1.txt").expect("pattern");
    assert!(pattern.find_matching_files("/definitely/not/a/dir").is_empty());
}

#[test]
fn reference_entries_survive_serialization() -> Result<(), Box<dyn Error>> {
    let mut store = ReferenceStore::new();
    store.set_reference(&[Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO], &[5, 6], 10);

    let json = serde_json::to_string(store.entries())?;
    let entries: Vec<ReferenceEntry> = serde_json::from_str(&json)?;
    let restored = ReferenceStore::from_entries(entries, store.frame());

    assert_eq!(restored, store);
    assert_eq!(restored.lookup(5), Some(Vec3::new(1.0, 2.0, 3.0)));
    Ok(())
}
