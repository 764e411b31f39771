//! End-to-end scenarios against the public façade: creating an image,
//! building a directory tree, writing and reading files back, and
//! persistence across a close/reopen cycle.

use apefs::{ApeFile, ApeFileSystem, FileMode, SeekMode, BLOCK_SIZE};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("apefs-roundtrip-{name}-{}", std::process::id()))
}

#[test]
fn scenario_a_create_and_list_root() {
    let path = temp_path("a");
    let mut fs = ApeFileSystem::create(&path, 22_222_222).expect("create");

    assert!(fs.directory_enum("/").expect("root enum").is_empty());

    fs.close();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn scenario_b_nested_directories() {
    let path = temp_path("b");
    let mut fs = ApeFileSystem::create(&path, 22_222_222).expect("create");

    assert!(fs.directory_create("/a"));
    assert!(!fs.directory_create("/a"));
    assert!(fs.directory_create("/a/b/c"));
    assert!(fs.directory_exists("/a/b/c"));
    assert!(!fs.directory_delete("/a"));

    fs.close();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn scenario_c_file_write_and_read_back() {
    let path = temp_path("c");
    let mut fs = ApeFileSystem::create(&path, 4 * 1024 * 1024).expect("create");

    let mut file = ApeFile::open(&mut fs, "/f", FileMode::Create).expect("create");
    assert_eq!(file.write(&mut fs, b"hello"), 5);
    assert!(file.seek(&mut fs, SeekMode::Set, 0));

    let mut buf = [0u8; 5];
    assert_eq!(file.read(&mut fs, &mut buf), 5);
    assert_eq!(&buf, b"hello");
    assert_eq!(file.size(&mut fs), Some(5));

    fs.close();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn scenario_d_cross_block_write() {
    let path = temp_path("d");
    let mut fs = ApeFileSystem::create(&path, 8 * 1024 * 1024).expect("create");

    let mut file = ApeFile::open(&mut fs, "/f", FileMode::Create).expect("create");
    let payload = vec![b'a'; BLOCK_SIZE as usize + 10];
    assert_eq!(file.write(&mut fs, &payload), payload.len());

    assert!(file.seek(&mut fs, SeekMode::Cur, -(payload.len() as i64)));
    let mut buf = vec![0u8; payload.len()];
    assert_eq!(file.read(&mut fs, &mut buf), payload.len());
    assert_eq!(buf, payload);
    assert!(file.size(&mut fs).unwrap() as usize >= payload.len());

    fs.close();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn scenario_e_directory_pack_and_unpack() {
    let path = temp_path("e");
    let mut fs = ApeFileSystem::create(&path, 8 * 1024 * 1024).expect("create");

    for i in 0..50 {
        assert!(fs.directory_create(&format!("/n{i}")));
    }
    let listed = fs.directory_enum("/").expect("enum");
    assert_eq!(listed.len(), 50);

    for i in (0..50).step_by(2) {
        assert!(fs.directory_delete(&format!("/n{i}")));
    }
    let remaining = fs.directory_enum("/").expect("enum");
    assert_eq!(remaining.len(), 25);
    let mut names: Vec<&str> = remaining.iter().map(|e| e.name.as_str()).collect();
    names.sort();
    assert_eq!(names.iter().collect::<std::collections::HashSet<_>>().len(), 25);

    assert!(fs.directory_create("/x"));
    assert!(fs.directory_exists("/x"));

    fs.close();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn scenario_f_persistence_across_reopen() {
    let path = temp_path("f");
    let mut fs = ApeFileSystem::create(&path, 8 * 1024 * 1024).expect("create");

    assert!(fs.directory_create("/d"));
    let mut file = ApeFile::open(&mut fs, "/d/f", FileMode::Create).expect("create");
    let content = vec![b'c'; BLOCK_SIZE as usize + 137];
    assert_eq!(file.write(&mut fs, &content), content.len());
    file.close();
    fs.close();

    let mut reopened = ApeFileSystem::open(&path).expect("reopen");
    let mut reopened_file = ApeFile::open(&mut reopened, "/d/f", FileMode::Open).expect("reopen file");
    let mut buf = vec![0u8; content.len()];
    assert_eq!(reopened_file.read(&mut reopened, &mut buf), content.len());
    assert_eq!(buf, content);

    reopened.close();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn boundary_growth_past_direct_and_single_indirect_tiers() {
    let path = temp_path("growth");
    let mut fs = ApeFileSystem::create(&path, 64 * 1024 * 1024).expect("create");

    let mut file = ApeFile::open(&mut fs, "/big", FileMode::Create).expect("create");
    // 8 direct + 1024 single-indirect + a few into double-indirect.
    let block_count = 8 + 1024 + 5;
    let payload = vec![b'q'; block_count * BLOCK_SIZE as usize];
    assert_eq!(file.write(&mut fs, &payload), payload.len());

    assert!(file.seek(&mut fs, SeekMode::Set, 0));
    let mut buf = vec![0u8; payload.len()];
    assert_eq!(file.read(&mut fs, &mut buf), payload.len());
    assert_eq!(buf, payload);

    fs.close();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn boundary_exact_block_size_write() {
    let path = temp_path("exact");
    let mut fs = ApeFileSystem::create(&path, 4 * 1024 * 1024).expect("create");

    let mut file = ApeFile::open(&mut fs, "/f", FileMode::Create).expect("create");
    let payload = vec![b'e'; BLOCK_SIZE as usize];
    assert_eq!(file.write(&mut fs, &payload), payload.len());
    assert_eq!(file.size(&mut fs), Some(BLOCK_SIZE as u32));

    fs.close();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn boundary_seek_one_past_end_fails() {
    let path = temp_path("seekboundary");
    let mut fs = ApeFileSystem::create(&path, 4 * 1024 * 1024).expect("create");

    let mut file = ApeFile::open(&mut fs, "/f", FileMode::Create).expect("create");
    assert_eq!(file.write(&mut fs, b"abcd"), 4);
    assert!(!file.seek(&mut fs, SeekMode::Set, 4));
    assert!(file.seek(&mut fs, SeekMode::Set, 3));

    fs.close();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn boundary_delete_sole_vs_neighbored_entry() {
    let path = temp_path("delneighbor");
    let mut fs = ApeFileSystem::create(&path, 4 * 1024 * 1024).expect("create");

    assert!(fs.directory_create("/solo"));
    assert!(fs.directory_delete("/solo"));
    assert!(!fs.directory_exists("/solo"));

    assert!(fs.directory_create("/first"));
    assert!(fs.directory_create("/second"));
    assert!(fs.directory_delete("/first"));
    assert!(!fs.directory_exists("/first"));
    assert!(fs.directory_exists("/second"));

    fs.close();
    let _ = std::fs::remove_file(&path);
}
