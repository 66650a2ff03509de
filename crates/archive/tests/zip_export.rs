use std::io::{Cursor, Read};

use reelcut_archive::{
    Compression, DirectorySink, ZipExportJob, ZipExportOptions, ZipManager, ZipPhase,
    ARCHIVE_COMMENT, ZIP_MIME_TYPE,
};
use reelcut_project_model::media::{MediaItem, MediaKind};

fn read_archive(data: &[u8]) -> zip::ZipArchive<Cursor<Vec<u8>>> {
    zip::ZipArchive::new(Cursor::new(data.to_vec())).expect("valid zip")
}

fn entry_bytes(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
    let mut file = archive.by_name(name).expect("entry exists");
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).unwrap();
    buf
}

#[test]
fn empty_manager_produces_valid_archive() {
    let blob = ZipManager::new()
        .generate_zip(&ZipExportOptions::default())
        .unwrap();
    assert_eq!(blob.mime_type, ZIP_MIME_TYPE);

    let archive = read_archive(&blob.data);
    assert_eq!(archive.len(), 0);
    assert_eq!(archive.comment(), ARCHIVE_COMMENT.as_bytes());
}

#[test]
fn duplicate_names_are_stored_side_by_side() {
    let items = vec![
        MediaItem::from_bytes("1", "shot.png", MediaKind::Image, "image/png", b"first".to_vec()),
        MediaItem::from_bytes("2", "shot.png", MediaKind::Image, "image/png", b"second".to_vec()),
        MediaItem::from_bytes("3", "AUX.wav", MediaKind::Audio, "audio/wav", b"third".to_vec()),
    ];
    let mut zip = ZipManager::new();
    assert_eq!(zip.add_media_items(&items, None, |_| {}), 3);

    let blob = zip.generate_zip(&ZipExportOptions::default()).unwrap();
    let mut archive = read_archive(&blob.data);
    assert_eq!(archive.len(), 3);
    assert_eq!(entry_bytes(&mut archive, "shot.png"), b"first");
    assert_eq!(entry_bytes(&mut archive, "shot (1).png"), b"second");
    assert_eq!(entry_bytes(&mut archive, "file_AUX.wav"), b"third");
}

#[test]
fn stored_and_deflated_archives_hold_same_content() {
    let payload = vec![7u8; 4096];
    let mut zip = ZipManager::new();
    zip.add_bytes("pattern.bin", payload.clone());

    let deflated = zip.generate_zip(&ZipExportOptions::default()).unwrap();
    let stored = zip
        .generate_zip(&ZipExportOptions::default().stored())
        .unwrap();
    assert!(deflated.len() < stored.len());

    let mut archive = read_archive(&stored.data);
    {
        let file = archive.by_name("pattern.bin").unwrap();
        assert_eq!(file.compression(), zip::CompressionMethod::Stored);
    }
    assert_eq!(entry_bytes(&mut archive, "pattern.bin"), payload);
    assert_eq!(entry_bytes(&mut read_archive(&deflated.data), "pattern.bin"), payload);
}

#[test]
fn archives_are_deterministic() {
    let build = || {
        let mut zip = ZipManager::new();
        zip.add_bytes("a.txt", b"alpha".to_vec());
        zip.add_bytes("b.txt", b"beta".to_vec());
        zip.generate_zip(&ZipExportOptions {
            compression: Compression::Deflate,
            compression_level: 9,
            ..ZipExportOptions::default()
        })
        .unwrap()
    };
    assert_eq!(build().data, build().data);
}

#[test]
fn media_is_read_from_project_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("media")).unwrap();
    std::fs::write(dir.path().join("media/clip.mp4"), b"mp4-bytes").unwrap();

    let items = vec![
        MediaItem::from_path("c", MediaKind::Video, "video/mp4", "media/clip.mp4"),
        MediaItem::from_path("gone", MediaKind::Video, "video/mp4", "media/missing.mp4"),
    ];
    let mut zip = ZipManager::new();
    let added = zip.add_media_items(&items, Some(dir.path()), |_| {});
    assert_eq!(added, 1);
    assert_eq!(zip.entry_names(), ["clip.mp4"]);
}

#[tokio::test]
async fn job_walks_phases_and_saves_archive() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path().join("out"));
    let job = ZipExportJob::new(ZipExportOptions {
        filename: "bundle".to_string(),
        ..ZipExportOptions::default()
    });
    let mut rx = job.subscribe();

    let items = vec![
        MediaItem::from_bytes("1", "one.png", MediaKind::Image, "image/png", vec![1; 16]),
        MediaItem::from_bytes("2", "render", MediaKind::Image, "image/webp", vec![2; 16]).generated(),
    ];
    let path = job
        .run(items, None, &sink)
        .await
        .unwrap()
        .expect("archive written");

    assert_eq!(path, dir.path().join("out/bundle.zip"));
    let progress = rx.borrow_and_update().clone();
    assert_eq!(progress.phase, ZipPhase::Complete);
    assert_eq!(progress.progress, 100);
    assert_eq!(progress.total_files, 2);
    assert_eq!(progress.completed_files, 2);
    assert!(progress.error.is_none());

    let data = std::fs::read(&path).unwrap();
    let archive = read_archive(&data);
    let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, ["one.png", "render.webp"]);
}
