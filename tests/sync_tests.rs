// tests/sync_tests.rs

//! End-to-end synchronization passes against a mocked upstream.

mod common;

use std::path::{Path, PathBuf};

use pkgmirror::{ArchiveFormat, Error, RepositoryTarget, SyncOptions, Synchronizer};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a gzip-compressed database tarball with one desc record per entry.
fn build_database(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut archive = tar::Builder::new(encoder);

    for (package, desc) in entries {
        let data = desc.as_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_path(format!("{package}/desc")).unwrap();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        archive.append(&header, data).unwrap();
    }

    let encoder = archive.into_inner().unwrap();
    encoder.finish().unwrap()
}

fn desc_for(filename: &str) -> String {
    format!("%NAME%\npkg\n%FILENAME%\n{filename}\n%ARCH%\naarch64\n")
}

fn test_target(server: &MockServer) -> RepositoryTarget {
    RepositoryTarget::new(
        format!("{}/$repo/$arch", server.uri()),
        ArchiveFormat::TarGz,
        "danctnix",
        "aarch64",
    )
}

async fn mount_database(server: &MockServer, database: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path("/danctnix/aarch64/danctnix.db"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(database, "application/octet-stream"))
        .mount(server)
        .await;
}

async fn mount_artifact(server: &MockServer, filename: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/danctnix/aarch64/{filename}")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), "application/octet-stream"))
        .mount(server)
        .await;
}

async fn run_sync(root: PathBuf, target: RepositoryTarget, prune: bool) -> pkgmirror::Result<()> {
    tokio::task::spawn_blocking(move || {
        let synchronizer = Synchronizer::new(root, SyncOptions { prune })?;
        synchronizer.sync(&target)
    })
    .await
    .unwrap()
}

fn mirror_dir(root: &Path) -> PathBuf {
    root.join("danctnix").join("aarch64")
}

#[tokio::test]
async fn sync_downloads_every_required_artifact() {
    let server = MockServer::start().await;
    let database = build_database(&[
        ("foo-1.0-1", &desc_for("foo-1.0-1-aarch64.pkg.tar.xz")),
        ("bar-2.0-1", &desc_for("bar-2.0-1-aarch64.pkg.tar.zst")),
    ]);
    mount_database(&server, database).await;
    mount_artifact(&server, "foo-1.0-1-aarch64.pkg.tar.xz", b"foo artifact").await;
    mount_artifact(&server, "bar-2.0-1-aarch64.pkg.tar.zst", b"bar artifact").await;

    let root = tempfile::tempdir().unwrap();
    run_sync(root.path().to_path_buf(), test_target(&server), false)
        .await
        .unwrap();

    let dir = mirror_dir(root.path());
    for artifact in [
        "foo-1.0-1-aarch64.pkg.tar.xz",
        "bar-2.0-1-aarch64.pkg.tar.zst",
    ] {
        let metadata = std::fs::metadata(dir.join(artifact)).unwrap();
        assert!(metadata.len() > 0, "{artifact} must be non-empty");
    }

    // The database is installed under its fixed name next to the raw archive
    assert!(dir.join("danctnix.db").is_file());
    assert!(dir.join("danctnix.tar.gz").is_file());
    assert_eq!(
        std::fs::read(dir.join("danctnix.db")).unwrap(),
        std::fs::read(dir.join("danctnix.tar.gz")).unwrap()
    );
}

#[tokio::test]
async fn second_sync_downloads_no_artifacts() {
    let server = MockServer::start().await;
    let database = build_database(&[("foo-1.0-1", &desc_for("foo-1.0-1-aarch64.pkg.tar.xz"))]);

    Mock::given(method("GET"))
        .and(path("/danctnix/aarch64/danctnix.db"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(database, "application/octet-stream"))
        .expect(2)
        .mount(&server)
        .await;

    // Presence short-circuits the artifact download on the second pass
    Mock::given(method("GET"))
        .and(path("/danctnix/aarch64/foo-1.0-1-aarch64.pkg.tar.xz"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"foo artifact".to_vec(), "application/octet-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    run_sync(root.path().to_path_buf(), test_target(&server), true)
        .await
        .unwrap();
    run_sync(root.path().to_path_buf(), test_target(&server), true)
        .await
        .unwrap();

    server.verify().await;
}

#[tokio::test]
async fn pruning_sync_deletes_stale_artifacts() {
    let server = MockServer::start().await;
    let database = build_database(&[("foo-1.0-1", &desc_for("foo-1.0-1-aarch64.pkg.tar.xz"))]);
    mount_database(&server, database).await;
    mount_artifact(&server, "foo-1.0-1-aarch64.pkg.tar.xz", b"foo artifact").await;

    let root = tempfile::tempdir().unwrap();
    let dir = mirror_dir(root.path());
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("stale.pkg.tar.zst"), b"left over from last month").unwrap();

    run_sync(root.path().to_path_buf(), test_target(&server), true)
        .await
        .unwrap();

    assert!(!dir.join("stale.pkg.tar.zst").exists());

    // Exactly the manifest plus the database pair remains
    let mut names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "danctnix.db".to_string(),
            "danctnix.tar.gz".to_string(),
            "foo-1.0-1-aarch64.pkg.tar.xz".to_string(),
        ]
    );
}

#[tokio::test]
async fn non_pruning_sync_keeps_stale_artifacts() {
    let server = MockServer::start().await;
    let database = build_database(&[("foo-1.0-1", &desc_for("foo-1.0-1-aarch64.pkg.tar.xz"))]);
    mount_database(&server, database).await;
    mount_artifact(&server, "foo-1.0-1-aarch64.pkg.tar.xz", b"foo artifact").await;

    let root = tempfile::tempdir().unwrap();
    let dir = mirror_dir(root.path());
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("stale.pkg.tar.zst"), b"kept without pruning").unwrap();

    run_sync(root.path().to_path_buf(), test_target(&server), false)
        .await
        .unwrap();

    assert!(dir.join("stale.pkg.tar.zst").exists());
}

#[tokio::test]
async fn desc_without_filename_marker_aborts_the_pass() {
    let server = MockServer::start().await;
    let database = build_database(&[
        ("good-1.0-1", &desc_for("good-1.0-1-aarch64.pkg.tar.xz")),
        ("broken-1.0-1", "%NAME%\nbroken\n%ARCH%\naarch64\n"),
        ("broken-2.0-1", "%NAME%\nalso-broken\n"),
    ]);
    mount_database(&server, database).await;

    let root = tempfile::tempdir().unwrap();
    let err = run_sync(root.path().to_path_buf(), test_target(&server), true)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ProtocolError(_)));
    assert!(err.to_string().contains("%FILENAME%"));
}

#[tokio::test]
async fn missing_artifact_upstream_aborts_the_pass() {
    let server = MockServer::start().await;
    let database = build_database(&[("gone-1.0-1", &desc_for("gone-1.0-1-aarch64.pkg.tar.xz"))]);
    mount_database(&server, database).await;
    // No artifact mock mounted: wiremock answers 404

    let root = tempfile::tempdir().unwrap();
    let err = run_sync(root.path().to_path_buf(), test_target(&server), true)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NetworkError(_)));
}

#[tokio::test]
async fn corrupt_database_archive_aborts_the_pass() {
    let server = MockServer::start().await;
    mount_database(&server, b"not a compressed tarball at all".to_vec()).await;

    let root = tempfile::tempdir().unwrap();
    let err = run_sync(root.path().to_path_buf(), test_target(&server), true)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ArchiveError(_)));
}

#[tokio::test]
async fn failed_target_leaves_completed_targets_untouched() {
    let server = MockServer::start().await;
    let database = build_database(&[("foo-1.0-1", &desc_for("foo-1.0-1-aarch64.pkg.tar.xz"))]);
    mount_database(&server, database).await;
    mount_artifact(&server, "foo-1.0-1-aarch64.pkg.tar.xz", b"foo artifact").await;

    // The second target's database response has no Content-Length
    let chunked_addr = common::spawn_chunked_server(b"no length here");

    let good = test_target(&server);
    let bad = RepositoryTarget::new(
        format!("http://{chunked_addr}/$repo/$arch"),
        ArchiveFormat::TarGz,
        "phosh",
        "aarch64",
    );

    let root = tempfile::tempdir().unwrap();
    let root_path = root.path().to_path_buf();
    let err = tokio::task::spawn_blocking(move || {
        let synchronizer = Synchronizer::new(root_path, SyncOptions { prune: true })?;
        synchronizer.sync_all(&[good, bad])
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, Error::ProtocolError(_)));

    // The first target's pass completed and its files are intact
    let dir = mirror_dir(root.path());
    assert!(dir.join("danctnix.db").is_file());
    assert!(dir.join("foo-1.0-1-aarch64.pkg.tar.xz").is_file());
    assert_eq!(
        std::fs::read(dir.join("foo-1.0-1-aarch64.pkg.tar.xz")).unwrap(),
        b"foo artifact"
    );
}

#[tokio::test]
async fn database_is_refetched_even_when_unchanged() {
    let server = MockServer::start().await;
    let database = build_database(&[("foo-1.0-1", &desc_for("foo-1.0-1-aarch64.pkg.tar.xz"))]);
    mount_database(&server, database.clone()).await;
    mount_artifact(&server, "foo-1.0-1-aarch64.pkg.tar.xz", b"foo artifact").await;

    let root = tempfile::tempdir().unwrap();
    let dir = mirror_dir(root.path());
    std::fs::create_dir_all(&dir).unwrap();
    // A stale local database copy must be overwritten, not trusted
    std::fs::write(dir.join("danctnix.tar.gz"), b"stale archive").unwrap();
    std::fs::write(dir.join("danctnix.db"), b"stale database").unwrap();

    run_sync(root.path().to_path_buf(), test_target(&server), false)
        .await
        .unwrap();

    assert_eq!(std::fs::read(dir.join("danctnix.tar.gz")).unwrap(), database);
    assert_eq!(std::fs::read(dir.join("danctnix.db")).unwrap(), database);
}
