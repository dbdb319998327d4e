//! Integration tests for repository crate

#[cfg(test)]
mod tests {
    use dropstone_errors::{ErrorKind, RegistryError, StorageError};
    use dropstone_hash::Hash;
    use dropstone_index::{
        FsSnapshotBackend, MemorySnapshotBackend, VersionIndex, CURRENT_POINTER, LATEST_TABLE,
    };
    use dropstone_repository::*;
    use dropstone_store::LocalArtifactStore;
    use dropstone_types::{ArtifactSource, ContentHash, DownloadTarget, VersionOrdering};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    const P: &str = "cli-win32-x64";
    const Q: &str = "stable";

    struct Fixture {
        _dir: TempDir,
        uploads: PathBuf,
        downloads: PathBuf,
        backend: MemorySnapshotBackend,
        registry: Registry<MemorySnapshotBackend, LocalArtifactStore>,
    }

    async fn fixture(options: RegistryOptions) -> Fixture {
        let dir = tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        let downloads = dir.path().join("downloads");
        tokio::fs::create_dir_all(&uploads).await.unwrap();
        let backend = MemorySnapshotBackend::new();
        let registry = Registry::open(
            backend.clone(),
            LocalArtifactStore::new(&downloads),
            options,
        )
        .await
        .unwrap();
        Fixture {
            _dir: dir,
            uploads,
            downloads,
            backend,
            registry,
        }
    }

    async fn upload(dir: &Path, name: &str, bytes: &[u8]) -> ArtifactSource {
        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await.unwrap();
        ArtifactSource::local_file(path)
    }

    fn external(version: &str) -> ArtifactSource {
        ArtifactSource::external(format!("https://cdn.example.com/Dropstone-{version}.exe"))
    }

    async fn stored_files(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            return names;
        };
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_latest_only_moves_forward() {
        let fx = fixture(RegistryOptions::default()).await;
        for version in ["1.0.1", "1.0.0", "1.0.3", "1.0.2"] {
            fx.registry
                .register(P, Q, version, &format!("Dropstone {version}"), external(version))
                .await
                .unwrap();
        }
        let latest = fx.registry.resolve_latest(P, Q).await.unwrap();
        assert_eq!(latest.version, "1.0.3");
        assert_eq!(latest.name, "Dropstone 1.0.3");
        assert_eq!(fx.registry.list_all().await.len(), 4);
    }

    #[tokio::test]
    async fn test_reregistering_latest_refreshes_pointer() {
        let fx = fixture(RegistryOptions::default()).await;
        fx.registry
            .register(P, Q, "2.0.0", "first", external("2.0.0"))
            .await
            .unwrap();
        fx.registry
            .register(P, Q, "2.0.0", "second", external("2.0.0-rebuilt"))
            .await
            .unwrap();

        let latest = fx.registry.resolve_latest(P, Q).await.unwrap();
        assert_eq!(latest.name, "second");
        assert!(latest.url.ends_with("2.0.0-rebuilt.exe"));
        assert_eq!(fx.registry.stats().await.versions, 1);
    }

    #[tokio::test]
    async fn test_channels_are_independent() {
        let fx = fixture(RegistryOptions::default()).await;
        fx.registry
            .register(P, Q, "1.0.0", "a", external("1.0.0"))
            .await
            .unwrap();
        fx.registry
            .register(P, "insider", "9.0.0", "b", external("9.0.0"))
            .await
            .unwrap();
        fx.registry
            .register("cli-darwin", Q, "5.0.0", "c", external("5.0.0"))
            .await
            .unwrap();

        assert_eq!(fx.registry.resolve_latest(P, Q).await.unwrap().version, "1.0.0");
        assert_eq!(
            fx.registry.resolve_latest(P, "insider").await.unwrap().version,
            "9.0.0"
        );
        let stats = fx.registry.stats().await;
        assert_eq!((stats.versions, stats.latest, stats.downloads), (3, 3, 3));
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        let downloads = dir.path().join("downloads");
        let source = upload(dir.path(), "Dropstone-1.0.0.exe", b"binary contents").await;

        {
            let registry = Registry::open(
                FsSnapshotBackend::new(&data),
                LocalArtifactStore::new(&downloads),
                RegistryOptions::default(),
            )
            .await
            .unwrap();
            registry
                .register(P, Q, "1.0.0", "Dropstone 1.0.0", source)
                .await
                .unwrap();
            registry
                .register(P, Q, "0.9.0", "Dropstone 0.9.0", external("0.9.0"))
                .await
                .unwrap();
        }

        let registry = Registry::open(
            FsSnapshotBackend::new(&data),
            LocalArtifactStore::new(&downloads),
            RegistryOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(registry.resolve_latest(P, Q).await.unwrap().version, "1.0.0");
        assert_eq!(registry.list_all().await.len(), 2);
        match registry.resolve_download(P, Q, "1.0.0").await.unwrap() {
            DownloadTarget::LocalFile {
                path, display_name, ..
            } => {
                assert_eq!(display_name, "Dropstone-1.0.0.exe");
                assert_eq!(tokio::fs::read(path).await.unwrap(), b"binary contents");
            }
            DownloadTarget::Redirect { .. } => panic!("expected local file"),
        }
    }

    #[tokio::test]
    async fn test_removing_latest_recomputes_pointer() {
        let fx = fixture(RegistryOptions::default()).await;
        for version in ["1.0.0", "1.0.1", "1.0.2"] {
            fx.registry
                .register(P, Q, version, version, external(version))
                .await
                .unwrap();
        }

        let report = fx.registry.remove(P, Q, "1.0.2").await.unwrap();
        assert!(report.removed);
        assert_eq!(report.latest.unwrap().version, "1.0.1");

        // removing a non-latest version leaves the pointer alone
        let report = fx.registry.remove(P, Q, "1.0.0").await.unwrap();
        assert_eq!(report.latest.unwrap().version, "1.0.1");

        let report = fx.registry.remove(P, Q, "1.0.1").await.unwrap();
        assert!(report.latest.is_none());
        let err = fx.registry.resolve_latest(P, Q).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let stats = fx.registry.stats().await;
        assert_eq!((stats.versions, stats.latest, stats.downloads), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let fx = fixture(RegistryOptions::default()).await;
        fx.registry
            .register(P, Q, "1.0.0", "a", external("1.0.0"))
            .await
            .unwrap();

        assert!(fx.registry.remove(P, Q, "1.0.0").await.unwrap().removed);
        let again = fx.registry.remove(P, Q, "1.0.0").await.unwrap();
        assert!(!again.removed);
        assert!(!again.artifact_deleted);

        let never = fx.registry.remove(P, Q, "7.7.7").await.unwrap();
        assert!(!never.removed);
    }

    #[tokio::test]
    async fn test_remove_deletes_stored_artifact() {
        let fx = fixture(RegistryOptions::default()).await;
        let source = upload(&fx.uploads, "app.exe", b"payload").await;
        fx.registry
            .register(P, Q, "1.0.0", "a", source)
            .await
            .unwrap();
        assert_eq!(stored_files(&fx.downloads).await.len(), 1);

        let report = fx.registry.remove(P, Q, "1.0.0").await.unwrap();
        assert!(report.artifact_deleted);
        assert!(stored_files(&fx.downloads).await.is_empty());
    }

    #[tokio::test]
    async fn test_external_download_redirects() {
        let fx = fixture(RegistryOptions::default()).await;
        let url = "https://cdn.example.com/builds/Dropstone%201.96.3.exe";
        let record = fx
            .registry
            .register(P, Q, "1.96.3", "Dropstone 1.96.3", ArtifactSource::external(url))
            .await
            .unwrap();
        assert_eq!(record.url, url);
        assert_eq!(record.content_hash, ContentHash::Unknown);

        assert_eq!(
            fx.registry.resolve_download(P, Q, "1.96.3").await.unwrap(),
            DownloadTarget::Redirect {
                url: url.to_string()
            }
        );
        assert!(stored_files(&fx.downloads).await.is_empty());
    }

    #[tokio::test]
    async fn test_external_url_is_stored_trimmed() {
        let fx = fixture(RegistryOptions::default()).await;
        let record = fx
            .registry
            .register(
                P,
                Q,
                "1.0.0",
                "a",
                ArtifactSource::external("  https://example.com/a.exe\n"),
            )
            .await
            .unwrap();
        assert_eq!(record.url, "https://example.com/a.exe");
        assert_eq!(
            fx.registry.resolve_latest(P, Q).await.unwrap().url,
            "https://example.com/a.exe"
        );
        assert_eq!(
            fx.registry.resolve_download(P, Q, "1.0.0").await.unwrap(),
            DownloadTarget::Redirect {
                url: "https://example.com/a.exe".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_local_download_reports_size_and_hash() {
        let fx = fixture(RegistryOptions::default()).await;
        let bytes = b"a build that is exactly this long".to_vec();
        let source = upload(&fx.uploads, "Dropstone-1.96.4.exe", &bytes).await;

        let record = fx
            .registry
            .register(P, Q, "1.96.4", "Dropstone 1.96.4", source)
            .await
            .unwrap();
        let expected = Hash::from_data(&bytes).to_hex();
        assert_eq!(record.url, "/commit:1.96.4/cli-win32-x64/stable");
        assert_eq!(record.content_hash.as_hex(), Some(expected.as_str()));

        match fx.registry.resolve_download(P, Q, "1.96.4").await.unwrap() {
            DownloadTarget::LocalFile {
                path,
                display_name,
                size,
                content_hash,
            } => {
                assert_eq!(display_name, "Dropstone-1.96.4.exe");
                assert_eq!(size, bytes.len() as u64);
                assert_eq!(content_hash.as_hex(), Some(expected.as_str()));
                let on_disk = tokio::fs::read(&path).await.unwrap();
                assert_eq!(Hash::from_data(&on_disk).to_hex(), expected);
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                assert!(name.starts_with("download-cli-win32-x64-stable-1.96.4-"));
                assert!(name.ends_with(".exe"));
            }
            DownloadTarget::Redirect { .. } => panic!("expected local file"),
        }
        // the upload stays with the caller
        assert_eq!(stored_files(&fx.uploads).await, vec!["Dropstone-1.96.4.exe"]);
    }

    #[tokio::test]
    async fn test_mixed_channel_scenario() {
        let fx = fixture(RegistryOptions::default()).await;
        fx.registry
            .register(
                P,
                Q,
                "1.96.3",
                "Dropstone 1.96.3",
                ArtifactSource::external("https://cdn.example.com/Dropstone-1.96.3.exe"),
            )
            .await
            .unwrap();
        let source = upload(&fx.uploads, "Dropstone-1.96.4.exe", b"1.96.4").await;
        fx.registry
            .register(P, Q, "1.96.4", "Dropstone 1.96.4", source)
            .await
            .unwrap();

        let latest = fx.registry.resolve_latest(P, Q).await.unwrap();
        assert_eq!(latest.version, "1.96.4");
        assert!(latest.content_hash.is_known());

        assert!(matches!(
            fx.registry.resolve_download(P, Q, "1.96.3").await.unwrap(),
            DownloadTarget::Redirect { .. }
        ));
        assert!(matches!(
            fx.registry.resolve_download(P, Q, "1.96.4").await.unwrap(),
            DownloadTarget::LocalFile { .. }
        ));

        fx.registry.remove(P, Q, "1.96.4").await.unwrap();
        assert_eq!(fx.registry.resolve_latest(P, Q).await.unwrap().version, "1.96.3");
    }

    #[tokio::test]
    async fn test_external_builds_scenario() {
        let fx = fixture(RegistryOptions::default()).await;
        fx.registry
            .register(
                "cli-win32-x64",
                "stable",
                "1.96.3",
                "Dropstone 1.96.3",
                ArtifactSource::external("https://example.com/a.exe"),
            )
            .await
            .unwrap();
        fx.registry
            .register(
                "cli-win32-x64",
                "stable",
                "1.96.4",
                "Dropstone 1.96.4",
                ArtifactSource::external("https://example.com/b.exe"),
            )
            .await
            .unwrap();

        let latest = fx
            .registry
            .resolve_latest("cli-win32-x64", "stable")
            .await
            .unwrap();
        assert_eq!(latest.version, "1.96.4");
        assert_eq!(latest.url, "https://example.com/b.exe");

        fx.registry
            .remove("cli-win32-x64", "stable", "1.96.4")
            .await
            .unwrap();
        let latest = fx
            .registry
            .resolve_latest("cli-win32-x64", "stable")
            .await
            .unwrap();
        assert_eq!(latest.version, "1.96.3");
    }

    #[tokio::test]
    async fn test_invalid_requests_change_nothing() {
        let fx = fixture(RegistryOptions {
            max_upload_bytes: Some(4),
            ..RegistryOptions::default()
        })
        .await;

        for (p, q, v, n) in [
            ("", Q, "1.0.0", "n"),
            (P, "  ", "1.0.0", "n"),
            (P, Q, "", "n"),
            (P, Q, "1.0.0", ""),
        ] {
            let err = fx
                .registry
                .register(p, q, v, n, external("1.0.0"))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        let err = fx
            .registry
            .register(P, Q, "1.0.0", "n", ArtifactSource::external("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            dropstone_errors::Error::Registry(RegistryError::InvalidUrl { .. })
        ));

        let big = upload(&fx.uploads, "big.exe", b"too large").await;
        let err = fx
            .registry
            .register(P, Q, "1.0.0", "n", big)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let stats = fx.registry.stats().await;
        assert_eq!((stats.versions, stats.latest, stats.downloads), (0, 0, 0));
        assert!(fx.backend.names().is_empty());
        assert!(stored_files(&fx.downloads).await.is_empty());
    }

    #[tokio::test]
    async fn test_declared_size_must_match() {
        let fx = fixture(RegistryOptions::default()).await;
        let path = fx.uploads.join("a.exe");
        tokio::fs::write(&path, b"12345").await.unwrap();
        let err = fx
            .registry
            .register(
                P,
                Q,
                "1.0.0",
                "a",
                ArtifactSource::LocalFile {
                    path: path.clone(),
                    original_name: "a.exe".to_string(),
                    size: Some(4),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let fx = fixture(RegistryOptions::default()).await;
        fx.registry
            .register(P, Q, "1.0.0", "a", external("1.0.0"))
            .await
            .unwrap();

        fx.backend.set_fail_writes(true);
        let source = upload(&fx.uploads, "b.exe", b"new build").await;
        let err = fx
            .registry
            .register(P, Q, "2.0.0", "b", source)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);

        assert_eq!(fx.registry.resolve_latest(P, Q).await.unwrap().version, "1.0.0");
        assert!(fx.registry.resolve_version(P, Q, "2.0.0").await.is_err());
        assert!(stored_files(&fx.downloads).await.is_empty());

        let err = fx.registry.remove(P, Q, "1.0.0").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(fx.registry.resolve_version(P, Q, "1.0.0").await.is_ok());
        assert_eq!(fx.registry.resolve_latest(P, Q).await.unwrap().version, "1.0.0");

        fx.backend.set_fail_writes(false);
        assert!(fx.registry.remove(P, Q, "1.0.0").await.unwrap().removed);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_upload() {
        let fx = fixture(RegistryOptions::default()).await;
        fx.backend.set_fail_writes(true);

        let path = fx.uploads.join("Dropstone-2.0.0.exe");
        tokio::fs::write(&path, b"only copy of this build").await.unwrap();
        let err = fx
            .registry
            .register(P, Q, "2.0.0", "b", ArtifactSource::local_file(&path))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);

        assert_eq!(
            tokio::fs::read(&path).await.unwrap(),
            b"only copy of this build"
        );
        assert!(stored_files(&fx.downloads).await.is_empty());

        // the caller can retry with the same file once storage recovers
        fx.backend.set_fail_writes(false);
        fx.registry
            .register(P, Q, "2.0.0", "b", ArtifactSource::local_file(&path))
            .await
            .unwrap();
        assert_eq!(stored_files(&fx.downloads).await.len(), 1);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_failed_latest_snapshot_leaves_persisted_state_consistent() {
        let fx = fixture(RegistryOptions::default()).await;
        fx.registry
            .register(P, Q, "1.0.0", "a", external("1.0.0"))
            .await
            .unwrap();

        fx.backend.set_fail_table(Some(LATEST_TABLE));
        let err = fx
            .registry
            .register(P, Q, "2.0.0", "b", external("2.0.0"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);

        // what a restart would see
        let reloaded = VersionIndex::load(fx.backend.clone()).await.unwrap();
        let tables = reloaded.tables();
        assert_eq!(tables.versions.len(), 1);
        assert_eq!(tables.downloads.len(), 1);
        assert_eq!(tables.latest.len(), 1);
        assert_eq!(tables.latest.values().next().unwrap().version, "1.0.0");
        assert!(tables.versions.values().all(|r| r.version == "1.0.0"));
    }

    #[tokio::test]
    async fn test_failed_fs_save_leaves_snapshots_on_disk_unchanged() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        let registry = Registry::open(
            FsSnapshotBackend::new(&data),
            LocalArtifactStore::new(dir.path().join("downloads")),
            RegistryOptions::default(),
        )
        .await
        .unwrap();
        registry
            .register(P, Q, "1.0.0", "a", external("1.0.0"))
            .await
            .unwrap();
        let live = tokio::fs::read_to_string(data.join(CURRENT_POINTER))
            .await
            .unwrap();

        // a non-empty directory in place of the pointer makes the swap fail
        tokio::fs::remove_file(data.join(CURRENT_POINTER))
            .await
            .unwrap();
        tokio::fs::create_dir(data.join(CURRENT_POINTER))
            .await
            .unwrap();
        tokio::fs::write(data.join(CURRENT_POINTER).join("x"), b"x")
            .await
            .unwrap();

        let err = registry
            .register(P, Q, "2.0.0", "b", external("2.0.0"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(registry.resolve_latest(P, Q).await.unwrap().version, "1.0.0");

        // only the generation that was live before survives
        let mut generations = Vec::new();
        let mut entries = tokio::fs::read_dir(&data).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("snapshot-") {
                generations.push(name);
            }
        }
        assert_eq!(generations, vec![live]);
    }

    #[tokio::test]
    async fn test_replacing_local_build_deletes_old_artifact() {
        let fx = fixture(RegistryOptions::default()).await;
        let first = upload(&fx.uploads, "a.exe", b"first").await;
        fx.registry.register(P, Q, "1.0.0", "a", first).await.unwrap();
        let before = stored_files(&fx.downloads).await;
        assert_eq!(before.len(), 1);

        let second = upload(&fx.uploads, "a.exe", b"second").await;
        fx.registry.register(P, Q, "1.0.0", "a", second).await.unwrap();
        let after = stored_files(&fx.downloads).await;
        assert_eq!(after.len(), 1);

        let DownloadTarget::LocalFile { path, .. } =
            fx.registry.resolve_download(P, Q, "1.0.0").await.unwrap()
        else {
            panic!("expected local file");
        };
        assert_eq!(tokio::fs::read(path).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_missing_artifact_is_reported() {
        let fx = fixture(RegistryOptions::default()).await;
        let source = upload(&fx.uploads, "a.exe", b"bytes").await;
        fx.registry.register(P, Q, "1.0.0", "a", source).await.unwrap();
        for name in stored_files(&fx.downloads).await {
            tokio::fs::remove_file(fx.downloads.join(name)).await.unwrap();
        }

        let err = fx.registry.resolve_download(P, Q, "1.0.0").await.unwrap_err();
        assert!(matches!(
            err,
            dropstone_errors::Error::Storage(StorageError::ArtifactMissing { .. })
        ));
    }

    #[tokio::test]
    async fn test_lookup_misses() {
        let fx = fixture(RegistryOptions::default()).await;
        for err in [
            fx.registry.resolve_latest(P, Q).await.unwrap_err(),
            fx.registry.resolve_version(P, Q, "1.0.0").await.unwrap_err(),
            fx.registry
                .resolve_download(P, Q, "1.0.0")
                .await
                .unwrap_err(),
        ] {
            assert!(err.is_not_found());
        }
    }

    #[tokio::test]
    async fn test_lexicographic_default_vs_numeric() {
        let fx = fixture(RegistryOptions::default()).await;
        fx.registry
            .register(P, Q, "9.0.0", "a", external("9.0.0"))
            .await
            .unwrap();
        fx.registry
            .register(P, Q, "10.0.0", "b", external("10.0.0"))
            .await
            .unwrap();
        assert_eq!(fx.registry.resolve_latest(P, Q).await.unwrap().version, "9.0.0");

        let fx = fixture(RegistryOptions {
            ordering: VersionOrdering::Numeric,
            ..RegistryOptions::default()
        })
        .await;
        fx.registry
            .register(P, Q, "9.0.0", "a", external("9.0.0"))
            .await
            .unwrap();
        fx.registry
            .register(P, Q, "10.0.0", "b", external("10.0.0"))
            .await
            .unwrap();
        assert_eq!(fx.registry.resolve_latest(P, Q).await.unwrap().version, "10.0.0");

        fx.registry.remove(P, Q, "10.0.0").await.unwrap();
        assert_eq!(fx.registry.resolve_latest(P, Q).await.unwrap().version, "9.0.0");
    }

    #[tokio::test]
    async fn test_concurrent_registrations_keep_greatest_latest() {
        let fx = fixture(RegistryOptions::default()).await;
        let registry = Arc::new(fx.registry);

        let mut handles = Vec::new();
        for minor in 0..20 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let version = format!("1.{minor:02}.0");
                registry
                    .register(P, Q, &version, &version, external(&version))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(registry.resolve_latest(P, Q).await.unwrap().version, "1.19.0");
        assert_eq!(registry.list_all().await.len(), 20);
        assert_eq!(registry.list_latest().await.len(), 1);
    }

    #[tokio::test]
    async fn test_listing_is_sorted_and_decoded() {
        let fx = fixture(RegistryOptions::default()).await;
        fx.registry
            .register("linux/x64", Q, "1.0.0", "a", external("1.0.0"))
            .await
            .unwrap();
        fx.registry
            .register(P, Q, "1.0.0", "b", external("1.0.0"))
            .await
            .unwrap();

        let listed = fx.registry.list_all().await;
        let keys: Vec<&str> = listed.iter().map(|l| l.key.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
        assert!(listed.iter().any(|l| l.platform == "linux/x64"));
    }

    #[tokio::test]
    async fn test_open_local_uses_config_dirs() {
        let dir = tempdir().unwrap();
        let mut config = dropstone_config::Config::default();
        config.paths.data_dir = Some(dir.path().join("data"));
        config.paths.downloads_dir = Some(dir.path().join("dl"));

        let registry = LocalRegistry::open_local(&config).await.unwrap();
        let source = upload(dir.path(), "a.exe", b"x").await;
        registry.register(P, Q, "1.0.0", "a", source).await.unwrap();

        assert!(dir.path().join("data").join(CURRENT_POINTER).exists());
        assert_eq!(stored_files(&dir.path().join("dl")).await.len(), 1);

        drop(registry);
        let reopened = LocalRegistry::open_local(&config).await.unwrap();
        assert_eq!(reopened.resolve_latest(P, Q).await.unwrap().version, "1.0.0");
    }
}
