//! Integration tests for index crate

#[cfg(test)]
mod tests {
    use dropstone_index::keys;
    use dropstone_index::*;
    use dropstone_types::{ContentHash, DownloadRecord, StorageName, VersionRecord};
    use proptest::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn live_generation(dir: &Path) -> PathBuf {
        let generation = std::fs::read_to_string(dir.join(CURRENT_POINTER)).unwrap();
        dir.join(generation.trim())
    }

    fn populated(backend: FsSnapshotBackend) -> VersionIndex<FsSnapshotBackend> {
        let mut index = VersionIndex::empty(backend);

        let external = VersionRecord {
            version: "1.96.3".to_string(),
            name: "Dropstone 1.96.3".to_string(),
            timestamp: 1_736_000_000_000,
            url: "https://example.com/a.exe".to_string(),
            content_hash: ContentHash::Unknown,
        };
        let local = VersionRecord {
            version: "1.96.4".to_string(),
            name: "Dropstone 1.96.4".to_string(),
            timestamp: 1_736_000_100_000,
            url: VersionRecord::commit_path("cli-win32-x64", "stable", "1.96.4"),
            content_hash: ContentHash::Sha256("ab".repeat(32)),
        };

        index.put_version(
            keys::version_key("cli-win32-x64", "stable", "1.96.3"),
            external.clone(),
        );
        index.put_version(
            keys::version_key("cli-win32-x64", "stable", "1.96.4"),
            local.clone(),
        );
        index.put_latest(keys::latest_key("cli-win32-x64", "stable"), local);
        index.put_download(
            keys::download_key("cli-win32-x64", "stable", "1.96.3"),
            DownloadRecord {
                storage_name: StorageName::External,
                original_name: "a.exe".to_string(),
                size: 0,
                content_hash: ContentHash::Unknown,
                external_url: Some("https://example.com/a.exe".to_string()),
            },
        );
        index.put_download(
            keys::download_key("cli-win32-x64", "stable", "1.96.4"),
            DownloadRecord {
                storage_name: StorageName::Local(
                    "download-cli-win32-x64-stable-1.96.4-1736000100000.exe".to_string(),
                ),
                original_name: "Dropstone Setup.exe".to_string(),
                size: 1024,
                content_hash: ContentHash::Sha256("ab".repeat(32)),
                external_url: None,
            },
        );
        index
    }

    #[tokio::test]
    async fn test_save_then_load_reproduces_tables() {
        let temp = tempdir().unwrap();
        let index = populated(FsSnapshotBackend::new(temp.path()));
        index.save().await.unwrap();

        let live = live_generation(temp.path());
        assert!(live.join(VERSIONS_TABLE).exists());
        assert!(live.join(LATEST_TABLE).exists());
        assert!(live.join(DOWNLOADS_TABLE).exists());

        let reloaded = VersionIndex::load(FsSnapshotBackend::new(temp.path()))
            .await
            .unwrap();
        assert_eq!(reloaded.tables(), index.tables());
    }

    #[tokio::test]
    async fn test_snapshot_layout_is_key_to_record() {
        let temp = tempdir().unwrap();
        populated(FsSnapshotBackend::new(temp.path()))
            .save()
            .await
            .unwrap();

        let raw = std::fs::read_to_string(live_generation(temp.path()).join(LATEST_TABLE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["cli-win32-x64/stable"]["version"], "1.96.4");
        assert_eq!(
            value["cli-win32-x64/stable"]["url"],
            "/commit:1.96.4/cli-win32-x64/stable"
        );
    }

    #[tokio::test]
    async fn test_corrupted_snapshot_is_storage_error() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(VERSIONS_TABLE), b"{ not json").unwrap();

        let err = VersionIndex::load(FsSnapshotBackend::new(temp.path()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), dropstone_errors::ErrorKind::Storage);
        assert!(err.to_string().contains("versions.json"));
    }

    #[tokio::test]
    async fn test_save_replaces_flat_layout() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(LATEST_TABLE), b"{}").unwrap();

        let index = populated(FsSnapshotBackend::new(temp.path()));
        index.save().await.unwrap();

        let reloaded = VersionIndex::load(FsSnapshotBackend::new(temp.path()))
            .await
            .unwrap();
        assert_eq!(reloaded.tables(), index.tables());
    }

    #[tokio::test]
    async fn test_partial_snapshots_load() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(LATEST_TABLE), b"{}").unwrap();

        let index = VersionIndex::load(FsSnapshotBackend::new(temp.path()))
            .await
            .unwrap();
        assert!(index.tables().versions.is_empty());
        assert!(index.tables().downloads.is_empty());
    }

    #[test]
    fn test_listing_decodes_keys() {
        let temp = tempdir().unwrap();
        let index = populated(FsSnapshotBackend::new(temp.path()));

        let all = index.list_versions();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].platform, "cli-win32-x64");
        assert_eq!(all[0].quality, "stable");
        assert_eq!(all[0].record.version, "1.96.3");

        let latest = index.list_latest();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].key, "cli-win32-x64/stable");
        assert_eq!(latest[0].record.version, "1.96.4");
    }

    proptest! {
        #[test]
        fn prop_version_key_round_trips(p in ".{0,12}", q in ".{0,12}", v in ".{0,12}") {
            let parts = keys::decode_version_key(&keys::version_key(&p, &q, &v)).unwrap();
            prop_assert_eq!(parts.platform, p);
            prop_assert_eq!(parts.quality, q);
            prop_assert_eq!(parts.version, Some(v));
        }

        #[test]
        fn prop_distinct_triples_give_distinct_keys(
            a in ("[a-z/%-]{0,6}", "[a-z/%-]{0,6}", "[0-9./%-]{0,6}"),
            b in ("[a-z/%-]{0,6}", "[a-z/%-]{0,6}", "[0-9./%-]{0,6}"),
        ) {
            let ka = keys::version_key(&a.0, &a.1, &a.2);
            let kb = keys::version_key(&b.0, &b.1, &b.2);
            prop_assert_eq!(ka == kb, a == b);
        }

        #[test]
        fn prop_download_and_version_namespaces_are_disjoint(p in ".{0,8}", q in ".{0,8}", v in ".{0,8}") {
            let download = keys::download_key(&p, &q, &v);
            prop_assert!(keys::decode_version_key(&download)
                .map_or(true, |parts| parts.platform != p || parts.quality != q || parts.version.as_deref() != Some(v.as_str())));
            prop_assert_ne!(download, keys::version_key(&p, &q, &v));
        }

        #[test]
        fn prop_channel_prefix_matches_only_own_channel(
            p in "[a-z/-]{1,6}", q in "[a-z/-]{1,6}", v in "[0-9.]{1,6}",
            p2 in "[a-z/-]{1,6}", q2 in "[a-z/-]{1,6}",
        ) {
            let key = keys::version_key(&p2, &q2, &v);
            let same_channel = p == p2 && q == q2;
            prop_assert_eq!(key.starts_with(&keys::channel_prefix(&p, &q)), same_channel);
        }
    }
}
