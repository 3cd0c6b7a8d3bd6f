//! Integration tests for refcheck
//!
//! These tests drive the indexer and the verifier together, configured the
//! way the CLI configures them.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

// Test utilities module
mod utils {
    use super::*;
    use refcheck_config::Config;
    use refcheck_events::{EventReceiver, EventSender};
    use refcheck_index::{IndexBuilder, IndexOptions, SharedIndex};
    use refcheck_verify::{UploadVerifier, VerifierOptions};

    pub const REPORT: &[u8] = b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n%%EOF";

    #[allow(dead_code)]
    pub struct TestEnvironment {
        pub temp_dir: TempDir,
        pub config: Config,
        pub builder: IndexBuilder,
        pub shared: SharedIndex,
        pub verifier: UploadVerifier,
        pub event_sender: EventSender,
        pub event_receiver: EventReceiver,
    }

    impl TestEnvironment {
        pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
            let temp_dir = TempDir::new()?;
            let base_path = temp_dir.path();

            let reference = base_path.join("static/downloads");
            fs::create_dir_all(reference.join("2024")).await?;
            fs::write(reference.join("2024/report.pdf"), REPORT).await?;
            fs::write(reference.join("checksums.txt"), b"see index").await?;

            let config_path = base_path.join("config.toml");
            fs::write(
                &config_path,
                format!(
                    "[paths]\nreference_dir = {:?}\nstaging_dir = {:?}\naccepted_dir = {:?}\n\n[upload]\nmax_upload_size = 4096\n",
                    reference.display().to_string(),
                    base_path.join("uploads/.staging").display().to_string(),
                    base_path.join("uploads").display().to_string(),
                ),
            )
            .await?;
            let config = Config::load_from_file(&config_path).await?;

            let (event_sender, event_receiver) = refcheck_events::channel();
            let builder = IndexBuilder::new(IndexOptions {
                algorithm: config.index.algorithm,
                on_error: config.index.on_error,
                max_concurrency: config.index.max_concurrency,
            })
            .with_event_sender(event_sender.clone());

            let report = builder.build(&config.reference_dir()).await?;
            let shared = SharedIndex::new(report.index);
            let verifier = UploadVerifier::new(shared.clone(), VerifierOptions::from(&config))
                .with_event_sender(event_sender.clone());
            verifier.prepare().await?;

            Ok(Self {
                temp_dir,
                config,
                builder,
                shared,
                verifier,
                event_sender,
                event_receiver,
            })
        }

        pub fn reference_dir(&self) -> PathBuf {
            self.config.reference_dir()
        }

        pub fn accepted_dir(&self) -> PathBuf {
            self.config.accepted_dir()
        }

        pub fn staging_dir(&self) -> PathBuf {
            self.config.staging_dir()
        }

        /// Regular files left in the accepted and staging directories
        pub async fn stored_files(&self) -> Vec<String> {
            let mut names = Vec::new();
            for dir in [self.accepted_dir(), self.staging_dir()] {
                names.extend(list_files(&dir).await);
            }
            names.sort();
            names
        }
    }

    pub async fn list_files(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        let Ok(mut entries) = fs::read_dir(dir).await else {
            return names;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names
    }
}

use refcheck_errors::UploadRejection;
use refcheck_events::{AppEvent, IndexEvent, UploadEvent};
use refcheck_hash::{Hash, HashAlgorithm};
use refcheck_index::IndexCache;
use refcheck_verify::{verify_with_index, Verdict, VerifierOptions};
use utils::{TestEnvironment, REPORT};

#[tokio::test]
async fn test_upload_scenarios() {
    let env = TestEnvironment::new().await.unwrap();

    // exact bytes
    let verdict = env
        .verifier
        .verify("report.pdf", Some(REPORT.len() as u64), REPORT)
        .await
        .unwrap();
    assert!(verdict.is_accepted());
    assert_eq!(
        fs::read(env.accepted_dir().join("report.pdf")).await.unwrap(),
        REPORT
    );

    // one trailing byte
    let mut altered = REPORT.to_vec();
    altered.push(b' ');
    let verdict = env
        .verifier
        .verify("report.pdf", None, &altered[..])
        .await
        .unwrap();
    assert!(matches!(
        verdict,
        Verdict::Rejected(UploadRejection::HashMismatch { .. })
    ));
    // the rejection is the latest word on the name
    assert!(!env.accepted_dir().join("report.pdf").exists());

    // traversal
    let verdict = env
        .verifier
        .verify("../etc/passwd", None, REPORT)
        .await
        .unwrap();
    assert!(matches!(
        verdict,
        Verdict::Rejected(UploadRejection::InvalidName { .. })
    ));
    assert!(!env.temp_dir.path().join("etc/passwd").exists());

    // unknown
    let verdict = env
        .verifier
        .verify("unknown.pdf", None, REPORT)
        .await
        .unwrap();
    assert!(matches!(
        verdict,
        Verdict::Rejected(UploadRejection::UnknownFile { .. })
    ));

    assert!(env.stored_files().await.is_empty());

    // exact bytes again
    let verdict = env.verifier.verify("report.pdf", None, REPORT).await.unwrap();
    assert!(verdict.is_accepted());
    assert_eq!(env.stored_files().await, vec!["report.pdf".to_string()]);
    assert_eq!(
        fs::read(env.accepted_dir().join("report.pdf")).await.unwrap(),
        REPORT
    );
}

#[tokio::test]
async fn test_configured_size_ceiling() {
    let env = TestEnvironment::new().await.unwrap();
    let big = vec![0u8; 4097];

    let verdict = env.verifier.verify("report.pdf", None, &big[..]).await.unwrap();

    assert_eq!(
        verdict.rejection(),
        Some(&UploadRejection::TooLarge {
            limit: 4096,
            size: 4097,
            declared: false,
        })
    );
    assert!(env.stored_files().await.is_empty());
}

#[tokio::test]
async fn test_reference_tree_is_never_modified() {
    let env = TestEnvironment::new().await.unwrap();

    env.verifier.verify("report.pdf", None, REPORT).await.unwrap();
    env.verifier
        .verify("checksums.txt", None, &b"tampered"[..])
        .await
        .unwrap();

    assert_eq!(
        fs::read(env.reference_dir().join("2024/report.pdf"))
            .await
            .unwrap(),
        REPORT
    );
    assert_eq!(
        fs::read(env.reference_dir().join("checksums.txt"))
            .await
            .unwrap(),
        b"see index"
    );
}

#[tokio::test]
async fn test_concurrent_verifications() {
    let env = TestEnvironment::new().await.unwrap();
    let mut altered = REPORT.to_vec();
    altered[0] ^= 0x01;

    let good = (0..8).map(|_| env.verifier.verify("report.pdf", None, REPORT));
    let bad = (0..8).map(|_| env.verifier.verify("report.pdf", None, &altered[..]));
    let (good, bad) = tokio::join!(
        futures::future::join_all(good),
        futures::future::join_all(bad)
    );

    assert!(good.iter().all(|v| v.as_ref().unwrap().is_accepted()));
    assert!(bad.iter().all(|v| matches!(
        v.as_ref().unwrap(),
        Verdict::Rejected(UploadRejection::HashMismatch { .. })
    )));

    // whichever attempt finished last decides; altered bytes never land
    let stored = env.stored_files().await;
    assert!(stored.is_empty() || stored == vec!["report.pdf".to_string()]);
    if !stored.is_empty() {
        assert_eq!(
            fs::read(env.accepted_dir().join("report.pdf")).await.unwrap(),
            REPORT
        );
    }
}

#[tokio::test]
async fn test_in_flight_upload_keeps_its_snapshot_across_reindex() {
    use tokio::io::AsyncWriteExt;

    let env = TestEnvironment::new().await.unwrap();
    let (mut writer, reader) = tokio::io::duplex(16);
    let (first, rest) = REPORT.split_at(8);

    let verifier = env.verifier.clone();
    let upload = tokio::spawn(async move { verifier.verify("report.pdf", None, reader).await });

    writer.write_all(first).await.unwrap();
    // the staging file exists once the attempt has taken its snapshot
    while utils::list_files(&env.staging_dir()).await.is_empty() {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    fs::write(env.reference_dir().join("2024/report.pdf"), b"revised edition")
        .await
        .unwrap();
    env.shared
        .reindex(&env.builder, &env.reference_dir())
        .await
        .unwrap();

    writer.write_all(rest).await.unwrap();
    drop(writer);

    let verdict = upload.await.unwrap().unwrap();
    assert!(verdict.is_accepted(), "{verdict:?}");

    // new attempts see the new snapshot
    let verdict = env.verifier.verify("report.pdf", None, REPORT).await.unwrap();
    assert!(matches!(
        verdict,
        Verdict::Rejected(UploadRejection::HashMismatch { .. })
    ));
    let verdict = env
        .verifier
        .verify("report.pdf", None, &b"revised edition"[..])
        .await
        .unwrap();
    assert!(verdict.is_accepted());
}

#[tokio::test]
async fn test_exported_index_drives_verification() {
    let env = TestEnvironment::new().await.unwrap();
    let cache = IndexCache::new(env.temp_dir.path().join("hashes.json"));
    cache.save(&env.shared.snapshot()).await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(cache.path()).await.unwrap()).unwrap();
    assert_eq!(
        raw["report.pdf"]["hash"],
        Hash::from_data(REPORT, HashAlgorithm::Sha256).to_hex()
    );

    let loaded = cache
        .load(HashAlgorithm::Sha256, &env.reference_dir())
        .await
        .unwrap();
    let options = VerifierOptions::from(&env.config);
    let verdict = verify_with_index(&loaded, &options, "report.pdf", None, REPORT)
        .await
        .unwrap();
    assert!(verdict.is_accepted());
}

#[tokio::test]
async fn test_event_stream_covers_index_and_upload() {
    let mut env = TestEnvironment::new().await.unwrap();
    env.verifier
        .verify("unknown.pdf", None, REPORT)
        .await
        .unwrap();
    drop(env.verifier);
    drop(env.builder);
    drop(env.event_sender);

    let mut saw_index_completed = false;
    let mut rejection_reason = None;
    while let Some(message) = env.event_receiver.recv().await {
        match message.event {
            AppEvent::Index(IndexEvent::Completed { entries, .. }) => {
                assert_eq!(entries, 2);
                saw_index_completed = true;
            }
            AppEvent::Upload(UploadEvent::Rejected { reason, failure, .. }) => {
                assert_eq!(failure.code.as_deref(), Some("upload.unknown_file"));
                rejection_reason = Some(reason);
            }
            _ => {}
        }
    }

    assert!(saw_index_completed);
    assert_eq!(rejection_reason.as_deref(), Some("unknown_file"));
}
