use readme_forge_core::config::PipelineConfig;
use readme_forge_core::contract::{
    ForkedRepository, GenerationFailure, HostError, MockRepositoryReader, MockRepositoryWriter,
    MockTextGenerator, PullRequestResult, RepositoryMetadata, TreeEntry,
};
use readme_forge_core::pipeline::{generate_readme, publish};
use readme_forge_core::publish::PublicationStage;
use readme_forge_core::Error;

fn config() -> PipelineConfig {
    let mut config = PipelineConfig::new("Write a README.");
    config.publication.fork_grace_secs = 0;
    config
}

fn reader_for_widgets() -> MockRepositoryReader {
    let mut reader = MockRepositoryReader::new();
    reader
        .expect_repository_metadata()
        .withf(|owner, repo| owner == "acme" && repo == "widgets")
        .returning(|_, repo| {
            Ok(RepositoryMetadata {
                name: repo.to_string(),
                description: Some("Widgets for everyone".to_string()),
                default_branch: Some("main".to_string()),
            })
        });
    reader
        .expect_list_tree()
        .withf(|reference| reference.full_name() == "acme/widgets" && reference.branch == "main")
        .returning(|_| {
            Ok(vec![
                TreeEntry::blob("src/lib.rs", 20),
                TreeEntry::blob(".git/HEAD", 20),
            ])
        });
    reader
        .expect_fetch_file()
        .withf(|_, path| path == "src/lib.rs")
        .returning(|_, _| Ok("pub fn widget() {}".to_string()));
    reader
}

#[tokio::test]
async fn test_generate_readme_end_to_end() {
    let reader = reader_for_widgets();
    let mut generator = MockTextGenerator::new();
    generator
        .expect_complete()
        .withf(|request| {
            request.user.starts_with("Write a README.")
                && request.user.contains("Repository: acme/widgets")
                && request.user.contains("File: src/lib.rs\n\npub fn widget() {}")
                && !request.user.contains(".git/HEAD")
        })
        .times(1)
        .returning(|_| Ok("  ## Overview\n\nWidgets.  ".to_string()));

    let readme = generate_readme("https://github.com/acme/widgets.git", &reader, &generator, &config())
        .await
        .expect("pipeline should succeed");

    assert_eq!(readme, "# widgets\nWidgets for everyone\n\n## Overview\n\nWidgets.");
}

#[tokio::test]
async fn test_generate_readme_rejects_bad_url_before_any_call() {
    let mut reader = MockRepositoryReader::new();
    reader.expect_repository_metadata().never();
    reader.expect_list_tree().never();
    let mut generator = MockTextGenerator::new();
    generator.expect_complete().never();

    let err = generate_readme("https://github.com/acme", &reader, &generator, &config())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}

#[tokio::test]
async fn test_generate_readme_unknown_repository_is_not_found() {
    let mut reader = MockRepositoryReader::new();
    reader
        .expect_repository_metadata()
        .returning(|_, _| Err(HostError::NotFound("Not Found".into())));
    reader.expect_list_tree().never();
    let generator = MockTextGenerator::new();

    let err = generate_readme("https://github.com/acme/ghost", &reader, &generator, &config())
        .await
        .unwrap_err();
    match err {
        Error::NotFound(name) => assert_eq!(name, "acme/ghost"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_readme_surfaces_generation_failure() {
    let reader = reader_for_widgets();
    let mut generator = MockTextGenerator::new();
    generator.expect_complete().returning(|_| {
        Err(GenerationFailure::Auth {
            status: 401,
            message: "Authentication Fails (no such user)".to_string(),
        })
    });

    let err = generate_readme("https://github.com/acme/widgets", &reader, &generator, &config())
        .await
        .unwrap_err();
    match err {
        Error::Generation(GenerationFailure::Auth { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Authentication Fails (no such user)");
        }
        other => panic!("expected auth failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_readme_uses_configured_base_branch() {
    let mut config = config();
    config.base_branch = "develop".to_string();

    let mut reader = MockRepositoryReader::new();
    reader.expect_repository_metadata().returning(|_, repo| {
        Ok(RepositoryMetadata {
            name: repo.to_string(),
            description: None,
            default_branch: None,
        })
    });
    reader
        .expect_list_tree()
        .withf(|reference| reference.branch == "develop")
        .times(1)
        .returning(|_| Ok(vec![]));
    let mut generator = MockTextGenerator::new();
    generator
        .expect_complete()
        .returning(|_| Ok("Body".to_string()));

    let readme = generate_readme("github.com/acme/widgets", &reader, &generator, &config)
        .await
        .unwrap();
    assert_eq!(readme, "# widgets\n\nBody");
}

#[tokio::test]
async fn test_publish_uses_default_branch_name_and_reports_stage() {
    let mut writer = MockRepositoryWriter::new();
    writer.expect_fork().returning(|_, repo| {
        Ok(ForkedRepository {
            owner: "octo-bot".to_string(),
            name: repo.to_string(),
        })
    });
    writer
        .expect_branch_head()
        .returning(|_, _, _| Ok("base".to_string()));
    writer
        .expect_create_branch()
        .withf(|_, _, branch, _| branch == "update-readme")
        .returning(|_, _, _, _| Ok(()));
    writer
        .expect_create_blob()
        .returning(|_, _, _| Err(HostError::Upstream { status: 500, message: "boom".into() }));

    let err = publish("https://github.com/acme/widgets", "# doc", None, &writer, &config())
        .await
        .unwrap_err();
    assert_eq!(err.publication_stage(), Some(PublicationStage::BlobCreated));
}

#[tokio::test]
async fn test_publish_with_explicit_branch() {
    let mut writer = MockRepositoryWriter::new();
    writer.expect_fork().returning(|_, repo| {
        Ok(ForkedRepository {
            owner: "octo-bot".to_string(),
            name: repo.to_string(),
        })
    });
    writer
        .expect_branch_head()
        .returning(|_, _, _| Ok("base".to_string()));
    writer
        .expect_create_branch()
        .withf(|_, _, branch, _| branch == "docs/readme")
        .returning(|_, _, _, _| Ok(()));
    writer
        .expect_create_blob()
        .returning(|_, _, _| Ok("blob".to_string()));
    writer
        .expect_create_tree()
        .returning(|_, _, _, _, _| Ok("tree".to_string()));
    writer
        .expect_create_commit()
        .returning(|_, _, _, _, _| Ok("commit".to_string()));
    writer
        .expect_update_branch()
        .withf(|_, _, branch, _, _| branch == "docs/readme")
        .returning(|_, _, _, _, _| Ok(()));
    writer
        .expect_create_pull_request()
        .withf(|_, _, request| request.head == "octo-bot:docs/readme")
        .returning(|_, _, _| {
            Ok(PullRequestResult {
                url: "https://github.com/acme/widgets/pull/3".to_string(),
                number: 3,
            })
        });

    let result = publish(
        "https://github.com/acme/widgets",
        "# doc",
        Some("docs/readme"),
        &writer,
        &config(),
    )
    .await
    .unwrap();
    assert_eq!(result.url, "https://github.com/acme/widgets/pull/3");
}

#[tokio::test]
async fn test_generate_readme_keeps_configured_branch_when_default_differs() {
    let mut reader = MockRepositoryReader::new();
    reader.expect_repository_metadata().returning(|_, repo| {
        Ok(RepositoryMetadata {
            name: repo.to_string(),
            description: None,
            default_branch: Some("trunk".to_string()),
        })
    });
    reader
        .expect_list_tree()
        .withf(|reference| reference.branch == "main")
        .times(1)
        .returning(|_| Ok(vec![TreeEntry::blob("src/lib.rs", 10)]));
    reader
        .expect_fetch_file()
        .withf(|reference, _| reference.branch == "main")
        .times(1)
        .returning(|_, _| Ok("fn lib() {}".to_string()));
    let mut generator = MockTextGenerator::new();
    generator
        .expect_complete()
        .returning(|_| Ok("Body".to_string()));

    let readme = generate_readme("https://github.com/acme/widgets", &reader, &generator, &config())
        .await
        .unwrap();
    assert_eq!(readme, "# widgets\n\nBody");
}
