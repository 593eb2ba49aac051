use assert_cmd::Command;
use predicates::prelude::*;

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{event:?}"));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use readme_forge::cli::{run, Cli, Commands};

    // An invalid URL fails before any config or network access.
    let cli = Cli {
        command: Commands::Generate {
            url: "not a repository".to_string(),
            config: None,
            output: None,
        },
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}

#[test]
fn help_lists_both_subcommands() {
    let mut cmd = Command::cargo_bin("readme-forge").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("generate").and(predicate::str::contains("publish")));
}

#[test]
fn generate_rejects_url_without_repository_name() {
    let mut cmd = Command::cargo_bin("readme-forge").expect("Binary exists");
    cmd.arg("generate")
        .arg("https://github.com/acme")
        .env_remove("GENERATION_API_KEY")
        .env_remove("DEEPSEEK_API_KEY");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid repository URL"));
}

#[test]
fn publish_requires_a_github_token() {
    let mut cmd = Command::cargo_bin("readme-forge").expect("Binary exists");
    cmd.current_dir(std::env::temp_dir())
        .arg("publish")
        .arg("https://github.com/acme/widgets")
        .env("GITHUB_TOKEN", "");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_TOKEN must be set"));
}

#[test]
fn missing_config_file_is_reported() {
    let mut cmd = Command::cargo_bin("readme-forge").expect("Binary exists");
    cmd.arg("generate")
        .arg("https://github.com/acme/widgets")
        .arg("--config")
        .arg("/nonexistent/readme-forge.yaml");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}
