use crate::dir_options;
use async_trait::async_trait;
use rustbuster::config::load_options;
use rustbuster::output::{run, RunSummary};
use rustbuster::plugin::{from_options, DirPlugin, Plugin, ProbeContext, ProbeResult};
use rustbuster::{BusterError, ClientError, FileWordlist, MemoryWordlist, ProbeError};
use std::io::Write;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_site(mock_server: &MockServer) {
    for hit in ["admin", "backup"] {
        Mock::given(method("GET"))
            .and(path(format!("/{}", hit)))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello world"))
            .mount(mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/secret"))
        .respond_with(ResponseTemplate::new(403))
        .mount(mock_server)
        .await;
}

fn create_temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_run_writes_rendered_results_to_output_file() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let output_path = dir.path().join("found.txt");

    let mut options = dir_options(&mock_server.uri(), 4);
    options.general.output = Some(output_path.clone());
    options.http.include_length = true;

    let summary = run(
        CancellationToken::new(),
        &options,
        Arc::new(DirPlugin::new(&options)),
        Arc::new(MemoryWordlist::new([
            "admin", "index", "backup", "secret", "images",
        ])),
    )
    .await
    .unwrap();

    assert_eq!(
        summary,
        RunSummary {
            results: 5,
            hits: 3,
            errors: 0,
        }
    );

    let written = std::fs::read_to_string(&output_path).unwrap();
    let mut lines: Vec<&str> = written.lines().collect();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "/admin (Status: 200) [Size: 11]",
            "/backup (Status: 200) [Size: 11]",
            "/secret (Status: 403) [Size: 0]",
        ]
    );
}

#[tokio::test]
async fn test_run_from_toml_options() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let wordlist = create_temp_file("# common words\nadmin\nlogin\n\nbackup\n");
    let config = create_temp_file(&format!(
        r#"
mode = "dir"

[general]
threads = 2
wordlist = "{}"
quiet = true

[http]
url = "{}"
timeout = 5

[dir]
status-codes = [200]
"#,
        wordlist.path().display(),
        mock_server.uri()
    ));

    let options = load_options(config.path()).unwrap();
    let source = FileWordlist::open(&options.general.wordlist).await.unwrap();
    let plugin = from_options(&options).unwrap();

    let summary = run(CancellationToken::new(), &options, plugin, Arc::new(source))
        .await
        .unwrap();

    assert_eq!(summary.results, 3);
    assert_eq!(summary.hits, 2);
    assert_eq!(summary.errors, 0);
}

#[tokio::test]
async fn test_run_reports_setup_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let options = dir_options(&mock_server.uri(), 2);
    let result = run(
        CancellationToken::new(),
        &options,
        Arc::new(DirPlugin::new(&options)),
        Arc::new(MemoryWordlist::new(["admin"])),
    )
    .await;

    assert!(matches!(result, Err(BusterError::WildcardUrl { .. })));
}

/// Strategy whose probes always fail
struct Unreachable;

#[async_trait]
impl Plugin for Unreachable {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn process(&self, _ctx: &ProbeContext, word: &str) -> Result<ProbeResult, ProbeError> {
        Err(ProbeError::new(
            word,
            ClientError::Resolve {
                name: word.to_string(),
                message: "no route".to_string(),
            },
        ))
    }

    fn result_to_string(&self, _result: &ProbeResult) -> Option<String> {
        None
    }

    fn config_string(&self) -> String {
        String::new()
    }
}

#[tokio::test]
async fn test_run_completes_when_every_probe_fails() {
    let options = dir_options("http://127.0.0.1/", 3);
    let summary = run(
        CancellationToken::new(),
        &options,
        Arc::new(Unreachable),
        Arc::new(MemoryWordlist::new(["a", "b", "c", "d"])),
    )
    .await
    .unwrap();

    assert_eq!(
        summary,
        RunSummary {
            results: 0,
            hits: 0,
            errors: 4,
        }
    );
}
