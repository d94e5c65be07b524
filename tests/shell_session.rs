//! End-to-end shell sessions: spawn the compiled binary with a scripted
//! stdin, a scratch home directory, and a mock search endpoint, then assert
//! on the captured transcript.
//!
//! The property under test is how often the story list renders: exactly
//! once per fresh load, and once more after a mutation that changed what's
//! visible.

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Two qualifying stories on page 0, nothing after: the startup unread load
/// makes exactly two search requests and shows a 2-entry list.
async fn mount_two_story_feed(server: &MockServer) {
    let page0 = json!({
        "hits": [
            {"objectID": "42", "title": "First", "points": 300, "author": "a", "created_at_i": 1},
            {"objectID": "43", "title": "Second", "points": 200, "author": "b", "created_at_i": 2}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page0))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": []})))
        .expect(1)
        .mount(server)
        .await;
}

/// Scratch home directory so the spawned binary reads its config and opens
/// its database under `$HOME/.config/sift/`, pointed at the mock server.
fn scratch_home(tag: &str, server: &MockServer) -> PathBuf {
    let home = std::env::temp_dir().join(format!("sift_shell_{tag}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&home);
    let config_dir = home.join(".config").join("sift");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!(
            "search_base_url = \"{uri}\"\nfirebase_base_url = \"{uri}\"\n",
            uri = server.uri()
        ),
    )
    .unwrap();
    home
}

/// Pipe `script` into a fresh binary instance and capture its transcript.
async fn run_session(home: &Path, script: &str) -> String {
    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_sift"))
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .unwrap();

    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(script.as_bytes()).await.unwrap();
    drop(stdin);

    let output = child.wait_with_output().await.unwrap();
    assert!(
        output.status.success(),
        "session exited with {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

#[tokio::test]
async fn test_view_switch_renders_list_once() {
    let server = MockServer::start().await;
    mount_two_story_feed(&server).await;
    let home = scratch_home("switch", &server);

    let transcript = run_session(&home, "saved\nquit\n").await;

    // Startup renders the unread list, the switch renders the empty saved
    // view; each exactly once, even though the visible length changed.
    assert_eq!(transcript.matches("Unread (2 stories)").count(), 1);
    assert_eq!(transcript.matches("Nothing saved").count(), 1);
    assert!(transcript.contains("Goodbye!"));

    std::fs::remove_dir_all(&home).ok();
}

#[tokio::test]
async fn test_mutation_rerenders_shrunk_list() {
    let server = MockServer::start().await;
    mount_two_story_feed(&server).await;
    let home = scratch_home("mark", &server);

    let transcript = run_session(&home, "mark 1\nquit\n").await;

    assert_eq!(transcript.matches("Marked as read: First").count(), 1);
    // The mark dropped a row, so the list renders again with one entry.
    assert_eq!(transcript.matches("Unread (2 stories)").count(), 1);
    assert_eq!(transcript.matches("Unread (1 stories)").count(), 1);

    std::fs::remove_dir_all(&home).ok();
}
