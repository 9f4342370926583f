//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

const THREAD_URL: &str = "http://forum.example.org/read.php?2,736";

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("harvest")
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn json_stdout(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn test_cli_file_input() {
    let output = cmd()
        .args(["--url", THREAD_URL, &get_fixture_path("forum_message_body.html")])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = json_stdout(&output);
    assert_eq!(value["url"], THREAD_URL);
    assert_eq!(value["xpath_pattern"], r#"//div[@class="message-body"]/.."#);
    assert!(value.get("posts").is_none());
}

#[test]
fn test_cli_file_input_without_url() {
    cmd()
        .arg(get_fixture_path("forum_zebra.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""url":"file://"#));
}

#[test]
fn test_cli_stdin_input() {
    let html = std::fs::read_to_string(get_fixture_path("forum_zebra.html")).unwrap();
    cmd()
        .args(["--url", "http://forum.example.org/t/1", "-"])
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("forum_message"));
}

#[test]
fn test_cli_stdin_requires_url() {
    cmd()
        .arg("-")
        .write_stdin("<html><body></body></html>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--url"));
}

#[test]
fn test_cli_posts() {
    let output = cmd()
        .args(["--posts", "--url", THREAD_URL, &get_fixture_path("forum_message_body.html")])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = json_stdout(&output);
    let posts = value["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 4);
    assert_eq!(posts[0]["user"], "Martin Weber");
    assert_eq!(posts[0]["date"], "25-February-2012 21:46");
}

#[test]
fn test_cli_datetime() {
    cmd()
        .args(["--posts", "--datetime", "--url", THREAD_URL, &get_fixture_path("forum_message_body.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("2012-02-25T21:46:00"));
}

#[test]
fn test_cli_text_format() {
    cmd()
        .args(["-f", "text", "--url", THREAD_URL, &get_fixture_path("forum_message_body.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Posts of http://forum.example.org/read.php?2,736"))
        .stdout(predicate::str::contains("Aphids were the biggest problem"));
}

#[test]
fn test_cli_entities_format() {
    let output = cmd()
        .args(["-f", "entities", "--url", THREAD_URL, &get_fixture_path("forum_message_body.html")])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = json_stdout(&output);
    let entities = value["entities"][THREAD_URL].as_array().unwrap();
    assert_eq!(entities.len(), 16);
    assert_eq!(entities[3]["type"], "post_text");
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("patterns.json");

    cmd()
        .args(["-o", output.to_str().unwrap(), "--pretty", "--url", THREAD_URL])
        .arg(get_fixture_path("forum_message_body.html"))
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains('\n'));
    assert!(written.contains("xpath_pattern"));
}

#[test]
fn test_cli_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("harvest.json");
    std::fs::write(&config, r#"{"footer_markers": ["powered by"]}"#).unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap(), &get_fixture_path("forum_form_wrapped.html")])
        .assert()
        .success();
}

#[test]
fn test_cli_invalid_config() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("harvest.json");
    std::fs::write(&config, r#"{"vsm_size": 0}"#).unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap(), &get_fixture_path("forum_zebra.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_cli_not_extractable() {
    cmd()
        .arg(get_fixture_path("single_post.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""xpath_pattern":null"#));
}

#[test]
fn test_cli_invalid_file() {
    cmd()
        .arg("nonexistent.html")
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found: nonexistent.html"));
}

#[test]
fn test_cli_invalid_format() {
    cmd()
        .args(["-f", "markdown", &get_fixture_path("forum_zebra.html")])
        .assert()
        .failure();
}

#[test]
fn test_cli_invalid_page_url() {
    cmd()
        .args(["--url", "not a url", &get_fixture_path("forum_zebra.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid URL"));
}

#[test]
fn test_cli_verbose() {
    cmd()
        .args(["-v", &get_fixture_path("forum_zebra.html")])
        .assert()
        .success()
        .stderr(predicate::str::contains("Harvest"));
}
