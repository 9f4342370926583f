//! Library API integration tests
use harvest_core::*;
use rstest::rstest;

const THREAD_URL: &str = "http://forum.example.org/read.php?2,736";

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

#[test]
fn test_locate_message_body_thread() {
    let html = fixture("forum_message_body.html");
    let result = locate_post_pattern(&html, THREAD_URL).expect("should locate");

    assert_eq!(result.url, THREAD_URL);
    assert_eq!(result.xpath_pattern.unwrap().to_string(), r#"//div[@class="message-body"]/.."#);
    assert_eq!(result.text_xpath_pattern.unwrap().to_string(), r#"//div[@class="message-body"]"#);
    assert_eq!(
        result.url_xpath_pattern.unwrap().to_string(),
        r#"//a[@class="permalink"][not(*) and string-length(text()) > 0]"#
    );
    assert_eq!(
        result.date_xpath_pattern.unwrap().to_string(),
        r#"//div[@class="date"][not(*) and string-length(text()) > 0]"#
    );
    assert_eq!(
        result.user_xpath_pattern.unwrap().to_string(),
        r#"//div[@class="message-author"]/a[not(*) and string-length(text()) > 0]"#
    );
    assert_eq!(result.forum_posts.map(|p| p.len()), Some(4));
    assert!(result.xpath_score.is_some_and(|s| s > 0.0));
}

#[test]
fn test_extract_message_body_thread() {
    let html = fixture("forum_message_body.html");
    let harvester = Harvester::new();
    let result = harvester.locate(&html, THREAD_URL).unwrap();
    let posts = harvester.extract(&html, THREAD_URL, &result, false).unwrap();

    let gold = [
        "My chilli plants survived last winter on a cool windowsill at about twelve degrees. I cut them back hard in October and watered only when the soil was completely dry.",
        "Aphids were the biggest problem indoors for me, so check the undersides of the leaves every week. A gentle spray of soapy water took care of them without any chemicals.",
        "Older plants fruit much earlier in the second season, which is the main reason to bother at all. Mine gave ripe pods by late June instead of September.",
        "Good point about the aphids. I also move the pots outside on mild afternoons in March so the plants harden off slowly before they go back into the greenhouse.",
    ];
    assert_eq!(posts.len(), gold.len());
    for (post, expected) in posts.iter().zip(gold) {
        assert!(fuzzy_ratio(&post.post_text, expected) > 90, "post text: {}", post.post_text);
    }

    assert_eq!(posts[1].url.as_deref(), Some("http://forum.example.org/read.php?2,736,741#msg-741"));
    assert_eq!(posts[2].user.as_deref(), Some("Jonas Becker"));
    assert_eq!(posts[0].date, Some(PostDate::Text("25-February-2012 21:46".into())));
}

#[test]
fn test_extract_dates_as_datetime() {
    let html = fixture("forum_message_body.html");
    let harvester = Harvester::new();
    let result = harvester.locate(&html, THREAD_URL).unwrap();
    let posts = harvester.extract(&html, THREAD_URL, &result, true).unwrap();

    let expected = chrono::NaiveDate::from_ymd_opt(2012, 2, 26).unwrap().and_hms_opt(8, 2, 0).unwrap();
    assert_eq!(posts[1].date, Some(PostDate::DateTime(expected)));
}

#[test]
fn test_locate_is_idempotent() {
    let html = fixture("forum_message_body.html");
    let first = locate_post_pattern(&html, THREAD_URL).unwrap();
    let second = locate_post_pattern(&html, THREAD_URL).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_returned_selectors_match_elements() {
    let html = fixture("forum_message_body.html");
    let result = locate_post_pattern(&html, THREAD_URL).unwrap();
    let doc = Document::parse(&html).unwrap();

    let selectors = [
        &result.xpath_pattern,
        &result.text_xpath_pattern,
        &result.url_xpath_pattern,
        &result.date_xpath_pattern,
        &result.user_xpath_pattern,
    ];
    for selector in selectors.into_iter().flatten() {
        assert!(!doc.query(selector).is_empty(), "no match for {}", selector);
    }
}

#[test]
fn test_widening_stops_below_minimum() {
    let html = fixture("forum_message_body.html");
    let result = locate_post_pattern(&html, THREAD_URL).unwrap();
    let doc = Document::parse(&html).unwrap();

    let pattern = result.xpath_pattern.unwrap();
    let wider = pattern.as_path().unwrap().widen_one_ancestor();
    assert!(wider.evaluate(&doc).len() < HarvestConfig::default().min_post_count);
}

#[test]
fn test_no_permalinks_synthesizes_urls() {
    let html = fixture("forum_no_permalink.html");
    let url = "http://garden.example.net/thread/9";
    let harvester = Harvester::new();
    let result = harvester.locate(&html, url).unwrap();

    assert!(result.url_xpath_pattern.is_none());

    let posts = harvester.extract(&html, url, &result, false).unwrap();
    let urls: Vec<&str> = posts.iter().filter_map(|p| p.url.as_deref()).collect();
    assert_eq!(
        urls,
        vec![
            "http://garden.example.net/thread/9#1",
            "http://garden.example.net/thread/9#2",
            "http://garden.example.net/thread/9#3",
            "http://garden.example.net/thread/9#4"
        ]
    );
    assert!(posts.iter().all(|p| p.date.is_none()));
}

#[rstest]
#[case::zebra_rows("forum_zebra.html", "//td[contains(@class, 'forum_message')]/..", 4)]
#[case::form_wrapped("forum_form_wrapped.html", r#"//span[@class="txt"]"#, 3)]
#[case::message_body("forum_no_permalink.html", r#"//div[@class="message-body"]/.."#, 4)]
fn test_post_patterns(#[case] name: &str, #[case] expected: &str, #[case] posts: usize) {
    let html = fixture(name);
    let result = locate_post_pattern(&html, "http://forum.example.org/t/1").unwrap();

    assert_eq!(result.xpath_pattern.as_ref().map(|s| s.to_string()).as_deref(), Some(expected));
    assert_eq!(result.post_count(), posts);
}

#[test]
fn test_single_post_not_extractable() {
    let html = fixture("single_post.html");
    let result = locate_post_pattern(&html, "http://forum.example.org/t/1").unwrap();

    assert!(!result.is_extractable());
    assert!(result.forum_posts.is_none());
    let json = convert_to_json(&result, None, &JsonConfig::default()).unwrap();
    assert!(json.contains(r#""xpath_pattern":null"#));
}

#[test]
fn test_invalid_url_is_an_error() {
    let html = fixture("forum_zebra.html");
    assert!(matches!(locate_post_pattern(&html, "/relative/only"), Err(HarvestError::InvalidUrl(_))));
}

#[test]
fn test_extract_posts_with_explicit_selectors() {
    let html = fixture("forum_message_body.html");
    let post: Selector = r#"//div[@class="message-body"]"#.parse().unwrap();
    let link: Selector = r#"//a[@class="permalink"]"#.parse().unwrap();

    let posts = extract_posts(&html, THREAD_URL, &post, Some(&link), None, None, false).unwrap();
    assert_eq!(posts.len(), 4);
    assert_eq!(posts[3].url.as_deref(), Some("http://forum.example.org/read.php?2,736,760#msg-760"));
    assert!(posts.iter().all(|p| p.user.as_deref() == Some(ANONYMOUS)));
}

#[test]
fn test_entities_document() {
    let html = fixture("forum_message_body.html");
    let harvester = Harvester::new();
    let result = harvester.locate(&html, THREAD_URL).unwrap();
    let posts = harvester.extract(&html, THREAD_URL, &result, false).unwrap();

    let value: serde_json::Value = serde_json::from_str(&entities_to_json(THREAD_URL, &posts, false).unwrap()).unwrap();
    let entities = value["entities"][THREAD_URL].as_array().unwrap();
    assert_eq!(entities.len(), 16);
    assert_eq!(entities[0]["type"], "user");
    assert_eq!(entities[0]["surface_form"], "Martin Weber");
}

#[test]
fn test_config_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("harvest.json");
    std::fs::write(&path, r#"{"min_post_count": 5}"#).unwrap();

    let config = HarvestConfig::from_file(&path).unwrap();
    assert_eq!(config.min_post_count, 5);
    assert_eq!(config.match_prefix_size, HarvestConfig::default().match_prefix_size);
}
