//! Extraction and conversion over whole pages.

use docharvest::config::SourceConfig;
use docharvest::converter::{convert, TOC_HEADING};
use docharvest::extractor::{extract, ExtractionError};
use docharvest::models::{Document, SourceType};

const PAGE: &str = r#"<html>
<head>
  <title>Field Notes | Example Blog</title>
  <meta name="description" content="Notes from the spring survey.">
  <meta name="author" content="R. Lane">
</head>
<body>
  <header><a href="/">Example Blog</a></header>
  <nav><a href="/archive">Archive</a></nav>
  <article class="post">
    <h1>Field Notes</h1>
    <p>The spring survey covered twelve wetland sites along the northern river.</p>
    <h2>Methods</h2>
    <p>Each site was visited twice, once at dawn and once at dusk.</p>
    <img src="/img/heron.png" alt="Heron">
    <h2>Findings</h2>
    <p>Heron counts rose at nine of the twelve wetland sites.</p>
    <script>trackPageView();</script>
  </article>
  <aside class="sidebar">Popular posts</aside>
  <footer>Copyright 2024</footer>
</body>
</html>"#;

const URL: &str = "https://blog.example.com/2024/field-notes";

#[test]
fn test_page_converts_to_clean_markdown() {
    let extracted = extract(PAGE, &SourceConfig::default(), URL).unwrap();
    assert_eq!(extracted.title, "Field Notes");
    assert_eq!(extracted.matched_by.as_deref(), Some("article"));

    let doc = convert(&extracted, SourceType::Webpage).unwrap();
    assert!(doc.markdown.starts_with("# Field Notes\n"));
    assert!(doc.markdown.contains(TOC_HEADING));
    assert!(doc.markdown.contains("## Methods"));
    assert!(doc.markdown.contains("images/"));
    assert!(!doc.markdown.contains("trackPageView"));
    assert!(!doc.markdown.contains("Popular posts"));
    assert!(!doc.markdown.contains("Copyright"));
    assert!(doc.markdown.ends_with('\n'));
    assert!(!doc.markdown.ends_with("\n\n"));

    assert_eq!(doc.images.len(), 1);
    assert_eq!(doc.images[0].url, "https://blog.example.com/img/heron.png");
    assert!(doc.tags.iter().any(|t| t == "wetland"));
}

#[test]
fn test_conversion_is_deterministic() {
    let config = SourceConfig::default();
    let first = convert(&extract(PAGE, &config, URL).unwrap(), SourceType::Webpage).unwrap();
    let second = convert(&extract(PAGE, &config, URL).unwrap(), SourceType::Webpage).unwrap();
    assert_eq!(first.markdown, second.markdown);
    assert_eq!(
        Document::fingerprint(&first.title, &first.markdown),
        Document::fingerprint(&second.title, &second.markdown)
    );
}

#[test]
fn test_threshold_is_configurable() {
    let html = "<html><body><main><p>Short note.</p></main></body></html>";
    let err = extract(html, &SourceConfig::default(), URL).unwrap_err();
    assert!(matches!(
        err,
        ExtractionError::NoContentFound { required: 50, .. }
    ));

    let config = SourceConfig::from_value(&serde_json::json!({ "min_content_length": 5 })).unwrap();
    let extracted = extract(html, &config, URL).unwrap();
    assert!(extracted.text_length >= 5);
}

#[test]
fn test_explicit_content_selector_wins() {
    let config = SourceConfig::from_value(&serde_json::json!({
        "selectors": { "content": ".post", "title": "h2" }
    }))
    .unwrap();
    let extracted = extract(PAGE, &config, URL).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(extracted.title, "Methods");
    assert_eq!(extracted.matched_by.as_deref(), Some(".post"));
}
