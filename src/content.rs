//! Content extraction: rendered HTML to evaluable text
//!
//! Strips non-content markup and collapses whitespace into a single blob,
//! the shape downstream evaluation prompts expect. Also exposes the
//! `extract` command for local files (no browser involved).

use anyhow::{Context, Result};
use clap::Args;
use regex::Regex;
use scraper::{Html, Node};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tokio::fs;

/// Markup subtrees that never contribute evaluable text.
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript"];

/// Strip scripts/styles from rendered HTML and collapse all whitespace runs
/// into single spaces.
pub fn clean_html(html: &str) -> String {
    let doc = Html::parse_document(html);

    let mut parts: Vec<&str> = Vec::new();
    for node in doc.tree.nodes() {
        if let Node::Text(text) = node.value() {
            let inside_non_content = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(el) => NON_CONTENT_TAGS.contains(&el.name()),
                _ => false,
            });
            if !inside_non_content {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed);
                }
            }
        }
    }

    let joined = parts.join(" ");
    let ws = Regex::new(r"\s+").unwrap();
    ws.replace_all(&joined, " ").trim().to_string()
}

#[derive(Args)]
pub struct ExtractArgs {
    /// HTML files to clean into text
    #[arg(value_name = "FILE", required_unless_present = "stdin")]
    pub files: Vec<PathBuf>,

    /// Read HTML from stdin instead of files
    #[arg(long)]
    pub stdin: bool,
}

/// Cleaned text for one input (compact)
#[derive(Debug, Serialize)]
pub struct ExtractedText {
    pub source: String,
    pub text: String,
    pub len: usize,
}

/// Run the extract command
pub async fn run_extract(args: ExtractArgs) -> Result<()> {
    let mut results: Vec<ExtractedText> = Vec::new();

    if args.stdin {
        let mut html = String::new();
        std::io::stdin()
            .read_to_string(&mut html)
            .context("Failed to read stdin")?;
        results.push(extracted("stdin", &html));
    } else {
        for file in &args.files {
            eprintln!("  -> {}", file.display());
            let html = fs::read_to_string(file)
                .await
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            results.push(extracted(&file.display().to_string(), &html));
        }
    }

    // Single object for one input, one JSON line per input otherwise
    if results.len() == 1 {
        println!("{}", serde_json::to_string(&results[0])?);
    } else {
        for result in &results {
            println!("{}", serde_json::to_string(result)?);
        }
    }

    eprintln!("Done: {} extracted", results.len());
    Ok(())
}

fn extracted(source: &str, html: &str) -> ExtractedText {
    let text = clean_html(html);
    let len = text.len();
    ExtractedText {
        source: source.to_string(),
        text,
        len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_strips_scripts_and_styles() {
        let html = r#"
            <html>
            <head>
                <title>Shop</title>
                <style>body { color: red; }</style>
            </head>
            <body>
                <h1>Products</h1>
                <script>console.log("tracking");</script>
                <p>Two items   in stock.</p>
            </body>
            </html>
        "#;
        let text = clean_html(html);
        assert!(text.contains("Products"));
        assert!(text.contains("Two items in stock."));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_clean_html_collapses_whitespace() {
        let html = "<p>one</p>\n\n<p>two\t\tthree</p>";
        assert_eq!(clean_html(html), "one two three");
    }

    #[test]
    fn test_clean_html_keeps_title_text() {
        let html = "<html><head><title>Landing</title></head><body><p>Hi</p></body></html>";
        let text = clean_html(html);
        assert!(text.contains("Landing"));
        assert!(text.contains("Hi"));
    }

    #[test]
    fn test_clean_html_empty_document() {
        assert_eq!(clean_html("<html><body></body></html>"), "");
    }

    #[test]
    fn test_clean_html_nested_script() {
        let html = "<div>keep<div><script>var x = 1;</script>also</div></div>";
        assert_eq!(clean_html(html), "keep also");
    }
}
