use std::sync::LazyLock;

use regex::Regex;
use syndica_core::Article;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script>").expect("Valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style>").expect("Valid regex"));
static IMG_STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img([^>]+)style="[^"]*"([^>]*)>"#).expect("Valid regex"));
static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<img\b[^>]*>").expect("Valid regex"));

/// Turn a raw article into HTML ready for submission to the blog.
///
/// Pure and deterministic: same article in, same HTML out.
///
/// - `<script>`/`<style>` elements are stripped;
/// - every `<img>` gets `style="max-width:100%; height:auto;"` (replacing any
///   inline style it carried) and an `alt` attribute when missing;
/// - an excerpt, when present, becomes a summary block before the content;
/// - tags, when present, become a trailing label block.
pub fn format_article(article: &Article) -> String {
    let mut content = article.content.clone();

    content = SCRIPT_RE.replace_all(&content, "").into_owned();
    content = STYLE_RE.replace_all(&content, "").into_owned();

    content = IMG_STYLE_RE
        .replace_all(&content, r#"<img$1$2 style="max-width:100%; height:auto;">"#)
        .into_owned();

    content = IMG_TAG_RE
        .replace_all(&content, |caps: &regex::Captures<'_>| {
            let tag = &caps[0];
            if tag.contains("alt=") {
                tag.to_string()
            } else {
                tag.replacen("<img", r#"<img alt="Article Image""#, 1)
            }
        })
        .into_owned();

    if let Some(excerpt) = &article.excerpt {
        content = format!("{}{content}", excerpt_block(excerpt));
    }

    if !article.tags.is_empty() {
        content.push_str(&tags_block(&article.tags));
    }

    content
}

fn excerpt_block(excerpt: &str) -> String {
    format!(
        "<div style=\"background:#f5f5f5;padding:15px;border-left:4px solid #4CAF50;margin-bottom:20px;\">\
         <p><strong>Summary:</strong> {excerpt}</p>\
         </div>"
    )
}

fn tags_block(tags: &[String]) -> String {
    let tokens = tags
        .iter()
        .map(|tag| format!("<code>{tag}</code>"))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "<div style=\"margin-top:30px;padding-top:15px;border-top:1px dashed #ddd;\">\
         <p><strong>Labels:</strong> {tokens}</p>\
         </div>"
    )
}

#[cfg(test)]
mod tests {
    use syndica_core::{ArticleStatus, Timestamp};

    use super::*;

    fn article_with_content(content: &str) -> Article {
        Article {
            title: "Test".to_string(),
            content: content.to_string(),
            tags: vec![],
            category: None,
            excerpt: None,
            original_url: None,
            source: None,
            featured_image: None,
            status: ArticleStatus::Pending,
            created_at: Timestamp::ZERO,
            published_at: None,
        }
    }

    #[test]
    fn strips_script_and_style_elements() {
        let article = article_with_content(
            "<p>before</p><SCRIPT type=\"text/javascript\">alert('x')</SCRIPT>\
             <style>p { color: red; }</style><p>after</p>",
        );

        let output = format_article(&article);
        assert_eq!(output, "<p>before</p><p>after</p>");
    }

    #[test]
    fn replaces_img_style_and_injects_alt() {
        let article = article_with_content(
            r#"<img src="a.jpg" style="width:640px;float:left">"#,
        );

        let output = format_article(&article);
        assert_eq!(
            output,
            r#"<img alt="Article Image" src="a.jpg"  style="max-width:100%; height:auto;">"#
        );
    }

    #[test]
    fn keeps_existing_alt_and_other_attributes() {
        let article = article_with_content(
            r#"<img src="a.jpg" alt="A chart" style="width:10px" class="hero">"#,
        );

        let output = format_article(&article);
        assert!(output.contains(r#"alt="A chart""#));
        assert!(output.contains(r#"class="hero""#));
        assert!(output.contains("max-width:100%"));
        assert!(!output.contains("width:10px"));
    }

    #[test]
    fn img_without_style_still_gets_alt() {
        let article = article_with_content(r#"<img src="plain.png">"#);

        let output = format_article(&article);
        assert_eq!(output, r#"<img alt="Article Image" src="plain.png">"#);
    }

    #[test]
    fn excerpt_prepended_and_tags_appended() {
        let mut article = article_with_content("<p>body</p>");
        article.excerpt = Some("A short summary".to_string());
        article.tags = vec!["rust".to_string(), "jobs".to_string()];

        let output = format_article(&article);
        let summary_at = output.find("A short summary").expect("Summary present");
        let body_at = output.find("<p>body</p>").expect("Body present");
        let labels_at = output.find("<code>rust</code>").expect("Labels present");

        assert!(summary_at < body_at);
        assert!(body_at < labels_at);
        assert!(output.contains("<code>jobs</code>"));
    }

    #[test]
    fn no_excerpt_no_tags_means_no_blocks() {
        let article = article_with_content("<p>body</p>");

        let output = format_article(&article);
        assert_eq!(output, "<p>body</p>");
    }

    #[test]
    fn deterministic_for_the_same_article() {
        let mut article = article_with_content(
            r#"<img src="a.jpg"><script>x()</script><p>text</p>"#,
        );
        article.excerpt = Some("sum".to_string());
        article.tags = vec!["t".to_string()];

        assert_eq!(format_article(&article), format_article(&article));
    }
}
