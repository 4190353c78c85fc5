//! Text Extraction & Summary
//!
//! Works out a topic and a site from requests like "extract text about AI
//! from BBC" (or takes a URL given directly), fetches the page over plain
//! HTTP, strips it down to text and asks the LLM for bullet points and
//! keywords about the topic.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use super::{find_url, AbilityContext, AbilityOutput, AbilityResult};
use crate::extract::{squash_whitespace, truncate_chars};
use crate::types::{AppError, AppResult};

const MAX_CONTENT_CHARS: usize = 15_000;
const MIN_CONTENT_CHARS: usize = 100;
const SUMMARY_MAX_TOKENS: u32 = 1024;
const DEFAULT_TOPIC: &str = "the main points";

const USAGE: &str = "Could not understand the request. Try one of:\n\
• \"extract text about AI from BBC\"\n\
• \"get info about climate change from TechCrunch\"\n\
• \"summarize Apple products from CNET\"";

static SITE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bfrom\s+([\w\-]+\.[\w.]+)",
        r"\bfrom\s+([\w\-]+)",
        r"\bon\s+([\w\-]+\.[\w.]+)",
        r"\bon\s+([\w\-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid site regex"))
    .collect()
});

static TOPIC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\babout\s+(.+?)\s+(?:from|on)\b",
        r"\b(?:extract|get|find|summarize)\s+(?:(?:text|info|information)\s+)?(?:(?:about|on)\s+)?(.+?)\s+(?:from|on)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid topic regex"))
    .collect()
});

static COMMAND_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(extract|get|find|summarize|summary|text|info|information|from|on|about)\b")
        .expect("valid command regex")
});

/// Subtrees that never hold readable text
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];
/// Elements that run on within a line; everything else is a word break
const INLINE_TAGS: &[&str] = &["a", "abbr", "b", "code", "em", "i", "small", "span", "strong", "sub", "sup", "u"];

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub site: String,
    pub topic: String,
    pub url: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub keywords: Vec<String>,
    pub chars_analyzed: usize,
}

/// What to read and what to look for in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub topic: String,
    pub site: String,
    pub url: String,
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|p| p.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse "extract text about AI from BBC" style requests. A URL anywhere in
/// the task is used as-is. `None` when no site can be found.
pub fn parse_request(task: &str) -> Option<ExtractionRequest> {
    if let Some(raw_url) = find_url(task) {
        let url = Url::parse(raw_url).ok()?;
        let site = url.host_str()?.trim_start_matches("www.").to_string();
        let rest = task.replace(raw_url, " ").to_lowercase();
        let topic = first_capture(&TOPIC_PATTERNS, &format!("{} from", rest))
            .unwrap_or_else(|| squash_whitespace(&COMMAND_WORDS.replace_all(&rest, " ")));
        let topic = if topic.is_empty() { DEFAULT_TOPIC.to_string() } else { topic };
        return Some(ExtractionRequest {
            topic,
            site,
            url: url.to_string(),
        });
    }

    let lower = task.to_lowercase();
    let mut site = first_capture(&SITE_PATTERNS, &lower)?;
    if !site.contains('.') {
        site.push_str(".com");
    }

    let topic = first_capture(&TOPIC_PATTERNS, &lower).unwrap_or_else(|| {
        let cleaned = COMMAND_WORDS.replace_all(&lower, " ").replace(&site, " ");
        let bare = site.split('.').next().unwrap_or_default();
        squash_whitespace(
            &cleaned
                .split_whitespace()
                .filter(|word| *word != bare)
                .collect::<Vec<_>>()
                .join(" "),
        )
    });
    if topic.is_empty() {
        return None;
    }

    let url = search_url(&site, &topic);
    Some(ExtractionRequest { topic, site, url })
}

/// Site search page for known news sites, the home page otherwise
pub fn search_url(site: &str, topic: &str) -> String {
    let base = site.split('.').next().unwrap_or(site);
    let search = match base {
        "bbc" => Some(("https://www.bbc.com/search", "q")),
        "techcrunch" => Some(("https://techcrunch.com/", "s")),
        "cnet" => Some(("https://www.cnet.com/search/", "q")),
        "forbes" => Some(("https://www.forbes.com/search/", "q")),
        "reuters" => Some(("https://www.reuters.com/site-search/", "query")),
        _ => None,
    };

    search
        .and_then(|(page, param)| Url::parse_with_params(page, &[(param, topic)]).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| {
            if site.starts_with("http") {
                site.to_string()
            } else {
                format!("https://{}", site)
            }
        })
}

/// Visible text of an HTML page, whitespace collapsed, capped at 15 000 chars
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::with_capacity(html.len().min(MAX_CONTENT_CHARS * 2));
    collect_text(document.root_element(), &mut text);
    truncate_chars(&squash_whitespace(&text), MAX_CONTENT_CHARS).to_string()
}

fn collect_text(element: ElementRef<'_>, buf: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(&text.text),
            Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(el) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let breaks = !INLINE_TAGS.contains(&el.name());
                if breaks {
                    buf.push(' ');
                }
                collect_text(child, buf);
                if breaks {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn build_prompt(topic: &str, site: &str, content: &str) -> String {
    format!(
        r#"You are extracting information about "{topic}" from {site}.

Analyze this webpage content and extract ONLY information related to "{topic}".

Create a summary with:
1. 5-7 bullet points about "{topic}" (most important facts only)
2. 3-5 keywords related to "{topic}"

Rules:
- Focus ONLY on "{topic}", ignore unrelated content
- Each bullet should be clear and concise (1-2 sentences)
- Start bullets with •
- Extract facts, not opinions

Content from {site}:
{content}

Respond in this format:
TOPIC: {topic}

KEY POINTS:
• [specific point about {topic}]
• [another point]

KEYWORDS: [keyword1, keyword2, keyword3]
"#
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSummary {
    pub summary: String,
    pub key_points: Vec<String>,
    pub keywords: Vec<String>,
}

/// Split model output into bullets and keywords. Output that ignores the
/// requested format becomes the summary as a whole.
pub fn parse_summary(output: &str) -> ParsedSummary {
    let output = output.trim();
    if !output.contains("KEY POINTS:") {
        return ParsedSummary {
            summary: output.to_string(),
            key_points: Vec::new(),
            keywords: Vec::new(),
        };
    }

    let (body, keywords) = match output.split_once("KEYWORDS:") {
        Some((body, tail)) => {
            let line = tail.trim().lines().next().unwrap_or_default();
            let keywords = line
                .trim()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
            (body, keywords)
        }
        None => (output, Vec::new()),
    };

    let summary = body
        .lines()
        .filter(|line| !line.trim_start().starts_with("TOPIC:"))
        .collect::<Vec<_>>()
        .join("\n")
        .replace("KEY POINTS:", "")
        .trim()
        .to_string();

    let key_points = summary
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix('•')
                .or_else(|| line.strip_prefix('-'))
                .or_else(|| line.strip_prefix('*'))
        })
        .map(|point| point.trim().to_string())
        .filter(|point| !point.is_empty())
        .collect();

    ParsedSummary {
        summary,
        key_points,
        keywords,
    }
}

async fn fetch_page(ctx: &AbilityContext, url: &str) -> Result<String, reqwest::Error> {
    ctx.services
        .http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

pub async fn run(task: &str, ctx: &AbilityContext) -> AppResult<AbilityResult> {
    let Some(request) = parse_request(task) else {
        return Ok(AbilityResult::error(USAGE));
    };
    let llm = ctx.services.llm.clone().ok_or_else(|| {
        AppError::Config(
            "text summarization needs an LLM API key (set GEMINI_API_KEY or OPENAI_API_KEY)".to_string(),
        )
    })?;
    info!(topic = %request.topic, site = %request.site, url = %request.url, "Extracting text");

    ctx.progress.update(format!("Reading {}...", request.site));
    let html = match fetch_page(ctx, &request.url).await {
        Ok(html) => html,
        Err(e) => {
            return Ok(AbilityResult::error(format!(
                "Could not fetch from {}: {}",
                request.site, e
            )))
        }
    };

    let content = html_to_text(&html);
    debug!(fetched = html.len(), cleaned = content.len(), "Page cleaned");
    if content.chars().count() < MIN_CONTENT_CHARS {
        return Ok(AbilityResult::error(format!(
            "Could not extract meaningful content from {}",
            request.site
        )));
    }

    ctx.progress.update("AI analyzing content...");
    let prompt = build_prompt(&request.topic, &request.site, &content);
    let output = match llm.complete(&prompt, SUMMARY_MAX_TOKENS).await {
        Ok(output) => output,
        Err(e) => return Ok(AbilityResult::error(format!("AI analysis failed: {}", e))),
    };

    let parsed = parse_summary(&output);
    let message = format!(
        "Extracted {} key points about '{}' from {}",
        parsed.key_points.len(),
        request.topic,
        request.site
    );

    Ok(AbilityResult::success(message).with_output(AbilityOutput::Summary(SummaryReport {
        site: request.site,
        topic: request.topic,
        url: request.url,
        summary: parsed.summary,
        key_points: parsed.key_points,
        keywords: parsed.keywords,
        chars_analyzed: content.chars().count(),
    })))
}
