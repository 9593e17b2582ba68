//! Fetching web pages as plain text.
//!
//! [`PageReader`] downloads a page and reduces its HTML to markdown-ish
//! text suitable for prompting. The conversion is regex-based and lossy
//! on purpose; extraction prompts only need readable text, not a DOM.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::ToolError;
use crate::tool::Tool;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static BLANK_RUNS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

static MARKDOWN_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    let rule = |pattern: &str, replacement: &'static str| {
        (Regex::new(pattern).expect("valid regex"), replacement)
    };
    vec![
        rule(r"(?i)<h1[^>]*>([^<]*)</h1>", "\n# $1\n"),
        rule(r"(?i)<h2[^>]*>([^<]*)</h2>", "\n## $1\n"),
        rule(r"(?i)<h3[^>]*>([^<]*)</h3>", "\n### $1\n"),
        rule(r"(?i)<h4[^>]*>([^<]*)</h4>", "\n#### $1\n"),
        rule(r"(?i)<p[^>]*>", "\n"),
        rule(r"(?i)<br\s*/?>", "\n"),
        rule(r"(?i)<li[^>]*>", "\n- "),
        rule(
            r#"(?i)<a[^>]*href=["']([^"']*)["'][^>]*>([^<]*)</a>"#,
            "[$2]($1)",
        ),
        rule(r"(?i)<(?:strong|b)[^>]*>([^<]*)</(?:strong|b)>", "**$1**"),
        rule(r"(?i)<(?:em|i)[^>]*>([^<]*)</(?:em|i)>", "*$1*"),
        rule(r"(?i)<code[^>]*>([^<]*)</code>", "`$1`"),
    ]
});

/// Reduce an HTML document to markdown-ish plain text.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_RE.replace_all(html, "");
    let text = STYLE_RE.replace_all(&text, "");
    let mut text = COMMENT_RE.replace_all(&text, "").into_owned();

    for (re, replacement) in MARKDOWN_RULES.iter() {
        text = re.replace_all(&text, *replacement).into_owned();
    }
    text = text.replace("</p>", "\n").replace("</li>", "");
    text = TAG_RE.replace_all(&text, "").into_owned();

    text = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&#39;", "'");

    BLANK_RUNS_RE.replace_all(&text, "\n\n").trim().to_owned()
}

/// Downloads pages and converts them to prompt-ready text.
#[derive(Debug, Clone)]
pub struct PageReader {
    http: reqwest::Client,
    max_chars: usize,
}

impl PageReader {
    /// Default cap on returned text, in characters.
    pub const DEFAULT_MAX_CHARS: usize = 40_000;
    /// Default fetch timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    /// Create a reader with default limits.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ToolError> {
        Self::with_limits(Self::DEFAULT_MAX_CHARS, Self::DEFAULT_TIMEOUT)
    }

    /// Create a reader with explicit limits.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] if the HTTP client cannot be built.
    pub fn with_limits(max_chars: usize, timeout: Duration) -> Result<Self, ToolError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| ToolError::execution(e.to_string()))?;
        Ok(Self { http, max_chars })
    }

    /// Fetch a page and return its text content, capped at the configured
    /// length.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] for non-HTTP URLs and
    /// [`ToolError::Execution`] for transport or status failures.
    pub async fn read(&self, url: &str) -> Result<String, ToolError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::invalid_args(
                "URL must start with http:// or https://",
            ));
        }

        tracing::debug!(%url, "fetching page");
        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::execution("Request timed out")
            } else {
                ToolError::execution(format!("Failed to fetch page: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::execution(format!("HTTP error: {status}")));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ToolError::execution(format!("Failed to read body: {e}")))?;
        Ok(self.truncate(&html_to_text(&html)))
    }

    fn truncate(&self, text: &str) -> String {
        if text.chars().count() <= self.max_chars {
            return text.to_owned();
        }
        let head: String = text.chars().take(self.max_chars).collect();
        format!("{head}...\n\n_Truncated to {} characters_", self.max_chars)
    }
}

/// Arguments for [`ReadPageTool`].
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadPageArgs {
    /// HTTP or HTTPS URL of the page to read.
    pub url: String,
}

/// Tool exposing [`PageReader`] to the agent loop.
#[derive(Debug, Clone)]
pub struct ReadPageTool {
    reader: PageReader,
}

impl ReadPageTool {
    /// Create the tool with default reader limits.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ToolError> {
        Ok(Self {
            reader: PageReader::new()?,
        })
    }

    /// Create the tool over an existing reader.
    #[must_use]
    pub const fn with_reader(reader: PageReader) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Tool for ReadPageTool {
    const NAME: &'static str = "read_page";

    type Args = ReadPageArgs;
    type Output = String;

    fn description(&self) -> String {
        "Read a web page at the given URL and return its content as markdown text.".to_owned()
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, ToolError> {
        self.reader.read(&args.url).await
    }
}
