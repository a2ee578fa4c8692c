//! Rendered content fragments and the helpers that rewrite them.
//!
//! Every helper returns a new [`Fragment`] carrying the original resources;
//! only the content string changes.

use crate::course_key::{CourseKey, UsageKey};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentResource {
    pub kind: String,
    pub data: String,
    pub mimetype: String,
    pub placement: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub content: String,
    pub resources: Vec<FragmentResource>,
    pub js_init_fn: Option<String>,
    pub js_init_version: Option<u32>,
}

impl Fragment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn add_css(&mut self, text: impl Into<String>) {
        self.add_resource(text, "text/css", "head");
    }

    pub fn add_javascript(&mut self, text: impl Into<String>) {
        self.add_resource(text, "application/javascript", "foot");
    }

    pub fn add_resource(
        &mut self,
        text: impl Into<String>,
        mimetype: &str,
        placement: &str,
    ) {
        self.resources.push(FragmentResource {
            kind: "text".to_string(),
            data: text.into(),
            mimetype: mimetype.to_string(),
            placement: placement.to_string(),
        });
    }

    /// Registers the JavaScript function the runtime calls to initialize the block.
    pub fn initialize_js(&mut self, js_func: impl Into<String>, version: u32) {
        self.js_init_fn = Some(js_func.into());
        self.js_init_version = Some(version);
    }
}

/// Returns a fragment with `new_content` and all of `fragment`'s resources.
pub fn wrap_fragment(fragment: &Fragment, new_content: impl Into<String>) -> Fragment {
    Fragment {
        content: new_content.into(),
        ..fragment.clone()
    }
}

/// What `wrap_xblock` needs to know about the block being wrapped.
#[derive(Debug, Clone)]
pub struct BlockInfo {
    pub usage_id: UsageKey,
    pub block_type: String,
    pub display_name: Option<String>,
}

impl BlockInfo {
    pub fn new(usage_id: UsageKey) -> Self {
        let block_type = usage_id.block_type().to_string();
        Self {
            usage_id,
            block_type,
            display_name: None,
        }
    }
}

/// Wraps `frag` in the `<div class="xblock ...">` element the client runtime
/// looks for, with `data-*` attributes describing the block.
pub fn wrap_xblock<F>(
    runtime_class: &str,
    block: &BlockInfo,
    view: &str,
    frag: &Fragment,
    usage_id_serializer: F,
    request_token: &str,
) -> Fragment
where
    F: Fn(&UsageKey) -> String,
{
    let classes = ["xblock".to_string(), format!("xblock-{}", escape_html(view))];

    let mut data: BTreeMap<&str, String> = BTreeMap::new();
    if let Some(init) = &frag.js_init_fn {
        data.insert("init", init.clone());
        data.insert(
            "runtime-version",
            frag.js_init_version.unwrap_or(1).to_string(),
        );
    }
    data.insert("runtime-class", runtime_class.to_string());
    data.insert("block-type", block.block_type.clone());
    data.insert("usage-id", usage_id_serializer(&block.usage_id));
    data.insert("request-token", request_token.to_string());

    let data_attributes = data
        .iter()
        .map(|(key, value)| format!("data-{}=\"{}\"", escape_html(key), escape_html(value)))
        .collect::<Vec<_>>()
        .join(" ");

    let html = format!(
        "<div class=\"{}\" {}>\n{}\n</div>",
        classes.join(" "),
        data_attributes,
        frag.content
    );
    wrap_fragment(frag, html)
}

/// Makes a usage id safe to embed in a URL path segment.
pub fn quote_slashes(text: &str) -> String {
    text.replace(';', ";;").replace('/', ";_")
}

pub fn unquote_slashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ';' {
            match chars.peek() {
                Some(';') => {
                    chars.next();
                    out.push(';');
                }
                Some('_') => {
                    chars.next();
                    out.push('/');
                }
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Replaces characters that are not allowed in an HTML id.
pub fn sanitize_html_id(html_id: &str) -> String {
    html_id.replace([':', '-'], "_")
}

// Quote styles a rewritable url may be wrapped in: \" \' " '
const QUOTES: [(&str, &str); 4] = [("e1", "\\\""), ("s1", "\\'"), ("e2", "\""), ("s2", "'")];

/// Matches a quoted url that starts with `prefix`; the group named after the
/// quote style holds the rest of the url.
fn url_replace_regex(prefix: &str) -> Regex {
    let prefix = regex::escape(prefix);
    let pattern = format!(
        r#"\\"{p}(?P<e1>.*?)\\"|\\'{p}(?P<s1>.*?)\\'|"{p}(?P<e2>[^"]*)"|'{p}(?P<s2>[^']*)'"#,
        p = prefix
    );
    Regex::new(&pattern).expect("url replace pattern is valid")
}

fn jump_to_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| url_replace_regex("/jump_to_id/"))
}

fn course_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| url_replace_regex("/course/"))
}

fn static_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| url_replace_regex("/static/"))
}

/// Rewrites every quoted url matched by `re` using `rewrite(rest)`.
/// Returning `None` from `rewrite` keeps the original text.
fn replace_quoted_urls<F>(text: &str, re: &Regex, rewrite: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    re.replace_all(text, |caps: &Captures| {
        for (group, quote) in QUOTES {
            if let Some(rest) = caps.name(group) {
                return match rewrite(rest.as_str()) {
                    Some(url) => format!("{quote}{url}{quote}"),
                    None => caps[0].to_string(),
                };
            }
        }
        caps[0].to_string()
    })
    .into_owned()
}

/// `/jump_to_id/<id>` → `<jump_to_id_base_url><id>`
pub fn replace_jump_to_id_urls(jump_to_id_base_url: &str, frag: &Fragment) -> Fragment {
    let content = replace_quoted_urls(&frag.content, jump_to_id_re(), |rest| {
        Some(format!("{}{}", jump_to_id_base_url, rest))
    });
    wrap_fragment(frag, content)
}

/// `/course/<rest>` → `/courses/<course_id>/<rest>`
pub fn replace_course_urls(course_key: &CourseKey, frag: &Fragment) -> Fragment {
    let course_id = course_key.to_string();
    let content = replace_quoted_urls(&frag.content, course_re(), |rest| {
        Some(format!("/courses/{}/{}", course_id, rest))
    });
    wrap_fragment(frag, content)
}

/// `/static/<path>` → the course asset url when a course is given, otherwise
/// `/static/<data_dir>/<path>`. Urls ending in `?raw` are left alone.
pub fn replace_static_urls(
    data_dir: Option<&str>,
    course_key: Option<&CourseKey>,
    frag: &Fragment,
) -> Fragment {
    let content = replace_quoted_urls(&frag.content, static_re(), |rest| {
        if rest.ends_with("?raw") {
            return None;
        }
        match (course_key, data_dir) {
            (Some(key), _) => Some(format!("{}{}", key.asset_url_base(), asset_name(rest))),
            (None, Some(dir)) => Some(format!("/static/{}/{}", dir.trim_matches('/'), rest)),
            (None, None) => None,
        }
    });
    wrap_fragment(frag, content)
}

/// Assets are flat per course: nested paths collapse into one name.
fn asset_name(rest: &str) -> String {
    let rest = rest.trim_start_matches('/');
    match rest.split_once('?') {
        Some((path, query)) => format!("{}?{}", path.replace('/', "_"), query),
        None => rest.replace('/', "_"),
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Per-request token shared by every block rendered for the same request.
#[cfg(feature = "service")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken(pub String);

/// Returns the token cached on the request, creating and caching a fresh
/// uuid1 hex string on first use.
#[cfg(feature = "service")]
pub fn request_token(extensions: &mut axum::http::Extensions) -> String {
    if let Some(RequestToken(token)) = extensions.get::<RequestToken>() {
        return token.clone();
    }
    let token = uuid::Uuid::now_v1(node_id()).simple().to_string();
    extensions.insert(RequestToken(token.clone()));
    token
}

#[cfg(feature = "service")]
fn node_id() -> &'static [u8; 6] {
    static NODE: OnceLock<[u8; 6]> = OnceLock::new();
    NODE.get_or_init(|| {
        let random = uuid::Uuid::new_v4();
        let mut node = [0u8; 6];
        node.copy_from_slice(&random.as_bytes()[..6]);
        // 组播位置 1，避免与真实 MAC 冲突
        node[0] |= 0x01;
        node
    })
}


#[cfg(all(test, feature = "service"))]
mod request_token_tests {
    use super::*;

    #[test]
    fn test_request_token_is_cached_per_request() {
        let mut first = axum::http::Extensions::new();
        let token = request_token(&mut first);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(request_token(&mut first), token);

        let mut second = axum::http::Extensions::new();
        assert_ne!(request_token(&mut second), token);
    }
}
