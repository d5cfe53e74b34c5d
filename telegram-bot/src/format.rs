//! Markdown → Telegram HTML.
//!
//! Telegram's HTML parse mode accepts a small tag set and rejects the whole message on a stray
//! `<` or `&`. Model output is markdown, so [`markdown_to_telegram_html`] keeps only what renders
//! (bold, italic, links), drops syntax Telegram would show literally (headings, code fences,
//! inline code backticks) and escapes everything else.
//!
//! The conversion is idempotent: running it on its own output returns the output unchanged.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s{0,3}(```|~~~)").unwrap());
static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s{0,3}#{1,6}(?:[ \t]+(.*?))?[ \t]*$").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static ALLOWED_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(?:<b>|</b>|<i>|</i>|</a>|<a href="[^"<>\n]*">)"#).unwrap());
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^&(?:amp|lt|gt|quot|#[0-9]+|#x[0-9a-fA-F]+);").unwrap());
static TAG_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<b>|</b>|<i>|</i>|</a>|<a href="[^"<>\n]*">"#).unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\s]+)\)").unwrap());
static LINK_SLOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]\n]+)\]\(\x01(\d+)\x01\)").unwrap());
static BOLD_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").unwrap());
static BOLD_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"__([^_\n]+?)__").unwrap());
static ITALIC_STAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^\w*])\*([^*\s](?:[^*\n]*?[^*\s])?)\*([^\w*]|$)").unwrap()
});
static ITALIC_UNDERSCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^\w_])_([^_\s](?:[^_\n]*?[^_\s])?)_([^\w_]|$)").unwrap()
});
static TAG_SLOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x02(\d+)\x02").unwrap());

/// Converts model markdown to the HTML subset Telegram renders.
///
/// In order: code fence lines, heading markers and inline code backticks are removed (their
/// text is kept); text is HTML-escaped except permitted tags and valid entities; `**x**`/`__x__`
/// become `<b>`; word-bounded `*x*`/`_x_` become `<i>`; `[t](url)` becomes `<a href="url">t</a>`.
///
/// ```
/// use telegram_bot::format::markdown_to_telegram_html;
///
/// assert_eq!(
///     markdown_to_telegram_html("**Hi** [x](http://a) `code`"),
///     r#"<b>Hi</b> <a href="http://a">x</a> code"#
/// );
/// ```
pub fn markdown_to_telegram_html(markdown: &str) -> String {
    let plain = strip_block_syntax(markdown);
    let plain = replace_until_stable(&INLINE_CODE, &plain, "$1");
    let escaped = escape_html(&plain);

    // Existing tags and link targets are parked in slots so the emphasis patterns never see them.
    let mut tags: Vec<String> = Vec::new();
    let parked = TAG_ANYWHERE.replace_all(&escaped, |caps: &Captures| {
        tags.push(caps[0].to_string());
        format!("\x02{}\x02", tags.len() - 1)
    });
    let mut urls: Vec<String> = Vec::new();
    let parked = LINK.replace_all(&parked, |caps: &Captures| {
        urls.push(caps[2].replace('"', "&quot;"));
        format!("[{}](\x01{}\x01)", &caps[1], urls.len() - 1)
    });

    let text = BOLD_STARS.replace_all(&parked, "<b>$1</b>");
    let text = BOLD_UNDERSCORES.replace_all(&text, "<b>$1</b>");
    let text = replace_until_stable(&ITALIC_STAR, &text, "${1}<i>${2}</i>${3}");
    let text = replace_until_stable(&ITALIC_UNDERSCORE, &text, "${1}<i>${2}</i>${3}");

    let text = LINK_SLOT.replace_all(&text, |caps: &Captures| {
        let url = caps[2]
            .parse::<usize>()
            .ok()
            .and_then(|i| urls.get(i))
            .cloned()
            .unwrap_or_default();
        format!("<a href=\"{}\">{}</a>", url, &caps[1])
    });
    let text = TAG_SLOT.replace_all(&text, |caps: &Captures| {
        caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|i| tags.get(i))
            .cloned()
            .unwrap_or_default()
    });
    balance_tags(&text)
}

/// Adjacent matches share their boundary character, so one pass can miss every other match.
fn replace_until_stable(re: &Regex, input: &str, rep: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = re.replace_all(&current, rep).into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Drops code fence lines and heading markers, line by line. A line is stripped until nothing
/// more applies, so `# # x` ends up as `x`.
///
/// Inside a fence only the fence lines go. A line there that would read as a heading keeps its
/// text, with the first `#` written as `&#35;` so a second conversion leaves it alone.
fn strip_block_syntax(markdown: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut open_fence: Option<String> = None;
    for line in markdown.lines() {
        if let Some(caps) = FENCE.captures(line) {
            let marker = &caps[1];
            match open_fence.as_deref() {
                Some(open) if open == marker => open_fence = None,
                None => open_fence = Some(marker.to_string()),
                Some(_) => {}
            }
            continue;
        }
        if open_fence.is_some() {
            if HEADING.is_match(line) {
                out.push(line.replacen('#', "&#35;", 1));
            } else {
                out.push(line.to_string());
            }
            continue;
        }

        let mut current = line.to_string();
        while let Some(caps) = HEADING.captures(&current) {
            current = caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string();
        }
        out.push(current);
    }
    out.join("\n")
}

/// Escapes every permitted tag that has no partner. Telegram rejects a message with an unclosed
/// or unopened tag, so `<b>` without `</b>` becomes `&lt;b&gt;`. Closing tags must match the
/// innermost open tag.
fn balance_tags(html: &str) -> String {
    let tags: Vec<_> = TAG_ANYWHERE.find_iter(html).collect();
    let mut keep = vec![false; tags.len()];
    let mut open: Vec<(usize, char)> = Vec::new();
    for (i, tag) in tags.iter().enumerate() {
        let text = tag.as_str();
        let closing = text.starts_with("</");
        let kind = text.chars().nth(if closing { 2 } else { 1 }).unwrap_or('?');
        if !closing {
            open.push((i, kind));
            continue;
        }
        if let Some(&(opener, open_kind)) = open.last() {
            if open_kind == kind {
                open.pop();
                keep[opener] = true;
                keep[i] = true;
            }
        }
    }
    if keep.iter().all(|k| *k) {
        return html.to_string();
    }

    let mut out = String::with_capacity(html.len() + 8);
    let mut last = 0;
    for (tag, kept) in tags.iter().zip(keep) {
        out.push_str(&html[last..tag.start()]);
        if kept {
            out.push_str(tag.as_str());
        } else {
            out.push_str(&tag.as_str().replace('<', "&lt;").replace('>', "&gt;"));
        }
        last = tag.end();
    }
    out.push_str(&html[last..]);
    out
}

/// Escapes `<`, `>` and `&`, leaving well-formed entities and correctly paired permitted tags
/// untouched.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        let Some(ch) = rest.chars().next() else {
            break;
        };
        match ch {
            '<' => match ALLOWED_TAG.find(rest) {
                Some(m) => {
                    out.push_str(m.as_str());
                    i += m.end();
                    continue;
                }
                None => out.push_str("&lt;"),
            },
            '&' => match ENTITY.find(rest) {
                Some(m) => {
                    out.push_str(m.as_str());
                    i += m.end();
                    continue;
                }
                None => out.push_str("&amp;"),
            },
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
        i += ch.len_utf8();
    }
    balance_tags(&out)
}
