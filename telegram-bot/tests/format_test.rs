//! Tests for [`telegram_bot::markdown_to_telegram_html`].
//!
//! Covers the supported constructs, escaping, and idempotence on converted output.

use telegram_bot::markdown_to_telegram_html as convert;

const SAMPLES: &[&str] = &[
    "**Hi** [x](http://a) `code`",
    "# Кто мы?\nМы команда **AllSee**, делаем *ИИ* решения.",
    "```python\nprint('<hi>')\n```\nГотово & проверено",
    "Ссылка: [сайт](https://allsee.team/?a=1&b=2) и _курсив_",
    "snake_case_name and 2 * 3 * 4 stay as they are",
    "***both*** and __bold__",
    "<b>already</b> <i>fine</i> &amp; <script>alert(1)</script>",
    "[q](http://a/\"x\") [u](http://a/_b_)",
    "Use the <b> tag for bold, not </i>",
    "```python\n# comment\nprint(1)\n```",
];

/// **Test: The reference example converts as documented.**
#[test]
fn reference_example() {
    assert_eq!(
        convert("**Hi** [x](http://a) `code`"),
        r#"<b>Hi</b> <a href="http://a">x</a> code"#
    );
}

/// **Test: Bold, italic and links each become exactly one tag.**
#[test]
fn emphasis_and_links() {
    assert_eq!(convert("**b** __b__"), "<b>b</b> <b>b</b>");
    assert_eq!(convert("*i* _i_"), "<i>i</i> <i>i</i>");
    assert_eq!(convert("a *b* *c* d"), "a <i>b</i> <i>c</i> d");
    assert_eq!(convert("[t](http://x.y/z)"), r#"<a href="http://x.y/z">t</a>"#);
    assert_eq!(convert("***x***"), "<i><b>x</b></i>");
}

/// **Test: Headings and code fences are removed, their text kept.**
#[test]
fn block_syntax_is_stripped() {
    assert_eq!(convert("## Наши услуги\nтекст"), "Наши услуги\nтекст");
    assert_eq!(convert("```\nlet a = 1;\n```"), "let a = 1;");
    assert_eq!(convert("~~~\nx\n~~~"), "x");
}

/// **Test: Stray HTML and ampersands are escaped; permitted tags and entities survive.**
#[test]
fn escaping() {
    assert_eq!(convert("a < b > c & d"), "a &lt; b &gt; c &amp; d");
    assert_eq!(
        convert("<b>ok</b> <script>x</script> &quot; &#128512;"),
        "<b>ok</b> &lt;script&gt;x&lt;/script&gt; &quot; &#128512;"
    );
    assert_eq!(
        convert("[q](http://a/\"x\")"),
        r#"<a href="http://a/&quot;x&quot;">q</a>"#
    );
    assert_eq!(
        convert("[s](https://a/?x=1&y=2)"),
        r#"<a href="https://a/?x=1&amp;y=2">s</a>"#
    );
}

/// **Test: A lone or stray permitted tag is escaped, so Telegram never sees unbalanced markup.**
#[test]
fn unpaired_tags_are_escaped() {
    assert_eq!(
        convert("Use the <b> tag for bold"),
        "Use the &lt;b&gt; tag for bold"
    );
    assert_eq!(convert("</i> stray"), "&lt;/i&gt; stray");
    assert_eq!(
        convert("<b>kept</b> and <i>lost"),
        "<b>kept</b> and &lt;i&gt;lost"
    );
    assert_eq!(
        convert(r#"<a href="http://a">open"#),
        r#"&lt;a href="http://a"&gt;open"#
    );
}

/// **Test: Heading-like lines inside a code fence keep their text and hash.**
#[test]
fn fenced_comment_is_not_a_heading() {
    assert_eq!(
        convert("```python\n# comment\nprint(1)\n```\n# Итог"),
        "&#35; comment\nprint(1)\nИтог"
    );
}

/// **Test: Intra-word underscores, spaced stars and URL underscores are not emphasis.**
#[test]
fn non_emphasis_is_left_alone() {
    assert_eq!(convert("snake_case_name"), "snake_case_name");
    assert_eq!(convert("2 * 3 * 4"), "2 * 3 * 4");
    assert_eq!(convert("[u](http://a/_b_)"), r#"<a href="http://a/_b_">u</a>"#);
}

/// **Test: Converting converted output changes nothing.**
#[test]
fn conversion_is_idempotent() {
    for sample in SAMPLES {
        let once = convert(sample);
        let twice = convert(&once);
        assert_eq!(once, twice, "not idempotent for {:?}", sample);
    }
}
