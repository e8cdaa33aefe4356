//! HTML rendering for pages and forms.
//!
//! Markup is assembled with `format!` and every user-controlled value goes
//! through [`escape_html`]. Markdown bodies go through [`markdown_to_html`],
//! which never passes raw HTML through.

use crate::forms::{FormIssue, PageForm};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use pulldown_cmark_escape as escape;
use std::fmt::Write as _;
use txtpages_core::{Page, StockPage};

const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";

/// Metadata placed in `<head>`.
#[derive(Debug, Default)]
pub struct HeadMeta<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub author: &'a str,
}

/// Escape text for use in HTML bodies and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let _ = escape::escape_html(&mut out, input);
    out
}

/// Convert Markdown to HTML.
///
/// Tables, strikethrough, task lists and footnotes are enabled. Raw HTML is
/// replaced by a comment and script-capable link targets are neutralized.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let events = Parser::new_ext(markdown, options).filter_map(|event| match event {
        Event::Start(Tag::HtmlBlock) => Some(Event::Html(format!("{RAW_HTML_OMITTED}\n").into())),
        Event::End(TagEnd::HtmlBlock) | Event::Html(_) => None,
        Event::InlineHtml(_) => Some(Event::InlineHtml(RAW_HTML_OMITTED.into())),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Some(Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        })),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Some(Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        })),
        other => Some(other),
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme = url.trim_start().to_ascii_lowercase();
    if ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|s| scheme.starts_with(s))
    {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

fn open(out: &mut String, site_name: &str, meta: &HeadMeta<'_>) {
    let title = if meta.title.is_empty() { site_name } else { meta.title };
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n"
    );
    if !meta.description.is_empty() {
        let desc = escape_html(meta.description);
        let _ = writeln!(out, "<meta name=\"description\" content=\"{desc}\">");
        let _ = writeln!(out, "<meta property=\"og:description\" content=\"{desc}\">");
        let _ = writeln!(out, "<meta name=\"twitter:description\" content=\"{desc}\">");
    }
    if !meta.author.is_empty() {
        let _ = writeln!(out, "<meta name=\"author\" content=\"{}\">", escape_html(meta.author));
    }
    let title = escape_html(title);
    let _ = write!(
        out,
        "<meta property=\"og:type\" content=\"website\">\n\
         <meta property=\"og:title\" content=\"{title}\">\n\
         <meta property=\"og:site_name\" content=\"{site}\">\n\
         <meta name=\"twitter:card\" content=\"summary\">\n\
         <meta name=\"twitter:title\" content=\"{title}\">\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n\
         <title>{title}</title>\n\
         </head>\n<body>\n",
        site = escape_html(site_name),
    );
}

fn close(out: &mut String) {
    out.push_str("</body>\n</html>\n");
}

fn titlebar(out: &mut String, class: &str, site_name: &str) {
    let _ = write!(
        out,
        "<div class=\"titlebar {class}\">\n    <p><a href=\"/\">{}</a> - Quickly create fast text web pages</p>\n    <p><a href=\"/about\">About</a> | <a href=\"/howto\">How to use</a></p>\n</div>\n",
        escape_html(site_name)
    );
}

fn document(site_name: &str, meta: &HeadMeta<'_>, body: impl FnOnce(&mut String)) -> String {
    let mut out = String::with_capacity(4096);
    open(&mut out, site_name, meta);
    body(&mut out);
    close(&mut out);
    out
}

/// A stored page.
pub fn page_view(site_name: &str, page: &Page) -> String {
    let description = page.summary();
    let meta = HeadMeta {
        title: &page.title,
        description: &description,
        author: &page.author,
    };
    document(site_name, &meta, |out| {
        let _ = write!(
            out,
            "<div class=\"titlebar header\">\n    <h1>{}</h1>\n    <p><a href=\"/{}/edit\">Edit</a></p>\n</div>\n",
            escape_html(&page.title),
            escape_html(&page.slug)
        );
        if !page.author.is_empty() {
            let _ = writeln!(out, "<p class=\"byline\">by {}</p>", escape_html(&page.author));
        }
        out.push_str("<article>\n");
        out.push_str(&markdown_to_html(&page.content));
        out.push_str("</article>\n");
        let _ = writeln!(
            out,
            "<p class=\"dates\">Created {}</p>",
            page.created_at.to_display_date()
        );
        titlebar(out, "footer", site_name);
    })
}

/// A stock page.
pub fn stock_view(site_name: &str, page: &StockPage) -> String {
    let meta = HeadMeta {
        title: &page.title,
        description: &page.description,
        author: site_name,
    };
    document(site_name, &meta, |out| {
        titlebar(out, "header", site_name);
        out.push_str("<article>\n");
        out.push_str(&markdown_to_html(&page.content));
        out.push_str("</article>\n");
        titlebar(out, "footer", site_name);
    })
}

/// Shown once after a page is created. This is the only place the secret appears.
pub fn created_view(site_name: &str, page: &Page) -> String {
    let meta = HeadMeta {
        title: "Success",
        ..HeadMeta::default()
    };
    let slug = escape_html(&page.slug);
    document(site_name, &meta, |out| {
        let _ = write!(
            out,
            "<h2>You made a page.</h2>\n\
             <p>The link to your page is here:</p>\n\
             <p><a href=\"/{slug}\">/{slug}</a></p>\n\
             <p>Edit your page here:</p>\n\
             <p><a href=\"/{slug}/edit\">/{slug}/edit</a></p>\n\
             <p>You will need this code to make changes to this page in the future:</p>\n\
             <p>Your edit code: <b class=\"editcode\">{secret}</b></p>\n\
             <p>You must keep this info safe (and bookmarking this page won't work). It cannot be accessed again!</p>\n",
            secret = escape_html(&page.secret),
        );
        titlebar(out, "footer", site_name);
    })
}

/// Which form is being rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    Create,
    Edit,
}

/// The create or edit form, with inline messages for `issue`.
pub fn page_form(
    site_name: &str,
    kind: FormKind,
    action: &str,
    form: &PageForm,
    issue: Option<&FormIssue>,
) -> String {
    let (heading, button) = match kind {
        FormKind::Create => ("Create a page", "Create Page"),
        FormKind::Edit => ("Edit page", "Save Page"),
    };
    let meta = HeadMeta {
        title: heading,
        description: heading,
        ..HeadMeta::default()
    };
    let missing = |field: &str| matches!(issue, Some(FormIssue::Missing(fields)) if fields.iter().any(|f| *f == field));

    document(site_name, &meta, |out| {
        titlebar(out, "header", site_name);
        let _ = write!(
            out,
            "<h2>{heading}</h2>\n<form class=\"pageform\" method=\"post\" action=\"{}\">\n",
            escape_html(action)
        );
        if let Some(issue) = issue {
            let _ = write!(
                out,
                "    <div class=\"pageform_error\">\n        <p>{}</p>\n    </div>\n",
                escape_html(&issue.message())
            );
        }

        let title_label = if missing("title") { "Please enter a Title" } else { "Title" };
        input(out, "title", title_label, &form.title, missing("title"));

        let content_highlight = missing("content");
        let content_label = if content_highlight { "Please enter Content" } else { "Content" };
        let _ = write!(
            out,
            "    <div>\n        <label for=\"content\">{content_label}</label>\n        <textarea id=\"content\"{} name=\"content\">{}</textarea>\n    </div>\n",
            highlight(content_highlight),
            escape_html(&form.content)
        );

        let slug_taken = matches!(issue, Some(FormIssue::SlugExists));
        let url_label = match (slug_taken, kind) {
            (true, _) => "URL already exists, enter another one",
            (false, FormKind::Create) => "Custom URL (optional)",
            (false, FormKind::Edit) => "Custom URL",
        };
        input(out, "url", url_label, &form.url, slug_taken);
        input(out, "desc", "Description (optional)", &form.desc, false);
        input(out, "author", "Author (optional)", &form.author, false);

        let wrong_secret = matches!(issue, Some(FormIssue::WrongSecret));
        let code_label = match (wrong_secret, kind) {
            (true, _) => "Incorrect edit code, please re-enter",
            (false, FormKind::Create) => "Custom edit code (optional)",
            (false, FormKind::Edit) => "Enter edit code",
        };
        input(out, "editcode", code_label, &form.editcode, wrong_secret);

        let _ = write!(
            out,
            "    <div class=\"pageform_save\">\n        <button type=\"submit\">{button}</button>\n    </div>\n</form>\n"
        );
    })
}

fn highlight(on: bool) -> &'static str {
    if on { " class=\"highlight\" autofocus" } else { "" }
}

fn input(out: &mut String, name: &str, label: &str, value: &str, highlighted: bool) {
    let _ = write!(
        out,
        "    <div>\n        <label for=\"{name}\">{label}</label>\n        <input id=\"{name}\"{} name=\"{name}\" value=\"{}\">\n    </div>\n",
        highlight(highlighted),
        escape_html(value)
    );
}

/// A bare error page.
pub fn error_view(site_name: &str, title: &str, message: &str) -> String {
    let meta = HeadMeta {
        title,
        ..HeadMeta::default()
    };
    document(site_name, &meta, |out| {
        titlebar(out, "header", site_name);
        let _ = writeln!(out, "<p>{}</p>", escape_html(message));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use txtpages_core::Timestamp;

    fn page() -> Page {
        Page {
            id: 2,
            title: "Hello <World>".to_string(),
            slug: "hello_world2".to_string(),
            content: "# Hi\n\nSome **bold** text.".to_string(),
            secret: "otter-maple-reef".to_string(),
            description: String::new(),
            author: "Ann".to_string(),
            created_at: Timestamp::from_unix(1_136_214_245).unwrap(),
            last_read_at: Timestamp::from_unix(1_136_214_245).unwrap(),
        }
    }

    #[test]
    fn error_view_is_titled_with_site_name() {
        let html = error_view("notes", "Not found", "Page not found: <x>");
        assert!(html.contains("<title>Not found</title>"));
        assert!(html.contains("<a href=\"/\">notes</a>"));
        assert!(html.contains("<p>Page not found: &lt;x&gt;</p>"));
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&lt;/a&gt;"
        );
    }

    #[test]
    fn markdown_renders_gfm_extensions() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn markdown_omits_raw_html() {
        let html = markdown_to_html("<script>alert(1)</script>\n\ntext <b>inline</b>");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(html.contains(RAW_HTML_OMITTED));
        assert!(html.contains("text"));
    }

    #[test]
    fn markdown_neutralizes_script_links() {
        let html = markdown_to_html("[x](javascript:alert(1)) [y](https://example.com)");
        assert!(!html.contains("javascript:"));
        assert!(html.contains("href=\"#\""));
        assert!(html.contains("href=\"https://example.com\""));
    }

    #[test]
    fn page_view_has_meta_and_no_secret() {
        let html = page_view("txtpages", &page());
        assert!(html.contains("<title>Hello &lt;World&gt;</title>"));
        assert!(html.contains("<meta name=\"description\" content=\"Hi Some bold text.\">"));
        assert!(html.contains("<meta name=\"author\" content=\"Ann\">"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("href=\"/hello_world2/edit\""));
        assert!(html.contains("2 Jan 2006"));
        assert!(!html.contains("otter-maple-reef"));
    }

    #[test]
    fn created_view_shows_secret_once() {
        let html = created_view("txtpages", &page());
        assert_eq!(html.matches("otter-maple-reef").count(), 1);
        assert!(html.contains("href=\"/hello_world2\""));
    }

    #[test]
    fn form_highlights_missing_fields() {
        let form = PageForm {
            content: "body".to_string(),
            ..PageForm::default()
        };
        let issue = FormIssue::Missing(vec!["title"]);
        let html = page_form("txtpages", FormKind::Create, "/", &form, Some(&issue));
        assert!(html.contains("Please enter a Title"));
        assert!(!html.contains("Please enter Content"));
        assert!(html.contains(">body</textarea>"));
    }

    #[test]
    fn edit_form_reports_wrong_secret() {
        let form = PageForm::default();
        let html = page_form(
            "txtpages",
            FormKind::Edit,
            "/x/edit",
            &form,
            Some(&FormIssue::WrongSecret),
        );
        assert!(html.contains("Incorrect edit code, please re-enter"));
        assert!(html.contains("Save Page"));
    }
}
