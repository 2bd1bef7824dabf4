//! Server-rendered HTML. Plain string builders, no templating engine.
//! Everything user-provided goes through [`escape`] before it reaches a page.

use crate::model::view::Entry;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn blog_page(entries: &[Entry]) -> String {
    let mut body = String::from("<h1>Blog</h1>\n");

    if entries.is_empty() {
        body.push_str("<p>No entries yet.</p>\n");
    }

    for entry in entries {
        body.push_str("<article>\n");
        body.push_str(&format!("<h2>{}</h2>\n", escape(&entry.title)));
        body.push_str(&format!(
            "<p class=\"meta\">created {}",
            entry.created.format(DATE_FORMAT)
        ));
        if let Some(published) = entry.published {
            body.push_str(&format!(", published {}", published.format(DATE_FORMAT)));
        }
        body.push_str("</p>\n");
        body.push_str(&format!("<p>{}</p>\n", escape(&entry.text)));
        body.push_str("</article>\n");
    }

    layout("Blog", &body)
}

pub fn dashboard_page(entries: &[Entry]) -> String {
    let mut body = String::from("<h1>Dashboard</h1>\n");
    body.push_str("<p><a href=\"/dashboard/new\">New entry</a></p>\n");

    body.push_str("<table>\n");
    body.push_str("<tr><th>Title</th><th>Created</th><th>Published</th><th></th></tr>\n");
    for entry in entries {
        body.push_str("<tr>");
        body.push_str(&format!("<td>{}</td>", escape(&entry.title)));
        body.push_str(&format!("<td>{}</td>", entry.created.format(DATE_FORMAT)));
        match entry.published {
            Some(published) => {
                body.push_str(&format!("<td>{}</td>", published.format(DATE_FORMAT)))
            }
            None => body.push_str("<td>draft</td>"),
        }
        body.push_str(&format!(
            "<td><a href=\"/dashboard/{}/edit\">edit</a></td>",
            entry.id
        ));
        body.push_str("</tr>\n");
    }
    body.push_str("</table>\n");

    layout("Dashboard", &body)
}

/// Shared by the new-entry and edit-entry pages. `entry_id` decides which
/// one: the edit variant posts back to its own URL and grows publish and
/// delete buttons.
pub fn entry_form_page(entry_id: Option<i64>, title: &str, text: &str, errors: &[&str]) -> String {
    let (heading, action) = match entry_id {
        Some(id) => ("Edit entry", format!("/dashboard/{}/edit", id)),
        None => ("New entry", "/dashboard/new".to_string()),
    };

    let mut body = format!("<h1>{}</h1>\n", heading);

    if !errors.is_empty() {
        body.push_str("<ul class=\"errors\">\n");
        for error in errors {
            body.push_str(&format!("<li>{}</li>\n", escape(error)));
        }
        body.push_str("</ul>\n");
    }

    body.push_str(&format!("<form method=\"post\" action=\"{}\">\n", action));
    body.push_str(&format!(
        "<label>Title <input type=\"text\" name=\"title\" value=\"{}\" maxlength=\"200\"></label>\n",
        escape(title)
    ));
    body.push_str(&format!(
        "<label>Text <textarea name=\"text\" rows=\"12\">{}</textarea></label>\n",
        escape(text)
    ));
    body.push_str("<button type=\"submit\" name=\"action\" value=\"save\">Save</button>\n");
    if entry_id.is_some() {
        body.push_str("<button type=\"submit\" name=\"action\" value=\"publish\">Publish</button>\n");
        body.push_str("<button type=\"submit\" name=\"action\" value=\"delete\">Delete</button>\n");
    }
    body.push_str("</form>\n");
    body.push_str("<p><a href=\"/dashboard\">Back to dashboard</a></p>\n");

    layout(heading, &body)
}

pub fn status_page(message: &str) -> String {
    layout(message, &format!("<h1>{}</h1>\n", escape(message)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{db, view};

    fn entry(id: i64, title: &str, published: Option<&str>) -> view::Entry {
        view::Entry::from(db::Entry {
            id,
            title: title.to_string(),
            text: format!("text of {}", title),
            created: "2026-08-24 10:30:00.000001".to_string(),
            published: published.map(|s| s.to_string()),
        })
    }

    #[test]
    fn escape_replaces_html_specials() {
        assert_eq!(
            "&lt;b&gt;&amp;&quot;&#39;&lt;/b&gt;",
            escape("<b>&\"'</b>")
        );
        assert_eq!("plain text", escape("plain text"));
    }

    #[test]
    fn blog_page_lists_titles_in_slice_order() {
        let entries = vec![entry(1, "first", None), entry(2, "second", None)];
        let page = blog_page(&entries);

        let first = page.find("first").unwrap();
        let second = page.find("second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn blog_page_escapes_user_content() {
        let entries = vec![entry(1, "<script>alert(1)</script>", None)];
        let page = blog_page(&entries);

        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn blog_page_shows_publication_date_when_present() {
        let page = blog_page(&[entry(1, "out", Some("2026-08-24 11:00:00.000001"))]);
        assert!(page.contains("published 2026-08-24 11:00"));

        let page = blog_page(&[entry(1, "draft", None)]);
        assert!(!page.contains("published"));
    }

    #[test]
    fn dashboard_page_links_to_edit_and_new() {
        let page = dashboard_page(&[entry(7, "a title", None)]);

        assert!(page.contains("href=\"/dashboard/7/edit\""));
        assert!(page.contains("href=\"/dashboard/new\""));
        assert!(page.contains("draft"));
    }

    #[test]
    fn new_form_posts_to_new_and_has_no_delete() {
        let page = entry_form_page(None, "", "", &[]);

        assert!(page.contains("action=\"/dashboard/new\""));
        assert!(!page.contains("value=\"delete\""));
        assert!(!page.contains("value=\"publish\""));
    }

    #[test]
    fn edit_form_is_prefilled_and_has_all_actions() {
        let page = entry_form_page(Some(3), "my title", "my text", &[]);

        assert!(page.contains("action=\"/dashboard/3/edit\""));
        assert!(page.contains("value=\"my title\""));
        assert!(page.contains(">my text</textarea>"));
        assert!(page.contains("value=\"save\""));
        assert!(page.contains("value=\"publish\""));
        assert!(page.contains("value=\"delete\""));
    }

    #[test]
    fn form_page_renders_errors() {
        let page = entry_form_page(None, "", "text", &["Title must not be empty."]);
        assert!(page.contains("Title must not be empty."));
    }
}
