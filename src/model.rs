pub mod db {
    use chrono::{DateTime, Utc};
    use sqlx::FromRow;

    /// Storage format for the `created` and `published` columns. Microsecond
    /// precision so that ascending text order is chronological order.
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

    pub fn format_timestamp(ts: DateTime<Utc>) -> String {
        ts.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn now() -> String {
        format_timestamp(Utc::now())
    }

    #[derive(Debug, FromRow)]
    pub struct Entry {
        pub id: i64,
        pub title: String,
        pub text: String,
        pub created: String,
        pub published: Option<String>,
    }
}

pub mod form {
    use serde::Deserialize;

    pub const TITLE_MAX_LEN: usize = 200;

    /// What the edit form's submit button asked for. A plain save is the
    /// default so the new-entry form can omit the field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Action {
        Save,
        Publish,
        Delete,
    }

    #[derive(Debug, Deserialize)]
    pub struct EntryForm {
        pub title: String,
        pub text: String,
        pub action: Option<String>,
    }

    impl EntryForm {
        pub fn action(&self) -> Action {
            match self.action.as_deref() {
                Some("publish") => Action::Publish,
                Some("delete") => Action::Delete,
                _ => Action::Save,
            }
        }

        /// Field checks before anything touches the database. Empty result
        /// means the submission is acceptable.
        pub fn validate(&self) -> Vec<&'static str> {
            let mut errors = Vec::new();

            if self.title.trim().is_empty() {
                errors.push("Title must not be empty.");
            } else if self.title.chars().count() > TITLE_MAX_LEN {
                errors.push("Title must be at most 200 characters.");
            }

            if self.text.trim().is_empty() {
                errors.push("Text must not be empty.");
            }

            errors
        }
    }
}

pub mod view {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

    #[derive(Debug)]
    pub struct Entry {
        pub id: i64,
        pub title: String,
        pub text: String,
        pub created: DateTime<Utc>,
        pub published: Option<DateTime<Utc>>,
    }

    fn parse_timestamp(s: &str) -> DateTime<Utc> {
        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
            .unwrap_or_else(|_| NaiveDateTime::default());
        Utc.from_utc_datetime(&naive)
    }

    impl From<super::db::Entry> for Entry {
        fn from(entry: super::db::Entry) -> Self {
            Entry {
                id: entry.id,
                title: entry.title,
                text: entry.text,
                created: parse_timestamp(&entry.created),
                published: entry.published.as_deref().map(parse_timestamp),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::db;
    use super::form::EntryForm;
    use super::view;
    use chrono::{Datelike, Timelike};

    fn form(title: &str, text: &str) -> EntryForm {
        EntryForm {
            title: title.to_string(),
            text: text.to_string(),
            action: None,
        }
    }

    #[test]
    fn valid_form_has_no_errors() {
        assert!(form("a title", "some text").validate().is_empty());
    }

    #[test]
    fn empty_title_is_invalid() {
        assert_eq!(1, form("", "some text").validate().len());
        assert_eq!(1, form("   ", "some text").validate().len());
    }

    #[test]
    fn title_over_limit_is_invalid() {
        let title = "a".repeat(201);
        assert_eq!(1, form(&title, "some text").validate().len());

        let title = "a".repeat(200);
        assert!(form(&title, "some text").validate().is_empty());
    }

    #[test]
    fn empty_text_is_invalid() {
        assert_eq!(1, form("a title", "").validate().len());
    }

    #[test]
    fn empty_title_and_text_collect_both_errors() {
        assert_eq!(2, form("", "").validate().len());
    }

    #[test]
    fn action_defaults_to_save() {
        use super::form::Action;

        let mut f = form("t", "t");
        assert_eq!(Action::Save, f.action());

        f.action = Some("publish".to_string());
        assert_eq!(Action::Publish, f.action());

        f.action = Some("delete".to_string());
        assert_eq!(Action::Delete, f.action());

        f.action = Some("something else".to_string());
        assert_eq!(Action::Save, f.action());
    }

    #[test]
    fn view_entry_parses_stored_timestamps() {
        let entry = view::Entry::from(db::Entry {
            id: 1,
            title: "title".to_string(),
            text: "text".to_string(),
            created: "2026-08-24 10:30:00.000001".to_string(),
            published: Some("2026-08-24 11:00:00.000001".to_string()),
        });

        assert_eq!(2026, entry.created.year());
        assert_eq!(30, entry.created.minute());
        assert_eq!(11, entry.published.unwrap().hour());
    }

    #[test]
    fn view_entry_falls_back_on_unparsable_timestamp() {
        let entry = view::Entry::from(db::Entry {
            id: 1,
            title: "title".to_string(),
            text: "text".to_string(),
            created: "not a timestamp".to_string(),
            published: None,
        });

        assert_eq!(1970, entry.created.year());
        assert!(entry.published.is_none());
    }

    #[test]
    fn stored_timestamps_sort_chronologically() {
        let a = "2026-08-24 10:30:00.000009".to_string();
        let b = "2026-08-24 10:30:00.000010".to_string();
        assert!(a < b);
    }
}
