//! Per-day URL templates.

use chrono::NaiveDate;
use reqwest::Url;

use crate::dates::TemplateFields;
use crate::{RailcastError, Result};

const PLACEHOLDERS: [&str; 4] = ["date", "yyyy", "mm", "dd"];

/// How a downloaded day is named on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNaming {
    /// Last path segment of the URL, `data_YYYYMMDD.csv` when there is none
    Remote,
    /// Always `data_YYYYMMDD.csv`
    Dated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(&'static str),
}

/// A URL containing `{date}` (YYYYMMDD) and/or `{yyyy}`, `{mm}`, `{dd}`.
#[derive(Debug, Clone)]
pub struct UrlTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                RailcastError::validation(format!("Unterminated placeholder in URL template: {template}"))
            })?;
            let name = &after[..close];
            let field = PLACEHOLDERS
                .iter()
                .copied()
                .find(|p| *p == name)
                .ok_or_else(|| {
                    RailcastError::validation(format!(
                        "Unknown placeholder {{{name}}} in URL template. Use {{date}} or {{yyyy}}, {{mm}}, {{dd}}"
                    ))
                })?;
            segments.push(Segment::Field(field));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Substitute every placeholder for `day`.
    #[must_use]
    pub fn render(&self, day: NaiveDate) -> String {
        let fields = TemplateFields::for_date(day);
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Field("date") => fields.date.as_str(),
                Segment::Field("yyyy") => fields.yyyy.as_str(),
                Segment::Field("mm") => fields.mm.as_str(),
                Segment::Field(_) => fields.dd.as_str(),
            })
            .collect()
    }

    /// File name the day is stored under.
    #[must_use]
    pub fn file_name_for(&self, day: NaiveDate, naming: FileNaming) -> String {
        let fallback = || format!("data_{}.csv", day.format("%Y%m%d"));
        match naming {
            FileNaming::Dated => fallback(),
            FileNaming::Remote => Url::parse(&self.render(day))
                .ok()
                .and_then(|url| {
                    url.path_segments()
                        .and_then(|mut segments| segments.next_back().map(str::to_string))
                })
                .filter(|name| !name.is_empty())
                .unwrap_or_else(fallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[rstest]
    #[case("https://example.org/data_{date}.csv", "https://example.org/data_20240601.csv")]
    #[case(
        "https://example.org/{yyyy}/{mm}/{dd}/export.csv",
        "https://example.org/2024/06/01/export.csv"
    )]
    #[case("https://example.org/{yyyy}-{mm}-{dd}", "https://example.org/2024-06-01")]
    #[case("https://example.org/static.csv", "https://example.org/static.csv")]
    fn test_render(#[case] template: &str, #[case] expected: &str) {
        let template = UrlTemplate::parse(template).unwrap();
        assert_eq!(template.render(june_first()), expected);
    }

    #[rstest]
    #[case("https://example.org/{day}.csv")]
    #[case("https://example.org/{date.csv")]
    fn test_parse_rejects(#[case] template: &str) {
        let err = UrlTemplate::parse(template).unwrap_err();
        assert!(matches!(err, RailcastError::Validation { .. }));
    }

    #[rstest]
    #[case("https://example.org/files/data_{date}.csv", FileNaming::Remote, "data_20240601.csv")]
    #[case("https://example.org/rdg/{yyyy}{mm}{dd}.csv?x=1", FileNaming::Remote, "20240601.csv")]
    #[case("https://example.org/", FileNaming::Remote, "data_20240601.csv")]
    #[case("https://example.org/export/{date}/", FileNaming::Remote, "data_20240601.csv")]
    #[case("https://example.org/export.csv", FileNaming::Dated, "data_20240601.csv")]
    fn test_file_name_for(#[case] template: &str, #[case] naming: FileNaming, #[case] expected: &str) {
        let template = UrlTemplate::parse(template).unwrap();
        assert_eq!(template.file_name_for(june_first(), naming), expected);
    }
}
