//! Keyword-to-header resolution.
//!
//! Column headers differ between filing types and over time ("Amount of
//! Securities Acquired (A) or Disposed of (D)" on one page, a variant on
//! another), so records name the columns they need by a stable keyword and
//! resolve it against whatever headers a table actually carries.

use super::html::LabeledRow;

/// Keywords resolved against one set of column headers.
///
/// A keyword resolves to the first header, in column order, that contains it
/// as a case-sensitive substring. When two headers both contain a keyword the
/// earlier column wins; which one that is depends on the page layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMap {
    entries: Vec<(&'static str, Option<String>)>,
}

impl KeywordMap {
    /// Resolve `keywords` against `headers`.
    pub fn resolve<'h, I>(keywords: &[&'static str], headers: I) -> Self
    where
        I: IntoIterator<Item = &'h str>,
    {
        let headers: Vec<&str> = headers.into_iter().collect();
        let entries = keywords
            .iter()
            .map(|keyword| {
                let header = headers
                    .iter()
                    .find(|header| header.contains(*keyword))
                    .map(|header| header.to_string());
                (*keyword, header)
            })
            .collect();
        Self { entries }
    }

    /// Resolve `keywords` against the headers of a labeled row.
    pub fn for_row(keywords: &[&'static str], row: &LabeledRow) -> Self {
        Self::resolve(keywords, row.headers())
    }

    /// Header a keyword resolved to, if any.
    pub fn header(&self, keyword: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == keyword)
            .and_then(|(_, header)| header.as_deref())
    }

    /// Whether a keyword resolved to some header.
    pub fn is_resolved(&self, keyword: &str) -> bool {
        self.header(keyword).is_some()
    }

    /// Value of the column a keyword resolved to.
    ///
    /// Unknown or unresolved keywords yield `None`.
    pub fn lookup<'r>(&self, keyword: &str, row: &'r LabeledRow) -> Option<&'r str> {
        row.get(self.header(keyword)?)
    }

    /// Keywords that found no header.
    pub fn unresolved(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries
            .iter()
            .filter(|(_, header)| header.is_none())
            .map(|(k, _)| *k)
    }
}
