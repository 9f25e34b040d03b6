//! Header Parser
//!
//! Resolves logical field names to column indexes of one sheet header.
//!
//! Lookups try the registered keys first and then fall back to inference,
//! which lets callers pass partial names:
//!
//! - `op1` matches `Operation1`
//! - `matl` matches `Material`
//!
//! Trailing ids, when present, must match exactly.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

use sheetbom_models::CellValue;

use super::row::{RowBuffer, RowView};
use crate::error::{BomError, BomResult};

static PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<text>[a-zA-Z_]+)(?P<id>[0-9]*)").expect("valid key pattern"));

static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_\-]+").expect("valid separator pattern"));

static REPEATED_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_{2,}").expect("valid separator pattern"));

/// Column lookup table for one header row, or a stack of header rows merged column-wise.
#[derive(Debug, Clone, Default)]
pub struct HeaderParser {
    header: Vec<Vec<String>>,
    indexes: IndexMap<String, usize>,
}

impl HeaderParser {
    /// Parser over a single header row.
    pub fn new(row: Vec<CellValue>) -> Self {
        Self::from_rows(vec![row])
    }

    /// Parser over a stack of header rows. Later rows win on duplicate labels.
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let header: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        let mut parser = Self {
            header,
            indexes: IndexMap::new(),
        };

        for row in &rows {
            for (index, cell) in row.iter().enumerate() {
                if !cell.is_blank() {
                    parser.add_column_index(&cell.to_string(), index);
                }
            }
        }

        parser
    }

    pub fn header(&self) -> &[Vec<String>] {
        &self.header
    }

    pub fn indexes(&self) -> &IndexMap<String, usize> {
        &self.indexes
    }

    /// Column index for `key`: registered keys first, then inference.
    pub fn get_index(&self, key: &str) -> BomResult<usize> {
        match self.indexes.get(key) {
            Some(index) => Ok(*index),
            None => self.infer_key(key),
        }
    }

    /// Registers `key` in its raw, lower-case and parameterized forms.
    pub fn add_column_index(&mut self, key: &str, index: usize) {
        self.indexes.insert(key.to_string(), index);
        self.indexes.insert(key.to_lowercase(), index);
        self.indexes.insert(parameterize(key), index);
    }

    /// Makes `alias` resolve to the column `header_val` resolves to.
    ///
    /// Not every sheet variant carries every aliased column, so a failed
    /// lookup leaves the alias unavailable and returns `false`.
    pub fn add_header_alias(&mut self, alias: &str, header_val: &str) -> bool {
        match self.get_index(header_val) {
            Ok(index) => {
                self.add_column_index(alias, index);
                true
            }
            Err(_) => false,
        }
    }

    /// Registers every `(alias, header_val)` pair; returns how many resolved.
    pub fn add_header_aliases<I, K, V>(&mut self, mapping: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        mapping
            .into_iter()
            .filter(|(alias, header_val)| self.add_header_alias(alias.as_ref(), header_val.as_ref()))
            .count()
    }

    /// Header text of the column `key` resolves to.
    ///
    /// With stacked headers the lowest non-empty cell of the column is used.
    pub fn column_label(&self, key: &str) -> BomResult<String> {
        let index = self.get_index(key)?;

        Ok(self
            .header
            .iter()
            .rev()
            .filter_map(|row| row.get(index))
            .find(|label| !label.is_empty())
            .cloned()
            .unwrap_or_default())
    }

    /// Binds a row to this header.
    pub fn parse_row(self: &Rc<Self>, row: impl Into<RowBuffer>) -> RowView {
        RowView::new(row.into(), Rc::clone(self))
    }

    /// Infers the column for a key that is not registered verbatim.
    ///
    /// Keys split into a text part and a trailing id (`op1` is `op` + `1`);
    /// only header keys with the same id are candidates. The first candidate
    /// whose text starts with the key text wins. Failing that, the key text
    /// must appear in exactly one column's text as a subsequence.
    pub fn infer_key(&self, key: &str) -> BomResult<usize> {
        let key = key.to_lowercase();
        let (key_text, key_id) =
            split_key(&key).ok_or_else(|| BomError::header_key_not_found(key.as_str()))?;

        let candidates: Vec<(String, usize)> = self
            .indexes
            .iter()
            .filter_map(|(column, index)| {
                let column = column.to_lowercase();
                match split_key(&column) {
                    Some((text, id)) if id == key_id => Some((text.to_string(), *index)),
                    _ => None,
                }
            })
            .collect();

        if let Some((_, index)) = candidates.iter().find(|(text, _)| text.starts_with(key_text)) {
            return Ok(*index);
        }

        let mut matches: Vec<usize> = Vec::new();
        for (text, index) in &candidates {
            if semi_sequential_match(key_text, text) && !matches.contains(index) {
                matches.push(*index);
            }
        }

        match matches.as_slice() {
            [index] => Ok(*index),
            [] => Err(BomError::header_key_not_found(key.as_str())),
            _ => Err(BomError::ambiguous_header_key(key.as_str(), matches)),
        }
    }
}

fn split_key(key: &str) -> Option<(&str, &str)> {
    let captures = PARAM_RE.captures(key)?;
    let text = captures.name("text")?.as_str();
    let id = captures.name("id").map_or("", |id| id.as_str());
    Some((text, id))
}

/// Parameterized form of a header label: `"SHIP WT (LBS)"` becomes `ship_wt_lbs`.
pub fn parameterize(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_lowercase();
    let separated = SEPARATOR_RE.replace_all(&ascii, "_");
    let collapsed = REPEATED_SEPARATOR_RE.replace_all(&separated, "_");
    collapsed.trim_matches('_').to_string()
}

/// True when every character of `find` occurs in `within`, in order.
///
/// Characters of `within` may be skipped: `matl` is found in `material`.
pub fn semi_sequential_match(find: &str, within: &str) -> bool {
    let mut remaining = within.chars();
    find.chars().all(|wanted| remaining.any(|c| c == wanted))
}
