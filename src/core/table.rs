// src/core/table.rs
//! Tolerant HTML table parser.
//!
//! Turns raw HTML plus a CSS row selector into a lazy sequence of rows whose
//! cells are associated with resolved header labels. Copes with:
//! - multi-row headers (`rowspan` on some header cells, grouped `colspan` ones),
//! - data cells spanning rows (`rowspan`), re-inserted at their column index,
//! - data cells spanning columns (`colspan`), optionally duplicated,
//! - hidden cells, unlabeled trailing columns, and rows of the wrong width.
//!
//! Rows whose width disagrees with the header are policy-controlled (skipped,
//! partially associated, or handed back raw), never raised as errors.
//!
//! The parser is single pass: once iterated it cannot be restarted; parse the
//! HTML again for a second pass.

use std::{collections::{HashMap, VecDeque}, rc::Rc};

use indexmap::IndexMap;
use scraper::{ElementRef, Html};
use thiserror::Error;

use crate::core::html::{
    self, Attrs, class_tokens, element_attrs, element_links, element_text, merge_attrs, span_attr,
};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("invalid row selector {0}")]
    Selector(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableOptions {
    /// Yield ordered `(label, cell)` pairs instead of a map (repeated labels).
    pub as_list: bool,
    /// Repeat a data cell once per column it spans.
    pub with_duplicate_colspan: bool,
    /// Associate under-filled rows with the header prefix instead of returning them raw.
    pub with_not_full_row: bool,
    /// Drop rows whose width disagrees with the header.
    pub ignore_wrong_header_number: bool,
    /// Drop cells hidden with an inline `display: none`.
    pub ignore_display_none: bool,
    /// Labels for extra trailing columns the header does not name.
    pub unnamed_fields: Vec<String>,
    /// Header label → canonical key.
    pub header_mapping: HashMap<String, String>,
    /// Every selected row is data.
    pub without_header: bool,
    /// Trim empty trailing cells beyond the header width.
    pub strip_empty_columns: bool,
    /// Rowspan assumed for header cells that declare none.
    pub default_header_rowspan: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            as_list: false,
            with_duplicate_colspan: false,
            with_not_full_row: false,
            ignore_wrong_header_number: false,
            ignore_display_none: false,
            unnamed_fields: Vec::new(),
            header_mapping: HashMap::new(),
            without_header: false,
            strip_empty_columns: false,
            default_header_rowspan: 1,
        }
    }
}

/* ---------------- raw markup ---------------- */

/// One physical `<td>`/`<th>` as found in the markup.
#[derive(Clone, Debug)]
pub struct RawCell {
    attrs: Attrs,
    value: String,
    links: Vec<String>,
    colspan: usize,
    rowspan: Option<usize>,
    origin: Option<Rc<RawCell>>,
}

impl RawCell {
    fn from_element(el: &ElementRef<'_>) -> Self {
        let attrs = element_attrs(el);
        Self {
            colspan: span_attr(&attrs, "colspan").unwrap_or(1),
            rowspan: span_attr(&attrs, "rowspan"),
            value: element_text(el),
            links: element_links(el),
            attrs,
            origin: None,
        }
    }

    fn synthetic(label: &str) -> Self {
        Self {
            attrs: Attrs::new(),
            value: label.to_string(),
            links: Vec::new(),
            colspan: 1,
            rowspan: None,
            origin: None,
        }
    }

    pub fn value(&self) -> &str { &self.value }
    pub fn attrs(&self) -> &Attrs { &self.attrs }
    pub fn attr(&self, name: &str) -> Option<&str> { self.attrs.get(name).map(String::as_str) }
    pub fn links(&self) -> &[String] { &self.links }
    pub fn colspan(&self) -> usize { self.colspan }
    pub fn rowspan(&self) -> usize { self.rowspan.unwrap_or(1) }

    pub fn has_class(&self, class: &str) -> bool {
        class_tokens(&self.attrs).any(|c| c.eq_ignore_ascii_case(class))
    }

    /// Top-level grouped header this sub-header was absorbed under.
    pub fn origin(&self) -> Option<&RawCell> { self.origin.as_deref() }

    fn hidden(&self) -> bool { html::is_display_none(&self.attrs) }
}

/// One physical `<tr>`.
#[derive(Debug)]
pub struct RawRow {
    attrs: Attrs,
    cells: Vec<Rc<RawCell>>,
}

impl RawRow {
    fn from_element(el: &ElementRef<'_>) -> Self {
        let cells = el
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "td" | "th"))
            .map(|c| Rc::new(RawCell::from_element(&c)))
            .collect();
        Self { attrs: element_attrs(el), cells }
    }

    pub fn attrs(&self) -> &Attrs { &self.attrs }
    pub fn cells(&self) -> &[Rc<RawCell>] { &self.cells }
    pub fn len(&self) -> usize { self.cells.len() }
    pub fn is_empty(&self) -> bool { self.cells.is_empty() }

    pub fn values(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.value()).collect()
    }

    pub fn has_class(&self, class: &str) -> bool {
        class_tokens(&self.attrs).any(|c| c.eq_ignore_ascii_case(class))
    }
}

/* ---------------- associated cells ---------------- */

/// A data cell bound to its header and row.
///
/// `attrs` merges header, row and column attributes token-wise (so a row class
/// like `odd` and a cell class like `first-solved` both show up in `class`).
/// Markup decisions go through the named accessors below.
#[derive(Clone, Debug)]
pub struct Cell {
    attrs: Attrs,
    column: Rc<RawCell>,
    header: Rc<RawCell>,
    row: Rc<RawRow>,
}

impl Cell {
    fn new(header: Rc<RawCell>, row: Rc<RawRow>, column: Rc<RawCell>) -> Self {
        let attrs = merge_attrs([&header.attrs, &row.attrs, &column.attrs]);
        Self { attrs, column, header, row }
    }

    /// Trimmed, whitespace-normalized text.
    pub fn value(&self) -> &str { self.column.value() }
    pub fn is_empty(&self) -> bool { self.column.value.is_empty() }

    pub fn attrs(&self) -> &Attrs { &self.attrs }
    pub fn attr(&self, name: &str) -> Option<&str> { self.attrs.get(name).map(String::as_str) }

    /// The cell's own attributes, without header/row layers.
    pub fn column_attrs(&self) -> &Attrs { &self.column.attrs }

    pub fn class_tokens(&self) -> impl Iterator<Item = &str> { class_tokens(&self.attrs) }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_tokens().any(|c| c.eq_ignore_ascii_case(class))
    }

    /// The cell itself (not its header/row) carries `class`.
    pub fn own_class(&self, class: &str) -> bool { self.column.has_class(class) }

    /// First link inside the cell.
    pub fn link(&self) -> Option<&str> { self.column.links.first().map(String::as_str) }

    pub fn title(&self) -> Option<&str> {
        self.column.attr("title").filter(|t| !t.trim().is_empty())
    }

    /// Markup flags this cell as the first accepted solve of its column.
    pub fn is_first_solved(&self) -> bool {
        ["first-solved", "first-to-solve", "first_ac", "firstsolved"]
            .iter()
            .any(|c| self.own_class(c))
    }

    pub fn header(&self) -> &RawCell { &self.header }
    pub fn header_label(&self) -> &str { self.header.value() }
    pub fn header_origin(&self) -> Option<&RawCell> { self.header.origin() }
    pub fn row(&self) -> &RawRow { &self.row }
}

/// One parsed row.
#[derive(Clone, Debug)]
pub enum TableRow {
    /// Header label → cell, in header order; a repeated label keeps its first column.
    Map(IndexMap<String, Cell>),
    /// Ordered pairs (under `as_list`).
    List(Vec<(String, Cell)>),
    /// Width disagreed with the header; handed back for inspection.
    Raw(Rc<RawRow>),
}

impl TableRow {
    pub fn is_raw(&self) -> bool { matches!(self, TableRow::Raw(_)) }

    /// First cell under `label`.
    pub fn get(&self, label: &str) -> Option<&Cell> {
        match self {
            TableRow::Map(m) => m.get(label),
            TableRow::List(v) => v.iter().find(|(k, _)| k == label).map(|(_, c)| c),
            TableRow::Raw(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TableRow::Map(m) => m.len(),
            TableRow::List(v) => v.len(),
            TableRow::Raw(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Associated `(label, cell)` pairs in column order; empty for raw rows.
    pub fn pairs(&self) -> Vec<(&str, &Cell)> {
        match self {
            TableRow::Map(m) => m.iter().map(|(k, c)| (k.as_str(), c)).collect(),
            TableRow::List(v) => v.iter().map(|(k, c)| (k.as_str(), c)).collect(),
            TableRow::Raw(_) => Vec::new(),
        }
    }
}

/* ---------------- parser ---------------- */

struct Carry {
    col: usize,
    cell: Rc<RawCell>,
    left: usize,
}

pub struct TableParser {
    rows: VecDeque<Rc<RawRow>>,
    header: Vec<Rc<RawCell>>,
    labels: Vec<String>,
    unnamed: Vec<Rc<RawCell>>,
    carry: Vec<Carry>,
    opts: TableOptions,
}

impl TableParser {
    pub fn new(html_doc: &str, row_selector: &str, opts: TableOptions) -> Result<Self, TableError> {
        let sel = html::parse_selector(row_selector).map_err(TableError::Selector)?;
        let doc = Html::parse_document(html_doc);
        let rows: VecDeque<Rc<RawRow>> = doc
            .select(&sel)
            .map(|tr| Rc::new(RawRow::from_element(&tr)))
            .collect();

        let unnamed = opts
            .unnamed_fields
            .iter()
            .map(|f| Rc::new(RawCell::synthetic(f)))
            .collect();

        let mut parser = Self {
            rows,
            header: Vec::new(),
            labels: Vec::new(),
            unnamed,
            carry: Vec::new(),
            opts,
        };
        if !parser.opts.without_header {
            parser.build_header();
        }
        logd!("Table: {} header columns, {} candidate rows", parser.labels.len(), parser.rows.len());
        Ok(parser)
    }

    /// Resolved header labels (after colspan expansion and mapping).
    pub fn header(&self) -> &[String] { &self.labels }

    pub fn header_cells(&self) -> &[Rc<RawCell>] { &self.header }

    fn visible<'a>(&self, cells: &'a [Rc<RawCell>]) -> impl Iterator<Item = &'a Rc<RawCell>> {
        let drop_hidden = self.opts.ignore_display_none;
        cells.iter().filter(move |c| !(drop_hidden && c.hidden()))
    }

    fn build_header(&mut self) {
        let Some(first) = self.rows.pop_front() else { return };
        let default_span = self.opts.default_header_rowspan.max(1);

        let mut cols: Vec<(Rc<RawCell>, usize)> = self
            .visible(&first.cells)
            .map(|c| (c.clone(), c.rowspan.unwrap_or(default_span)))
            .collect();

        while cols.iter().any(|(_, left)| *left > 1) {
            let Some(next) = self.rows.pop_front() else { break };
            let mut below = self.visible(&next.cells).cloned().collect::<Vec<_>>().into_iter();

            let mut merged = Vec::with_capacity(cols.len());
            for (cell, left) in cols {
                if left > 1 {
                    merged.push((cell, left - 1));
                    continue;
                }
                // Expired: replaced by the sub-header cells it spans.
                let origin = cell.origin.clone().unwrap_or_else(|| cell.clone());
                let mut covered = 0;
                while covered < cell.colspan {
                    let Some(sub) = below.next() else { break };
                    covered += sub.colspan;
                    let span = sub.rowspan();
                    let absorbed = RawCell { origin: Some(origin.clone()), ..(*sub).clone() };
                    merged.push((Rc::new(absorbed), span));
                }
                if covered == 0 {
                    merged.push((cell, 1));
                }
            }
            cols = merged;
        }

        for (cell, _) in cols {
            for _ in 0..cell.colspan {
                self.header.push(cell.clone());
            }
        }
        self.labels = self
            .header
            .iter()
            .map(|c| {
                let label = c.value();
                self.opts.header_mapping.get(label).cloned().unwrap_or_else(|| label.to_string())
            })
            .collect();
    }

    /// Grid walk: re-insert rowspan carries at their column, expand colspans if
    /// asked, register new carries for the following rows.
    fn layout(&mut self, row: &RawRow) -> Vec<Rc<RawCell>> {
        let mut out: Vec<Rc<RawCell>> = Vec::with_capacity(row.cells.len());
        let mut fresh: Vec<Carry> = Vec::new();
        let mut physical = row.cells.iter();

        loop {
            let col = out.len();
            if let Some(c) = self.carry.iter().find(|c| c.col == col) {
                out.push(c.cell.clone());
                continue;
            }
            let Some(cell) = physical.next() else { break };
            let width = if self.opts.with_duplicate_colspan { cell.colspan } else { 1 };
            for k in 0..width {
                out.push(cell.clone());
                if cell.rowspan() > 1 {
                    fresh.push(Carry { col: col + k, cell: cell.clone(), left: cell.rowspan() - 1 });
                }
            }
        }

        // Carries past the end of this row's own cells.
        let mut tail: Vec<&Carry> = self.carry.iter().filter(|c| c.col >= out.len()).collect();
        tail.sort_by_key(|c| c.col);
        for c in tail {
            out.push(c.cell.clone());
        }

        for c in &mut self.carry {
            c.left -= 1;
        }
        self.carry.retain(|c| c.left > 0);
        self.carry.extend(fresh);

        if self.opts.ignore_display_none {
            out.retain(|c| !c.hidden());
        }
        if self.opts.strip_empty_columns {
            while out.len() > self.header.len() && out.last().is_some_and(|c| c.value.is_empty()) {
                out.pop();
            }
        }
        out
    }

    fn associate(&self, row: Rc<RawRow>, cells: Vec<Rc<RawCell>>, headers: Vec<Rc<RawCell>>, labels: Vec<String>) -> TableRow {
        let pairs = labels
            .into_iter()
            .zip(headers)
            .zip(cells)
            .map(|((label, header), column)| (label, Cell::new(header, row.clone(), column)));

        if self.opts.as_list {
            TableRow::List(pairs.collect())
        } else {
            let mut map = IndexMap::new();
            for (label, cell) in pairs {
                map.entry(label).or_insert(cell);
            }
            TableRow::Map(map)
        }
    }

    /// Header cells and labels for a row `width` wide, extended by synthetic
    /// unnamed fields (or column indexes without a header).
    fn effective_header(&self, width: usize) -> (Vec<Rc<RawCell>>, Vec<String>) {
        let mut cells = self.header.clone();
        let mut labels = self.labels.clone();
        let extra = width.saturating_sub(cells.len());
        for u in self.unnamed.iter().take(extra) {
            labels.push(u.value().to_string());
            cells.push(u.clone());
        }
        if self.opts.without_header {
            for i in cells.len()..width {
                let synthetic = Rc::new(RawCell::synthetic(&i.to_string()));
                labels.push(i.to_string());
                cells.push(synthetic);
            }
        }
        (cells, labels)
    }
}

impl Iterator for TableParser {
    type Item = TableRow;

    fn next(&mut self) -> Option<TableRow> {
        loop {
            let row = self.rows.pop_front()?;
            let cells = self.layout(&row);
            let (headers, labels) = self.effective_header(cells.len());

            if cells.len() == headers.len() {
                return Some(self.associate(row, cells, headers, labels));
            }

            if self.opts.ignore_wrong_header_number {
                logd!("Table: skip row with {} cells (header has {})", cells.len(), headers.len());
                continue;
            }
            if self.opts.with_not_full_row && cells.len() < headers.len() {
                return Some(self.associate(row, cells, headers, labels));
            }
            return Some(TableRow::Raw(row));
        }
    }
}
