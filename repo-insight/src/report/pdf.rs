// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Paginated PDF summary built from the same tables as the CSV files.
//!
//! Each artifact becomes a section: a bold heading followed by the table in a
//! monospaced font. Text flows top to bottom and a new A4 page starts whenever
//! the next line would cross the bottom margin. Long tables are cut to the
//! first `top_n` rows and a note records how many were left out.

use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path
};

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use super::{Artifact, Table};
use crate::error::{self, Error};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LAYER: &str = "content";

const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 12.0;
const TEXT_SIZE: f32 = 9.0;
const TABLE_SIZE: f32 = 7.0;

/// Millimetres advanced per line of each size.
const TITLE_LEAD: f32 = 9.0;
const HEADING_LEAD: f32 = 7.0;
const TEXT_LEAD: f32 = 4.5;
const TABLE_LEAD: f32 = 3.4;

/// Courier glyphs are 0.6 em wide; 1 pt is 0.3528 mm.
const TABLE_CHAR_WIDTH: f32 = TABLE_SIZE * 0.6 * 0.3528;
const MAX_COLUMN_CHARS: usize = 36;
const COLUMN_GAP: &str = "  ";

/// Characters that fit on one table line between the margins.
fn line_chars() -> usize {
    ((PAGE_WIDTH - 2.0 * MARGIN) / TABLE_CHAR_WIDTH) as usize
}

/// Renders `artifacts` into an A4 document at `path`.
///
/// `intro` lines are printed under the title before the first section.
///
/// # Errors
///
/// Returns [`Error::ReportIo`] for filesystem failures and [`Error::Report`]
/// when the PDF encoder fails.
pub fn write_pdf(
    path: &Path,
    title: &str,
    intro: &[String],
    artifacts: &[Artifact],
    top_n: usize
) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| error::report_io_error(parent, source))?;
    }

    let mut pages = Pages::new(title, path)?;
    pages.line(title, TITLE_SIZE, Font::Bold, TITLE_LEAD);
    for line in intro {
        pages.line(line, TEXT_SIZE, Font::Regular, TEXT_LEAD);
    }

    for artifact in artifacts {
        pages.gap(HEADING_LEAD / 2.0);
        // Keep a heading together with at least its header row.
        pages.reserve(HEADING_LEAD + 2.0 * TABLE_LEAD);
        pages.line(&artifact.title, HEADING_SIZE, Font::Bold, HEADING_LEAD);
        for line in table_lines(&artifact.table, top_n) {
            pages.line(&line, TABLE_SIZE, Font::Mono, TABLE_LEAD);
        }
    }

    let file = File::create(path).map_err(|source| error::report_io_error(path, source))?;
    pages
        .doc
        .save(&mut BufWriter::new(file))
        .map_err(|e| Error::report(path, e.to_string()))
}

/// Monospaced lines for a table: header, rule, up to `top_n` rows, and a
/// truncation note when rows were dropped.
pub fn table_lines(table: &Table, top_n: usize) -> Vec<String> {
    if table.is_empty() {
        return vec!["(no data)".to_owned()];
    }

    let widths = column_widths(table);
    let limit = line_chars();
    let mut lines = Vec::with_capacity(table.rows.len().min(top_n) + 3);

    lines.push(format_row(&table.headers, &widths, limit));
    let rule = widths.iter().sum::<usize>() + COLUMN_GAP.len() * widths.len().saturating_sub(1);
    lines.push(clip(&"-".repeat(rule), limit));
    for row in table.rows.iter().take(top_n) {
        lines.push(format_row(row, &widths, limit));
    }
    if table.rows.len() > top_n {
        lines.push(format!("... showing {} of {} rows", top_n, table.rows.len()));
    }
    lines
}

fn column_widths(table: &Table) -> Vec<usize> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            table
                .rows
                .iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_CHARS)
        })
        .collect()
}

fn format_row(cells: &[String], widths: &[usize], limit: usize) -> String {
    let line = widths
        .iter()
        .enumerate()
        .map(|(index, width)| {
            let cell = cells.get(index).map_or("", String::as_str);
            format!("{:<width$}", clip(cell, *width), width = *width)
        })
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    clip(line.trim_end(), limit)
}

/// Cuts `text` to `max` characters, marking the cut with `~`.
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(1)).collect();
    clipped.push('~');
    clipped
}

/// Builtin fonts are written without a Unicode mapping, so non-ASCII text
/// is replaced.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
    Mono
}

/// Document plus the text cursor on its current page.
struct Pages {
    doc:     PdfDocumentReference,
    layer:   PdfLayerReference,
    y:       f32,
    regular: IndirectFontRef,
    bold:    IndirectFontRef,
    mono:    IndirectFontRef
}

impl Pages {
    fn new(title: &str, path: &Path) -> Result<Self, Error> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let font = |builtin| {
            doc.add_builtin_font(builtin)
                .map_err(|e| Error::report(path, e.to_string()))
        };
        let regular = font(BuiltinFont::Helvetica)?;
        let bold = font(BuiltinFont::HelveticaBold)?;
        let mono = font(BuiltinFont::Courier)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            y: PAGE_HEIGHT - MARGIN,
            regular,
            bold,
            mono
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Starts a new page unless `height` millimetres remain above the margin.
    fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.new_page();
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn line(&mut self, text: &str, size: f32, font: Font, lead: f32) {
        self.reserve(lead);
        self.y -= lead;
        let font = match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
            Font::Mono => &self.mono
        };
        self.layer
            .use_text(printable(text), size, Mm(MARGIN), Mm(self.y), font);
    }
}
