// spreadsheets/report.rs
//
// Portrait A4 tabular report: title, summary lines, then one row per entity
// under a header row that repeats on every printed page.
use rust_xlsxwriter::{Format, Workbook};

use crate::errors::ServerError;

/// A4 in the Excel paper-size table.
const PAPER_A4: u8 = 9;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<Option<String>> for Cell {
    fn from(s: Option<String>) -> Self {
        s.map_or(Cell::Empty, Cell::Text)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n as f64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TabularReport {
    pub title: String,
    pub sheet_name: String,
    pub summary: Vec<(String, String)>,
    pub headers: Vec<&'static str>,
    pub widths: Vec<f64>,
    pub rows: Vec<Vec<Cell>>,
}

fn xlsx_err(what: &str) -> impl Fn(rust_xlsxwriter::XlsxError) -> ServerError + '_ {
    move |e| ServerError::XlsxError(format!("Failed to write {what}: {e}"))
}

impl TabularReport {
    /// Sheet row holding the column headers.
    pub fn header_row(&self) -> u32 {
        // title, blank, summary lines, blank
        2 + self.summary.len() as u32 + 1
    }

    pub fn to_buffer(&self) -> Result<Vec<u8>, ServerError> {
        let mut workbook = Workbook::new();
        let title_format = Format::new().set_bold().set_font_size(14);
        let label_format = Format::new().set_bold();
        let header_format = Format::new().set_bold().set_background_color(0xE5E7EB);
        let money_format = Format::new().set_num_format("#,##0.00");

        let worksheet = workbook.add_worksheet();
        if !self.sheet_name.is_empty() {
            worksheet
                .set_name(&self.sheet_name)
                .map_err(xlsx_err("sheet name"))?;
        }
        worksheet.set_portrait();
        worksheet.set_paper_size(PAPER_A4);
        worksheet.set_print_fit_to_pages(1, 0);

        worksheet
            .write_string_with_format(0, 0, &self.title, &title_format)
            .map_err(xlsx_err("title"))?;

        for (i, (label, value)) in self.summary.iter().enumerate() {
            let r = 2 + i as u32;
            worksheet
                .write_string_with_format(r, 0, label, &label_format)
                .map_err(xlsx_err("summary label"))?;
            worksheet
                .write_string(r, 1, value)
                .map_err(xlsx_err("summary value"))?;
        }

        let header_row = self.header_row();
        for (col, header) in self.headers.iter().enumerate() {
            worksheet
                .write_string_with_format(header_row, col as u16, *header, &header_format)
                .map_err(xlsx_err("header"))?;
        }
        worksheet
            .set_repeat_rows(header_row, header_row)
            .map_err(xlsx_err("repeat rows"))?;

        for (col, width) in self.widths.iter().enumerate() {
            worksheet
                .set_column_width(col as u16, *width)
                .map_err(xlsx_err("column width"))?;
        }

        for (i, row) in self.rows.iter().enumerate() {
            let r = header_row + 1 + i as u32;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(r, col, s).map_err(xlsx_err("cell"))?;
                    }
                    Cell::Number(n) => {
                        worksheet
                            .write_number_with_format(r, col, *n, &money_format)
                            .map_err(xlsx_err("cell"))?;
                    }
                    Cell::Empty => {}
                }
            }
        }

        workbook
            .save_to_buffer()
            .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {e}")))
    }
}
