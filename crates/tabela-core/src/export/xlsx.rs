//! Render an [`ExportSheet`] with `rust_xlsxwriter`.

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use super::plan::{CellStyle, ExportCell, ExportEntry, ExportSheet};
use crate::config::{ExportConfig, Palette};
use crate::error::Result;

struct Formats {
    header: Format,
    stripe: Format,
    plain: Format,
}

impl Formats {
    fn new(config: &ExportConfig, palette: Palette) -> Self {
        let plain = Format::new()
            .set_font_name(config.font_name.as_str())
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        Formats {
            header: plain
                .clone()
                .set_bold()
                .set_font_color(Color::RGB(palette.header_font))
                .set_background_color(Color::RGB(palette.header_fill)),
            stripe: plain
                .clone()
                .set_background_color(Color::RGB(palette.stripe_fill)),
            plain,
        }
    }

    fn get(&self, style: CellStyle) -> &Format {
        match style {
            CellStyle::Header => &self.header,
            CellStyle::Stripe => &self.stripe,
            CellStyle::Plain => &self.plain,
        }
    }
}

fn row_num(row: usize) -> Result<u32> {
    Ok(u32::try_from(row).map_err(|_| XlsxError::RowColumnLimitError)?)
}

fn col_num(col: usize) -> Result<u16> {
    Ok(u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?)
}

fn write_entry(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    entry: &ExportEntry,
    format: &Format,
) -> Result<()> {
    match &entry.cell {
        ExportCell::Blank => {
            worksheet.write_blank(row, col, format)?;
        }
        ExportCell::Number(n) => {
            worksheet.write_number_with_format(row, col, *n, format)?;
        }
        ExportCell::Bool(b) => {
            worksheet.write_boolean_with_format(row, col, *b, format)?;
        }
        ExportCell::Text(s) => {
            worksheet.write_string_with_format(row, col, s, format)?;
        }
        ExportCell::Formula(f) => {
            worksheet.write_formula_with_format(row, col, f.as_str(), format)?;
        }
    }
    Ok(())
}

/// Serialize the sheet into an in-memory `.xlsx` workbook.
pub fn render_workbook(sheet: &ExportSheet, config: &ExportConfig) -> Result<Vec<u8>> {
    let palette = config.validate()?;
    let formats = Formats::new(config, palette);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(config.sheet_name.as_str())?;

    for (r, cells) in sheet.rows.iter().enumerate() {
        let row = row_num(r)?;
        for (c, entry) in cells.iter().enumerate() {
            write_entry(worksheet, row, col_num(c)?, entry, formats.get(entry.style))?;
        }
    }

    // Merging blanks the anchor cell, so its value is written again.
    for region in &sheet.merges {
        let Some(anchor) = sheet.get(region.top, region.left) else {
            continue;
        };
        let format = formats.get(anchor.style);
        let (top, left) = (row_num(region.top)?, col_num(region.left)?);
        worksheet.merge_range(
            top,
            left,
            row_num(region.bottom)?,
            col_num(region.right)?,
            "",
            format,
        )?;
        write_entry(worksheet, top, left, anchor, format)?;
    }

    for c in 0..sheet.width {
        worksheet.set_column_width(col_num(c)?, config.column_width)?;
    }

    Ok(workbook.save_to_buffer()?)
}
