//! Renders an aggregated shopping list as a downloadable file.

use std::str::FromStr;

use color_eyre::eyre::{eyre, WrapErr};
use db::cooking::ShoppingList;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Txt,
    Csv,
    Json,
    Pdf,
}

impl FromStr for ExportFormat {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pdf" => Ok(Self::Pdf),
            other => Err(eyre!(
                "Unknown export format {other:?}, expected one of txt, csv, json or pdf"
            )),
        }
    }
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Txt => "text/plain; charset=utf-8",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn content_disposition(self) -> String {
        format!("attachment; filename=\"shopping_list.{}\"", self.extension())
    }

    pub fn render(self, list: &ShoppingList) -> color_eyre::Result<Vec<u8>> {
        match self {
            Self::Txt => Ok(render_text(list).into_bytes()),
            Self::Csv => render_csv(list),
            Self::Json => render_json(list),
            Self::Pdf => render_pdf(list),
        }
    }
}

/// One `name (unit) — total` line per item. An empty list is an empty string.
pub fn render_text(list: &ShoppingList) -> String {
    list.items
        .iter()
        .map(|item| {
            format!(
                "{} ({}) — {}\n",
                item.name, item.measurement_unit, item.total_amount
            )
        })
        .collect()
}

pub fn render_csv(list: &ShoppingList) -> color_eyre::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);

    writer.write_record(["ingredient", "measurement_unit", "amount"])?;
    for item in &list.items {
        let amount = item.total_amount.to_string();
        writer.write_record([
            item.name.as_str(),
            item.measurement_unit.as_str(),
            amount.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .wrap_err("Failed to flush CSV export")
}

#[derive(Serialize)]
struct JsonItem<'a> {
    name: &'a str,
    measurement_unit: &'a str,
    amount: i64,
}

#[derive(Serialize)]
struct JsonExport<'a> {
    items: Vec<JsonItem<'a>>,
    total: usize,
}

pub fn render_json(list: &ShoppingList) -> color_eyre::Result<Vec<u8>> {
    let export = JsonExport {
        items: list
            .items
            .iter()
            .map(|item| JsonItem {
                name: &item.name,
                measurement_unit: &item.measurement_unit,
                amount: item.total_amount,
            })
            .collect(),
        total: list.items.len(),
    };

    Ok(serde_json::to_vec(&export)?)
}

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN: f32 = 20.0;
const ROW_HEIGHT: f32 = 8.0;
const AMOUNT_COLUMN: f32 = 150.0;

struct PdfPage {
    layer: PdfLayerReference,
    y: f32,
}

/// A4 document: title, a name/amount table continued across pages as
/// needed, and a footer with the number of distinct ingredients.
pub fn render_pdf(list: &ShoppingList) -> color_eyre::Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new("Shopping list", PAGE_WIDTH, PAGE_HEIGHT, "Shopping list");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| eyre!("Failed to load PDF font: {e:?}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| eyre!("Failed to load PDF font: {e:?}"))?;

    let mut current = PdfPage {
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT.0 - MARGIN,
    };

    current
        .layer
        .use_text("Shopping list", 24.0, Mm(MARGIN), Mm(current.y), &bold);
    current.y -= ROW_HEIGHT * 2.0;
    table_header(&current, &bold);
    current.y -= ROW_HEIGHT;

    for item in &list.items {
        if current.y < MARGIN + ROW_HEIGHT {
            let (page, layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Shopping list");
            current = PdfPage {
                layer: doc.get_page(page).get_layer(layer),
                y: PAGE_HEIGHT.0 - MARGIN,
            };
            table_header(&current, &bold);
            current.y -= ROW_HEIGHT;
        }

        current.layer.use_text(
            format!("{} ({})", item.name, item.measurement_unit),
            12.0,
            Mm(MARGIN),
            Mm(current.y),
            &regular,
        );
        current.layer.use_text(
            item.total_amount.to_string(),
            12.0,
            Mm(AMOUNT_COLUMN),
            Mm(current.y),
            &regular,
        );
        current.y -= ROW_HEIGHT;
    }

    current.y -= ROW_HEIGHT;
    current.layer.use_text(
        format!("Total ingredients: {}", list.items.len()),
        12.0,
        Mm(AMOUNT_COLUMN - 40.0),
        Mm(current.y.max(MARGIN / 2.0)),
        &bold,
    );

    doc.save_to_bytes()
        .map_err(|e| eyre!("Failed to write PDF export: {e:?}"))
}

fn table_header(page: &PdfPage, font: &IndirectFontRef) {
    page.layer
        .use_text("Ingredient", 14.0, Mm(MARGIN), Mm(page.y), font);
    page.layer
        .use_text("Amount", 14.0, Mm(AMOUNT_COLUMN), Mm(page.y), font);
}
