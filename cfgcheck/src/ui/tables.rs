//! Terminal tables for learned catalogs and presence matrices.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

use cfgcheck_core::signature::to_display_block;
use cfgcheck_core::{CatalogEntry, CheckReport, Presence};

use crate::ui::theme::{ThemeEntry, ThemeMap};

fn new_table(enable_colors: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);
    if enable_colors {
        table.enforce_styling();
    } else {
        table.force_no_tty();
    }
    table
}

fn themed(cell: Cell, entry: ThemeEntry, theme_map: &ThemeMap) -> Cell {
    match theme_map.get(&entry).and_then(|s| s.fg.as_ref()) {
        Some(color) => cell.fg(color.to_table_color()),
        None => cell,
    }
}

fn header(text: &str, theme_map: &ThemeMap) -> Cell {
    themed(Cell::new(text).add_attribute(Attribute::Bold), ThemeEntry::Header, theme_map)
}

/// Pattern and learned count, one row per entry. Nested signatures span
/// one line per hierarchy level.
pub fn catalog_table(entries: &[CatalogEntry], theme_map: &ThemeMap, enable_colors: bool) -> Table {
    let mut table = new_table(enable_colors);
    table.set_header(vec![header("Signature", theme_map), header("Count", theme_map)]);
    for entry in entries {
        table.add_row(vec![
            themed(Cell::new(to_display_block(&entry.pattern)), ThemeEntry::Pattern, theme_map),
            themed(
                Cell::new(entry.occurrence_count).set_alignment(CellAlignment::Right),
                ThemeEntry::Count,
                theme_map,
            ),
        ]);
    }
    table
}

/// Patterns as rows, devices as columns, totals last.
///
/// The matrix is shown transposed: catalogs have far more patterns than a
/// profile has devices.
pub fn presence_table(report: &CheckReport, theme_map: &ThemeMap, enable_colors: bool) -> Table {
    let matrix = &report.matrix;
    let mut table = new_table(enable_colors);

    let mut headers = vec![header("Pattern", theme_map)];
    headers.extend(matrix.devices.iter().map(|d| header(d, theme_map)));
    headers.push(header("Total", theme_map));
    table.set_header(headers);

    for (column, pattern) in matrix.patterns.iter().enumerate() {
        let mut row = vec![themed(Cell::new(pattern), ThemeEntry::Pattern, theme_map)];
        for cells in &matrix.cells {
            let cell = match cells.get(column) {
                Some(Presence::Present) => themed(Cell::new("yes"), ThemeEntry::Present, theme_map),
                Some(Presence::Absent) | None => themed(Cell::new("no"), ThemeEntry::Absent, theme_map),
            };
            row.push(cell.set_alignment(CellAlignment::Center));
        }
        if let Some(total) = report.totals.get(column) {
            let cell = Cell::new(total.to_string()).set_alignment(CellAlignment::Right);
            row.push(if total.universal {
                themed(cell.add_attribute(Attribute::Bold), ThemeEntry::Universal, theme_map)
            } else {
                cell
            });
        }
        table.add_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;
    use cfgcheck_core::{check_profile, CompiledCatalog, DeviceConfig};

    #[test]
    fn presence_table_lists_totals() {
        let catalog = CompiledCatalog::compile("P1", ["ntp server 1.1.1.1$", "ip ssh version 2$"]);
        let devices = vec![DeviceConfig::from_text("pe_1", "ntp server 1.1.1.1\n")];
        let report = check_profile(&catalog, &devices);
        let rendered = presence_table(&report, &ThemeStyle::default_theme_map(), false).to_string();
        assert!(rendered.contains("pe_1"));
        assert!(rendered.contains("1 / 1"));
        assert!(rendered.contains("0 / 1"));
        assert!(!rendered.contains('\x1b'));
    }

    #[test]
    fn catalog_table_lists_counts() {
        let entries = vec![CatalogEntry { pattern: "logging buffered 64000$".to_string(), occurrence_count: 7 }];
        let rendered = catalog_table(&entries, &ThemeStyle::default_theme_map(), false).to_string();
        assert!(rendered.contains("logging buffered 64000$"));
        assert!(rendered.contains('7'));
    }

    #[test]
    fn catalog_table_splits_nested_signatures() {
        let entries = vec![CatalogEntry { pattern: "line vty 0 4@@@transport input ssh$".to_string(), occurrence_count: 2 }];
        let rendered = catalog_table(&entries, &ThemeStyle::default_theme_map(), false).to_string();
        assert!(!rendered.contains("@@@"));
        assert!(rendered.contains("transport input ssh$"));
    }
}
