//! Parser for delimited-text plan sheets (CSV/TSV-like uploads)
//!
//! Administrator exports rarely start at the header: they carry title rows,
//! export timestamps and blank lines first. The parser scans a fixed window
//! for the real header row, infers the column separator, maps columns to
//! canonical fields by substring, and hands raw records to the normalizer.

use csv::ReaderBuilder;
use serde_json::Value;
use tracing::{debug, warn};

use crate::normalize::{parse_money, RawRecord};

/// How many leading lines are scanned for the header row
pub const HEADER_SCAN_WINDOW: usize = 20;

/// Column-to-field mapping resolved from a header row
#[derive(Debug, Clone)]
struct ColumnMap {
    group: Option<usize>,
    credit: Option<usize>,
    term: Option<usize>,
    installment: Option<usize>,
    fee: Option<usize>,
    category: Option<usize>,
    provider: Option<usize>,
}

/// Parse a delimited sheet into raw records ready for normalization
///
/// Returns the records plus the count of discarded rows. Yields zero
/// records (not an error) when no header row is found in the scan
/// window. Rows whose cleaned credit value is not positive are
/// discarded.
pub fn parse_sheet(text: &str) -> (Vec<RawRecord>, usize) {
    let Some((header_idx, delimiter)) = locate_header(text) else {
        warn!(
            window = HEADER_SCAN_WINDOW,
            "No header row found in delimited upload"
        );
        return (vec![], 0);
    };

    let lines: Vec<&str> = text.lines().collect();
    let header_line = lines[header_idx];
    let columns = resolve_columns(header_line, delimiter);
    debug!(
        header = header_idx,
        delimiter = %(delimiter as char),
        ?columns,
        "Resolved sheet header"
    );

    let body = lines[header_idx + 1..].join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(body.as_bytes());

    let mut records = Vec::new();
    let mut discarded = 0usize;
    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable sheet row");
                discarded += 1;
                continue;
            }
        };

        // A sheet row without a positive credit is a footer, a subtotal or
        // an empty line
        let credit = columns
            .credit
            .and_then(|i| row.get(i))
            .map(parse_money)
            .unwrap_or(0.0);
        if credit <= 0.0 {
            discarded += 1;
            continue;
        }

        let mut record = RawRecord::new();
        let mut put = |key: &str, idx: Option<usize>| {
            if let Some(cell) = idx.and_then(|i| row.get(i)) {
                let cell = cell.trim();
                if !cell.is_empty() {
                    record.insert(key.to_string(), Value::String(cell.to_string()));
                }
            }
        };
        put("grupo", columns.group);
        put("credito", columns.credit);
        put("prazo", columns.term);
        put("parcela", columns.installment);
        put("taxa", columns.fee);
        put("tipo", columns.category);
        put("administradora", columns.provider);
        records.push(record);
    }

    debug!(
        records = records.len(),
        discarded, "Parsed delimited sheet"
    );
    (records, discarded)
}

/// Locate the header row and infer the column separator
///
/// A line is the header when it mentions both a group token and a credit
/// token. `;` is preferred over `,`: the `;`-split column count is tried
/// first.
fn locate_header(text: &str) -> Option<(usize, u8)> {
    for (idx, line) in text.lines().take(HEADER_SCAN_WINDOW).enumerate() {
        let lower = line.to_lowercase();
        let has_group = lower.contains("grupo") || lower.contains("group");
        let has_credit =
            lower.contains("credito") || lower.contains("crédito") || lower.contains("credit");
        if has_group && has_credit {
            let delimiter = if line.split(';').count() > 1 { b';' } else { b',' };
            return Some((idx, delimiter));
        }
    }
    None
}

/// Map each target field to a column index by substring match
fn resolve_columns(header_line: &str, delimiter: u8) -> ColumnMap {
    let cells: Vec<String> = header_line
        .split(delimiter as char)
        .map(|cell| cell.trim().to_lowercase())
        .collect();

    let find = |tokens: &[&str]| -> Option<usize> {
        cells
            .iter()
            .position(|cell| tokens.iter().any(|token| cell.contains(token)))
    };

    ColumnMap {
        group: find(&["grupo", "group", "plano"]),
        credit: find(&["credito", "crédito", "credit"]),
        term: find(&["prazo", "term", "meses"]),
        installment: find(&["parcela", "mensalidade", "installment"]),
        fee: find(&["taxa", "fee", "tx"]),
        category: find(&["tipo", "segmento", "categoria"]),
        provider: find(&["administradora", "admin"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Provider};
    use crate::normalize::normalize_record;

    #[test]
    fn test_parse_semicolon_sheet() {
        let sheet = "GRUPO;CREDITO;PRAZO;PARCELA;TAXA\n1020;300000;200;1650;19,5";

        let (records, _) = parse_sheet(sheet);
        assert_eq!(records.len(), 1);

        let plan = normalize_record(&records[0], Provider::Alvorada);
        assert_eq!(plan.plan_name, "1020");
        assert_eq!(plan.asset_value, 300_000.0);
        assert_eq!(plan.term_months, 200);
        assert_eq!(plan.monthly_installment, 1650.0);
        assert_eq!(plan.admin_fee, 0.195);
    }

    #[test]
    fn test_header_found_after_preamble() {
        let sheet = "Relatório de grupos ativos\nExportado em 05/08/2026\n\n\
                     Grupo,Credito,Prazo,Parcela\n88,54000,72,890";

        let (records, _) = parse_sheet(sheet);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["grupo"], "88");
    }

    #[test]
    fn test_semicolon_preferred_over_comma() {
        // Comma appears inside the money cells, ';' is the real separator
        let sheet = "GRUPO;CREDITO;PARCELA\n7;R$ 120.000,00;1.390,50";

        let (records, _) = parse_sheet(sheet);
        assert_eq!(records.len(), 1);

        let plan = normalize_record(&records[0], Provider::Horizonte);
        assert_eq!(plan.asset_value, 120_000.0);
        assert_eq!(plan.monthly_installment, 1390.5);
    }

    #[test]
    fn test_rows_without_positive_credit_discarded() {
        let sheet = "GRUPO;CREDITO;PARCELA\n1;80000;950\n2;;950\n3;n/d;950\nTOTAL;;\n";

        let (records, discarded) = parse_sheet(sheet);
        assert_eq!(records.len(), 1);
        assert_eq!(discarded, 3);
        assert_eq!(records[0]["grupo"], "1");
    }

    #[test]
    fn test_no_header_in_window_yields_zero_records() {
        let mut sheet = String::new();
        for i in 0..30 {
            sheet.push_str(&format!("linha de cabeçalho {}\n", i));
        }
        sheet.push_str("GRUPO;CREDITO\n1;80000\n");

        // Header sits past the scan window
        assert!(parse_sheet(&sheet).0.is_empty());
    }

    #[test]
    fn test_category_column_flows_through() {
        let sheet = "GRUPO;CREDITO;SEGMENTO\n12;90000;pesados";

        let (records, _) = parse_sheet(sheet);
        let plan = normalize_record(&records[0], Provider::Meridional);
        assert_eq!(plan.category, Category::HeavyEquipment);
    }
}
