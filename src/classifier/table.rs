//! Structural table reader.
//!
//! Walks the token stream and rebuilds tables as rows of cell strings.
//! Every row belongs to its innermost enclosing table, so rows of a nested
//! table are read exactly once and its text does not leak into the cell
//! that contains it.

use super::text::clean_cell_text;
use super::tokenizer::{Token, Tokenizer};

/// A table read from markup: rows of cleaned cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

/// In-progress state for one open `<table>`.
#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<String>>,
    row: Option<Vec<String>>,
    cell: Option<String>,
}

impl TableBuilder {
    fn start_row(&mut self) {
        self.finish_row();
        self.row = Some(Vec::new());
    }

    fn start_cell(&mut self) {
        self.finish_cell();
        // Cells outside a row are not part of any row.
        if self.row.is_some() {
            self.cell = Some(String::new());
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.push_str(text);
        }
    }

    fn finish_cell(&mut self) {
        if let (Some(raw), Some(row)) = (self.cell.take(), self.row.as_mut()) {
            row.push(clean_cell_text(&raw));
        }
    }

    fn finish_row(&mut self) {
        self.finish_cell();
        if let Some(row) = self.row.take() {
            self.rows.push(row);
        }
    }

    fn finish(mut self) -> Table {
        self.finish_row();
        Table { rows: self.rows }
    }
}

/// Reads every table in `content`.
///
/// Tables are returned in the order they close, so a nested table comes
/// before the table that contains it. Tables left open at the end of the
/// input are closed implicitly.
pub fn read_tables(content: &str) -> Vec<Table> {
    let mut open: Vec<TableBuilder> = Vec::new();
    let mut tables = Vec::new();

    for token in Tokenizer::new(content) {
        match token {
            Token::Open { name, self_closing } => match name.as_str() {
                "table" if !self_closing => open.push(TableBuilder::default()),
                "tr" => {
                    if let Some(table) = open.last_mut() {
                        table.start_row();
                    }
                }
                "td" | "th" => {
                    if let Some(table) = open.last_mut() {
                        table.start_cell();
                        if self_closing {
                            table.finish_cell();
                        }
                    }
                }
                _ => {}
            },
            Token::Close { name } => match name.as_str() {
                "table" => {
                    if let Some(table) = open.pop() {
                        tables.push(table.finish());
                    }
                }
                "tr" => {
                    if let Some(table) = open.last_mut() {
                        table.finish_row();
                    }
                }
                "td" | "th" => {
                    if let Some(table) = open.last_mut() {
                        table.finish_cell();
                    }
                }
                _ => {}
            },
            Token::Text(text) => {
                if let Some(table) = open.last_mut() {
                    table.push_text(text);
                }
            }
        }
    }

    while let Some(table) = open.pop() {
        tables.push(table.finish());
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(content: &str) -> Vec<Vec<String>> {
        read_tables(content)
            .into_iter()
            .flat_map(|t| t.rows)
            .collect()
    }

    #[test]
    fn test_no_tables() {
        assert!(read_tables("").is_empty());
        assert!(read_tables("<p>no tables</p>").is_empty());
    }

    #[test]
    fn test_header_and_data_cells() {
        let html = "<table><tbody><tr><th>Type</th><th>Count</th></tr>\
                    <tr><td>Unit</td><td>4</td></tr></tbody></table>";
        assert_eq!(
            rows(html),
            vec![vec!["Type", "Count"], vec!["Unit", "4"]]
        );
    }

    #[test]
    fn test_nested_markup_is_stripped() {
        let html = "<table><tr><td><p><strong>Unit</strong> Tests</p></td>\
                    <td><span style=\"color:red\">12</span></td></tr></table>";
        assert_eq!(rows(html), vec![vec!["Unit Tests", "12"]]);
    }

    #[test]
    fn test_entities_decoded_after_tags_removed() {
        let html = "<table><tr><td>&lt;b&gt;unit&lt;/b&gt;&nbsp;</td><td>1</td></tr></table>";
        assert_eq!(rows(html), vec![vec!["<b>unit</b>", "1"]]);
    }

    #[test]
    fn test_implicitly_closed_cells_and_rows() {
        let html = "<table><tr><td>Unit<td>3<tr><td>WDIO<td>2</table>";
        assert_eq!(rows(html), vec![vec!["Unit", "3"], vec!["WDIO", "2"]]);
    }

    #[test]
    fn test_unclosed_table_is_read() {
        let html = "<table><tr><td>Unit</td><td>5</td></tr>";
        assert_eq!(rows(html), vec![vec!["Unit", "5"]]);
    }

    #[test]
    fn test_rows_outside_tables_are_ignored() {
        let html = "<tr><td>Unit</td><td>5</td></tr><table><tr><td>a</td></tr></table>";
        assert_eq!(rows(html), vec![vec!["a"]]);
    }

    #[test]
    fn test_nested_table_rows_belong_to_inner_table() {
        let html = "<table><tr><td>Outer</td><td>\
                    <table><tr><td>Unit</td><td>2</td></tr></table>\
                    </td></tr></table>";
        let tables = read_tables(html);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows, vec![vec!["Unit", "2"]]);
        assert_eq!(tables[1].rows, vec![vec!["Outer", ""]]);
    }

    #[test]
    fn test_multiple_tables() {
        let html = "<table><tr><td>a</td></tr></table><p>x</p>\
                    <TABLE class=\"wrapped\"><TR><TD>b</TD></TR></TABLE>";
        assert_eq!(rows(html), vec![vec!["a"], vec!["b"]]);
    }
}
