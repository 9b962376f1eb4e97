//! Column alignment of printed lines
//!
//! The printer ends an alignable cell with [`CELL`]. Consecutive lines with
//! the same indentation that all end a cell in the same column form a block,
//! and every cell of a block is padded with spaces to the widest one plus a
//! single space. A block whose cells are all empty takes no room at all.
//! Lines without cells end every block, and so does a line carrying
//! [`SECTION`].
//!
//! Both markers are Unicode noncharacters, which Go sources do not contain.

pub(super) const CELL: char = '\u{fdd0}';
pub(super) const SECTION: char = '\u{fdd1}';

struct Row<'a> {
    indent: &'a str,
    /// Every cell but the last was ended by a marker
    cells: Vec<&'a str>,
    section: bool,
}

impl Row<'_> {
    /// Number of marker-ended cells
    fn ended(&self) -> usize {
        self.cells.len() - 1
    }
}

pub(super) fn align(text: &str) -> String {
    if !text.contains([CELL, SECTION]) {
        return text.to_string();
    }
    let stripped: Vec<(String, bool)> = text
        .split('\n')
        .map(|line| (line.replace(SECTION, ""), line.contains(SECTION)))
        .collect();
    let rows: Vec<Row> = stripped
        .iter()
        .map(|(line, section)| {
            let body = line.trim_start_matches('\t');
            Row {
                indent: &line[..line.len() - body.len()],
                cells: body.split(CELL).collect(),
                section: *section,
            }
        })
        .collect();

    let mut widths: Vec<Vec<usize>> = rows.iter().map(|r| vec![0; r.ended()]).collect();
    let columns = rows.iter().map(Row::ended).max().unwrap_or(0);
    for column in 0..columns {
        let mut start = 0;
        while start < rows.len() {
            if rows[start].ended() <= column {
                start += 1;
                continue;
            }
            let mut end = start + 1;
            while end < rows.len()
                && rows[end].ended() > column
                && !rows[end].section
                && rows[end].indent == rows[start].indent
            {
                end += 1;
            }
            let widest = rows[start..end]
                .iter()
                .map(|r| r.cells[column].chars().count())
                .max()
                .unwrap_or(0);
            let width = if widest == 0 { 0 } else { widest + 1 };
            for row in &mut widths[start..end] {
                row[column] = width;
            }
            start = end;
        }
    }

    let lines: Vec<String> = rows
        .iter()
        .zip(&widths)
        .map(|(row, widths)| {
            let mut line = row.indent.to_string();
            for (cell, &width) in row.cells.iter().zip(widths) {
                line.push_str(&format!("{cell:<width$}"));
            }
            if let Some(last) = row.cells.last() {
                line.push_str(last);
            }
            if row.cells.len() > 1 && row.cells.last().is_some_and(|c| c.is_empty()) {
                line.truncate(line.trim_end_matches(' ').len());
            }
            line
        })
        .collect();
    lines.join("\n")
}
