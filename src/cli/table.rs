use colored::Colorize;

use crate::cli::output;

/// Declarative description of a table column.
#[derive(Debug, Clone)]
pub struct TableColumn {
    pub header: String,
    pub right_align: bool,
}

impl TableColumn {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            right_align: false,
        }
    }

    pub fn numeric(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            right_align: true,
        }
    }
}

/// Simple table model used for rendering read-only overviews.
#[derive(Debug, Clone)]
pub struct Table {
    pub title: Option<String>,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<T: Into<String>>(title: Option<T>, columns: Vec<TableColumn>) -> Self {
        Self {
            title: title.map(|value| value.into()),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row<S: Into<String>>(&mut self, cells: Vec<S>) {
        self.rows
            .push(cells.into_iter().map(|value| value.into()).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .fold(column.header.chars().count(), usize::max)
            })
            .collect()
    }

    fn render_row(&self, cells: &[String], widths: &[usize]) -> String {
        let rendered: Vec<String> = self
            .columns
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(idx, (column, width))| {
                let cell = cells.get(idx).map(String::as_str).unwrap_or("");
                if column.right_align {
                    format!("{:>width$}", cell, width = *width)
                } else {
                    format!("{:<width$}", cell, width = *width)
                }
            })
            .collect();
        rendered.join("  ").trim_end().to_string()
    }

    /// Lines of the table body including the header and rule.
    pub fn lines(&self) -> Vec<String> {
        let widths = self.widths();
        let header: Vec<String> = self.columns.iter().map(|c| c.header.clone()).collect();
        let total = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 2;
        let mut lines = vec![self.render_row(&header, &widths), "-".repeat(total)];
        lines.extend(self.rows.iter().map(|row| self.render_row(row, &widths)));
        lines
    }

    pub fn print(&self) {
        if let Some(title) = &self.title {
            output::section(title);
        }
        let mut lines = self.lines().into_iter();
        if let Some(header) = lines.next() {
            output::plain(header.bold());
        }
        for line in lines {
            output::plain(line);
        }
    }
}
