use crate::block::{Block, Element};
use crate::config::{LanguageConfig, group};
use crate::parser::Context;
use crate::types::{IssueKind, TabledPaper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaperList {
    Legislation,
    Other,
}

fn list_marker(text: &str, config: &LanguageConfig) -> Option<PaperList> {
    let lowered = text.trim().to_lowercase();
    if config
        .subsidiary_legislation
        .iter()
        .any(|marker| lowered.starts_with(marker.as_str()))
    {
        Some(PaperList::Legislation)
    } else if config
        .other_papers
        .iter()
        .any(|marker| lowered.starts_with(marker.as_str()))
    {
        Some(PaperList::Other)
    } else {
        None
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cell_text(cell: &Element) -> String {
    normalize_whitespace(&cell.text_content())
}

fn block_lines(block: &Block) -> Vec<String> {
    let mut lines = block.element.lines();
    if block.has_tail() {
        lines.push(block.tail.trim().to_string());
    }
    lines
}

/// Data cells of each row, skipping header rows made only of `th` cells.
fn table_rows(table: &Element) -> Vec<Vec<&Element>> {
    table
        .descendants("tr")
        .into_iter()
        .map(|row| row.child_elements(&["td", "th"]).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty() && cells.iter().any(|cell| cell.name == "td"))
        .collect()
}

fn column_count(table: &Element) -> usize {
    table_rows(table)
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or_default()
}

/// Rows of reference number and title, in either order. Only the first and
/// last non-empty cells are read, and every non-empty row yields an entry:
/// the number pattern decides the order, and a row it cannot place keeps the
/// title-then-number layout of the printed record.
fn legislation_table(table: &Element, cx: &mut Context) -> Vec<TabledPaper> {
    let mut papers = Vec::new();
    for cells in table_rows(table) {
        let texts: Vec<String> = cells
            .iter()
            .map(|cell| cell_text(cell))
            .filter(|text| !text.is_empty())
            .collect();
        if texts.is_empty() || list_marker(&texts.join(" "), cx.config).is_some() {
            continue;
        }
        if !(2..=3).contains(&cells.len()) {
            cx.record(
                IssueKind::ColumnCount,
                format!(
                    "Expected 2 or 3 columns in legislation row, found {}",
                    cells.len()
                ),
            );
        }
        let (Some(first), Some(last)) = (texts.first(), texts.last()) else {
            continue;
        };
        if texts.len() < 2 {
            cx.record(
                IssueKind::UnexpectedEntry,
                format!("Legislation row has a single value: '{}'", first),
            );
            let (number, title) = if cx.config.legislation_number.is_match(first) {
                (first.clone(), String::new())
            } else {
                (String::new(), first.clone())
            };
            papers.push(TabledPaper::Legislation { number, title });
            continue;
        }

        let (number, title) = if cx.config.legislation_number.is_match(first) {
            (first, last)
        } else {
            if !cx.config.legislation_number.is_match(last) {
                cx.record(
                    IssueKind::UnexpectedEntry,
                    format!("No reference number in legislation row '{}'", texts.join(" | ")),
                );
            }
            (last, first)
        };
        papers.push(TabledPaper::Legislation {
            number: number.clone(),
            title: title.clone(),
        });
    }
    papers
}

/// Rows of number, dash and a cell holding the title followed by its
/// description lines.
fn other_papers_table(table: &Element, cx: &mut Context) -> Vec<TabledPaper> {
    let mut papers = Vec::new();
    for (index, cells) in table_rows(table).into_iter().enumerate() {
        if cells.iter().all(|cell| cell_text(cell).is_empty()) {
            continue;
        }
        let row_text: Vec<String> = cells.iter().map(|cell| cell_text(cell)).collect();
        if list_marker(&row_text.join(" "), cx.config).is_some() {
            continue;
        }
        if cells.len() != 3 {
            cx.record(
                IssueKind::ColumnCount,
                format!("Expected 3 columns in paper row, found {}", cells.len()),
            );
        }

        let digits: String = row_text[0].chars().filter(char::is_ascii_digit).collect();
        let number = (!digits.is_empty() && cells.len() > 1).then_some(digits);
        if number.is_none() && index == 0 && cells.len() == 3 {
            log::debug!("Skipping column headings '{}'", row_text.join(" | "));
            continue;
        }
        let Some(last) = cells.last() else {
            continue;
        };
        let mut lines = last.lines().into_iter();
        let title = lines.next().unwrap_or_default();
        let description = lines.collect::<Vec<_>>().join(" ");
        papers.push(TabledPaper::Other {
            number,
            title,
            description,
        });
    }
    papers
}

fn table_papers(table: &Element, list: PaperList, cx: &mut Context) -> Vec<TabledPaper> {
    match list {
        PaperList::Legislation => legislation_table(table, cx),
        PaperList::Other => other_papers_table(table, cx),
    }
}

fn legislation_lines(lines: &[String], config: &LanguageConfig) -> Vec<TabledPaper> {
    let mut papers = Vec::new();
    for line in lines {
        let caps = config.legislation_line.captures(line);
        match caps.as_ref().map(|caps| (group(caps, "number"), group(caps, "title"))) {
            Some((Some(number), Some(title))) => papers.push(TabledPaper::Legislation {
                number: number.to_string(),
                title: title.trim().to_string(),
            }),
            _ => log::debug!("Skipping legislation line '{}'", line),
        }
    }
    papers
}

/// Number and title of a line opening a numbered paper.
fn paper_entry<'h>(line: &'h str, config: &LanguageConfig) -> Option<(&'h str, &'h str)> {
    let caps = config.paper_number.captures(line)?;
    Some((group(&caps, "number")?, group(&caps, "title")?))
}

fn other_paper_lines(lines: &[String], config: &LanguageConfig) -> Vec<TabledPaper> {
    let mut papers = Vec::new();
    for line in lines {
        if let Some((number, title)) = paper_entry(line, config) {
            papers.push(TabledPaper::Other {
                number: Some(number.to_string()),
                title: title.trim().to_string(),
                description: String::new(),
            });
        } else if let Some(TabledPaper::Other { description, .. }) = papers.last_mut() {
            append(description, line);
        } else {
            log::debug!("Skipping paper line '{}'", line);
        }
    }
    papers
}

fn append(target: &mut String, line: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(line.trim());
}

fn is_parenthesised(line: &str) -> bool {
    let line = line.trim();
    (line.starts_with('(') && line.ends_with(')'))
        || (line.starts_with('（') && line.ends_with('）'))
}

fn closes_entry(title: &str, config: &LanguageConfig) -> bool {
    let title = title.trim_end();
    title.ends_with(')')
        || title.ends_with('）')
        || config
            .paper_closing_suffixes
            .iter()
            .any(|suffix| title.ends_with(suffix.as_str()))
}

/// Last resort when the section has neither tables nor list markers: entries
/// follow the paper numbering convention, and a title runs on until it ends
/// with a report-style suffix or a parenthesised clause follows it.
fn numbered_papers(lines: &[String], config: &LanguageConfig) -> Vec<TabledPaper> {
    let mut papers = Vec::new();
    let mut open = false;
    for line in lines {
        if let Some((number, title)) = paper_entry(line, config) {
            let title = title.trim().to_string();
            open = !closes_entry(&title, config);
            papers.push(TabledPaper::Other {
                number: Some(number.to_string()),
                title,
                description: String::new(),
            });
            continue;
        }
        match papers.last_mut() {
            Some(TabledPaper::Other {
                title, description, ..
            }) if open => {
                if is_parenthesised(line) {
                    append(description, line);
                    open = false;
                } else {
                    append(title, line);
                    open = !closes_entry(title, config);
                }
            }
            _ => log::debug!("Skipping paper line '{}'", line),
        }
    }
    papers
}

fn part_papers(part: &[Block], list: PaperList, cx: &mut Context) -> Vec<TabledPaper> {
    if let Some(table) = part.iter().find(|block| block.is_table()) {
        return table_papers(&table.element, list, cx);
    }
    let lines: Vec<String> = part.iter().flat_map(block_lines).collect();
    match list {
        PaperList::Legislation => legislation_lines(&lines, cx.config),
        PaperList::Other => other_paper_lines(&lines, cx.config),
    }
}

pub(crate) fn parse_tabled_papers(blocks: &[Block], cx: &mut Context) -> Vec<TabledPaper> {
    let tables: Vec<&Block> = blocks.iter().filter(|block| block.is_table()).collect();
    if tables.len() >= 2 {
        if tables.len() > 2 {
            cx.record(
                IssueKind::UnexpectedEntry,
                format!("Found {} paper tables; only the first two are read", tables.len()),
            );
        }
        let mut papers = legislation_table(&tables[0].element, cx);
        papers.extend(other_papers_table(&tables[1].element, cx));
        return papers;
    }

    let markers: Vec<(usize, PaperList)> = blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| !block.is_table())
        .filter_map(|(index, block)| {
            list_marker(&block.full_text(), cx.config).map(|list| (index, list))
        })
        .collect();

    if let Some(&(first, _)) = markers.first() {
        if first > 0 {
            log::debug!("Skipping {} block(s) before the first paper list", first);
        }
        let mut papers = Vec::new();
        for (position, &(start, list)) in markers.iter().enumerate() {
            let end = markers
                .get(position + 1)
                .map_or(blocks.len(), |&(next, _)| next);
            papers.extend(part_papers(&blocks[start + 1..end], list, cx));
        }
        return papers;
    }

    match tables.first() {
        Some(table) => {
            let list = if column_count(&table.element) == 3 {
                PaperList::Other
            } else {
                PaperList::Legislation
            };
            table_papers(&table.element, list, cx)
        }
        None => {
            let lines: Vec<String> = blocks.iter().flat_map(block_lines).collect();
            numbered_papers(&lines, cx.config)
        }
    }
}
