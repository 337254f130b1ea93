use chrono::NaiveDate;

use crate::block::Block;
use crate::config::{HeadingKey, LanguageConfig, OfficerLayout, group};
use crate::parser::{Context, MissingNamePolicy};
use crate::types::{AttendanceRecord, Clerk, IssueKind, MemberName, PublicOfficer};

pub(crate) struct HeadingOutcome<'a> {
    pub(crate) attendance: AttendanceRecord,
    /// Heading blocks after the last clerk entry; they belong to the content.
    pub(crate) overflow: &'a [Block],
}

/// Entries of one marker, as indices into the heading blocks.
struct Group {
    key: HeadingKey,
    entries: Vec<usize>,
}

fn group_entries(blocks: &[Block], config: &LanguageConfig) -> Vec<Group> {
    let mut groups = vec![Group {
        key: HeadingKey::Preamble,
        entries: Vec::new(),
    }];
    let mut current = 0;

    for (index, block) in blocks.iter().enumerate() {
        if let Some(key) = config.heading_key(&block.full_text()) {
            current = match groups.iter().position(|g| g.key == key) {
                Some(existing) => existing,
                None => {
                    groups.push(Group {
                        key,
                        entries: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            continue;
        }
        groups[current].entries.push(index);
    }
    groups
}

fn entries<'a>(groups: &'a [Group], key: HeadingKey) -> Option<&'a [usize]> {
    groups
        .iter()
        .find(|g| g.key == key)
        .map(|g| g.entries.as_slice())
}

fn texts(blocks: &[Block], indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .map(|&i| blocks[i].full_text())
        .filter(|text| !text.is_empty())
        .collect()
}

pub(crate) fn parse_heading<'a>(blocks: &'a [Block], cx: &mut Context) -> HeadingOutcome<'a> {
    let groups = group_entries(blocks, cx.config);
    let mut attendance = AttendanceRecord::default();

    if let Some(indices) = entries(&groups, HeadingKey::Title) {
        for text in texts(blocks, indices) {
            if attendance.sitting_date.is_none()
                && let Some(date) = parse_sitting_date(&text, cx.config)
            {
                attendance.sitting_date = Some(date);
                attendance.sitting_date_text = Some(text);
            } else if attendance.opening.is_none() && cx.config.opening.is_match(&text) {
                attendance.opening = Some(text);
            }
        }
    } else {
        log::debug!("No Hansard title in the heading");
    }

    match entries(&groups, HeadingKey::MembersPresent) {
        Some(indices) => {
            let entries = strip_president_marker(texts(blocks, indices), cx);
            let mut members = member_names(&entries, cx).into_iter();
            attendance.president = members.next();
            attendance.members_present = members.collect();
        }
        None => cx.record(IssueKind::MissingMarker, "No members present list in the heading"),
    }

    if let Some(indices) = entries(&groups, HeadingKey::MembersAbsent) {
        attendance.members_absent = member_names(&texts(blocks, indices), cx);
    }

    attendance.public_officers = match entries(&groups, HeadingKey::PublicOfficers) {
        Some(indices) => {
            let entries = texts(blocks, indices);
            match cx.config.officer_layout {
                OfficerLayout::Alternating => alternating_officers(entries, cx),
                OfficerLayout::Combined => Some(combined_officers(&entries, cx)),
            }
        }
        None => {
            log::warn!("No public officer present");
            None
        }
    };

    let mut overflow: &[Block] = &[];
    match entries(&groups, HeadingKey::Clerks) {
        Some(indices) => {
            for &index in indices {
                let text = blocks[index].full_text();
                if text.is_empty() {
                    continue;
                }
                match cx.config.clerk.captures(&text) {
                    Some(caps) => match (group(&caps, "name"), group(&caps, "title")) {
                        (Some(name), Some(title)) => attendance.clerks.push(Clerk {
                            name: name.trim().to_string(),
                            title: title.trim().to_string(),
                        }),
                        _ => cx.record(
                            IssueKind::UnexpectedEntry,
                            format!("Clerk entry '{}' lacks a name or a title", text),
                        ),
                    },
                    None => {
                        log::debug!("Heading ends before '{}'", text);
                        overflow = &blocks[index..];
                        break;
                    }
                }
            }
        }
        None => cx.record(IssueKind::MissingMarker, "No clerks list in the heading"),
    }

    HeadingOutcome {
        attendance,
        overflow,
    }
}

pub(crate) fn parse_sitting_date(text: &str, config: &LanguageConfig) -> Option<NaiveDate> {
    for format in &config.sitting_date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(text.trim(), format) {
            return Some(date);
        }
    }
    let caps = config.sitting_date.as_ref()?.captures(text)?;
    NaiveDate::from_ymd_opt(
        group(&caps, "year")?.parse().ok()?,
        group(&caps, "month")?.parse().ok()?,
        group(&caps, "day")?.parse().ok()?,
    )
}

/// The members present list opens with the president marker, either as an
/// entry of its own or as a prefix of the president's entry.
fn strip_president_marker(mut entries: Vec<String>, cx: &mut Context) -> Vec<String> {
    let config = cx.config;
    let marker = config.president.as_str();
    let Some(first) = entries.first().cloned() else {
        return entries;
    };
    if first == marker {
        entries.remove(0);
    } else if let Some(rest) = first.strip_prefix(marker) {
        entries[0] = rest.trim().to_string();
    } else {
        cx.record(
            IssueKind::UnexpectedEntry,
            format!("The first row should be '{}', but received '{}'", marker, first),
        );
    }
    entries
}

fn member_names(entries: &[String], cx: &mut Context) -> Vec<MemberName> {
    entries
        .iter()
        .filter_map(|entry| extract_name(entry, cx))
        .collect()
}

/// Isolates the bare name in an attendance entry. The titles after the first
/// comma are never part of it.
pub(crate) fn extract_name(full_text: &str, cx: &mut Context) -> Option<MemberName> {
    let head = full_text
        .split(|c: char| c == ',' || c == '，')
        .next()
        .unwrap_or_default()
        .trim();

    if let Some(name) = cx.config.member_name.captures(head).and_then(|c| c.name("name")) {
        return Some(MemberName {
            name: Some(name.as_str().trim().to_string()),
            full_text: full_text.to_string(),
        });
    }

    cx.record(
        IssueKind::MissingName,
        format!("Cannot find the name for string '{}'", head),
    );
    match cx.options.missing_name_policy {
        MissingNamePolicy::KeepFullText => Some(MemberName {
            name: None,
            full_text: full_text.to_string(),
        }),
        MissingNamePolicy::Drop => None,
    }
}

fn is_parenthesised(text: &str) -> bool {
    text.starts_with('(') && text.ends_with(')')
}

/// Name and titles on one entry, position on the next.
fn alternating_officers(entries: Vec<String>, cx: &mut Context) -> Option<Vec<PublicOfficer>> {
    let mut merged: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries {
        match merged.last_mut() {
            Some(previous) if is_parenthesised(&entry) => {
                previous.push(' ');
                previous.push_str(&entry);
            }
            _ => merged.push(entry),
        }
    }

    if merged.len() % 2 != 0 {
        cx.record(
            IssueKind::CountMismatch,
            format!(
                "Number of officers does not match number of positions: {}:{}",
                merged.len().div_ceil(2),
                merged.len() / 2
            ),
        );
        return None;
    }

    Some(
        merged
            .chunks(2)
            .map(|pair| {
                let (name, title) = pair[0].split_once(',').unwrap_or((pair[0].as_str(), ""));
                PublicOfficer {
                    name: name.trim().to_string(),
                    title: title.trim().to_string(),
                    position: pair[1].clone(),
                }
            })
            .collect(),
    )
}

/// Position, name and titles on a single entry.
fn combined_officers(entries: &[String], cx: &mut Context) -> Vec<PublicOfficer> {
    let mut officers = Vec::with_capacity(entries.len());
    for entry in entries {
        let fields = cx
            .config
            .combined_officer
            .as_ref()
            .and_then(|pattern| pattern.captures(entry))
            .and_then(|caps| {
                Some((
                    group(&caps, "name")?,
                    group(&caps, "position")?,
                    group(&caps, "title").unwrap_or_default(),
                ))
            });
        match fields {
            Some((name, position, title)) => officers.push(PublicOfficer {
                name: name.trim().to_string(),
                title: title.trim().to_string(),
                position: position.trim().to_string(),
            }),
            None => {
                cx.record(
                    IssueKind::UnexpectedEntry,
                    format!("Cannot find the position of officer '{}'", entry),
                );
                officers.push(PublicOfficer {
                    name: entry.clone(),
                    title: String::new(),
                    position: String::new(),
                });
            }
        }
    }
    officers
}
