//! Book to document tree.

use crate::config::Labels;
use crate::content::{Node, leaf_blocks, list_lines, normalize_book};
use crate::export::{RenderContext, copyright_line};
use crate::model::{Book, starts_part};

use super::model::{Alignment, Block, Document, Paragraph, Run};

const ACCENT: &str = "D946EF";
const PART_COLOR: &str = "8B5CF6";
const MUTED: &str = "666666";

/// Body text size in half-points (12pt).
const BODY_SIZE: u32 = 24;
/// List indent in twips (half an inch).
const LIST_INDENT: u32 = 720;

/// Heading size in half-points for a normalized heading level.
fn heading_size(level: u8) -> u32 {
    match level {
        3 => 28,
        _ => 24,
    }
}

/// Build the document tree for a book.
///
/// Title page, then every chapter on its own page (part banner first when a
/// new part begins), then the colophon after the last chapter.
pub fn build_document(book: &Book, ctx: &RenderContext, labels: &Labels) -> Document {
    let info = book.info();
    let mut blocks = Vec::new();

    // Title page
    blocks.push(Block::Paragraph(
        Paragraph::new(vec![Run::new(&info.title).bold().size(56).color(ACCENT)])
            .aligned(Alignment::Center)
            .spacing(2400, 240),
    ));
    if !info.subtitle.is_empty() {
        blocks.push(Block::Paragraph(
            Paragraph::new(vec![Run::new(&info.subtitle).size(32).color(MUTED)])
                .aligned(Alignment::Center)
                .spacing(0, 120),
        ));
    }
    if !info.tagline.is_empty() {
        blocks.push(Block::Paragraph(
            Paragraph::new(vec![Run::new(&info.tagline).italic().size(28).color(MUTED)])
                .aligned(Alignment::Center),
        ));
    }
    blocks.push(Block::PageBreak);

    let chapters = normalize_book(book);
    let last = chapters.len().saturating_sub(1);
    for (index, normalized) in chapters.iter().enumerate() {
        let chapter = normalized.chapter;

        if starts_part(book.chapters(), index)
            && let Some(part) = chapter.part.as_deref()
        {
            blocks.push(Block::Paragraph(
                Paragraph::new(vec![Run::new(part).bold().size(36).color(PART_COLOR)])
                    .aligned(Alignment::Center)
                    .bordered(PART_COLOR)
                    .spacing(240, 480),
            ));
        }

        blocks.push(Block::Paragraph(
            Paragraph::new(vec![
                Run::new(format!("{} {}", labels.chapter, normalized.number))
                    .size(20)
                    .color(MUTED),
            ])
            .spacing(0, 60),
        ));
        blocks.push(Block::Paragraph(
            Paragraph::new(vec![Run::new(&chapter.title).bold().size(40).color(ACCENT)])
                .spacing(0, 360),
        ));

        for node in leaf_blocks(&normalized.nodes) {
            push_node(&mut blocks, node);
        }

        if index != last {
            blocks.push(Block::PageBreak);
        }
    }

    // Colophon
    blocks.push(Block::Paragraph(
        Paragraph::new(vec![Run::new(copyright_line(info, ctx.year)).bold()])
            .aligned(Alignment::Center)
            .spacing(960, 240),
    ));
    if !info.disclaimer.is_empty() {
        blocks.push(Block::Paragraph(
            Paragraph::new(vec![Run::new(&info.disclaimer).italic().color(MUTED)])
                .aligned(Alignment::Center)
                .spacing(0, 240),
        ));
    }
    if !info.site.is_empty() {
        blocks.push(Block::Paragraph(
            Paragraph::new(vec![Run::new(&info.site).size(20).color(MUTED)])
                .aligned(Alignment::Center),
        ));
    }

    Document {
        title: info.title.clone(),
        language: info.language.clone(),
        blocks,
    }
}

fn push_node(blocks: &mut Vec<Block>, node: &Node) {
    match node {
        Node::Paragraph { runs } => {
            let runs = runs
                .iter()
                .map(|r| Run {
                    text: r.text.clone(),
                    bold: r.bold,
                    italic: r.italic,
                    size: Some(BODY_SIZE),
                    color: None,
                })
                .collect();
            blocks.push(Block::Paragraph(
                Paragraph::new(runs)
                    .aligned(Alignment::Justify)
                    .spacing(0, 200),
            ));
        }
        Node::Heading { level, text } => {
            blocks.push(Block::Paragraph(
                Paragraph::new(vec![
                    Run::new(text)
                        .bold()
                        .size(heading_size(*level))
                        .color(PART_COLOR),
                ])
                .spacing(240, 120),
            ));
        }
        Node::List { ordered, items } => {
            for line in list_lines(*ordered, items) {
                blocks.push(Block::Paragraph(
                    Paragraph::new(vec![Run::new(line).size(BODY_SIZE)])
                        .indented(LIST_INDENT)
                        .spacing(0, 80),
                ));
            }
        }
        // Flattened by leaf_blocks.
        Node::Container { children } => {
            for child in children {
                push_node(blocks, child);
            }
        }
    }
}
