//! Markdown parsing and text extraction

use super::{ContentType, Heading, ParsedDocument};
use crate::error::Result;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};

/// Parse Markdown content and extract text
pub fn parse_markdown(content: &str) -> Result<ParsedDocument> {
    let parser = Parser::new(content);
    let mut doc = ParsedDocument::new(String::new(), ContentType::Markdown);

    let mut text = String::new();
    let mut current_heading: Option<(u8, String)> = None;
    let mut in_code_block = false;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current_heading = Some((heading_level_to_u8(level), String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, heading_text)) = current_heading.take() {
                    let heading_text = heading_text.trim().to_string();
                    if !heading_text.is_empty() {
                        if doc.title.is_none() && level == 1 {
                            doc.title = Some(heading_text.clone());
                        }

                        text.push('\n');
                        doc.headings.push(Heading {
                            level,
                            text: heading_text.clone(),
                            position: text.len(),
                        });
                        text.push_str(&heading_text);
                        text.push('\n');
                    }
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                in_code_block = true;
                text.push_str("\n```");
                text.push_str(&language);
                text.push('\n');
            }
            Event::End(TagEnd::CodeBlock) => {
                if in_code_block {
                    if !text.ends_with('\n') {
                        text.push('\n');
                    }
                    text.push_str("```\n");
                    in_code_block = false;
                }
            }
            Event::Text(fragment) => {
                if let Some((_, ref mut heading_text)) = current_heading {
                    heading_text.push_str(&fragment);
                } else {
                    text.push_str(&fragment);
                }
            }
            Event::Code(code) => {
                if let Some((_, ref mut heading_text)) = current_heading {
                    heading_text.push_str(&code);
                } else {
                    text.push('`');
                    text.push_str(&code);
                    text.push('`');
                }
            }
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(TagEnd::Paragraph) => text.push_str("\n\n"),
            Event::End(TagEnd::List(_)) => text.push('\n'),
            Event::Start(Tag::Item) => text.push_str("• "),
            Event::End(TagEnd::Item) => text.push('\n'),
            _ => {}
        }
    }

    // Headings were recorded against the untrimmed buffer
    let leading = text.len() - text.trim_start().len();
    for heading in &mut doc.headings {
        heading.position = heading.position.saturating_sub(leading);
    }
    doc.text = text.trim().to_string();

    Ok(doc)
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
