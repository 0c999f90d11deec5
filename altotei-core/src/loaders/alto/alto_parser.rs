//! ALTO Parser
//!
//! Streams an ALTO document through quick-xml and builds a `Page`. Elements
//! are matched on local name, so v2, v3 and v4 namespaces all load. The
//! parser enforces the structure later stages rely on:
//! - root `alto`, exactly one `Page`
//! - `TextLine` only inside `TextBlock`, `String` only inside `TextLine`
//! - geometry attributes numeric when present (absent means 0)
//!
//! `Tags/*Tag` ID → LABEL pairs resolve TAGREFS once the whole file is read,
//! since ALTO allows the tag table anywhere before or after the layout.

use crate::error::{AltoTeiError, Result};
use crate::types::{BoundingBox, Page, TextBlock, TextLine};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// `processingStepSettings` prefix recording the digest of the page an artifact was derived from
pub const SOURCE_DIGEST_PREFIX: &str = "source-sha256:";

/// `processingStepSettings` prefix listing the blocks that forced source order
pub const DEGENERATE_BLOCKS_PREFIX: &str = "degenerate-blocks:";

const TAG_ELEMENTS: [&str; 5] = [
    "OtherTag",
    "LayoutTag",
    "StructureTag",
    "RoleTag",
    "NamedEntityTag",
];

/// Parse ALTO markup into a `Page`
pub fn parse_alto(markup: &str, page_id: &str) -> Result<Page> {
    let mut reader = Reader::from_str(markup);
    reader.trim_text(true);

    let mut state = AltoState::default();

    loop {
        match reader.read_event() {
            Err(err) => {
                return Err(AltoTeiError::malformed(
                    page_id,
                    format!(
                        "not well-formed XML near byte {}: {err}",
                        reader.buffer_position()
                    ),
                ))
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                state.open_element(&e, false, page_id)?;
                state.open.push(local_name(&e));
            }
            Ok(Event::Empty(e)) => state.open_element(&e, true, page_id)?,
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                state.close_element(&name);
                state.open.pop();
            }
            Ok(Event::Text(text)) if state.in_step_settings => {
                let value = text
                    .unescape()
                    .map_err(|err| AltoTeiError::malformed(page_id, err.to_string()))?;
                // One `key:value` setting per line
                for setting in value.lines().map(str::trim) {
                    if let Some(hex) = setting.strip_prefix(SOURCE_DIGEST_PREFIX) {
                        state.source_digest = Some(hex.trim().to_string());
                    } else if let Some(ids) = setting.strip_prefix(DEGENERATE_BLOCKS_PREFIX) {
                        state
                            .degenerate_blocks
                            .extend(ids.split_whitespace().map(str::to_string));
                    }
                }
            }
            Ok(_) => {}
        }
    }

    if let Some(unclosed) = state.open.last() {
        return Err(AltoTeiError::malformed(
            page_id,
            format!("document ends inside <{unclosed}>"),
        ));
    }

    state.into_page(page_id)
}

#[derive(Default)]
struct AltoState {
    root_seen: bool,
    /// Local names of the currently open elements
    open: Vec<String>,
    /// Tag ID -> LABEL
    tags: HashMap<String, String>,
    page_count: usize,
    width: f32,
    height: f32,
    blocks: Vec<TextBlock>,
    block: Option<TextBlock>,
    /// Open line and the CONTENT values seen so far
    line: Option<(TextLine, Vec<String>)>,
    in_step_settings: bool,
    source_digest: Option<String>,
    degenerate_blocks: Vec<String>,
}

impl AltoState {
    fn open_element(&mut self, e: &BytesStart, empty: bool, page_id: &str) -> Result<()> {
        let name = local_name(e);

        if !self.root_seen {
            if name != "alto" {
                return Err(AltoTeiError::malformed(
                    page_id,
                    format!("root element is <{name}>, expected <alto>"),
                ));
            }
            self.root_seen = true;
            return Ok(());
        }

        match name.as_str() {
            "processingStepSettings" => self.in_step_settings = !empty,
            tag if TAG_ELEMENTS.contains(&tag) => {
                let attrs = attributes(e, page_id)?;
                if let (Some(id), Some(label)) = (attrs.get("ID"), attrs.get("LABEL")) {
                    self.tags.insert(id.clone(), label.clone());
                }
            }
            "Page" => {
                self.page_count += 1;
                if self.page_count > 1 {
                    return Err(AltoTeiError::malformed(
                        page_id,
                        "more than one <Page> element",
                    ));
                }
                let attrs = attributes(e, page_id)?;
                self.width = number(&attrs, "WIDTH", "Page", page_id)?;
                self.height = number(&attrs, "HEIGHT", "Page", page_id)?;
            }
            "TextBlock" => {
                if self.page_count == 0 {
                    return Err(AltoTeiError::malformed(
                        page_id,
                        "<TextBlock> outside <Page>",
                    ));
                }
                if self.block.is_some() {
                    return Err(AltoTeiError::malformed(page_id, "nested <TextBlock>"));
                }
                let attrs = attributes(e, page_id)?;
                let block = TextBlock {
                    id: attrs
                        .get("ID")
                        .cloned()
                        .unwrap_or_else(|| format!("{page_id}_block_{}", self.blocks.len() + 1)),
                    bbox: geometry(&attrs, "TextBlock", page_id)?,
                    tag: attrs.get("TAGREFS").cloned(),
                    lines: Vec::new(),
                };
                if empty {
                    self.blocks.push(block);
                } else {
                    self.block = Some(block);
                }
            }
            "TextLine" => {
                let (block_id, line_number) = match self.block.as_ref() {
                    Some(block) => (block.id.clone(), block.lines.len() + 1),
                    None => {
                        return Err(AltoTeiError::malformed(
                            page_id,
                            "<TextLine> outside <TextBlock>",
                        ))
                    }
                };
                if self.line.is_some() {
                    return Err(AltoTeiError::malformed(page_id, "nested <TextLine>"));
                }
                let attrs = attributes(e, page_id)?;
                let line = TextLine {
                    id: attrs
                        .get("ID")
                        .cloned()
                        .unwrap_or_else(|| format!("{block_id}_line_{line_number}")),
                    bbox: geometry(&attrs, "TextLine", page_id)?,
                    text: String::new(),
                    tag: attrs.get("TAGREFS").cloned(),
                };
                if empty {
                    if let Some(block) = self.block.as_mut() {
                        block.lines.push(line);
                    }
                } else {
                    self.line = Some((line, Vec::new()));
                }
            }
            "String" => {
                let attrs = attributes(e, page_id)?;
                let Some((_, contents)) = self.line.as_mut() else {
                    return Err(AltoTeiError::malformed(
                        page_id,
                        "<String> outside <TextLine>",
                    ));
                };
                if let Some(content) = attrs.get("CONTENT") {
                    contents.push(content.clone());
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn close_element(&mut self, name: &str) {
        match name {
            "processingStepSettings" => self.in_step_settings = false,
            "TextLine" => {
                if let Some((mut line, contents)) = self.line.take() {
                    line.text = contents.join(" ");
                    if let Some(block) = self.block.as_mut() {
                        block.lines.push(line);
                    }
                }
            }
            "TextBlock" => {
                if let Some(block) = self.block.take() {
                    self.blocks.push(block);
                }
            }
            _ => {}
        }
    }

    fn into_page(self, page_id: &str) -> Result<Page> {
        if !self.root_seen {
            return Err(AltoTeiError::malformed(page_id, "empty document"));
        }
        if self.page_count == 0 {
            return Err(AltoTeiError::malformed(page_id, "no <Page> element"));
        }

        let tags = self.tags;
        let resolve = |tagrefs: Option<String>| {
            tagrefs.and_then(|refs| {
                refs.split_whitespace()
                    .find_map(|tag_id| tags.get(tag_id).cloned())
            })
        };

        let blocks = self
            .blocks
            .into_iter()
            .map(|mut block| {
                block.tag = resolve(block.tag.take());
                for line in &mut block.lines {
                    line.tag = resolve(line.tag.take());
                }
                block
            })
            .collect();

        Ok(Page {
            id: page_id.to_string(),
            width: self.width,
            height: self.height,
            blocks,
            source_digest: self.source_digest,
            degenerate_blocks: self.degenerate_blocks,
        })
    }
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart, page_id: &str) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr
            .map_err(|err| AltoTeiError::malformed(page_id, format!("bad attribute: {err}")))?;
        let value = attr.unescape_value().map_err(|err| {
            AltoTeiError::malformed(page_id, format!("bad attribute value: {err}"))
        })?;
        attrs.insert(
            String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
            value.into_owned(),
        );
    }
    Ok(attrs)
}

fn geometry(attrs: &HashMap<String, String>, element: &str, page_id: &str) -> Result<BoundingBox> {
    Ok(BoundingBox::new(
        number(attrs, "HPOS", element, page_id)?,
        number(attrs, "VPOS", element, page_id)?,
        number(attrs, "WIDTH", element, page_id)?,
        number(attrs, "HEIGHT", element, page_id)?,
    ))
}

fn number(
    attrs: &HashMap<String, String>,
    key: &str,
    element: &str,
    page_id: &str,
) -> Result<f32> {
    match attrs.get(key) {
        None => Ok(0.0),
        Some(raw) => raw
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| {
                AltoTeiError::malformed(
                    page_id,
                    format!("<{element}> {key}=\"{raw}\" is not a number"),
                )
            }),
    }
}
