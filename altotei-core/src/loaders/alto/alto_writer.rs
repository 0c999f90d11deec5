//! ALTO v4 serialization of restructured pages
//!
//! Each logical line becomes one `TextLine` carrying a single `String` whose
//! CONTENT is the line text, so reloading the artifact yields the same text
//! verbatim. The source digest and, for pages kept in source order, the
//! degenerate block ids go into `Processing/processingStepSettings`.

use super::alto_parser::{DEGENERATE_BLOCKS_PREFIX, SOURCE_DIGEST_PREFIX};
use crate::error::Result;
use crate::types::{BoundingBox, RestructuredPage};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::BTreeMap;
use std::io::{self, Cursor, Write};

const ALTO_NS: &str = "http://www.loc.gov/standards/alto/ns-v4#";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const ALTO_SCHEMA: &str = "http://www.loc.gov/standards/alto/v4/alto-4-2.xsd";

/// Serialize a restructured page as an ALTO v4 document
pub fn write_alto(page: &RestructuredPage, source_digest: Option<&str>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut alto = BytesStart::new("alto");
    alto.push_attribute(("xmlns", ALTO_NS));
    alto.push_attribute(("xmlns:xsi", XSI_NS));
    let schema_location = format!("{ALTO_NS} {ALTO_SCHEMA}");
    alto.push_attribute(("xsi:schemaLocation", schema_location.as_str()));
    writer.write_event(Event::Start(alto))?;

    write_description(&mut writer, page, source_digest)?;

    let tag_ids = tag_ids(page);
    if !tag_ids.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("Tags")))?;
        for (label, id) in &tag_ids {
            let mut tag = BytesStart::new("OtherTag");
            tag.push_attribute(("ID", id.as_str()));
            tag.push_attribute(("LABEL", *label));
            writer.write_event(Event::Empty(tag))?;
        }
        writer.write_event(Event::End(BytesEnd::new("Tags")))?;
    }

    writer.write_event(Event::Start(BytesStart::new("Layout")))?;

    let mut page_element = BytesStart::new("Page");
    page_element.push_attribute(("ID", page.page_id.as_str()));
    page_element.push_attribute(("WIDTH", page.width.to_string().as_str()));
    page_element.push_attribute(("HEIGHT", page.height.to_string().as_str()));
    page_element.push_attribute(("PHYSICAL_IMG_NR", "1"));
    writer.write_event(Event::Start(page_element))?;

    let print_space = positioned(
        "PrintSpace",
        None,
        &BoundingBox::new(0.0, 0.0, page.width, page.height),
        None,
    );
    writer.write_event(Event::Start(print_space))?;

    for block in &page.blocks {
        let element = positioned("TextBlock", Some(block.id.as_str()), &block.bbox, None);
        if block.lines.is_empty() {
            writer.write_event(Event::Empty(element))?;
            continue;
        }
        writer.write_event(Event::Start(element))?;

        for line in &block.lines {
            let line_tag = line.tag.as_ref().and_then(|label| tag_ids.get(label.as_str()));
            let element = positioned("TextLine", Some(line.id.as_str()), &line.bbox, line_tag);
            if line.text.is_empty() {
                writer.write_event(Event::Empty(element))?;
                continue;
            }
            writer.write_event(Event::Start(element))?;
            let mut string = positioned("String", None, &line.bbox, None);
            string.push_attribute(("CONTENT", line.text.as_str()));
            writer.write_event(Event::Empty(string))?;
            writer.write_event(Event::End(BytesEnd::new("TextLine")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("TextBlock")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("PrintSpace")))?;
    writer.write_event(Event::End(BytesEnd::new("Page")))?;
    writer.write_event(Event::End(BytesEnd::new("Layout")))?;
    writer.write_event(Event::End(BytesEnd::new("alto")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err).into())
}

fn write_description<W: Write>(
    writer: &mut Writer<W>,
    page: &RestructuredPage,
    source_digest: Option<&str>,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("Description")))?;
    text_element(writer, "MeasurementUnit", "pixel")?;

    writer.write_event(Event::Start(BytesStart::new("sourceImageInformation")))?;
    text_element(writer, "fileName", &page.page_id)?;
    writer.write_event(Event::End(BytesEnd::new("sourceImageInformation")))?;

    let mut processing = BytesStart::new("Processing");
    processing.push_attribute(("ID", "reading_order"));
    writer.write_event(Event::Start(processing))?;
    text_element(writer, "processingCategory", "contentModification")?;
    text_element(
        writer,
        "processingStepDescription",
        &format!("reading order: {}", page.strategy),
    )?;
    let mut settings = Vec::new();
    if let Some(digest) = source_digest {
        settings.push(format!("{SOURCE_DIGEST_PREFIX}{digest}"));
    }
    if page.degenerate {
        settings.push(format!(
            "{DEGENERATE_BLOCKS_PREFIX}{}",
            page.degenerate_block_ids().join(" ")
        ));
    }
    if !settings.is_empty() {
        text_element(writer, "processingStepSettings", &settings.join("\n"))?;
    }
    writer.write_event(Event::Start(BytesStart::new("processingSoftware")))?;
    text_element(writer, "softwareName", env!("CARGO_PKG_NAME"))?;
    text_element(writer, "softwareVersion", env!("CARGO_PKG_VERSION"))?;
    writer.write_event(Event::End(BytesEnd::new("processingSoftware")))?;
    writer.write_event(Event::End(BytesEnd::new("Processing")))?;

    writer.write_event(Event::End(BytesEnd::new("Description")))?;
    Ok(())
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn positioned<'a>(
    name: &'a str,
    id: Option<&str>,
    bbox: &BoundingBox,
    tag_id: Option<&String>,
) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    if let Some(id) = id {
        element.push_attribute(("ID", id));
    }
    element.push_attribute(("HPOS", bbox.x.to_string().as_str()));
    element.push_attribute(("VPOS", bbox.y.to_string().as_str()));
    element.push_attribute(("WIDTH", bbox.width.to_string().as_str()));
    element.push_attribute(("HEIGHT", bbox.height.to_string().as_str()));
    if let Some(tag_id) = tag_id {
        element.push_attribute(("TAGREFS", tag_id.as_str()));
    }
    element
}

/// Line tag labels -> generated OtherTag ids, in label order
fn tag_ids(page: &RestructuredPage) -> BTreeMap<&str, String> {
    let mut labels: Vec<&str> = page
        .lines()
        .filter_map(|line| line.tag.as_deref())
        .collect();
    labels.sort_unstable();
    labels.dedup();

    labels
        .into_iter()
        .enumerate()
        .map(|(index, label)| (label, format!("LT{}", index + 1)))
        .collect()
}
