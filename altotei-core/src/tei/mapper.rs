use super::node::TeiElement;
use crate::types::{Entry, FieldRole, Work};

/// Converts entries into TEI `<item>` nodes. Purely structural: field text
/// is copied as-is, one element per populated role.
pub struct EntryMapper {
    catalog_id: String,
}

impl EntryMapper {
    pub fn new(catalog_id: &str) -> Self {
        Self {
            catalog_id: xml_id(catalog_id),
        }
    }

    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    pub fn map_entries<'e>(&self, entries: impl IntoIterator<Item = &'e Entry>) -> Vec<TeiElement> {
        entries.into_iter().map(|entry| self.map_entry(entry)).collect()
    }

    pub fn map_entry(&self, entry: &Entry) -> TeiElement {
        let entry_id = format!("{}_e{}", self.catalog_id, entry.number);

        let mut works = TeiElement::new("list");
        for (index, work) in entry.works.iter().enumerate() {
            works.push(self.map_work(work, &format!("{entry_id}_w{}", index + 1)));
        }

        TeiElement::new("item")
            .attr("type", "entry")
            .attr("n", entry.number.to_string())
            .attr("xml:id", entry_id)
            .child(works)
    }

    fn map_work(&self, work: &Work, work_id: &str) -> TeiElement {
        let mut item = TeiElement::new("item")
            .attr("type", "work")
            .attr("n", work.number.to_string())
            .attr("xml:id", work_id);

        if let Some(marker) = &work.marker {
            item.push(TeiElement::new("num").text(marker.as_str()));
        }

        for (role, fragments) in &work.fields {
            if fragments.is_empty() {
                continue;
            }
            let mut element = role_element(*role);
            for (index, fragment) in fragments.iter().enumerate() {
                if index > 0 {
                    element.push(TeiElement::new("lb"));
                }
                element = element.text(fragment.as_str());
            }
            item.push(element);
        }

        item
    }
}

fn role_element(role: FieldRole) -> TeiElement {
    match role {
        FieldRole::Creator => TeiElement::new("persName"),
        FieldRole::Title => TeiElement::new("title"),
        FieldRole::Medium => TeiElement::new("material"),
        FieldRole::Dimensions => TeiElement::new("measure").attr("type", "dimensions"),
        FieldRole::Date => TeiElement::new("date"),
        FieldRole::Owner => TeiElement::new("note").attr("type", "owner"),
        FieldRole::Notes => TeiElement::new("note"),
        FieldRole::Unclassified => TeiElement::new("ab").attr("type", "unclassified"),
    }
}

/// Make `raw` usable as an `xml:id` (an XML NCName)
pub fn xml_id(raw: &str) -> String {
    let mut id: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !id.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        id.insert(0, '_');
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> Entry {
        let mut work = Work::new(12, Some("12.".to_string()));
        work.push_field(FieldRole::Title, "Le Port");
        work.push_field(FieldRole::Creator, "DUPONT (Jean)");
        work.push_field(FieldRole::Notes, "(Exposé au Salon");
        work.push_field(FieldRole::Notes, "de 1886.)");
        let mut entry = Entry::new(9);
        entry.works.push(work);
        entry
    }

    #[test]
    fn entry_and_work_identifiers() {
        let item = EntryMapper::new("salon1886").map_entry(&entry());
        assert_eq!(item.attribute("type"), Some("entry"));
        assert_eq!(item.attribute("n"), Some("9"));
        assert_eq!(item.attribute("xml:id"), Some("salon1886_e9"));

        let work = item.find("list").and_then(|list| list.find("item")).unwrap();
        assert_eq!(work.attribute("n"), Some("12"));
        assert_eq!(work.attribute("xml:id"), Some("salon1886_e9_w1"));
    }

    #[test]
    fn fields_in_canonical_order_with_line_breaks() {
        let item = EntryMapper::new("cat").map_entry(&entry());
        let work = item.find("list").and_then(|list| list.find("item")).unwrap();

        let names: Vec<_> = work.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["num", "persName", "title", "note"]);
        let note = work.find("note").unwrap();
        assert_eq!(note.elements().filter(|e| e.name == "lb").count(), 1);
        assert_eq!(note.text_content(), "(Exposé au Salon de 1886.)");
    }

    #[test]
    fn xml_ids_are_ncnames() {
        assert_eq!(xml_id("Salon 1886"), "Salon_1886");
        assert_eq!(xml_id("1886_salon"), "_1886_salon");
    }
}
