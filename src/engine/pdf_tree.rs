use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};

/// Page attributes a page may take from an ancestor `Pages` node.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
const MAX_TREE_DEPTH: usize = 64;

/// Clone of a page dictionary with inherited attributes resolved onto it and `Parent` removed.
pub fn standalone_page(doc: &Document, page_id: ObjectId) -> lopdf::Result<Dictionary> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    let mut parent = parent_of(&page);
    let mut depth = 0;

    while let Some(id) = parent {
        if depth == MAX_TREE_DEPTH {
            break;
        }
        depth += 1;
        let Ok(node) = doc.get_dictionary(id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = parent_of(node);
    }

    page.remove(b"Parent");
    Ok(page)
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    dict.get(b"Parent").and_then(Object::as_reference).ok()
}

/// Value of `/Type` when `object` is a dictionary or a stream.
pub fn type_name(object: &Object) -> Option<&[u8]> {
    let dict = match object {
        Object::Dictionary(d) => d,
        Object::Stream(s) => &s.dict,
        _ => return None,
    };
    dict.get(b"Type").ok()?.as_name().ok()
}

/// Pushes every indirect reference reachable inside `object`, skipping `Parent` links.
pub fn collect_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|o| collect_references(o, out)),
        Object::Dictionary(dict) => collect_dict_references(dict, out),
        Object::Stream(stream) => collect_dict_references(&stream.dict, out),
        _ => {}
    }
}

fn collect_dict_references(dict: &Dictionary, out: &mut Vec<ObjectId>) {
    for (key, value) in dict.iter() {
        if key.as_slice() != b"Parent" {
            collect_references(value, out);
        }
    }
}

/// Installs a fresh single-level page tree over `pages` and a catalog pointing at it.
/// `pages` must already be standalone dictionaries keyed by ids free in `doc`.
pub fn install_page_tree(doc: &mut Document, pages: Vec<(ObjectId, Dictionary)>) {
    let tree_id = (doc.max_id + 1, 0);
    let catalog_id = (doc.max_id + 2, 0);
    doc.max_id += 2;

    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    let count = pages.len() as i64;
    for (id, mut page) in pages {
        page.set("Parent", tree_id);
        doc.objects.insert(id, Object::Dictionary(page));
    }

    doc.objects.insert(
        tree_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    doc.objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => tree_id,
        }),
    );
    doc.trailer.set("Root", catalog_id);
}
