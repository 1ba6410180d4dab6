//! Example of reading nested values in place, then editing an owned copy.
//!
//! cargo run --package minibson --example nested_access

use minibson::{ArrayView, Document, DocumentView, from_json};

fn main() -> Result<(), minibson::Error> {
    let bytes = from_json(r#"{"users": [{"name": "Amy"}, {"name": "Bob"}]}"#)?.to_bytes()?;

    // view = root["users"][1]["name"], without allocating
    let root = DocumentView::parse(&bytes)?;
    let users = root.get::<ArrayView>("users")?;
    let name = users.at::<DocumentView>(1)?.get::<&str>("name")?;
    println!("{name}");

    // owned tree: rename the second user and write it back out
    let mut doc = Document::from_bytes(&bytes)?;
    doc.get_mut::<minibson::Array>("users")?
        .at_mut::<Document>(1)?
        .set("name", "Rob");
    let edited = doc.to_bytes()?;
    let renamed = DocumentView::parse(&edited)?
        .get::<ArrayView>("users")?
        .at::<DocumentView>(1)?
        .get::<String>("name")?;
    println!("{renamed}");
    Ok(())
}
