//! End-to-end behaviour across the view and tree codecs.

use minibson::{
    Array, ArrayView, Document, DocumentView, Error, ErrorKind, Null, Scalar, Value,
};

#[test]
fn build_serialize_and_read_through_view() {
    let mut doc = Document::new();
    doc.set("a", 1i32)
        .set("b", "text")
        .set("c", Document::new().with("x", 3i32));
    let bytes = doc.to_bytes().unwrap();

    let view = DocumentView::parse(&bytes).unwrap();
    assert_eq!(view.get::<i32>("a").unwrap(), 1);
    assert_eq!(view.get::<&str>("b").unwrap(), "text");
    let c = view.get::<DocumentView>("c").unwrap();
    assert_eq!(c.get::<i32>("x").unwrap(), 3);

    // owned copy of the nested document
    let c = view.get::<Document>("c").unwrap();
    assert_eq!(c.get::<i32>("x").unwrap(), &3);
}

#[test]
fn short_int32_element_is_rejected() {
    let bytes = [0x0A, 0x00, 0x00, 0x00, 0x10, b'a', 0x00, 0x01, 0x00, 0x00];
    assert!(!DocumentView::new(&bytes).is_valid());
    assert!(DocumentView::parse(&bytes).is_err());

    let err = Document::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(matches!(err, Error::InvalidDocument { .. }));
}

#[test]
fn array_roundtrip_through_view() {
    let mut array = Array::new();
    array.push(0i32).push(1i32);
    let bytes = array.to_bytes().unwrap();

    let view = ArrayView::parse(&bytes).unwrap();
    assert_eq!(view.len(), 2);
    assert_eq!(view.at::<i32>(0).unwrap(), 0);
    assert_eq!(view.at::<i32>(1).unwrap(), 1);
    let err = view.at::<i32>(2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);

    assert_eq!(Array::from_bytes(&bytes).unwrap(), array);
}

#[test]
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn scalar_widens_integers() {
    let big = 1_i64 << 40;
    let doc = Document::new().with("n", big).with("s", "no");
    let bytes = doc.to_bytes().unwrap();
    let view = DocumentView::parse(&bytes).unwrap();

    let scalar = view.get::<Scalar>("n").unwrap();
    assert_eq!(scalar.value(), big as f64);
    assert_eq!(scalar.value() as i64, big);

    let err = view.get::<Scalar>("s").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadCast);

    // the tree answers the same through the owned conversion
    assert_eq!(doc.get_as::<Scalar>("n").unwrap(), scalar);
    assert_eq!(doc.get_as::<Scalar>("s").unwrap_err().kind(), ErrorKind::BadCast);
}

#[test]
fn empty_view_has_no_elements() {
    for view in [DocumentView::default(), DocumentView::new(&[])] {
        assert!(view.is_empty());
        assert_eq!(view.len(), 0);
        assert_eq!(view.iter().next().map(|e| e.offset()), None);
        assert_eq!(view.byte_len(), 0);
    }
    let empty = [0x05, 0x00, 0x00, 0x00, 0x00];
    let view = DocumentView::parse(&empty).unwrap();
    assert!(view.is_empty());
    assert_eq!(view.iter().count(), 0);
}

#[test]
fn error_kinds_cover_lookup_failures() {
    let doc = Document::new().with("s", "x");
    assert_eq!(doc.get::<i32>("missing").unwrap_err().kind(), ErrorKind::OutOfRange);
    assert_eq!(doc.get::<i32>("s").unwrap_err().kind(), ErrorKind::BadCast);

    let mut small = [0u8; 4];
    assert_eq!(
        doc.serialize_into(&mut small).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn edit_tree_then_reserialize() {
    let bytes = Document::new()
        .with("keep", 1i32)
        .with("drop", Null)
        .with("list", Array::new().with("a"))
        .to_bytes()
        .unwrap();

    let mut doc = Document::from_bytes(&bytes).unwrap();
    assert_eq!(doc.erase("drop"), Some(Value::Null));
    doc.get_mut::<Array>("list").unwrap().push("b");
    *doc.get_mut::<i32>("keep").unwrap() = 2;
    doc.set_null("added");

    let view_bytes = doc.to_bytes().unwrap();
    let view = DocumentView::parse(&view_bytes).unwrap();
    assert_eq!(view.keys().collect::<Vec<_>>(), vec!["added", "keep", "list"]);
    assert_eq!(view.get::<i32>("keep").unwrap(), 2);
    assert!(view.contains_type::<Null>("added"));
    let list = view.get::<ArrayView>("list").unwrap();
    assert_eq!(list.at::<&str>(1).unwrap(), "b");
}

#[test]
fn serialization_is_repeatable() {
    let doc = Document::new().with("x", 1.5).with("y", vec![1u8, 2, 3]);
    let first = doc.to_bytes().unwrap();
    let mut second = vec![0u8; doc.serialized_size()];
    assert_eq!(doc.serialize_into(&mut second).unwrap(), first.len());
    assert_eq!(first, second);
}
