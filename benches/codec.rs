use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mdoc_cbor::{decode, encode, DataElement, Map, Timestamp, Value};

/// A representative IssuerSigned-shaped document: a namespace of wrapped
/// items plus a header-like map.
fn sample_document() -> Value {
    let issued = Timestamp::from_rfc3339("2024-01-01T00:00:00.000Z").unwrap();
    let mut items = Vec::new();
    for i in 0..20u64 {
        let mut item = Map::new();
        item.insert("digestID", i);
        item.insert("random", Value::Bytes(vec![0xa5; 16]));
        item.insert("elementIdentifier", format!("element_{}", i));
        item.insert("elementValue", Value::from(i as i64 * 37 - 100));
        items.push(Value::DataElement(DataElement::from_value(&Value::Map(
            item,
        ))));
    }

    let mut namespaces = Map::new();
    namespaces.insert("org.iso.18013.5.1", Value::Array(items));

    let mut doc = Map::new();
    doc.insert("version", "1.0");
    doc.insert("issued", issued);
    doc.insert("nameSpaces", namespaces);
    Value::Map(doc)
}

fn bench_codec(c: &mut Criterion) {
    let doc = sample_document();
    let bytes = encode(&doc);

    c.bench_function("encode issuer-signed", |b| {
        b.iter(|| encode(black_box(&doc)))
    });
    c.bench_function("decode issuer-signed", |b| {
        b.iter(|| decode(black_box(&bytes)).unwrap())
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
