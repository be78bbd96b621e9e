//! This bench test decodes a large generated GEDCOM file and builds the
//! descendant forest over the result.

#![allow(missing_docs)]

use std::fmt::Write;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use kindred::{RecordSet, TreeOptions, storage::gedcom};

const FAMILIES: usize = 2_000;

/// Generates a chain of families where each couple's first child marries
/// into the next family.
fn generate() -> String {
    let mut text = String::from("0 HEAD\n1 SOUR Bench\n1 GEDC\n2 VERS 5.5\n");
    for i in 1..=FAMILIES {
        let husband = 3 * i - 2;
        let wife = 3 * i - 1;
        let child = 3 * i;
        for (id, name, sex) in [(husband, "Father", 'M'), (wife, "Mother", 'F')] {
            writeln!(text, "0 @I{id}@ INDI\n1 NAME {name} /Gen{i}/\n1 SEX {sex}").unwrap();
            writeln!(text, "1 BIRT\n2 DATE {} JAN 1900\n1 FAMS @F{i}@", i % 28 + 1).unwrap();
            if i > 1 && id == husband {
                writeln!(text, "1 FAMC @F{}@", i - 1).unwrap();
            }
        }
        writeln!(text, "0 @I{child}@ INDI\n1 NAME Child /Gen{i}/\n1 FAMC @F{i}@").unwrap();
        writeln!(text, "0 @F{i}@ FAM\n1 HUSB @I{husband}@\n1 WIFE @I{wife}@").unwrap();
        writeln!(text, "1 CHIL @I{child}@").unwrap();
        if i < FAMILIES {
            writeln!(text, "1 CHIL @I{}@", 3 * (i + 1) - 2).unwrap();
        }
    }
    text.push_str("0 TRLR\n");
    text
}

fn decode(c: &mut Criterion) {
    let text = generate();

    c.bench_function("decode", |b| b.iter(|| gedcom::decode(&text)));

    c.bench_function("descendant forest", |b| {
        b.iter_batched(
            || {
                let (individuals, families) = gedcom::decode(&text);
                RecordSet::from_records(individuals, families)
            },
            |records| records.descendant_forest(TreeOptions::default()).len(),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, decode);
criterion_main!(benches);
