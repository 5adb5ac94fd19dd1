use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use markdown_neuraxis_incremental::{
    EditDescriptor, IncrementalParser, ParserState, TextRange, parse,
};
mod common;

use common::EditPoint;

fn bench_single_keystroke(c: &mut Criterion) {
    let mut group = c.benchmark_group("keystroke");
    group.sample_size(10);

    let content = common::notes_document(200);
    let previous = parse(content.as_str());
    let parser = IncrementalParser::default();

    for point in EditPoint::ALL {
        let offset = common::edit_offset(&content, 100, point);
        let new_source = EditDescriptor::insert(offset, "x").apply(&content);
        group.bench_with_input(
            BenchmarkId::new("localized", point.name()),
            &new_source,
            |b, new_source| {
                b.iter(|| {
                    std::hint::black_box(parser.parse_incremental(
                        &previous,
                        TextRange::empty(offset),
                        new_source.as_str(),
                    ))
                });
            },
        );
    }

    let offset = common::edit_offset(&content, 100, EditPoint::Paragraph);
    let new_source = EditDescriptor::insert(offset, "x").apply(&content);
    group.bench_function("full", |b| {
        b.iter(|| std::hint::black_box(parser.parse(new_source.as_str())));
    });

    group.finish();
}

fn bench_typing_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("typing_session");
    group.sample_size(10);

    let content = common::notes_document(200);

    for point in [EditPoint::ListItem, EditPoint::FenceBody] {
        let start = common::edit_offset(&content, 120, point);
        group.bench_function(BenchmarkId::new("50_keystrokes", point.name()), |b| {
            b.iter(|| {
                let mut state =
                    ParserState::with_source(IncrementalParser::default(), content.as_str());
                for i in 0..50 {
                    let info = state.apply_text_edit(EditDescriptor::insert(start + i, "a"));
                    std::hint::black_box(info);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_keystroke, bench_typing_session);
criterion_main!(benches);
