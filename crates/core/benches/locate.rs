use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use harvest_core::{Document, HarvestConfig, Harvester, PageTextOracle, oracle::ContentOracle, preprocess_html};
use harvest_core::posts::{PostLocator, reference_fragments};

const THREAD_URL: &str = "http://forum.example.org/read.php?2,736";

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("../../tests/fixtures/{}", name)).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for name in ["forum_zebra.html", "forum_message_body.html"] {
        let html = fixture(name);
        group.bench_with_input(BenchmarkId::from_parameter(name), &html, |b, html| {
            b.iter(|| Document::parse(black_box(html)))
        });
    }

    group.finish();
}

fn bench_preprocess(c: &mut Criterion) {
    let html = fixture("forum_message_body.html");
    let config = Default::default();

    c.bench_function("preprocess", |b| b.iter(|| preprocess_html(black_box(&html), &config)));
}

fn bench_post_locator(c: &mut Criterion) {
    let html = fixture("forum_message_body.html");
    let config = HarvestConfig::default();
    let lines = PageTextOracle::new().extract_main_text(&html);
    let fragments = reference_fragments(&lines, &config.footer_markers);
    let doc = Document::parse(&html).unwrap();

    c.bench_function("post_locator", |b| {
        b.iter(|| PostLocator::new(black_box(&doc), &config).locate(black_box(&fragments)))
    });
}

fn bench_full_locate(c: &mut Criterion) {
    let html = fixture("forum_message_body.html");
    let harvester = Harvester::new();

    c.bench_function("full_locate", |b| b.iter(|| harvester.locate(black_box(&html), THREAD_URL)));
}

criterion_group!(benches, bench_parse, bench_preprocess, bench_post_locator, bench_full_locate);
criterion_main!(benches);
