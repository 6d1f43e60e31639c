use criterion::{black_box, criterion_group, criterion_main, Criterion};
use docchk::checker::bktree::damerau_levenshtein;
use docchk::checker::dictionary::{DictionarySource, Lexicon};
use docchk::SpellIndex;

fn synthetic_words() -> Vec<(String, u64)> {
    let syllables = ["ka", "lo", "mi", "ren", "to", "sa", "vek", "dun"];
    let mut words = Vec::new();
    for a in syllables {
        for b in syllables {
            for c in syllables {
                words.push((format!("{a}{b}{c}"), 1));
            }
        }
    }
    words
}

fn bench_suggest(c: &mut Criterion) {
    let lexicon = Lexicon::from_entries(synthetic_words(), DictionarySource::Builtin)
        .expect("lexicon");
    let index = SpellIndex::build(lexicon, 2);

    c.bench_function("suggest distance 2", |b| {
        b.iter(|| index.suggest(black_box("kalomo"), 5))
    });
    c.bench_function("is_correct", |b| b.iter(|| index.is_correct(black_box("renvekto"))));
    c.bench_function("damerau_levenshtein", |b| {
        b.iter(|| damerau_levenshtein(black_box("recieve"), black_box("receive")))
    });
}

criterion_group!(benches, bench_suggest);
criterion_main!(benches);
