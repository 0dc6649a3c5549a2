use criterion::{Criterion, black_box, criterion_group, criterion_main};

use gauntlet_core::expect::{ExpectKind, Expectation, SourceInfo};
use gauntlet_core::{Comparator, ExpectQueue, Expected, Value, assess};

fn bench_compare(c: &mut Criterion) {
    let observed = Value::Sint(5);
    let range = Expected::sint_range(0, 10);
    c.bench_function("compare_sint_in_range", |b| {
        b.iter(|| assess::compare(black_box(&observed), Comparator::InRange, black_box(&range)))
    });

    let hay = Value::Str("the quick brown fox jumps over the lazy dog".into());
    let needle = Expected::str("brown fox");
    c.bench_function("compare_str_contains", |b| {
        b.iter(|| assess::compare(black_box(&hay), Comparator::Contains, black_box(&needle)))
    });
}

fn bench_queue(c: &mut Criterion) {
    c.bench_function("expect_queue_schedule_check", |b| {
        b.iter(|| {
            let mut queue = ExpectQueue::new();
            for _ in 0..64 {
                queue.schedule(Expectation {
                    func: "frob".into(),
                    kind: ExpectKind::Parm {
                        parm: "nr".into(),
                        comparator: Comparator::Equal,
                        expected: Expected::sint(5),
                    },
                    origin: SourceInfo {
                        file: "bench.rs".into(),
                        line: 1,
                    },
                });
            }
            for _ in 0..64 {
                queue
                    .check_parm("frob", "nr", black_box(&Value::Sint(5)))
                    .unwrap();
            }
        })
    });
}

criterion_group!(benches, bench_compare, bench_queue);
criterion_main!(benches);
