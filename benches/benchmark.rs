use criterion::{criterion_group, criterion_main, Criterion};
use lunafmt::{parse_chunk, rewrite, Mode};
use std::hint::black_box;

const SNIPPET: &str = r#"
local counters = {}

local function bump(name, amount)
    local current = counters[name] or 0
    counters[name] = current + (amount or 1)
    return counters[name]
end

function report(prefix)
    for name, value in pairs(counters) do
        print(prefix .. ': ' .. name .. ' = ' .. value)
    end
end

for i = 1, 100 do
    if i % 15 == 0 then
        bump('fizzbuzz', i)
    elseif i % 3 == 0 then
        bump('fizz')
    elseif i % 5 == 0 then
        bump('buzz')
    else
        bump('plain')
    end
end

report('totals')
"#;

fn criterion_benchmark(c: &mut Criterion) {
    let code = SNIPPET.repeat(64);
    let mut group = c.benchmark_group("pipeline");
    group.bench_function("parse", |b| {
        b.iter(|| black_box(parse_chunk(code.clone(), "bench.lua", Mode::Auto).unwrap()))
    });
    group.bench_function("format_auto", |b| {
        b.iter(|| black_box(rewrite(code.clone(), "bench.lua", Mode::Auto).unwrap()))
    });
    group.bench_function("compress", |b| {
        b.iter(|| black_box(rewrite(code.clone(), "bench.lua", Mode::Compress).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
