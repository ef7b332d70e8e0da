//! Parser benchmarks
//!
//! Run with: cargo bench --bench parser
//! Profile with: cargo flamegraph --bench parser -- --bench

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hedwig::parser::Parser;

const SIMPLE_EXPR: &str = "1 + 2 * 3 - 4 / 5;";

const VARIABLES: &str = r#"
let x = 1;
const y = 2;
var z = 3, w = 4;
let a = x + y + z;
const b = a * 2;
"#;

const CLASS_DEF: &str = r#"
class Counter extends Base {
    constructor(name, initialValue) {
        super(name);
        this.count = initialValue;
    }
    get value() { return this.count; }
    set value(v) { this.count = v; }
    static create() { return new Counter("default", 0); }
}
"#;

const FUNCTIONS: &str = r#"
function add(a, b) { return a + b; }
async function load(url) {
    const response = await fetch(url);
    return response.json();
}
const double = function (x) { return x * 2; };
"#;

const CONTROL_FLOW: &str = r#"
if (x > 0 && y < 10 || !done) {
    for (let i = 0; i < 10; i++) {
        total += i % 3 === 0 ? i : -i;
    }
} else if (x === 0) {
    while (queue.length > 0) {
        process(queue.shift());
    }
} else {
    reset();
}
"#;

const OBJECTS: &str = r#"
const config = {
    name: "app",
    "content-type": "json",
    [dynamic]: true,
    nested: { deep: { value: null } },
    shorthand,
    method() { return this.name; },
    get size() { return 1; },
};
"#;

const ARRAYS: &str = r#"
const list = [1, 2, 3, , 5];
const matrix = [[1, 0], [0, 1]];
[a, b] = [b, a];
matrix[0][1] = list[list.length - 1];
"#;

const TEMPLATES: &str = r#"
const greeting = `Hello ${name}, you are ${age} years old`;
const plain = `no substitutions here`;
"#;

fn generate_large_source(size: usize) -> String {
    let patterns = [CLASS_DEF, FUNCTIONS, CONTROL_FLOW, OBJECTS, ARRAYS, TEMPLATES];
    let mut source = String::with_capacity(size);
    let mut i = 0;
    while source.len() < size {
        if let Some(pattern) = patterns.get(i % patterns.len()) {
            source.push_str(pattern);
            source.push_str("\n\n");
        }
        i += 1;
    }
    source
}

/// Binary expression tree of the given depth
fn generate_binary_expr(depth: usize) -> String {
    if depth == 0 {
        return "x".to_string();
    }
    let inner = generate_binary_expr(depth - 1);
    let op = ["+", "-", "*", "/", "<", "==="]
        .get(depth % 6)
        .copied()
        .unwrap_or("+");
    format!("({} {} {})", inner, op, inner)
}

fn bench_parser_individual(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/individual");
    let mut parser = Parser::new();

    let cases = [
        ("simple_expr", SIMPLE_EXPR),
        ("variables", VARIABLES),
        ("class_def", CLASS_DEF),
        ("functions", FUNCTIONS),
        ("control_flow", CONTROL_FLOW),
        ("objects", OBJECTS),
        ("arrays", ARRAYS),
        ("templates", TEMPLATES),
    ];

    for (name, source) in cases {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("bytes", name), source, |b, s| {
            b.iter(|| black_box(parser.parse(black_box(s))));
        });
    }

    group.finish();
}

fn bench_parser_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/throughput");
    let mut parser = Parser::new();

    for size in [1_000, 10_000, 100_000, 500_000] {
        let source = generate_large_source(size);
        let actual_size = source.len();

        group.throughput(Throughput::Bytes(actual_size as u64));
        group.bench_with_input(
            BenchmarkId::new("large_source", format!("{}KB", actual_size / 1024)),
            &source,
            |b, s| {
                b.iter(|| black_box(parser.parse(black_box(s))));
            },
        );
    }

    group.finish();
}

fn bench_parser_expression_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/expression_depth");
    let mut parser = Parser::new();

    for depth in [5, 10, 15] {
        let source = format!("{};", generate_binary_expr(depth));
        group.bench_with_input(
            BenchmarkId::new("binary_tree", format!("depth_{}", depth)),
            &source,
            |b, s| {
                b.iter(|| black_box(parser.parse(black_box(s))));
            },
        );
    }

    group.finish();
}

/// Every statement is malformed, so each one goes through recovery
fn bench_parser_recovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/recovery");
    let mut parser = Parser::new();
    let broken: String = (0..1000)
        .map(|i| format!("let = {} @ ;\nlet ok{} = {};\n", i, i, i))
        .collect();

    group.bench_function("1000_malformed_statements", |b| {
        b.iter(|| black_box(parser.parse(black_box(&broken))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parser_individual,
    bench_parser_throughput,
    bench_parser_expression_depth,
    bench_parser_recovery,
);
criterion_main!(benches);
