//! Profiling binary for the lexer
//!
//! Build with: cargo build --profile profiling --features dev-tools --bin profile_lexer
//! Profile with perf: perf record --call-graph=dwarf ./target/profiling/profile_lexer
//!                    perf report
//! Or with flamegraph: cargo flamegraph --features dev-tools --bin profile_lexer
//!
//! Arguments: [source size in bytes] [iterations]

use hedwig::lexer::Lexer;

/// Large realistic JavaScript source for profiling
fn generate_source(size: usize) -> String {
    let patterns = [
        // Class definition
        r#"
class Counter extends Base {
    constructor(name, initialValue) {
        super();
        this.name = name;
        this.count = initialValue;
    }

    get value() { return this.count; }
    static create() { return new Counter("default", 0); }
}
"#,
        // Functions and comments
        r#"
// Sum a range of numbers
async function process(data, limit) {
    const total = data.length * 2.5e3;
    /* await the network */
    await delay(100);
    return total >= limit ? total - limit : limit % total;
}
"#,
        // Control flow
        r#"
if (condition && otherCondition || !done) {
    for (let i = 0; i < items.length; i++) {
        const item = items[i];
        while (item.pending !== false) {
            item.step += 1;
        }
    }
} else {
    result = typeof value === "undefined" ? null : `value is ${value}`;
}
"#,
        // Objects and arrays
        r#"
const config = {
    name: 'MyApp',
    version: "1.0.0",
    settings: { debug: true, level: 3 },
    endpoints: [
        { path: "/api/users", method: "GET" },
        { path: "/api/posts", method: "POST" },
    ],
    handler() { return this.settings; },
};
let flags = [1, , 3, .5, 0.25];
flags >>>= 1;
"#,
    ];

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

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Default to 1MB, can be overridden with command line arg
    let size: usize = args
        .get(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1_000_000);

    let iterations: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);

    eprintln!("Generating {}KB source...", size / 1024);
    let source = generate_source(size);
    eprintln!("Source size: {} bytes", source.len());

    eprintln!("Running {} iterations of lexer...", iterations);

    let lexer = Lexer::new();
    let start = std::time::Instant::now();
    let mut total_tokens = 0usize;

    for _ in 0..iterations {
        total_tokens += lexer.tokenize(&source).len();
    }

    let elapsed = start.elapsed();
    let bytes_per_sec = (source.len() * iterations) as f64 / elapsed.as_secs_f64();

    eprintln!("Done in {:?}", elapsed);
    eprintln!("Total tokens: {}", total_tokens);
    eprintln!("Throughput: {:.2} MB/s", bytes_per_sec / 1_000_000.0);
}
