//! Profiling binary for the parser
//!
//! Build with: cargo build --profile profiling --features dev-tools --bin profile_parser
//! Profile with perf: perf record --call-graph=dwarf ./target/profiling/profile_parser
//!                    perf report
//! Or with flamegraph: cargo flamegraph --features dev-tools --bin profile_parser
//!
//! Arguments: [source size in bytes] [iterations]

use hedwig::parser::Parser;

/// Large realistic JavaScript source for profiling
fn generate_source(size: usize) -> String {
    let patterns = [
        // Class definition
        r#"
class Queue extends Collection {
    constructor(capacity) {
        super(capacity);
        this.items = [];
        this.head = 0;
    }

    get size() { return this.items.length - this.head; }
    set limit(value) { this.capacity = value; }
    *drain() { return this.items.slice(this.head); }
    static of(first, second) { return new Queue(2).push(first).push(second); }
}
"#,
        // Functions
        r#"
function fib(n) {
    if (n < 2) {
        return n;
    }
    return fib(n - 1) + fib(n - 2);
}
async function load(url, retries) {
    const response = await fetch(url, { method: "GET", retries });
    return response.ok ? response.json() : null;
}
"#,
        // Control flow
        r#"
for (let i = 0, j = 10; i < j; i++) {
    while (queue.size > 0 && !stopped) {
        const job = queue.items[queue.head];
        queue.head += 1;
        job.attempts = job.attempts + 1;
    }
}
"#,
        // Objects and arrays
        r#"
const settings = {
    name: "worker",
    "max-jobs": 16,
    [key]: value,
    flags: [true, , false, null],
    describe() { return `settings for ${this.name}`; },
};
[first, second] = [second, first];
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

    eprintln!("Running {} iterations of parser...", iterations);

    let mut parser = Parser::new();
    let start = std::time::Instant::now();
    let mut total_statements = 0usize;

    for i in 0..iterations {
        let program = parser.parse(&source);
        total_statements += program.body.len();
        if i == 0 {
            if let Some(e) = program.errors.first() {
                eprintln!("First parse error: {}", e);
            }
        }
    }

    let elapsed = start.elapsed();
    let bytes_per_sec = (source.len() * iterations) as f64 / elapsed.as_secs_f64();

    eprintln!("Done in {:?}", elapsed);
    eprintln!("Total statements: {}", total_statements);
    eprintln!("Throughput: {:.2} MB/s", bytes_per_sec / 1_000_000.0);
}
