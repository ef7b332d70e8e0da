#![no_main]

use hedwig::parser::Parser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process valid UTF-8
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Recursion depth grows with nesting; keep inputs small
    if source.len() > 10_000 {
        return;
    }

    // Malformed input ends up in `errors`, never in a panic
    let program = Parser::new().parse(source);
    if program.errors.is_empty() {
        assert!(program.span.end <= source.len());
    }
});
