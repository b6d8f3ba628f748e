//! Mock target program for integration testing
//!
//! Behaves like a small command-line tool under test. The first argument
//! picks the behaviour:
//!
//! - `sum`: print the sum of all whitespace-separated integers on stdin
//! - `echo`: copy stdin to stdout unchanged
//! - `hang`: read stdin, then never exit
//! - `fail`: print the sum, complain on stderr and exit with status 3
//! - `flood`: print the count of lines read, preceded by 1 MiB of filler
//! - `args`: print each remaining argument on its own line

use std::io::{Read, Write};

fn main() {
    let mut argv = std::env::args().skip(1);
    let mode = argv.next().unwrap_or_else(|| "sum".to_string());

    let mut input = Vec::new();
    if let Err(e) = std::io::stdin().read_to_end(&mut input) {
        eprintln!("mock_target: cannot read stdin: {e}");
        std::process::exit(101);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match mode.as_str() {
        "sum" => {
            let _ = writeln!(out, "{}", sum(&input));
        }
        "echo" => {
            let _ = out.write_all(&input);
        }
        "hang" => loop {
            std::thread::sleep(std::time::Duration::from_secs(3600));
        },
        "fail" => {
            let _ = writeln!(out, "{}", sum(&input));
            let _ = out.flush();
            eprintln!("mock_target: something went wrong");
            std::process::exit(3);
        }
        "flood" => {
            let filler = vec![b'x'; 1024];
            for _ in 0..1024 {
                let _ = out.write_all(&filler);
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", String::from_utf8_lossy(&input).lines().count());
        }
        "args" => {
            for arg in argv {
                let _ = writeln!(out, "{arg}");
            }
        }
        other => {
            eprintln!("mock_target: unknown mode '{other}'");
            std::process::exit(2);
        }
    }

    let _ = out.flush();
}

fn sum(input: &[u8]) -> i64 {
    String::from_utf8_lossy(input)
        .split_whitespace()
        .filter_map(|word| word.parse::<i64>().ok())
        .sum()
}
