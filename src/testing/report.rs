//! Console report for a suite run

use std::io::{self, Write};
use std::time::Duration;

use super::result::{SuiteRun, TestResult};

/// Format the one-line summary
pub fn summary_line(result: &TestResult, elapsed: Duration) -> String {
    format!(
        "Tests run: {}, Failures: {}, Skipped: {}, Time elapsed: {:.3} sec",
        result.num_tests,
        result.failed,
        result.skipped,
        elapsed.as_secs_f64()
    )
}

/// Write the captured log verbatim, then the summary line
pub fn write_report<W: Write>(out: &mut W, run: &SuiteRun) -> io::Result<()> {
    out.write_all(run.result.log.as_bytes())?;
    out.write_all(b"\n")?;
    writeln!(out, "{}", summary_line(&run.result, run.elapsed))?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(log: &str, num_tests: u64, failed: u64, skipped: u64, millis: u64) -> SuiteRun {
        SuiteRun {
            result: TestResult {
                log: log.to_string(),
                num_tests,
                failed,
                skipped,
                success: failed == 0,
            },
            elapsed: Duration::from_millis(millis),
        }
    }

    #[test]
    fn test_summary_line() {
        let run = run("OK", 10, 0, 0, 1234);
        assert_eq!(
            summary_line(&run.result, run.elapsed),
            "Tests run: 10, Failures: 0, Skipped: 0, Time elapsed: 1.234 sec"
        );
    }

    #[test]
    fn test_summary_rounds_to_three_decimals() {
        let result = run("", 5, 1, 2, 0).result;
        assert_eq!(
            summary_line(&result, Duration::from_micros(2_500_600)),
            "Tests run: 5, Failures: 1, Skipped: 2, Time elapsed: 2.501 sec"
        );
    }

    #[test]
    fn test_report_keeps_log_bytes() {
        let run = run("Größe ✓\n日本語", 1, 0, 0, 5);
        let mut out = Vec::new();
        write_report(&mut out, &run).unwrap();

        let expected = "Größe ✓\n日本語\nTests run: 1, Failures: 0, Skipped: 0, Time elapsed: 0.005 sec\n";
        assert_eq!(out, expected.as_bytes());
    }
}
