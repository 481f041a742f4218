//! TAP v14 report for `hashgram test`.

use std::fmt::Write;

enum Outcome {
    Pass,
    Fail(String),
}

/// Collects case outcomes; nothing is printed until [`Report::finish`].
pub struct Report {
    cases: Vec<(String, Outcome)>,
}

impl Report {
    pub fn new() -> Self {
        Report { cases: Vec::new() }
    }

    pub fn ok(&mut self, case: impl Into<String>) {
        self.cases.push((case.into(), Outcome::Pass));
    }

    pub fn not_ok(&mut self, case: impl Into<String>, reason: impl Into<String>) {
        self.cases.push((case.into(), Outcome::Fail(reason.into())));
    }

    pub fn failure_count(&self) -> usize {
        self.cases
            .iter()
            .filter(|(_, outcome)| matches!(outcome, Outcome::Fail(_)))
            .count()
    }

    fn render(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "TAP version 14")?;
        writeln!(out, "1..{}", self.cases.len())?;
        for (n, (case, outcome)) in (1..).zip(&self.cases) {
            match outcome {
                Outcome::Pass => writeln!(out, "ok {} - {}", n, case)?,
                Outcome::Fail(reason) => {
                    writeln!(out, "not ok {} - {}", n, case)?;
                    for line in reason.lines() {
                        writeln!(out, "  # {}", line)?;
                    }
                }
            }
        }
        let failed = self.failure_count();
        writeln!(out, "# tests {}", self.cases.len())?;
        writeln!(out, "# pass  {}", self.cases.len() - failed)?;
        writeln!(out, "# fail  {}", failed)?;
        Ok(out)
    }

    /// Print the report to stdout.
    pub fn finish(self) {
        match self.render() {
            Ok(text) => print!("{}", text),
            Err(e) => eprintln!("error: cannot render TAP report: {}", e),
        }
    }
}
