//! Reference scenario runner.
//!
//! Runs every built-in scenario and reports a pass/fail summary; exits
//! non-zero if any scenario fails.

use reference_tests::builtin_scenarios;

fn main() {
    tracing_subscriber::fmt::init();

    let mut failed = 0_usize;
    for scenario in builtin_scenarios() {
        let outcome = scenario.run();
        if outcome.passed() {
            println!("PASS  {}", outcome.name);
        } else {
            failed += 1;
            println!("FAIL  {}", outcome.name);
            for failure in &outcome.failures {
                println!("      {failure}");
            }
        }
    }

    if failed > 0 {
        println!("{failed} scenario(s) failed");
        std::process::exit(1);
    }
    println!("all scenarios passed");
}
