// Demo suites for the bough engine.
// Usage: cargo run --bin bough-demo -- [--tags LIST] [--exclude LIST] [--format json]

use std::process::ExitCode;

use bough::{check, check_eq, cli, require, require_eq, Runner};

fn main() -> ExitCode {
    let mut runner = Runner::default();

    runner.suite("arithmetic", |suite| {
        suite.test_case("division", |t| {
            let mut divisor = 1;
            t.when("dividing by two", |_| {
                divisor = 2;
                Ok(())
            })?;
            t.when("dividing by four", |_| {
                divisor = 4;
                Ok(())
            })?;
            t.then("the quotient shrinks", |t| {
                require!(t, 8 / divisor < 8)?;
                check_eq!(t, 0, 8 % divisor);
                Ok(())
            })
        });

        suite.test_case_tagged("division by zero", "faulty", |t| {
            let mut divisor = 2;
            t.when("the divisor is zero", |_| {
                divisor = 0;
                Ok(())
            })?;
            t.when("the divisor is one", |_| {
                divisor = 1;
                Ok(())
            })?;
            t.then("dividing still works", |t| {
                check!(t, 10 / divisor >= 5);
                Ok(())
            })
        });
    });

    runner.suite("strings", |suite| {
        suite.test_case("trimming", |t| {
            let mut input = String::from("  bough  ");
            t.when("trimming the left", |_| {
                input = input.trim_start().to_string();
                Ok(())
            })?;
            t.when("trimming both ends", |_| {
                input = input.trim().to_string();
                Ok(())
            })?;
            t.when_tagged("trimming with a slow scan", "slow", |_| {
                input = input.chars().filter(|c| !c.is_whitespace()).collect();
                Ok(())
            })?;
            t.then("the word survives", |t| {
                require!(t, input.contains("bough"))?;
                check!(t, !input.starts_with(' '));
                Ok(())
            })
        });

        suite.test_case_tagged("joining", "faulty", |t| {
            let parts = ["a", "b"];
            t.when("with a comma", |t| {
                require_eq!(t, "a,b", parts.join(","))
            })?;
            t.when("with nothing", |t| {
                require_eq!(t, "a b", parts.join(""))?;
                check!(t, false);
                Ok(())
            })
        });
    });

    cli::run(runner)
}
