//! Rendering a single error as a debug page.
//!
//! This example demonstrates the fundamental concepts:
//! 1. Describing an error with a [`CapturedError`]
//! 2. Recording the call stack that led to it with [`RawFrame`]s
//! 3. Writing the rendered page to a file you can open in a browser

use std::{env, fs, panic::Location};

use debugpage::{ArgValue, CapturedError, DebugExceptionHandler, RawFrame, TracingHost};

/// Pretends to divide and fails the way a calculator service would.
///
/// The caller's location becomes the outer frame of the recorded stack.
#[track_caller]
fn divide(dividend: i64, divisor: i64) -> Result<i64, CapturedError> {
    let caller = Location::caller();
    if divisor == 0 {
        let frames = vec![
            RawFrame::new("divide")
                .in_class("basic::Calculator", "::")
                .at(file!(), line!())
                .with_args(vec![ArgValue::from(dividend), ArgValue::from(divisor)]),
            RawFrame::new("main").at(caller.file(), caller.line()),
        ];
        return Err(CapturedError::new("ArithmeticError", "Division by zero")
            .with_code(500)
            .at(file!(), line!())
            .with_frames(frames));
    }
    Ok(dividend / divisor)
}

fn main() {
    // The handler logs through tracing before rendering
    tracing_subscriber::fmt().with_target(false).init();

    println!("=== Rendering a Debug Page ===\n");

    let Err(error) = divide(10, 0) else {
        println!("Unexpectedly succeeded");
        return;
    };

    let page = DebugExceptionHandler::default().handle(&error, &mut TracingHost::new());

    let path = env::temp_dir().join("debugpage-basic.html");
    match fs::write(&path, &page) {
        Ok(()) => println!("Wrote {} bytes to {}", page.len(), path.display()),
        Err(e) => println!("Could not write {}: {e}", path.display()),
    }
}
