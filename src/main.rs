//! svd-demo entry point for native builds

#[cfg(not(target_arch = "wasm32"))]
mod cli;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    cli::run()
}

// The library is usable from WASM; the command line front end is not
#[cfg(target_arch = "wasm32")]
fn main() {}
