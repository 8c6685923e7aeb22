//! Build script - stages the linker script for embedded builds so the
//! linker can find it at link time.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    // Host builds (tests) have no use for the linker script.
    if env::var("CARGO_FEATURE_EMBEDDED").is_err() {
        return;
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to OUT_DIR
    fs::copy("memory.x", out_dir.join("memory.x")).unwrap();

    // Tell cargo to look for linker scripts in OUT_DIR
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Rebuild if the linker script changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}
