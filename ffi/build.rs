//! Generates `include/triptalk.h` for the mobile shell.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    let include_dir = crate_dir.join("include");
    if let Err(e) = std::fs::create_dir_all(&include_dir) {
        println!("cargo:warning=cannot create {}: {e}", include_dir.display());
        return;
    }

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("TRIPTALK_H")
        .with_pragma_once(true)
        .generate();

    // Header generation failures are reported, not fatal.
    match generated {
        Ok(bindings) => {
            bindings.write_to_file(include_dir.join("triptalk.h"));
        }
        Err(e) => println!("cargo:warning=cbindgen failed, header not updated: {e}"),
    }
}
