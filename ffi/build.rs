//! Generate `include/medsupply.h` from the `extern "C"` surface.
//!
//! Header generation never fails the build; problems surface as cargo
//! warnings so the Rust side still compiles and tests.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string()));
    let out = crate_dir.join("include").join("medsupply.h");

    let config = cbindgen::Config {
        language: cbindgen::Language::C,
        include_guard: Some("MEDSUPPLY_H".to_string()),
        cpp_compat: true,
        ..Default::default()
    };

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            if let Some(dir) = out.parent() {
                if let Err(e) = std::fs::create_dir_all(dir) {
                    println!("cargo:warning=cannot create {}: {e}", dir.display());
                    return;
                }
            }
            bindings.write_to_file(&out);
        }
        Err(e) => println!("cargo:warning=cbindgen failed: {e}"),
    }
}
