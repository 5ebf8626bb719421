//! Build script reporting the build target and, for the `onnx` feature,
//! where ONNX Runtime is expected to come from.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if env::var_os("CARGO_FEATURE_ONNX").is_some() {
        check_onnxruntime();
    }

    // Print detected environment
    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
    println!("cargo:rustc-env=BUILD_HOST={}", env::var("HOST").unwrap_or_default());
}

fn check_onnxruntime() {
    println!("cargo:rerun-if-env-changed=ORT_LIB_LOCATION");
    println!("cargo:rerun-if-env-changed=ORT_STRATEGY");

    match env::var("ORT_LIB_LOCATION") {
        Ok(location) => {
            println!("cargo:warning=Using ONNX Runtime from ORT_LIB_LOCATION={location}");
        }
        Err(_) => {
            let strategy = env::var("ORT_STRATEGY").unwrap_or_else(|_| "download".to_string());
            if strategy == "system" {
                println!("cargo:warning=ORT_STRATEGY=system but ORT_LIB_LOCATION is not set.");
                println!("cargo:warning=Point ORT_LIB_LOCATION at an onnxruntime install, e.g. /usr/local/lib");
            }
        }
    }
}
