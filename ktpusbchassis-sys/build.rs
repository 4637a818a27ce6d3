use std::env;
use std::path::PathBuf;

// These helper functions are only used when the ktpusbchassis-sdk feature is enabled
#[allow(dead_code)]
/// Print a boxed error message for visibility in cargo output
fn print_env_error(title: &str, details: &[&str], fixes: &[&str]) {
    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║ KTPUSBCHASSIS BUILD ERROR: {:<38} ║", title);
    eprintln!("╠══════════════════════════════════════════════════════════════════╣");
    for detail in details {
        eprintln!("║ {:<66} ║", detail);
    }
    eprintln!("╠══════════════════════════════════════════════════════════════════╣");
    eprintln!("║ HOW TO FIX:                                                      ║");
    for fix in fixes {
        eprintln!("║   {:<64} ║", fix);
    }
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();
}

#[allow(dead_code)]
/// Library name of the driver for the current target
fn driver_lib_name() -> &'static str {
    let os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let width = env::var("CARGO_CFG_TARGET_POINTER_WIDTH").unwrap_or_default();
    match (os.as_str(), width.as_str()) {
        ("windows", "64") => "KtPUsbChassis_64",
        _ => "KtPUsbChassis",
    }
}

#[allow(dead_code)]
/// Check the usual IVI Foundation install locations for the driver
fn find_driver_lib() -> Option<PathBuf> {
    let candidates = [
        r"C:\Program Files\IVI Foundation\IVI\Lib_x64\msc",
        r"C:\Program Files\IVI Foundation\IVI\Bin",
        "/opt/ivi/lib",
        "/usr/local/lib",
    ];

    candidates.iter().map(PathBuf::from).find(|p| p.exists())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only emit link directives when the driver is requested.
    // This allows the crate to compile on machines without the driver installed.
    #[cfg(feature = "ktpusbchassis-sdk")]
    {
        println!("cargo:rerun-if-env-changed=KTPUSBCHASSIS_LIB_DIR");

        let lib_dir = match env::var("KTPUSBCHASSIS_LIB_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => match find_driver_lib() {
                Some(found) => {
                    println!(
                        "cargo:warning=KTPUSBCHASSIS_LIB_DIR not set, auto-detected: {}",
                        found.display()
                    );
                    found
                }
                None => {
                    print_env_error(
                        "driver library not found",
                        &[
                            "The ktpusbchassis-sdk feature links the vendor driver.",
                            "No IVI Foundation library directory was found.",
                        ],
                        &[
                            "Install the Keysight KtPUsbChassis IVI driver",
                            "Or: set KTPUSBCHASSIS_LIB_DIR=<dir with import lib>",
                        ],
                    );
                    panic!("KTPUSBCHASSIS_LIB_DIR must be set when `ktpusbchassis-sdk` is enabled and the driver is not in a default location.");
                }
            },
        };

        if !lib_dir.exists() {
            println!(
                "cargo:warning=KtPUsbChassis lib path does not exist: {}",
                lib_dir.display()
            );
            println!("cargo:warning=Linker will search standard paths");
        }

        println!("cargo:rustc-link-search=native={}", lib_dir.display());
        println!("cargo:rustc-link-lib=dylib={}", driver_lib_name());
    }
}
